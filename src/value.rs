use std::fmt;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Binding type hint attached to every bound value.
///
/// The hint decides how a [`Value`] is converted right before it is sent to
/// the server, see [`Value::coerce`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    #[default]
    Text,
    Int,
    Bool,
    Null,
    Blob,
}

/// A dynamically typed SQL value, used both for bound parameters and for
/// decoded result columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// `true` for SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Integer view of the value; unsigned values above `i64::MAX` give `None`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int(v) => Some(v),
            Value::UInt(v) => i64::try_from(v).ok(),
            Value::Bool(v) => Some(i64::from(v)),
            _ => None,
        }
    }

    /// Borrowed text, for [`Value::Text`] only.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Converts the value according to a binding type hint.
    ///
    /// * `Null` hint always yields [`Value::Null`]; a null value stays null under every hint.
    /// * `Int` parses trimmed text, truncates floats and maps booleans to `1`/`0`.
    /// * `Text` renders numbers as text and booleans as `1`/`0`.
    /// * `Bool` treats `0`, `0.0`, `""` and `"0"` as false.
    /// * `Blob` takes the bytes of the textual form.
    ///
    /// `placeholder` is only used to label the error.
    pub fn coerce(self, hint: ParamType, placeholder: &str) -> Result<Value> {
        let fail = |message: String| Error::Coercion {
            placeholder: placeholder.to_owned(),
            message,
        };

        if self.is_null() {
            return Ok(Value::Null);
        }

        let coerced = match hint {
            ParamType::Null => Value::Null,
            ParamType::Text => match self {
                Value::Bool(b) => Value::Text(if b { "1" } else { "0" }.to_owned()),
                Value::Int(v) => Value::Text(v.to_string()),
                Value::UInt(v) => Value::Text(v.to_string()),
                Value::Float(v) => Value::Text(v.to_string()),
                other => other,
            },
            ParamType::Int => match self {
                Value::Bool(b) => Value::Int(i64::from(b)),
                Value::Float(v) => Value::Int(v.trunc() as i64),
                Value::Text(s) => {
                    let trimmed = s.trim();
                    if let Ok(v) = trimmed.parse::<i64>() {
                        Value::Int(v)
                    } else if let Ok(v) = trimmed.parse::<u64>() {
                        Value::UInt(v)
                    } else {
                        return Err(fail(format!("'{s}' is not an integer")));
                    }
                }
                Value::Blob(_) => return Err(fail("a blob cannot be bound as an integer".into())),
                other => other,
            },
            ParamType::Bool => Value::Bool(match self {
                Value::Bool(b) => b,
                Value::Int(v) => v != 0,
                Value::UInt(v) => v != 0,
                Value::Float(v) => v != 0.0,
                Value::Text(s) => !(s.is_empty() || s == "0"),
                Value::Blob(b) => !(b.is_empty() || b == b"0"),
                Value::Null => false,
            }),
            ParamType::Blob => match self {
                Value::Blob(b) => Value::Blob(b),
                Value::Text(s) => Value::Blob(s.into_bytes()),
                other => Value::Blob(other.to_string().into_bytes()),
            },
        };
        Ok(coerced)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => f.write_str(if *b { "1" } else { "0" }),
            Value::Int(v) => write!(f, "{v}"),
            Value::UInt(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
            Value::Blob(b) => f.write_str(&String::from_utf8_lossy(b)),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident as $target:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(<$target>::from(v))
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool as bool,
    i8 => Int as i64,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int as i64,
    u8 => UInt as u64,
    u16 => UInt as u64,
    u32 => UInt as u64,
    u64 => UInt as u64,
    f32 => Float as f64,
    f64 => Float as f64,
    String => Text as String,
    &str => Text as String,
    Vec<u8> => Blob as Vec<u8>,
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Blob(v.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_hint_always_binds_null() {
        let v = Value::from(42).coerce(ParamType::Null, ":id").unwrap();
        assert_eq!(v, Value::Null);
    }

    #[test]
    fn test_null_value_survives_every_hint() {
        for hint in [ParamType::Text, ParamType::Int, ParamType::Bool, ParamType::Blob] {
            assert_eq!(Value::Null.coerce(hint, ":x").unwrap(), Value::Null);
        }
    }

    #[test]
    fn test_int_hint_parses_text() {
        let v = Value::from(" 30 ").coerce(ParamType::Int, ":age").unwrap();
        assert_eq!(v, Value::Int(30));
    }

    #[test]
    fn test_int_hint_rejects_garbage() {
        let err = Value::from("thirty").coerce(ParamType::Int, ":age").unwrap_err();
        assert!(matches!(err, Error::Coercion { ref placeholder, .. } if placeholder == ":age"));
    }

    #[test]
    fn test_text_hint_renders_numbers() {
        assert_eq!(
            Value::from(5_u32).coerce(ParamType::Text, ":n").unwrap(),
            Value::Text("5".into())
        );
        assert_eq!(
            Value::from(true).coerce(ParamType::Text, ":b").unwrap(),
            Value::Text("1".into())
        );
    }

    #[test]
    fn test_bool_hint_follows_truthiness() {
        assert_eq!(Value::from("0").coerce(ParamType::Bool, ":b").unwrap(), Value::Bool(false));
        assert_eq!(Value::from("").coerce(ParamType::Bool, ":b").unwrap(), Value::Bool(false));
        assert_eq!(Value::from("no").coerce(ParamType::Bool, ":b").unwrap(), Value::Bool(true));
        assert_eq!(Value::from(2).coerce(ParamType::Bool, ":b").unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_blob_hint_takes_bytes() {
        assert_eq!(
            Value::from("ab").coerce(ParamType::Blob, ":b").unwrap(),
            Value::Blob(b"ab".to_vec())
        );
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Text("x".into()));
    }
}
