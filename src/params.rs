use crate::error::{Error, Result};
use crate::value::{ParamType, Value};

/// A column name, the value to bind for it, and its binding type hint.
///
/// # Examples
///
/// ```
/// use sqlx_chainer::{ColumnValue, ParamType};
///
/// let name = ColumnValue::new("name", "Ann");
/// let age = ColumnValue::int("age", 30);
/// assert_eq!(name.param_type, ParamType::Text);
/// assert_eq!(age.param_type, ParamType::Int);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnValue {
    pub name: String,
    pub value: Value,
    pub param_type: ParamType,
}

impl ColumnValue {
    /// Column bound as text, the default hint.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::typed(name, value, ParamType::Text)
    }

    /// Column with an explicit binding type hint.
    pub fn typed(name: impl Into<String>, value: impl Into<Value>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            param_type,
        }
    }

    /// Same as [`ColumnValue::new`].
    pub fn text(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::typed(name, value, ParamType::Text)
    }

    /// Column bound as an integer.
    pub fn int(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::typed(name, value, ParamType::Int)
    }

    /// Column bound as a boolean.
    pub fn boolean(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::typed(name, value, ParamType::Bool)
    }

    /// Column bound as SQL NULL.
    pub fn null(name: impl Into<String>) -> Self {
        Self::typed(name, Value::Null, ParamType::Null)
    }

    /// Column bound as binary data.
    pub fn blob(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::typed(name, value, ParamType::Blob)
    }

    pub(crate) fn bound(&self) -> BoundValue {
        BoundValue {
            value: self.value.clone(),
            param_type: self.param_type,
        }
    }
}

/// A value together with the hint it will be bound with.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundValue {
    pub value: Value,
    pub param_type: ParamType,
}

/// Returns `placeholder` with exactly one leading `:`.
pub(crate) fn normalize_placeholder(placeholder: &str) -> String {
    if placeholder.starts_with(':') {
        placeholder.to_owned()
    } else {
        format!(":{placeholder}")
    }
}

/// Placeholder to value mapping for one statement.
///
/// Entries keep their insertion order and placeholder tokens are unique: inserting
/// a token twice is an error rather than a silent overwrite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    entries: Vec<(String, BoundValue)>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one entry. `placeholder` may be given with or without the leading `:`.
    pub fn insert(
        &mut self,
        placeholder: &str,
        value: impl Into<Value>,
        param_type: ParamType,
    ) -> Result<()> {
        self.push(
            placeholder,
            BoundValue {
                value: value.into(),
                param_type,
            },
        )
    }

    pub(crate) fn push(&mut self, placeholder: &str, bound: BoundValue) -> Result<()> {
        let key = normalize_placeholder(placeholder);
        if self.contains(&key) {
            return Err(Error::DuplicatePlaceholder(key));
        }
        self.entries.push((key, bound));
        Ok(())
    }

    pub fn contains(&self, placeholder: &str) -> bool {
        let key = normalize_placeholder(placeholder);
        self.entries.iter().any(|(k, _)| *k == key)
    }

    pub fn get(&self, placeholder: &str) -> Option<&BoundValue> {
        let key = normalize_placeholder(placeholder);
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BoundValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Builds a set from column values, using each column name as its placeholder.
    pub fn from_columns(columns: &[ColumnValue]) -> Result<Self> {
        let mut set = Self::new();
        for column in columns {
            set.push(&column.name, column.bound())?;
        }
        Ok(set)
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = (&'a str, &'a BoundValue);
    type IntoIter = Box<dyn Iterator<Item = Self::Item> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
