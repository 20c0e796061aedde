use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::mysql::types::MySqlTime;
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Row as _, TypeInfo, ValueRef};

use crate::error::{Error, Result};
use crate::value::Value;

/// Shape of the rows returned by `fetch` and `fetch_all`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchMode {
    /// Values addressable by column name and by position.
    #[default]
    Assoc,
    /// Values addressable by position only.
    Num,
}

/// One fetched row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Value of the first column called `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|i| self.values.get(i))
    }

    /// Value at column position `index`, in either fetch mode.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Column names; empty for rows fetched with [`FetchMode::Num`].
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(name, value)` pairs, empty for positional rows.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(String::as_str).zip(self.values.iter())
    }

    pub(crate) fn with_mode(mut self, mode: FetchMode) -> Self {
        if mode == FetchMode::Num {
            self.columns.clear();
        }
        self
    }
}

pub(crate) fn decode_row(row: &MySqlRow) -> Result<Row> {
    let mut columns = Vec::with_capacity(row.len());
    let mut values = Vec::with_capacity(row.len());
    for column in row.columns() {
        let name = column.name().to_owned();
        let value = decode_value(row, column.ordinal()).map_err(|source| Error::Decode {
            column: name.clone(),
            source,
        })?;
        columns.push(name);
        values.push(value);
    }
    Ok(Row { columns, values })
}

// Temporal columns come back as text, the way the server renders them.
fn decode_value(row: &MySqlRow, index: usize) -> std::result::Result<Value, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_owned();

    let value = match type_name.as_str() {
        "NULL" => Value::Null,
        "BOOLEAN" => Value::Bool(row.try_get_unchecked(index)?),
        name if name.ends_with(" UNSIGNED") => Value::UInt(row.try_get_unchecked(index)?),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            Value::Int(row.try_get_unchecked(index)?)
        }
        "FLOAT" => Value::Float(f64::from(row.try_get_unchecked::<f32, _>(index)?)),
        "DOUBLE" => Value::Float(row.try_get_unchecked(index)?),
        "DATE" | "DATETIME" | "TIMESTAMP" => {
            let bytes: &[u8] = row.try_get_unchecked(index)?;
            let with_time = type_name != "DATE";
            let text = render_date(bytes, with_time).ok_or_else(|| {
                sqlx::Error::Decode(format!("malformed {type_name} value").into())
            })?;
            Value::Text(text)
        }
        "TIME" => Value::Text(row.try_get_unchecked::<MySqlTime, _>(index)?.to_string()),
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
        | "GEOMETRY" => Value::Blob(row.try_get_unchecked(index)?),
        _ => Value::Text(row.try_get_unchecked(index)?),
    };
    Ok(value)
}

/// Renders a DATE/DATETIME/TIMESTAMP cell as MySQL prints it.
///
/// Text-protocol cells already hold the server's rendering. Binary cells are a
/// length byte (0, 4, 7 or 11) followed by the packed fields; zero dates and
/// dates chrono rejects (zero month or day) are rendered field by field.
fn render_date(bytes: &[u8], with_time: bool) -> Option<String> {
    let Some((&len, packed)) = bytes.split_first() else {
        return Some(String::new());
    };
    if len.is_ascii_digit() {
        return String::from_utf8(bytes.to_vec()).ok();
    }
    if packed.len() < usize::from(len) {
        return None;
    }

    let (year, month, day) = match len {
        0 => (0, 0, 0),
        4 | 7 | 11 => (u16::from_le_bytes([packed[0], packed[1]]), packed[2], packed[3]),
        _ => return None,
    };
    let (hour, minute, second) = if len >= 7 {
        (packed[4], packed[5], packed[6])
    } else {
        (0, 0, 0)
    };
    let micros = if len == 11 {
        u32::from_le_bytes([packed[7], packed[8], packed[9], packed[10]])
    } else {
        0
    };

    let date = NaiveDate::from_ymd_opt(year.into(), month.into(), day.into());
    if !with_time {
        return Some(match date {
            Some(date) => date.to_string(),
            None => format!("{year:04}-{month:02}-{day:02}"),
        });
    }
    let time = NaiveTime::from_hms_micro_opt(hour.into(), minute.into(), second.into(), micros);
    Some(match date.zip(time) {
        Some((date, time)) => NaiveDateTime::new(date, time).to_string(),
        None => {
            let mut text =
                format!("{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}");
            if micros > 0 {
                text.push_str(&format!(".{micros:06}"));
            }
            text
        }
    })
}
