//! Conversion between Rust values, bind parameter tuples and SQLite cells.
//!
//! Bind parameters arrive as loose tuples (`Vec<Value>`) of two or three
//! elements: a target, a value, and an optional [`TypeHint`]. A text target
//! names a placeholder (`:name`, `@name`, `$name`; a bare name gets `:`),
//! an integer target is a 1-based position. [`bind`] and [`bind_as`] build
//! well-formed tuples.

use std::fmt;
use std::ops::Index;
use std::str::FromStr;

use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, ValueRef};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// A single SQLite cell or bind value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the integer, if this is [`Value::Integer`].
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the float, converting integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Real(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Returns the text, if this is [`Value::Text`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the bytes, if this is [`Value::Blob`].
    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Self::Blob(b) => Some(b),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Blob(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Self::Blob(value.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(i) => Self::Integer(i),
            ValueRef::Real(f) => Self::Real(f),
            ValueRef::Text(bytes) => Self::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => Self::Blob(bytes.to_vec()),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self {
            Self::Null => ValueRef::Null,
            Self::Integer(i) => ValueRef::Integer(*i),
            Self::Real(f) => ValueRef::Real(*f),
            Self::Text(s) => ValueRef::Text(s.as_bytes()),
            Self::Blob(b) => ValueRef::Blob(b),
        };
        Ok(ToSqlOutput::Borrowed(value))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Real(r) => write!(f, "{r}"),
            Self::Text(s) => f.write_str(s),
            Self::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

/// Storage class a bound value is coerced to before binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeHint {
    Integer,
    Real,
    Text,
    Blob,
    Null,
}

impl TypeHint {
    /// Returns the hint name used in bind tuples.
    pub fn name(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Real => "real",
            Self::Text => "text",
            Self::Blob => "blob",
            Self::Null => "null",
        }
    }

    /// Coerces `value` to this storage class. Returns `None` when the
    /// value cannot be represented.
    pub fn coerce(self, value: Value) -> Option<Value> {
        match (self, value) {
            (Self::Null, _) | (_, Value::Null) => Some(Value::Null),

            (Self::Integer, Value::Integer(i)) => Some(Value::Integer(i)),
            (Self::Integer, Value::Real(f)) => Some(Value::Integer(f as i64)),
            (Self::Integer, Value::Text(s)) => s.trim().parse().ok().map(Value::Integer),
            (Self::Integer, Value::Blob(_)) => None,

            (Self::Real, Value::Real(f)) => Some(Value::Real(f)),
            (Self::Real, Value::Integer(i)) => Some(Value::Real(i as f64)),
            (Self::Real, Value::Text(s)) => s.trim().parse().ok().map(Value::Real),
            (Self::Real, Value::Blob(_)) => None,

            (Self::Text, Value::Blob(b)) => Some(Value::Text(String::from_utf8_lossy(&b).into_owned())),
            (Self::Text, other) => Some(Value::Text(other.to_string())),

            (Self::Blob, Value::Blob(b)) => Some(Value::Blob(b)),
            (Self::Blob, Value::Text(s)) => Some(Value::Blob(s.into_bytes())),
            (Self::Blob, other) => Some(Value::Blob(other.to_string().into_bytes())),
        }
    }
}

impl FromStr for TypeHint {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "integer" | "int" => Ok(Self::Integer),
            "real" | "float" => Ok(Self::Real),
            "text" => Ok(Self::Text),
            "blob" => Ok(Self::Blob),
            "null" => Ok(Self::Null),
            _ => Err(()),
        }
    }
}

impl From<TypeHint> for Value {
    fn from(hint: TypeHint) -> Self {
        Self::Text(hint.name().to_string())
    }
}

/// Where a bind value goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    /// Named placeholder including its prefix, e.g. `:uuid`.
    Named(String),
    /// 1-based position.
    Index(usize),
}

/// A validated bind parameter.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BindParam {
    pub(crate) target: Placeholder,
    pub(crate) value: Value,
}

impl BindParam {
    /// Parses a raw tuple. `None` means the tuple is malformed.
    pub(crate) fn from_tuple(tuple: &[Value]) -> Option<Self> {
        let (target, value, hint) = match tuple {
            [target, value] => (target, value, None),
            [target, value, Value::Text(hint)] => (target, value, Some(hint.parse::<TypeHint>().ok()?)),
            _ => return None,
        };

        let target = match target {
            Value::Text(name) => {
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                if name.starts_with([':', '@', '$']) {
                    Placeholder::Named(name.to_string())
                } else {
                    Placeholder::Named(format!(":{name}"))
                }
            }
            Value::Integer(index) if *index >= 1 => Placeholder::Index(usize::try_from(*index).ok()?),
            _ => return None,
        };

        let value = match hint {
            Some(hint) => hint.coerce(value.clone())?,
            None => value.clone(),
        };

        Some(Self { target, value })
    }
}

/// Builds a `(target, value)` bind tuple.
///
/// # Examples
///
/// ```
/// use litegate_sqlite::{Value, bind};
///
/// let named = bind(":uuid", "abc");
/// let positional = bind(1, 42);
/// assert_eq!(named.len(), 2);
/// assert_eq!(positional[0], Value::Integer(1));
/// ```
pub fn bind(target: impl Into<Value>, value: impl Into<Value>) -> Vec<Value> {
    vec![target.into(), value.into()]
}

/// Builds a `(target, value, hint)` bind tuple.
pub fn bind_as(target: impl Into<Value>, value: impl Into<Value>, hint: TypeHint) -> Vec<Value> {
    vec![target.into(), value.into(), hint.into()]
}

/// One result row: column names mapped to values, in result column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    cells: Vec<(String, Value)>,
}

impl Row {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, name: String, value: Value) {
        self.cells.push((name, value));
    }

    /// Returns the value of the first column called `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    /// Iterates `(column, value)` pairs in result order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.cells.iter().map(|(column, value)| (column.as_str(), value))
    }

    /// Column names in result order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(column, _)| column.as_str())
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Index<&str> for Row {
    type Output = Value;

    fn index(&self, name: &str) -> &Value {
        self.get(name)
            .unwrap_or_else(|| panic!("no column named '{name}' in row"))
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (column, value) in &self.cells {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}
