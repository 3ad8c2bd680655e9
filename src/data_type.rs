use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::value::Value;

/// Represents the supported data types in a table schema.
/// These types define the structure of columns and the expected format of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// A 64-bit signed integer.
    Int,
    /// A UTF-8 character string.
    String,
}

impl DataType {
    /// Returns `true` if `value` can be stored in a column of this type.
    ///
    /// An `INT` column accepts integers and text made only of an optional `-`
    /// followed by ASCII digits. A `STRING` column only accepts text.
    pub fn accepts(&self, value: &Value) -> bool {
        self.coerce(value).is_some()
    }

    /// Converts `value` into the representation stored for this type.
    ///
    /// Returns `None` when the value is incompatible with the type.
    ///
    /// # Example
    /// ```
    /// # use tabledb::{DataType, Value};
    /// assert_eq!(DataType::Int.coerce(&Value::Str("42".into())), Some(Value::Int(42)));
    /// assert_eq!(DataType::String.coerce(&Value::Int(42)), None);
    /// ```
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        match (self, value) {
            (Self::Int, Value::Int(i)) => Some(Value::Int(*i)),
            (Self::Int, Value::Str(s)) => parse_integer_text(s).map(Value::Int),
            (Self::String, Value::Str(s)) => Some(Value::Str(s.clone())),
            (Self::String, Value::Int(_)) => None,
        }
    }
}

/// Parses `-?[0-9]+` into an `i64`, rejecting signs other than `-` and blanks.
fn parse_integer_text(text: &str) -> Option<i64> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

impl FromStr for DataType {
    type Err = Error;

    /// Type names are matched case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INT" => Ok(Self::Int),
            "STRING" => Ok(Self::String),
            _ => Err(Error::invalid(format!("unknown data type {s:?}"))),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => f.write_str("INT"),
            Self::String => f.write_str("STRING"),
        }
    }
}
