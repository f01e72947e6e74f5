use std::fmt;
use std::str::FromStr;

use aquarium_formula::is_identifier;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A scalar held by a repository cell or produced by a formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(f64),
}

impl Value {
    /// Numeric view used by formulas; booleans read as 1 and 0.
    pub fn as_f64(self) -> f64 {
        match self {
            Value::Number(value) => value,
            Value::Bool(true) => 1.0,
            Value::Bool(false) => 0.0,
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(value),
            Value::Number(_) => None,
        }
    }

    pub fn kind(self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Number(_) => "numeric",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(value) => write!(f, "{value}"),
            Value::Number(value) => write!(f, "{value}"),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

/// Dotted address of a cell, `Sheet.Name`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    pub sheet: String,
    pub name: String,
}

impl CellRef {
    pub fn new(sheet: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.sheet, self.name)
    }
}

impl FromStr for CellRef {
    type Err = ConfigError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidCellRef {
            text: text.to_string(),
        };
        let (sheet, name) = text.trim().split_once('.').ok_or_else(invalid)?;
        if !is_identifier(sheet) || !is_identifier(name) {
            return Err(invalid());
        }
        Ok(CellRef::new(sheet, name))
    }
}

#[cfg(test)]
mod tests {
    use super::{CellRef, Value};

    #[test]
    fn parses_dotted_cell_reference() {
        let cell: CellRef = "Computed.BeamsDir".parse().expect("should parse");
        assert_eq!(cell, CellRef::new("Computed", "BeamsDir"));
        assert_eq!(cell.to_string(), "Computed.BeamsDir");
    }

    #[test]
    fn rejects_unqualified_or_malformed_reference() {
        assert!("Width".parse::<CellRef>().is_err());
        assert!("Config.".parse::<CellRef>().is_err());
        assert!("Config.Width.x".parse::<CellRef>().is_err());
    }

    #[test]
    fn booleans_read_as_one_and_zero() {
        assert_eq!(Value::Bool(true).as_f64(), 1.0);
        assert_eq!(Value::Bool(false).as_f64(), 0.0);
        assert_eq!(Value::Number(12.5).as_f64(), 12.5);
    }

    #[test]
    fn values_deserialize_untagged() {
        let values: Vec<Value> =
            serde_json::from_str("[1200, 3.2, true]").expect("should deserialize");
        assert_eq!(
            values,
            vec![Value::Number(1200.0), Value::Number(3.2), Value::Bool(true)]
        );
    }
}
