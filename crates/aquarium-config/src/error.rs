use aquarium_formula::{EvalError, FormulaError};
use thiserror::Error;

use crate::schema::SchemaKind;

/// Raised while building a schema; the schema is unusable until fixed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("invalid config value '{name}' in {schema}: {field} {reason}")]
    Invalid {
        schema: SchemaKind,
        name: String,
        field: &'static str,
        reason: String,
    },
}

impl SchemaError {
    pub(crate) fn invalid(
        schema: SchemaKind,
        name: &str,
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        SchemaError::Invalid {
            schema,
            name: name.to_string(),
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SheetError {
    #[error("unknown sheet '{sheet}'")]
    UnknownSheet { sheet: String },

    #[error("unknown key '{sheet}.{name}'")]
    UnknownKey { sheet: String, name: String },

    #[error("invalid alias '{alias}': must start with a letter or '_' and contain only letters, digits or '_'")]
    InvalidAlias { alias: String },

    #[error("alias '{alias}' is already bound to another row of {sheet}")]
    AliasInUse { sheet: String, alias: String },

    #[error("invalid constant '{text}' for {cell}: expected a number or a formula starting with '='")]
    InvalidConstant { cell: String, text: String },

    #[error("invalid formula for {cell}: {source}")]
    Formula {
        cell: String,
        #[source]
        source: FormulaError,
    },

    #[error("unresolved reference '{reference}' in {cell}")]
    UnresolvedReference { reference: String, cell: String },

    #[error("cyclic dependency: {}", cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("evaluation of {cell} failed: {source}")]
    Evaluation {
        cell: String,
        #[source]
        source: EvalError,
    },

    #[error("{cell} has not been computed yet; recompute first")]
    NotComputed { cell: String },
}

/// Raised when an edit batch is refused; nothing from the batch was written.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
    #[error("unknown setting {schema}.{name}")]
    UnknownSetting { schema: SchemaKind, name: String },

    #[error("{schema}.{name} expects a {expected} value")]
    TypeMismatch {
        schema: SchemaKind,
        name: String,
        expected: &'static str,
    },

    #[error("{schema}.{name} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        schema: SchemaKind,
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Sheet(#[from] SheetError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error("unknown schema '{name}'")]
    UnknownSchema { name: String },

    #[error("invalid cell reference '{text}': expected Sheet.Name")]
    InvalidCellRef { text: String },

    #[error("unknown category '{name}'")]
    UnknownCategory { name: String },
}
