use aquarium_config::{ConfigError, SheetError};
use aquarium_formula::FormulaError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PartsError {
    #[error("invalid binding for {feature}.{property}: {source}")]
    Binding {
        feature: String,
        property: String,
        #[source]
        source: FormulaError,
    },

    #[error("duplicate feature '{name}'")]
    DuplicateFeature { name: String },

    #[error("cannot resolve {feature}.{property}: {source}")]
    Resolve {
        feature: String,
        property: String,
        #[source]
        source: SheetError,
    },

    #[error("{feature}.{property} resolved to a negative count ({value})")]
    NegativeCount {
        feature: String,
        property: String,
        value: f64,
    },

    #[error("{feature}.{property} resolved to a negative dimension ({value})")]
    NegativeDimension {
        feature: String,
        property: String,
        value: f64,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}
