//! Declarations of every configurable scalar.
//!
//! A [`Schema`] lists the values of one repository (`Config`,
//! `ConfigPipesDrain`, ...) with their bounds and descriptions. The
//! [`Categories`] side-index groups `(schema, name)` pairs by UI category
//! and is shared by all schemas of a [`SchemaSet`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use aquarium_formula::is_identifier;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, EditError, SchemaError};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SchemaKind {
    #[serde(rename = "Config")]
    Config,
    #[serde(rename = "ConfigPipesDrain")]
    PipesDrain,
    #[serde(rename = "ConfigPipesReturn")]
    PipesReturn,
    #[serde(rename = "ConfigPipesNozzleClosedLoop")]
    PipesNozzleClosedLoop,
}

impl SchemaKind {
    pub const ALL: [SchemaKind; 4] = [
        SchemaKind::Config,
        SchemaKind::PipesDrain,
        SchemaKind::PipesReturn,
        SchemaKind::PipesNozzleClosedLoop,
    ];

    /// Name of the sheet backing the repository of this schema.
    pub fn sheet_name(self) -> &'static str {
        match self {
            SchemaKind::Config => "Config",
            SchemaKind::PipesDrain => "ConfigPipesDrain",
            SchemaKind::PipesReturn => "ConfigPipesReturn",
            SchemaKind::PipesNozzleClosedLoop => "ConfigPipesNozzleClosedLoop",
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sheet_name())
    }
}

impl FromStr for SchemaKind {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        SchemaKind::ALL
            .into_iter()
            .find(|kind| kind.sheet_name() == name)
            .ok_or_else(|| ConfigError::UnknownSchema {
                name: name.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Structure,
    Visual,
    Plumbing,
    Glass,
    Weir,
    Canopy,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Structure,
        Category::Visual,
        Category::Plumbing,
        Category::Glass,
        Category::Weir,
        Category::Canopy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Structure => "structure",
            Category::Visual => "visual",
            Category::Plumbing => "plumbing",
            Category::Glass => "glass",
            Category::Weir => "weir",
            Category::Canopy => "canopy",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == name)
            .ok_or_else(|| ConfigError::UnknownCategory {
                name: name.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericConfigValue {
    pub schema: SchemaKind,
    pub name: String,
    pub description: String,
    pub default: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub unit: Option<String>,
}

impl NumericConfigValue {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        schema: SchemaKind,
        name: &str,
        description: &str,
        default: f64,
        min: f64,
        max: f64,
        step: f64,
        unit: Option<&str>,
    ) -> Result<Self, SchemaError> {
        validate_text(schema, name, description)?;
        for (field, number) in [("default", default), ("min", min), ("max", max), ("step", step)]
        {
            if !number.is_finite() {
                return Err(SchemaError::invalid(schema, name, field, "is not a finite number"));
            }
        }
        if step <= 0.0 {
            return Err(SchemaError::invalid(schema, name, "step", "must be positive"));
        }
        if min > max {
            return Err(SchemaError::invalid(
                schema,
                name,
                "min",
                format!("{min} is greater than max {max}"),
            ));
        }
        if default < min || default > max {
            return Err(SchemaError::invalid(
                schema,
                name,
                "default",
                format!("{default} is outside [{min}, {max}]"),
            ));
        }

        Ok(Self {
            schema,
            name: name.to_string(),
            description: description.to_string(),
            default,
            min,
            max,
            step,
            unit: unit.map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BooleanConfigValue {
    pub schema: SchemaKind,
    pub name: String,
    pub description: String,
    pub default: bool,
}

impl BooleanConfigValue {
    pub fn new(
        schema: SchemaKind,
        name: &str,
        description: &str,
        default: bool,
    ) -> Result<Self, SchemaError> {
        validate_text(schema, name, description)?;
        Ok(Self {
            schema,
            name: name.to_string(),
            description: description.to_string(),
            default,
        })
    }
}

fn validate_text(schema: SchemaKind, name: &str, description: &str) -> Result<(), SchemaError> {
    if !is_identifier(name) {
        return Err(SchemaError::invalid(schema, name, "name", "is not a valid identifier"));
    }
    if description.trim().is_empty() {
        return Err(SchemaError::invalid(schema, name, "description", "must not be blank"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConfigValue {
    Numeric(NumericConfigValue),
    Boolean(BooleanConfigValue),
}

/// How an editing UI should present a value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum Editor {
    IntegerSpin {
        min: f64,
        max: f64,
        step: f64,
        suffix: Option<String>,
    },
    DecimalSpin {
        min: f64,
        max: f64,
        step: f64,
        decimals: u8,
        suffix: Option<String>,
    },
    Checkbox,
}

impl ConfigValue {
    pub fn name(&self) -> &str {
        match self {
            ConfigValue::Numeric(value) => &value.name,
            ConfigValue::Boolean(value) => &value.name,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            ConfigValue::Numeric(value) => &value.description,
            ConfigValue::Boolean(value) => &value.description,
        }
    }

    pub fn schema(&self) -> SchemaKind {
        match self {
            ConfigValue::Numeric(value) => value.schema,
            ConfigValue::Boolean(value) => value.schema,
        }
    }

    pub fn default_value(&self) -> Value {
        match self {
            ConfigValue::Numeric(value) => Value::Number(value.default),
            ConfigValue::Boolean(value) => Value::Bool(value.default),
        }
    }

    pub fn editor(&self) -> Editor {
        match self {
            ConfigValue::Numeric(value) if value.step < 1.0 => Editor::DecimalSpin {
                min: value.min,
                max: value.max,
                step: value.step,
                decimals: 2,
                suffix: value.unit.clone(),
            },
            ConfigValue::Numeric(value) => Editor::IntegerSpin {
                min: value.min,
                max: value.max,
                step: value.step,
                suffix: value.unit.clone(),
            },
            ConfigValue::Boolean(_) => Editor::Checkbox,
        }
    }

    /// Checks that `candidate` may be stored for this value.
    pub fn check(&self, candidate: Value) -> Result<(), EditError> {
        match (self, candidate) {
            (ConfigValue::Numeric(value), Value::Number(number)) => {
                if number.is_finite() && number >= value.min && number <= value.max {
                    Ok(())
                } else {
                    Err(EditError::OutOfRange {
                        schema: value.schema,
                        name: value.name.clone(),
                        value: number,
                        min: value.min,
                        max: value.max,
                    })
                }
            }
            (ConfigValue::Boolean(_), Value::Bool(_)) => Ok(()),
            (ConfigValue::Numeric(value), Value::Bool(_)) => Err(EditError::TypeMismatch {
                schema: value.schema,
                name: value.name.clone(),
                expected: "numeric",
            }),
            (ConfigValue::Boolean(value), Value::Number(_)) => Err(EditError::TypeMismatch {
                schema: value.schema,
                name: value.name.clone(),
                expected: "boolean",
            }),
        }
    }
}

/// The declared values of one repository, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    kind: SchemaKind,
    values: Vec<ConfigValue>,
    index: HashMap<String, usize>,
}

impl Schema {
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            values: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn kind(&self) -> SchemaKind {
        self.kind
    }

    pub fn get(&self, name: &str) -> Option<&ConfigValue> {
        self.index.get(name).map(|&position| &self.values[position])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigValue> {
        self.values.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(ConfigValue::name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Stores `value`, replacing an earlier declaration of the same name in place.
    fn insert(&mut self, value: ConfigValue) -> bool {
        match self.index.get(value.name()) {
            Some(&position) => {
                self.values[position] = value;
                true
            }
            None => {
                self.index.insert(value.name().to_string(), self.values.len());
                self.values.push(value);
                false
            }
        }
    }
}

/// Category tag to ordered `(schema, name)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Categories {
    buckets: BTreeMap<Category, Vec<(SchemaKind, String)>>,
}

impl Categories {
    pub fn get(&self, category: Category) -> &[(SchemaKind, String)] {
        self.buckets
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &[(SchemaKind, String)])> {
        self.buckets
            .iter()
            .map(|(category, entries)| (*category, entries.as_slice()))
    }

    /// Categories a value is registered under.
    pub fn of(&self, schema: SchemaKind, name: &str) -> Vec<Category> {
        self.buckets
            .iter()
            .filter(|(_, entries)| {
                entries
                    .iter()
                    .any(|(kind, entry)| *kind == schema && entry == name)
            })
            .map(|(category, _)| *category)
            .collect()
    }

    fn register(&mut self, schema: SchemaKind, name: &str, categories: &[Category]) {
        for category in categories {
            let bucket = self.buckets.entry(*category).or_default();
            if !bucket
                .iter()
                .any(|(kind, entry)| *kind == schema && entry == name)
            {
                bucket.push((schema, name.to_string()));
            }
        }
    }

    fn forget(&mut self, schema: SchemaKind, name: &str) {
        for bucket in self.buckets.values_mut() {
            bucket.retain(|(kind, entry)| !(*kind == schema && entry == name));
        }
        self.buckets.retain(|_, bucket| !bucket.is_empty());
    }
}

/// Builds one [`Schema`] while registering its values in a shared [`Categories`] index.
pub struct SchemaBuilder<'c> {
    schema: Schema,
    categories: &'c mut Categories,
}

impl<'c> SchemaBuilder<'c> {
    pub fn new(kind: SchemaKind, categories: &'c mut Categories) -> Self {
        Self {
            schema: Schema::new(kind),
            categories,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_num(
        &mut self,
        name: &str,
        default: f64,
        min: f64,
        max: f64,
        step: f64,
        description: &str,
        unit: Option<&str>,
        categories: &[Category],
    ) -> Result<&mut Self, SchemaError> {
        let value = NumericConfigValue::new(
            self.schema.kind,
            name,
            description,
            default,
            min,
            max,
            step,
            unit,
        )?;
        self.store(ConfigValue::Numeric(value), categories);
        Ok(self)
    }

    pub fn add_bool(
        &mut self,
        name: &str,
        default: bool,
        description: &str,
        categories: &[Category],
    ) -> Result<&mut Self, SchemaError> {
        let value = BooleanConfigValue::new(self.schema.kind, name, description, default)?;
        self.store(ConfigValue::Boolean(value), categories);
        Ok(self)
    }

    fn store(&mut self, value: ConfigValue, categories: &[Category]) {
        let kind = self.schema.kind;
        let name = value.name().to_string();
        if self.schema.insert(value) {
            self.categories.forget(kind, &name);
        }
        self.categories.register(kind, &name, categories);
    }

    pub fn finish(self) -> Schema {
        self.schema
    }
}

/// Every schema of a configuration plus their shared category index.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaSet {
    schemas: Vec<Schema>,
    categories: Categories,
}

impl SchemaSet {
    pub fn new(schemas: Vec<Schema>, categories: Categories) -> Self {
        Self {
            schemas,
            categories,
        }
    }

    pub fn get(&self, kind: SchemaKind) -> Option<&Schema> {
        self.schemas.iter().find(|schema| schema.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.iter()
    }

    pub fn categories(&self) -> &Categories {
        &self.categories
    }

    /// Looks up a declared value across all schemas.
    pub fn value(&self, kind: SchemaKind, name: &str) -> Option<&ConfigValue> {
        self.get(kind).and_then(|schema| schema.get(name))
    }
}
