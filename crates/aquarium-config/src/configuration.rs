//! The configuration facade: schemas, repositories and the derived sheet of
//! one document, plus the batched edit protocol used by editors.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::computed::{COMPUTED_SHEET, build_computed};
use crate::defaults::standard_schemas;
use crate::error::{ConfigError, EditError, SheetError};
use crate::repository::{Repository, RepositoryMut};
use crate::schema::{Categories, Category, Editor, Schema, SchemaKind, SchemaSet};
use crate::sheet::Cell;
use crate::value::{CellRef, Value};
use crate::workbook::{RecomputeStats, Workbook};

/// One requested change of a repository value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edit {
    pub schema: SchemaKind,
    pub name: String,
    pub value: Value,
}

impl Edit {
    pub fn new(schema: SchemaKind, name: &str, value: impl Into<Value>) -> Self {
        Self {
            schema,
            name: name.to_string(),
            value: value.into(),
        }
    }
}

/// Repository values keyed by sheet, then by name.
pub type ValueTree = BTreeMap<String, BTreeMap<String, Value>>;

impl Edit {
    /// Flattens a `Sheet -> Name -> value` mapping into edits, in key order.
    pub fn from_tree(tree: &ValueTree) -> Result<Vec<Edit>, ConfigError> {
        let mut edits = Vec::new();
        for (sheet, values) in tree {
            let schema: SchemaKind = sheet.parse()?;
            edits.extend(
                values
                    .iter()
                    .map(|(name, value)| Edit::new(schema, name, *value)),
            );
        }
        Ok(edits)
    }
}

/// A declared value with its current state and how to edit it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingEntry {
    pub schema: SchemaKind,
    pub name: String,
    pub description: String,
    pub value: Value,
    pub default: Value,
    pub editor: Editor,
    pub categories: Vec<Category>,
}

/// A change that was actually written by [`Configuration::apply_edits`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedEdit {
    pub schema: SchemaKind,
    pub name: String,
    pub old: Option<Value>,
    pub new: Value,
}

/// One row of the derived sheet as shown to users.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SheetEntry {
    Separator {
        label: String,
    },
    Cell {
        name: String,
        formula: String,
        value: Option<f64>,
        description: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct Configuration {
    schemas: Arc<SchemaSet>,
    workbook: Workbook,
}

impl Configuration {
    /// A configuration over an empty workbook.
    pub fn new() -> Result<Self, ConfigError> {
        Self::open(Workbook::new())
    }

    /// Attaches to `workbook` with the standard schemas: missing values are
    /// seeded, the derived sheet is built if absent, and everything is
    /// recomputed. Values already present are never overwritten.
    pub fn open(workbook: Workbook) -> Result<Self, ConfigError> {
        Self::open_with(standard_schemas()?, workbook)
    }

    pub fn open_with(schemas: Arc<SchemaSet>, workbook: Workbook) -> Result<Self, ConfigError> {
        let mut config = Self { schemas, workbook };
        let seeded = config.seed_defaults()?;
        if !config.workbook.has_sheet(COMPUTED_SHEET) {
            let rows = build_computed(&mut config.workbook)?;
            debug!(rows, "built derived sheet");
        }
        config.recompute()?;
        debug!(seeded, "configuration opened");
        Ok(config)
    }

    /// Writes the schema default of every value that has no cell yet, then
    /// recomputes. Returns how many values were seeded.
    pub fn set_defaults(&mut self) -> Result<usize, ConfigError> {
        let seeded = self.seed_defaults()?;
        self.recompute()?;
        Ok(seeded)
    }

    fn seed_defaults(&mut self) -> Result<usize, ConfigError> {
        let schemas = Arc::clone(&self.schemas);
        let mut seeded = 0;
        for schema in schemas.iter() {
            let mut repository = RepositoryMut::new(&mut self.workbook, schema.kind().sheet_name())?;
            for value in schema.iter() {
                if repository.set_default(value.name(), value.default_value())? {
                    seeded += 1;
                }
            }
        }
        Ok(seeded)
    }

    /// Recomputes every repository, then the derived sheet.
    pub fn recompute(&mut self) -> Result<RecomputeStats, ConfigError> {
        let mut stats = RecomputeStats::default();
        for kind in SchemaKind::ALL {
            if self.workbook.has_sheet(kind.sheet_name()) {
                stats += self.workbook.recompute_sheet(kind.sheet_name())?;
            }
        }
        if self.workbook.has_sheet(COMPUTED_SHEET) {
            stats += self.workbook.recompute_sheet(COMPUTED_SHEET)?;
        }
        Ok(stats)
    }

    pub fn schemas(&self) -> &SchemaSet {
        &self.schemas
    }

    pub fn schema(&self, kind: SchemaKind) -> Option<&Schema> {
        self.schemas.get(kind)
    }

    pub fn categories(&self) -> &Categories {
        self.schemas.categories()
    }

    /// `(schema, name)` pairs tagged with `category`, in registration order.
    pub fn category(&self, category: Category) -> &[(SchemaKind, String)] {
        self.schemas.categories().get(category)
    }

    pub fn repository(&self, kind: SchemaKind) -> Result<Repository<'_>, ConfigError> {
        Ok(Repository::new(&self.workbook, kind.sheet_name())?)
    }

    pub fn repository_mut(&mut self, kind: SchemaKind) -> Result<RepositoryMut<'_>, ConfigError> {
        Ok(RepositoryMut::new(&mut self.workbook, kind.sheet_name())?)
    }

    pub fn value(&self, cell: &CellRef) -> Result<Value, ConfigError> {
        Ok(self.workbook.value(&cell.sheet, &cell.name)?)
    }

    /// Looks up a dotted `Sheet.Name` address.
    pub fn value_str(&self, address: &str) -> Result<Value, ConfigError> {
        self.value(&address.parse()?)
    }

    pub fn computed(&self, name: &str) -> Result<f64, ConfigError> {
        Ok(self.workbook.value(COMPUTED_SHEET, name)?.as_f64())
    }

    pub fn number(&self, kind: SchemaKind, name: &str) -> Result<f64, ConfigError> {
        Ok(self.workbook.value(kind.sheet_name(), name)?.as_f64())
    }

    /// Boolean view of a repository value; numbers are true when non-zero.
    pub fn flag(&self, kind: SchemaKind, name: &str) -> Result<bool, ConfigError> {
        let value = self.workbook.value(kind.sheet_name(), name)?;
        Ok(value.as_bool().unwrap_or(value.as_f64() != 0.0))
    }

    /// Evaluates a free-standing formula such as `Computed.Width/2` against
    /// the current values.
    pub fn evaluate(&self, formula: &str) -> Result<f64, ConfigError> {
        Ok(self.workbook.evaluate_str(formula)?)
    }

    /// Applies a batch of edits atomically.
    ///
    /// Every edit is validated before anything is written; one invalid edit
    /// refuses the whole batch. Values equal to the stored ones are skipped,
    /// and the workbook is recomputed once if anything changed. Should that
    /// recompute fail, the previous values are restored.
    pub fn apply_edits(&mut self, edits: &[Edit]) -> Result<Vec<AppliedEdit>, ConfigError> {
        for edit in edits {
            if let Err(err) = self.validate(edit) {
                warn!(error = %err, edits = edits.len(), "edit batch rejected");
                return Err(err.into());
            }
        }

        let mut applied = Vec::new();
        for edit in edits {
            let sheet = edit.schema.sheet_name();
            let current = self.workbook.value(sheet, &edit.name).ok();
            if current == Some(edit.value) {
                continue;
            }
            let mut repository = RepositoryMut::new(&mut self.workbook, sheet)?;
            let old = repository.set(&edit.name, edit.value)?;
            info!(schema = %edit.schema, name = %edit.name, new = %edit.value, "updated value");
            applied.push(AppliedEdit {
                schema: edit.schema,
                name: edit.name.clone(),
                old,
                new: edit.value,
            });
        }

        if applied.is_empty() {
            return Ok(applied);
        }
        if let Err(err) = self.recompute() {
            warn!(error = %err, "recompute failed, restoring previous values");
            self.restore(&applied)?;
            return Err(err);
        }
        Ok(applied)
    }

    fn validate(&self, edit: &Edit) -> Result<(), EditError> {
        let declared = self
            .schemas
            .value(edit.schema, &edit.name)
            .ok_or_else(|| EditError::UnknownSetting {
                schema: edit.schema,
                name: edit.name.clone(),
            })?;
        declared.check(edit.value)
    }

    fn restore(&mut self, applied: &[AppliedEdit]) -> Result<(), ConfigError> {
        for edit in applied.iter().rev() {
            let mut repository = RepositoryMut::new(&mut self.workbook, edit.schema.sheet_name())?;
            match edit.old {
                Some(old) => {
                    repository.set(&edit.name, old)?;
                }
                None => {
                    repository.delete(&edit.name)?;
                }
            }
        }
        self.recompute()?;
        Ok(())
    }

    /// Stores the number of flanges placed by the last generation.
    pub fn set_flange_count(&mut self, count: usize) -> Result<(), ConfigError> {
        let value = Value::Number(count as f64);
        if matches!(self.workbook.cell(COMPUTED_SHEET, "FlangeCount"), Some(Cell::Value(current)) if *current == value)
        {
            return Ok(());
        }
        self.workbook
            .set(COMPUTED_SHEET, "FlangeCount", Cell::Value(value))?;
        self.recompute()?;
        Ok(())
    }

    /// The rows of the derived sheet in order, with their current values.
    pub fn computed_sheet(&self) -> Result<Vec<SheetEntry>, ConfigError> {
        let sheet = self
            .workbook
            .sheet(COMPUTED_SHEET)
            .ok_or_else(|| SheetError::UnknownSheet {
                sheet: COMPUTED_SHEET.to_string(),
            })?;
        let entries = sheet
            .rows()
            .filter_map(|row| {
                let cell = row.cell.as_ref()?;
                let entry = match (cell, row.alias.as_deref()) {
                    (Cell::Label(label), _) => SheetEntry::Separator {
                        label: label.clone(),
                    },
                    (Cell::Formula(formula), Some(name)) => SheetEntry::Cell {
                        name: name.to_string(),
                        formula: format!("={}", formula.source()),
                        value: self.computed(name).ok(),
                        description: row.description.clone(),
                    },
                    (Cell::Value(value), Some(name)) => SheetEntry::Cell {
                        name: name.to_string(),
                        formula: value.to_string(),
                        value: Some(value.as_f64()),
                        description: row.description.clone(),
                    },
                    (_, None) => return None,
                };
                Some(entry)
            })
            .collect();
        Ok(entries)
    }

    /// Every declared value in schema order.
    pub fn settings(&self) -> Result<Vec<SettingEntry>, ConfigError> {
        let mut entries = Vec::new();
        for schema in self.schemas.iter() {
            for declared in schema.iter() {
                entries.push(SettingEntry {
                    schema: schema.kind(),
                    name: declared.name().to_string(),
                    description: declared.description().to_string(),
                    value: self.workbook.value(schema.kind().sheet_name(), declared.name())?,
                    default: declared.default_value(),
                    editor: declared.editor(),
                    categories: self.categories().of(schema.kind(), declared.name()),
                });
            }
        }
        Ok(entries)
    }

    /// Current repository values, shaped like an edit file.
    pub fn values(&self) -> Result<ValueTree, ConfigError> {
        let mut tree = ValueTree::new();
        for kind in SchemaKind::ALL {
            let entries = self.repository(kind)?.entries()?;
            tree.insert(
                kind.sheet_name().to_string(),
                entries
                    .into_iter()
                    .map(|(name, value)| (name.to_string(), value))
                    .collect(),
            );
        }
        Ok(tree)
    }

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    pub fn into_workbook(self) -> Workbook {
        self.workbook
    }
}
