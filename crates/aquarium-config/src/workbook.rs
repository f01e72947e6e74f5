//! Named sheets plus the evaluation state of their formula cells.
//!
//! Writing a cell marks it and everything that transitively depends on it
//! dirty. [`Workbook::recompute`] then evaluates dirty cells depth first,
//! resolving each reference (across sheets if needed) before the cell that
//! uses it. Cells that fail keep their last good value and stay dirty.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use aquarium_formula::{EvalError, Formula, Reference, Resolve};
use tracing::debug;

use crate::error::SheetError;
use crate::sheet::{Cell, Sheet};
use crate::value::{CellRef, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecomputeStats {
    pub evaluated: usize,
}

impl std::ops::AddAssign for RecomputeStats {
    fn add_assign(&mut self, other: Self) {
        self.evaluated += other.evaluated;
    }
}

#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
    values: HashMap<CellRef, f64>,
    dirty: HashSet<CellRef>,
    precedents: HashMap<CellRef, Vec<CellRef>>,
    dependents: HashMap<CellRef, BTreeSet<CellRef>>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheet(name).is_some()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name() == name)
    }

    pub fn sheets(&self) -> impl Iterator<Item = &Sheet> {
        self.sheets.iter()
    }

    /// Creates the sheet if it does not exist yet.
    pub fn ensure_sheet(&mut self, name: &str) -> Result<(), SheetError> {
        if self.has_sheet(name) {
            return Ok(());
        }
        if !aquarium_formula::is_identifier(name) {
            return Err(SheetError::InvalidAlias {
                alias: name.to_string(),
            });
        }
        self.sheets.push(Sheet::new(name));
        Ok(())
    }

    fn sheet_mut(&mut self, name: &str) -> Result<&mut Sheet, SheetError> {
        self.sheets
            .iter_mut()
            .find(|sheet| sheet.name() == name)
            .ok_or_else(|| SheetError::UnknownSheet {
                sheet: name.to_string(),
            })
    }

    fn existing(&self, name: &str) -> Result<&Sheet, SheetError> {
        self.sheet(name).ok_or_else(|| SheetError::UnknownSheet {
            sheet: name.to_string(),
        })
    }

    /// Stores `cell` under `alias`, overwriting its row or allocating the first empty one.
    pub fn set(&mut self, sheet: &str, alias: &str, cell: Cell) -> Result<usize, SheetError> {
        let target = self.existing(sheet)?;
        let row = target
            .row_of(alias)
            .unwrap_or_else(|| target.first_empty_row());
        self.write_row(sheet, row, Some(alias), cell, None)?;
        Ok(row)
    }

    /// Writes one row at a fixed position, as the derived sheet builder does.
    pub fn write_row(
        &mut self,
        sheet: &str,
        row: usize,
        alias: Option<&str>,
        cell: Cell,
        description: Option<&str>,
    ) -> Result<(), SheetError> {
        let previous_alias = self
            .existing(sheet)?
            .row(row)
            .and_then(|existing| existing.alias.clone());
        let precedents = match &cell {
            Cell::Formula(formula) => Some(qualified_references(sheet, formula)),
            _ => None,
        };
        let is_formula = precedents.is_some();

        self.sheet_mut(sheet)?
            .write(row, alias, cell, description)?;

        if let Some(previous) = previous_alias
            && Some(previous.as_str()) != alias
        {
            self.forget(&CellRef::new(sheet, previous));
        }
        let Some(alias) = alias else {
            return Ok(());
        };

        let key = CellRef::new(sheet, alias);
        self.unlink(&key);
        self.values.remove(&key);
        self.dirty.remove(&key);
        if let Some(precedents) = precedents {
            for precedent in &precedents {
                self.dependents
                    .entry(precedent.clone())
                    .or_default()
                    .insert(key.clone());
            }
            self.precedents.insert(key.clone(), precedents);
        }
        if is_formula {
            self.dirty.insert(key.clone());
        }
        self.invalidate_dependents(&key);
        Ok(())
    }

    /// Empties the cell bound to `alias`; returns false if there was none.
    pub fn clear(&mut self, sheet: &str, alias: &str) -> Result<bool, SheetError> {
        let removed = self.sheet_mut(sheet)?.clear(alias).is_some();
        if removed {
            self.forget(&CellRef::new(sheet, alias));
        }
        Ok(removed)
    }

    fn forget(&mut self, key: &CellRef) {
        self.unlink(key);
        self.values.remove(key);
        self.dirty.remove(key);
        self.invalidate_dependents(key);
    }

    fn unlink(&mut self, key: &CellRef) {
        if let Some(old) = self.precedents.remove(key) {
            for precedent in old {
                if let Some(set) = self.dependents.get_mut(&precedent) {
                    set.remove(key);
                    if set.is_empty() {
                        self.dependents.remove(&precedent);
                    }
                }
            }
        }
    }

    fn invalidate_dependents(&mut self, key: &CellRef) {
        let mut queue: Vec<CellRef> = self
            .dependents
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        while let Some(next) = queue.pop() {
            if self.dirty.insert(next.clone())
                && let Some(set) = self.dependents.get(&next)
            {
                queue.extend(set.iter().cloned());
            }
        }
    }

    pub fn cell(&self, sheet: &str, alias: &str) -> Option<&Cell> {
        self.sheet(sheet).and_then(|sheet| sheet.cell(alias))
    }

    pub fn formula(&self, sheet: &str, alias: &str) -> Option<&Formula> {
        match self.cell(sheet, alias)? {
            Cell::Formula(formula) => Some(formula),
            _ => None,
        }
    }

    /// Current value of a cell; formula cells yield their last good value.
    pub fn value(&self, sheet: &str, alias: &str) -> Result<Value, SheetError> {
        let cell = self
            .existing(sheet)?
            .cell(alias)
            .ok_or_else(|| SheetError::UnknownKey {
                sheet: sheet.to_string(),
                name: alias.to_string(),
            })?;
        match cell {
            Cell::Value(value) => Ok(*value),
            Cell::Formula(_) => self
                .values
                .get(&CellRef::new(sheet, alias))
                .map(|value| Value::Number(*value))
                .ok_or_else(|| SheetError::NotComputed {
                    cell: format!("{sheet}.{alias}"),
                }),
            Cell::Label(_) => Err(SheetError::UnknownKey {
                sheet: sheet.to_string(),
                name: alias.to_string(),
            }),
        }
    }

    /// Whether the cell has changes that a recompute has not absorbed yet.
    pub fn is_stale(&self, sheet: &str, alias: &str) -> bool {
        self.dirty.contains(&CellRef::new(sheet, alias))
    }

    pub fn needs_recompute(&self) -> bool {
        !self.dirty.is_empty()
            || self.sheets.iter().any(|sheet| {
                sheet.aliased().any(|(_, alias, cell)| {
                    matches!(cell, Cell::Formula(_))
                        && !self.values.contains_key(&CellRef::new(sheet.name(), alias))
                })
            })
    }

    /// Cells the formula at `cell` reads, qualified with their sheet.
    pub fn precedents(&self, cell: &CellRef) -> &[CellRef] {
        self.precedents.get(cell).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn dependents(&self, cell: &CellRef) -> Vec<&CellRef> {
        self.dependents
            .get(cell)
            .map(|set| set.iter().collect())
            .unwrap_or_default()
    }

    pub fn recompute(&mut self) -> Result<RecomputeStats, SheetError> {
        let pending = self.pending(None);
        self.evaluate_cells(&pending)
    }

    /// Recomputes one sheet and whatever its cells transitively need.
    pub fn recompute_sheet(&mut self, sheet: &str) -> Result<RecomputeStats, SheetError> {
        self.existing(sheet)?;
        let pending = self.pending(Some(sheet));
        self.evaluate_cells(&pending)
    }

    fn pending(&self, only: Option<&str>) -> Vec<CellRef> {
        self.sheets
            .iter()
            .filter(|sheet| only.is_none_or(|name| sheet.name() == name))
            .flat_map(|sheet| {
                sheet
                    .aliased()
                    .filter(|(_, _, cell)| matches!(cell, Cell::Formula(_)))
                    .map(|(_, alias, _)| CellRef::new(sheet.name(), alias))
            })
            .filter(|key| self.dirty.contains(key) || !self.values.contains_key(key))
            .collect()
    }

    fn evaluate_cells(&mut self, targets: &[CellRef]) -> Result<RecomputeStats, SheetError> {
        let mut evaluation = Evaluation {
            sheets: &self.sheets,
            values: &mut self.values,
            dirty: &mut self.dirty,
            stack: Vec::new(),
            evaluated: 0,
        };
        for target in targets {
            evaluation.value_of(target, None)?;
        }
        let stats = RecomputeStats {
            evaluated: evaluation.evaluated,
        };
        debug!(evaluated = stats.evaluated, "recompute finished");
        Ok(stats)
    }

    /// Evaluates a free-standing formula against current values.
    ///
    /// References must be qualified with a sheet; stale formula cells are
    /// reported instead of being recomputed.
    pub fn evaluate(&self, formula: &Formula) -> Result<f64, SheetError> {
        let mut snapshot = Snapshot { workbook: self };
        formula
            .evaluate(&mut snapshot)
            .map_err(|failure| failure.into_sheet_error(formula.source()))
    }

    pub fn evaluate_str(&self, source: &str) -> Result<f64, SheetError> {
        let formula = Formula::parse(source).map_err(|source_err| SheetError::Formula {
            cell: source.trim().to_string(),
            source: source_err,
        })?;
        self.evaluate(&formula)
    }

    /// Every reference that does not point at an existing cell, without evaluating.
    pub fn check_references(&self) -> Vec<SheetError> {
        let mut unresolved = Vec::new();
        for sheet in &self.sheets {
            for (_, alias, cell) in sheet.aliased() {
                let Cell::Formula(formula) = cell else {
                    continue;
                };
                for target in qualified_references(sheet.name(), formula) {
                    if !matches!(
                        self.cell(&target.sheet, &target.name),
                        Some(Cell::Value(_) | Cell::Formula(_))
                    ) {
                        unresolved.push(SheetError::UnresolvedReference {
                            reference: target.to_string(),
                            cell: format!("{}.{alias}", sheet.name()),
                        });
                    }
                }
            }
        }
        unresolved
    }
}

fn qualified_references(sheet: &str, formula: &Formula) -> Vec<CellRef> {
    formula
        .references()
        .into_iter()
        .map(|reference| CellRef::new(reference.sheet_or(sheet), &reference.name))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

enum Failure {
    Sheet(SheetError),
    Eval(EvalError),
}

impl From<EvalError> for Failure {
    fn from(err: EvalError) -> Self {
        Failure::Eval(err)
    }
}

impl From<SheetError> for Failure {
    fn from(err: SheetError) -> Self {
        Failure::Sheet(err)
    }
}

impl Failure {
    fn into_sheet_error(self, cell: &str) -> SheetError {
        match self {
            Failure::Sheet(err) => err,
            Failure::Eval(source) => SheetError::Evaluation {
                cell: cell.to_string(),
                source,
            },
        }
    }
}

fn lookup<'w>(sheets: &'w [Sheet], key: &CellRef) -> Option<&'w Cell> {
    sheets
        .iter()
        .find(|sheet| sheet.name() == key.sheet)
        .and_then(|sheet| sheet.cell(&key.name))
}

struct Evaluation<'w> {
    sheets: &'w [Sheet],
    values: &'w mut HashMap<CellRef, f64>,
    dirty: &'w mut HashSet<CellRef>,
    stack: Vec<CellRef>,
    evaluated: usize,
}

impl<'w> Evaluation<'w> {
    fn value_of(&mut self, key: &CellRef, referrer: Option<&CellRef>) -> Result<f64, SheetError> {
        let sheets = self.sheets;
        let formula: &'w Arc<Formula> = match lookup(sheets, key) {
            Some(Cell::Value(value)) => return Ok(value.as_f64()),
            Some(Cell::Formula(formula)) => formula,
            Some(Cell::Label(_)) | None => {
                return Err(match referrer {
                    Some(referrer) => SheetError::UnresolvedReference {
                        reference: key.to_string(),
                        cell: referrer.to_string(),
                    },
                    None => SheetError::UnknownKey {
                        sheet: key.sheet.clone(),
                        name: key.name.clone(),
                    },
                });
            }
        };

        if !self.dirty.contains(key)
            && let Some(value) = self.values.get(key)
        {
            return Ok(*value);
        }

        if let Some(start) = self.stack.iter().position(|entry| entry == key) {
            let mut cycle: Vec<String> = self.stack[start..].iter().map(ToString::to_string).collect();
            cycle.push(key.to_string());
            return Err(SheetError::CyclicDependency { cycle });
        }

        self.stack.push(key.clone());
        let result = formula.evaluate(&mut Scope {
            evaluation: self,
            cell: key,
        });
        self.stack.pop();

        let value = result.map_err(|failure| failure.into_sheet_error(&key.to_string()))?;
        self.values.insert(key.clone(), value);
        self.dirty.remove(key);
        self.evaluated += 1;
        Ok(value)
    }
}

struct Scope<'a, 'w> {
    evaluation: &'a mut Evaluation<'w>,
    cell: &'a CellRef,
}

impl Resolve for Scope<'_, '_> {
    type Error = Failure;

    fn resolve(&mut self, reference: &Reference) -> Result<f64, Failure> {
        let key = CellRef::new(reference.sheet_or(&self.cell.sheet), &reference.name);
        Ok(self.evaluation.value_of(&key, Some(self.cell))?)
    }
}

struct Snapshot<'w> {
    workbook: &'w Workbook,
}

impl Resolve for Snapshot<'_> {
    type Error = Failure;

    fn resolve(&mut self, reference: &Reference) -> Result<f64, Failure> {
        let Some(sheet) = reference.sheet.as_deref() else {
            return Err(SheetError::UnresolvedReference {
                reference: reference.to_string(),
                cell: "formula (references must name their sheet)".to_string(),
            }
            .into());
        };
        if self.workbook.is_stale(sheet, &reference.name) {
            return Err(SheetError::NotComputed {
                cell: reference.to_string(),
            }
            .into());
        }
        match self.workbook.value(sheet, &reference.name) {
            Ok(value) => Ok(value.as_f64()),
            Err(SheetError::UnknownKey { .. } | SheetError::UnknownSheet { .. }) => {
                Err(SheetError::UnresolvedReference {
                    reference: reference.to_string(),
                    cell: "formula".to_string(),
                }
                .into())
            }
            Err(err) => Err(err.into()),
        }
    }
}
