//! Mapping views over one repository sheet (`Config`, `ConfigPipesDrain`, ...).

use crate::error::SheetError;
use crate::sheet::{Cell, Sheet};
use crate::value::Value;
use crate::workbook::{RecomputeStats, Workbook};

/// Read-only view of a repository.
#[derive(Debug, Clone, Copy)]
pub struct Repository<'w> {
    workbook: &'w Workbook,
    sheet: &'w Sheet,
}

impl<'w> Repository<'w> {
    pub fn new(workbook: &'w Workbook, sheet: &str) -> Result<Self, SheetError> {
        let sheet = workbook
            .sheet(sheet)
            .ok_or_else(|| SheetError::UnknownSheet {
                sheet: sheet.to_string(),
            })?;
        Ok(Self { workbook, sheet })
    }

    pub fn name(&self) -> &'w str {
        self.sheet.name()
    }

    pub fn get(&self, name: &str) -> Result<Value, SheetError> {
        self.workbook.value(self.sheet.name(), name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sheet.contains(name)
    }

    /// Number of populated rows.
    pub fn len(&self) -> usize {
        self.sheet.populated_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of the populated rows in row order.
    pub fn names(&self) -> Names<'w> {
        Names {
            sheet: self.sheet,
            row: 0,
            remaining: self.len(),
        }
    }

    /// `(name, value)` pairs in row order.
    pub fn entries(&self) -> Result<Vec<(&'w str, Value)>, SheetError> {
        self.names()
            .map(|name| {
                let name = name?;
                Ok((name, self.get(name)?))
            })
            .collect()
    }
}

/// Bounded iterator over the aliases of populated rows.
///
/// Stops after exactly as many names as there are populated rows; a
/// populated row without an alias is reported instead of skipped.
#[derive(Debug, Clone)]
pub struct Names<'w> {
    sheet: &'w Sheet,
    row: usize,
    remaining: usize,
}

impl<'w> Iterator for Names<'w> {
    type Item = Result<&'w str, SheetError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining > 0 {
            let index = self.row;
            let row = self.sheet.row(index)?;
            self.row += 1;
            if row.is_empty() {
                continue;
            }
            self.remaining -= 1;
            return Some(row.alias.as_deref().ok_or_else(|| SheetError::UnknownKey {
                sheet: self.sheet.name().to_string(),
                name: format!("<unaliased row {index}>"),
            }));
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

/// Mutable view of a repository.
#[derive(Debug)]
pub struct RepositoryMut<'w> {
    workbook: &'w mut Workbook,
    sheet: String,
}

impl<'w> RepositoryMut<'w> {
    pub fn new(workbook: &'w mut Workbook, sheet: &str) -> Result<Self, SheetError> {
        workbook.ensure_sheet(sheet)?;
        Ok(Self {
            workbook,
            sheet: sheet.to_string(),
        })
    }

    pub fn view(&self) -> Repository<'_> {
        Repository {
            workbook: self.workbook,
            sheet: self
                .workbook
                .sheet(&self.sheet)
                .unwrap_or_else(|| unreachable!("sheet created in RepositoryMut::new")),
        }
    }

    pub fn get(&self, name: &str) -> Result<Value, SheetError> {
        self.workbook.value(&self.sheet, name)
    }

    pub fn len(&self) -> usize {
        self.view().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores `value`, returning the previous literal value if there was one.
    pub fn set(&mut self, name: &str, value: Value) -> Result<Option<Value>, SheetError> {
        let previous = match self.workbook.cell(&self.sheet, name) {
            Some(Cell::Value(old)) => Some(*old),
            _ => None,
        };
        self.workbook.set(&self.sheet, name, Cell::Value(value))?;
        Ok(previous)
    }

    /// Stores `value` only if `name` has no cell yet. Returns whether it was stored.
    pub fn set_default(&mut self, name: &str, value: Value) -> Result<bool, SheetError> {
        if self.workbook.cell(&self.sheet, name).is_some() {
            return Ok(false);
        }
        self.workbook.set(&self.sheet, name, Cell::Value(value))?;
        Ok(true)
    }

    /// Clears the row bound to `name` and releases the alias.
    ///
    /// The emptied row stays in place as a tombstone, and the next `set` of
    /// any new name claims it, so that name then iterates in this position.
    pub fn delete(&mut self, name: &str) -> Result<Option<Value>, SheetError> {
        let previous = self.get(name).ok();
        if !self.workbook.clear(&self.sheet, name)? {
            return Err(SheetError::UnknownKey {
                sheet: self.sheet.clone(),
                name: name.to_string(),
            });
        }
        Ok(previous)
    }

    pub fn recompute(&mut self) -> Result<RecomputeStats, SheetError> {
        self.workbook.recompute_sheet(&self.sheet)
    }
}

#[cfg(test)]
mod tests {
    use super::{Repository, RepositoryMut};
    use crate::error::SheetError;
    use crate::value::Value;
    use crate::workbook::Workbook;

    fn names(workbook: &Workbook) -> Vec<String> {
        Repository::new(workbook, "Config")
            .expect("sheet exists")
            .names()
            .map(|name| name.expect("aliased row").to_string())
            .collect()
    }

    #[test]
    fn set_allocates_rows_and_overwrites_in_place() {
        let mut workbook = Workbook::new();
        let mut repo = RepositoryMut::new(&mut workbook, "Config").expect("repo");
        assert_eq!(repo.set("Width", Value::Number(1200.0)).expect("set"), None);
        repo.set("Length", Value::Number(580.0)).expect("set");
        assert_eq!(
            repo.set("Width", Value::Number(800.0)).expect("set"),
            Some(Value::Number(1200.0))
        );
        assert_eq!(repo.len(), 2);
        assert_eq!(repo.get("Width").expect("get"), Value::Number(800.0));
        assert_eq!(names(&workbook), vec!["Width", "Length"]);
    }

    #[test]
    fn unknown_key_is_reported() {
        let mut workbook = Workbook::new();
        RepositoryMut::new(&mut workbook, "Config").expect("repo");
        let repo = Repository::new(&workbook, "Config").expect("repo");
        let err = repo.get("Nope").expect_err("unknown name");
        assert_eq!(
            err,
            SheetError::UnknownKey {
                sheet: "Config".into(),
                name: "Nope".into()
            }
        );
    }

    #[test]
    fn delete_leaves_a_tombstone_that_later_sets_reuse() {
        let mut workbook = Workbook::new();
        let mut repo = RepositoryMut::new(&mut workbook, "Config").expect("repo");
        repo.set("A", Value::Number(1.0)).expect("set");
        repo.set("B", Value::Number(2.0)).expect("set");
        repo.set("C", Value::Number(3.0)).expect("set");

        assert_eq!(repo.delete("A").expect("delete"), Some(Value::Number(1.0)));
        assert!(repo.get("A").is_err());
        assert_eq!(repo.len(), 2);
        assert!(matches!(repo.delete("A"), Err(SheetError::UnknownKey { .. })));

        repo.set("D", Value::Number(4.0)).expect("set");
        // D took the first empty row, so it now iterates before B.
        assert_eq!(names(&workbook), vec!["D", "B", "C"]);
    }

    #[test]
    fn iteration_is_bounded_by_populated_rows() {
        let mut workbook = Workbook::new();
        let mut repo = RepositoryMut::new(&mut workbook, "Config").expect("repo");
        for (index, name) in ["A", "B", "C", "D"].iter().enumerate() {
            repo.set(name, Value::Number(index as f64)).expect("set");
        }
        repo.delete("B").expect("delete");
        repo.delete("D").expect("delete");

        let repo = Repository::new(&workbook, "Config").expect("repo");
        let mut names = repo.names();
        assert_eq!(names.next().map(|n| n.expect("name")), Some("A"));
        assert_eq!(names.next().map(|n| n.expect("name")), Some("C"));
        assert!(names.next().is_none());
        assert!(names.next().is_none());
        assert_eq!(
            repo.entries().expect("entries"),
            vec![("A", Value::Number(0.0)), ("C", Value::Number(2.0))]
        );
    }

    #[test]
    fn set_default_never_overwrites() {
        let mut workbook = Workbook::new();
        let mut repo = RepositoryMut::new(&mut workbook, "Config").expect("repo");
        assert!(repo.set_default("Width", Value::Number(1200.0)).expect("seed"));
        repo.set("Width", Value::Number(999.0)).expect("set");
        assert!(!repo.set_default("Width", Value::Number(1200.0)).expect("seed"));
        assert_eq!(repo.get("Width").expect("get"), Value::Number(999.0));
    }
}
