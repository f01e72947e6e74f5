use std::collections::HashMap;
use std::sync::Arc;

use aquarium_formula::{Formula, is_identifier};

use crate::error::SheetError;
use crate::value::Value;

/// Content of one sheet row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Value(Value),
    Formula(Arc<Formula>),
    /// Documentation only; never evaluated or referenced.
    Label(String),
}

impl Cell {
    /// Interprets user text: `=...` is a formula, anything else must be a number.
    pub fn parse_input(cell: &str, text: &str) -> Result<Cell, SheetError> {
        let trimmed = text.trim();
        if trimmed.starts_with('=') {
            let formula = Formula::parse(trimmed).map_err(|source| SheetError::Formula {
                cell: cell.to_string(),
                source,
            })?;
            return Ok(Cell::Formula(Arc::new(formula)));
        }
        trimmed
            .parse::<f64>()
            .map(|number| Cell::Value(Value::Number(number)))
            .map_err(|_| SheetError::InvalidConstant {
                cell: cell.to_string(),
                text: text.to_string(),
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub cell: Option<Cell>,
    pub alias: Option<String>,
    pub description: Option<String>,
}

impl Row {
    pub fn is_empty(&self) -> bool {
        self.cell.is_none()
    }
}

/// Sparse row store with aliases mapping names to rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    name: String,
    rows: Vec<Row>,
    aliases: HashMap<String, usize>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            aliases: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn row_of(&self, alias: &str) -> Option<usize> {
        self.aliases.get(alias).copied()
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn cell(&self, alias: &str) -> Option<&Cell> {
        self.row_of(alias)
            .and_then(|index| self.rows[index].cell.as_ref())
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.cell(alias).is_some()
    }

    /// Number of rows ever allocated, populated or not.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn populated_rows(&self) -> usize {
        self.rows.iter().filter(|row| !row.is_empty()).count()
    }

    /// Aliased, populated rows in row order.
    pub fn aliased(&self) -> impl Iterator<Item = (usize, &str, &Cell)> {
        self.rows.iter().enumerate().filter_map(|(index, row)| {
            match (row.alias.as_deref(), row.cell.as_ref()) {
                (Some(alias), Some(cell)) => Some((index, alias, cell)),
                _ => None,
            }
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    /// First row whose cell is empty, or a fresh row past the end.
    pub(crate) fn first_empty_row(&self) -> usize {
        self.rows
            .iter()
            .position(Row::is_empty)
            .unwrap_or(self.rows.len())
    }

    /// Writes `row`, binding `alias` to it. Returns the cell previously stored there.
    pub(crate) fn write(
        &mut self,
        index: usize,
        alias: Option<&str>,
        cell: Cell,
        description: Option<&str>,
    ) -> Result<Option<Cell>, SheetError> {
        if let Some(alias) = alias {
            if !is_identifier(alias) {
                return Err(SheetError::InvalidAlias {
                    alias: alias.to_string(),
                });
            }
            if let Some(&bound) = self.aliases.get(alias)
                && bound != index
            {
                return Err(SheetError::AliasInUse {
                    sheet: self.name.clone(),
                    alias: alias.to_string(),
                });
            }
        }

        if self.rows.len() <= index {
            self.rows.resize_with(index + 1, Row::default);
        }

        let row = &mut self.rows[index];
        if let Some(old) = row.alias.take()
            && Some(old.as_str()) != alias
        {
            self.aliases.remove(&old);
        }
        row.alias = alias.map(str::to_string);
        if let Some(alias) = alias {
            self.aliases.insert(alias.to_string(), index);
        }
        if description.is_some() {
            row.description = description.map(str::to_string);
        }
        Ok(row.cell.replace(cell))
    }

    /// Empties the row bound to `alias` and releases the alias.
    pub(crate) fn clear(&mut self, alias: &str) -> Option<Cell> {
        let index = self.aliases.remove(alias)?;
        let row = &mut self.rows[index];
        row.alias = None;
        row.description = None;
        row.cell.take()
    }
}
