use crate::error::SheetError;
use crate::sheet::Cell;
use crate::workbook::Workbook;

/// Appends formula rows to a derived sheet, one row per call.
#[derive(Debug)]
pub struct DerivedSheet<'w> {
    workbook: &'w mut Workbook,
    sheet: String,
    line: usize,
}

impl<'w> DerivedSheet<'w> {
    /// Starts writing after the last allocated row of `sheet`, creating it if needed.
    pub fn open(workbook: &'w mut Workbook, sheet: &str) -> Result<Self, SheetError> {
        workbook.ensure_sheet(sheet)?;
        let line = workbook
            .sheet(sheet)
            .map(|existing| existing.row_count())
            .unwrap_or_default();
        Ok(Self {
            workbook,
            sheet: sheet.to_string(),
            line,
        })
    }

    /// Adds `name` bound to `formula` (`=...`) or to a numeric constant.
    pub fn add(&mut self, name: &str, formula: &str) -> Result<&mut Self, SheetError> {
        self.push(name, formula, None)
    }

    pub fn add_described(
        &mut self,
        name: &str,
        formula: &str,
        description: &str,
    ) -> Result<&mut Self, SheetError> {
        self.push(name, formula, Some(description))
    }

    /// Adds a separator row; it is never evaluated.
    pub fn sep(&mut self, label: &str) -> Result<&mut Self, SheetError> {
        self.workbook.write_row(
            &self.sheet,
            self.line,
            None,
            Cell::Label(label.to_string()),
            None,
        )?;
        self.line += 1;
        Ok(self)
    }

    fn push(
        &mut self,
        name: &str,
        formula: &str,
        description: Option<&str>,
    ) -> Result<&mut Self, SheetError> {
        let cell = Cell::parse_input(&format!("{}.{name}", self.sheet), formula)?;
        self.workbook
            .write_row(&self.sheet, self.line, Some(name), cell, description)?;
        self.line += 1;
        Ok(self)
    }

    pub fn rows_written(&self) -> usize {
        self.line
    }
}
