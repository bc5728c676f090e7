//! In-memory row source

use crate::spreadsheet::{CellValue, SpreadsheetRow};
use crate::traits::RowSource;
use crate::types::ImportResult;

/// Rows held in memory, numbered from 1 in insertion order
#[derive(Debug, Clone, Default)]
pub struct MemoryRowSource {
    rows: Vec<SpreadsheetRow>,
}

impl MemoryRowSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a source from plain cell lists, the first one being row 1
    pub fn from_cells(rows: Vec<Vec<CellValue>>) -> Self {
        let mut source = Self::new();
        for cells in rows {
            source.push_row(cells);
        }
        source
    }

    /// Append a row after the last one
    pub fn push_row(&mut self, cells: Vec<CellValue>) {
        let number = self.rows.len() + 1;
        self.rows.push(SpreadsheetRow::new(number, cells));
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl RowSource for MemoryRowSource {
    fn rows(&self) -> ImportResult<Vec<SpreadsheetRow>> {
        Ok(self.rows.clone())
    }
}
