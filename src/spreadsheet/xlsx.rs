//! Workbook decoding backed by calamine

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::NaiveDate;
use std::io::Cursor;

use super::cell::{excel_serial_to_date, CellValue, SpreadsheetRow};
use crate::traits::RowSource;
use crate::types::{ImportError, ImportResult};

/// Rows of the first worksheet of an uploaded workbook
///
/// xlsx, xlsm, xls and ods are detected from the content.
#[derive(Debug, Clone)]
pub struct XlsxRowSource {
    sheet_name: String,
    rows: Vec<SpreadsheetRow>,
}

impl XlsxRowSource {
    /// Decode workbook bytes, failing on anything unreadable
    pub fn from_bytes(bytes: &[u8]) -> ImportResult<Self> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|e| ImportError::Spreadsheet(format!("failed to open workbook: {e}")))?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::Spreadsheet("workbook has no sheets".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
            ImportError::Spreadsheet(format!("failed to read sheet '{sheet_name}': {e}"))
        })?;

        // The used range may start below row 1 or right of column A
        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        let mut rows: Vec<SpreadsheetRow> = (0..start_row as usize)
            .map(|index| SpreadsheetRow::new(index + 1, Vec::new()))
            .collect();

        for (offset, cells) in range.rows().enumerate() {
            let mut values = vec![CellValue::Empty; start_col as usize];
            values.extend(cells.iter().map(cell_value));
            rows.push(SpreadsheetRow::new(start_row as usize + offset + 1, values));
        }

        tracing::debug!(sheet = %sheet_name, rows = rows.len(), "decoded workbook");
        Ok(Self { sheet_name, rows })
    }

    /// Name of the sheet the rows were read from
    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }
}

impl RowSource for XlsxRowSource {
    fn rows(&self) -> ImportResult<Vec<SpreadsheetRow>> {
        Ok(self.rows.clone())
    }
}

fn cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(text) => CellValue::Text(text.clone()),
        Data::Int(value) => CellValue::Int(*value),
        Data::Float(value) => CellValue::Float(*value),
        Data::Bool(value) => CellValue::Bool(*value),
        Data::DateTime(value) => {
            let serial = value.as_f64();
            excel_serial_to_date(serial)
                .map(CellValue::Date)
                .unwrap_or(CellValue::Float(serial))
        }
        Data::DateTimeIso(text) => text
            .get(..10)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
            .map(CellValue::Date)
            .unwrap_or_else(|| CellValue::Text(text.clone())),
        Data::DurationIso(text) => CellValue::Text(text.clone()),
        Data::Error(error) => CellValue::Text(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKS_XLSX: &[u8] = include_bytes!("../../tests/fixtures/checks.xlsx");
    const OFFSET_XLSX: &[u8] = include_bytes!("../../tests/fixtures/offset.xlsx");

    fn text(value: &str) -> CellValue {
        CellValue::Text(value.to_string())
    }

    #[test]
    fn test_reads_first_sheet_of_workbook() {
        let source = XlsxRowSource::from_bytes(CHECKS_XLSX).unwrap();
        assert_eq!(source.sheet_name(), "Cheques");

        let rows = source.rows().unwrap();
        let numbers: Vec<usize> = rows.iter().map(|row| row.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);

        assert_eq!(rows[0].cell(0), &text("Cliente"));
        assert_eq!(rows[1].cell(0), &text("Acme SA"));
        assert_eq!(rows[1].cell(1), &CellValue::Float(1500.5));
        assert_eq!(rows[1].cell(4).as_text().as_deref(), Some("12345"));
        assert_eq!(
            rows[1].cell(5),
            &CellValue::Date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
        );
        assert_eq!(rows[1].cell(6), &text("galicia"));

        // Missing cells inside the used range read as empty
        assert!(rows[2].cell(1).is_blank());
        assert!(rows[2].cell(6).is_blank());
        assert_eq!(rows[3].cell(1), &text("1.234.567"));
    }

    #[test]
    fn test_used_range_offset_is_padded() {
        let source = XlsxRowSource::from_bytes(OFFSET_XLSX).unwrap();
        let rows = source.rows().unwrap();

        let numbers: Vec<usize> = rows.iter().map(|row| row.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert!(rows[0].is_blank());
        assert!(rows[1].is_blank());

        assert_eq!(rows[2].cell(0), &CellValue::Empty);
        assert_eq!(rows[2].cell(1), &CellValue::Empty);
        assert_eq!(rows[2].cell(2), &text("Cliente"));
        assert_eq!(rows[3].cell(2), &text("Acme SA"));
        assert_eq!(
            rows[3].cell(3).as_amount().unwrap(),
            Some(bigdecimal::BigDecimal::from(250))
        );
    }

    #[test]
    fn test_corrupt_workbook_fails() {
        let err = XlsxRowSource::from_bytes(b"definitely not a workbook").unwrap_err();
        assert!(matches!(err, ImportError::Spreadsheet(_)));
    }

    #[test]
    fn test_empty_upload_fails() {
        let err = XlsxRowSource::from_bytes(&[]).unwrap_err();
        assert!(matches!(err, ImportError::Spreadsheet(_)));
    }

    #[test]
    fn test_iso_datetime_cells_become_dates() {
        let value = cell_value(&Data::DateTimeIso("2024-05-01T00:00:00".to_string()));
        assert_eq!(value, CellValue::Date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()));

        let value = cell_value(&Data::String("cheque".to_string()));
        assert_eq!(value, CellValue::Text("cheque".to_string()));
    }
}
