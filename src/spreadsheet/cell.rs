//! Loosely typed cell values and their conversions

use bigdecimal::BigDecimal;
use chrono::{Days, NaiveDate};
use std::str::FromStr;

/// Text formats accepted for dates typed as text
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];

/// A single cell as delivered by the spreadsheet reader
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl CellValue {
    /// True for empty cells and whitespace-only text
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Trimmed textual form, `None` when blank
    ///
    /// Integral floats drop their fraction so that a check number typed as
    /// a number reads `12345`, not `12345.0`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            CellValue::Int(value) => Some(value.to_string()),
            CellValue::Float(value) => Some(format_float(*value)),
            CellValue::Bool(value) => Some(value.to_string()),
            CellValue::Date(date) => Some(date.format("%Y-%m-%d").to_string()),
        }
    }

    /// Numeric value of the cell, `None` when blank
    pub fn as_amount(&self) -> Result<Option<BigDecimal>, String> {
        match self {
            CellValue::Empty => Ok(None),
            CellValue::Int(value) => Ok(Some(BigDecimal::from(*value))),
            CellValue::Float(value) => {
                if !value.is_finite() {
                    return Err(format!("'{value}' is not a finite number"));
                }
                BigDecimal::from_str(&value.to_string())
                    .map(Some)
                    .map_err(|e| format!("'{value}' is not a number: {e}"))
            }
            CellValue::Text(text) => parse_amount_text(text),
            CellValue::Bool(_) | CellValue::Date(_) => {
                Err(format!("'{}' is not a number", self.as_text().unwrap_or_default()))
            }
        }
    }

    /// Calendar date of the cell, `None` when blank
    ///
    /// Numbers are read as excel date serials.
    pub fn as_date(&self) -> Result<Option<NaiveDate>, String> {
        match self {
            CellValue::Empty => Ok(None),
            CellValue::Date(date) => Ok(Some(*date)),
            CellValue::Int(serial) => excel_serial_to_date(*serial as f64)
                .map(Some)
                .ok_or_else(|| format!("{serial} is not a valid date serial")),
            CellValue::Float(serial) => excel_serial_to_date(*serial)
                .map(Some)
                .ok_or_else(|| format!("{serial} is not a valid date serial")),
            CellValue::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                parse_date_text(trimmed)
                    .map(Some)
                    .ok_or_else(|| format!("'{trimmed}' is not a recognised date"))
            }
            CellValue::Bool(value) => Err(format!("'{value}' is not a date")),
        }
    }
}

/// One row of the sheet with its 1-based row number
#[derive(Debug, Clone, PartialEq)]
pub struct SpreadsheetRow {
    pub number: usize,
    pub cells: Vec<CellValue>,
}

impl SpreadsheetRow {
    pub fn new(number: usize, cells: Vec<CellValue>) -> Self {
        Self { number, cells }
    }

    /// Cell at a zero-based column, empty past the end of the row
    pub fn cell(&self, index: usize) -> &CellValue {
        const EMPTY: &CellValue = &CellValue::Empty;
        self.cells.get(index).unwrap_or(EMPTY)
    }

    /// True when every cell is blank
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(CellValue::is_blank)
    }
}

/// Convert an excel date serial (days since 1899-12-30) to a date
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_days(Days::new(serial.floor() as u64))
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Parse a typed amount such as `1.234,50`, `1,234.50`, `1.234.567` or `$ 100`
///
/// With both separators present the last one is the decimal mark. A single
/// kind of separator is grouping when it repeats, or when it appears once
/// followed by exactly three digits after a non-zero integer part.
fn parse_amount_text(text: &str) -> Result<Option<BigDecimal>, String> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '$')
        .collect();
    if cleaned.is_empty() {
        return Ok(None);
    }

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) => normalize_single_separator(&cleaned, ','),
        (None, Some(_)) => normalize_single_separator(&cleaned, '.'),
        (None, None) => cleaned,
    };

    BigDecimal::from_str(&normalized)
        .map(Some)
        .map_err(|_| format!("'{}' is not a number", text.trim()))
}

fn normalize_single_separator(text: &str, separator: char) -> String {
    let parts: Vec<&str> = text.split(separator).collect();
    let (head, groups) = match parts.split_first() {
        Some((head, groups)) => (head.trim_start_matches(['-', '+']), groups),
        None => return text.to_string(),
    };
    let digits = |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit());
    let grouped = digits(head)
        && head.len() <= 3
        && groups.iter().all(|group| group.len() == 3 && digits(group));

    match groups.len() {
        // `0.125` is a fraction, `1.234` is a thousand
        1 if grouped && !head.trim_start_matches('0').is_empty() => parts.concat(),
        1 => text.replace(separator, "."),
        _ if grouped => parts.concat(),
        // Left as is so that parsing reports it
        _ => text.to_string(),
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    // Drop a trailing time part, e.g. `2024-05-01 10:30:00` or `2024-05-01T10:30:00`
    let date_part = text
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or(text);

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_text_of_numeric_check_number() {
        assert_eq!(CellValue::Float(12345.0).as_text().as_deref(), Some("12345"));
        assert_eq!(CellValue::Int(77).as_text().as_deref(), Some("77"));
        assert_eq!(CellValue::Text("  ".to_string()).as_text(), None);
        assert_eq!(
            CellValue::Text(" Acme ".to_string()).as_text().as_deref(),
            Some("Acme")
        );
    }

    #[test]
    fn test_amount_conversions() {
        assert_eq!(CellValue::Empty.as_amount().unwrap(), None);
        assert_eq!(
            CellValue::Int(100).as_amount().unwrap(),
            Some(BigDecimal::from(100))
        );
        assert_eq!(
            CellValue::Float(1234.5).as_amount().unwrap(),
            Some(BigDecimal::from_str("1234.5").unwrap())
        );
        assert_eq!(
            CellValue::Text("1.234,50".to_string()).as_amount().unwrap(),
            Some(BigDecimal::from_str("1234.50").unwrap())
        );
        assert_eq!(
            CellValue::Text("1,234.50".to_string()).as_amount().unwrap(),
            Some(BigDecimal::from_str("1234.50").unwrap())
        );
        assert_eq!(
            CellValue::Text("$ 99,9".to_string()).as_amount().unwrap(),
            Some(BigDecimal::from_str("99.9").unwrap())
        );
        assert!(CellValue::Text("abc".to_string()).as_amount().is_err());
    }

    #[test]
    fn test_grouped_amount_text() {
        let amount = |text: &str| CellValue::Text(text.to_string()).as_amount().unwrap();

        assert_eq!(amount("1.234.567"), Some(BigDecimal::from(1_234_567)));
        assert_eq!(amount("1,234,567"), Some(BigDecimal::from(1_234_567)));
        assert_eq!(amount("1.234"), Some(BigDecimal::from(1234)));
        assert_eq!(amount("1,234"), Some(BigDecimal::from(1234)));
        assert_eq!(
            amount("1.234.567,89"),
            Some(BigDecimal::from_str("1234567.89").unwrap())
        );
        assert_eq!(
            amount("1,234,567.89"),
            Some(BigDecimal::from_str("1234567.89").unwrap())
        );
        assert_eq!(amount("12.50"), Some(BigDecimal::from_str("12.50").unwrap()));
        assert_eq!(amount("0.125"), Some(BigDecimal::from_str("0.125").unwrap()));
        assert_eq!(amount("0,125"), Some(BigDecimal::from_str("0.125").unwrap()));
        assert!(CellValue::Text("1.2.3".to_string()).as_amount().is_err());
        assert!(CellValue::Text("1..234".to_string()).as_amount().is_err());
        assert!(CellValue::Bool(true).as_amount().is_err());
    }

    #[test]
    fn test_date_conversions() {
        assert_eq!(excel_serial_to_date(45413.0), Some(date(2024, 5, 1)));
        assert_eq!(excel_serial_to_date(0.0), None);
        assert_eq!(
            CellValue::Float(45413.25).as_date().unwrap(),
            Some(date(2024, 5, 1))
        );
        assert_eq!(
            CellValue::Text("2024-05-01".to_string()).as_date().unwrap(),
            Some(date(2024, 5, 1))
        );
        assert_eq!(
            CellValue::Text("15/06/2024".to_string()).as_date().unwrap(),
            Some(date(2024, 6, 15))
        );
        assert_eq!(
            CellValue::Text("2024-05-01T10:30:00".to_string())
                .as_date()
                .unwrap(),
            Some(date(2024, 5, 1))
        );
        assert!(CellValue::Text("next week".to_string()).as_date().is_err());
    }

    #[test]
    fn test_cell_past_end_of_row_is_empty() {
        let row = SpreadsheetRow::new(2, vec![CellValue::Text("Acme".to_string())]);
        assert_eq!(row.cell(6), &CellValue::Empty);
        assert!(!row.is_blank());
    }
}
