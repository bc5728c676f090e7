//! Column roles and the typed extraction of a check from a row

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::cell::SpreadsheetRow;
use crate::types::{ImportError, ImportResult, RowError};

/// The fields a check row carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    PartnerName,
    Amount,
    CurrencyCode,
    Reference,
    CheckNumber,
    CheckPaymentDate,
    BankName,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 7] = [
        ColumnRole::PartnerName,
        ColumnRole::Amount,
        ColumnRole::CurrencyCode,
        ColumnRole::Reference,
        ColumnRole::CheckNumber,
        ColumnRole::CheckPaymentDate,
        ColumnRole::BankName,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ColumnRole::PartnerName => "partner name",
            ColumnRole::Amount => "amount",
            ColumnRole::CurrencyCode => "currency code",
            ColumnRole::Reference => "reference",
            ColumnRole::CheckNumber => "check number",
            ColumnRole::CheckPaymentDate => "check payment date",
            ColumnRole::BankName => "bank name",
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Zero-based column position of each role
///
/// The default layout is A: partner, B: amount, C: currency, D: reference,
/// E: check number, F: check payment date, G: bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    pub partner_name: usize,
    pub amount: usize,
    pub currency_code: usize,
    pub reference: usize,
    pub check_number: usize,
    pub check_payment_date: usize,
    pub bank_name: usize,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            partner_name: 0,
            amount: 1,
            currency_code: 2,
            reference: 3,
            check_number: 4,
            check_payment_date: 5,
            bank_name: 6,
        }
    }
}

impl ColumnMap {
    /// Column index assigned to a role
    pub fn index_of(&self, role: ColumnRole) -> usize {
        match role {
            ColumnRole::PartnerName => self.partner_name,
            ColumnRole::Amount => self.amount,
            ColumnRole::CurrencyCode => self.currency_code,
            ColumnRole::Reference => self.reference,
            ColumnRole::CheckNumber => self.check_number,
            ColumnRole::CheckPaymentDate => self.check_payment_date,
            ColumnRole::BankName => self.bank_name,
        }
    }

    /// Every role must read its own column
    pub fn validate(&self) -> ImportResult<()> {
        let mut seen = HashSet::new();
        for role in ColumnRole::ALL {
            if !seen.insert(self.index_of(role)) {
                return Err(ImportError::Config(format!(
                    "column {} is assigned to more than one role (again for {})",
                    self.index_of(role),
                    role
                )));
            }
        }
        Ok(())
    }
}

/// Typed fields of one data row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckRow {
    pub row_number: usize,
    pub partner_name: Option<String>,
    pub amount: Option<BigDecimal>,
    pub currency_code: Option<String>,
    pub reference: Option<String>,
    pub check_number: Option<String>,
    pub check_payment_date: Option<NaiveDate>,
    pub bank_name: Option<String>,
}

impl CheckRow {
    /// Read every role from its mapped column
    pub fn extract(row: &SpreadsheetRow, columns: &ColumnMap) -> Result<Self, RowError> {
        Ok(Self {
            row_number: row.number,
            partner_name: extract_text(row, columns, ColumnRole::PartnerName),
            amount: extract_amount(row, columns, ColumnRole::Amount)?,
            currency_code: extract_text(row, columns, ColumnRole::CurrencyCode),
            reference: extract_text(row, columns, ColumnRole::Reference),
            check_number: extract_text(row, columns, ColumnRole::CheckNumber),
            check_payment_date: extract_date(row, columns, ColumnRole::CheckPaymentDate)?,
            bank_name: extract_text(row, columns, ColumnRole::BankName),
        })
    }
}

fn extract_text(row: &SpreadsheetRow, columns: &ColumnMap, role: ColumnRole) -> Option<String> {
    row.cell(columns.index_of(role)).as_text()
}

fn extract_amount(
    row: &SpreadsheetRow,
    columns: &ColumnMap,
    role: ColumnRole,
) -> Result<Option<BigDecimal>, RowError> {
    row.cell(columns.index_of(role))
        .as_amount()
        .map_err(|message| RowError::InvalidCell {
            column: role,
            message,
        })
}

fn extract_date(
    row: &SpreadsheetRow,
    columns: &ColumnMap,
    role: ColumnRole,
) -> Result<Option<NaiveDate>, RowError> {
    row.cell(columns.index_of(role))
        .as_date()
        .map_err(|message| RowError::InvalidCell {
            column: role,
            message,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::CellValue;

    fn text(value: &str) -> CellValue {
        CellValue::Text(value.to_string())
    }

    #[test]
    fn test_extract_default_layout() {
        let row = SpreadsheetRow::new(
            2,
            vec![
                text("Acme SA"),
                CellValue::Int(100),
                text("USD"),
                text("REF-1"),
                CellValue::Float(555.0),
                text("2024-07-01"),
                text("galicia"),
            ],
        );

        let check = CheckRow::extract(&row, &ColumnMap::default()).unwrap();
        assert_eq!(check.row_number, 2);
        assert_eq!(check.partner_name.as_deref(), Some("Acme SA"));
        assert_eq!(check.amount, Some(BigDecimal::from(100)));
        assert_eq!(check.currency_code.as_deref(), Some("USD"));
        assert_eq!(check.reference.as_deref(), Some("REF-1"));
        assert_eq!(check.check_number.as_deref(), Some("555"));
        assert_eq!(
            check.check_payment_date,
            NaiveDate::from_ymd_opt(2024, 7, 1)
        );
        assert_eq!(check.bank_name.as_deref(), Some("galicia"));
    }

    #[test]
    fn test_extract_custom_layout_and_short_row() {
        let columns = ColumnMap {
            partner_name: 1,
            amount: 0,
            ..ColumnMap::default()
        };
        let row = SpreadsheetRow::new(3, vec![CellValue::Int(42), text("Acme SA")]);

        let check = CheckRow::extract(&row, &columns).unwrap();
        assert_eq!(check.partner_name.as_deref(), Some("Acme SA"));
        assert_eq!(check.amount, Some(BigDecimal::from(42)));
        assert_eq!(check.bank_name, None);
        assert_eq!(check.check_payment_date, None);
    }

    #[test]
    fn test_invalid_amount_names_the_column() {
        let row = SpreadsheetRow::new(4, vec![text("Acme SA"), text("lots")]);
        let err = CheckRow::extract(&row, &ColumnMap::default()).unwrap_err();
        assert!(matches!(
            err,
            RowError::InvalidCell {
                column: ColumnRole::Amount,
                ..
            }
        ));
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let columns = ColumnMap {
            bank_name: 0,
            ..ColumnMap::default()
        };
        assert!(matches!(columns.validate(), Err(ImportError::Config(_))));
        assert!(ColumnMap::default().validate().is_ok());
    }
}
