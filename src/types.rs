//! Core types and data structures for the check import

use base64::Engine;
use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::import::ImportReport;
use crate::spreadsheet::ColumnRole;

/// A contact in the host partner directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partner {
    pub id: String,
    pub name: String,
}

impl Partner {
    pub fn new(id: String, name: String) -> Self {
        Self { id, name }
    }
}

/// A currency known to the host ledger, identified by its ISO code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub id: String,
    /// ISO 4217 code, e.g. `ARS`
    pub code: String,
}

impl Currency {
    pub fn new(id: String, code: String) -> Self {
        Self { id, code }
    }
}

/// A bank that can issue checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    pub id: String,
    pub name: String,
}

impl Bank {
    pub fn new(id: String, name: String) -> Self {
        Self { id, name }
    }
}

/// A ledger journal payments are booked into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    pub id: String,
    pub name: String,
}

/// A payment method configured on a specific journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodLine {
    pub id: String,
    /// Journal this line belongs to
    pub journal_id: String,
    pub name: String,
}

/// Side of the business a receipt book is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartnerType {
    Customer,
    Supplier,
}

/// Numbering sequence used for payment group receipts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receiptbook {
    pub id: String,
    pub company_id: String,
    pub partner_type: PartnerType,
    pub name: String,
}

/// The company an import runs on behalf of
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
    /// Currency used when a row's currency code is unknown
    pub currency_id: String,
}

impl Company {
    pub fn new(id: String, name: String, currency_id: String) -> Self {
        Self {
            id,
            name,
            currency_id,
        }
    }
}

/// How a free-text name is compared against directory entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameMatch {
    /// Whole name must be equal
    #[default]
    Exact,
    /// Query must appear somewhere in the name, case sensitive
    Contains,
    /// Query must appear somewhere in the name, ignoring case
    ContainsIgnoreCase,
}

impl NameMatch {
    /// Returns true if `candidate` satisfies `query` under this mode
    pub fn matches(&self, candidate: &str, query: &str) -> bool {
        match self {
            NameMatch::Exact => candidate == query,
            NameMatch::Contains => candidate.contains(query),
            NameMatch::ContainsIgnoreCase => candidate
                .to_lowercase()
                .contains(&query.to_lowercase()),
        }
    }
}

/// Direction of a payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// Money received from a customer
    Inbound,
    /// Money paid to a supplier
    Outbound,
}

/// Lifecycle state of a host record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    Draft,
    Posted,
}

/// Values for a payment group about to be created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPaymentGroup {
    pub partner_id: String,
    pub company_id: String,
    pub payment_date: NaiveDate,
    pub receiptbook_id: Option<String>,
    pub reference: Option<String>,
}

/// A payment group as stored by the host ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentGroup {
    pub id: String,
    pub partner_id: String,
    pub company_id: String,
    pub payment_date: NaiveDate,
    pub receiptbook_id: Option<String>,
    pub reference: Option<String>,
    pub state: RecordState,
    pub created_at: NaiveDateTime,
}

impl PaymentGroup {
    /// Build the stored record from creation values and a host-assigned id
    pub fn from_new(id: String, values: &NewPaymentGroup) -> Self {
        Self {
            id,
            partner_id: values.partner_id.clone(),
            company_id: values.company_id.clone(),
            payment_date: values.payment_date,
            receiptbook_id: values.receiptbook_id.clone(),
            reference: values.reference.clone(),
            state: RecordState::Draft,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

/// Values for a check payment about to be created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPayment {
    pub payment_group_id: String,
    pub partner_id: String,
    pub amount: BigDecimal,
    pub currency_id: String,
    pub date: NaiveDate,
    pub journal_id: String,
    pub payment_method_line_id: String,
    pub payment_type: PaymentType,
    pub reference: Option<String>,
    pub check_number: Option<String>,
    pub check_payment_date: NaiveDate,
    pub check_bank_id: Option<String>,
}

/// A payment as stored by the host ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub payment_group_id: String,
    pub partner_id: String,
    pub amount: BigDecimal,
    pub currency_id: String,
    pub date: NaiveDate,
    pub journal_id: String,
    pub payment_method_line_id: String,
    pub payment_type: PaymentType,
    pub reference: Option<String>,
    pub check_number: Option<String>,
    pub check_payment_date: NaiveDate,
    pub check_bank_id: Option<String>,
    pub state: RecordState,
    pub created_at: NaiveDateTime,
}

impl Payment {
    /// Build the stored record from creation values and a host-assigned id
    pub fn from_new(id: String, values: &NewPayment) -> Self {
        Self {
            id,
            payment_group_id: values.payment_group_id.clone(),
            partner_id: values.partner_id.clone(),
            amount: values.amount.clone(),
            currency_id: values.currency_id.clone(),
            date: values.date,
            journal_id: values.journal_id.clone(),
            payment_method_line_id: values.payment_method_line_id.clone(),
            payment_type: values.payment_type,
            reference: values.reference.clone(),
            check_number: values.check_number.clone(),
            check_payment_date: values.check_payment_date,
            check_bank_id: values.check_bank_id.clone(),
            state: RecordState::Draft,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

/// A posted journal entry generated by the host ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: String,
    pub journal_id: String,
    pub date: NaiveDate,
    /// Payment that generated this entry, if any
    pub payment_id: Option<String>,
    pub amount: BigDecimal,
    pub currency_id: String,
    pub reference: Option<String>,
    /// Entry this one reverses
    pub reversed_entry_id: Option<String>,
    /// Counter-entry created when this entry was reversed
    pub reversal_entry_id: Option<String>,
}

impl LedgerEntry {
    /// Whether a counter-entry already nullifies this entry
    pub fn is_reversed(&self) -> bool {
        self.reversal_entry_id.is_some()
    }
}

/// Everything the operator submits to start an import
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportRequest {
    pub journal_id: Option<String>,
    pub payment_method_line_id: Option<String>,
    /// Check payment date for rows that do not carry one
    pub default_date: Option<NaiveDate>,
    pub file_name: Option<String>,
    /// Raw workbook bytes
    pub file_data: Vec<u8>,
}

impl ImportRequest {
    /// Create a request for the given journal and payment method line
    pub fn new(journal_id: String, payment_method_line_id: String, file_data: Vec<u8>) -> Self {
        Self {
            journal_id: Some(journal_id),
            payment_method_line_id: Some(payment_method_line_id),
            default_date: None,
            file_name: None,
            file_data,
        }
    }

    /// Create a request from a base64 encoded upload, as form fields deliver it
    pub fn from_base64(
        journal_id: String,
        payment_method_line_id: String,
        encoded: &str,
    ) -> ImportResult<Self> {
        let file_data = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| ImportError::Spreadsheet(format!("upload is not valid base64: {e}")))?;
        Ok(Self::new(journal_id, payment_method_line_id, file_data))
    }

    /// Set the default check payment date
    pub fn default_date(mut self, date: NaiveDate) -> Self {
        self.default_date = Some(date);
        self
    }

    /// Set the uploaded file name
    pub fn file_name(mut self, name: String) -> Self {
        self.file_name = Some(name);
        self
    }
}

/// Company and clock the import runs against
#[derive(Debug, Clone, PartialEq)]
pub struct ImportContext {
    pub company: Company,
    /// Run date, used for record dates and reversals
    pub today: NaiveDate,
}

impl ImportContext {
    pub fn new(company: Company, today: NaiveDate) -> Self {
        Self { company, today }
    }

    /// Context dated with the local calendar day
    pub fn for_today(company: Company) -> Self {
        Self::new(company, chrono::Local::now().date_naive())
    }
}

/// Errors reported by a ledger gateway
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Record not found: {0}")]
    RecordNotFound(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Why a single row could not be imported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowError {
    #[error("column {column}: {message}")]
    InvalidCell { column: ColumnRole, message: String },
    #[error("no partner matches '{name}'")]
    UnmatchedPartner { name: String },
    #[error("{reason}")]
    Rejected { reason: String },
}

/// Errors that abort an import
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("{} row(s) rejected, nothing was written", .0.failed_count())]
    RowsRejected(Box<ImportReport>),
    #[error("Import interrupted at row {row}: {source}")]
    Interrupted {
        row: usize,
        /// Rows committed before the failure, ending with the failing row if it left records behind
        report: Box<ImportReport>,
        #[source]
        source: LedgerError,
    },
}

/// Result type for import operations
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_match_modes() {
        assert!(NameMatch::Exact.matches("Acme SA", "Acme SA"));
        assert!(!NameMatch::Exact.matches("Acme SA", "Acme"));
        assert!(NameMatch::Contains.matches("Acme SA", "Acme"));
        assert!(!NameMatch::Contains.matches("Acme SA", "acme"));
        assert!(NameMatch::ContainsIgnoreCase.matches("Banco Galicia", "GALICIA"));
    }

    #[test]
    fn test_request_from_base64() {
        let request =
            ImportRequest::from_base64("j1".to_string(), "m1".to_string(), "UEsDBA==").unwrap();
        assert_eq!(request.file_data, vec![0x50, 0x4b, 0x03, 0x04]);
        assert_eq!(request.journal_id.as_deref(), Some("j1"));

        let err = ImportRequest::from_base64("j1".to_string(), "m1".to_string(), "%%%");
        assert!(matches!(err, Err(ImportError::Spreadsheet(_))));
    }
}
