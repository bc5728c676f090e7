//! Traits for the host ledger and the row source

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use crate::spreadsheet::{CheckRow, SpreadsheetRow};
use crate::types::*;

/// Access to the host ledger platform
///
/// The importer never owns accounting semantics: it looks up master data and
/// asks the host to create, post and reverse records through this trait.
/// Implementations exist for the real platform and, in `utils`, for memory.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Find the first partner whose name matches
    async fn find_partner(&self, name: &str, mode: NameMatch) -> LedgerResult<Option<Partner>>;

    /// Find a currency by its exact code
    async fn find_currency(&self, code: &str) -> LedgerResult<Option<Currency>>;

    /// Find the first bank whose name matches
    async fn find_bank(&self, name: &str, mode: NameMatch) -> LedgerResult<Option<Bank>>;

    /// First receipt book of a company for the given partner type
    async fn find_receiptbook(
        &self,
        company_id: &str,
        partner_type: PartnerType,
    ) -> LedgerResult<Option<Receiptbook>>;

    /// Get a journal by ID
    async fn get_journal(&self, journal_id: &str) -> LedgerResult<Option<Journal>>;

    /// Get a payment method line by ID
    async fn get_payment_method_line(&self, line_id: &str)
        -> LedgerResult<Option<PaymentMethodLine>>;

    /// List the payment method lines configured on a journal
    async fn list_payment_method_lines(
        &self,
        journal_id: &str,
    ) -> LedgerResult<Vec<PaymentMethodLine>>;

    /// Create a payment group
    async fn create_payment_group(&mut self, group: &NewPaymentGroup)
        -> LedgerResult<PaymentGroup>;

    /// Create a payment inside an existing group
    async fn create_payment(&mut self, payment: &NewPayment) -> LedgerResult<Payment>;

    /// Post a payment group, generating ledger entries for its payments
    async fn post_payment_group(&mut self, group_id: &str) -> LedgerResult<()>;

    /// The ledger entry generated for a payment, if posting produced one
    async fn find_payment_entry(&self, payment_id: &str) -> LedgerResult<Option<LedgerEntry>>;

    /// Reverse a posted entry, returning the counter-entry
    async fn reverse_entry(
        &mut self,
        entry_id: &str,
        date: NaiveDate,
        reason: &str,
    ) -> LedgerResult<LedgerEntry>;
}

/// Ordered rows of raw cells, as delivered by a spreadsheet reader
pub trait RowSource {
    /// All rows of the first sheet, header included
    fn rows(&self) -> ImportResult<Vec<SpreadsheetRow>>;
}

/// Trait for implementing custom rules on extracted checks
pub trait CheckValidator: Send + Sync {
    /// Validate a check before it is resolved and written
    fn validate_check(&self, check: &CheckRow) -> Result<(), RowError>;
}

/// Default check validator: amounts must not be negative
///
/// Blank and zero amounts pass, the resolver skips those rows.
pub struct DefaultCheckValidator;

impl CheckValidator for DefaultCheckValidator {
    fn validate_check(&self, check: &CheckRow) -> Result<(), RowError> {
        match &check.amount {
            Some(amount) if *amount != BigDecimal::from(0) => {
                crate::utils::validate_positive_amount(amount)
            }
            _ => Ok(()),
        }
    }
}
