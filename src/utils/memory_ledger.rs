//! In-memory ledger gateway for testing

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::traits::*;
use crate::types::*;

#[derive(Debug, Default)]
struct LedgerState {
    partners: Vec<Partner>,
    currencies: Vec<Currency>,
    banks: Vec<Bank>,
    journals: Vec<Journal>,
    payment_method_lines: Vec<PaymentMethodLine>,
    receiptbooks: Vec<Receiptbook>,
    payment_groups: Vec<PaymentGroup>,
    payments: Vec<Payment>,
    entries: Vec<LedgerEntry>,
    generate_entries: bool,
    payment_limit: Option<usize>,
    fail_reversals: bool,
}

/// In-memory host ledger for testing and development
///
/// Clones share the same state, so a test can hand one clone to the
/// importer and inspect the records through another.
#[derive(Debug, Clone)]
pub struct MemoryLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl MemoryLedger {
    /// Create an empty ledger that generates an entry for every posted payment
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(LedgerState {
                generate_entries: true,
                ..LedgerState::default()
            })),
        }
    }

    /// Posting no longer generates ledger entries
    pub fn without_entry_generation(self) -> Self {
        self.write().generate_entries = false;
        self
    }

    /// Payment creation fails once `limit` payments exist
    pub fn fail_payments_after(self, limit: usize) -> Self {
        self.write().payment_limit = Some(limit);
        self
    }

    /// Every reversal fails with a storage error
    pub fn fail_reversals(self) -> Self {
        self.write().fail_reversals = true;
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, LedgerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, LedgerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_partner(&self, id: &str, name: &str) -> Partner {
        let partner = Partner::new(id.to_string(), name.to_string());
        self.write().partners.push(partner.clone());
        partner
    }

    pub fn add_currency(&self, id: &str, code: &str) -> Currency {
        let currency = Currency::new(id.to_string(), code.to_string());
        self.write().currencies.push(currency.clone());
        currency
    }

    pub fn add_bank(&self, id: &str, name: &str) -> Bank {
        let bank = Bank::new(id.to_string(), name.to_string());
        self.write().banks.push(bank.clone());
        bank
    }

    pub fn add_journal(&self, id: &str, name: &str) -> Journal {
        let journal = Journal {
            id: id.to_string(),
            name: name.to_string(),
        };
        self.write().journals.push(journal.clone());
        journal
    }

    pub fn add_payment_method_line(&self, id: &str, journal_id: &str, name: &str) -> PaymentMethodLine {
        let line = PaymentMethodLine {
            id: id.to_string(),
            journal_id: journal_id.to_string(),
            name: name.to_string(),
        };
        self.write().payment_method_lines.push(line.clone());
        line
    }

    pub fn add_receiptbook(
        &self,
        id: &str,
        company_id: &str,
        partner_type: PartnerType,
        name: &str,
    ) -> Receiptbook {
        let book = Receiptbook {
            id: id.to_string(),
            company_id: company_id.to_string(),
            partner_type,
            name: name.to_string(),
        };
        self.write().receiptbooks.push(book.clone());
        book
    }

    /// Payment groups in creation order
    pub fn payment_groups(&self) -> Vec<PaymentGroup> {
        self.read().payment_groups.clone()
    }

    /// Payments in creation order
    pub fn payments(&self) -> Vec<Payment> {
        self.read().payments.clone()
    }

    /// Every ledger entry, reversals included
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.read().entries.clone()
    }

    /// Counter-entries created by reversals
    pub fn reversals(&self) -> Vec<LedgerEntry> {
        self.read()
            .entries
            .iter()
            .filter(|entry| entry.reversed_entry_id.is_some())
            .cloned()
            .collect()
    }

    /// Drop created records, keeping master data
    pub fn clear_records(&self) {
        let mut state = self.write();
        state.payment_groups.clear();
        state.payments.clear();
        state.entries.clear();
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[async_trait]
impl LedgerGateway for MemoryLedger {
    async fn find_partner(&self, name: &str, mode: NameMatch) -> LedgerResult<Option<Partner>> {
        Ok(self
            .read()
            .partners
            .iter()
            .find(|partner| mode.matches(&partner.name, name))
            .cloned())
    }

    async fn find_currency(&self, code: &str) -> LedgerResult<Option<Currency>> {
        Ok(self
            .read()
            .currencies
            .iter()
            .find(|currency| currency.code == code)
            .cloned())
    }

    async fn find_bank(&self, name: &str, mode: NameMatch) -> LedgerResult<Option<Bank>> {
        Ok(self
            .read()
            .banks
            .iter()
            .find(|bank| mode.matches(&bank.name, name))
            .cloned())
    }

    async fn find_receiptbook(
        &self,
        company_id: &str,
        partner_type: PartnerType,
    ) -> LedgerResult<Option<Receiptbook>> {
        Ok(self
            .read()
            .receiptbooks
            .iter()
            .find(|book| book.company_id == company_id && book.partner_type == partner_type)
            .cloned())
    }

    async fn get_journal(&self, journal_id: &str) -> LedgerResult<Option<Journal>> {
        Ok(self
            .read()
            .journals
            .iter()
            .find(|journal| journal.id == journal_id)
            .cloned())
    }

    async fn get_payment_method_line(
        &self,
        line_id: &str,
    ) -> LedgerResult<Option<PaymentMethodLine>> {
        Ok(self
            .read()
            .payment_method_lines
            .iter()
            .find(|line| line.id == line_id)
            .cloned())
    }

    async fn list_payment_method_lines(
        &self,
        journal_id: &str,
    ) -> LedgerResult<Vec<PaymentMethodLine>> {
        Ok(self
            .read()
            .payment_method_lines
            .iter()
            .filter(|line| line.journal_id == journal_id)
            .cloned()
            .collect())
    }

    async fn create_payment_group(
        &mut self,
        group: &NewPaymentGroup,
    ) -> LedgerResult<PaymentGroup> {
        let created = PaymentGroup::from_new(new_id(), group);
        self.write().payment_groups.push(created.clone());
        Ok(created)
    }

    async fn create_payment(&mut self, payment: &NewPayment) -> LedgerResult<Payment> {
        let mut state = self.write();

        if let Some(limit) = state.payment_limit {
            if state.payments.len() >= limit {
                return Err(LedgerError::Storage(format!(
                    "payment limit of {limit} reached"
                )));
            }
        }

        if !state
            .payment_groups
            .iter()
            .any(|group| group.id == payment.payment_group_id)
        {
            return Err(LedgerError::RecordNotFound(format!(
                "payment group {}",
                payment.payment_group_id
            )));
        }

        let created = Payment::from_new(new_id(), payment);
        state.payments.push(created.clone());
        Ok(created)
    }

    async fn post_payment_group(&mut self, group_id: &str) -> LedgerResult<()> {
        let mut state = self.write();

        let group = state
            .payment_groups
            .iter_mut()
            .find(|group| group.id == group_id)
            .ok_or_else(|| LedgerError::RecordNotFound(format!("payment group {group_id}")))?;
        if group.state == RecordState::Posted {
            return Err(LedgerError::InvalidState(format!(
                "payment group {group_id} is already posted"
            )));
        }
        group.state = RecordState::Posted;

        let generate_entries = state.generate_entries;
        let mut new_entries = Vec::new();
        for payment in state
            .payments
            .iter_mut()
            .filter(|payment| payment.payment_group_id == group_id)
        {
            payment.state = RecordState::Posted;
            if generate_entries {
                new_entries.push(LedgerEntry {
                    id: new_id(),
                    journal_id: payment.journal_id.clone(),
                    date: payment.date,
                    payment_id: Some(payment.id.clone()),
                    amount: payment.amount.clone(),
                    currency_id: payment.currency_id.clone(),
                    reference: payment.reference.clone(),
                    reversed_entry_id: None,
                    reversal_entry_id: None,
                });
            }
        }
        state.entries.extend(new_entries);

        Ok(())
    }

    async fn find_payment_entry(&self, payment_id: &str) -> LedgerResult<Option<LedgerEntry>> {
        Ok(self
            .read()
            .entries
            .iter()
            .find(|entry| entry.payment_id.as_deref() == Some(payment_id))
            .cloned())
    }

    async fn reverse_entry(
        &mut self,
        entry_id: &str,
        date: NaiveDate,
        reason: &str,
    ) -> LedgerResult<LedgerEntry> {
        let mut state = self.write();
        if state.fail_reversals {
            return Err(LedgerError::Storage(format!(
                "reversal of ledger entry {entry_id} refused"
            )));
        }

        let original = state
            .entries
            .iter_mut()
            .find(|entry| entry.id == entry_id)
            .ok_or_else(|| LedgerError::RecordNotFound(format!("ledger entry {entry_id}")))?;
        if original.is_reversed() {
            return Err(LedgerError::InvalidState(format!(
                "ledger entry {entry_id} is already reversed"
            )));
        }

        let reversal = LedgerEntry {
            id: new_id(),
            journal_id: original.journal_id.clone(),
            date,
            payment_id: None,
            amount: original.amount.clone(),
            currency_id: original.currency_id.clone(),
            reference: Some(reason.to_string()),
            reversed_entry_id: Some(original.id.clone()),
            reversal_entry_id: None,
        };
        original.reversal_entry_id = Some(reversal.id.clone());
        state.entries.push(reversal.clone());

        Ok(reversal)
    }
}
