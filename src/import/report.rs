//! Per-row results of an import run

use serde::Serialize;

use crate::types::RowError;

/// A fallback or default applied while resolving a row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "note", rename_all = "snake_case")]
pub enum ResolutionNote {
    /// Partner name was blank or unknown, the fallback partner was used
    PartnerFallback {
        name: Option<String>,
        partner_id: String,
    },
    /// Currency code was unknown, the company currency was used
    CurrencyDefaulted { code: String, currency_id: String },
    /// Bank name was unknown, the check carries no bank
    BankUnresolved { name: String },
}

/// Why a row produced no records
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Blank or zero amount
    MissingAmount,
    /// Partner not found and the policy says skip
    UnmatchedPartner { name: Option<String> },
    /// The row was valid but another row failed in strict mode
    BatchRejected,
}

/// What happened to the post-and-reverse step of a created payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReversalOutcome {
    NotRequested,
    /// Posting generated no entry for the payment
    NoEntry,
    Reversed {
        entry_id: String,
        reversal_entry_id: String,
    },
}

/// Result of one data row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RowOutcome {
    Created {
        payment_group_id: String,
        payment_id: String,
        reversal: ReversalOutcome,
        notes: Vec<ResolutionNote>,
    },
    Skipped {
        reason: SkipReason,
    },
    Failed {
        error: RowError,
    },
    /// The host failed partway through the row; these records were already committed
    Partial {
        payment_group_id: String,
        payment_id: Option<String>,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowReport {
    /// 1-based sheet row
    pub row_number: usize,
    pub outcome: RowOutcome,
}

/// Outcome of every data row, in sheet order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ImportReport {
    pub rows: Vec<RowReport>,
}

impl ImportReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row_number: usize, outcome: RowOutcome) {
        self.rows.push(RowReport {
            row_number,
            outcome,
        });
    }

    pub fn created_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| matches!(r.outcome, RowOutcome::Created { .. }))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| matches!(r.outcome, RowOutcome::Skipped { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| matches!(r.outcome, RowOutcome::Failed { .. }))
            .count()
    }

    /// Number of reversal entries created during the run
    pub fn reversed_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| {
                matches!(
                    r.outcome,
                    RowOutcome::Created {
                        reversal: ReversalOutcome::Reversed { .. },
                        ..
                    }
                )
            })
            .count()
    }

    /// IDs of the payments created, in sheet order
    pub fn payment_ids(&self) -> Vec<&str> {
        self.rows
            .iter()
            .filter_map(|r| match &r.outcome {
                RowOutcome::Created { payment_id, .. } => Some(payment_id.as_str()),
                RowOutcome::Partial { payment_id, .. } => payment_id.as_deref(),
                _ => None,
            })
            .collect()
    }

    /// Row left half-written by an interrupted run, if any
    pub fn partial_row(&self) -> Option<&RowReport> {
        self.rows
            .iter()
            .find(|r| matches!(r.outcome, RowOutcome::Partial { .. }))
    }

    /// Report for a given sheet row
    pub fn row(&self, row_number: usize) -> Option<&RowReport> {
        self.rows.iter().find(|r| r.row_number == row_number)
    }
}
