//! Batch orchestrator that turns spreadsheet rows into check payments

use crate::config::{BatchMode, ImportConfig};
use crate::import::report::{ImportReport, ReversalOutcome, RowOutcome, SkipReason};
use crate::import::resolver::{Resolution, ResolvedCheck, RowResolver};
use crate::spreadsheet::{CheckRow, XlsxRowSource};
use crate::traits::*;
use crate::types::*;

/// Journal and payment method an import books into, after validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTarget {
    pub journal: Journal,
    pub payment_method_line: PaymentMethodLine,
}

/// A row waiting to be written, or already settled
enum PlannedRow {
    Write(ResolvedCheck),
    Done(RowOutcome),
}

/// A host failure while writing one row
struct WriteFailure {
    /// Records the row committed before the failure
    partial: Option<RowOutcome>,
    source: LedgerError,
}

impl WriteFailure {
    fn new(partial: Option<RowOutcome>, source: LedgerError) -> Self {
        Self { partial, source }
    }
}

/// Imports third-party checks into the host ledger
///
/// Rows are processed one at a time in sheet order. Each data row gets its
/// own payment group and payment. Running the same sheet twice creates the
/// records twice: there is no deduplication key.
pub struct CheckImporter<G: LedgerGateway> {
    gateway: G,
    config: ImportConfig,
    context: ImportContext,
    validator: Box<dyn CheckValidator>,
}

impl<G: LedgerGateway> CheckImporter<G> {
    /// Create an importer over the given gateway
    pub fn new(gateway: G, config: ImportConfig, context: ImportContext) -> ImportResult<Self> {
        Self::with_validator(gateway, config, context, Box::new(DefaultCheckValidator))
    }

    /// Create an importer with a custom check validator
    pub fn with_validator(
        gateway: G,
        config: ImportConfig,
        context: ImportContext,
        validator: Box<dyn CheckValidator>,
    ) -> ImportResult<Self> {
        config.validate()?;
        Ok(Self {
            gateway,
            config,
            context,
            validator,
        })
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    pub fn context(&self) -> &ImportContext {
        &self.context
    }

    /// Payment method lines an operator may choose for a journal
    pub async fn available_payment_method_lines(
        &self,
        journal_id: &str,
    ) -> ImportResult<Vec<PaymentMethodLine>> {
        Ok(self.gateway.list_payment_method_lines(journal_id).await?)
    }

    /// Check the request's selections before any row is read
    pub async fn validate_request(&self, request: &ImportRequest) -> ImportResult<ImportTarget> {
        let journal_id = required(request.journal_id.as_deref(), "journal")?;
        let line_id = required(
            request.payment_method_line_id.as_deref(),
            "payment method",
        )?;

        let journal = self
            .gateway
            .get_journal(journal_id)
            .await?
            .ok_or_else(|| ImportError::Validation(format!("journal '{journal_id}' does not exist")))?;

        let payment_method_line = self
            .gateway
            .get_payment_method_line(line_id)
            .await?
            .ok_or_else(|| {
                ImportError::Validation(format!("payment method '{line_id}' does not exist"))
            })?;

        if payment_method_line.journal_id != journal.id {
            return Err(ImportError::Validation(format!(
                "payment method '{}' belongs to journal '{}', not '{}'",
                payment_method_line.id, payment_method_line.journal_id, journal.id
            )));
        }

        Ok(ImportTarget {
            journal,
            payment_method_line,
        })
    }

    /// Decode the uploaded workbook and import its first sheet
    ///
    /// The request is validated before the upload is looked at.
    pub async fn import_workbook(&mut self, request: &ImportRequest) -> ImportResult<ImportReport> {
        let target = self.validate_request(request).await?;
        if request.file_data.is_empty() {
            return Err(ImportError::Validation("no file was uploaded".to_string()));
        }
        let source = XlsxRowSource::from_bytes(&request.file_data)?;
        tracing::info!(
            file = request.file_name.as_deref().unwrap_or("<unnamed>"),
            sheet = source.sheet_name(),
            "reading uploaded workbook"
        );
        self.import_validated(request, target, &source).await
    }

    /// Import every data row of a row source
    pub async fn import_rows<S: RowSource + ?Sized>(
        &mut self,
        request: &ImportRequest,
        source: &S,
    ) -> ImportResult<ImportReport> {
        let target = self.validate_request(request).await?;
        self.import_validated(request, target, source).await
    }

    async fn import_validated<S: RowSource + ?Sized>(
        &mut self,
        request: &ImportRequest,
        target: ImportTarget,
        source: &S,
    ) -> ImportResult<ImportReport> {
        let rows = source.rows()?;
        tracing::info!(
            journal = %target.journal.id,
            payment_method = %target.payment_method_line.id,
            rows = rows.len(),
            "starting check import"
        );

        let mut planned = Vec::new();
        {
            let resolver = RowResolver::new(
                &self.gateway,
                &self.config,
                &self.context,
                request.default_date,
            );
            for row in rows
                .iter()
                .filter(|row| row.number > self.config.header_rows)
            {
                let check = match CheckRow::extract(row, &self.config.columns)
                    .and_then(|check| self.validator.validate_check(&check).map(|_| check))
                {
                    Ok(check) => check,
                    Err(error) => {
                        tracing::warn!(row = row.number, %error, "row rejected");
                        planned.push((row.number, PlannedRow::Done(RowOutcome::Failed { error })));
                        continue;
                    }
                };

                let plan = match resolver.resolve(&check).await? {
                    Resolution::Ready(resolved) => PlannedRow::Write(resolved),
                    Resolution::Skipped(reason) => PlannedRow::Done(RowOutcome::Skipped { reason }),
                    Resolution::Rejected(error) => PlannedRow::Done(RowOutcome::Failed { error }),
                };
                planned.push((row.number, plan));
            }
        }

        let rejected = planned
            .iter()
            .any(|(_, plan)| matches!(plan, PlannedRow::Done(RowOutcome::Failed { .. })));
        if rejected && self.config.batch_mode == BatchMode::Strict {
            let mut report = ImportReport::new();
            for (row_number, plan) in planned {
                let outcome = match plan {
                    PlannedRow::Write(_) => RowOutcome::Skipped {
                        reason: SkipReason::BatchRejected,
                    },
                    PlannedRow::Done(outcome) => outcome,
                };
                report.push(row_number, outcome);
            }
            tracing::warn!(
                failed = report.failed_count(),
                "strict import rejected, nothing was written"
            );
            return Err(ImportError::RowsRejected(Box::new(report)));
        }

        let receiptbook = self
            .gateway
            .find_receiptbook(&self.context.company.id, PartnerType::Customer)
            .await?;
        let receiptbook_id = receiptbook.map(|book| book.id);

        let mut report = ImportReport::new();
        for (row_number, plan) in planned {
            let outcome = match plan {
                PlannedRow::Done(outcome) => outcome,
                PlannedRow::Write(check) => {
                    match self
                        .write_check(&target, receiptbook_id.as_deref(), &check)
                        .await
                    {
                        Ok(outcome) => outcome,
                        Err(WriteFailure { partial, source }) => {
                            tracing::error!(row = row_number, error = %source, "ledger write failed, stopping import");
                            if let Some(partial) = partial {
                                report.push(row_number, partial);
                            }
                            return Err(ImportError::Interrupted {
                                row: row_number,
                                report: Box::new(report),
                                source,
                            });
                        }
                    }
                }
            };
            tracing::debug!(row = row_number, ?outcome, "row processed");
            report.push(row_number, outcome);
        }

        tracing::info!(
            created = report.created_count(),
            skipped = report.skipped_count(),
            failed = report.failed_count(),
            reversed = report.reversed_count(),
            "check import finished"
        );
        Ok(report)
    }

    /// Create the payment group and payment for one resolved row
    async fn write_check(
        &mut self,
        target: &ImportTarget,
        receiptbook_id: Option<&str>,
        check: &ResolvedCheck,
    ) -> Result<RowOutcome, WriteFailure> {
        let today = self.context.today;

        let group = self
            .gateway
            .create_payment_group(&NewPaymentGroup {
                partner_id: check.partner_id.clone(),
                company_id: self.context.company.id.clone(),
                payment_date: today,
                receiptbook_id: receiptbook_id.map(str::to_string),
                reference: check.reference.clone(),
            })
            .await
            .map_err(|source| WriteFailure::new(None, source))?;

        let payment = self
            .gateway
            .create_payment(&NewPayment {
                payment_group_id: group.id.clone(),
                partner_id: check.partner_id.clone(),
                amount: check.amount.clone(),
                currency_id: check.currency_id.clone(),
                date: today,
                journal_id: target.journal.id.clone(),
                payment_method_line_id: target.payment_method_line.id.clone(),
                payment_type: PaymentType::Inbound,
                reference: check.reference.clone(),
                check_number: check.check_number.clone(),
                check_payment_date: check.check_payment_date,
                check_bank_id: check.bank_id.clone(),
            })
            .await
            .map_err(|source| {
                let partial = RowOutcome::Partial {
                    payment_group_id: group.id.clone(),
                    payment_id: None,
                    error: source.to_string(),
                };
                WriteFailure::new(Some(partial), source)
            })?;

        let reversal = if self.config.reversal.enabled {
            self.post_and_reverse(&group.id, &payment.id)
                .await
                .map_err(|source| {
                    let partial = RowOutcome::Partial {
                        payment_group_id: group.id.clone(),
                        payment_id: Some(payment.id.clone()),
                        error: source.to_string(),
                    };
                    WriteFailure::new(Some(partial), source)
                })?
        } else {
            ReversalOutcome::NotRequested
        };

        Ok(RowOutcome::Created {
            payment_group_id: group.id,
            payment_id: payment.id,
            reversal,
            notes: check.notes.clone(),
        })
    }

    /// Post the group and reverse the entry its payment generated
    async fn post_and_reverse(
        &mut self,
        group_id: &str,
        payment_id: &str,
    ) -> LedgerResult<ReversalOutcome> {
        self.gateway.post_payment_group(group_id).await?;

        let Some(entry) = self.gateway.find_payment_entry(payment_id).await? else {
            tracing::warn!(
                payment = payment_id,
                group = group_id,
                "posting generated no ledger entry, nothing to reverse"
            );
            return Ok(ReversalOutcome::NoEntry);
        };

        let reversal = self
            .gateway
            .reverse_entry(&entry.id, self.context.today, &self.config.reversal.reason)
            .await?;
        tracing::debug!(entry = %entry.id, reversal = %reversal.id, "entry reversed");

        Ok(ReversalOutcome::Reversed {
            entry_id: entry.id,
            reversal_entry_id: reversal.id,
        })
    }
}

fn required<'a>(value: Option<&'a str>, field: &str) -> ImportResult<&'a str> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ImportError::Validation(format!("a {field} must be selected"))),
    }
}
