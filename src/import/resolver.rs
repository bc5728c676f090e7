//! Resolution of check rows against the host's master data

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use crate::config::{ImportConfig, UnmatchedPartnerPolicy};
use crate::import::report::{ResolutionNote, SkipReason};
use crate::spreadsheet::CheckRow;
use crate::traits::LedgerGateway;
use crate::types::*;

/// A row with every reference resolved to a host identifier
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCheck {
    pub row_number: usize,
    pub partner_id: String,
    pub amount: BigDecimal,
    pub currency_id: String,
    pub bank_id: Option<String>,
    pub reference: Option<String>,
    pub check_number: Option<String>,
    pub check_payment_date: NaiveDate,
    pub notes: Vec<ResolutionNote>,
}

/// What the resolver decided for a row
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Ready(ResolvedCheck),
    Skipped(SkipReason),
    Rejected(RowError),
}

/// Check payment date: the row's own date, then the request default, then the run date
pub fn effective_payment_date(
    row_date: Option<NaiveDate>,
    default_date: Option<NaiveDate>,
    today: NaiveDate,
) -> NaiveDate {
    row_date.or(default_date).unwrap_or(today)
}

/// Maps raw row fields to partner, currency and bank identifiers
pub struct RowResolver<'a, G: LedgerGateway> {
    gateway: &'a G,
    config: &'a ImportConfig,
    context: &'a ImportContext,
    default_date: Option<NaiveDate>,
}

impl<'a, G: LedgerGateway> RowResolver<'a, G> {
    pub fn new(
        gateway: &'a G,
        config: &'a ImportConfig,
        context: &'a ImportContext,
        default_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            gateway,
            config,
            context,
            default_date,
        }
    }

    /// Resolve one row
    ///
    /// Only gateway failures are returned as errors; anything wrong with the
    /// row itself ends up in the [`Resolution`].
    pub async fn resolve(&self, check: &CheckRow) -> LedgerResult<Resolution> {
        let amount = match &check.amount {
            Some(amount) if *amount != BigDecimal::from(0) => amount.clone(),
            _ => {
                tracing::debug!(row = check.row_number, "no amount, skipping row");
                return Ok(Resolution::Skipped(SkipReason::MissingAmount));
            }
        };

        let mut notes = Vec::new();

        let partner_id = match self
            .resolve_partner(check.row_number, check.partner_name.as_deref())
            .await?
        {
            PartnerResolution::Found(id) => id,
            PartnerResolution::Fallback(id) => {
                notes.push(ResolutionNote::PartnerFallback {
                    name: check.partner_name.clone(),
                    partner_id: id.clone(),
                });
                id
            }
            PartnerResolution::Skip => {
                return Ok(Resolution::Skipped(SkipReason::UnmatchedPartner {
                    name: check.partner_name.clone(),
                }))
            }
            PartnerResolution::Fail => {
                return Ok(Resolution::Rejected(RowError::UnmatchedPartner {
                    name: check.partner_name.clone().unwrap_or_default(),
                }))
            }
        };

        let (currency_id, currency_note) = self
            .resolve_currency(check.row_number, check.currency_code.as_deref())
            .await?;
        notes.extend(currency_note);

        let (bank_id, bank_note) = self
            .resolve_bank(check.row_number, check.bank_name.as_deref())
            .await?;
        notes.extend(bank_note);

        Ok(Resolution::Ready(ResolvedCheck {
            row_number: check.row_number,
            partner_id,
            amount,
            currency_id,
            bank_id,
            reference: check.reference.clone(),
            check_number: check.check_number.clone(),
            check_payment_date: effective_payment_date(
                check.check_payment_date,
                self.default_date,
                self.context.today,
            ),
            notes,
        }))
    }

    async fn resolve_partner(
        &self,
        row: usize,
        name: Option<&str>,
    ) -> LedgerResult<PartnerResolution> {
        if let Some(name) = name {
            if let Some(partner) = self
                .gateway
                .find_partner(name, self.config.partner_match)
                .await?
            {
                return Ok(PartnerResolution::Found(partner.id));
            }
        }

        Ok(match &self.config.unmatched_partner {
            UnmatchedPartnerPolicy::Fallback { partner_id } => {
                tracing::warn!(row, partner = ?name, fallback = %partner_id, "partner not found, using fallback partner");
                PartnerResolution::Fallback(partner_id.clone())
            }
            UnmatchedPartnerPolicy::Skip => {
                tracing::warn!(row, partner = ?name, "partner not found, skipping row");
                PartnerResolution::Skip
            }
            UnmatchedPartnerPolicy::Fail => {
                tracing::warn!(row, partner = ?name, "partner not found, rejecting row");
                PartnerResolution::Fail
            }
        })
    }

    async fn resolve_currency(
        &self,
        row: usize,
        code: Option<&str>,
    ) -> LedgerResult<(String, Option<ResolutionNote>)> {
        let company_currency = &self.context.company.currency_id;
        let Some(code) = code else {
            return Ok((company_currency.clone(), None));
        };

        match self.gateway.find_currency(code).await? {
            Some(currency) => Ok((currency.id, None)),
            None => {
                tracing::warn!(row, code, currency = %company_currency, "unknown currency, using company currency");
                Ok((
                    company_currency.clone(),
                    Some(ResolutionNote::CurrencyDefaulted {
                        code: code.to_string(),
                        currency_id: company_currency.clone(),
                    }),
                ))
            }
        }
    }

    async fn resolve_bank(
        &self,
        row: usize,
        name: Option<&str>,
    ) -> LedgerResult<(Option<String>, Option<ResolutionNote>)> {
        let Some(name) = name else {
            return Ok((None, None));
        };

        match self
            .gateway
            .find_bank(name, NameMatch::ContainsIgnoreCase)
            .await?
        {
            Some(bank) => Ok((Some(bank.id), None)),
            None => {
                tracing::warn!(row, bank = name, "unknown bank, leaving check bank unset");
                Ok((
                    None,
                    Some(ResolutionNote::BankUnresolved {
                        name: name.to_string(),
                    }),
                ))
            }
        }
    }
}

enum PartnerResolution {
    Found(String),
    Fallback(String),
    Skip,
    Fail,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::MemoryLedger;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn context() -> ImportContext {
        ImportContext::new(
            Company::new("c1".to_string(), "Main".to_string(), "ars".to_string()),
            date(2024, 3, 10),
        )
    }

    fn ledger() -> MemoryLedger {
        let ledger = MemoryLedger::new();
        ledger.add_partner("p-acme", "Acme SA");
        ledger.add_partner("p-acme-2", "Acme SA Sucursal");
        ledger.add_currency("usd", "USD");
        ledger.add_currency("ars", "ARS");
        ledger.add_bank("b-galicia", "Banco de Galicia");
        ledger
    }

    fn check(partner: Option<&str>, amount: Option<i64>) -> CheckRow {
        CheckRow {
            row_number: 2,
            partner_name: partner.map(str::to_string),
            amount: amount.map(BigDecimal::from),
            currency_code: Some("USD".to_string()),
            reference: None,
            check_number: Some("0001".to_string()),
            check_payment_date: None,
            bank_name: Some("galicia".to_string()),
        }
    }

    fn ready(resolution: Resolution) -> ResolvedCheck {
        match resolution {
            Resolution::Ready(resolved) => resolved,
            other => panic!("expected a resolved row, got {other:?}"),
        }
    }

    #[test]
    fn test_payment_date_precedence() {
        let today = date(2024, 3, 10);
        let row = Some(date(2024, 6, 1));
        let default = Some(date(2024, 5, 1));
        assert_eq!(effective_payment_date(row, default, today), date(2024, 6, 1));
        assert_eq!(effective_payment_date(None, default, today), date(2024, 5, 1));
        assert_eq!(effective_payment_date(None, None, today), today);
    }

    #[tokio::test]
    async fn test_resolves_known_references() {
        let ledger = ledger();
        let config = ImportConfig::default();
        let context = context();
        let resolver = RowResolver::new(&ledger, &config, &context, None);

        let resolved = ready(resolver.resolve(&check(Some("Acme SA"), Some(100))).await.unwrap());
        assert_eq!(resolved.partner_id, "p-acme");
        assert_eq!(resolved.currency_id, "usd");
        assert_eq!(resolved.bank_id.as_deref(), Some("b-galicia"));
        assert_eq!(resolved.check_payment_date, date(2024, 3, 10));
        assert!(resolved.notes.is_empty());
    }

    #[tokio::test]
    async fn test_missing_or_zero_amount_is_skipped() {
        let ledger = ledger();
        let config = ImportConfig::default();
        let context = context();
        let resolver = RowResolver::new(&ledger, &config, &context, None);

        for amount in [None, Some(0)] {
            let resolution = resolver.resolve(&check(Some("Acme SA"), amount)).await.unwrap();
            assert_eq!(resolution, Resolution::Skipped(SkipReason::MissingAmount));
        }
    }

    #[tokio::test]
    async fn test_unmatched_partner_policies() {
        let ledger = ledger();
        let context = context();
        let row = check(Some("Nobody"), Some(10));

        let config = ImportConfig::default();
        let resolver = RowResolver::new(&ledger, &config, &context, None);
        let resolved = ready(resolver.resolve(&row).await.unwrap());
        assert_eq!(resolved.partner_id, "1");
        assert_eq!(
            resolved.notes,
            vec![ResolutionNote::PartnerFallback {
                name: Some("Nobody".to_string()),
                partner_id: "1".to_string()
            }]
        );

        let config = ImportConfig::default().with_unmatched_partner(UnmatchedPartnerPolicy::Skip);
        let resolver = RowResolver::new(&ledger, &config, &context, None);
        assert!(matches!(
            resolver.resolve(&row).await.unwrap(),
            Resolution::Skipped(SkipReason::UnmatchedPartner { .. })
        ));

        let config = ImportConfig::default().with_unmatched_partner(UnmatchedPartnerPolicy::Fail);
        let resolver = RowResolver::new(&ledger, &config, &context, None);
        assert_eq!(
            resolver.resolve(&row).await.unwrap(),
            Resolution::Rejected(RowError::UnmatchedPartner {
                name: "Nobody".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_contains_match_takes_first_partner() {
        let ledger = ledger();
        let config = ImportConfig {
            partner_match: NameMatch::Contains,
            ..ImportConfig::default()
        };
        let context = context();
        let resolver = RowResolver::new(&ledger, &config, &context, None);

        let resolved = ready(resolver.resolve(&check(Some("Acme"), Some(5))).await.unwrap());
        assert_eq!(resolved.partner_id, "p-acme");
    }

    #[tokio::test]
    async fn test_unknown_currency_and_bank_fall_back() {
        let ledger = ledger();
        let config = ImportConfig::default();
        let context = context();
        let resolver = RowResolver::new(&ledger, &config, &context, Some(date(2024, 4, 1)));

        let mut row = check(Some("Acme SA"), Some(5));
        row.currency_code = Some("XYZ".to_string());
        row.bank_name = Some("Banco Inexistente".to_string());

        let resolved = ready(resolver.resolve(&row).await.unwrap());
        assert_eq!(resolved.currency_id, "ars");
        assert_eq!(resolved.bank_id, None);
        assert_eq!(resolved.check_payment_date, date(2024, 4, 1));
        assert_eq!(resolved.notes.len(), 2);
    }
}
