//! Import configuration

use serde::{Deserialize, Serialize};

use crate::spreadsheet::ColumnMap;
use crate::types::{ImportError, ImportResult, NameMatch};

/// Partner assigned to rows whose partner cannot be found
pub const DEFAULT_FALLBACK_PARTNER_ID: &str = "1";

/// Reason recorded on reversal entries
pub const DEFAULT_REVERSAL_REASON: &str = "Reversal of imported third-party check";

/// What to do with a row whose partner name matches nobody
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum UnmatchedPartnerPolicy {
    /// Book the check against a fixed partner
    Fallback { partner_id: String },
    /// Leave the row out of the import
    Skip,
    /// Report the row as failed
    Fail,
}

impl Default for UnmatchedPartnerPolicy {
    fn default() -> Self {
        UnmatchedPartnerPolicy::Fallback {
            partner_id: DEFAULT_FALLBACK_PARTNER_ID.to_string(),
        }
    }
}

/// How row failures affect the rest of the batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchMode {
    /// Write every valid row, report the others
    #[default]
    BestEffort,
    /// Write nothing if any row fails to resolve
    Strict,
}

/// Post-and-reverse step run after each payment is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReversalConfig {
    pub enabled: bool,
    pub reason: String,
}

impl Default for ReversalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            reason: DEFAULT_REVERSAL_REASON.to_string(),
        }
    }
}

/// Settings for a check import run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub columns: ColumnMap,
    /// Leading rows that are never imported
    pub header_rows: usize,
    pub partner_match: NameMatch,
    pub unmatched_partner: UnmatchedPartnerPolicy,
    pub batch_mode: BatchMode,
    pub reversal: ReversalConfig,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            columns: ColumnMap::default(),
            header_rows: 1,
            partner_match: NameMatch::Exact,
            unmatched_partner: UnmatchedPartnerPolicy::default(),
            batch_mode: BatchMode::default(),
            reversal: ReversalConfig::default(),
        }
    }
}

impl ImportConfig {
    /// Parse and validate a JSON configuration; missing keys keep their defaults
    pub fn from_json_str(json: &str) -> ImportResult<Self> {
        let config: ImportConfig = serde_json::from_str(json)
            .map_err(|e| ImportError::Config(format!("invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Enable posting and reversing every created payment group
    pub fn with_reversal(mut self) -> Self {
        self.reversal.enabled = true;
        self
    }

    /// Set the policy for unmatched partners
    pub fn with_unmatched_partner(mut self, policy: UnmatchedPartnerPolicy) -> Self {
        self.unmatched_partner = policy;
        self
    }

    /// Set the batch mode
    pub fn with_batch_mode(mut self, mode: BatchMode) -> Self {
        self.batch_mode = mode;
        self
    }

    pub fn validate(&self) -> ImportResult<()> {
        self.columns.validate()?;

        if self.header_rows == 0 {
            return Err(ImportError::Config(
                "at least one header row must be skipped".to_string(),
            ));
        }

        if let UnmatchedPartnerPolicy::Fallback { partner_id } = &self.unmatched_partner {
            if partner_id.trim().is_empty() {
                return Err(ImportError::Config(
                    "fallback partner id cannot be empty".to_string(),
                ));
            }
        }

        if self.reversal.enabled && self.reversal.reason.trim().is_empty() {
            return Err(ImportError::Config(
                "reversal reason cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_legacy_behaviour() {
        let config = ImportConfig::default();
        assert_eq!(config.header_rows, 1);
        assert_eq!(config.partner_match, NameMatch::Exact);
        assert_eq!(
            config.unmatched_partner,
            UnmatchedPartnerPolicy::Fallback {
                partner_id: "1".to_string()
            }
        );
        assert_eq!(config.batch_mode, BatchMode::BestEffort);
        assert!(!config.reversal.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ImportConfig::from_json_str(
            r#"{
                "columns": { "amount": 7 },
                "unmatched_partner": { "policy": "fail" },
                "reversal": { "enabled": true },
                "batch_mode": "strict"
            }"#,
        )
        .unwrap();

        assert_eq!(config.columns.amount, 7);
        assert_eq!(config.columns.partner_name, 0);
        assert_eq!(config.unmatched_partner, UnmatchedPartnerPolicy::Fail);
        assert_eq!(config.batch_mode, BatchMode::Strict);
        assert!(config.reversal.enabled);
        assert_eq!(config.reversal.reason, DEFAULT_REVERSAL_REASON);
    }

    #[test]
    fn test_invalid_configurations() {
        assert!(matches!(
            ImportConfig::from_json_str(r#"{ "columns": { "amount": 0 } }"#),
            Err(ImportError::Config(_))
        ));
        assert!(matches!(
            ImportConfig::from_json_str(
                r#"{ "unmatched_partner": { "policy": "fallback", "partner_id": " " } }"#
            ),
            Err(ImportError::Config(_))
        ));
        assert!(matches!(
            ImportConfig::from_json_str(r#"{ "header_rows": 0 }"#),
            Err(ImportError::Config(_))
        ));
        assert!(matches!(
            ImportConfig::from_json_str("not json"),
            Err(ImportError::Config(_))
        ));
    }
}
