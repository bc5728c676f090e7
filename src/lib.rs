//! # Check Import
//!
//! Imports third-party checks received from customers out of a spreadsheet
//! and books them as payments in a host ledger.
//!
//! ## Features
//!
//! - **Workbook decoding**: first sheet of xlsx/xls/ods uploads, header row skipped
//! - **Configurable columns**: each field role maps to a column position
//! - **Reference resolution**: partners, currencies and banks looked up by name with fallbacks
//! - **Explicit policies**: unmatched partners fall back, skip or fail; batches are best-effort or strict
//! - **Post and reverse**: optionally post each payment group and reverse its ledger entry
//! - **Per-row report**: every fallback, skip and failure is reported, not just logged
//! - **Gateway abstraction**: the host ledger is reached through the `LedgerGateway` trait
//!
//! ## Quick Start
//!
//! ```rust
//! use check_import::{CheckImporter, Company, ImportConfig, ImportContext, ImportRequest};
//! use check_import::utils::MemoryLedger;
//!
//! // A real integration implements LedgerGateway for the host platform
//! let ledger = MemoryLedger::new();
//! let company = Company::new("1".to_string(), "Main".to_string(), "ARS".to_string());
//! let importer = CheckImporter::new(ledger, ImportConfig::default(), ImportContext::for_today(company));
//! assert!(importer.is_ok());
//! ```

pub mod config;
pub mod import;
pub mod spreadsheet;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::*;
pub use import::*;
pub use spreadsheet::*;
pub use traits::*;
pub use types::*;
