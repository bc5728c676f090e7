//! Check import example
//!
//! Imports the workbook given as first argument, or a small built-in sheet,
//! into an in-memory ledger and prints the per-row report.
//!
//! `RUST_LOG=check_import=debug cargo run --example import_checks -- checks.xlsx`

use check_import::utils::{MemoryLedger, MemoryRowSource};
use check_import::{
    CellValue, CheckImporter, Company, ImportConfig, ImportContext, ImportRequest, PartnerType,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "check_import=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("🧾 Check Import - Third-party checks example\n");

    // Master data the host ledger would already hold
    let ledger = MemoryLedger::new();
    ledger.add_partner("p-acme", "Acme SA");
    ledger.add_partner("p-globex", "Globex SRL");
    ledger.add_currency("ars", "ARS");
    ledger.add_currency("usd", "USD");
    ledger.add_bank("b-galicia", "Banco de Galicia");
    ledger.add_journal("j-checks", "Third-party checks");
    ledger.add_payment_method_line("m-checks", "j-checks", "Received third-party checks");
    ledger.add_receiptbook("rb-1", "c1", PartnerType::Customer, "Customer receipts");

    let company = Company::new("c1".to_string(), "Main Company".to_string(), "ars".to_string());
    let config = match std::env::var("CHECK_IMPORT_CONFIG") {
        Ok(path) => ImportConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        Err(_) => ImportConfig::default().with_reversal(),
    };
    let mut importer =
        CheckImporter::new(ledger.clone(), config, ImportContext::for_today(company))?;

    let report = match std::env::args().nth(1) {
        Some(path) => {
            let request = ImportRequest::new(
                "j-checks".to_string(),
                "m-checks".to_string(),
                std::fs::read(&path)?,
            )
            .file_name(path);
            importer.import_workbook(&request).await?
        }
        None => {
            let text = |value: &str| CellValue::Text(value.to_string());
            let source = MemoryRowSource::from_cells(vec![
                vec![text("Cliente"), text("Importe"), text("Moneda")],
                vec![
                    text("Acme SA"),
                    CellValue::Float(15000.0),
                    text("ARS"),
                    text("Factura 0001"),
                    CellValue::Int(10203040),
                    text("2024-12-01"),
                    text("galicia"),
                ],
                vec![
                    text("Cliente Nuevo"),
                    CellValue::Float(320.5),
                    text("USD"),
                    CellValue::Empty,
                    CellValue::Int(10203041),
                ],
                vec![text("Globex SRL"), CellValue::Empty],
            ]);
            let request = ImportRequest::new("j-checks".to_string(), "m-checks".to_string(), Vec::new());
            importer.import_rows(&request, &source).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    println!(
        "\n✓ {} created, {} skipped, {} failed, {} reversed",
        report.created_count(),
        report.skipped_count(),
        report.failed_count(),
        report.reversed_count()
    );
    println!("  Ledger now holds {} payments", ledger.payments().len());

    Ok(())
}
