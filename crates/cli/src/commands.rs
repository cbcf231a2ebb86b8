use std::io::{stdout, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;

use cuadre_core::{Statement, StatementSource};
use cuadre_import::import_statement;
use cuadre_reconcile::{
    find_duplicates, format_summary, ledger_accounts, parse_ledger_postings, AccountMappings, EntryGenerator,
    ExactPolicy, ReconcileEngine, ReconciliationResult,
};

/// Rows this close in time with this much description overlap are reported
/// as possible double imports.
const DUPLICATE_WINDOW_DAYS: i64 = 1;
const DUPLICATE_SIMILARITY: f64 = 0.9;

pub struct ReconcileArgs {
    pub statement: PathBuf,
    pub ledger: PathBuf,
    pub account: Option<String>,
    pub mappings: PathBuf,
    pub policy: ExactPolicy,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct Report {
    result: ReconciliationResult,
    entries: Vec<String>,
}

fn load_statements(path: &Path, account: Option<&str>) -> Result<Vec<Statement>> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Not a statement file: {}", path.display()))?;

    if name.to_lowercase().ends_with(".csv") && StatementSource::detect(name).is_none() && account.is_none() {
        bail!("--account is required for CSV statements not named after a bank");
    }

    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let statements = import_statement(name, &data, account.unwrap_or_default())
        .with_context(|| format!("Failed to import {name}"))?;
    Ok(statements)
}

/// Book every row of `statement` to `account`.
fn rebook(statement: &Statement, account: &str) -> Statement {
    let transactions = statement
        .transactions()
        .iter()
        .cloned()
        .map(|mut tx| {
            tx.account = account.to_string();
            tx
        })
        .collect();
    Statement::new(account, statement.currency(), transactions)
}

pub fn reconcile(args: &ReconcileArgs) -> Result<()> {
    let mut out = BufWriter::new(stdout().lock());
    run_reconcile(args, &mut out)?;
    out.flush()?;
    Ok(())
}

fn run_reconcile(args: &ReconcileArgs, out: &mut impl Write) -> Result<()> {
    let mut statements = load_statements(&args.statement, args.account.as_deref())?;
    if let Some(account) = args.account.as_deref() {
        statements = statements.iter().map(|s| rebook(s, account)).collect();
    }

    let ledger_text = std::fs::read_to_string(&args.ledger)
        .with_context(|| format!("Failed to read ledger {}", args.ledger.display()))?;
    let mappings = AccountMappings::load_or_default(&args.mappings)
        .with_context(|| format!("Failed to load {}", args.mappings.display()))?;

    let engine = ReconcileEngine::with_policy(args.policy);
    let generator = EntryGenerator::new(mappings);

    let mut reports = Vec::new();
    for statement in &statements {
        // A card statement yields one statement per currency under one account.
        let commodity = (statements.len() > 1).then(|| statement.currency());
        let ledger = parse_ledger_postings(&ledger_text, statement.account(), commodity);

        for (a, b) in find_duplicates(statement.transactions(), DUPLICATE_WINDOW_DAYS, DUPLICATE_SIMILARITY) {
            let tx = &statement.transactions()[a];
            tracing::warn!(
                "possible duplicate rows {} and {}: {} {} {}",
                a + 1,
                b + 1,
                tx.date,
                tx.description,
                tx.net().format(tx.currency)
            );
        }

        let result = engine.reconcile(statement, &ledger);
        let entries = generator.generate(&result.unmatched_bank);
        reports.push(Report { result, entries });
    }

    if args.json {
        serde_json::to_writer_pretty(&mut *out, &reports)?;
        writeln!(out)?;
    } else {
        for report in &reports {
            write_report(out, report)?;
        }
    }
    Ok(())
}

fn write_report(out: &mut impl Write, report: &Report) -> Result<()> {
    let result = &report.result;
    writeln!(out, "{}", format_summary(result))?;

    if !result.unmatched_ledger.is_empty() {
        writeln!(out, "In the ledger but not on the statement:")?;
        for tx in &result.unmatched_ledger {
            writeln!(
                out,
                "  {}  {:<40} {:>14}  (line {})",
                tx.date,
                tx.description,
                tx.amount.format(result.currency),
                tx.line_number
            )?;
        }
        writeln!(out)?;
    }

    if !report.entries.is_empty() {
        writeln!(out, "Suggested entries:\n")?;
        for entry in &report.entries {
            writeln!(out, "{entry}")?;
        }
    }
    Ok(())
}

pub fn import(path: &Path, account: Option<&str>, json: bool) -> Result<()> {
    let mut out = BufWriter::new(stdout().lock());
    run_import(path, account, json, &mut out)?;
    out.flush()?;
    Ok(())
}

fn run_import(path: &Path, account: Option<&str>, json: bool, out: &mut impl Write) -> Result<()> {
    let statements = load_statements(path, account)?;

    if json {
        serde_json::to_writer_pretty(&mut *out, &statements)?;
        writeln!(out)?;
        return Ok(());
    }

    for statement in &statements {
        let period = statement.period().map(|p| p.to_string()).unwrap_or_default();
        writeln!(
            out,
            "{} ({}) {period}: {} transaction(s)",
            statement.account(),
            statement.currency(),
            statement.len()
        )?;
        for tx in statement.transactions() {
            writeln!(out, "  {}  {:<40} {:>14}", tx.date, tx.description, tx.net().format(tx.currency))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn accounts(ledger: &Path) -> Result<()> {
    let text = std::fs::read_to_string(ledger).with_context(|| format!("Failed to read ledger {}", ledger.display()))?;
    let mut out = BufWriter::new(stdout().lock());
    for account in ledger_accounts(&text) {
        writeln!(out, "{account}")?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATEMENT: &str = "\
Fecha,Descripción,Débito,Crédito,Moneda
01/03/2024,SUELDO MARZO,,\"45.000,00\",$
10/03/2024,FARMACIA CENTRAL,\"350,00\",,$
";

    const LEDGER: &str = "\
2024/03/01 Sueldo
    Assets:Bank:BROU  $ 45,000.00
    Income:Salary

2024/03/01 Sueldo
    Assets:Bank:Santander  $ 45,000.00
    Income:Salary
";

    struct Files {
        dir: tempfile::TempDir,
    }

    impl Files {
        fn new(statement_name: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join(statement_name), STATEMENT).unwrap();
            std::fs::write(dir.path().join("main.ledger"), LEDGER).unwrap();
            Files { dir }
        }

        fn args(&self, statement_name: &str, account: Option<&str>, json: bool) -> ReconcileArgs {
            ReconcileArgs {
                statement: self.dir.path().join(statement_name),
                ledger: self.dir.path().join("main.ledger"),
                account: account.map(str::to_string),
                mappings: self.dir.path().join("account_mappings.json"),
                policy: ExactPolicy::SameDay,
                json,
            }
        }
    }

    fn run(args: &ReconcileArgs) -> Result<String> {
        let mut out = Vec::new();
        run_reconcile(args, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    // ── reconcile ─────────────────────────────────────────────────────────────

    #[test]
    fn reconcile_prints_summary_and_entries() {
        let files = Files::new("brou_marzo.csv");
        let text = run(&files.args("brou_marzo.csv", None, false)).unwrap();

        assert!(text.contains("Account: Assets:Bank:BROU\n"));
        assert!(text.contains("  - Exact matches: 1\n"));
        assert!(text.contains("Unmatched Bank Transactions: 1\n"));
        assert!(text.contains("Suggested entries:"));
        assert!(text.contains("2024/03/10 FARMACIA CENTRAL\n  Assets:Bank:BROU  $-350.00\n  Expenses:Unknown\n"));
    }

    #[test]
    fn reconcile_json_carries_result_and_entries() {
        let files = Files::new("brou_marzo.csv");
        let text = run(&files.args("brou_marzo.csv", None, true)).unwrap();

        let reports: serde_json::Value = serde_json::from_str(&text).unwrap();
        let report = &reports[0];
        assert_eq!(report["result"]["account"], "Assets:Bank:BROU");
        assert_eq!(report["result"]["matches"][0]["kind"], "exact");
        assert_eq!(report["entries"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn account_override_reaches_ledger_and_entries() {
        let files = Files::new("movimientos.csv");
        let text = run(&files.args("movimientos.csv", Some("Assets:Bank:Santander"), false)).unwrap();

        assert!(text.contains("Account: Assets:Bank:Santander\n"));
        assert!(text.contains("  - Exact matches: 1\n"));
        assert!(text.contains("  Assets:Bank:Santander  $-350.00\n"));
        assert!(!text.contains("Assets:Bank:BROU  $-350.00"));
    }

    #[test]
    fn unnamed_csv_needs_an_account() {
        let files = Files::new("movimientos.csv");
        let err = run(&files.args("movimientos.csv", None, false)).unwrap_err();
        assert!(err.to_string().contains("--account"));
    }

    #[test]
    fn malformed_mappings_file_is_reported() {
        let files = Files::new("brou_marzo.csv");
        std::fs::write(files.dir.path().join("account_mappings.json"), "{not json").unwrap();
        let err = run(&files.args("brou_marzo.csv", None, false)).unwrap_err();
        assert!(err.to_string().contains("account_mappings.json"));
    }

    // ── import ────────────────────────────────────────────────────────────────

    #[test]
    fn import_lists_transactions() {
        let files = Files::new("brou_marzo.csv");
        let mut out = Vec::new();
        run_import(&files.dir.path().join("brou_marzo.csv"), None, false, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("Assets:Bank:BROU ($) 2024-03-01 to 2024-03-10: 2 transaction(s)\n"));
        assert!(text.contains("FARMACIA CENTRAL"));
        assert!(text.contains("-$350.00"));
    }
}
