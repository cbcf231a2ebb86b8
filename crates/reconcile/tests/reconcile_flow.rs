use chrono::NaiveDate;

use cuadre_core::{Currency, Money, BROU_ACCOUNT};
use cuadre_import::import_statement;
use cuadre_reconcile::{
    format_summary, parse_ledger_transactions, AccountMappings, EntryGenerator, ExactPolicy, MatchKind,
    ReconcileEngine,
};

const STATEMENT: &str = "\
Fecha,Descripción,Débito,Crédito,Moneda
01/03/2024,SUELDO MARZO,,\"45.000,00\",$
05/03/2024,DEBITO UTE,\"2.500,00\",,$
10/03/2024,SUPERMERCADO XYZ,\"103,00\",,$
10/03/2024,COMPRA DISCO CENTRO,\"1.250,00\",,$
10/03/2024,TIENDA INGLESA POCITOS,\"300,50\",,$
12/03/2024,TRANSFERENCIA RECIBIDA,,\"800,00\",$
";

const LEDGER: &str = "\
2024/02/28 Alquiler febrero
    Assets:Bank:BROU  $ -20,000.00
    Expenses:Rent

2024/03/01 Sueldo
    Assets:Bank:BROU  $ 45,000.00
    Income:Salary

2024/03/07 UTE
    Expenses:Utilities  $ 2,500.00
    Assets:Bank:BROU  $ -2,500.00

2024/03/12 super xyz compra
    Expenses:Food  $ 100.00
    Assets:Bank:BROU  $ -100.00

2024/03/11 Cuota club
    Expenses:Sports  $ 1,500.00
    Assets:Bank:BROU  $ -1,500.00
";

const MAPPINGS: &str = r#"{"description_mappings": [
    {"patterns": ["DISCO", "TIENDA INGLESA"], "account": "Expenses:Food"},
    {"patterns": ["UTE"], "account": "Expenses:Utilities"}
]}"#;

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
}

#[test]
fn statement_to_suggested_entries() {
    let statements = import_statement("brou_marzo.csv", STATEMENT.as_bytes(), "Assets:Bank:Other").unwrap();
    let statement = &statements[0];
    assert_eq!(statement.account(), BROU_ACCOUNT);
    assert_eq!(statement.currency(), Currency::Local);
    assert_eq!(statement.len(), 6);

    let ledger = parse_ledger_transactions(LEDGER, BROU_ACCOUNT);
    assert_eq!(ledger.len(), 5);

    let result = ReconcileEngine::with_policy(ExactPolicy::SameDay).reconcile(statement, &ledger);

    // Sueldo matches exactly; UTE two days late still scores high enough.
    assert_eq!(result.exact_count(), 1);
    assert_eq!(result.fuzzy_count(), 1);
    let fuzzy = result.matches.iter().find(|m| m.kind == MatchKind::Fuzzy).unwrap();
    assert_eq!(fuzzy.bank.description, "DEBITO UTE");
    assert!(fuzzy.score > 0.6 && fuzzy.score <= 1.0);

    // Partition of the statement side.
    assert_eq!(result.matches.len() + result.unmatched_bank.len(), statement.len());
    // The supermarket pair scores just under the threshold.
    assert!(result.unmatched_bank.iter().any(|t| t.description == "SUPERMERCADO XYZ"));

    // Ledger rows outside 2024-03-01..=2024-03-12 are not reported.
    let unmatched_ledger: Vec<&str> = result.unmatched_ledger.iter().map(|l| l.description.as_str()).collect();
    assert_eq!(unmatched_ledger, vec!["super xyz compra", "Cuota club"]);

    assert_eq!(result.totals.bank_debits, Money::from_cents(415_350));
    assert_eq!(result.totals.bank_credits, Money::from_cents(4_580_000));
    assert_eq!(result.totals.ledger_debits, Money::from_cents(2_410_000));
    assert_eq!(result.totals.ledger_credits, Money::from_cents(4_500_000));
    assert_eq!(result.period.map(|p| (p.start, p.end)), Some((d(1), d(12))));

    let generator = EntryGenerator::new(AccountMappings::from_json(MAPPINGS).unwrap());
    let entries = generator.generate(&result.unmatched_bank);

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0], "2024/03/10 SUPERMERCADO XYZ\n  Assets:Bank:BROU  $-103.00\n  Expenses:Unknown\n");
    assert_eq!(entries[1], "2024/03/12 TRANSFERENCIA RECIBIDA\n  Assets:Bank:BROU  $800.00\n  Income:Unknown\n");
    assert_eq!(
        entries[2],
        "2024/03/10 COMPRA DISCO CENTRO (+1 more)\n  \
         Assets:Bank:BROU  $-1250.00  ; COMPRA DISCO CENTRO\n  \
         Assets:Bank:BROU  $-300.50  ; TIENDA INGLESA POCITOS\n  \
         Expenses:Food\n"
    );

    let summary = format_summary(&result);
    assert!(summary.contains("Matched Transactions: 2\n"));
    assert!(summary.contains("Unmatched Bank Transactions: 4\n"));
}

#[test]
fn window_policy_turns_late_postings_into_exact_matches() {
    let statements = import_statement("brou_marzo.csv", STATEMENT.as_bytes(), "unused").unwrap();
    let ledger = parse_ledger_transactions(LEDGER, BROU_ACCOUNT);
    let result = ReconcileEngine::with_policy(ExactPolicy::Window).reconcile(&statements[0], &ledger);
    assert_eq!(result.exact_count(), 2);
    assert_eq!(result.fuzzy_count(), 0);
}
