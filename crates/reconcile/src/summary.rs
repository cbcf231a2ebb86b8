use std::fmt::Write;

use crate::match_engine::ReconciliationResult;

/// Plain-text overview of a reconciliation: totals, match counts and what
/// is left on each side.
pub fn format_summary(result: &ReconciliationResult) -> String {
    let symbol = result.currency.symbol();
    let totals = &result.totals;
    let period = result.period.map(|p| p.to_string()).unwrap_or_default();

    let mut out = String::new();
    out.push_str("Bank Reconciliation Summary\n");
    out.push_str("===========================\n\n");

    let _ = writeln!(out, "Account: {}", result.account);
    let _ = writeln!(out, "Currency: {symbol}");
    let _ = writeln!(out, "Period: {period}\n");

    out.push_str("Totals:\n");
    let _ = writeln!(out, "  Bank Debits:   {symbol}{}", totals.bank_debits);
    let _ = writeln!(out, "  Bank Credits:  {symbol}{}", totals.bank_credits);
    let _ = writeln!(out, "  Ledger Debits: {symbol}{}", totals.ledger_debits);
    let _ = writeln!(out, "  Ledger Credits:{symbol}{}\n", totals.ledger_credits);

    let _ = writeln!(out, "Matched Transactions: {}", result.matches.len());
    let _ = writeln!(out, "  - Exact matches: {}", result.exact_count());
    let _ = writeln!(out, "  - Fuzzy matches: {}\n", result.fuzzy_count());

    let _ = writeln!(out, "Unmatched Bank Transactions: {}", result.unmatched_bank.len());
    let _ = writeln!(out, "Unmatched Ledger Transactions: {}", result.unmatched_ledger.len());
    out
}
