//! Suggested ledger entries for statement rows the ledger does not have yet.

use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::NaiveDate;

use cuadre_core::BankTransaction;

use crate::rules::{AccountMappings, CounterAccount};

/// Longest description kept in a posting comment.
const COMMENT_WIDTH: usize = 30;

pub struct EntryGenerator {
    mappings: AccountMappings,
}

fn title(tx: &BankTransaction) -> String {
    let desc = tx.description.trim();
    match tx.reference.as_deref().filter(|r| !r.is_empty()) {
        Some(reference) => format!("{desc} - {reference}"),
        None => desc.to_string(),
    }
}

fn posting_line(out: &mut String, tx: &BankTransaction) {
    let _ = write!(out, "  {}  {}", tx.account, tx.net().posting(tx.currency));
}

fn short_description(desc: &str) -> String {
    let desc = desc.trim();
    if desc.chars().count() > COMMENT_WIDTH {
        let cut: String = desc.chars().take(COMMENT_WIDTH).collect();
        format!("{cut}...")
    } else {
        desc.to_string()
    }
}

impl EntryGenerator {
    pub fn new(mappings: AccountMappings) -> Self {
        Self { mappings }
    }

    pub fn mappings(&self) -> &AccountMappings {
        &self.mappings
    }

    /// One ledger entry per unmapped row, then one per (date, bank account,
    /// counter-account) group of mapped rows, in key order. Rows a rule sends
    /// to an `Unknown` account are left ungrouped for review.
    pub fn generate(&self, transactions: &[BankTransaction]) -> Vec<String> {
        let mut entries = Vec::new();
        let mut groups: BTreeMap<(NaiveDate, &str, String), Vec<&BankTransaction>> = BTreeMap::new();

        for tx in transactions {
            let counter = self.mappings.resolve(&tx.description, tx.net());
            match counter {
                CounterAccount::Mapped(account) if !is_placeholder(&account) => {
                    groups.entry((tx.date, tx.account.as_str(), account)).or_default().push(tx);
                }
                _ => entries.push(single_entry(tx, &counter)),
            }
        }

        let unmapped = entries.len();
        for ((date, _, counter), txs) in &groups {
            entries.push(group_entry(*date, counter, txs));
        }

        tracing::debug!("suggested {} entries: {unmapped} unmapped, {} grouped", entries.len(), groups.len());
        entries
    }
}

/// Accounts still waiting for a real category.
fn is_placeholder(account: &str) -> bool {
    account.contains("Unknown")
}

fn single_entry(tx: &BankTransaction, counter: &CounterAccount) -> String {
    let mut out = format!("{} {}\n", tx.date.format("%Y/%m/%d"), title(tx));
    posting_line(&mut out, tx);
    let _ = write!(out, "\n  {counter}\n");
    out
}

fn group_entry(date: NaiveDate, counter: &str, txs: &[&BankTransaction]) -> String {
    let mut header = txs.first().map(|tx| title(tx)).unwrap_or_default();
    if txs.len() > 1 {
        let _ = write!(header, " (+{} more)", txs.len() - 1);
    }

    let mut out = format!("{} {header}\n", date.format("%Y/%m/%d"));
    for tx in txs {
        posting_line(&mut out, tx);
        if txs.len() > 1 {
            let _ = write!(out, "  ; {}", short_description(&tx.description));
        }
        out.push('\n');
    }
    let _ = writeln!(out, "  {counter}");
    out
}
