//! Reading what the ledger already records for an account.
//!
//! Two sources are supported: the ledger file text itself, and the output of
//! a `reg` query run by an external collaborator. The engine only builds the
//! query string and parses the answer; running the tool is the caller's job.

use chrono::NaiveDate;
use regex::Regex;

use cuadre_core::{Currency, LedgerTransaction, Money};
use cuadre_import::{parse_iso_date, parse_ledger_amount};

use crate::error::QueryError;
use crate::util::re;

re!(re_entry_header, r"^(\d{4})[/-](\d{1,2})[/-](\d{1,2})(?:\s+(.*))?$");
re!(re_register_row, r"^(\d{4}[/-]\d{1,2}[/-]\d{1,2})\s+(.+)$");
re!(re_balance_row, r"^\s*((?:US)?\$)\s*([\-\d,\.]+)\s*$");
re!(re_posting_account, r"(?m)^[ \t]+(\w.*?)(?:[ \t]{2}.*?)?$");

/// Runs a query against the external ledger tool and returns its raw text
/// output.
pub trait LedgerQueryRunner {
    fn run(&self, query: &str) -> Result<String, QueryError>;
}

impl<F> LedgerQueryRunner for F
where
    F: Fn(&str) -> Result<String, QueryError>,
{
    fn run(&self, query: &str) -> Result<String, QueryError> {
        self(query)
    }
}

fn posting_regex(account: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"^\s+({}(?::\w+)*)\s+([\$US\-\d\.,\s]+)", regex::escape(account)))
}

struct OpenEntry {
    date: NaiveDate,
    description: String,
    line_number: usize,
    text: String,
}

/// Extract the postings to `account` (or any of its sub-accounts) from
/// ledger file text.
///
/// An entry opens on a `YYYY/MM/DD description` line and closes on a blank
/// line. Each captured posting keeps the entry header's line number and the
/// entry text up to the posting.
pub fn parse_ledger_transactions(text: &str, account: &str) -> Vec<LedgerTransaction> {
    parse_ledger_postings(text, account, None)
}

/// Like [`parse_ledger_transactions`], keeping only postings whose amount
/// carries the commodity of `currency` when one is given.
pub fn parse_ledger_postings(text: &str, account: &str, currency: Option<Currency>) -> Vec<LedgerTransaction> {
    let posting = match posting_regex(account) {
        Ok(re) => re,
        Err(e) => {
            tracing::warn!("cannot build posting pattern for '{account}': {e}");
            return Vec::new();
        }
    };

    let mut transactions = Vec::new();
    let mut entry: Option<OpenEntry> = None;

    for (index, line) in text.lines().enumerate() {
        if let Some(caps) = re_entry_header().captures(line) {
            let part = |i: usize| caps.get(i).map_or("", |m| m.as_str());
            let date = part(1)
                .parse()
                .ok()
                .zip(part(2).parse().ok())
                .zip(part(3).parse().ok())
                .and_then(|((y, m), d)| NaiveDate::from_ymd_opt(y, m, d));
            entry = match date {
                Some(date) => Some(OpenEntry {
                    date,
                    description: part(4).trim().to_string(),
                    line_number: index + 1,
                    text: format!("{line}\n"),
                }),
                None => {
                    tracing::debug!(line = index + 1, "entry header with impossible date ignored");
                    None
                }
            };
            continue;
        }

        if line.trim().is_empty() {
            entry = None;
            continue;
        }

        let Some(open) = entry.as_mut() else {
            continue;
        };

        open.text.push_str(line);
        open.text.push('\n');

        if let Some(caps) = posting.captures(line) {
            let raw_amount = caps.get(2).map_or("", |m| m.as_str().trim());
            if currency.is_some() && Currency::detect(raw_amount) != currency {
                continue;
            }
            match parse_ledger_amount(raw_amount) {
                Ok(amount) => transactions.push(LedgerTransaction {
                    date: open.date,
                    description: open.description.clone(),
                    account: caps.get(1).map_or("", |m| m.as_str()).to_string(),
                    amount: Money::from_decimal(amount),
                    line_number: open.line_number,
                    raw_entry: open.text.clone(),
                }),
                Err(e) => tracing::debug!(line = index + 1, "posting skipped: {e}"),
            }
        }
    }

    tracing::info!("ledger: {} posting(s) to {account}", transactions.len());
    transactions
}

/// The `reg` query listing one `YYYY-MM-DD amount` line per posting to
/// `account`, optionally restricted to one commodity.
pub fn register_query(account: &str, currency: Option<Currency>) -> String {
    let format = r#"-F '%(format_date(date, "%Y-%m-%d")) %t\n'"#;
    match currency {
        Some(currency) => format!(r#"reg {account} -l 'commodity == "\{}"' {format}"#, currency.symbol()),
        None => format!("reg {account} {format}"),
    }
}

fn check_tool_error(output: &str) -> Result<(), QueryError> {
    match output.lines().map(str::trim).find(|l| l.starts_with("Error")) {
        Some(line) => Err(QueryError::Failed(line.to_string())),
        None => Ok(()),
    }
}

/// Parse the output of [`register_query`]. Every non-blank line must be a
/// posting; one that is not makes the whole output unparseable, so a caller
/// never works from part of the register.
pub fn parse_register_output(output: &str, account: &str) -> Result<Vec<LedgerTransaction>, QueryError> {
    let output = output.trim();
    if output.is_empty() {
        return Ok(Vec::new());
    }
    check_tool_error(output)?;

    let mut transactions = Vec::new();
    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let unparseable = || QueryError::Unparseable(line.to_string());
        let caps = re_register_row().captures(line).ok_or_else(unparseable)?;
        let date = caps.get(1).map_or("", |m| m.as_str());
        let amount = caps.get(2).map_or("", |m| m.as_str().trim());
        let date = parse_iso_date(date).map_err(|_| unparseable())?;
        let amount = parse_ledger_amount(amount).map_err(|_| unparseable())?;
        transactions.push(LedgerTransaction::new(date, "", account, Money::from_decimal(amount)));
    }

    tracing::debug!("register: {} posting(s) for {account}", transactions.len());
    Ok(transactions)
}

/// Ask the ledger for the postings of `account`.
pub fn query_ledger_transactions<R: LedgerQueryRunner + ?Sized>(
    runner: &R,
    account: &str,
    currency: Option<Currency>,
) -> Result<Vec<LedgerTransaction>, QueryError> {
    let output = runner.run(&register_query(account, currency))?;
    parse_register_output(&output, account)
}

/// The `bal` query for the balance of `account` before `end_date`, one line
/// per commodity.
pub fn balance_query(account: &str, end_date: NaiveDate) -> String {
    format!(r"bal '{account}' -e '{}' -F '%T\n'", end_date.format("%Y-%m-%d"))
}

/// Read `$ 1,234.56` / `US$ -20.00` lines; anything else is ignored.
pub fn parse_balances(output: &str) -> Vec<(Currency, Money)> {
    output
        .lines()
        .filter_map(|line| {
            let caps = re_balance_row().captures(line.trim())?;
            let currency = match caps.get(1)?.as_str() {
                "US$" => Currency::Foreign,
                _ => Currency::Local,
            };
            let amount = parse_ledger_amount(caps.get(2)?.as_str()).ok()?;
            Some((currency, Money::from_decimal(amount)))
        })
        .collect()
}

/// Ask the ledger for the per-commodity balance of `account` before
/// `end_date`.
pub fn query_balances<R: LedgerQueryRunner + ?Sized>(
    runner: &R,
    account: &str,
    end_date: NaiveDate,
) -> Result<Vec<(Currency, Money)>, QueryError> {
    let output = runner.run(&balance_query(account, end_date))?;
    check_tool_error(&output)?;
    Ok(parse_balances(&output))
}

/// Distinct account names used in postings, in order of first appearance.
pub fn ledger_accounts(text: &str) -> Vec<String> {
    let mut accounts: Vec<String> = Vec::new();
    for caps in re_posting_account().captures_iter(text) {
        let Some(name) = caps.get(1).map(|m| m.as_str().trim()) else {
            continue;
        };
        if !accounts.iter().any(|a| a == name) {
            accounts.push(name.to_string());
        }
    }
    accounts
}
