//! Card statement reader over positioned text.
//!
//! The card statement has no table structure: each page is a cloud of text
//! runs placed by coordinates. Lines are rebuilt from geometry, then each
//! line starting with a `DD MM YY` date is classified by its amounts and its
//! length.

use chrono::NaiveDate;
use serde::Deserialize;

use cuadre_core::{BankTransaction, Currency, Money, Statement, VISA_ITAU_ACCOUNT};

use crate::amount::parse_card_amount;
use crate::error::ImportError;
use crate::util::re;

re!(re_line_date, r"^\s*(\d{2})\s+(\d{2})\s+(\d{2})\s+");
re!(re_card_amount, r"-?\d+(?:\.\d{3})*,\d{2}");

/// One string drawn at a position. `y` grows upwards, as in PDF user space.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

impl TextRun {
    pub fn new(x: f64, y: f64, text: impl Into<String>) -> Self {
        TextRun { x, y, text: text.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub runs: Vec<TextRun>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutDocument {
    pub pages: Vec<Page>,
}

/// Template-specific heuristics of the card statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Largest vertical distance between runs of the same line.
    pub line_gap: f64,
    /// Lines at least this long carry both currency columns and are booked
    /// in the foreign currency.
    pub dual_currency_min_len: usize,
    /// Description marker of the payments line, which may carry one amount
    /// per currency.
    pub payment_keyword: String,
    /// On a payments line, a second-to-last amount ending before this
    /// offset sits in the local-currency column.
    pub payment_column_boundary: usize,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        LayoutOptions {
            line_gap: 3.0,
            dual_currency_min_len: 115,
            payment_keyword: "PAGOS".to_string(),
            payment_column_boundary: 95,
        }
    }
}

/// Rebuild the text lines of a page in reading order.
///
/// Runs are taken top to bottom and left to right. A run more than
/// `line_gap` below the first run of the current line starts a new line.
pub fn reconstruct_lines(page: &Page, line_gap: f64) -> Vec<String> {
    let mut runs: Vec<&TextRun> = page.runs.iter().collect();
    runs.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut groups: Vec<Vec<&TextRun>> = Vec::new();
    for run in runs {
        match groups.last_mut() {
            Some(line) if line[0].y - run.y <= line_gap => line.push(run),
            _ => groups.push(vec![run]),
        }
    }

    groups
        .into_iter()
        .map(|mut line| {
            line.sort_by(|a, b| a.x.total_cmp(&b.x));
            line.iter().map(|r| r.text.as_str()).collect()
        })
        .collect()
}

fn card_transaction(date: NaiveDate, description: &str, reference: Option<&str>, amount: Money, currency: Currency) -> BankTransaction {
    // Card convention: positive is a charge, negative a payment.
    let (debit, credit) = if amount.is_negative() {
        (Money::zero(), -amount)
    } else {
        (amount, Money::zero())
    };
    BankTransaction {
        date,
        description: description.to_string(),
        debit,
        credit,
        balance: None,
        reference: reference.map(str::to_string),
        account: VISA_ITAU_ACCOUNT.to_string(),
        currency,
    }
}

/// Split a leading four-digit voucher number off the description.
fn split_reference(description: &str) -> (Option<&str>, &str) {
    match description.split_once(' ') {
        Some((head, rest)) if head.len() == 4 && head.bytes().all(|b| b.is_ascii_digit()) => {
            (Some(head), rest.trim())
        }
        _ => (None, description),
    }
}

/// Classify one reconstructed line. Non-transaction lines yield nothing; a
/// payments line may yield one transaction per currency.
pub fn parse_line(line: &str, opts: &LayoutOptions) -> Vec<BankTransaction> {
    let Some(caps) = re_line_date().captures(line) else {
        return Vec::new();
    };
    let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok()).unwrap_or(0);
    let Some(date) = NaiveDate::from_ymd_opt(2000 + field(3) as i32, field(2), field(1)) else {
        tracing::debug!(line, "card line with impossible date skipped");
        return Vec::new();
    };

    let after_date = &line[caps.get(0).map_or(0, |m| m.end())..];
    let amounts: Vec<regex::Match> = re_card_amount().find_iter(after_date).collect();

    let description = match amounts.first() {
        Some(first) if first.start() > 0 => after_date[..first.start()].trim(),
        _ => after_date,
    };
    let (reference, description) = split_reference(description);

    let is_payment = description.to_uppercase().contains(&opts.payment_keyword.to_uppercase());
    if is_payment && amounts.len() >= 2 {
        let local = amounts[amounts.len() - 2];
        let foreign = amounts[amounts.len() - 1];
        if local.end() < opts.payment_column_boundary {
            return [(local, Currency::Local), (foreign, Currency::Foreign)]
                .into_iter()
                .map(|(m, currency)| (parse_card_amount(m.as_str()), currency))
                .filter(|(amount, _)| !amount.is_zero())
                .map(|(amount, currency)| card_transaction(date, description, reference, amount, currency))
                .collect();
        }
    }

    let amount = amounts.last().map_or(Money::zero(), |m| parse_card_amount(m.as_str()));
    if amount.is_zero() {
        return Vec::new();
    }

    let currency = if line.len() >= opts.dual_currency_min_len {
        Currency::Foreign
    } else {
        Currency::Local
    };
    vec![card_transaction(date, description, reference, amount, currency)]
}

/// Read every page of a card statement into a local-currency and a
/// foreign-currency statement, in that order. Empty statements are left out.
pub fn read_layout(doc: &LayoutDocument, opts: &LayoutOptions) -> Result<Vec<Statement>, ImportError> {
    let mut local = Vec::new();
    let mut foreign = Vec::new();

    for page in &doc.pages {
        for line in reconstruct_lines(page, opts.line_gap) {
            for tx in parse_line(&line, opts) {
                match tx.currency {
                    Currency::Local => local.push(tx),
                    Currency::Foreign => foreign.push(tx),
                }
            }
        }
    }

    tracing::info!(
        "card statement: {} local and {} foreign transaction(s) over {} page(s)",
        local.len(),
        foreign.len(),
        doc.pages.len()
    );

    let statements: Vec<Statement> = [(Currency::Local, local), (Currency::Foreign, foreign)]
        .into_iter()
        .filter(|(_, txs)| !txs.is_empty())
        .map(|(currency, txs)| Statement::new(VISA_ITAU_ACCOUNT, currency, txs))
        .collect();

    if statements.is_empty() {
        return Err(ImportError::NoTransactions);
    }
    Ok(statements)
}
