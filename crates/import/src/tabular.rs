//! Spreadsheet statement reader.
//!
//! Bank exports put a few rows of account metadata above the transaction
//! grid, so the header row is discovered rather than assumed. Each bank gets
//! its own keyword table; adding a bank means adding a [`BankLayout`].

use cuadre_core::{BankTransaction, Currency, Statement, BROU_ACCOUNT, ITAU_ACCOUNT};

use crate::amount::normalize_amount;
use crate::date::parse_date;
use crate::error::ImportError;
use crate::sheet::{Sheet, Workbook};
use crate::util::fold;

/// Header rows are expected within this many rows of the top of a sheet.
pub const HEADER_SCAN_ROWS: usize = 100;

/// How a header cell is compared against a keyword, after folding case and
/// accents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Exact(&'static str),
    Contains(&'static str),
}

impl Keyword {
    fn matches(self, folded: &str) -> bool {
        match self {
            Keyword::Exact(k) => folded == k,
            Keyword::Contains(k) => folded.contains(k),
        }
    }
}

fn any_match(keywords: &[Keyword], folded: &str) -> bool {
    keywords.iter().any(|k| k.matches(folded))
}

/// Where the statement currency is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencyRule {
    /// The marker cell holds the currency itself, e.g. `"Moneda: U$S"`.
    InCell,
    /// The marker cell is a column title; the value sits in a later row of
    /// the same column.
    BelowHeader,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetPolicy {
    /// Try sheets in order until one yields at least one transaction.
    FirstWithTransactions,
    /// Only the first sheet is read.
    FirstOnly,
}

/// Keyword table for one bank's spreadsheet export.
#[derive(Debug, Clone, Copy)]
pub struct BankLayout {
    pub bank: &'static str,
    pub date: &'static [Keyword],
    pub description: &'static [Keyword],
    pub reference: &'static [Keyword],
    pub debit: &'static [Keyword],
    pub credit: &'static [Keyword],
    pub balance: &'static [Keyword],
    pub currency_marker: Keyword,
    pub currency_rule: CurrencyRule,
    /// Date-cell contents that end the transaction grid.
    pub stop_keywords: &'static [&'static str],
    /// Description-cell contents of rows that are not transactions.
    pub skip_keywords: &'static [&'static str],
    pub sheets: SheetPolicy,
}

pub const BROU_LAYOUT: BankLayout = BankLayout {
    bank: "BROU",
    date: &[Keyword::Exact("fecha")],
    description: &[Keyword::Contains("descripci")],
    reference: &[Keyword::Contains("referencia"), Keyword::Contains("asunto")],
    debit: &[Keyword::Contains("debito")],
    credit: &[Keyword::Contains("credito")],
    balance: &[],
    currency_marker: Keyword::Contains("moneda"),
    currency_rule: CurrencyRule::InCell,
    stop_keywords: &["total"],
    skip_keywords: &[],
    sheets: SheetPolicy::FirstWithTransactions,
};

pub const ITAU_LAYOUT: BankLayout = BankLayout {
    bank: "Itau",
    date: &[Keyword::Exact("fecha")],
    description: &[Keyword::Exact("concepto")],
    reference: &[Keyword::Exact("referencia")],
    debit: &[Keyword::Contains("debito")],
    credit: &[Keyword::Contains("credito")],
    balance: &[Keyword::Exact("saldo")],
    currency_marker: Keyword::Exact("moneda"),
    currency_rule: CurrencyRule::BelowHeader,
    stop_keywords: &["saldo final"],
    skip_keywords: &["saldo anterior"],
    sheets: SheetPolicy::FirstOnly,
};

#[derive(Debug, Default)]
struct Columns {
    date: Option<usize>,
    description: Option<usize>,
    reference: Option<usize>,
    debit: Option<usize>,
    credit: Option<usize>,
    balance: Option<usize>,
}

struct Header {
    row: usize,
    columns: Columns,
    currency: Currency,
}

fn find_header(sheet: &Sheet, layout: &BankLayout) -> Option<Header> {
    let mut columns = Columns::default();
    let mut currency = Currency::Local;
    let mut currency_col = None;

    for row in 0..sheet.row_count().min(HEADER_SCAN_ROWS) {
        let mut header_row = None;

        for col in 0..sheet.width(row) {
            let raw = sheet.cell(row, col);
            let folded = fold(raw);

            let is_marker = layout.currency_marker.matches(&folded);
            match layout.currency_rule {
                CurrencyRule::InCell if is_marker => {
                    if let Some(c) = Currency::detect(raw) {
                        currency = c;
                    }
                }
                CurrencyRule::BelowHeader if is_marker => currency_col = Some(col),
                CurrencyRule::BelowHeader if currency_col == Some(col) => {
                    if let Some(c) = Currency::detect(raw) {
                        currency = c;
                    }
                }
                _ => {}
            }

            if any_match(layout.date, &folded) {
                header_row = Some(row);
                columns.date = Some(col);
            } else if any_match(layout.description, &folded) {
                columns.description = Some(col);
            } else if any_match(layout.reference, &folded) {
                columns.reference = Some(col);
            } else if any_match(layout.debit, &folded) {
                columns.debit = Some(col);
            } else if any_match(layout.credit, &folded) {
                columns.credit = Some(col);
            } else if any_match(layout.balance, &folded) {
                columns.balance = Some(col);
            }
        }

        if let Some(row) = header_row {
            return Some(Header { row, columns, currency });
        }
    }

    None
}

/// Read one worksheet with a bank's keyword table.
///
/// Fails only when no header row is found; a header followed by no usable
/// rows yields an empty statement.
pub fn read_sheet(sheet: &Sheet, layout: &BankLayout, account: &str) -> Result<Statement, ImportError> {
    let header = find_header(sheet, layout).ok_or(ImportError::HeaderNotFound(layout.bank))?;
    let cols = &header.columns;
    let mut transactions = Vec::new();

    for row in header.row + 1..sheet.row_count() {
        if sheet.width(row) == 0 {
            continue;
        }

        let date_cell = sheet.cell_at(row, cols.date);
        let folded_date = fold(date_cell);
        if date_cell.is_empty() || layout.stop_keywords.iter().any(|k| folded_date.contains(k)) {
            break;
        }

        let description = sheet.cell_at(row, cols.description);
        let folded_desc = fold(description);
        if layout.skip_keywords.iter().any(|k| folded_desc.contains(k)) {
            tracing::debug!(row, "{}: skipping '{description}'", layout.bank);
            continue;
        }

        let date = match parse_date(date_cell) {
            Ok(date) => date,
            Err(e) => {
                tracing::debug!(row, "{}: {e}, row skipped", layout.bank);
                continue;
            }
        };

        let reference = Some(sheet.cell_at(row, cols.reference))
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        transactions.push(BankTransaction {
            date,
            description: description.to_string(),
            debit: normalize_amount(sheet.cell_at(row, cols.debit)).abs(),
            credit: normalize_amount(sheet.cell_at(row, cols.credit)).abs(),
            balance: cols.balance.map(|c| normalize_amount(sheet.cell(row, c))),
            reference,
            account: account.to_string(),
            currency: header.currency,
        });
    }

    tracing::info!(
        "{}: {} transaction(s) in {} sheet '{}'",
        layout.bank,
        transactions.len(),
        header.currency,
        sheet.name
    );
    Ok(Statement::new(account, header.currency, transactions))
}

/// Read a workbook according to the layout's sheet policy.
pub fn read_workbook(workbook: &Workbook, layout: &BankLayout, account: &str) -> Result<Statement, ImportError> {
    let candidates: &[Sheet] = match layout.sheets {
        SheetPolicy::FirstOnly => workbook.sheets.get(..1).unwrap_or(&[]),
        SheetPolicy::FirstWithTransactions => &workbook.sheets,
    };
    if candidates.is_empty() {
        return Err(ImportError::Format("workbook has no sheets".to_string()));
    }

    let mut saw_header = false;
    for sheet in candidates {
        match read_sheet(sheet, layout, account) {
            Ok(statement) if !statement.is_empty() => return Ok(statement),
            Ok(_) => saw_header = true,
            Err(e) => tracing::debug!("{}: sheet '{}': {e}", layout.bank, sheet.name),
        }
    }

    if saw_header {
        Err(ImportError::NoTransactions)
    } else {
        Err(ImportError::HeaderNotFound(layout.bank))
    }
}

pub fn parse_brou(data: &[u8]) -> Result<Statement, ImportError> {
    read_workbook(&Workbook::from_bytes(data)?, &BROU_LAYOUT, BROU_ACCOUNT)
}

pub fn parse_itau(data: &[u8]) -> Result<Statement, ImportError> {
    read_workbook(&Workbook::from_bytes(data)?, &ITAU_LAYOUT, ITAU_ACCOUNT)
}
