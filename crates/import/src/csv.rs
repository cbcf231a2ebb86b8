//! Generic delimited statement reader.
//!
//! Columns are found by header synonyms (Spanish and English) rather than by
//! a fixed position, so exports from home banking and hand-made spreadsheets
//! saved as CSV both work.

use std::io::Read;

use cuadre_core::{BankTransaction, Currency, Statement};

use crate::amount::normalize_amount;
use crate::date::parse_date;
use crate::error::ImportError;
use crate::util::{decode_field, fold};

const DATE_HEADERS: &[&str] = &["fecha", "date"];
const DESCRIPTION_HEADERS: &[&str] = &["descripci", "description", "concepto"];
const DEBIT_HEADERS: &[&str] = &["debito", "debit"];
const CREDIT_HEADERS: &[&str] = &["credito", "credit"];
const CURRENCY_HEADERS: &[&str] = &["moneda", "currency"];

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CsvColumnMapping {
    pub date_column: Option<usize>,
    pub description_column: Option<usize>,
    pub debit_column: Option<usize>,
    pub credit_column: Option<usize>,
    pub currency_column: Option<usize>,
}

impl CsvColumnMapping {
    /// Map header cells to columns; the first synonym group a cell matches
    /// claims it.
    pub fn detect(header: &[String]) -> Self {
        let mut mapping = CsvColumnMapping::default();
        let has = |cell: &str, keys: &[&str]| keys.iter().any(|k| cell.contains(k));

        for (i, col) in header.iter().enumerate() {
            let cell = fold(col);
            if has(&cell, DATE_HEADERS) {
                mapping.date_column = Some(i);
            } else if has(&cell, DESCRIPTION_HEADERS) {
                mapping.description_column = Some(i);
            } else if has(&cell, DEBIT_HEADERS) {
                mapping.debit_column = Some(i);
            } else if has(&cell, CREDIT_HEADERS) {
                mapping.credit_column = Some(i);
            } else if has(&cell, CURRENCY_HEADERS) {
                mapping.currency_column = Some(i);
            }
        }

        mapping
    }
}

fn field(row: &[String], col: Option<usize>) -> &str {
    col.and_then(|c| row.get(c)).map_or("", |s| s.trim())
}

/// Read a comma-separated statement for `account`.
pub fn import_csv<R: Read>(data: R, account: &str) -> Result<Statement, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(b',')
        .from_reader(data);

    let mut records: Vec<Vec<String>> = Vec::new();
    for result in reader.byte_records() {
        let record = result?;
        records.push(record.iter().map(decode_field).collect());
    }

    if records.len() < 2 {
        return Err(ImportError::NoData);
    }

    let mapping = CsvColumnMapping::detect(&records[0]);
    let currency = Currency::detect(field(&records[1], mapping.currency_column)).unwrap_or_default();

    let mut transactions = Vec::new();
    for (line, row) in records.iter().enumerate().skip(1) {
        let date_cell = field(row, mapping.date_column);
        if date_cell.is_empty() {
            continue;
        }
        let date = match parse_date(date_cell) {
            Ok(date) => date,
            Err(e) => {
                tracing::debug!(line, "csv: {e}, row skipped");
                continue;
            }
        };

        transactions.push(BankTransaction {
            date,
            description: field(row, mapping.description_column).to_string(),
            debit: normalize_amount(field(row, mapping.debit_column)).abs(),
            credit: normalize_amount(field(row, mapping.credit_column)).abs(),
            balance: None,
            reference: None,
            account: account.to_string(),
            currency,
        });
    }

    tracing::info!("csv: {} transaction(s) for {account}", transactions.len());
    Ok(Statement::new(account, currency, transactions))
}
