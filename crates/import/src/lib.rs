pub mod amount;
pub mod csv;
pub mod date;
pub mod error;
pub mod layout;
pub mod pdf;
pub mod sheet;
pub mod tabular;
pub(crate) mod util;

pub use amount::{normalize_amount, parse_amount, parse_card_amount, parse_ledger_amount};
pub use csv::{import_csv, CsvColumnMapping};
pub use date::{parse_date, parse_iso_date};
pub use error::{AmountParseError, DateParseError, ImportError};
pub use layout::{parse_line, read_layout, reconstruct_lines, LayoutDocument, LayoutOptions, Page, TextRun};
pub use pdf::{decode_text, extract_runs, parse_visa_itau, runs_from_operations, PageFonts};
pub use sheet::{Sheet, Workbook};
pub use tabular::{parse_brou, parse_itau, read_sheet, read_workbook, BankLayout, BROU_LAYOUT, ITAU_LAYOUT};

use cuadre_core::{Statement, StatementSource};

/// Pick a reader from the file name and parse `data`.
///
/// BROU and Itaú spreadsheets and card PDFs are recognised by name. Any
/// `.csv` goes through the generic delimited reader, booked to the detected
/// bank account or to `fallback_account`.
pub fn import_statement(filename: &str, data: &[u8], fallback_account: &str) -> Result<Vec<Statement>, ImportError> {
    let source = StatementSource::detect(filename);

    if filename.to_lowercase().ends_with(".csv") {
        let account = source.map_or(fallback_account, |s| s.account());
        return Ok(vec![import_csv(data, account)?]);
    }

    match source {
        Some(StatementSource::Brou) => Ok(vec![parse_brou(data)?]),
        Some(StatementSource::Itau) => Ok(vec![parse_itau(data)?]),
        Some(StatementSource::VisaItau) => parse_visa_itau(data),
        None => Err(ImportError::UnknownSource(filename.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cuadre_core::ITAU_ACCOUNT;

    #[test]
    fn unknown_file_name_is_rejected() {
        let err = import_statement("notes.txt", b"", "Assets:Bank:Other").unwrap_err();
        assert!(matches!(err, ImportError::UnknownSource(name) if name == "notes.txt"));
    }

    #[test]
    fn csv_uses_fallback_account() {
        let data = b"fecha,descripcion,debito\n01/03/2024,X,1\n";
        let statements = import_statement("export.CSV", data, "Assets:Bank:Other").unwrap();
        assert_eq!(statements[0].account(), "Assets:Bank:Other");
    }

    #[test]
    fn csv_fallback_account_may_be_borrowed_from_a_local() {
        let account = format!("Assets:Bank:{}", "Santander");
        let data = b"fecha,descripcion,credito\n02/03/2024,DEPOSITO,\"500,00\"\n";
        let statements = import_statement("movimientos.csv", data, &account).unwrap();
        drop(account);
        assert_eq!(statements[0].account(), "Assets:Bank:Santander");
        assert_eq!(statements[0].transactions()[0].credit, cuadre_core::Money::from_cents(50000));
    }

    #[test]
    fn csv_named_after_a_bank_keeps_the_bank_account() {
        let data = b"fecha,descripcion,debito\n01/03/2024,X,1\n";
        let statements = import_statement("itau_marzo.csv", data, "Assets:Bank:Other").unwrap();
        assert_eq!(statements[0].account(), ITAU_ACCOUNT);
    }

    #[test]
    fn spreadsheet_name_with_bad_bytes_is_a_format_error() {
        let err = import_statement("detalle_movimientos.xls", b"nope", "x").unwrap_err();
        assert!(matches!(err, ImportError::Format(_)));
    }
}
