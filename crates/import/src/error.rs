use thiserror::Error;

/// Document-level failures. Any of these means the whole document was
/// rejected and nothing was extracted from it.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Cannot open document: {0}")]
    Format(String),
    #[error("No recognizable column header in {0} statement")]
    HeaderNotFound(&'static str),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Document has no data rows")]
    NoData,
    #[error("No transactions found in document")]
    NoTransactions,
    #[error("Cannot tell which bank produced '{0}'")]
    UnknownSource(String),
}

/// A date cell that matched none of the accepted shapes. Row-local: the
/// reader skips the row and carries on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid date: '{0}'")]
pub struct DateParseError(pub String);

/// An amount cell that could not be read as a number. Row-local.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid amount: '{0}'")]
pub struct AmountParseError(pub String);
