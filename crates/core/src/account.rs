use serde::{Deserialize, Serialize};
use std::fmt;

pub const BROU_ACCOUNT: &str = "Assets:Bank:BROU";
pub const ITAU_ACCOUNT: &str = "Assets:Bank:Itau";
pub const VISA_ITAU_ACCOUNT: &str = "Assets:VisaItau";

/// Counter-account used when no mapping matches an outflow.
pub const UNKNOWN_EXPENSE_ACCOUNT: &str = "Expenses:Unknown";
/// Counter-account used when no mapping matches an inflow.
pub const UNKNOWN_INCOME_ACCOUNT: &str = "Income:Unknown";

/// The document producers the importers understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementSource {
    /// BROU checking account, spreadsheet export.
    Brou,
    /// Itaú checking account, spreadsheet export.
    Itau,
    /// Visa Itaú credit card, PDF statement in pesos and dollars.
    VisaItau,
}

impl StatementSource {
    pub fn account(self) -> &'static str {
        match self {
            StatementSource::Brou => BROU_ACCOUNT,
            StatementSource::Itau => ITAU_ACCOUNT,
            StatementSource::VisaItau => VISA_ITAU_ACCOUNT,
        }
    }

    /// Guess the producer from an uploaded file name.
    ///
    /// Card statements arrive with bare numeric names such as `0399723.pdf`,
    /// so any PDF not claimed by a bank keyword is treated as one.
    pub fn detect(filename: &str) -> Option<StatementSource> {
        let name = filename.to_lowercase();
        if name.contains("brou") || name.contains("detalle_movimiento") {
            Some(StatementSource::Brou)
        } else if name.contains("itau") || name.contains("estado_de_cuenta") {
            Some(StatementSource::Itau)
        } else if name.ends_with(".pdf") {
            Some(StatementSource::VisaItau)
        } else {
            None
        }
    }
}

impl fmt::Display for StatementSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementSource::Brou => write!(f, "BROU"),
            StatementSource::Itau => write!(f, "Itaú"),
            StatementSource::VisaItau => write!(f, "Visa Itaú"),
        }
    }
}
