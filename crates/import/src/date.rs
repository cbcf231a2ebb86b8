use chrono::{Days, NaiveDate};

use crate::error::DateParseError;
use crate::util::re;

re!(re_slash_date, r"^\d{1,2}/\d{1,2}/\d{4}$");

/// Day zero of spreadsheet serial dates (the 1900 leap-year bug is folded in).
fn serial_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default()
}

/// Largest serial a spreadsheet can hold (9999-12-31).
const MAX_SERIAL: f64 = 2_958_465.0;

/// Parse a statement date: `DD/MM/YYYY` with one- or two-digit day and
/// month, falling back to a spreadsheet serial day count. The year must have
/// four digits.
pub fn parse_date(s: &str) -> Result<NaiveDate, DateParseError> {
    let s = s.trim();

    if re_slash_date().is_match(s) {
        // chrono's %d and %m accept a single digit as well.
        return NaiveDate::parse_from_str(s, "%d/%m/%Y").map_err(|_| DateParseError(s.to_string()));
    }

    parse_serial(s).ok_or_else(|| DateParseError(s.to_string()))
}

fn parse_serial(s: &str) -> Option<NaiveDate> {
    let serial: f64 = s.parse().ok()?;
    if !serial.is_finite() || serial < 1.0 || serial > MAX_SERIAL {
        return None;
    }
    serial_epoch().checked_add_days(Days::new(serial.trunc() as u64))
}

/// Ledger dates: `YYYY/MM/DD` or `YYYY-MM-DD`.
pub fn parse_iso_date(s: &str) -> Result<NaiveDate, DateParseError> {
    let s = s.trim();
    ["%Y/%m/%d", "%Y-%m-%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .ok_or_else(|| DateParseError(s.to_string()))
}
