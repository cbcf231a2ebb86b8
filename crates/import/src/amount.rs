//! Amount normalisation for the three numeric conventions the engine meets:
//! locale-ambiguous bank exports, the card statement's fixed
//! `1.234,56` layout, and ledger output's fixed `1,234.56` layout.

use cuadre_core::Money;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::AmountParseError;

fn strip_markers(s: &str) -> String {
    s.trim()
        .replace("U$S", "")
        .replace("US", "")
        .replace('$', "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Parse a bank-exported amount whose separators may follow either
/// convention.
///
/// When both `.` and `,` are present the one occurring last is the decimal
/// separator. A lone comma is a decimal separator; repeated dots or repeated
/// commas are thousands separators. `(x)` is negative. Blank and `-` read as
/// zero.
pub fn parse_amount(s: &str) -> Result<Decimal, AmountParseError> {
    let cleaned = strip_markers(s);
    if cleaned.is_empty() || cleaned == "-" {
        return Ok(Decimal::ZERO);
    }

    let (negative, body) = match cleaned.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, cleaned.as_str()),
    };

    let dots = body.matches('.').count();
    let commas = body.matches(',').count();
    let normalized = match (body.rfind('.'), body.rfind(',')) {
        (Some(dot), Some(comma)) if comma > dot => body.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => body.replace(',', ""),
        _ if commas == 1 => body.replace(',', "."),
        _ if dots > 1 => body.replace('.', ""),
        _ if commas > 1 => body.replace(',', ""),
        _ => body.to_string(),
    };

    let value = Decimal::from_str(&normalized).map_err(|_| AmountParseError(s.to_string()))?;
    Ok(if negative { -value } else { value })
}

/// Best-effort variant used while walking a document: malformed cells read
/// as zero so one bad cell never drops a whole statement.
pub fn normalize_amount(s: &str) -> Money {
    match parse_amount(s) {
        Ok(value) => Money::from_decimal(value),
        Err(e) => {
            tracing::debug!("{e}, using zero");
            Money::zero()
        }
    }
}

/// Card statement amounts: optional leading `-`, `.` for thousands, `,` for
/// decimals. Anything else reads as zero.
pub fn parse_card_amount(s: &str) -> Money {
    let s = s.trim();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let normalized = digits.replace('.', "").replace(',', ".");
    match Decimal::from_str(&normalized) {
        Ok(value) => Money::from_decimal(if negative { -value } else { value }),
        Err(_) => Money::zero(),
    }
}

/// Ledger amounts: `,` is always a thousands separator and `.` always the
/// decimal point. Commodity markers may sit on either side of the sign.
pub fn parse_ledger_amount(s: &str) -> Result<Decimal, AmountParseError> {
    let cleaned = strip_markers(s).replace(',', "");
    Decimal::from_str(&cleaned).map_err(|_| AmountParseError(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    // ── parse_amount ──────────────────────────────────────────────────────────

    #[test]
    fn both_conventions_reach_the_same_value() {
        assert_eq!(parse_amount("1.234,56").unwrap(), dec("1234.56"));
        assert_eq!(parse_amount("1,234.56").unwrap(), dec("1234.56"));
    }

    #[test]
    fn parentheses_negate() {
        assert_eq!(parse_amount("(100)").unwrap(), dec("-100"));
        assert_eq!(parse_amount("(1.500,25)").unwrap(), dec("-1500.25"));
    }

    #[test]
    fn blank_and_dash_are_zero() {
        assert_eq!(parse_amount("").unwrap(), Decimal::ZERO);
        assert_eq!(parse_amount("   ").unwrap(), Decimal::ZERO);
        assert_eq!(parse_amount("-").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn lone_comma_is_decimal() {
        assert_eq!(parse_amount("99,5").unwrap(), dec("99.5"));
    }

    #[test]
    fn repeated_separators_are_thousands() {
        assert_eq!(parse_amount("1.234.567").unwrap(), dec("1234567"));
        assert_eq!(parse_amount("1,234,567").unwrap(), dec("1234567"));
    }

    #[test]
    fn currency_markers_and_spaces_are_stripped() {
        assert_eq!(parse_amount("$ 1.234,00").unwrap(), dec("1234.00"));
        assert_eq!(parse_amount("US$ 12,50").unwrap(), dec("12.50"));
        assert_eq!(parse_amount("U$S 3.000,10").unwrap(), dec("3000.10"));
    }

    #[test]
    fn plain_and_signed() {
        assert_eq!(parse_amount("123.45").unwrap(), dec("123.45"));
        assert_eq!(parse_amount("-1.234,56").unwrap(), dec("-1234.56"));
        assert_eq!(parse_amount("46048").unwrap(), dec("46048"));
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("()").is_err());
    }

    #[test]
    fn normalize_is_stable_on_its_own_output() {
        let once = normalize_amount("1.234,56");
        let twice = normalize_amount(&once.to_string());
        assert_eq!(once, twice);
    }

    #[test]
    fn normalize_defaults_to_zero() {
        assert!(normalize_amount("n/a").is_zero());
    }

    // ── parse_card_amount ─────────────────────────────────────────────────────

    #[test]
    fn card_amounts() {
        assert_eq!(parse_card_amount("1.234,56"), Money::from_cents(123456));
        assert_eq!(parse_card_amount("-2.000,00"), Money::from_cents(-200000));
        assert_eq!(parse_card_amount("15,90"), Money::from_cents(1590));
        assert!(parse_card_amount("").is_zero());
        assert!(parse_card_amount("x").is_zero());
    }

    // ── parse_ledger_amount ───────────────────────────────────────────────────

    #[test]
    fn ledger_amounts() {
        assert_eq!(parse_ledger_amount("$ 100,000.00").unwrap(), dec("100000.00"));
        assert_eq!(parse_ledger_amount("US$ -2,500.00").unwrap(), dec("-2500.00"));
        assert_eq!(parse_ledger_amount("-$5").unwrap(), dec("-5"));
        assert_eq!(parse_ledger_amount("$-5.25").unwrap(), dec("-5.25"));
    }

    #[test]
    fn ledger_comma_is_never_decimal() {
        assert_eq!(parse_ledger_amount("1,5").unwrap(), dec("15"));
    }

    #[test]
    fn ledger_rejects_empty() {
        assert!(parse_ledger_amount("$").is_err());
    }
}
