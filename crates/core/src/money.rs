use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Neg, Sub};

/// The commodity an amount is expressed in.
///
/// Statements from the supported banks only ever carry local pesos or US
/// dollars, so the set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    #[default]
    Local,
    Foreign,
}

impl Currency {
    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Local => "$",
            Currency::Foreign => "US$",
        }
    }

    /// Recognise a currency marker inside free text such as `"Moneda: U$S"`
    /// or `"Pesos Uruguayos"`. Dollar markers are checked first because they
    /// also contain `$`.
    pub fn detect(text: &str) -> Option<Currency> {
        let lower = text.to_lowercase();
        let dollar = text.contains("U$S")
            || text.contains("US$")
            || lower.contains("usd")
            || lower.contains("dolar")
            || lower.contains("dólar")
            || lower.contains("dollar");
        if dollar {
            Some(Currency::Foreign)
        } else if text.contains('$') || lower.contains("peso") {
            Some(Currency::Local)
        } else {
            None
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Money(Decimal);

impl Money {
    /// Half cents round away from zero, as banks print them.
    pub fn from_decimal(decimal: Decimal) -> Self {
        Money(decimal.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    pub fn to_f32(self) -> f32 {
        self.0.to_f32().unwrap_or(0.0)
    }

    /// Renders as `$12.50`, `-US$3.00`.
    pub fn format(self, currency: Currency) -> String {
        if self.is_negative() {
            format!("-{}{:.2}", currency.symbol(), -self.0)
        } else {
            format!("{}{:.2}", currency.symbol(), self.0)
        }
    }

    /// Renders as ledger posting syntax, sign after the commodity: `$-12.50`.
    pub fn posting(self, currency: Currency) -> String {
        format!("{}{:.2}", currency.symbol(), self.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Self;
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |a, b| a + b)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
