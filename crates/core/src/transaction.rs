use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::money::{Currency, Money};
use super::period::DateRange;

/// One row of a bank or card statement, in the shape every reader produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankTransaction {
    pub date: NaiveDate,
    pub description: String,
    pub debit: Money,
    pub credit: Money,
    pub balance: Option<Money>,
    pub reference: Option<String>,
    pub account: String,
    pub currency: Currency,
}

impl BankTransaction {
    /// Build a one-sided transaction from a signed amount: positive values
    /// land in `credit`, negative values in `debit`.
    pub fn from_net(
        date: NaiveDate,
        description: impl Into<String>,
        net: Money,
        account: impl Into<String>,
        currency: Currency,
    ) -> Self {
        let (debit, credit) = if net.is_negative() {
            (net.abs(), Money::zero())
        } else {
            (Money::zero(), net)
        };
        BankTransaction {
            date,
            description: description.into(),
            debit,
            credit,
            balance: None,
            reference: None,
            account: account.into(),
            currency,
        }
    }

    /// Signed effect on the account: `credit - debit`.
    pub fn net(&self) -> Money {
        self.credit - self.debit
    }
}

/// Transactions read from one document for one account and currency.
///
/// The period is derived from the transactions at construction and the
/// contents cannot be changed afterwards, so `period.start <= date <=
/// period.end` holds for every transaction. Deserializing goes through
/// [`Statement::new`] too; a serialized `period` is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StatementFields")]
pub struct Statement {
    account: String,
    currency: Currency,
    transactions: Vec<BankTransaction>,
    period: Option<DateRange>,
}

#[derive(Deserialize)]
struct StatementFields {
    account: String,
    currency: Currency,
    transactions: Vec<BankTransaction>,
}

impl From<StatementFields> for Statement {
    fn from(fields: StatementFields) -> Self {
        Statement::new(fields.account, fields.currency, fields.transactions)
    }
}

impl Statement {
    pub fn new(
        account: impl Into<String>,
        currency: Currency,
        transactions: Vec<BankTransaction>,
    ) -> Self {
        let period = DateRange::covering(transactions.iter().map(|tx| tx.date));
        Statement {
            account: account.into(),
            currency,
            transactions,
            period,
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn transactions(&self) -> &[BankTransaction] {
        &self.transactions
    }

    pub fn period(&self) -> Option<DateRange> {
        self.period
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.period.map(|p| p.start)
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.period.map(|p| p.end)
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn total_debits(&self) -> Money {
        self.transactions.iter().map(|tx| tx.debit).sum()
    }

    pub fn total_credits(&self) -> Money {
        self.transactions.iter().map(|tx| tx.credit).sum()
    }

    pub fn into_transactions(self) -> Vec<BankTransaction> {
        self.transactions
    }
}

/// A posting already recorded in the ledger for the account being reconciled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub date: NaiveDate,
    pub description: String,
    pub account: String,
    pub amount: Money,
    /// 1-based line of the entry header; 0 when the row came from query output.
    pub line_number: usize,
    pub raw_entry: String,
}

impl LedgerTransaction {
    pub fn new(date: NaiveDate, description: impl Into<String>, account: impl Into<String>, amount: Money) -> Self {
        LedgerTransaction {
            date,
            description: description.into(),
            account: account.into(),
            amount,
            line_number: 0,
            raw_entry: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(day: u32, net_cents: i64) -> BankTransaction {
        BankTransaction::from_net(
            date(2024, 3, day),
            "Test",
            Money::from_cents(net_cents),
            "Assets:Bank:BROU",
            Currency::Local,
        )
    }

    #[test]
    fn from_net_splits_by_sign() {
        let out = tx(1, -10300);
        assert_eq!(out.debit, Money::from_cents(10300));
        assert!(out.credit.is_zero());

        let inc = tx(1, 50000);
        assert!(inc.debit.is_zero());
        assert_eq!(inc.credit, Money::from_cents(50000));
    }

    #[test]
    fn net_is_credit_minus_debit() {
        assert_eq!(tx(1, -250).net(), Money::from_cents(-250));
        assert_eq!(tx(1, 250).net(), Money::from_cents(250));
    }

    #[test]
    fn statement_period_covers_every_transaction() {
        let stmt = Statement::new(
            "Assets:Bank:BROU",
            Currency::Local,
            vec![tx(12, 100), tx(3, -50), tx(27, 10), tx(9, -1)],
        );
        let period = stmt.period().unwrap();
        assert_eq!(period.start, date(2024, 3, 3));
        assert_eq!(period.end, date(2024, 3, 27));
        assert!(stmt.transactions().iter().all(|t| period.contains(t.date)));
    }

    #[test]
    fn statement_keeps_read_order() {
        let stmt = Statement::new("A", Currency::Local, vec![tx(12, 1), tx(3, 2)]);
        assert_eq!(stmt.transactions()[0].date, date(2024, 3, 12));
    }

    #[test]
    fn empty_statement_has_no_period() {
        let stmt = Statement::new("A", Currency::Foreign, Vec::new());
        assert!(stmt.is_empty());
        assert_eq!(stmt.period(), None);
        assert_eq!(stmt.start_date(), None);
    }

    #[test]
    fn deserialized_period_is_recomputed() {
        let stmt = Statement::new("A", Currency::Local, vec![tx(5, 100), tx(9, -40)]);
        let mut json: serde_json::Value = serde_json::to_value(&stmt).unwrap();
        json["period"] = serde_json::json!({"start": "2030-01-01", "end": "2030-01-02"});

        let back: Statement = serde_json::from_value(json).unwrap();
        assert_eq!(back.start_date(), Some(date(2024, 3, 5)));
        assert_eq!(back.end_date(), Some(date(2024, 3, 9)));
        assert_eq!(back, stmt);
    }

    #[test]
    fn statement_totals() {
        let stmt = Statement::new("A", Currency::Local, vec![tx(1, 100), tx(2, -40), tx(3, -60)]);
        assert_eq!(stmt.total_credits(), Money::from_cents(100));
        assert_eq!(stmt.total_debits(), Money::from_cents(100));
    }
}
