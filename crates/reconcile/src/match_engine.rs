use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cuadre_core::{BankTransaction, Currency, DateRange, LedgerTransaction, Money, Statement};

use crate::util::description_similarity;

/// Acceptance rule of the exact pass. An engine applies one policy to every
/// reconciliation it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExactPolicy {
    /// Same calendar day, amounts within 0.001.
    #[default]
    SameDay,
    /// Up to three days apart, amounts within 0.01.
    Window,
}

impl ExactPolicy {
    pub fn window_days(self) -> i64 {
        match self {
            ExactPolicy::SameDay => 0,
            ExactPolicy::Window => 3,
        }
    }

    pub fn epsilon(self) -> Decimal {
        match self {
            ExactPolicy::SameDay => Decimal::new(1, 3),
            ExactPolicy::Window => Decimal::new(1, 2),
        }
    }

    fn accepts(self, bank: &BankTransaction, ledger: &LedgerTransaction) -> bool {
        days_apart(bank.date, ledger.date) <= self.window_days()
            && (bank.net() - ledger.amount).abs().as_decimal() < self.epsilon()
    }
}

impl FromStr for ExactPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "same-day" | "sameday" => Ok(ExactPolicy::SameDay),
            "window" => Ok(ExactPolicy::Window),
            other => Err(format!("Unknown exact-match policy: '{other}'")),
        }
    }
}

/// Weights and tolerances of the fuzzy pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzyConfig {
    pub window_days: i64,
    /// Smallest amount tolerance, in statement currency units.
    pub amount_floor: f64,
    /// Amount tolerance as a share of the bank amount, when above the floor.
    pub amount_pct: f64,
    pub date_weight: f64,
    pub amount_weight: f64,
    pub description_weight: f64,
    /// A candidate must score strictly above this.
    pub threshold: f64,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        FuzzyConfig {
            window_days: 5,
            amount_floor: 10.0,
            amount_pct: 0.05,
            date_weight: 0.3,
            amount_weight: 0.5,
            description_weight: 0.2,
            threshold: 0.6,
        }
    }
}

impl FuzzyConfig {
    /// Weighted score of a pair, or `None` when the pair falls outside the
    /// date window or the amount tolerance, or the amounts have opposite
    /// signs.
    pub fn score(&self, bank: &BankTransaction, ledger: &LedgerTransaction) -> Option<f64> {
        let days = days_apart(bank.date, ledger.date);
        if days > self.window_days || opposite_signs(bank.net(), ledger.amount) {
            return None;
        }

        let net = to_f64(bank.net());
        let diff = (net - to_f64(ledger.amount)).abs();
        let tolerance = self.amount_floor.max(self.amount_pct * net.abs());
        if diff > tolerance {
            return None;
        }

        let date_score = if self.window_days > 0 {
            1.0 - days as f64 / self.window_days as f64
        } else {
            1.0
        };
        let amount_score = if tolerance > 0.0 { 1.0 - diff / tolerance } else { 1.0 };
        let desc_score = description_similarity(&bank.description, &ledger.description);

        let score = self.date_weight * date_score + self.amount_weight * amount_score + self.description_weight * desc_score;
        Some(score.min(1.0))
    }
}

fn opposite_signs(a: Money, b: Money) -> bool {
    !a.is_zero() && !b.is_zero() && a.is_negative() != b.is_negative()
}

fn days_apart(a: NaiveDate, b: NaiveDate) -> i64 {
    (a - b).num_days().abs()
}

fn to_f64(m: Money) -> f64 {
    m.as_decimal().to_f64().unwrap_or(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Fuzzy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub bank: BankTransaction,
    pub ledger: LedgerTransaction,
    pub kind: MatchKind,
    pub score: f64,
}

/// A statement row with its reconciliation outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankStatus {
    pub transaction: BankTransaction,
    pub kind: Option<MatchKind>,
    pub score: f64,
    pub ledger: Option<LedgerTransaction>,
}

impl BankStatus {
    pub fn is_matched(&self) -> bool {
        self.kind.is_some()
    }
}

/// Sums over the full inputs, whatever matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub bank_debits: Money,
    pub bank_credits: Money,
    /// Negative ledger amounts, as positive values.
    pub ledger_debits: Money,
    pub ledger_credits: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub account: String,
    pub currency: Currency,
    pub period: Option<DateRange>,
    pub matches: Vec<Match>,
    pub unmatched_bank: Vec<BankTransaction>,
    /// Unmatched ledger rows dated inside `period`.
    pub unmatched_ledger: Vec<LedgerTransaction>,
    pub bank_status: Vec<BankStatus>,
    pub totals: Totals,
}

impl ReconciliationResult {
    pub fn exact_count(&self) -> usize {
        self.matches.iter().filter(|m| m.kind == MatchKind::Exact).count()
    }

    pub fn fuzzy_count(&self) -> usize {
        self.matches.iter().filter(|m| m.kind == MatchKind::Fuzzy).count()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReconcileEngine {
    pub policy: ExactPolicy,
    pub fuzzy: FuzzyConfig,
}

impl ReconcileEngine {
    pub fn new(policy: ExactPolicy, fuzzy: FuzzyConfig) -> Self {
        Self { policy, fuzzy }
    }

    pub fn with_policy(policy: ExactPolicy) -> Self {
        Self { policy, fuzzy: FuzzyConfig::default() }
    }

    /// Pair statement rows with ledger postings.
    ///
    /// The exact pass takes, for each row in statement order, the first free
    /// posting the policy accepts. The fuzzy pass then takes the best-scoring
    /// free posting above the threshold, the earliest one on ties. Each
    /// transaction is used at most once.
    pub fn reconcile(&self, statement: &Statement, ledger: &[LedgerTransaction]) -> ReconciliationResult {
        let bank = statement.transactions();
        let mut bank_match: Vec<Option<(usize, MatchKind, f64)>> = vec![None; bank.len()];
        let mut ledger_used = vec![false; ledger.len()];
        let mut order: Vec<usize> = Vec::new();

        for (bi, bt) in bank.iter().enumerate() {
            let found = ledger
                .iter()
                .enumerate()
                .find(|(li, lt)| !ledger_used[*li] && self.policy.accepts(bt, lt))
                .map(|(li, _)| li);
            if let Some(li) = found {
                ledger_used[li] = true;
                bank_match[bi] = Some((li, MatchKind::Exact, 1.0));
                order.push(bi);
            }
        }

        for (bi, bt) in bank.iter().enumerate() {
            if bank_match[bi].is_some() {
                continue;
            }
            let mut best: Option<(usize, f64)> = None;
            for (li, lt) in ledger.iter().enumerate() {
                if ledger_used[li] {
                    continue;
                }
                let Some(score) = self.fuzzy.score(bt, lt) else {
                    continue;
                };
                if score > self.fuzzy.threshold && best.map_or(true, |(_, s)| score > s) {
                    best = Some((li, score));
                }
            }
            if let Some((li, score)) = best {
                ledger_used[li] = true;
                bank_match[bi] = Some((li, MatchKind::Fuzzy, score));
                order.push(bi);
            }
        }

        let matches = order
            .iter()
            .filter_map(|&bi| {
                let (li, kind, score) = bank_match[bi]?;
                Some(Match { bank: bank[bi].clone(), ledger: ledger[li].clone(), kind, score })
            })
            .collect();

        let unmatched_bank = bank
            .iter()
            .zip(&bank_match)
            .filter(|(_, m)| m.is_none())
            .map(|(bt, _)| bt.clone())
            .collect();

        let period = statement.period();
        let unmatched_ledger: Vec<LedgerTransaction> = ledger
            .iter()
            .zip(&ledger_used)
            .filter(|(lt, used)| !**used && period.map_or(true, |p| p.contains(lt.date)))
            .map(|(lt, _)| lt.clone())
            .collect();

        let bank_status = bank
            .iter()
            .zip(&bank_match)
            .map(|(bt, m)| BankStatus {
                transaction: bt.clone(),
                kind: m.map(|(_, kind, _)| kind),
                score: m.map_or(0.0, |(_, _, score)| score),
                ledger: m.map(|(li, _, _)| ledger[li].clone()),
            })
            .collect();

        let totals = Totals {
            bank_debits: statement.total_debits(),
            bank_credits: statement.total_credits(),
            ledger_debits: ledger.iter().filter(|l| l.amount.is_negative()).map(|l| -l.amount).sum(),
            ledger_credits: ledger.iter().filter(|l| !l.amount.is_negative()).map(|l| l.amount).sum(),
        };

        let result = ReconciliationResult {
            account: statement.account().to_string(),
            currency: statement.currency(),
            period,
            matches,
            unmatched_bank,
            unmatched_ledger,
            bank_status,
            totals,
        };

        tracing::info!(
            account = %result.account,
            "reconciled: {} exact, {} fuzzy, {} bank and {} ledger unmatched",
            result.exact_count(),
            result.fuzzy_count(),
            result.unmatched_bank.len(),
            result.unmatched_ledger.len()
        );
        result
    }
}

/// Pairs of statement rows that look like the same movement imported twice:
/// equal amounts, at most `window_days` apart and description similarity
/// of at least `threshold`.
pub fn find_duplicates(transactions: &[BankTransaction], window_days: i64, threshold: f64) -> Vec<(usize, usize)> {
    let mut duplicates = Vec::new();

    for i in 0..transactions.len() {
        for j in (i + 1)..transactions.len() {
            let t1 = &transactions[i];
            let t2 = &transactions[j];

            if t1.net() != t2.net() {
                continue;
            }
            if days_apart(t1.date, t2.date) > window_days {
                continue;
            }
            if description_similarity(&t1.description, &t2.description) >= threshold {
                duplicates.push((i, j));
            }
        }
    }

    duplicates
}
