pub mod entries;
pub mod error;
pub mod ledger;
pub mod match_engine;
pub mod rules;
pub mod summary;
pub(crate) mod util;

pub use entries::EntryGenerator;
pub use error::{ConfigError, QueryError};
pub use ledger::{
    balance_query, ledger_accounts, parse_balances, parse_ledger_postings, parse_ledger_transactions,
    parse_register_output, query_balances, query_ledger_transactions, register_query, LedgerQueryRunner,
};
pub use match_engine::{
    find_duplicates, BankStatus, ExactPolicy, FuzzyConfig, Match, MatchKind, ReconcileEngine, ReconciliationResult,
    Totals,
};
pub use rules::{AccountMapping, AccountMappings, CounterAccount, Direction};
pub use summary::format_summary;
pub use util::description_similarity;
