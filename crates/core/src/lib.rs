pub mod account;
pub mod money;
pub mod period;
pub mod transaction;

pub use account::{
    StatementSource, BROU_ACCOUNT, ITAU_ACCOUNT, UNKNOWN_EXPENSE_ACCOUNT, UNKNOWN_INCOME_ACCOUNT,
    VISA_ITAU_ACCOUNT,
};
pub use money::{Currency, Money};
pub use period::DateRange;
pub use transaction::{BankTransaction, LedgerTransaction, Statement};
