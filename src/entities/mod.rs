// Entity Models
//
// Each entity has a stable UUID identity assigned when it is first persisted.

pub mod category;
pub mod transaction;

pub use category::Category;
pub use transaction::{Balance, NewTransaction, Transaction, TransactionRecord, TransactionType};
