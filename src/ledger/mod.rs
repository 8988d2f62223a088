// Ledger module
//
// This module contains the ledger engine including:
// - Transaction and sender types
// - Block structure and hashing
// - Balance table
// - Proof of work search
// - The ledger itself and a thread-safe handle to it

pub mod account;
pub mod block;
pub mod chain;
pub mod pow;
pub mod shared;
pub mod transaction;

// Re-export main components for easier access
pub use account::{AccountError, Balances};
pub use block::{Block, BlockSummary};
pub use chain::{validate_chain, Ledger, LedgerError};
pub use pow::{valid_proof, CancelToken, ProofSearch};
pub use shared::SharedLedger;
pub use transaction::{Address, Sender, Transaction, TransactionError};
