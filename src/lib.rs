//! A minimal educational ledger.
//!
//! Blocks of transactions are linked by SHA-256 hashes and sealed with a
//! toy proof of work. Balances are tracked per account, and new coins only
//! enter through issuance (grants and mining rewards).

pub mod cli;
pub mod config;
pub mod ledger;

pub use config::LedgerConfig;
pub use ledger::{Address, Block, Ledger, LedgerError, Sender, SharedLedger, Transaction};
