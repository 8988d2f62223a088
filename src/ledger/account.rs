use log::debug;
use thiserror::Error;

use std::collections::{BTreeMap, HashMap};

use super::transaction::{Address, Sender, Transaction};

/// Errors that can occur during balance operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AccountError {
    #[error("Insufficient funds: {account} has {available} but tried to send {required}")]
    InsufficientFunds {
        account: Address,
        required: f64,
        available: f64,
    },
}

/// Balance table for every account that has appeared in a transaction
///
/// Absent accounts hold 0. Issuance is never debited and has no entry.
#[derive(Debug, Clone, Default)]
pub struct Balances {
    accounts: HashMap<Address, f64>,
}

impl Balances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the balance of an account, 0 if it has never appeared
    pub fn balance_of(&self, id: &str) -> f64 {
        self.accounts.get(id).copied().unwrap_or(0.0)
    }

    /// Checks that `sender` can fund `amount`
    ///
    /// Issuance always can.
    pub fn check(&self, sender: &Sender, amount: f64) -> Result<(), AccountError> {
        let Some(account) = sender.account() else {
            return Ok(());
        };

        let available = self.balance_of(account.as_str());
        if available < amount {
            return Err(AccountError::InsufficientFunds {
                account: account.clone(),
                required: amount,
                available,
            });
        }

        Ok(())
    }

    /// Validates and applies a transaction
    ///
    /// Either both sides are updated or, on error, nothing changes.
    pub fn apply(&mut self, transaction: &Transaction) -> Result<(), AccountError> {
        self.check(transaction.sender(), transaction.amount())?;

        if let Some(account) = transaction.sender().account() {
            *self.accounts.entry(account.clone()).or_insert(0.0) -= transaction.amount();
        }
        *self
            .accounts
            .entry(transaction.receiver().clone())
            .or_insert(0.0) += transaction.amount();

        debug!(
            "Balances updated: {} -> {} : {}",
            transaction.sender(),
            transaction.receiver(),
            transaction.amount()
        );

        Ok(())
    }

    /// Sum of all tracked balances
    pub fn total(&self) -> f64 {
        self.accounts.values().sum()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Sorted copy of the table
    pub fn snapshot(&self) -> BTreeMap<Address, f64> {
        self.accounts
            .iter()
            .map(|(address, balance)| (address.clone(), *balance))
            .collect()
    }
}
