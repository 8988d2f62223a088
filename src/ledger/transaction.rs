use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::borrow::Borrow;
use std::fmt;

/// Identifier rendered for issuance senders in displays and block hashes
pub const ISSUANCE_LABEL: &str = "network";

/// Errors that can occur while building a transaction
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransactionError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Address `{0}` is reserved for issuance")]
    ReservedAddress(String),
}

/// An account identifier
///
/// Never empty, and never equal to the issuance label, so a real account
/// cannot be confused with coin issuance in any rendering of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Creates a new address
    ///
    /// # Arguments
    ///
    /// * `id` - The account identifier
    ///
    /// # Returns
    ///
    /// The address, or an error if the identifier is blank or reserved
    pub fn new(id: impl Into<String>) -> Result<Self, TransactionError> {
        let id = id.into();

        if id.trim().is_empty() {
            return Err(TransactionError::InvalidAddress(
                "Account identifier must not be empty".to_string(),
            ));
        }

        if id == ISSUANCE_LABEL {
            return Err(TransactionError::ReservedAddress(id));
        }

        Ok(Address(id))
    }

    /// Gets the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for Address {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Address {
    type Error = TransactionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::new(value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

/// Who funds a transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// New coins created by the ledger itself (grants, mining rewards)
    Issuance,

    /// An ordinary account whose balance is debited
    Account(Address),
}

impl Sender {
    /// Parses a sender typed by a user
    ///
    /// The issuance label maps to [`Sender::Issuance`]; anything else must
    /// be a valid account address.
    pub fn parse(id: &str) -> Result<Self, TransactionError> {
        if id == ISSUANCE_LABEL {
            Ok(Sender::Issuance)
        } else {
            Address::new(id).map(Sender::Account)
        }
    }

    /// Returns the debited account, if any
    pub fn account(&self) -> Option<&Address> {
        match self {
            Sender::Issuance => None,
            Sender::Account(address) => Some(address),
        }
    }

    /// Checks if this sender issues new coins
    pub fn is_issuance(&self) -> bool {
        matches!(self, Sender::Issuance)
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::Issuance => write!(f, "{}", ISSUANCE_LABEL),
            Sender::Account(address) => write!(f, "{}", address),
        }
    }
}

impl From<Address> for Sender {
    fn from(address: Address) -> Self {
        Sender::Account(address)
    }
}

/// Represents a transfer of coins
///
/// Immutable once built; fields are only reachable through accessors.
/// Deserialising goes through [`Transaction::new`], so the amount rules
/// hold for loaded transactions too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TransactionRepr")]
pub struct Transaction {
    sender: Sender,
    receiver: Address,
    amount: f64,
}

impl Transaction {
    /// Creates a new transaction
    ///
    /// # Arguments
    ///
    /// * `sender` - Who funds the transfer
    /// * `receiver` - The credited account
    /// * `amount` - The amount to transfer, finite and non-negative
    ///
    /// # Returns
    ///
    /// The transaction, or an error if the amount is not usable
    pub fn new(sender: Sender, receiver: Address, amount: f64) -> Result<Self, TransactionError> {
        if !amount.is_finite() {
            return Err(TransactionError::InvalidAmount(format!(
                "Amount must be a finite number: {}",
                amount
            )));
        }

        if amount < 0.0 {
            return Err(TransactionError::InvalidAmount(format!(
                "Amount must not be negative: {}",
                amount
            )));
        }

        Ok(Transaction {
            sender,
            receiver,
            // Normalise -0.0 so it renders the same as 0
            amount: amount + 0.0,
        })
    }

    /// Creates a new issuance transaction (grant or mining reward)
    pub fn issuance(receiver: Address, amount: f64) -> Result<Self, TransactionError> {
        Self::new(Sender::Issuance, receiver, amount)
    }

    pub fn sender(&self) -> &Sender {
        &self.sender
    }

    pub fn receiver(&self) -> &Address {
        &self.receiver
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// Checks if the transaction issues new coins
    pub fn is_issuance(&self) -> bool {
        self.sender.is_issuance()
    }
}

/// Wire shape of a transaction before validation
#[derive(Deserialize)]
struct TransactionRepr {
    sender: Sender,
    receiver: Address,
    amount: f64,
}

impl TryFrom<TransactionRepr> for Transaction {
    type Error = TransactionError;

    fn try_from(repr: TransactionRepr) -> Result<Self, Self::Error> {
        Transaction::new(repr.sender, repr.receiver, repr.amount)
    }
}

/// Renders as `sender -> receiver : amount coins`
///
/// This text is part of the block hash input and must not change.
impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} : {} coins",
            self.sender, self.receiver, self.amount
        )
    }
}
