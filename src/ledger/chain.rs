use log::{info, warn};
use thiserror::Error;

use std::collections::BTreeMap;

use super::account::{AccountError, Balances};
use super::block::{Block, BlockSummary, GENESIS_HASH};
use super::pow::{valid_proof, CancelToken, ProofSearch, SearchAbort};
use super::transaction::{Address, Sender, Transaction, TransactionError};
use crate::config::LedgerConfig;

/// Errors that can occur during ledger operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Transaction error: {0}")]
    TransactionError(#[from] TransactionError),

    #[error("Account error: {0}")]
    AccountError(#[from] AccountError),

    #[error("Proof search aborted after {attempts} attempts (cancelled: {cancelled})")]
    ProofSearchAborted { attempts: u64, cancelled: bool },

    #[error("Invalid chain: {0}")]
    InvalidChain(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LedgerError {
    /// Checks if a submission was rejected for lack of funds
    pub fn is_insufficient_funds(&self) -> bool {
        matches!(
            self,
            LedgerError::AccountError(AccountError::InsufficientFunds { .. })
        )
    }
}

impl From<SearchAbort> for LedgerError {
    fn from(abort: SearchAbort) -> Self {
        LedgerError::ProofSearchAborted {
            attempts: abort.attempts(),
            cancelled: matches!(abort, SearchAbort::Cancelled { .. }),
        }
    }
}

/// The ledger: sealed blocks, pending transactions and balances
///
/// All state changes go through [`Ledger::submit`] and [`Ledger::seal`].
#[derive(Debug, Clone)]
pub struct Ledger {
    /// The chain of blocks, genesis first
    chain: Vec<Block>,

    /// Transactions waiting for the next block
    pending: Vec<Transaction>,

    /// Account balances, already reflecting pending transactions
    balances: Balances,

    /// Total coins ever issued
    issued: f64,

    config: LedgerConfig,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::from_valid_config(LedgerConfig::default())
    }
}

impl Ledger {
    /// Creates a new ledger with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new ledger with a custom configuration
    ///
    /// # Returns
    ///
    /// The ledger, or a configuration error
    pub fn with_config(config: LedgerConfig) -> Result<Self, LedgerError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: LedgerConfig) -> Self {
        let genesis = Block::genesis(config.genesis_proof);
        info!("Created genesis block with proof {}", genesis.proof());

        Ledger {
            chain: vec![genesis],
            pending: Vec::new(),
            balances: Balances::new(),
            issued: 0.0,
            config,
        }
    }

    /// Adds a new transaction to the pending transactions
    ///
    /// Balances are updated immediately. Non-issuance senders must hold at
    /// least `amount`; a rejected submission changes nothing.
    ///
    /// # Arguments
    ///
    /// * `sender` - Who funds the transfer
    /// * `receiver` - The credited account
    /// * `amount` - The amount to transfer
    ///
    /// # Returns
    ///
    /// The recorded transaction
    pub fn submit(
        &mut self,
        sender: Sender,
        receiver: Address,
        amount: f64,
    ) -> Result<Transaction, LedgerError> {
        let transaction = Transaction::new(sender, receiver, amount)?;
        self.record(transaction.clone())?;

        Ok(transaction)
    }

    /// Same as [`Ledger::submit`] with textual identifiers
    ///
    /// A sender of `"network"` is treated as issuance.
    pub fn submit_named(
        &mut self,
        sender: &str,
        receiver: &str,
        amount: f64,
    ) -> Result<Transaction, LedgerError> {
        let sender = Sender::parse(sender)?;
        let receiver = Address::new(receiver)?;

        self.submit(sender, receiver, amount)
    }

    fn record(&mut self, transaction: Transaction) -> Result<(), LedgerError> {
        if let Err(err) = self.balances.apply(&transaction) {
            warn!("Rejected transaction {}: {}", transaction, err);
            return Err(err.into());
        }

        if transaction.is_issuance() {
            self.issued += transaction.amount();
        }

        info!("Transaction added: {}", transaction);
        self.pending.push(transaction);

        Ok(())
    }

    /// Seals the pending transactions into a new block
    ///
    /// The miner is rewarded with an issuance transaction included in the
    /// block. With `max_proof_attempts` configured the search may give up,
    /// in which case the ledger is left exactly as it was.
    ///
    /// # Arguments
    ///
    /// * `miner` - The account credited with the mining reward
    ///
    /// # Returns
    ///
    /// The newly sealed block
    pub fn seal(&mut self, miner: &Address) -> Result<Block, LedgerError> {
        self.seal_inner(miner, None)
    }

    /// Same as [`Ledger::seal`], also giving up once `cancel` fires
    pub fn seal_with_cancel(
        &mut self,
        miner: &Address,
        cancel: &CancelToken,
    ) -> Result<Block, LedgerError> {
        self.seal_inner(miner, Some(cancel))
    }

    fn seal_inner(
        &mut self,
        miner: &Address,
        cancel: Option<&CancelToken>,
    ) -> Result<Block, LedgerError> {
        let reward = Transaction::issuance(miner.clone(), self.config.mining_reward)?;

        let last_block = self.last_block();
        let last_proof = last_block.proof();
        let previous_hash = last_block.hash().to_string();

        // Search before touching any state so an abort leaves nothing behind
        let mut search = ProofSearch::new(self.config.proof_range())
            .with_max_attempts(self.config.max_proof_attempts);
        if let Some(token) = cancel {
            search = search.with_cancel(token);
        }
        let proof = search.run(last_proof)?;

        self.record(reward)?;

        let block = Block::new(
            self.chain.len() as u64,
            previous_hash,
            self.pending.clone(),
            proof,
        );

        self.chain.push(block.clone());
        self.pending.clear();

        info!(
            "Block #{} mined by {} with {} transactions, hash {}",
            block.index(),
            miner,
            block.transactions().len(),
            block.hash()
        );

        Ok(block)
    }

    /// Gets the balance of an account, 0 if it has never appeared
    pub fn balance_of(&self, id: &str) -> f64 {
        self.balances.balance_of(id)
    }

    /// Summaries of every block, genesis first
    pub fn render_chain(&self) -> Vec<BlockSummary> {
        self.chain.iter().map(BlockSummary::from).collect()
    }

    /// Sorted snapshot of all balances
    pub fn render_balances(&self) -> BTreeMap<Address, f64> {
        self.balances.snapshot()
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn last_block(&self) -> &Block {
        // The chain always holds at least the genesis block
        &self.chain[self.chain.len() - 1]
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    /// Number of blocks, genesis included
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Checks whether the chain holds no blocks, never true after construction
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Total coins ever issued by grants and mining rewards
    pub fn total_issued(&self) -> f64 {
        self.issued
    }

    /// Sum of every account balance
    pub fn circulating_supply(&self) -> f64 {
        self.balances.total()
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Validates the chain
    ///
    /// # Returns
    ///
    /// `Ok(())` if every block is linked, hashed and proven correctly
    pub fn validate(&self) -> Result<(), LedgerError> {
        validate_chain(&self.chain)
    }

    /// Checks whether [`Ledger::validate`] passes
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Validates a sequence of blocks, genesis first
///
/// Reports the first violation found.
pub fn validate_chain(blocks: &[Block]) -> Result<(), LedgerError> {
    let Some(genesis) = blocks.first() else {
        return Err(LedgerError::InvalidChain("Chain has no genesis block".to_string()));
    };

    if genesis.index() != 0
        || genesis.previous_hash() != GENESIS_HASH
        || genesis.hash() != GENESIS_HASH
        || !genesis.transactions().is_empty()
    {
        return Err(LedgerError::InvalidChain("Malformed genesis block".to_string()));
    }

    for (i, pair) in blocks.windows(2).enumerate() {
        let (previous_block, current_block) = (&pair[0], &pair[1]);
        let expected_index = (i + 1) as u64;

        if current_block.index() != expected_index {
            return Err(LedgerError::InvalidChain(format!(
                "Block at position {} has index {}",
                expected_index,
                current_block.index()
            )));
        }

        if current_block.previous_hash() != previous_block.hash() {
            return Err(LedgerError::InvalidChain(format!(
                "Block #{} does not link to block #{}",
                current_block.index(),
                previous_block.index()
            )));
        }

        if current_block.hash() != current_block.calculate_hash() {
            return Err(LedgerError::InvalidChain(format!(
                "Block #{} hash does not match its contents",
                current_block.index()
            )));
        }

        if let Some(tx) = current_block
            .transactions()
            .iter()
            .find(|tx| !tx.amount().is_finite() || tx.amount() < 0.0)
        {
            return Err(LedgerError::InvalidChain(format!(
                "Block #{} holds an invalid amount in `{}`",
                current_block.index(),
                tx
            )));
        }

        if !valid_proof(previous_block.proof(), current_block.proof()) {
            return Err(LedgerError::InvalidChain(format!(
                "Block #{} has an invalid proof {}",
                current_block.index(),
                current_block.proof()
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(id: &str) -> Address {
        Address::new(id).unwrap()
    }

    fn funded_ledger() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.submit(Sender::Issuance, addr("Person1"), 100.0).unwrap();
        ledger.submit(Sender::Issuance, addr("Person2"), 50.0).unwrap();
        ledger
    }

    #[test]
    fn test_new_ledger() {
        let ledger = Ledger::new();
        let chain = ledger.chain();

        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].index(), 0);
        assert_eq!(chain[0].proof(), 100);
        assert_eq!(chain[0].hash(), "0");
        assert!(ledger.pending().is_empty());
        assert!(ledger.render_balances().is_empty());
        assert!(ledger.is_valid());
    }

    #[test]
    fn test_submit_updates_balances_and_pending() {
        let mut ledger = funded_ledger();

        let transaction = ledger
            .submit(Sender::Account(addr("Person1")), addr("Person2"), 20.0)
            .unwrap();

        assert_eq!(transaction.amount(), 20.0);
        assert_eq!(ledger.balance_of("Person1"), 80.0);
        assert_eq!(ledger.balance_of("Person2"), 70.0);
        assert_eq!(ledger.pending().len(), 3);
        assert_eq!(ledger.pending()[2], transaction);
    }

    #[test]
    fn test_rejected_submission_changes_nothing() {
        let mut ledger = funded_ledger();
        let balances_before = ledger.render_balances();
        let pending_before = ledger.pending().to_vec();

        let err = ledger
            .submit(Sender::Account(addr("Person1")), addr("Person2"), 1000.0)
            .unwrap_err();

        assert!(err.is_insufficient_funds());
        assert_eq!(ledger.render_balances(), balances_before);
        assert_eq!(ledger.pending(), pending_before.as_slice());
    }

    #[test]
    fn test_invalid_amount_rejected() {
        let mut ledger = funded_ledger();

        let err = ledger.submit(Sender::Issuance, addr("Person1"), -5.0).unwrap_err();

        assert!(matches!(err, LedgerError::TransactionError(TransactionError::InvalidAmount(_))));
        assert_eq!(ledger.balance_of("Person1"), 100.0);
    }

    #[test]
    fn test_submit_named_maps_network_to_issuance() {
        let mut ledger = Ledger::new();

        let transaction = ledger.submit_named("network", "Alice", 5.0).unwrap();

        assert!(transaction.is_issuance());
        assert_eq!(ledger.balance_of("Alice"), 5.0);
        assert_eq!(ledger.balance_of("network"), 0.0);

        let err = ledger.submit_named("Alice", "network", 1.0).unwrap_err();
        assert!(matches!(err, LedgerError::TransactionError(TransactionError::ReservedAddress(_))));
    }

    #[test]
    fn test_seal_block() {
        let mut ledger = funded_ledger();
        ledger.submit(Sender::Account(addr("Person1")), addr("Person2"), 20.0).unwrap();

        let block = ledger.seal(&addr("Miner1")).unwrap();

        assert_eq!(block.index(), 1);
        assert_eq!(block.previous_hash(), "0");
        assert_eq!(block.transactions().len(), 4); // Three submissions + mining reward
        assert_eq!(block.transactions()[3].to_string(), "network -> Miner1 : 10 coins");
        assert!(valid_proof(100, block.proof()));
        assert_eq!(ledger.len(), 2);
        assert!(ledger.pending().is_empty());
        assert_eq!(ledger.balance_of("Miner1"), 10.0);
        assert_eq!(ledger.last_block(), &block);
    }

    #[test]
    fn test_sealed_block_does_not_alias_pending() {
        let mut ledger = funded_ledger();
        let block = ledger.seal(&addr("Miner1")).unwrap();

        ledger.submit(Sender::Issuance, addr("Person3"), 1.0).unwrap();

        assert_eq!(ledger.chain()[1].transactions().len(), 3);
        assert_eq!(ledger.chain()[1], block);
        assert_eq!(ledger.pending().len(), 1);
    }

    #[test]
    fn test_consecutive_seals_link() {
        let mut ledger = Ledger::new();

        let first = ledger.seal(&addr("Miner1")).unwrap();
        let second = ledger.seal(&addr("Miner2")).unwrap();

        assert_eq!(ledger.len(), 3);
        assert_eq!(second.previous_hash(), first.hash());
        assert!(valid_proof(first.proof(), second.proof()));
        assert!(ledger.is_valid());
    }

    #[test]
    fn test_aborted_seal_leaves_ledger_untouched() {
        let config = LedgerConfig {
            max_proof_attempts: Some(0),
            ..LedgerConfig::default()
        };
        let mut ledger = Ledger::with_config(config).unwrap();
        ledger.submit(Sender::Issuance, addr("Person1"), 100.0).unwrap();

        let err = ledger.seal(&addr("Miner1")).unwrap_err();

        assert_eq!(
            err,
            LedgerError::ProofSearchAborted {
                attempts: 0,
                cancelled: false
            }
        );
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.pending().len(), 1);
        assert_eq!(ledger.balance_of("Miner1"), 0.0);
        assert_eq!(ledger.total_issued(), 100.0);
    }

    #[test]
    fn test_cancelled_seal() {
        let mut ledger = funded_ledger();
        let token = CancelToken::new();
        token.cancel();

        let err = ledger.seal_with_cancel(&addr("Miner1"), &token).unwrap_err();

        assert!(matches!(err, LedgerError::ProofSearchAborted { cancelled: true, .. }));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.pending().len(), 2);
    }

    #[test]
    fn test_custom_reward() {
        let config = LedgerConfig {
            mining_reward: 25.0,
            ..LedgerConfig::default()
        };
        let mut ledger = Ledger::with_config(config).unwrap();

        ledger.seal(&addr("Miner1")).unwrap();

        assert_eq!(ledger.balance_of("Miner1"), 25.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = LedgerConfig {
            proof_range_start: 5,
            proof_range_end: 4,
            ..LedgerConfig::default()
        };

        assert!(matches!(Ledger::with_config(config), Err(LedgerError::Config(_))));
    }

    #[test]
    fn test_supply_tracks_issuance() {
        let mut ledger = funded_ledger();
        ledger.submit(Sender::Account(addr("Person1")), addr("Person3"), 40.0).unwrap();
        ledger.seal(&addr("Miner1")).unwrap();

        assert_eq!(ledger.total_issued(), 160.0);
        assert_eq!(ledger.circulating_supply(), 160.0);
    }

    #[test]
    fn test_validate_detects_broken_link() {
        let mut ledger = funded_ledger();
        ledger.seal(&addr("Miner1")).unwrap();
        ledger.seal(&addr("Miner2")).unwrap();

        let proof = ledger.chain[2].proof();
        let tampered = Block::new(2, "not-the-previous-hash".to_string(), Vec::new(), proof);
        ledger.chain[2] = tampered;

        let err = ledger.validate().unwrap_err();
        assert_eq!(
            err,
            LedgerError::InvalidChain("Block #2 does not link to block #1".to_string())
        );
    }

    #[test]
    fn test_validate_detects_bad_proof() {
        let mut ledger = funded_ledger();
        ledger.seal(&addr("Miner1")).unwrap();

        let bad_proof = (1000..=9999).find(|p| !valid_proof(100, *p)).unwrap();
        let transactions = ledger.chain[1].transactions().to_vec();
        let forged = Block::new(1, "0".to_string(), transactions, bad_proof);
        ledger.chain[1] = forged;

        assert!(matches!(ledger.validate(), Err(LedgerError::InvalidChain(_))));
    }

    #[test]
    fn test_validate_rejects_empty_chain() {
        assert!(matches!(validate_chain(&[]), Err(LedgerError::InvalidChain(_))));
    }
}
