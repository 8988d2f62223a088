use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::block::{Block, BlockSummary};
use super::chain::{Ledger, LedgerError};
use super::pow::CancelToken;
use super::transaction::{Address, Sender, Transaction};

/// Thread-safe handle to a single ledger
///
/// Each call holds one lock over chain, pending transactions and balances
/// for its whole duration, so a submission's balance check and update
/// cannot interleave with another submission, and a seal sees and clears
/// exactly the pending transactions it bundles.
#[derive(Debug, Clone, Default)]
pub struct SharedLedger {
    inner: Arc<Mutex<Ledger>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        SharedLedger {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    // Every operation leaves the ledger consistent before it can panic, so
    // a poisoned lock still guards valid state.
    fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn submit(
        &self,
        sender: Sender,
        receiver: Address,
        amount: f64,
    ) -> Result<Transaction, LedgerError> {
        self.lock().submit(sender, receiver, amount)
    }

    pub fn submit_named(
        &self,
        sender: &str,
        receiver: &str,
        amount: f64,
    ) -> Result<Transaction, LedgerError> {
        self.lock().submit_named(sender, receiver, amount)
    }

    /// Seals a block while holding the lock for the whole proof search
    pub fn seal(&self, miner: &Address) -> Result<Block, LedgerError> {
        self.lock().seal(miner)
    }

    pub fn seal_with_cancel(
        &self,
        miner: &Address,
        cancel: &CancelToken,
    ) -> Result<Block, LedgerError> {
        self.lock().seal_with_cancel(miner, cancel)
    }

    pub fn balance_of(&self, id: &str) -> f64 {
        self.lock().balance_of(id)
    }

    pub fn render_chain(&self) -> Vec<BlockSummary> {
        self.lock().render_chain()
    }

    pub fn render_balances(&self) -> BTreeMap<Address, f64> {
        self.lock().render_balances()
    }

    /// Runs `f` with exclusive read access to the ledger
    pub fn read<T>(&self, f: impl FnOnce(&Ledger) -> T) -> T {
        f(&*self.lock())
    }
}

impl From<Ledger> for SharedLedger {
    fn from(ledger: Ledger) -> Self {
        SharedLedger::new(ledger)
    }
}
