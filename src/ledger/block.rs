use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use std::fmt;

use super::transaction::Transaction;

/// Previous-hash and hash value carried by the genesis block
pub const GENESIS_HASH: &str = "0";

/// Represents a sealed block in the chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Index of the block in the chain
    index: u64,

    /// Hash of the previous block
    previous_hash: String,

    /// Seconds since the Unix epoch when the block was sealed
    timestamp: i64,

    /// Transactions bundled into this block, in submission order
    transactions: Vec<Transaction>,

    /// Proof of work
    proof: u64,

    /// Hash of this block
    hash: String,
}

impl Block {
    /// Creates the genesis block
    ///
    /// Its hash is the fixed sentinel rather than a computed digest.
    pub fn genesis(proof: u64) -> Self {
        Block {
            index: 0,
            previous_hash: GENESIS_HASH.to_string(),
            timestamp: Utc::now().timestamp(),
            transactions: Vec::new(),
            proof,
            hash: GENESIS_HASH.to_string(),
        }
    }

    /// Creates and hashes a new block stamped with the current time
    ///
    /// # Arguments
    ///
    /// * `index` - The index of the block in the chain
    /// * `previous_hash` - The hash of the previous block
    /// * `transactions` - The transactions to include in the block
    /// * `proof` - The accepted proof of work
    pub fn new(
        index: u64,
        previous_hash: String,
        transactions: Vec<Transaction>,
        proof: u64,
    ) -> Self {
        Self::with_timestamp(index, previous_hash, Utc::now().timestamp(), transactions, proof)
    }

    /// Creates and hashes a new block with an explicit timestamp
    pub fn with_timestamp(
        index: u64,
        previous_hash: String,
        timestamp: i64,
        transactions: Vec<Transaction>,
        proof: u64,
    ) -> Self {
        let hash = hash_fields(index, &previous_hash, timestamp, &transactions, proof);

        Block {
            index,
            previous_hash,
            timestamp,
            transactions,
            proof,
            hash,
        }
    }

    /// Recomputes the hash from the block's fields
    ///
    /// Not meaningful for the genesis block, whose hash is a sentinel.
    pub fn calculate_hash(&self) -> String {
        hash_fields(
            self.index,
            &self.previous_hash,
            self.timestamp,
            &self.transactions,
            self.proof,
        )
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn proof(&self) -> u64 {
        self.proof
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }
}

/// Builds the exact string that is hashed for a block
///
/// Layout: `{index}{previous_hash}{timestamp}[{tx}, {tx}, ...]{proof}`, each
/// transaction in its `Display` form. Changing this changes every block hash.
pub fn hash_input(
    index: u64,
    previous_hash: &str,
    timestamp: i64,
    transactions: &[Transaction],
    proof: u64,
) -> String {
    let rendered: Vec<String> = transactions.iter().map(|tx| tx.to_string()).collect();

    format!(
        "{}{}{}[{}]{}",
        index,
        previous_hash,
        timestamp,
        rendered.join(", "),
        proof
    )
}

fn hash_fields(
    index: u64,
    previous_hash: &str,
    timestamp: i64,
    transactions: &[Transaction],
    proof: u64,
) -> String {
    let input = hash_input(index, previous_hash, timestamp, transactions, proof);
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Read-only view of a block for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSummary {
    pub index: u64,
    pub previous_hash: String,
    pub timestamp: i64,
    /// `timestamp` as a calendar time, when representable
    pub sealed_at: Option<DateTime<Utc>>,
    pub transactions: Vec<String>,
    pub proof: u64,
    pub hash: String,
}

impl From<&Block> for BlockSummary {
    fn from(block: &Block) -> Self {
        BlockSummary {
            index: block.index,
            previous_hash: block.previous_hash.clone(),
            timestamp: block.timestamp,
            sealed_at: DateTime::<Utc>::from_timestamp(block.timestamp, 0),
            transactions: block.transactions.iter().map(|tx| tx.to_string()).collect(),
            proof: block.proof,
            hash: block.hash.clone(),
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Block #{}", self.index)?;
        writeln!(f, "  Previous Hash: {}", self.previous_hash)?;
        writeln!(f, "  Timestamp: {}", self.timestamp)?;
        writeln!(f, "  Transactions:")?;
        for transaction in &self.transactions {
            writeln!(f, "    {}", transaction)?;
        }
        writeln!(f, "  Proof: {}", self.proof)?;
        write!(f, "  Hash: {}", self.hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::transaction::{Address, Sender};

    fn transfer(from: &str, to: &str, amount: f64) -> Transaction {
        Transaction::new(
            Sender::Account(Address::new(from).unwrap()),
            Address::new(to).unwrap(),
            amount,
        )
        .unwrap()
    }

    /// Block holding a single `A -> B` transfer
    fn sample(index: u64, previous_hash: &str, timestamp: i64, amount: f64, proof: u64) -> Block {
        let transactions = vec![transfer("A", "B", amount)];
        Block::with_timestamp(index, previous_hash.to_string(), timestamp, transactions, proof)
    }

    #[test]
    fn test_genesis_block() {
        let genesis = Block::genesis(100);

        assert!(genesis.is_genesis());
        assert_eq!(genesis.previous_hash(), "0");
        assert_eq!(genesis.hash(), "0");
        assert_eq!(genesis.proof(), 100);
        assert!(genesis.transactions().is_empty());
    }

    #[test]
    fn test_new_block() {
        let transactions = vec![
            Transaction::issuance(Address::new("recipient1").unwrap(), 10.0).unwrap(),
            Transaction::issuance(Address::new("recipient2").unwrap(), 20.0).unwrap(),
        ];

        let block = Block::new(1, "previous_hash".to_string(), transactions, 4242);

        assert_eq!(block.index(), 1);
        assert_eq!(block.proof(), 4242);
        assert_eq!(block.previous_hash(), "previous_hash");
        assert_eq!(block.transactions().len(), 2);
        assert_eq!(block.hash().len(), 64); // SHA-256 hash is 64 characters in hex
        assert_eq!(block.hash(), block.calculate_hash());
    }

    #[test]
    fn test_hash_input_layout() {
        let transactions = vec![
            Transaction::issuance(Address::new("Alice").unwrap(), 100.0).unwrap(),
            transfer("Alice", "Bob", 20.0),
        ];

        let input = hash_input(1, "0", 1700000000, &transactions, 1234);

        assert_eq!(
            input,
            "101700000000[network -> Alice : 100 coins, Alice -> Bob : 20 coins]1234"
        );
        assert_eq!(hash_input(2, "abc", 5, &[], 7), "2abc5[]7");
    }

    #[test]
    fn test_hash_is_deterministic() {
        let a = sample(1, "0", 1700000000, 1.0, 10);
        let b = sample(1, "0", 1700000000, 1.0, 10);

        assert_eq!(a.hash(), b.hash());

        let expected = hex::encode(Sha256::digest(
            "101700000000[A -> B : 1 coins]10".as_bytes(),
        ));
        assert_eq!(a.hash(), expected);
    }

    #[test]
    fn test_hash_covers_every_field() {
        let base = sample(1, "0", 100, 1.0, 10);

        let other_index = sample(2, "0", 100, 1.0, 10);
        let other_prev = sample(1, "1", 100, 1.0, 10);
        let other_time = sample(1, "0", 101, 1.0, 10);
        let other_txs = sample(1, "0", 100, 2.0, 10);
        let other_proof = sample(1, "0", 100, 1.0, 11);

        for other in [other_index, other_prev, other_time, other_txs, other_proof] {
            assert_ne!(base.hash(), other.hash());
        }
    }

    #[test]
    fn test_display_format() {
        let block = sample(1, "0", 42, 3.0, 7);
        let text = block.to_string();

        assert!(text.starts_with("Block #1\n  Previous Hash: 0\n  Timestamp: 42\n"));
        assert!(text.contains("    A -> B : 3 coins\n"));
        assert!(text.contains("  Proof: 7\n"));
        assert!(text.ends_with(block.hash()));
    }

    #[test]
    fn test_summary() {
        let block = sample(3, "abc", 1700000000, 3.0, 7);
        let summary = BlockSummary::from(&block);

        assert_eq!(summary.index, 3);
        assert_eq!(summary.previous_hash, "abc");
        assert_eq!(summary.transactions, vec!["A -> B : 3 coins".to_string()]);
        assert_eq!(summary.hash, block.hash());
        assert_eq!(
            summary.sealed_at.map(|t| t.to_rfc3339()),
            Some("2023-11-14T22:13:20+00:00".to_string())
        );
    }
}
