//! Block structure and hashing for TallyChain

use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Sentinel parent fingerprint for the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "N/A";

/// An ordered batch of transactions plus linkage metadata and the
/// proof-of-work nonce.
///
/// `hash` caches the fingerprint of the current fields; a block whose cached
/// hash differs from [`Block::compute_hash`] has been tampered with or not
/// yet (re-)mined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Millisecond UTC creation instant.
    pub timestamp: i64,
    pub transactions: Vec<Transaction>,
    pub previous_hash: String,
    pub nonce: u64,
    pub hash: String,
}

impl Block {
    pub fn new(timestamp: i64, transactions: Vec<Transaction>, previous_hash: String) -> Self {
        let mut block = Block {
            timestamp,
            transactions,
            previous_hash,
            nonce: 0,
            hash: String::new(),
        };
        block.hash = block.compute_hash();
        block
    }

    /// Fingerprint over (timestamp, transactions, previous hash, nonce).
    ///
    /// Transaction order is significant. Each transaction contributes its
    /// fingerprint and its signature bytes, so tampering with either is
    /// visible in the block hash.
    pub fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.timestamp.to_le_bytes());
        for tx in &self.transactions {
            hasher.update(tx.fingerprint());
            if let Some(signature) = &tx.signature {
                hasher.update(signature.as_bytes());
            }
        }
        hasher.update(self.previous_hash.as_bytes());
        hasher.update(self.nonce.to_le_bytes());
        hex::encode(hasher.finalize())
    }

    /// The proof-of-work admission predicate: the first `difficulty` hex
    /// digits of the hash must all be `'0'`.
    pub fn meets_difficulty(hash: &str, difficulty: usize) -> bool {
        hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
    }

    /// True iff every contained transaction verifies; short-circuits on the
    /// first failure.
    pub fn has_valid_transactions(&self) -> bool {
        self.transactions.iter().all(|tx| tx.verify() == Ok(true))
    }
}
