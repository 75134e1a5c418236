//! The append-only ledger: hash-linked chain, pending pool, mining
//! lifecycle, balance accounting, and full-chain validation.

use crate::block::{Block, GENESIS_PREVIOUS_HASH};
use crate::config::Config;
use crate::error::LedgerError;
use crate::miner::{self, MineControl};
use crate::transaction::Transaction;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

/// Fixed genesis creation instant: 2022-03-17 00:00:00 UTC, in milliseconds.
pub const GENESIS_TIMESTAMP: i64 = 1_647_475_200_000;

/// The single-writer, in-memory ledger.
///
/// Owns the chain and the pending pool exclusively. Blocks enter the chain
/// only through the mining lifecycle and are never mutated afterwards by the
/// ledger itself; [`Ledger::is_chain_valid`] exists to detect external
/// tampering.
#[derive(Debug, Clone, Serialize)]
pub struct Ledger {
    pub chain: Vec<Block>,
    pub difficulty: usize,
    pub pending_transactions: Vec<Transaction>,
    pub mining_reward: u64,
    max_mine_attempts: Option<u64>,
}

impl Ledger {
    /// A ledger with the default configuration (difficulty 2, reward 100).
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    pub fn with_config(config: &Config) -> Self {
        Ledger {
            chain: vec![Self::genesis_block()],
            difficulty: config.ledger.difficulty,
            pending_transactions: Vec::new(),
            mining_reward: config.ledger.mining_reward,
            max_mine_attempts: config.mining.max_attempts,
        }
    }

    /// The fixed genesis block, re-derived identically on every call. Seeds
    /// `chain[0]` and serves as the validation-time reference.
    pub fn genesis_block() -> Block {
        Block::new(
            GENESIS_TIMESTAMP,
            Vec::new(),
            GENESIS_PREVIOUS_HASH.to_string(),
        )
    }

    pub fn latest_block(&self) -> &Block {
        self.chain.last().expect("chain always contains genesis")
    }

    /// Admits a transaction into the pending pool.
    ///
    /// This is the only admission path for non-reward transactions: the
    /// sender and recipient must be present and the signature must verify.
    /// The pool is unchanged on any failure.
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<(), LedgerError> {
        match tx.sender.as_deref() {
            None | Some("") => {
                return Err(LedgerError::InvalidTransaction(
                    "transaction must include a sender address".to_string(),
                ))
            }
            Some(_) => {}
        }
        if tx.recipient.is_empty() {
            return Err(LedgerError::InvalidTransaction(
                "transaction must include a recipient address".to_string(),
            ));
        }
        if !tx.verify()? {
            return Err(LedgerError::InvalidTransaction(
                "signature verification failed".to_string(),
            ));
        }

        debug!(fingerprint = %tx.fingerprint_hex(), amount = tx.amount, "transaction queued");
        self.pending_transactions.push(tx);
        Ok(())
    }

    /// Mines the pending pool into a new block and appends it.
    ///
    /// A reward transaction for `reward_address` is staged into the mined
    /// block, and the pool is reset to a fresh singleton reward that only
    /// lands in the *next* mined block. Uses the configured attempt cap,
    /// if any.
    pub fn mine_pending_transactions(&mut self, reward_address: &str) -> Result<Block, LedgerError> {
        let control = match self.max_mine_attempts {
            Some(max) => MineControl::with_max_attempts(max),
            None => MineControl::new(),
        };
        self.mine_pending_transactions_with(reward_address, &control)
    }

    /// As [`Ledger::mine_pending_transactions`], with a caller-supplied
    /// [`MineControl`]. Cancellation or cap exhaustion returns the error
    /// from the search and leaves chain and pool untouched.
    pub fn mine_pending_transactions_with(
        &mut self,
        reward_address: &str,
        control: &MineControl,
    ) -> Result<Block, LedgerError> {
        let (candidate, difficulty, staged) = self.stage_candidate(reward_address);
        let mined = miner::mine_block(candidate, difficulty, control)?;
        self.commit_mined(mined, reward_address, staged)
    }

    /// Builds the candidate block for the current pool without mutating the
    /// ledger. Returns the candidate, the difficulty to mine it at, and the
    /// number of pool transactions snapshotted into it.
    pub(crate) fn stage_candidate(&self, reward_address: &str) -> (Block, usize, usize) {
        let staged = self.pending_transactions.len();
        let mut transactions = self.pending_transactions.clone();
        transactions.push(Transaction::reward(
            reward_address.to_string(),
            self.mining_reward,
        ));

        let latest = self.latest_block();
        let mut timestamp = Utc::now().timestamp_millis();
        if timestamp <= latest.timestamp {
            timestamp = latest.timestamp + 1;
        }

        let candidate = Block::new(timestamp, transactions, latest.hash.clone());
        (candidate, self.difficulty, staged)
    }

    /// Appends a successfully mined block and resets the pool.
    ///
    /// The reset pool starts with the reward queued for the next block;
    /// transactions admitted after the candidate was staged are carried
    /// over behind it.
    pub(crate) fn commit_mined(
        &mut self,
        block: Block,
        reward_address: &str,
        staged: usize,
    ) -> Result<Block, LedgerError> {
        if block.previous_hash != self.latest_block().hash {
            return Err(LedgerError::InvalidBlockLinkage);
        }

        info!(
            height = self.chain.len(),
            hash = %block.hash,
            nonce = block.nonce,
            transactions = block.transactions.len(),
            "block mined and appended"
        );

        let mined = block.clone();
        self.chain.push(block);

        let carryover = self
            .pending_transactions
            .split_off(staged.min(self.pending_transactions.len()));
        let mut pool = vec![Transaction::reward(
            reward_address.to_string(),
            self.mining_reward,
        )];
        pool.extend(carryover);
        self.pending_transactions = pool;

        Ok(mined)
    }

    /// Net balance of an address over the whole chain: every sent amount
    /// subtracts, every received amount adds.
    ///
    /// Deliberately a full historical scan with no maintained index.
    pub fn address_balance(&self, address: &str) -> i64 {
        let mut balance: i64 = 0;
        for block in &self.chain {
            for tx in &block.transactions {
                if tx.sender.as_deref() == Some(address) {
                    balance -= tx.amount as i64;
                }
                if tx.recipient == address {
                    balance += tx.amount as i64;
                }
            }
        }
        balance
    }

    /// Walks the chain oldest to newest and checks every invariant: the
    /// genesis block matches its re-derivation field for field, every block
    /// links to its predecessor's hash, carries only valid transactions,
    /// and stores the hash its fields recompute to.
    pub fn is_chain_valid(&self) -> bool {
        if self.chain.first() != Some(&Self::genesis_block()) {
            return false;
        }

        for i in 1..self.chain.len() {
            let current = &self.chain[i];
            let previous = &self.chain[i - 1];

            if current.previous_hash != previous.hash {
                return false;
            }
            if !current.has_valid_transactions() {
                return false;
            }
            if current.hash != current.compute_hash() {
                return false;
            }
        }

        true
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
