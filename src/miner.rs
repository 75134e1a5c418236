//! Proof-of-work mining for TallyChain
//!
//! The nonce search is a synchronous, CPU-bound loop. [`mine_block`] runs it
//! as an interruptible unit of work: a [`MineControl`] carries a cancel flag
//! and an optional attempt cap, and an abandoned search never touches the
//! ledger. [`spawn`] runs the whole stage → mine → commit cycle on a
//! background thread against a shared ledger, reporting the outcome on a
//! channel.

use crate::block::Block;
use crate::crypto::Address;
use crate::error::LedgerError;
use crate::ledger::Ledger;
use crossbeam_channel::{bounded, Receiver};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::debug;

/// Cancellation and bounding for a single nonce search.
///
/// Clones share the cancel flag, so a handle kept by the caller can stop a
/// search running elsewhere. The default control is unbounded and never
/// cancelled, which reproduces the plain blocking loop.
#[derive(Debug, Clone, Default)]
pub struct MineControl {
    cancelled: Arc<AtomicBool>,
    max_attempts: Option<u64>,
}

impl MineControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// A control that gives up with [`LedgerError::MiningTimeout`] after
    /// `max_attempts` nonce increments.
    pub fn with_max_attempts(max_attempts: u64) -> Self {
        MineControl {
            cancelled: Arc::new(AtomicBool::new(false)),
            max_attempts: Some(max_attempts),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn max_attempts(&self) -> Option<u64> {
        self.max_attempts
    }
}

/// Searches for a nonce whose hash satisfies the difficulty predicate.
///
/// Increments the nonce and recomputes the hash until the first `difficulty`
/// hex digits are all `'0'`. Expected work grows by a factor of 16 per added
/// digit. Returns the mined block; on cancellation or cap exhaustion the
/// candidate is dropped and the error carries no partial state.
pub fn mine_block(
    mut block: Block,
    difficulty: usize,
    control: &MineControl,
) -> Result<Block, LedgerError> {
    let mut attempts: u64 = 0;
    while !Block::meets_difficulty(&block.hash, difficulty) {
        if control.is_cancelled() {
            debug!(attempts, "mining cancelled");
            return Err(LedgerError::MiningCancelled);
        }
        if let Some(max) = control.max_attempts {
            if attempts >= max {
                debug!(attempts, "mining attempt cap exhausted");
                return Err(LedgerError::MiningTimeout { attempts });
            }
        }
        block.nonce += 1;
        block.hash = block.compute_hash();
        attempts += 1;
    }
    debug!(nonce = block.nonce, attempts, hash = %block.hash, "block mined");
    Ok(block)
}

/// Handle to a background mining worker.
pub struct MinerHandle {
    control: MineControl,
    outcome: Receiver<Result<Block, LedgerError>>,
    worker: JoinHandle<()>,
}

impl MinerHandle {
    /// Asks the worker to stop. The ledger is left unchanged.
    pub fn cancel(&self) {
        self.control.cancel();
    }

    /// Non-blocking check for a finished worker.
    pub fn try_outcome(&self) -> Option<Result<Block, LedgerError>> {
        self.outcome.try_recv().ok()
    }

    /// Waits for the worker and returns the mined block or the reason the
    /// search was abandoned.
    pub fn join(self) -> Result<Block, LedgerError> {
        let outcome = self
            .outcome
            .recv()
            .unwrap_or(Err(LedgerError::MinerDisconnected));
        let _ = self.worker.join();
        outcome
    }
}

/// Mines the pending pool of a shared ledger on a background thread.
///
/// The ledger lock is held only to snapshot the candidate and to commit the
/// mined block; the search itself runs unlocked, so producers can keep
/// submitting transactions. Transactions admitted while the worker mines
/// are carried into the reset pool at commit time.
pub fn spawn(
    ledger: Arc<Mutex<Ledger>>,
    reward_address: Address,
    control: MineControl,
) -> MinerHandle {
    let (sender, outcome) = bounded(1);
    let worker_control = control.clone();
    let worker = thread::spawn(move || {
        let (candidate, difficulty, staged) = ledger.lock().stage_candidate(&reward_address);
        let result = mine_block(candidate, difficulty, &worker_control)
            .and_then(|mined| ledger.lock().commit_mined(mined, &reward_address, staged));
        let _ = sender.send(result);
    });
    MinerHandle {
        control,
        outcome,
        worker,
    }
}
