//! Integration tests for the full ledger lifecycle: mining, balances,
//! tamper detection, and background mining.

use parking_lot::Mutex;
use std::sync::Arc;
use tallychain::config::Config;
use tallychain::crypto::KeyPair;
use tallychain::error::LedgerError;
use tallychain::ledger::Ledger;
use tallychain::miner::{self, MineControl};
use tallychain::transaction::Transaction;

/// Helper to build a ledger with a chosen difficulty.
fn ledger_with_difficulty(difficulty: usize) -> Ledger {
    let mut config = Config::default();
    config.ledger.difficulty = difficulty;
    Ledger::with_config(&config)
}

/// Helper to create a signed transfer.
fn signed_transfer(
    from: &KeyPair,
    to: &str,
    amount: u64,
) -> Result<Transaction, Box<dyn std::error::Error>> {
    let mut tx = Transaction::new(from.address(), to.to_string(), amount);
    tx.sign(from)?;
    Ok(tx)
}

#[test]
fn test_mined_block_satisfies_default_difficulty() -> Result<(), Box<dyn std::error::Error>> {
    // Default difficulty is 2: an empty-pool mine yields a "00"-prefixed hash.
    let mut ledger = Ledger::new();
    let mined = ledger.mine_pending_transactions(&KeyPair::generate().address())?;

    assert!(mined.hash.starts_with("00"));
    assert_eq!(mined.hash, mined.compute_hash());
    assert!(ledger.is_chain_valid());
    Ok(())
}

#[test]
fn test_transfer_and_reward_balances() -> Result<(), Box<dyn std::error::Error>> {
    let alice = KeyPair::generate();
    let bob = KeyPair::generate();
    let bootstrap_miner = KeyPair::generate();

    let mut ledger = Ledger::new();

    // First mining call: empty pool, reward goes to the bootstrap miner.
    ledger.mine_pending_transactions(&bootstrap_miner.address())?;

    // Alice sends Bob 10, then mines the block herself.
    let tx = signed_transfer(&alice, &bob.address(), 10)?;
    ledger.add_transaction(tx)?;
    ledger.mine_pending_transactions(&alice.address())?;

    // Alice earned the 100 reward and spent 10.
    assert_eq!(ledger.address_balance(&alice.address()), 90);
    assert_eq!(ledger.address_balance(&bob.address()), 10);
    // The bootstrap miner collected its first-block reward plus the one
    // that was queued for the second block.
    assert_eq!(ledger.address_balance(&bootstrap_miner.address()), 200);
    assert!(ledger.is_chain_valid());

    // Transfers conserve value: everything on-chain beyond the transfers
    // came from mining rewards.
    let total = ledger.address_balance(&alice.address())
        + ledger.address_balance(&bob.address())
        + ledger.address_balance(&bootstrap_miner.address());
    assert_eq!(total, 300);
    Ok(())
}

#[test]
fn test_each_mining_call_credits_and_queues_a_reward() -> Result<(), Box<dyn std::error::Error>> {
    // With a single reward address, N calls put 2N - 1 reward credits
    // on-chain: each block embeds one fresh reward and carries the one
    // queued by the previous call.
    let miner_address = KeyPair::generate().address();
    let mut ledger = ledger_with_difficulty(1);

    for calls in 1..=3u32 {
        ledger.mine_pending_transactions(&miner_address)?;
        let expected = 100 * (2 * calls as i64 - 1);
        assert_eq!(ledger.address_balance(&miner_address), expected);
    }

    assert_eq!(ledger.chain.len(), 4);
    assert!(ledger.is_chain_valid());
    Ok(())
}

#[test]
fn test_rejected_transaction_leaves_pool_unchanged() {
    let mut ledger = Ledger::new();
    let keypair = KeyPair::generate();

    let unset_recipient = Transaction::new(keypair.address(), String::new(), 10);
    let result = ledger.add_transaction(unset_recipient);
    assert!(matches!(result, Err(LedgerError::InvalidTransaction(_))));
    assert_eq!(ledger.pending_transactions.len(), 0);
}

#[test]
fn test_tampering_after_append_is_detected() -> Result<(), Box<dyn std::error::Error>> {
    let alice = KeyPair::generate();
    let bob = KeyPair::generate();

    let mut ledger = ledger_with_difficulty(1);
    ledger.add_transaction(signed_transfer(&alice, &bob.address(), 10)?)?;
    ledger.mine_pending_transactions(&alice.address())?;
    assert!(ledger.is_chain_valid());

    ledger.chain[1].transactions[0].amount = 1;
    assert!(!ledger.is_chain_valid());
    Ok(())
}

#[test]
fn test_background_miner_commits() -> Result<(), Box<dyn std::error::Error>> {
    let ledger = Arc::new(Mutex::new(ledger_with_difficulty(1)));
    let miner_address = KeyPair::generate().address();

    let handle = miner::spawn(ledger.clone(), miner_address.clone(), MineControl::new());
    let mined = handle.join()?;

    let ledger = ledger.lock();
    assert_eq!(ledger.chain.len(), 2);
    assert_eq!(ledger.latest_block().hash, mined.hash);
    assert_eq!(ledger.pending_transactions.len(), 1);
    assert!(ledger.pending_transactions[0].is_reward());
    assert!(ledger.is_chain_valid());
    Ok(())
}

#[test]
fn test_cancelled_background_miner_leaves_ledger_unchanged() {
    // Difficulty 64 cannot be satisfied, so the worker spins until told
    // to stop.
    let ledger = Arc::new(Mutex::new(ledger_with_difficulty(64)));

    let handle = miner::spawn(
        ledger.clone(),
        KeyPair::generate().address(),
        MineControl::new(),
    );
    handle.cancel();
    let outcome = handle.join();

    assert_eq!(outcome, Err(LedgerError::MiningCancelled));
    let ledger = ledger.lock();
    assert_eq!(ledger.chain.len(), 1);
    assert!(ledger.pending_transactions.is_empty());
    assert!(ledger.is_chain_valid());
}

#[test]
fn test_capped_background_miner_times_out() {
    let ledger = Arc::new(Mutex::new(ledger_with_difficulty(64)));

    let handle = miner::spawn(
        ledger.clone(),
        KeyPair::generate().address(),
        MineControl::with_max_attempts(64),
    );
    let outcome = handle.join();

    assert_eq!(outcome, Err(LedgerError::MiningTimeout { attempts: 64 }));
    assert_eq!(ledger.lock().chain.len(), 1);
}

#[test]
fn test_mining_across_many_blocks_keeps_chain_valid() -> Result<(), Box<dyn std::error::Error>> {
    let alice = KeyPair::generate();
    let bob = KeyPair::generate();
    let mut ledger = ledger_with_difficulty(1);

    for round in 1..=5u64 {
        ledger.add_transaction(signed_transfer(&alice, &bob.address(), round)?)?;
        ledger.mine_pending_transactions(&alice.address())?;
    }

    assert_eq!(ledger.chain.len(), 6);
    assert!(ledger.is_chain_valid());
    assert_eq!(ledger.address_balance(&bob.address()), 1 + 2 + 3 + 4 + 5);
    // Timestamps are strictly increasing along the chain.
    for i in 1..ledger.chain.len() {
        assert!(ledger.chain[i].timestamp > ledger.chain[i - 1].timestamp);
    }
    Ok(())
}
