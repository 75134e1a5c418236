#![forbid(unsafe_code)]
use std::env;
use tallychain::config::{load_config, DEFAULT_CONFIG_PATH};
use tallychain::crypto::KeyPair;
use tallychain::ledger::Ledger;
use tallychain::transaction::Transaction;

// Console walkthrough of the ledger lifecycle: sign and submit a transfer,
// mine it, inspect balances, tamper with an appended block, and re-check
// chain validity. An optional argument selects the configuration file.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let config_path = args
        .get(1)
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_PATH);
    let config = load_config(config_path)?;

    let my_key = KeyPair::from_secret_hex(
        "44a50b5d4e0ec3c108e9aaeb626b45b7a32ef495b673a45ed9d8711d7ff4c8d4",
    )?;
    let my_wallet_address = my_key.address();
    let someone_else = KeyPair::generate().address();

    let mut ledger = Ledger::with_config(&config);

    let mut transfer = Transaction::new(my_wallet_address.clone(), someone_else.clone(), 10);
    transfer.sign(&my_key)?;
    ledger.add_transaction(transfer)?;

    println!("\nStarting the miner...");
    let mined = ledger.mine_pending_transactions(&my_wallet_address)?;
    println!("Block mined: {}", mined.hash);

    println!(
        "\nBalance of my wallet is {}",
        ledger.address_balance(&my_wallet_address)
    );
    println!(
        "Balance of the recipient is {}",
        ledger.address_balance(&someone_else)
    );

    println!("\nLedger state:");
    println!("{}", serde_json::to_string_pretty(&ledger)?);

    // Tamper with an appended transaction and watch validation catch it.
    ledger.chain[1].transactions[0].amount = 1;
    println!("\nIs chain valid after tampering? {}", ledger.is_chain_valid());

    Ok(())
}
