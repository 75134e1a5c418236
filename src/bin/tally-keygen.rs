#![forbid(unsafe_code)]
use tallychain::crypto::KeyPair;

// Prints a fresh secp256k1 key pair. The public key doubles as the ledger
// address; the private key stays with the caller and never enters the
// ledger.
fn main() {
    let keypair = KeyPair::generate();

    println!();
    println!("Public Key (address): {}", keypair.address());
    println!();
    println!("Private Key:          {}", keypair.secret_key_hex());
    println!();
}
