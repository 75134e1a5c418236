//! Cryptographic primitives for TallyChain
//!
//! Key generation, ECDSA signing and verification over secp256k1. The
//! ledger core never generates keys itself; callers own key custody and
//! hand addresses (hex-encoded compressed public keys) to the ledger.

use crate::error::LedgerError;
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use secp256k1::{
    constants::{COMPACT_SIGNATURE_SIZE, PUBLIC_KEY_SIZE, SECRET_KEY_SIZE},
    ecdsa::Signature,
    All, Message, PublicKey, Secp256k1, SecretKey,
};
use sha2::{Digest, Sha256};

/// A thread-safe, lazily initialized Secp256k1 context.
/// This prevents repeated, unnecessary context creation.
static SECP256K1_CONTEXT: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

/// A ledger address: the hex encoding of a compressed secp256k1 public key
/// (66 hex characters). The empty string is the "unset" address.
pub type Address = String;

/// Hex length of a well-formed address.
pub const ADDRESS_HEX_LEN: usize = PUBLIC_KEY_SIZE * 2;

/// Derive the address for a public key.
pub fn address_of(public_key: &PublicKey) -> Address {
    hex::encode(public_key.serialize())
}

/// Parse an address back into a public key.
pub fn public_key_from_address(address: &str) -> Result<PublicKey, LedgerError> {
    if address.len() != ADDRESS_HEX_LEN {
        return Err(LedgerError::CryptoError(format!(
            "Address must be {} hex characters, got {}",
            ADDRESS_HEX_LEN,
            address.len()
        )));
    }
    let bytes = hex::decode(address)
        .map_err(|e| LedgerError::CryptoError(format!("Invalid hex address: {}", e)))?;
    PublicKey::from_slice(&bytes)
        .map_err(|e| LedgerError::CryptoError(format!("Invalid public key: {}", e)))
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generates a new random KeyPair using the OS random number generator.
    pub fn generate() -> Self {
        let secret_key = SecretKey::new(&mut OsRng);
        let public_key = PublicKey::from_secret_key(&SECP256K1_CONTEXT, &secret_key);
        KeyPair {
            secret_key,
            public_key,
        }
    }

    /// Creates a KeyPair from an existing SecretKey.
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = PublicKey::from_secret_key(&SECP256K1_CONTEXT, &secret_key);
        KeyPair {
            secret_key,
            public_key,
        }
    }

    /// Creates a KeyPair from raw secret key bytes.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, LedgerError> {
        let secret_key = SecretKey::from_slice(bytes).map_err(|e| {
            if bytes.len() != SECRET_KEY_SIZE {
                LedgerError::CryptoError(format!(
                    "Secret key must be {} bytes, got {}",
                    SECRET_KEY_SIZE,
                    bytes.len()
                ))
            } else {
                LedgerError::CryptoError(format!("Invalid secret key bytes: {}", e))
            }
        })?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Creates a KeyPair from a hex-encoded secret key.
    pub fn from_secret_hex(hex_str: &str) -> Result<Self, LedgerError> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| LedgerError::CryptoError(format!("Invalid hex secret key: {}", e)))?;
        Self::from_secret_bytes(&bytes)
    }

    /// The ledger address of this key pair's public half.
    pub fn address(&self) -> Address {
        address_of(&self.public_key)
    }

    /// Returns the secret key as hex, for printing and re-loading.
    pub fn secret_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Signs a message (which is first hashed using SHA-256) and returns the
    /// compact signature bytes.
    pub fn sign(&self, message: &[u8]) -> Result<[u8; COMPACT_SIGNATURE_SIZE], LedgerError> {
        let digest = Sha256::digest(message);
        let message = Message::from_digest_slice(&digest)
            .map_err(|e| LedgerError::CryptoError(format!("Failed to create message: {}", e)))?;
        let signature = SECP256K1_CONTEXT.sign_ecdsa(&message, &self.secret_key);
        Ok(signature.serialize_compact())
    }
}

/// Verifies a compact ECDSA signature against the public key an address
/// encodes.
///
/// `Ok(false)` means the material was well-formed but the signature does not
/// match; `Err(CryptoError)` means the address or signature could not be
/// evaluated at all.
pub fn verify_signature(
    address: &str,
    message: &[u8],
    signature_bytes: &[u8],
) -> Result<bool, LedgerError> {
    if signature_bytes.len() != COMPACT_SIGNATURE_SIZE {
        return Err(LedgerError::CryptoError(format!(
            "Signature must be exactly {} bytes (compact), got {}",
            COMPACT_SIGNATURE_SIZE,
            signature_bytes.len()
        )));
    }

    let public_key = public_key_from_address(address)?;

    let digest = Sha256::digest(message);
    let message = Message::from_digest_slice(&digest)
        .map_err(|e| LedgerError::CryptoError(format!("Failed to create message: {}", e)))?;
    let signature = Signature::from_compact(signature_bytes)
        .map_err(|e| LedgerError::CryptoError(format!("Invalid signature: {}", e)))?;

    Ok(SECP256K1_CONTEXT
        .verify_ecdsa(&message, &signature, &public_key)
        .is_ok())
}
