//! Transaction types and signing for TallyChain

use crate::crypto::{self, Address, KeyPair};
use crate::error::LedgerError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A value transfer between two addresses.
///
/// A transaction with no sender is a mining reward: it is trusted by
/// construction and never signed. Everything else must carry a signature
/// from the key pair whose public half equals `sender`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: Option<Address>,
    pub recipient: Address,
    pub amount: u64,
    /// Hex-encoded compact ECDSA signature over the fingerprint.
    pub signature: Option<String>,
}

impl Transaction {
    pub fn new(sender: Address, recipient: Address, amount: u64) -> Self {
        Transaction {
            sender: Some(sender),
            recipient,
            amount,
            signature: None,
        }
    }

    /// A mining-reward transaction crediting `recipient`.
    pub fn reward(recipient: Address, amount: u64) -> Self {
        Transaction {
            sender: None,
            recipient,
            amount,
            signature: None,
        }
    }

    pub fn is_reward(&self) -> bool {
        self.sender.is_none()
    }

    /// Deterministic SHA-256 fingerprint over (sender, recipient, amount).
    ///
    /// The signature is deliberately excluded: the fingerprint is what gets
    /// signed.
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        match &self.sender {
            Some(sender) => hasher.update(sender.as_bytes()),
            None => hasher.update("reward".as_bytes()),
        }
        hasher.update(self.recipient.as_bytes());
        hasher.update(self.amount.to_le_bytes());
        hasher.finalize().into()
    }

    pub fn fingerprint_hex(&self) -> String {
        hex::encode(self.fingerprint())
    }

    /// Signs the fingerprint and stores the signature.
    ///
    /// Fails with [`LedgerError::UnauthorizedSigner`] unless the key pair's
    /// address equals the declared sender. Reward transactions have no
    /// sender to match and can never be signed.
    pub fn sign(&mut self, keypair: &KeyPair) -> Result<(), LedgerError> {
        if self.sender.as_deref() != Some(keypair.address().as_str()) {
            return Err(LedgerError::UnauthorizedSigner);
        }

        let signature = keypair.sign(&self.fingerprint())?;
        self.signature = Some(hex::encode(signature));
        Ok(())
    }

    /// Checks the signature against the declared sender.
    ///
    /// Rewards are `Ok(true)` unconditionally. A missing or empty signature
    /// on a non-reward transaction is [`LedgerError::MissingSignature`];
    /// undecodable signature material is a `CryptoError`. `Ok(false)` means
    /// the signature was evaluated and did not match.
    pub fn verify(&self) -> Result<bool, LedgerError> {
        let sender = match &self.sender {
            None => return Ok(true),
            Some(sender) => sender,
        };

        let signature = match self.signature.as_deref() {
            Some(sig) if !sig.is_empty() => sig,
            _ => return Err(LedgerError::MissingSignature),
        };

        let signature_bytes = hex::decode(signature)
            .map_err(|e| LedgerError::CryptoError(format!("Invalid hex signature: {}", e)))?;

        crypto::verify_signature(sender, &self.fingerprint(), &signature_bytes)
    }
}
