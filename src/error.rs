//! Error types for TallyChain

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// Signing was attempted with a key pair whose public half does not
    /// match the transaction's declared sender.
    #[error("Cannot sign a transaction for another wallet")]
    UnauthorizedSigner,

    /// Verification was attempted on a non-reward transaction that carries
    /// no signature.
    #[error("No signature in this transaction")]
    MissingSignature,

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Cryptographic error: {0}")]
    CryptoError(String),

    /// A mined candidate no longer links to the chain tip at commit time.
    #[error("Invalid block linkage")]
    InvalidBlockLinkage,

    #[error("Mining was cancelled")]
    MiningCancelled,

    /// The nonce search exhausted its configured attempt cap.
    #[error("Mining gave up after {attempts} attempts")]
    MiningTimeout { attempts: u64 },

    /// The background mining worker stopped without reporting an outcome.
    #[error("Mining worker disconnected")]
    MinerDisconnected,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, LedgerError>;
