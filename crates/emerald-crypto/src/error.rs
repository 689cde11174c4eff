//! Signature recovery errors

use thiserror::Error;

/// Failure to recover a signer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// `r` or `s` is zero or not below the curve order
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Recovery id other than 0 or 1
    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    /// No public key matches the signature
    #[error("public key recovery failed: {0}")]
    RecoveryFailed(String),
}
