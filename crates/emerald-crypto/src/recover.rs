//! secp256k1 signer recovery

use crate::{keccak256, CryptoError};
use emerald_primitives::{Address, H256};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

/// Address whose key produced the signature `(r, s)` over `hash`.
///
/// `recovery_id` is 0 or 1. High `s` values are accepted and normalized
/// before recovery.
pub fn recover_address(
    hash: &H256,
    recovery_id: u8,
    r: &[u8; 32],
    s: &[u8; 32],
) -> Result<Address, CryptoError> {
    if recovery_id > 1 {
        return Err(CryptoError::InvalidRecoveryId(recovery_id));
    }
    let r: k256::FieldBytes = (*r).into();
    let s: k256::FieldBytes = (*s).into();
    let signature = Signature::from_scalars(r, s)
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;

    let (signature, recovery_id) = match signature.normalize_s() {
        Some(low) => (low, recovery_id ^ 1),
        None => (signature, recovery_id),
    };
    let recovery_id = RecoveryId::try_from(recovery_id)
        .map_err(|_| CryptoError::InvalidRecoveryId(recovery_id))?;

    let key = VerifyingKey::recover_from_prehash(hash.as_bytes(), &signature, recovery_id)
        .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))?;
    Ok(key_address(&key))
}

/// Last 20 bytes of the Keccak-256 of the uncompressed key without its prefix
fn key_address(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    Address::from_word(keccak256(&point.as_bytes()[1..]).to_word())
}
