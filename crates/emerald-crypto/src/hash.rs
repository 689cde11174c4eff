//! Digest functions over byte slices

use emerald_primitives::H256;
use ripemd::Ripemd160;
use sha2::Sha256;
use sha3::{Digest, Keccak256};

/// Code hash of an account without code
pub const KECCAK_EMPTY: H256 = H256::from_bytes([
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03, 0xc0,
    0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85, 0xa4, 0x70,
]);

fn digest<D: Digest>(data: &[u8]) -> H256 {
    let mut out = [0u8; 32];
    out.copy_from_slice(&D::digest(data));
    H256::from_bytes(out)
}

/// Keccak-256 (pre-standard SHA3 padding)
pub fn keccak256(data: &[u8]) -> H256 {
    digest::<Keccak256>(data)
}

/// SHA-256
pub fn sha256(data: &[u8]) -> H256 {
    digest::<Sha256>(data)
}

/// RIPEMD-160
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    let mut out = [0u8; 20];
    out.copy_from_slice(&Ripemd160::digest(data));
    out
}
