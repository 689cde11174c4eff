//! # emerald-crypto
//!
//! Hash functions used by the interpreter:
//!
//! - Keccak-256 (code hashes, the SHA3 opcode, contract address derivation)
//! - SHA-256 and RIPEMD-160 (the hashing precompiles)
//! - secp256k1 signer recovery (the ECRECOVER precompile)

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod hash;
mod recover;

pub use error::CryptoError;
pub use hash::{keccak256, ripemd160, sha256, KECCAK_EMPTY};
pub use recover::recover_address;
