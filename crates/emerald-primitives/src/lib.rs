//! # emerald-primitives
//!
//! Primitive types shared by the emerald EVM crates.
//!
//! The interpreter works on 256-bit words ([`U256`]); accounts are addressed by
//! 20-byte [`Address`]es and content is identified by 32-byte [`H256`] digests.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod error;
mod fixed;
mod hash;

pub use address::Address;
pub use error::PrimitiveError;
pub use hash::H256;

// Re-export primitive-types for the 256-bit machine word
pub use primitive_types::U256;

/// Block number type
pub type BlockNumber = u64;
