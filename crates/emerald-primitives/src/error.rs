//! Parse errors for fixed-width byte types

use thiserror::Error;

/// Failure to build an [`Address`](crate::Address) or [`H256`](crate::H256)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrimitiveError {
    /// Input was not valid hex
    #[error("{kind}: bad hex digits ({reason})")]
    InvalidHex {
        /// Type being parsed
        kind: &'static str,
        /// Decoder message
        reason: String,
    },

    /// Input decoded to the wrong number of bytes
    #[error("{kind}: need {expected} bytes, found {got}")]
    InvalidLength {
        /// Type being parsed
        kind: &'static str,
        /// Width of the type
        expected: usize,
        /// Bytes supplied
        got: usize,
    },
}
