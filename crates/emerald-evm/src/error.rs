//! EVM error and frame result types

use bytes::Bytes;
use emerald_primitives::{Address, H256, U256};
use thiserror::Error;

/// Errors that abort a call frame
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvmError {
    /// Gas exhausted, or a cost/memory size overflowed
    #[error("out of gas")]
    OutOfGas,

    /// Stack underflow
    #[error("stack underflow")]
    StackUnderflow,

    /// Stack overflow
    #[error("stack limit reached (max 1024)")]
    StackOverflow,

    /// Jump target is not a JUMPDEST in executable code
    #[error("invalid jump destination: {0}")]
    InvalidJump(U256),

    /// Opcode not active in the current fork
    #[error("invalid opcode: 0x{0:02x}")]
    InvalidOpcode(u8),

    /// State modification inside a read-only call
    #[error("write protection")]
    WriteProtection,

    /// RETURNDATACOPY past the end of the return data buffer
    #[error("return data out of bounds")]
    ReturnDataOutOfBounds,

    /// Sub-call or creation beyond the maximum call depth
    #[error("max call depth exceeded")]
    CallDepthExceeded,

    /// Value transfer exceeds the sender balance
    #[error("insufficient balance for transfer")]
    InsufficientBalance,

    /// Contract address already holds code or a nonce
    #[error("contract address collision")]
    ContractAddressCollision,

    /// Created code could not pay the code deposit cost
    #[error("contract creation code storage out of gas")]
    CodeStoreOutOfGas,

    /// Precompiled contract failure
    #[error("precompile error: {0}")]
    Precompile(String),
}

/// Result type for EVM operations
pub type EvmResult<T> = Result<T, EvmError>;

/// How a call frame ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// STOP, SELFDESTRUCT, running off the end of code, or empty code
    Stopped,
    /// RETURN
    Returned,
    /// REVERT: state changes are undone but unused gas is kept
    Reverted,
    /// Aborted by an error: all gas is consumed
    Failed(EvmError),
}

impl Outcome {
    /// Stopped or returned
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Stopped | Outcome::Returned)
    }

    pub fn is_revert(&self) -> bool {
        matches!(self, Outcome::Reverted)
    }

    /// The aborting error, if any
    pub fn error(&self) -> Option<&EvmError> {
        match self {
            Outcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Result of running one call frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameResult {
    pub outcome: Outcome,
    /// Return or revert data; empty otherwise
    pub output: Bytes,
    /// Gas left in the frame's contract
    pub gas_left: u64,
}

impl FrameResult {
    pub fn stopped(gas_left: u64) -> Self {
        Self {
            outcome: Outcome::Stopped,
            output: Bytes::new(),
            gas_left,
        }
    }

    pub fn returned(output: Bytes, gas_left: u64) -> Self {
        Self {
            outcome: Outcome::Returned,
            output,
            gas_left,
        }
    }

    pub fn reverted(output: Bytes, gas_left: u64) -> Self {
        Self {
            outcome: Outcome::Reverted,
            output,
            gas_left,
        }
    }

    /// Failed frames keep no gas
    pub fn failed(err: EvmError) -> Self {
        Self {
            outcome: Outcome::Failed(err),
            output: Bytes::new(),
            gas_left: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Log entry emitted by LOG opcodes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Log {
    /// Contract address that emitted the log
    pub address: Address,
    /// Log topics (0-4)
    pub topics: Vec<H256>,
    pub data: Bytes,
}
