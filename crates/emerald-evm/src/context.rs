//! Block, transaction and sub-call descriptors

use crate::error::Outcome;
use bytes::Bytes;
use emerald_primitives::{Address, H256, U256};

/// Header fields readable by NUMBER, TIMESTAMP, GASLIMIT, COINBASE and DIFFICULTY.
///
/// The number also selects the active fork rules.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockContext {
    pub number: u64,
    pub timestamp: u64,
    pub gas_limit: u64,
    /// Beneficiary of the block reward
    pub coinbase: Address,
    pub difficulty: U256,
}

impl Default for BlockContext {
    fn default() -> Self {
        BlockContext {
            number: 0,
            timestamp: 0,
            gas_limit: 8_000_000,
            coinbase: Address::ZERO,
            difficulty: U256::zero(),
        }
    }
}

/// Per-transaction values (ORIGIN, GASPRICE)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxContext {
    /// Externally owned account that signed the transaction
    pub origin: Address,
    pub gas_price: U256,
}

/// Flavour of a message call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallKind {
    /// Run the target's code in the target's context, transferring value
    Call,
    /// Run the target's code in the caller's context, transferring value to self
    CallCode,
    /// Run the target's code in the caller's context with the caller's
    /// sender and value
    DelegateCall,
    /// Like `Call` without value, executed read-only
    StaticCall,
}

impl CallKind {
    /// Whether the call moves `value` from caller to the context address
    pub fn transfers_value(self) -> bool {
        matches!(self, CallKind::Call | CallKind::CallCode)
    }
}

/// Sub-call request handed to the environment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallParams {
    pub kind: CallKind,
    /// Sender seen by the callee (CALLER)
    pub caller: Address,
    /// Account whose storage and balance the callee runs against
    pub address: Address,
    /// Account whose code is executed
    pub code_address: Address,
    /// CALLVALUE seen by the callee
    pub value: U256,
    pub input: Bytes,
    /// Gas forwarded, including any stipend
    pub gas: u64,
}

/// Contract creation request handed to the environment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateParams {
    pub caller: Address,
    pub value: U256,
    pub init_code: Bytes,
    pub gas: u64,
    /// CREATE2 salt; `None` for CREATE
    pub salt: Option<H256>,
}

/// Result of a sub-call or creation as seen by the calling frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallOutcome {
    pub outcome: Outcome,
    pub output: Bytes,
    pub gas_left: u64,
    /// New contract address; set only by successful creations
    pub created: Option<Address>,
}

impl CallOutcome {
    /// A call that never started: all forwarded gas comes back
    pub fn rejected(err: crate::error::EvmError, gas: u64) -> Self {
        Self {
            outcome: Outcome::Failed(err),
            output: Bytes::new(),
            gas_left: gas,
            created: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvmError;

    #[test]
    fn test_defaults() {
        let block = BlockContext::default();
        assert_eq!((block.number, block.gas_limit), (0, 8_000_000));
        assert!(block.coinbase.is_zero() && block.difficulty.is_zero());

        let tx = TxContext::default();
        assert!(tx.origin.is_zero() && tx.gas_price.is_zero());
    }

    #[test]
    fn test_call_kind_value_transfer() {
        assert!(CallKind::Call.transfers_value());
        assert!(CallKind::CallCode.transfers_value());
        assert!(!CallKind::DelegateCall.transfers_value());
        assert!(!CallKind::StaticCall.transfers_value());
    }

    #[test]
    fn test_rejected_call_returns_gas() {
        let outcome = CallOutcome::rejected(EvmError::InsufficientBalance, 2300);
        assert_eq!(outcome.gas_left, 2300);
        assert!(!outcome.is_success());
        assert!(outcome.created.is_none());
    }
}
