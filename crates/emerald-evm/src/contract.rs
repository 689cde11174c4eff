//! Code executing in a call frame

use crate::jumpdest::{JumpDestCache, JumpDests};
use crate::opcode::Opcode;
use bytes::Bytes;
use emerald_crypto::keccak256;
use emerald_primitives::{Address, H256, U256};
use std::sync::Arc;

/// A contract as seen by one call frame
#[derive(Debug, Clone)]
pub struct Contract {
    /// Sender of the message (CALLER)
    pub caller: Address,
    /// Account whose storage and balance the code runs against
    pub address: Address,
    /// Account the code was loaded from; precompiles are dispatched on it
    pub code_address: Option<Address>,
    /// CALLVALUE
    pub value: U256,
    pub code: Bytes,
    /// Call data of the current run
    pub input: Bytes,
    /// Gas remaining
    pub gas: u64,
    code_hash: H256,
    jumpdests: Option<Arc<JumpDests>>,
}

impl Contract {
    pub fn new(caller: Address, address: Address, value: U256, gas: u64) -> Self {
        Self {
            caller,
            address,
            code_address: None,
            value,
            code: Bytes::new(),
            input: Bytes::new(),
            gas,
            code_hash: H256::ZERO,
            jumpdests: None,
        }
    }

    /// Attach code; pass `None` to have the hash computed on first use
    pub fn with_code(mut self, code: Bytes, code_hash: Option<H256>) -> Self {
        self.code = code;
        self.code_hash = code_hash.unwrap_or(H256::ZERO);
        self.jumpdests = None;
        self
    }

    pub fn with_code_address(mut self, code_address: Address) -> Self {
        self.code_address = Some(code_address);
        self
    }

    /// Keccak-256 of the code, computed lazily
    pub fn code_hash(&mut self) -> H256 {
        if self.code_hash.is_zero() {
            self.code_hash = keccak256(&self.code);
        }
        self.code_hash
    }

    /// Byte at `pc`; STOP past the end of code
    pub fn get_op(&self, pc: usize) -> u8 {
        self.code.get(pc).copied().unwrap_or(Opcode::STOP as u8)
    }

    /// Whether `target` is a JUMPDEST in executable code.
    ///
    /// The analysis is fetched from `cache` on the first jump.
    pub fn valid_jumpdest(&mut self, target: U256, cache: &JumpDestCache) -> bool {
        if target >= U256::from(self.code.len()) {
            return false;
        }
        let target = target.as_usize();
        if self.jumpdests.is_none() {
            let hash = self.code_hash();
            self.jumpdests = Some(cache.get_or_analyze(hash, &self.code));
        }
        self.jumpdests
            .as_ref()
            .is_some_and(|dests| dests.contains(target))
    }

    /// Deduct `amount`; false if not enough gas is left
    pub fn use_gas(&mut self, amount: u64) -> bool {
        if self.gas < amount {
            return false;
        }
        self.gas -= amount;
        true
    }

    /// Credit unused gas back, e.g. from a sub-call
    pub fn return_gas(&mut self, amount: u64) {
        self.gas = self.gas.saturating_add(amount);
    }
}
