//! Host interface the interpreter runs against
//!
//! The interpreter never owns world state. Reads go through [`StateReader`],
//! which is all the gas calculator may touch; mutations, sub-calls and the
//! per-transaction call context go through [`Environment`].

use crate::context::{BlockContext, CallOutcome, CallParams, CreateParams, TxContext};
use crate::error::Log;
use crate::rules::RuleSet;
use bytes::Bytes;
use emerald_primitives::{Address, H256, U256};

/// Read-only view of world state
pub trait StateReader {
    /// Whether the account exists
    fn exists(&self, address: &Address) -> bool;

    fn balance(&self, address: &Address) -> U256;

    /// Code of the account; empty if none
    fn code(&self, address: &Address) -> Bytes;

    /// Code size of the account
    fn code_size(&self, address: &Address) -> usize {
        self.code(address).len()
    }

    /// Code hash of the account, zero if the account does not exist
    fn code_hash(&self, address: &Address) -> H256;

    /// Storage slot value; zero if unset
    fn storage(&self, address: &Address, key: U256) -> U256;

    /// Whether the account already self-destructed in this transaction
    fn has_suicided(&self, address: &Address) -> bool;

    /// Hash of a recent block
    fn block_hash(&self, number: u64) -> H256;
}

/// State, call context and sub-call services for one transaction
pub trait Environment: StateReader {
    /// Fork rules
    fn rules(&self) -> &dyn RuleSet;

    fn block(&self) -> &BlockContext;

    fn tx(&self) -> &TxContext;

    /// Current call depth
    fn depth(&self) -> usize;

    fn set_depth(&mut self, depth: usize);

    /// Whether the current frame runs inside a read-only call
    fn is_read_only(&self) -> bool;

    /// Output of the last returning opcode
    fn return_data(&self) -> &Bytes;

    fn set_return_data(&mut self, data: Bytes);

    fn set_storage(&mut self, address: &Address, key: U256, value: U256);

    /// Adjust the refund counter; negative deltas reduce it
    fn add_refund(&mut self, delta: i64);

    /// Move the balance of `address` to `beneficiary` and mark it destroyed
    fn suicide(&mut self, address: &Address, beneficiary: &Address);

    fn log(&mut self, log: Log);

    /// Execute a message call one level deeper
    fn call(&mut self, params: CallParams) -> CallOutcome;

    /// Execute a contract creation one level deeper
    fn create(&mut self, params: CreateParams) -> CallOutcome;
}
