//! Fork-dependent gas prices

use serde::{Deserialize, Serialize};

/// Gas prices that changed between forks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GasTable {
    pub ext_code_size: u64,
    pub ext_code_copy: u64,
    pub ext_code_hash: u64,
    pub balance: u64,
    pub sload: u64,
    /// Base cost of CALL, CALLCODE, DELEGATECALL and STATICCALL
    pub calls: u64,
    /// Base cost of SELFDESTRUCT
    pub suicide: u64,
    /// EXP cost per byte of exponent
    pub exp_byte: u64,
    /// Extra SELFDESTRUCT cost when the beneficiary does not exist.
    ///
    /// Its presence also switches on the all-but-one-64th call gas rule.
    pub create_by_suicide: Option<u64>,
    /// Refund for the first SELFDESTRUCT of an account
    pub suicide_refund: u64,

    /// SSTORE from zero to non-zero
    pub sstore_set: u64,
    /// SSTORE of any other change
    pub sstore_reset: u64,
    /// Refund for clearing a slot
    pub sstore_clear_refund: u64,
    /// Net-metered SSTORE that is a no-op or touches a dirty slot
    pub sstore_noop: u64,
    /// Refund for restoring a dirty slot to an original zero
    pub sstore_reset_clear_refund: u64,
    /// Refund for restoring a dirty slot to an original non-zero
    pub sstore_reset_refund: u64,

    /// Extra CALL cost for a non-zero value transfer
    pub call_value_transfer: u64,
    /// Extra CALL cost when the target account does not exist
    pub call_new_account: u64,
    /// Free gas given to the callee of a value transfer
    pub call_stipend: u64,
}

impl GasTable {
    /// Prices from Frontier through Homestead
    pub const HOMESTEAD: GasTable = GasTable {
        ext_code_size: 20,
        ext_code_copy: 20,
        ext_code_hash: 400,
        balance: 20,
        sload: 50,
        calls: 40,
        suicide: 0,
        exp_byte: 10,
        create_by_suicide: None,
        suicide_refund: 24000,

        sstore_set: 20000,
        sstore_reset: 5000,
        sstore_clear_refund: 15000,
        sstore_noop: 200,
        sstore_reset_clear_refund: 19800,
        sstore_reset_refund: 4800,

        call_value_transfer: 9000,
        call_new_account: 25000,
        call_stipend: 2300,
    };

    /// EIP-150 repricing of IO-heavy operations
    pub const EIP150: GasTable = GasTable {
        ext_code_size: 700,
        ext_code_copy: 700,
        balance: 400,
        sload: 200,
        calls: 700,
        suicide: 5000,
        create_by_suicide: Some(25000),
        ..GasTable::HOMESTEAD
    };

    /// EIP-160 EXP repricing
    pub const EIP160: GasTable = GasTable {
        exp_byte: 50,
        ..GasTable::EIP150
    };

    /// Whether sub-calls are capped to all but one 64th of the remaining gas
    pub fn all_but_one_64th(&self) -> bool {
        self.create_by_suicide.is_some()
    }
}

impl Default for GasTable {
    fn default() -> Self {
        Self::HOMESTEAD
    }
}
