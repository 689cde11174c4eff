//! Gas schedule: fixed prices, memory expansion and call gas

mod calculator;
mod sstore;
mod table;

pub use calculator::{calculate, Cost, CostContext};
pub use sstore::{eip1283_sstore_gas, legacy_sstore_gas, OriginalStorage, SstoreCost};
pub use table::GasTable;

use crate::error::{EvmError, EvmResult};
use crate::memory::Memory;
use crate::opcode::Opcode;
use emerald_primitives::U256;

/// Fixed prices and limits shared by every fork
pub mod cost {
    // Step tiers
    pub const ZERO: u64 = 0;
    pub const QUICK: u64 = 2;
    pub const FASTEST: u64 = 3;
    pub const FAST: u64 = 5;
    pub const MID: u64 = 8;
    pub const SLOW: u64 = 10;
    /// BLOCKHASH
    pub const EXT: u64 = 20;
    pub const JUMPDEST: u64 = 1;

    /// SHA3 base and per-word charge
    pub const SHA3: u64 = 30;
    pub const SHA3_WORD: u64 = 6;

    /// LOGn: base, per topic, per data byte
    pub const LOG: u64 = 375;
    pub const LOG_TOPIC: u64 = 375;
    pub const LOG_DATA: u64 = 8;

    pub const CREATE: u64 = 32000;
    /// Per byte of code stored by a creation
    pub const CREATE_DATA: u64 = 200;

    /// Linear memory price per word; the quadratic term is `words² / QUAD_COEFF_DIV`
    pub const MEMORY: u64 = 3;
    pub const QUAD_COEFF_DIV: u64 = 512;
    /// Per word copied by the *COPY opcodes
    pub const COPY: u64 = 3;

    pub const MAX_CALL_DEPTH: usize = 1024;
    pub const MAX_STACK_SIZE: usize = 1024;
    /// Largest memory size whose cost fits in 64 bits
    pub const MAX_MEMORY_SIZE: u64 = 0x1F_FFFF_FFE0;
}

/// Constant part of an opcode's cost.
///
/// Fork-dependent base costs come from `table`.
pub fn static_gas(opcode: Opcode, table: &GasTable) -> u64 {
    use Opcode::*;
    match opcode {
        STOP | RETURN | REVERT | SSTORE | INVALID => cost::ZERO,

        ADDRESS | ORIGIN | CALLER | CALLVALUE | CALLDATASIZE | CODESIZE | GASPRICE | COINBASE
        | TIMESTAMP | NUMBER | DIFFICULTY | GASLIMIT | RETURNDATASIZE | POP | PC | MSIZE | GAS => {
            cost::QUICK
        }

        ADD | SUB | NOT | LT | GT | SLT | SGT | EQ | ISZERO | AND | OR | XOR | BYTE | SHL | SHR
        | SAR | CALLDATALOAD | MLOAD | MSTORE | MSTORE8 | CALLDATACOPY | CODECOPY
        | RETURNDATACOPY => cost::FASTEST,

        MUL | DIV | SDIV | MOD | SMOD | SIGNEXTEND => cost::FAST,
        ADDMOD | MULMOD | JUMP => cost::MID,
        JUMPI | EXP => cost::SLOW,
        JUMPDEST => cost::JUMPDEST,
        BLOCKHASH => cost::EXT,
        SHA3 => cost::SHA3,

        BALANCE => table.balance,
        EXTCODESIZE => table.ext_code_size,
        EXTCODECOPY => table.ext_code_copy,
        EXTCODEHASH => table.ext_code_hash,
        SLOAD => table.sload,
        CALL | CALLCODE | DELEGATECALL | STATICCALL => table.calls,
        SELFDESTRUCT => table.suicide,

        LOG0 | LOG1 | LOG2 | LOG3 | LOG4 => cost::LOG,
        CREATE | CREATE2 => cost::CREATE,

        // PUSH, DUP and SWAP
        _ => cost::FASTEST,
    }
}

/// Number of 32-byte words covering `len` bytes
pub fn to_word_size(len: u64) -> u64 {
    len / 32 + u64::from(len % 32 != 0)
}

/// Total cost of `words` words of memory
fn memory_word_cost(words: u64) -> u64 {
    cost::MEMORY * words + words * words / cost::QUAD_COEFF_DIV
}

/// Expansion cost from `current_size` to `new_size` bytes.
///
/// Sizes above [`cost::MAX_MEMORY_SIZE`] are out of gas; a size already covered costs nothing.
pub fn memory_gas(current_size: u64, new_size: u64) -> EvmResult<u64> {
    if new_size > cost::MAX_MEMORY_SIZE {
        return Err(EvmError::OutOfGas);
    }
    if new_size <= current_size {
        return Ok(0);
    }
    let new_cost = memory_word_cost(to_word_size(new_size));
    let old_cost = memory_word_cost(to_word_size(current_size));
    Ok(new_cost - old_cost)
}

/// Word-aligned memory size needed for `[offset, offset + length)` where
/// both come off the stack. Zero length needs nothing, whatever the offset.
pub fn memory_size(offset: U256, length: U256) -> EvmResult<u64> {
    if length.is_zero() {
        return Ok(0);
    }
    if offset > U256::from(u64::MAX) || length > U256::from(u64::MAX) {
        return Err(EvmError::OutOfGas);
    }
    Memory::required_size(offset.low_u64(), length.low_u64()).ok_or(EvmError::OutOfGas)
}

/// Per-word cost of copying `length` bytes
pub fn copy_gas(length: U256, per_word: u64) -> EvmResult<u64> {
    if length > U256::from(u64::MAX) {
        return Err(EvmError::OutOfGas);
    }
    to_word_size(length.low_u64())
        .checked_mul(per_word)
        .ok_or(EvmError::OutOfGas)
}

/// Gas forwarded to a sub-call.
///
/// Once the all-but-one-64th rule is active the callee gets at most
/// `available - base` minus one 64th of it; before that the requested amount
/// is forwarded as-is (and must then be paid in full).
pub fn call_gas(table: &GasTable, available: u64, base: u64, requested: U256) -> EvmResult<u64> {
    if table.all_but_one_64th() {
        let remaining = available.checked_sub(base).ok_or(EvmError::OutOfGas)?;
        let cap = remaining - remaining / 64;
        if requested < U256::from(cap) {
            return Ok(requested.low_u64());
        }
        return Ok(cap);
    }
    if requested > U256::from(u64::MAX) {
        return Err(EvmError::OutOfGas);
    }
    Ok(requested.low_u64())
}
