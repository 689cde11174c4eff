//! Per-opcode gas and memory size calculation

use super::{
    call_gas, copy_gas, cost, eip1283_sstore_gas, legacy_sstore_gas, memory_gas, memory_size,
    static_gas, GasTable, OriginalStorage,
};
use crate::contract::Contract;
use crate::environment::StateReader;
use crate::error::{EvmError, EvmResult};
use crate::opcode::Opcode;
use crate::stack::Stack;
use crate::word::byte_len;
use emerald_primitives::{Address, U256};

/// Fork switches the calculator needs
#[derive(Debug, Clone, Copy)]
pub struct CostContext<'a> {
    pub table: &'a GasTable,
    /// EIP-1283 net gas metering for SSTORE
    pub eip1283: bool,
}

/// What an opcode costs before it runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cost {
    /// Total gas to charge, memory expansion included
    pub gas: u64,
    /// Word-aligned memory size the opcode needs
    pub memory_size: u64,
    /// Refund counter delta
    pub refund: i64,
    /// Gas forwarded by a CALL-family opcode; replaces its gas operand
    pub call_gas: Option<u64>,
}

fn add(a: u64, b: u64) -> EvmResult<u64> {
    a.checked_add(b).ok_or(EvmError::OutOfGas)
}

/// Validate the stack and price `op` against the current frame.
///
/// Reads state but never mutates it or the stack. The only side effect is
/// recording first-seen slot values in `original` for net-metered SSTORE.
pub fn calculate<S: StateReader + ?Sized>(
    op: Opcode,
    ctx: &CostContext<'_>,
    state: &S,
    contract: &Contract,
    stack: &Stack,
    current_memory: u64,
    original: &mut OriginalStorage,
) -> EvmResult<Cost> {
    let (pops, pushes) = op.stack_io();
    stack.require(pops)?;
    if stack.len() - pops + pushes > cost::MAX_STACK_SIZE {
        return Err(EvmError::StackOverflow);
    }

    let table = ctx.table;
    let peek = |depth: usize| stack.peek_at(depth).copied();
    let mut gas = static_gas(op, table);
    let mut new_memory = 0u64;
    let mut refund = 0i64;

    match op {
        Opcode::SELFDESTRUCT => {
            if let Some(extra) = table.create_by_suicide {
                let beneficiary = Address::from_word(peek(0)?);
                if !state.exists(&beneficiary) {
                    gas = add(gas, extra)?;
                }
            }
            if !state.has_suicided(&contract.address) {
                refund += table.suicide_refund as i64;
            }
        }
        Opcode::EXP => {
            let exp_gas = byte_len(peek(1)?)
                .checked_mul(table.exp_byte)
                .ok_or(EvmError::OutOfGas)?;
            gas = add(gas, exp_gas)?;
        }
        Opcode::SSTORE => {
            let key = peek(0)?;
            let new = peek(1)?;
            let current = state.storage(&contract.address, key);
            let sstore = if ctx.eip1283 {
                let original_value = original.get_or_record(key, current);
                eip1283_sstore_gas(table, original_value, current, new)
            } else {
                legacy_sstore_gas(table, current, new)
            };
            gas = sstore.gas;
            refund += sstore.refund;
        }
        Opcode::MLOAD | Opcode::MSTORE => {
            new_memory = memory_size(peek(0)?, U256::from(32))?;
        }
        Opcode::MSTORE8 => {
            new_memory = memory_size(peek(0)?, U256::one())?;
        }
        Opcode::RETURN | Opcode::REVERT => {
            new_memory = memory_size(peek(0)?, peek(1)?)?;
        }
        Opcode::SHA3 => {
            new_memory = memory_size(peek(0)?, peek(1)?)?;
            gas = add(gas, copy_gas(peek(1)?, cost::SHA3_WORD)?)?;
        }
        Opcode::CALLDATACOPY | Opcode::CODECOPY | Opcode::RETURNDATACOPY => {
            new_memory = memory_size(peek(0)?, peek(2)?)?;
            gas = add(gas, copy_gas(peek(2)?, cost::COPY)?)?;
        }
        Opcode::EXTCODECOPY => {
            new_memory = memory_size(peek(1)?, peek(3)?)?;
            gas = add(gas, copy_gas(peek(3)?, cost::COPY)?)?;
        }
        Opcode::LOG0 | Opcode::LOG1 | Opcode::LOG2 | Opcode::LOG3 | Opcode::LOG4 => {
            let size = peek(1)?;
            new_memory = memory_size(peek(0)?, size)?;
            let topics = op.log_topics() as u64 * cost::LOG_TOPIC;
            if size > U256::from(u64::MAX) {
                return Err(EvmError::OutOfGas);
            }
            let data = size
                .low_u64()
                .checked_mul(cost::LOG_DATA)
                .ok_or(EvmError::OutOfGas)?;
            gas = add(add(gas, topics)?, data)?;
        }
        Opcode::CREATE | Opcode::CREATE2 => {
            new_memory = memory_size(peek(1)?, peek(2)?)?;
        }
        Opcode::CALL | Opcode::CALLCODE => {
            if op == Opcode::CALL && !state.exists(&Address::from_word(peek(1)?)) {
                gas = add(gas, table.call_new_account)?;
            }
            if !peek(2)?.is_zero() {
                gas = add(gas, table.call_value_transfer)?;
            }
            let output = memory_size(peek(5)?, peek(6)?)?;
            let input = memory_size(peek(3)?, peek(4)?)?;
            new_memory = output.max(input);
        }
        Opcode::DELEGATECALL | Opcode::STATICCALL => {
            let output = memory_size(peek(4)?, peek(5)?)?;
            let input = memory_size(peek(2)?, peek(3)?)?;
            new_memory = output.max(input);
        }
        _ => {}
    }

    gas = add(gas, memory_gas(current_memory, new_memory)?)?;

    let mut forwarded = None;
    if matches!(
        op,
        Opcode::CALL | Opcode::CALLCODE | Opcode::DELEGATECALL | Opcode::STATICCALL
    ) {
        let call = call_gas(table, contract.gas, gas, peek(0)?)?;
        gas = add(gas, call)?;
        forwarded = Some(call);
    }

    Ok(Cost {
        gas,
        memory_size: new_memory,
        refund,
        call_gas: forwarded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use emerald_primitives::H256;
    use std::collections::{BTreeMap, BTreeSet};

    #[derive(Default)]
    struct State {
        existing: BTreeSet<Address>,
        suicided: BTreeSet<Address>,
        storage: BTreeMap<U256, U256>,
    }

    impl StateReader for State {
        fn exists(&self, address: &Address) -> bool {
            self.existing.contains(address)
        }
        fn balance(&self, _: &Address) -> U256 {
            U256::zero()
        }
        fn code(&self, _: &Address) -> Bytes {
            Bytes::new()
        }
        fn code_hash(&self, _: &Address) -> H256 {
            H256::ZERO
        }
        fn storage(&self, _: &Address, key: U256) -> U256 {
            self.storage.get(&key).copied().unwrap_or_default()
        }
        fn has_suicided(&self, address: &Address) -> bool {
            self.suicided.contains(address)
        }
        fn block_hash(&self, _: u64) -> H256 {
            H256::ZERO
        }
    }

    fn stack_of(items: &[U256]) -> Stack {
        let mut stack = Stack::new();
        for item in items.iter().rev() {
            stack.push(*item).unwrap();
        }
        stack
    }

    fn price(op: Opcode, table: &GasTable, state: &State, gas: u64, stack: &Stack, memory: u64) -> EvmResult<Cost> {
        let contract = Contract::new(Address::ZERO, Address::from_low_u8(0xAA), U256::zero(), gas);
        let ctx = CostContext {
            table,
            eip1283: false,
        };
        calculate(op, &ctx, state, &contract, stack, memory, &mut OriginalStorage::new())
    }

    #[test]
    fn test_underflow_and_overflow() {
        let state = State::default();
        let table = GasTable::HOMESTEAD;
        assert_eq!(
            price(Opcode::ADD, &table, &state, 100, &stack_of(&[U256::one()]), 0),
            Err(EvmError::StackUnderflow)
        );

        let mut full = Stack::new();
        for _ in 0..1024 {
            full.push(U256::one()).unwrap();
        }
        assert_eq!(
            price(Opcode::PUSH1, &table, &state, 100, &full, 0),
            Err(EvmError::StackOverflow)
        );
        assert_eq!(
            price(Opcode::DUP1, &table, &state, 100, &full, 0),
            Err(EvmError::StackOverflow)
        );
        // SWAP does not grow the stack
        assert!(price(Opcode::SWAP1, &table, &state, 100, &full, 0).is_ok());
    }

    #[test]
    fn test_mstore_memory_expansion() {
        let state = State::default();
        let stack = stack_of(&[U256::from(0), U256::from(1)]);
        let cost = price(Opcode::MSTORE, &GasTable::HOMESTEAD, &state, 100, &stack, 0).unwrap();
        assert_eq!(cost.gas, 3 + 3);
        assert_eq!(cost.memory_size, 32);

        let cost = price(Opcode::MSTORE, &GasTable::HOMESTEAD, &state, 100, &stack, 32).unwrap();
        assert_eq!(cost.gas, 3);
    }

    #[test]
    fn test_huge_offset_is_out_of_gas() {
        let state = State::default();
        let stack = stack_of(&[U256::MAX, U256::one()]);
        assert_eq!(
            price(Opcode::MLOAD, &GasTable::HOMESTEAD, &state, 100, &stack, 0),
            Err(EvmError::OutOfGas)
        );
        // Zero-length ranges ignore the offset
        let stack = stack_of(&[U256::MAX, U256::zero()]);
        let cost = price(Opcode::RETURN, &GasTable::HOMESTEAD, &state, 100, &stack, 0).unwrap();
        assert_eq!(cost.gas, 0);
        assert_eq!(cost.memory_size, 0);
    }

    #[test]
    fn test_exp_byte_cost() {
        let state = State::default();
        let stack = stack_of(&[U256::from(2), U256::from(0x1_0000)]);
        let cost = price(Opcode::EXP, &GasTable::HOMESTEAD, &state, 100, &stack, 0).unwrap();
        assert_eq!(cost.gas, 10 + 3 * 10);
        let cost = price(Opcode::EXP, &GasTable::EIP160, &state, 100, &stack, 0).unwrap();
        assert_eq!(cost.gas, 10 + 3 * 50);
    }

    #[test]
    fn test_sha3_and_copy_costs() {
        let state = State::default();
        let stack = stack_of(&[U256::zero(), U256::from(64)]);
        let cost = price(Opcode::SHA3, &GasTable::HOMESTEAD, &state, 1000, &stack, 0).unwrap();
        assert_eq!(cost.gas, 30 + 2 * 6 + 6);

        let stack = stack_of(&[U256::zero(), U256::zero(), U256::from(33)]);
        let cost = price(Opcode::CALLDATACOPY, &GasTable::HOMESTEAD, &state, 1000, &stack, 0).unwrap();
        assert_eq!(cost.gas, 3 + 2 * 3 + 6);
        assert_eq!(cost.memory_size, 64);
    }

    #[test]
    fn test_log_cost() {
        let state = State::default();
        let stack = stack_of(&[U256::zero(), U256::from(10), U256::one(), U256::one()]);
        let cost = price(Opcode::LOG2, &GasTable::HOMESTEAD, &state, 10_000, &stack, 0).unwrap();
        assert_eq!(cost.gas, 375 + 2 * 375 + 10 * 8 + 3);
    }

    #[test]
    fn test_selfdestruct_cost_and_refund() {
        let mut state = State::default();
        let beneficiary = Address::from_low_u8(0xBB);
        let stack = stack_of(&[beneficiary.to_word()]);

        let cost = price(Opcode::SELFDESTRUCT, &GasTable::HOMESTEAD, &state, 0, &stack, 0).unwrap();
        assert_eq!(cost.gas, 0);
        assert_eq!(cost.refund, 24000);

        let cost = price(Opcode::SELFDESTRUCT, &GasTable::EIP150, &state, 0, &stack, 0).unwrap();
        assert_eq!(cost.gas, 5000 + 25000);

        state.existing.insert(beneficiary);
        state.suicided.insert(Address::from_low_u8(0xAA));
        let cost = price(Opcode::SELFDESTRUCT, &GasTable::EIP150, &state, 0, &stack, 0).unwrap();
        assert_eq!(cost.gas, 5000);
        assert_eq!(cost.refund, 0);
    }

    #[test]
    fn test_sstore_legacy_pricing() {
        let mut state = State::default();
        state.storage.insert(U256::one(), U256::from(5));
        let clear = stack_of(&[U256::one(), U256::zero()]);
        let cost = price(Opcode::SSTORE, &GasTable::HOMESTEAD, &state, 0, &clear, 0).unwrap();
        assert_eq!((cost.gas, cost.refund), (5000, 15000));

        let set = stack_of(&[U256::from(2), U256::one()]);
        let cost = price(Opcode::SSTORE, &GasTable::HOMESTEAD, &state, 0, &set, 0).unwrap();
        assert_eq!(cost.gas, 20000);
    }

    #[test]
    fn test_sstore_net_metering_records_original() {
        let mut state = State::default();
        state.storage.insert(U256::one(), U256::from(5));
        let contract = Contract::new(Address::ZERO, Address::from_low_u8(0xAA), U256::zero(), 0);
        let table = GasTable::HOMESTEAD;
        let ctx = CostContext {
            table: &table,
            eip1283: true,
        };
        let mut original = OriginalStorage::new();
        let stack = stack_of(&[U256::one(), U256::from(6)]);

        let cost = calculate(Opcode::SSTORE, &ctx, &state, &contract, &stack, 0, &mut original).unwrap();
        assert_eq!(cost.gas, 5000);
        assert_eq!(original.get(&U256::one()), Some(U256::from(5)));

        // Slot is now dirty: 5 -> 6 -> 5
        state.storage.insert(U256::one(), U256::from(6));
        let stack = stack_of(&[U256::one(), U256::from(5)]);
        let cost = calculate(Opcode::SSTORE, &ctx, &state, &contract, &stack, 0, &mut original).unwrap();
        assert_eq!((cost.gas, cost.refund), (200, 4800));
    }

    #[test]
    fn test_call_gas_forwarding() {
        let mut state = State::default();
        let target = Address::from_low_u8(0xCC);
        state.existing.insert(target);
        // gas, to, value, in offset, in size, out offset, out size
        let stack = stack_of(&[
            U256::from(10_000_000),
            target.to_word(),
            U256::zero(),
            U256::zero(),
            U256::zero(),
            U256::zero(),
            U256::zero(),
        ]);
        let cost = price(Opcode::CALL, &GasTable::EIP150, &state, 6_300_700, &stack, 0).unwrap();
        assert_eq!(cost.call_gas, Some(6_201_563));
        assert_eq!(cost.gas, 700 + 6_201_563);
    }

    #[test]
    fn test_call_new_account_and_value() {
        let state = State::default();
        let stack = stack_of(&[
            U256::from(1000),
            Address::from_low_u8(0xCC).to_word(),
            U256::one(),
            U256::zero(),
            U256::zero(),
            U256::zero(),
            U256::from(32),
        ]);
        let cost = price(Opcode::CALL, &GasTable::EIP150, &state, 100_000, &stack, 0).unwrap();
        assert_eq!(cost.gas, 700 + 25000 + 9000 + 3 + 1000);
        assert_eq!(cost.memory_size, 32);

        // CALLCODE never pays for a new account
        let cost = price(Opcode::CALLCODE, &GasTable::EIP150, &state, 100_000, &stack, 0).unwrap();
        assert_eq!(cost.gas, 700 + 9000 + 3 + 1000);
    }

    #[test]
    fn test_call_request_above_cap_pre_eip150() {
        let state = State::default();
        let stack = stack_of(&[
            U256::MAX,
            Address::from_low_u8(0xCC).to_word(),
            U256::zero(),
            U256::zero(),
            U256::zero(),
            U256::zero(),
            U256::zero(),
        ]);
        assert_eq!(
            price(Opcode::CALL, &GasTable::HOMESTEAD, &state, 100_000, &stack, 0),
            Err(EvmError::OutOfGas)
        );
    }
}
