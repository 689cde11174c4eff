//! EVM bytecode interpreter

use crate::contract::Contract;
use crate::environment::Environment;
use crate::error::{EvmError, EvmResult, FrameResult};
use crate::gas::{self, CostContext, GasTable, OriginalStorage};
use crate::jump_table::JumpTable;
use crate::jumpdest::JumpDestCache;
use crate::memory::Memory;
use crate::opcode::Opcode;
use crate::precompile::{run_precompiled, PrecompileSet};
use crate::rules::{Fork, RuleSet};
use crate::stack::Stack;
use bytes::Bytes;
use emerald_primitives::{BlockNumber, U256};
use std::sync::Arc;
use tracing::{debug, trace};

/// Mutable state of one running call frame
#[derive(Debug, Default)]
pub(crate) struct FrameState {
    pub(crate) pc: usize,
    pub(crate) stack: Stack,
    pub(crate) memory: Memory,
    /// First-seen slot values for net-metered SSTORE
    pub(crate) original_storage: OriginalStorage,
    /// Output of the current returning opcode, moved into the
    /// environment's return data once the opcode completes
    pub(crate) returned: Bytes,
}

/// Terminal opcode results
#[derive(Debug)]
pub(crate) enum Halt {
    Stop,
    Return(Bytes),
    Revert(Bytes),
}

/// What the loop does after an opcode
#[derive(Debug)]
pub(crate) enum Step {
    /// Advance to the next instruction
    Continue,
    /// The handler already moved the program counter
    Jump,
    Halt(Halt),
}

/// Dispatch table, gas table and rule switches for one block.
///
/// Built once per block and shared by every interpreter an environment
/// creates for it.
#[derive(Debug, Clone)]
pub struct ResolvedRules {
    pub block: BlockNumber,
    pub table: JumpTable,
    pub gas_table: GasTable,
    /// Net-metered SSTORE
    pub eip1283: bool,
    /// STATICCALL write protection
    pub read_only_checks: bool,
}

impl ResolvedRules {
    pub fn new(rules: &dyn RuleSet, block: BlockNumber) -> Self {
        ResolvedRules {
            block,
            table: JumpTable::new(rules, block),
            gas_table: rules.gas_table(block),
            eip1283: rules.is_active(Fork::Eip1283, block),
            read_only_checks: rules.is_active(Fork::Atlantis, block),
        }
    }
}

/// Runs contract code against an [`Environment`].
///
/// The dispatch table, gas table and rule switches are fixed at construction
/// and stay the same for every frame run by this interpreter.
pub struct Interpreter<'a, E: Environment + ?Sized> {
    pub(crate) env: &'a mut E,
    pub(crate) rules: Arc<ResolvedRules>,
    precompiles: Arc<PrecompileSet>,
    pub(crate) jumpdests: Arc<JumpDestCache>,
}

impl<'a, E: Environment + ?Sized> Interpreter<'a, E> {
    /// Interpreter for the rules active at the environment's block
    pub fn new(env: &'a mut E) -> Self {
        let rules = Arc::new(ResolvedRules::new(env.rules(), env.block().number));
        Self::with_rules(env, rules)
    }

    /// Interpreter reusing already resolved rules
    pub fn with_rules(env: &'a mut E, rules: Arc<ResolvedRules>) -> Self {
        Self {
            env,
            rules,
            precompiles: PrecompileSet::builtin(),
            jumpdests: JumpDestCache::global(),
        }
    }

    /// Use a different precompile registry
    pub fn with_precompiles(mut self, precompiles: Arc<PrecompileSet>) -> Self {
        self.precompiles = precompiles;
        self
    }

    /// Use a different jump destination cache
    pub fn with_jumpdest_cache(mut self, cache: Arc<JumpDestCache>) -> Self {
        self.jumpdests = cache;
        self
    }

    pub fn env(&self) -> &E {
        &*self.env
    }

    pub fn gas_table(&self) -> &GasTable {
        &self.rules.gas_table
    }

    /// Run `contract` with `input` as call data.
    ///
    /// The environment's depth is one higher while the frame runs and is
    /// restored before returning, whatever the outcome.
    pub fn run(&mut self, contract: &mut Contract, input: Bytes) -> FrameResult {
        let depth = self.env.depth();
        self.env.set_depth(depth + 1);
        let result = self.run_frame(contract, input);
        self.env.set_depth(depth);
        result
    }

    fn run_frame(&mut self, contract: &mut Contract, input: Bytes) -> FrameResult {
        self.env.set_return_data(Bytes::new());

        if let Some(code_address) = contract.code_address {
            let precompile = self
                .precompiles
                .get(&code_address, self.env.rules(), self.rules.block);
            if let Some(precompile) = precompile {
                debug!(address = %code_address, "dispatching to precompile");
                return run_precompiled(precompile.as_ref(), &input, contract);
            }
        }

        if contract.code.is_empty() {
            return FrameResult::stopped(contract.gas);
        }
        contract.input = input;

        let start_gas = contract.gas;
        debug!(
            code_hash = %contract.code_hash(),
            depth = self.env.depth(),
            gas = start_gas,
            "entering frame"
        );

        let mut frame = FrameState::default();
        let mut steps = 0u64;
        let halt = loop {
            steps += 1;
            match self.step(&mut frame, contract) {
                Ok(Step::Continue) => frame.pc += 1,
                Ok(Step::Jump) => {}
                Ok(Step::Halt(halt)) => break Ok(halt),
                Err(err) => break Err(err),
            }
        };

        let result = match halt {
            Ok(Halt::Stop) => FrameResult::stopped(contract.gas),
            Ok(Halt::Return(output)) => FrameResult::returned(output, contract.gas),
            Ok(Halt::Revert(output)) => FrameResult::reverted(output, contract.gas),
            Err(err) => {
                contract.gas = 0;
                FrameResult::failed(err)
            }
        };
        debug!(
            outcome = ?result.outcome,
            gas_used = start_gas.saturating_sub(result.gas_left),
            steps,
            "leaving frame"
        );
        result
    }

    /// Fetch, price, charge and execute one instruction
    fn step(&mut self, frame: &mut FrameState, contract: &mut Contract) -> EvmResult<Step> {
        let byte = contract.get_op(frame.pc);
        let op = self.rules.table.get(byte).ok_or(EvmError::InvalidOpcode(byte))?;

        if self.rules.read_only_checks && self.env.is_read_only() && writes_state(op, &frame.stack) {
            return Err(EvmError::WriteProtection);
        }

        let ctx = CostContext {
            table: &self.rules.gas_table,
            eip1283: self.rules.eip1283,
        };
        let cost = gas::calculate(
            op,
            &ctx,
            &*self.env,
            contract,
            &frame.stack,
            frame.memory.len() as u64,
            &mut frame.original_storage,
        )?;
        if !contract.use_gas(cost.gas) {
            return Err(EvmError::OutOfGas);
        }
        if cost.refund != 0 {
            self.env.add_refund(cost.refund);
        }
        if let Some(call_gas) = cost.call_gas {
            frame.stack.set_at(0, U256::from(call_gas))?;
        }
        frame.memory.resize(cost.memory_size as usize);

        trace!(pc = frame.pc, op = %op, cost = cost.gas, gas = contract.gas, "step");

        let step = self.execute(op, frame, contract)?;
        if op.is_returning() {
            let data = std::mem::take(&mut frame.returned);
            self.env.set_return_data(data);
        }
        Ok(step)
    }
}

/// State-modifying opcodes, and CALL when it transfers value
fn writes_state(op: Opcode, stack: &Stack) -> bool {
    if op.is_state_modifying() {
        return true;
    }
    op == Opcode::CALL && stack.peek_at(2).is_ok_and(|value| !value.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Outcome;
    use crate::memory_env::MemoryEnv;
    use crate::rules::ChainConfig;
    use emerald_primitives::Address;

    fn run_code(code: &[u8], gas: u64) -> FrameResult {
        run_with(ChainConfig::all_forks(), code, gas)
    }

    fn run_with(config: ChainConfig, code: &[u8], gas: u64) -> FrameResult {
        let mut env = MemoryEnv::new(config);
        let mut contract = Contract::new(Address::from_low_u8(0xCA), Address::from_low_u8(0xC0), U256::zero(), gas)
            .with_code(Bytes::copy_from_slice(code), None);
        Interpreter::new(&mut env).run(&mut contract, Bytes::new())
    }

    fn returned_word(result: &FrameResult) -> U256 {
        assert_eq!(result.outcome, Outcome::Returned);
        U256::from_big_endian(&result.output)
    }

    /// Appends `PUSH1 0 MSTORE PUSH1 32 PUSH1 0 RETURN` to return the top of stack
    fn returning(code: &[u8]) -> Vec<u8> {
        let mut code = code.to_vec();
        code.extend_from_slice(&[0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xF3]);
        code
    }

    #[test]
    fn test_stop() {
        let result = run_code(&[0x00], 1000);
        assert_eq!(result.outcome, Outcome::Stopped);
        assert_eq!(result.gas_left, 1000);
    }

    #[test]
    fn test_empty_code_stops_without_charge() {
        let result = run_code(&[], 1000);
        assert_eq!(result.outcome, Outcome::Stopped);
        assert_eq!(result.gas_left, 1000);
    }

    #[test]
    fn test_running_off_the_end_stops() {
        let result = run_code(&[0x60, 0x01], 1000);
        assert_eq!(result.outcome, Outcome::Stopped);
        assert_eq!(result.gas_left, 997);
    }

    #[test]
    fn test_push_add() {
        // PUSH1 3, PUSH1 5, ADD
        let result = run_code(&returning(&[0x60, 0x03, 0x60, 0x05, 0x01]), 1000);
        assert_eq!(returned_word(&result), U256::from(8));
    }

    #[test]
    fn test_push_sub() {
        // PUSH1 3, PUSH1 10, SUB
        let result = run_code(&returning(&[0x60, 0x03, 0x60, 0x0A, 0x03]), 1000);
        assert_eq!(returned_word(&result), U256::from(7));
    }

    #[test]
    fn test_sub_wraps() {
        // PUSH1 1, PUSH1 0, SUB
        let result = run_code(&returning(&[0x60, 0x01, 0x60, 0x00, 0x03]), 1000);
        assert_eq!(returned_word(&result), U256::MAX);
    }

    #[test]
    fn test_return_empty_costs_six() {
        // PUSH1 0, PUSH1 0, RETURN
        let result = run_code(&[0x60, 0x00, 0x60, 0x00, 0xF3], 100);
        assert_eq!(result.outcome, Outcome::Returned);
        assert!(result.output.is_empty());
        assert_eq!(result.gas_left, 94);
    }

    #[test]
    fn test_jump() {
        // PUSH1 4, JUMP, INVALID, JUMPDEST, STOP
        let result = run_code(&[0x60, 0x04, 0x56, 0xFE, 0x5B, 0x00], 1000);
        assert_eq!(result.outcome, Outcome::Stopped);
    }

    #[test]
    fn test_jumpi_not_taken() {
        // PUSH1 0, PUSH1 6, JUMPI, STOP, INVALID, JUMPDEST
        let result = run_code(&[0x60, 0x00, 0x60, 0x06, 0x57, 0x00, 0xFE, 0x5B], 1000);
        assert_eq!(result.outcome, Outcome::Stopped);
    }

    #[test]
    fn test_invalid_jump_consumes_all_gas() {
        // PUSH1 10, JUMP
        let result = run_code(&[0x60, 0x0A, 0x56], 1000);
        assert_eq!(
            result.outcome,
            Outcome::Failed(EvmError::InvalidJump(U256::from(10)))
        );
        assert_eq!(result.gas_left, 0);
    }

    #[test]
    fn test_jump_into_push_data() {
        // PUSH1 4, JUMP, PUSH1 0x5B
        let result = run_code(&[0x60, 0x04, 0x56, 0x60, 0x5B], 1000);
        assert_eq!(
            result.outcome,
            Outcome::Failed(EvmError::InvalidJump(U256::from(4)))
        );
    }

    #[test]
    fn test_revert_keeps_gas() {
        // PUSH1 0, PUSH1 0, REVERT
        let result = run_code(&[0x60, 0x00, 0x60, 0x00, 0xFD], 1000);
        assert_eq!(result.outcome, Outcome::Reverted);
        assert_eq!(result.gas_left, 994);
    }

    #[test]
    fn test_out_of_gas() {
        let result = run_code(&[0x60, 0x01], 2);
        assert_eq!(result.outcome, Outcome::Failed(EvmError::OutOfGas));
        assert_eq!(result.gas_left, 0);
    }

    #[test]
    fn test_stack_underflow() {
        let result = run_code(&[0x01], 1000);
        assert_eq!(result.outcome, Outcome::Failed(EvmError::StackUnderflow));
    }

    #[test]
    fn test_invalid_opcode() {
        let result = run_code(&[0xFE], 1000);
        assert_eq!(result.outcome, Outcome::Failed(EvmError::InvalidOpcode(0xFE)));
        let result = run_code(&[0xEF], 1000);
        assert_eq!(result.outcome, Outcome::Failed(EvmError::InvalidOpcode(0xEF)));
    }

    #[test]
    fn test_opcode_not_yet_active() {
        // SHL before Agharta
        let result = run_with(ChainConfig::frontier(), &[0x60, 0x01, 0x60, 0x01, 0x1B], 1000);
        assert_eq!(result.outcome, Outcome::Failed(EvmError::InvalidOpcode(0x1B)));
    }

    #[test]
    fn test_mstore_mload() {
        // PUSH1 42, PUSH1 0, MSTORE, PUSH1 0, MLOAD
        let result = run_code(&returning(&[0x60, 0x2A, 0x60, 0x00, 0x52, 0x60, 0x00, 0x51]), 10_000);
        assert_eq!(returned_word(&result), U256::from(42));
    }

    #[test]
    fn test_msize_is_word_aligned() {
        // PUSH1 1, PUSH1 33, MSTORE8, MSIZE
        let result = run_code(&returning(&[0x60, 0x01, 0x60, 0x21, 0x53, 0x59]), 10_000);
        assert_eq!(returned_word(&result), U256::from(64));
    }

    #[test]
    fn test_gas_opcode_reports_remaining() {
        // GAS: 2 charged before the push
        let result = run_code(&returning(&[0x5A]), 1000);
        assert_eq!(returned_word(&result), U256::from(998));
    }

    #[test]
    fn test_pc() {
        // JUMPDEST, PC
        let result = run_code(&returning(&[0x5B, 0x58]), 1000);
        assert_eq!(returned_word(&result), U256::one());
    }

    #[test]
    fn test_push_past_end_pads_zero() {
        // PUSH2 0x01 (truncated)
        let result = run_code(&[0x61, 0x01], 1000);
        assert_eq!(result.outcome, Outcome::Stopped);
        assert_eq!(result.gas_left, 997);
    }

    #[test]
    fn test_sha3() {
        // PUSH1 0, PUSH1 0, SHA3 -> keccak of empty input
        let result = run_code(&returning(&[0x60, 0x00, 0x60, 0x00, 0x20]), 10_000);
        assert_eq!(
            returned_word(&result),
            emerald_crypto::KECCAK_EMPTY.to_word()
        );
    }

    #[test]
    fn test_huge_memory_offset_is_out_of_gas() {
        // PUSH32 MAX, MLOAD
        let mut code = vec![0x7F];
        code.extend_from_slice(&[0xFF; 32]);
        code.push(0x51);
        let result = run_code(&code, 1_000_000);
        assert_eq!(result.outcome, Outcome::Failed(EvmError::OutOfGas));
    }

    #[test]
    fn test_depth_restored_for_every_outcome() {
        for code in [
            vec![0x00],
            vec![0x60, 0x00, 0x60, 0x00, 0xF3],
            vec![0x60, 0x00, 0x60, 0x00, 0xFD],
            vec![0xFE],
        ] {
            let mut env = MemoryEnv::new(ChainConfig::all_forks());
            let mut contract = Contract::new(Address::ZERO, Address::from_low_u8(1), U256::zero(), 1000)
                .with_code(Bytes::from(code), None);
            Interpreter::new(&mut env).run(&mut contract, Bytes::new());
            assert_eq!(crate::environment::Environment::depth(&env), 0);
        }
    }

    #[test]
    fn test_precompile_dispatch() {
        let mut env = MemoryEnv::new(ChainConfig::frontier());
        let identity = Address::from_low_u8(4);
        let mut contract = Contract::new(Address::ZERO, identity, U256::zero(), 100)
            .with_code_address(identity);
        let result = Interpreter::new(&mut env).run(&mut contract, Bytes::from_static(&[9, 8, 7]));
        assert_eq!(result.outcome, Outcome::Returned);
        assert_eq!(result.output.as_ref(), &[9, 8, 7]);
        assert_eq!(result.gas_left, 82);
    }

    #[test]
    fn test_ecrecover_and_ripemd_are_dispatched() {
        let mut env = MemoryEnv::new(ChainConfig::frontier());
        let ecrecover = Address::from_low_u8(1);
        let mut contract = Contract::new(Address::ZERO, ecrecover, U256::zero(), 10_000)
            .with_code_address(ecrecover);
        let result = Interpreter::new(&mut env).run(&mut contract, Bytes::new());
        assert_eq!(result.outcome, Outcome::Returned);
        assert!(result.output.is_empty());
        assert_eq!(result.gas_left, 7000);

        let ripemd = Address::from_low_u8(3);
        let mut contract = Contract::new(Address::ZERO, ripemd, U256::zero(), 10_000)
            .with_code_address(ripemd);
        let result = Interpreter::new(&mut env).run(&mut contract, Bytes::new());
        assert_eq!(result.output.len(), 32);
        assert_eq!(result.gas_left, 9400);
    }

    #[test]
    fn test_writes_state() {
        let mut stack = Stack::new();
        assert!(writes_state(Opcode::SSTORE, &stack));
        assert!(!writes_state(Opcode::CALL, &stack));
        for value in [0u64, 0, 0, 0, 5, 0, 0] {
            stack.push_u64(value).unwrap();
        }
        assert!(writes_state(Opcode::CALL, &stack));
        assert!(!writes_state(Opcode::STATICCALL, &stack));
    }
}
