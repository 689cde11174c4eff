//! Opcode handlers
//!
//! Handlers run after the loop has validated the stack, charged gas and
//! grown memory, so stack accesses here cannot underflow and every non-empty
//! memory range is in bounds.

use crate::context::{CallKind, CallOutcome, CallParams, CreateParams};
use crate::contract::Contract;
use crate::environment::Environment;
use crate::error::{EvmError, EvmResult, Log};
use crate::gas::cost::MAX_CALL_DEPTH;
use crate::interpreter::{FrameState, Halt, Interpreter, Step};
use crate::opcode::Opcode;
use crate::word::{self, as_usize_saturated};
use bytes::Bytes;
use emerald_crypto::keccak256;
use emerald_primitives::{Address, H256, U256};

/// Memory range of an operand pair; empty ranges collapse to zero
fn mem_range(offset: U256, size: U256) -> (usize, usize) {
    if size.is_zero() {
        (0, 0)
    } else {
        (as_usize_saturated(offset), as_usize_saturated(size))
    }
}

/// `len` bytes of `data` from `offset`, zero-padded past the end
fn padded(data: &[u8], offset: U256, len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    let start = as_usize_saturated(offset);
    if start < data.len() {
        let end = start.saturating_add(len).min(data.len());
        out[..end - start].copy_from_slice(&data[start..end]);
    }
    out
}

fn bool_word(value: bool) -> U256 {
    if value {
        U256::one()
    } else {
        U256::zero()
    }
}

impl<'a, E: Environment + ?Sized> Interpreter<'a, E> {
    /// Execute `op` against the current frame
    pub(crate) fn execute(
        &mut self,
        op: Opcode,
        frame: &mut FrameState,
        contract: &mut Contract,
    ) -> EvmResult<Step> {
        let stack = &mut frame.stack;

        match op {
            Opcode::STOP => return Ok(Step::Halt(Halt::Stop)),

            // Arithmetic
            Opcode::ADD => {
                let [a, b] = stack.pop_n()?;
                stack.push(a.overflowing_add(b).0)?;
            }
            Opcode::MUL => {
                let [a, b] = stack.pop_n()?;
                stack.push(a.overflowing_mul(b).0)?;
            }
            Opcode::SUB => {
                let [a, b] = stack.pop_n()?;
                stack.push(a.overflowing_sub(b).0)?;
            }
            Opcode::DIV => {
                let [a, b] = stack.pop_n()?;
                stack.push(word::div(a, b))?;
            }
            Opcode::SDIV => {
                let [a, b] = stack.pop_n()?;
                stack.push(word::sdiv(a, b))?;
            }
            Opcode::MOD => {
                let [a, b] = stack.pop_n()?;
                stack.push(word::rem(a, b))?;
            }
            Opcode::SMOD => {
                let [a, b] = stack.pop_n()?;
                stack.push(word::smod(a, b))?;
            }
            Opcode::ADDMOD => {
                let [a, b, n] = stack.pop_n()?;
                stack.push(word::addmod(a, b, n))?;
            }
            Opcode::MULMOD => {
                let [a, b, n] = stack.pop_n()?;
                stack.push(word::mulmod(a, b, n))?;
            }
            Opcode::EXP => {
                let [base, exponent] = stack.pop_n()?;
                stack.push(word::exp(base, exponent))?;
            }
            Opcode::SIGNEXTEND => {
                let [b, x] = stack.pop_n()?;
                stack.push(word::signextend(b, x))?;
            }

            // Comparison and bitwise logic
            Opcode::LT => {
                let [a, b] = stack.pop_n()?;
                stack.push_bool(a < b)?;
            }
            Opcode::GT => {
                let [a, b] = stack.pop_n()?;
                stack.push_bool(a > b)?;
            }
            Opcode::SLT => {
                let [a, b] = stack.pop_n()?;
                stack.push_bool(word::slt(a, b))?;
            }
            Opcode::SGT => {
                let [a, b] = stack.pop_n()?;
                stack.push_bool(word::sgt(a, b))?;
            }
            Opcode::EQ => {
                let [a, b] = stack.pop_n()?;
                stack.push_bool(a == b)?;
            }
            Opcode::ISZERO => {
                let a = stack.pop()?;
                stack.push_bool(a.is_zero())?;
            }
            Opcode::AND => {
                let [a, b] = stack.pop_n()?;
                stack.push(a & b)?;
            }
            Opcode::OR => {
                let [a, b] = stack.pop_n()?;
                stack.push(a | b)?;
            }
            Opcode::XOR => {
                let [a, b] = stack.pop_n()?;
                stack.push(a ^ b)?;
            }
            Opcode::NOT => {
                let a = stack.pop()?;
                stack.push(!a)?;
            }
            Opcode::BYTE => {
                let [i, x] = stack.pop_n()?;
                stack.push(word::byte(i, x))?;
            }
            Opcode::SHL => {
                let [shift, value] = stack.pop_n()?;
                stack.push(word::shl(shift, value))?;
            }
            Opcode::SHR => {
                let [shift, value] = stack.pop_n()?;
                stack.push(word::shr(shift, value))?;
            }
            Opcode::SAR => {
                let [shift, value] = stack.pop_n()?;
                stack.push(word::sar(shift, value))?;
            }

            Opcode::SHA3 => {
                let [offset, size] = stack.pop_n()?;
                let (offset, size) = mem_range(offset, size);
                let hash = keccak256(&frame.memory.get(offset, size));
                stack.push(hash.to_word())?;
            }

            // Environment
            Opcode::ADDRESS => stack.push(contract.address.to_word())?,
            Opcode::BALANCE => {
                let address = Address::from_word(stack.pop()?);
                stack.push(self.env.balance(&address))?;
            }
            Opcode::ORIGIN => stack.push(self.env.tx().origin.to_word())?,
            Opcode::CALLER => stack.push(contract.caller.to_word())?,
            Opcode::CALLVALUE => stack.push(contract.value)?,
            Opcode::CALLDATALOAD => {
                let offset = stack.pop()?;
                let data = padded(&contract.input, offset, 32);
                stack.push(U256::from_big_endian(&data))?;
            }
            Opcode::CALLDATASIZE => stack.push_u64(contract.input.len() as u64)?,
            Opcode::CALLDATACOPY => {
                let [mem_offset, data_offset, size] = stack.pop_n()?;
                let (mem_offset, size) = mem_range(mem_offset, size);
                let data = padded(&contract.input, data_offset, size);
                frame.memory.set(mem_offset, size, &data);
            }
            Opcode::CODESIZE => stack.push_u64(contract.code.len() as u64)?,
            Opcode::CODECOPY => {
                let [mem_offset, code_offset, size] = stack.pop_n()?;
                let (mem_offset, size) = mem_range(mem_offset, size);
                let data = padded(&contract.code, code_offset, size);
                frame.memory.set(mem_offset, size, &data);
            }
            Opcode::GASPRICE => stack.push(self.env.tx().gas_price)?,
            Opcode::EXTCODESIZE => {
                let address = Address::from_word(stack.pop()?);
                stack.push_u64(self.env.code_size(&address) as u64)?;
            }
            Opcode::EXTCODECOPY => {
                let [address, mem_offset, code_offset, size] = stack.pop_n()?;
                let code = self.env.code(&Address::from_word(address));
                let (mem_offset, size) = mem_range(mem_offset, size);
                let data = padded(&code, code_offset, size);
                frame.memory.set(mem_offset, size, &data);
            }
            Opcode::EXTCODEHASH => {
                let address = Address::from_word(stack.pop()?);
                stack.push(self.env.code_hash(&address).to_word())?;
            }
            Opcode::RETURNDATASIZE => stack.push_u64(self.env.return_data().len() as u64)?,
            Opcode::RETURNDATACOPY => {
                let [mem_offset, data_offset, size] = stack.pop_n()?;
                let return_data = self.env.return_data();
                let end = data_offset
                    .checked_add(size)
                    .ok_or(EvmError::ReturnDataOutOfBounds)?;
                if end > U256::from(return_data.len()) {
                    return Err(EvmError::ReturnDataOutOfBounds);
                }
                let (mem_offset, size) = mem_range(mem_offset, size);
                let start = data_offset.as_usize();
                let data = return_data.slice(start..start + size);
                frame.memory.set(mem_offset, size, &data);
            }

            // Block information
            Opcode::BLOCKHASH => {
                let requested = stack.pop()?;
                let current = self.env.block().number;
                let hash = match word::to_u64(requested) {
                    Some(n) if n < current && current - n <= 256 => self.env.block_hash(n),
                    _ => H256::ZERO,
                };
                stack.push(hash.to_word())?;
            }
            Opcode::COINBASE => stack.push(self.env.block().coinbase.to_word())?,
            Opcode::TIMESTAMP => stack.push_u64(self.env.block().timestamp)?,
            Opcode::NUMBER => stack.push_u64(self.env.block().number)?,
            Opcode::DIFFICULTY => stack.push(self.env.block().difficulty)?,
            Opcode::GASLIMIT => stack.push_u64(self.env.block().gas_limit)?,

            // Stack, memory, storage and flow
            Opcode::POP => {
                stack.pop()?;
            }
            Opcode::MLOAD => {
                let offset = stack.pop()?;
                let value = frame.memory.get_word(as_usize_saturated(offset));
                stack.push(value)?;
            }
            Opcode::MSTORE => {
                let [offset, value] = stack.pop_n()?;
                frame.memory.set_word(as_usize_saturated(offset), value);
            }
            Opcode::MSTORE8 => {
                let [offset, value] = stack.pop_n()?;
                frame
                    .memory
                    .set_byte(as_usize_saturated(offset), value.low_u32() as u8);
            }
            Opcode::SLOAD => {
                let key = stack.pop()?;
                stack.push(self.env.storage(&contract.address, key))?;
            }
            Opcode::SSTORE => {
                let [key, value] = stack.pop_n()?;
                self.env.set_storage(&contract.address, key, value);
            }
            Opcode::JUMP => {
                let target = stack.pop()?;
                self.jump(target, frame, contract)?;
                return Ok(Step::Jump);
            }
            Opcode::JUMPI => {
                let [target, condition] = stack.pop_n()?;
                if !condition.is_zero() {
                    self.jump(target, frame, contract)?;
                    return Ok(Step::Jump);
                }
            }
            Opcode::PC => stack.push_u64(frame.pc as u64)?,
            Opcode::MSIZE => stack.push_u64(frame.memory.len() as u64)?,
            Opcode::GAS => stack.push_u64(contract.gas)?,
            Opcode::JUMPDEST => {}

            op if op.is_push() => {
                let size = op.push_size();
                let start = frame.pc + 1;
                let data = padded(&contract.code, U256::from(start), size);
                stack.push(U256::from_big_endian(&data))?;
                frame.pc += size;
            }
            op if op.dup_depth() > 0 => stack.dup(op.dup_depth())?,
            op if op.swap_depth() > 0 => stack.swap(op.swap_depth())?,

            Opcode::LOG0 | Opcode::LOG1 | Opcode::LOG2 | Opcode::LOG3 | Opcode::LOG4 => {
                let [offset, size] = stack.pop_n()?;
                let mut topics = Vec::with_capacity(op.log_topics());
                for _ in 0..op.log_topics() {
                    topics.push(H256::from_word(stack.pop()?));
                }
                let (offset, size) = mem_range(offset, size);
                let data = Bytes::from(frame.memory.get(offset, size));
                self.env.log(Log {
                    address: contract.address,
                    topics,
                    data,
                });
            }

            Opcode::CREATE | Opcode::CREATE2 => return self.create(op, frame, contract),
            Opcode::CALL | Opcode::CALLCODE | Opcode::DELEGATECALL | Opcode::STATICCALL => {
                return self.call(op, frame, contract)
            }

            Opcode::RETURN => {
                let [offset, size] = stack.pop_n()?;
                let (offset, size) = mem_range(offset, size);
                let output = Bytes::from(frame.memory.get(offset, size));
                return Ok(Step::Halt(Halt::Return(output)));
            }
            Opcode::REVERT => {
                let [offset, size] = stack.pop_n()?;
                let (offset, size) = mem_range(offset, size);
                let output = Bytes::from(frame.memory.get(offset, size));
                return Ok(Step::Halt(Halt::Revert(output)));
            }
            Opcode::SELFDESTRUCT => {
                let beneficiary = Address::from_word(stack.pop()?);
                self.env.suicide(&contract.address, &beneficiary);
                return Ok(Step::Halt(Halt::Stop));
            }

            // Never part of a jump table
            _ => return Err(EvmError::InvalidOpcode(op as u8)),
        }

        Ok(Step::Continue)
    }

    fn jump(&self, target: U256, frame: &mut FrameState, contract: &mut Contract) -> EvmResult<()> {
        if !contract.valid_jumpdest(target, &self.jumpdests) {
            return Err(EvmError::InvalidJump(target));
        }
        frame.pc = target.as_usize();
        Ok(())
    }

    /// CALL, CALLCODE, DELEGATECALL and STATICCALL.
    ///
    /// The gas operand already holds the forwarded amount computed by the
    /// cost calculator.
    fn call(&mut self, op: Opcode, frame: &mut FrameState, contract: &mut Contract) -> EvmResult<Step> {
        let stack = &mut frame.stack;
        let requested = stack.pop()?;
        let to = Address::from_word(stack.pop()?);
        let value = match op {
            Opcode::CALL | Opcode::CALLCODE => stack.pop()?,
            _ => U256::zero(),
        };
        let [in_offset, in_size, out_offset, out_size] = stack.pop_n()?;

        let mut gas = word::as_u64_saturated(requested);
        if !value.is_zero() {
            gas = gas.saturating_add(self.rules.gas_table.call_stipend);
        }

        let (in_offset, in_size) = mem_range(in_offset, in_size);
        let input = Bytes::from(frame.memory.get(in_offset, in_size));

        let (kind, caller, address, call_value) = match op {
            Opcode::CALL => (CallKind::Call, contract.address, to, value),
            Opcode::CALLCODE => (CallKind::CallCode, contract.address, contract.address, value),
            Opcode::DELEGATECALL => (
                CallKind::DelegateCall,
                contract.caller,
                contract.address,
                contract.value,
            ),
            _ => (CallKind::StaticCall, contract.address, to, U256::zero()),
        };

        let outcome = if self.env.depth() > MAX_CALL_DEPTH {
            CallOutcome::rejected(EvmError::CallDepthExceeded, gas)
        } else if kind.transfers_value() && self.env.balance(&contract.address) < value {
            CallOutcome::rejected(EvmError::InsufficientBalance, gas)
        } else {
            self.env.call(CallParams {
                kind,
                caller,
                address,
                code_address: to,
                value: call_value,
                input,
                gas,
            })
        };

        frame.stack.push(bool_word(outcome.is_success()))?;
        if outcome.is_success() || outcome.outcome.is_revert() {
            let (out_offset, out_size) = mem_range(out_offset, out_size);
            frame.memory.set(out_offset, out_size, &outcome.output);
        }
        contract.return_gas(outcome.gas_left);
        frame.returned = outcome.output;
        Ok(Step::Continue)
    }

    /// CREATE and CREATE2
    fn create(&mut self, op: Opcode, frame: &mut FrameState, contract: &mut Contract) -> EvmResult<Step> {
        let stack = &mut frame.stack;
        let [value, offset, size] = stack.pop_n()?;
        let salt = match op {
            Opcode::CREATE2 => Some(H256::from_word(stack.pop()?)),
            _ => None,
        };
        let (offset, size) = mem_range(offset, size);
        let init_code = Bytes::from(frame.memory.get(offset, size));

        let mut gas = contract.gas;
        if self.rules.gas_table.all_but_one_64th() {
            gas -= gas / 64;
        }
        contract.gas -= gas;

        let outcome = if self.env.depth() > MAX_CALL_DEPTH {
            CallOutcome::rejected(EvmError::CallDepthExceeded, gas)
        } else if self.env.balance(&contract.address) < value {
            CallOutcome::rejected(EvmError::InsufficientBalance, gas)
        } else {
            self.env.create(CreateParams {
                caller: contract.address,
                value,
                init_code,
                gas,
                salt,
            })
        };

        let created = match outcome.created {
            Some(address) if outcome.is_success() => address.to_word(),
            _ => U256::zero(),
        };
        frame.stack.push(created)?;
        contract.return_gas(outcome.gas_left);
        frame.returned = if outcome.outcome.is_revert() {
            outcome.output
        } else {
            Bytes::new()
        };
        Ok(Step::Continue)
    }
}
