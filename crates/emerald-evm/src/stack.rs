//! Word stack

use crate::error::{EvmError, EvmResult};
use crate::gas::cost::MAX_STACK_SIZE;
use emerald_primitives::U256;

/// Operand stack of 256-bit words, at most 1024 deep.
///
/// Positions are counted from the top: depth 0 is the most recently pushed
/// word. An operation that fails leaves the stack as it was.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stack {
    words: Vec<U256>,
}

impl Stack {
    pub fn new() -> Self {
        Stack {
            words: Vec::with_capacity(MAX_STACK_SIZE),
        }
    }

    /// Vector index of the word `depth` slots below the top
    fn slot(&self, depth: usize) -> EvmResult<usize> {
        self.words
            .len()
            .checked_sub(depth + 1)
            .ok_or(EvmError::StackUnderflow)
    }

    fn ensure_room(&self) -> EvmResult<()> {
        match self.words.len() < MAX_STACK_SIZE {
            true => Ok(()),
            false => Err(EvmError::StackOverflow),
        }
    }

    pub fn push(&mut self, value: U256) -> EvmResult<()> {
        self.ensure_room()?;
        self.words.push(value);
        Ok(())
    }

    pub fn push_u64(&mut self, value: u64) -> EvmResult<()> {
        self.push(U256::from(value))
    }

    /// 1 for true, 0 for false
    pub fn push_bool(&mut self, value: bool) -> EvmResult<()> {
        self.push(U256::from(value as u8))
    }

    pub fn pop(&mut self) -> EvmResult<U256> {
        self.words.pop().ok_or(EvmError::StackUnderflow)
    }

    /// Remove the top `N` words; element 0 of the result was on top
    pub fn pop_n<const N: usize>(&mut self) -> EvmResult<[U256; N]> {
        self.require(N)?;
        let base = self.words.len() - N;
        let mut out = [U256::zero(); N];
        for (dst, src) in out.iter_mut().zip(self.words.drain(base..).rev()) {
            *dst = src;
        }
        Ok(out)
    }

    pub fn peek(&self) -> EvmResult<&U256> {
        self.peek_at(0)
    }

    pub fn peek_at(&self, depth: usize) -> EvmResult<&U256> {
        let idx = self.slot(depth)?;
        Ok(&self.words[idx])
    }

    /// Replace the word at `depth` in place
    pub fn set_at(&mut self, depth: usize, value: U256) -> EvmResult<()> {
        let idx = self.slot(depth)?;
        self.words[idx] = value;
        Ok(())
    }

    /// SWAPn: exchange the top with the word `n` below it (n >= 1)
    pub fn swap(&mut self, n: usize) -> EvmResult<()> {
        if n == 0 {
            return Err(EvmError::StackUnderflow);
        }
        let other = self.slot(n)?;
        let top = self.words.len() - 1;
        self.words.swap(top, other);
        Ok(())
    }

    /// DUPn: push a copy of the n-th word (n = 1 is the top)
    pub fn dup(&mut self, n: usize) -> EvmResult<()> {
        let idx = n.checked_sub(1).ok_or(EvmError::StackUnderflow)?;
        let value = *self.peek_at(idx)?;
        self.push(value)
    }

    /// Underflow unless `n` words are present
    pub fn require(&self, n: usize) -> EvmResult<()> {
        if n > self.words.len() {
            Err(EvmError::StackUnderflow)
        } else {
            Ok(())
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Bottom first
    pub fn as_slice(&self) -> &[U256] {
        &self.words
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}
