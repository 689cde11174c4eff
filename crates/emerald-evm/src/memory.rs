//! Frame memory

use crate::word::to_be_bytes;
use emerald_primitives::U256;

/// Byte-addressed scratch memory of one call frame.
///
/// The loop grows memory to the size the calculator charged for before a
/// handler runs, so handlers stay in range. Reads past the end still yield
/// zeros.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Memory {
    bytes: Vec<u8>,
}

impl Memory {
    pub fn new() -> Self {
        Memory::default()
    }

    /// Current size in bytes (MSIZE)
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Size in bytes, rounded up to a word, needed to touch
    /// `[offset, offset + length)`; 0 for an empty range, `None` on overflow.
    pub fn required_size(offset: u64, length: u64) -> Option<u64> {
        match length {
            0 => Some(0),
            _ => offset
                .checked_add(length)?
                .checked_add(31)
                .map(|end| end & !31),
        }
    }

    /// Zero-extend to `size` bytes; smaller sizes are ignored
    pub fn resize(&mut self, size: usize) {
        if size > self.bytes.len() {
            self.bytes.resize(size, 0);
        }
    }

    /// Owned copy of `[offset, offset + size)`, zero-filled past the end
    pub fn get(&self, offset: usize, size: usize) -> Vec<u8> {
        let mut out = vec![0u8; size];
        if let Some(tail) = self.bytes.get(offset..) {
            let n = tail.len().min(size);
            out[..n].copy_from_slice(&tail[..n]);
        }
        out
    }

    pub fn get_word(&self, offset: usize) -> U256 {
        U256::from_big_endian(&self.get(offset, 32))
    }

    /// Copy up to `size` bytes of `value` to `offset`, growing as needed.
    ///
    /// A `value` shorter than `size` leaves the remainder untouched.
    pub fn set(&mut self, offset: usize, size: usize, value: &[u8]) {
        if size == 0 {
            return;
        }
        self.resize(offset + size);
        let n = size.min(value.len());
        self.bytes[offset..offset + n].copy_from_slice(&value[..n]);
    }

    pub fn set_word(&mut self, offset: usize, value: U256) {
        self.set(offset, 32, &to_be_bytes(value));
    }

    /// MSTORE8
    pub fn set_byte(&mut self, offset: usize, value: u8) {
        self.set(offset, 1, &[value]);
    }

    pub fn data(&self) -> &[u8] {
        &self.bytes
    }
}
