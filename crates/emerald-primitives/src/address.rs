//! 20-byte account address

use crate::fixed::fixed_bytes;
use primitive_types::U256;

fixed_bytes!(
    /// Account address. On the stack it occupies the low 20 bytes of a word.
    Address,
    20
);

impl Address {
    /// Address whose last byte is `n`; precompiles live at these
    pub const fn from_low_u8(n: u8) -> Self {
        let mut bytes = [0u8; 20];
        bytes[19] = n;
        Address(bytes)
    }

    /// Low 160 bits of a stack word
    pub fn from_word(word: U256) -> Self {
        let mut buf = [0u8; 32];
        word.to_big_endian(&mut buf);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&buf[12..]);
        Address(bytes)
    }

    /// Zero-extended stack word
    pub fn to_word(&self) -> U256 {
        U256::from_big_endian(&self.0)
    }
}
