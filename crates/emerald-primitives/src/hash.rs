//! 32-byte digest

use crate::fixed::fixed_bytes;
use primitive_types::U256;

fixed_bytes!(
    /// Keccak-256 digest, storage slot or CREATE2 salt.
    H256,
    32
);

impl H256 {
    /// Big-endian encoding of a word
    pub fn from_word(word: U256) -> Self {
        let mut bytes = [0u8; 32];
        word.to_big_endian(&mut bytes);
        H256(bytes)
    }

    /// Decode as a big-endian word
    pub fn to_word(&self) -> U256 {
        U256::from_big_endian(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PrimitiveError;

    #[test]
    fn test_parse_one() {
        let hash = H256::from_hex(&format!("0x{:064x}", 1)).unwrap();
        assert_eq!(hash.to_word(), U256::one());
        assert!(H256::ZERO.is_zero());
    }

    #[test]
    fn test_short_input_rejected() {
        let err = H256::from_slice(&[0u8; 31]).unwrap_err();
        assert_eq!(err.to_string(), "H256: need 32 bytes, found 31");
        assert!(matches!(err, PrimitiveError::InvalidLength { got: 31, .. }));
    }

    #[test]
    fn test_word_is_big_endian() {
        let hash = H256::from_word(U256::from(1u64));
        assert_eq!(hash.as_bytes()[31], 1);
        assert!(hash.as_bytes()[..31].iter().all(|&b| b == 0));

        let word = U256::from(0xDEAD_BEEFu64) << 100;
        assert_eq!(H256::from_word(word).to_word(), word);
    }
}
