//! Fixture schema for the ethereum/tests `VMTests` JSON format
//!
//! Every scalar in a fixture is a `0x`-prefixed hex string. The wrapper types
//! below parse through `TryFrom<String>` so serde reports the offending field.

use crate::error::TestError;
use emerald_primitives::{Address, U256};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

fn digits(raw: &str) -> &str {
    raw.strip_prefix("0x").unwrap_or(raw)
}

/// Byte string such as code, call data or output
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct HexBytes(pub Vec<u8>);

impl TryFrom<String> for HexBytes {
    type Error = TestError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Ok(HexBytes(hex::decode(digits(&raw))?))
    }
}

/// Machine word; balances, values and storage slots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct HexU256(pub U256);

impl TryFrom<String> for HexU256 {
    type Error = TestError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        match digits(&raw) {
            "" => Ok(HexU256(U256::zero())),
            d if d.len() > 64 => Err(TestError::Parse(format!("{} exceeds 256 bits", raw))),
            d => U256::from_str_radix(d, 16)
                .map(HexU256)
                .map_err(|e| TestError::Parse(format!("{}: {:?}", raw, e))),
        }
    }
}

/// Gas amounts and block header integers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct HexU64(pub u64);

impl TryFrom<String> for HexU64 {
    type Error = TestError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        match digits(&raw) {
            "" => Ok(HexU64(0)),
            d => u64::from_str_radix(d, 16)
                .map(HexU64)
                .map_err(|e| TestError::Parse(format!("{}: {}", raw, e))),
        }
    }
}

/// Account address
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct HexAddress(pub Address);

impl TryFrom<String> for HexAddress {
    type Error = TestError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Address::from_hex(&raw)
            .map(HexAddress)
            .map_err(|e| TestError::Parse(e.to_string()))
    }
}

/// One fixture file: case name to case
pub type VmTestFile = HashMap<String, VmTestCase>;

/// A single `VMTests` case
#[derive(Debug, Deserialize)]
pub struct VmTestCase {
    /// Block the code runs in
    pub env: VmEnv,
    /// Message that starts the frame
    pub exec: VmExec,
    /// Gas left afterwards; absent when the frame must fail
    pub gas: Option<HexU64>,
    /// Returned bytes
    pub out: Option<HexBytes>,
    /// Accounts present before execution
    #[serde(default)]
    pub pre: BTreeMap<HexAddress, AccountState>,
    /// Accounts expected afterwards; absent when the frame must fail
    pub post: Option<BTreeMap<HexAddress, AccountState>>,
}

impl VmTestCase {
    /// True unless the case omits both `gas` and `post`
    pub fn expects_success(&self) -> bool {
        self.gas.is_some() || self.post.is_some()
    }
}

/// Block header fields visible to the code
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmEnv {
    /// COINBASE
    pub current_coinbase: HexAddress,
    /// DIFFICULTY
    pub current_difficulty: HexU256,
    /// GASLIMIT
    pub current_gas_limit: HexU64,
    /// NUMBER
    pub current_number: HexU64,
    /// TIMESTAMP
    pub current_timestamp: HexU64,
}

/// The message executed by a case
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmExec {
    /// Account whose code runs
    pub address: HexAddress,
    /// CALLER
    pub caller: HexAddress,
    /// Bytecode
    pub code: HexBytes,
    /// CALLDATA
    pub data: HexBytes,
    /// Gas budget
    pub gas: HexU64,
    /// GASPRICE
    pub gas_price: HexU256,
    /// ORIGIN
    pub origin: HexAddress,
    /// CALLVALUE
    pub value: HexU256,
}

/// Account entry of `pre` or `post`
#[derive(Debug, Deserialize)]
pub struct AccountState {
    /// Wei held
    pub balance: HexU256,
    /// Deployed code
    pub code: HexBytes,
    /// Nonce
    pub nonce: HexU64,
    /// Slot to value
    #[serde(default)]
    pub storage: BTreeMap<HexU256, HexU256>,
}
