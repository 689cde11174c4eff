//! Precompiled contracts

use crate::contract::Contract;
use crate::error::{EvmError, FrameResult};
use crate::gas::to_word_size;
use crate::rules::{Fork, RuleSet};
use bytes::Bytes;
use emerald_crypto::{recover_address, ripemd160, sha256};
use emerald_primitives::{Address, BlockNumber, H256};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Natively implemented contract at a reserved address
pub trait Precompile: Send + Sync {
    /// Gas charged for `input`
    fn required_gas(&self, input: &[u8]) -> u64;

    fn run(&self, input: &[u8]) -> Result<Bytes, String>;
}

/// Signer recovery at address 0x01.
///
/// Input is `hash ++ v ++ r ++ s`, each a word, zero-padded when short. A
/// malformed signature is not an error: the output is just empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct EcRecover;

impl Precompile for EcRecover {
    fn required_gas(&self, _input: &[u8]) -> u64 {
        3000
    }

    fn run(&self, input: &[u8]) -> Result<Bytes, String> {
        let mut padded = [0u8; 128];
        let n = input.len().min(128);
        padded[..n].copy_from_slice(&input[..n]);

        let v = &padded[32..64];
        if v[..31].iter().any(|&b| b != 0) || !matches!(v[31], 27 | 28) {
            return Ok(Bytes::new());
        }
        let hash = H256::from_slice(&padded[..32]).map_err(|e| e.to_string())?;
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&padded[64..96]);
        s.copy_from_slice(&padded[96..128]);

        match recover_address(&hash, v[31] - 27, &r, &s) {
            Ok(signer) => Ok(Bytes::copy_from_slice(H256::from_word(signer.to_word()).as_bytes())),
            Err(err) => {
                debug!(%err, "ecrecover rejected signature");
                Ok(Bytes::new())
            }
        }
    }
}

/// SHA-256 hash at address 0x02
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hash;

impl Precompile for Sha256Hash {
    fn required_gas(&self, input: &[u8]) -> u64 {
        60 + 12 * to_word_size(input.len() as u64)
    }

    fn run(&self, input: &[u8]) -> Result<Bytes, String> {
        Ok(Bytes::copy_from_slice(sha256(input).as_bytes()))
    }
}

/// RIPEMD-160 hash at address 0x03, left-padded to a word
#[derive(Debug, Clone, Copy, Default)]
pub struct Ripemd160Hash;

impl Precompile for Ripemd160Hash {
    fn required_gas(&self, input: &[u8]) -> u64 {
        600 + 120 * to_word_size(input.len() as u64)
    }

    fn run(&self, input: &[u8]) -> Result<Bytes, String> {
        let mut out = [0u8; 32];
        out[12..].copy_from_slice(&ripemd160(input));
        Ok(Bytes::copy_from_slice(&out))
    }
}

/// Identity (data copy) at address 0x04
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Precompile for Identity {
    fn required_gas(&self, input: &[u8]) -> u64 {
        15 + 3 * to_word_size(input.len() as u64)
    }

    fn run(&self, input: &[u8]) -> Result<Bytes, String> {
        Ok(Bytes::copy_from_slice(input))
    }
}

struct Entry {
    fork: Fork,
    precompile: Arc<dyn Precompile>,
}

/// Reserved addresses and the fork from which each is active
#[derive(Default)]
pub struct PrecompileSet {
    entries: BTreeMap<Address, Entry>,
}

impl PrecompileSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// The four Frontier contracts at 0x01 to 0x04, shared process-wide
    pub fn builtin() -> Arc<PrecompileSet> {
        static BUILTIN: OnceLock<Arc<PrecompileSet>> = OnceLock::new();
        BUILTIN
            .get_or_init(|| {
                let mut set = PrecompileSet::new();
                set.register(Address::from_low_u8(1), Fork::Frontier, Arc::new(EcRecover));
                set.register(Address::from_low_u8(2), Fork::Frontier, Arc::new(Sha256Hash));
                set.register(Address::from_low_u8(3), Fork::Frontier, Arc::new(Ripemd160Hash));
                set.register(Address::from_low_u8(4), Fork::Frontier, Arc::new(Identity));
                Arc::new(set)
            })
            .clone()
    }

    /// Add or replace the precompile at `address`
    pub fn register(&mut self, address: Address, fork: Fork, precompile: Arc<dyn Precompile>) {
        self.entries.insert(address, Entry { fork, precompile });
    }

    /// Precompile at `address` if it is active at `block`
    pub fn get(
        &self,
        address: &Address,
        rules: &dyn RuleSet,
        block: BlockNumber,
    ) -> Option<Arc<dyn Precompile>> {
        self.entries
            .get(address)
            .filter(|entry| rules.is_active(entry.fork, block))
            .map(|entry| entry.precompile.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for PrecompileSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(addr, entry)| (addr, entry.fork)))
            .finish()
    }
}

/// Charge the precompile's price to `contract` and run it
pub fn run_precompiled(precompile: &dyn Precompile, input: &[u8], contract: &mut Contract) -> FrameResult {
    let gas = precompile.required_gas(input);
    if !contract.use_gas(gas) {
        contract.gas = 0;
        return FrameResult::failed(EvmError::OutOfGas);
    }
    debug!(gas, input_len = input.len(), "running precompile");
    match precompile.run(input) {
        Ok(output) => FrameResult::returned(output, contract.gas),
        Err(err) => {
            contract.gas = 0;
            FrameResult::failed(EvmError::Precompile(err))
        }
    }
}
