//! Jump destination analysis and its shared cache

use crate::opcode::Opcode;
use dashmap::DashMap;
use emerald_crypto::keccak256;
use emerald_primitives::H256;
use std::sync::{Arc, OnceLock};
use tracing::trace;

/// Offsets of JUMPDEST bytes that are opcodes rather than PUSH data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpDests {
    bits: Vec<u64>,
}

impl JumpDests {
    /// Scan `code` once, skipping PUSH immediates
    pub fn analyze(code: &[u8]) -> Self {
        let mut bits = vec![0u64; code.len() / 64 + 1];
        let mut pc = 0usize;
        while pc < code.len() {
            let byte = code[pc];
            if byte == Opcode::JUMPDEST as u8 {
                bits[pc / 64] |= 1 << (pc % 64);
            } else if let Some(op) = Opcode::from_byte(byte) {
                pc += op.push_size();
            }
            pc += 1;
        }
        Self { bits }
    }

    /// Whether `offset` is a valid jump target
    pub fn contains(&self, offset: usize) -> bool {
        self.bits
            .get(offset / 64)
            .is_some_and(|word| word & (1 << (offset % 64)) != 0)
    }
}

/// Analyses keyed by code hash, shared across interpreters and threads.
///
/// Analysis runs outside the map lock; when two threads race on the same
/// hash the first insert wins and both get equal results.
#[derive(Debug, Default)]
pub struct JumpDestCache {
    entries: DashMap<H256, Arc<JumpDests>>,
}

impl JumpDestCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide cache
    pub fn global() -> Arc<JumpDestCache> {
        static GLOBAL: OnceLock<Arc<JumpDestCache>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(JumpDestCache::new())).clone()
    }

    /// Analysis of `code`, computed at most once per hash.
    ///
    /// A zero `code_hash` means the hash is not known yet and is computed here.
    pub fn get_or_analyze(&self, code_hash: H256, code: &[u8]) -> Arc<JumpDests> {
        let code_hash = if code_hash.is_zero() {
            keccak256(code)
        } else {
            code_hash
        };
        if let Some(entry) = self.entries.get(&code_hash) {
            return entry.value().clone();
        }

        trace!(hash = %code_hash, len = code.len(), "analyzing jump destinations");
        let analysis = Arc::new(JumpDests::analyze(code));
        self.entries
            .entry(code_hash)
            .or_insert(analysis)
            .value()
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
