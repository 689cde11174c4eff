//! SSTORE pricing and refunds

use super::GasTable;
use emerald_primitives::U256;
use std::collections::HashMap;

/// Gas charged and refund counter delta for one SSTORE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SstoreCost {
    pub gas: u64,
    pub refund: i64,
}

/// Slot values as first seen by SSTORE within one call frame.
///
/// Entries are written on the first SSTORE to a slot and never change
/// afterwards.
#[derive(Debug, Clone, Default)]
pub struct OriginalStorage {
    values: HashMap<U256, U256>,
}

impl OriginalStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Original value of `key`, recording `current` if the slot is unseen
    pub fn get_or_record(&mut self, key: U256, current: U256) -> U256 {
        *self.values.entry(key).or_insert(current)
    }

    pub fn get(&self, key: &U256) -> Option<U256> {
        self.values.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Pre-EIP-1283 pricing: set, clear (with refund) or reset
pub fn legacy_sstore_gas(table: &GasTable, current: U256, new: U256) -> SstoreCost {
    if current.is_zero() && !new.is_zero() {
        SstoreCost {
            gas: table.sstore_set,
            refund: 0,
        }
    } else if !current.is_zero() && new.is_zero() {
        SstoreCost {
            gas: table.sstore_reset,
            refund: table.sstore_clear_refund as i64,
        }
    } else {
        SstoreCost {
            gas: table.sstore_reset,
            refund: 0,
        }
    }
}

/// EIP-1283 net gas metering
pub fn eip1283_sstore_gas(table: &GasTable, original: U256, current: U256, new: U256) -> SstoreCost {
    let clear_refund = table.sstore_clear_refund as i64;

    if new == current {
        return SstoreCost {
            gas: table.sstore_noop,
            refund: 0,
        };
    }

    if original == current {
        if original.is_zero() {
            return SstoreCost {
                gas: table.sstore_set,
                refund: 0,
            };
        }
        let refund = if new.is_zero() { clear_refund } else { 0 };
        return SstoreCost {
            gas: table.sstore_reset,
            refund,
        };
    }

    // Dirty slot
    let mut refund = 0i64;
    if !original.is_zero() {
        if current.is_zero() {
            refund -= clear_refund;
        }
        if new.is_zero() {
            refund += clear_refund;
        }
    }
    if original == new {
        if original.is_zero() {
            refund += table.sstore_reset_clear_refund as i64;
        } else {
            refund += table.sstore_reset_refund as i64;
        }
    }
    SstoreCost {
        gas: table.sstore_noop,
        refund,
    }
}
