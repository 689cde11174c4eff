//! Fork activation rules and chain configuration

use crate::gas::GasTable;
use emerald_primitives::BlockNumber;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Protocol upgrades that change interpreter behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Fork {
    /// Genesis rules
    Frontier,
    /// DELEGATECALL; failed code deposit aborts creation
    Homestead,
    /// EIP-150: IO repricing and all-but-one-64th call gas
    GasReprice,
    /// EIP-160: EXP repricing
    Diehard,
    /// REVERT, RETURNDATASIZE, RETURNDATACOPY, STATICCALL and read-only calls
    Atlantis,
    /// SHL, SHR, SAR, CREATE2 and EXTCODEHASH
    Agharta,
    /// EIP-1283 net gas metering for SSTORE
    Eip1283,
}

impl Fork {
    /// Forks that must activate in this order
    const ORDERED: [Fork; 5] = [
        Fork::Homestead,
        Fork::GasReprice,
        Fork::Diehard,
        Fork::Atlantis,
        Fork::Agharta,
    ];
}

impl fmt::Display for Fork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Fork activation queries used by the interpreter
pub trait RuleSet: Send + Sync {
    /// Whether `fork` is active at `block`
    fn is_active(&self, fork: Fork, block: BlockNumber) -> bool;

    /// Gas prices in effect at `block`
    fn gas_table(&self, block: BlockNumber) -> GasTable;
}

/// Chain configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid chain config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("fork {later} activates at block {later_block}, before {earlier} at block {earlier_block}")]
    ForkOrder {
        earlier: Fork,
        earlier_block: BlockNumber,
        later: Fork,
        later_block: BlockNumber,
    },
}

/// Activation blocks for each fork; `None` means never
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChainConfig {
    pub homestead: Option<BlockNumber>,
    pub gas_reprice: Option<BlockNumber>,
    pub diehard: Option<BlockNumber>,
    pub atlantis: Option<BlockNumber>,
    pub agharta: Option<BlockNumber>,
    pub eip1283: Option<BlockNumber>,
    /// Gas tables replacing the fork presets from a given block on
    pub gas_tables: BTreeMap<BlockNumber, GasTable>,
}

impl ChainConfig {
    /// Frontier rules forever
    pub fn frontier() -> Self {
        Self::default()
    }

    /// Ethereum Classic mainnet activation blocks
    pub fn mainnet() -> Self {
        Self {
            homestead: Some(1_150_000),
            gas_reprice: Some(2_500_000),
            diehard: Some(3_000_000),
            atlantis: Some(8_772_000),
            agharta: Some(9_573_000),
            eip1283: None,
            gas_tables: BTreeMap::new(),
        }
    }

    /// Every fork active from genesis
    pub fn all_forks() -> Self {
        Self {
            homestead: Some(0),
            gas_reprice: Some(0),
            diehard: Some(0),
            atlantis: Some(0),
            agharta: Some(0),
            eip1283: Some(0),
            gas_tables: BTreeMap::new(),
        }
    }

    /// Parse and validate a JSON chain config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ChainConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set or clear the activation block of `fork`
    pub fn with_fork(mut self, fork: Fork, block: Option<BlockNumber>) -> Self {
        match fork {
            Fork::Frontier => {}
            Fork::Homestead => self.homestead = block,
            Fork::GasReprice => self.gas_reprice = block,
            Fork::Diehard => self.diehard = block,
            Fork::Atlantis => self.atlantis = block,
            Fork::Agharta => self.agharta = block,
            Fork::Eip1283 => self.eip1283 = block,
        }
        self
    }

    /// Activation block of `fork`
    pub fn activation(&self, fork: Fork) -> Option<BlockNumber> {
        match fork {
            Fork::Frontier => Some(0),
            Fork::Homestead => self.homestead,
            Fork::GasReprice => self.gas_reprice,
            Fork::Diehard => self.diehard,
            Fork::Atlantis => self.atlantis,
            Fork::Agharta => self.agharta,
            Fork::Eip1283 => self.eip1283,
        }
    }

    /// Check that scheduled forks activate in protocol order
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scheduled: Vec<(Fork, BlockNumber)> = Fork::ORDERED
            .iter()
            .filter_map(|fork| self.activation(*fork).map(|block| (*fork, block)))
            .collect();
        for pair in scheduled.windows(2) {
            let (earlier, earlier_block) = pair[0];
            let (later, later_block) = pair[1];
            if later_block < earlier_block {
                return Err(ConfigError::ForkOrder {
                    earlier,
                    earlier_block,
                    later,
                    later_block,
                });
            }
        }
        Ok(())
    }
}

impl RuleSet for ChainConfig {
    fn is_active(&self, fork: Fork, block: BlockNumber) -> bool {
        self.activation(fork).is_some_and(|at| block >= at)
    }

    fn gas_table(&self, block: BlockNumber) -> GasTable {
        if let Some((_, table)) = self.gas_tables.range(..=block).next_back() {
            return *table;
        }
        if self.is_active(Fork::Diehard, block) {
            GasTable::EIP160
        } else if self.is_active(Fork::GasReprice, block) {
            GasTable::EIP150
        } else {
            GasTable::HOMESTEAD
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frontier_only() {
        let config = ChainConfig::frontier();
        assert!(config.is_active(Fork::Frontier, 0));
        assert!(!config.is_active(Fork::Homestead, u64::MAX));
        assert_eq!(config.gas_table(1_000_000), GasTable::HOMESTEAD);
    }

    #[test]
    fn test_mainnet_gas_tables() {
        let config = ChainConfig::mainnet();
        assert_eq!(config.gas_table(2_499_999), GasTable::HOMESTEAD);
        assert_eq!(config.gas_table(2_500_000), GasTable::EIP150);
        assert_eq!(config.gas_table(3_000_000), GasTable::EIP160);
        assert!(config.is_active(Fork::Atlantis, 8_772_000));
        assert!(!config.is_active(Fork::Agharta, 9_572_999));
        assert!(!config.is_active(Fork::Eip1283, u64::MAX));
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "homestead": 0,
            "gasReprice": 10,
            "atlantis": 20,
            "gasTables": { "30": { "sload": 800 } }
        }"#;
        let config = ChainConfig::from_json(json).unwrap();
        assert!(config.is_active(Fork::Homestead, 0));
        assert!(!config.is_active(Fork::Diehard, 100));
        assert_eq!(config.gas_table(15), GasTable::EIP150);
        assert_eq!(config.gas_table(30).sload, 800);
        assert_eq!(config.gas_table(30).calls, GasTable::HOMESTEAD.calls);
    }

    #[test]
    fn test_fork_order_validation() {
        let config = ChainConfig::frontier()
            .with_fork(Fork::Homestead, Some(100))
            .with_fork(Fork::GasReprice, Some(50));
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ForkOrder {
                earlier: Fork::Homestead,
                later: Fork::GasReprice,
                ..
            }
        ));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            ChainConfig::from_json("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_eip1283_is_independent() {
        let config = ChainConfig::frontier().with_fork(Fork::Eip1283, Some(5));
        assert!(config.validate().is_ok());
        assert!(config.is_active(Fork::Eip1283, 5));
        assert!(!config.is_active(Fork::Atlantis, 5));
    }
}
