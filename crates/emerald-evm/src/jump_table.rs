//! Opcodes available under a set of fork rules

use crate::opcode::Opcode;
use crate::rules::RuleSet;
use emerald_primitives::BlockNumber;

/// Dispatch table from byte to active opcode; absent entries are invalid
#[derive(Debug, Clone)]
pub struct JumpTable {
    entries: [Option<Opcode>; 256],
}

impl JumpTable {
    /// Table for the rules active at `block`
    pub fn new(rules: &dyn RuleSet, block: BlockNumber) -> Self {
        let mut entries = [None; 256];
        for (byte, entry) in entries.iter_mut().enumerate() {
            *entry = Opcode::from_byte(byte as u8).filter(|op| {
                op.introduced_in()
                    .is_some_and(|fork| rules.is_active(fork, block))
            });
        }
        Self { entries }
    }

    /// Active opcode for `byte`
    pub fn get(&self, byte: u8) -> Option<Opcode> {
        self.entries[byte as usize]
    }

    /// Number of active opcodes
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{ChainConfig, Fork};

    #[test]
    fn test_frontier_table() {
        let table = JumpTable::new(&ChainConfig::frontier(), 0);
        assert_eq!(table.get(0x01), Some(Opcode::ADD));
        assert_eq!(table.get(0xF4), None);
        assert_eq!(table.get(0xFD), None);
        assert_eq!(table.get(0xFE), None);
        assert_eq!(table.get(0x1B), None);
        assert_eq!(table.get(0x0C), None);
    }

    #[test]
    fn test_table_grows_with_forks() {
        let config = ChainConfig::mainnet();
        let frontier = JumpTable::new(&config, 0);
        let homestead = JumpTable::new(&config, 1_150_000);
        let atlantis = JumpTable::new(&config, 8_772_000);
        let agharta = JumpTable::new(&config, 9_573_000);

        assert_eq!(homestead.len(), frontier.len() + 1);
        assert_eq!(homestead.get(0xF4), Some(Opcode::DELEGATECALL));
        assert_eq!(atlantis.len(), homestead.len() + 4);
        assert_eq!(atlantis.get(0xFA), Some(Opcode::STATICCALL));
        assert_eq!(agharta.len(), atlantis.len() + 5);
        assert_eq!(agharta.get(0xF5), Some(Opcode::CREATE2));
        assert_eq!(agharta.get(0xFE), None);
    }

    #[test]
    fn test_all_forks_table() {
        let config = ChainConfig::all_forks();
        let table = JumpTable::new(&config, 0);
        assert!(config.is_active(Fork::Agharta, 0));
        assert_eq!(table.get(0x3F), Some(Opcode::EXTCODEHASH));
        assert!(!table.is_empty());
    }
}
