//! EVM opcode definitions

use crate::rules::Fork;
use std::fmt;

macro_rules! opcodes {
    ($($name:ident = $byte:literal, $pops:literal, $pushes:literal;)*) => {
        /// EVM opcodes (see Yellow Paper Appendix H)
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        #[allow(missing_docs, clippy::upper_case_acronyms)]
        pub enum Opcode {
            $($name = $byte,)*
        }

        impl Opcode {
            /// Try to convert from byte
            pub const fn from_byte(byte: u8) -> Option<Self> {
                match byte {
                    $($byte => Some(Self::$name),)*
                    _ => None,
                }
            }

            /// Mnemonic
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$name => stringify!($name),)*
                }
            }

            /// Items popped and pushed
            pub const fn stack_io(self) -> (usize, usize) {
                match self {
                    $(Self::$name => ($pops, $pushes),)*
                }
            }
        }
    };
}

opcodes! {
    STOP = 0x00, 0, 0;
    ADD = 0x01, 2, 1;
    MUL = 0x02, 2, 1;
    SUB = 0x03, 2, 1;
    DIV = 0x04, 2, 1;
    SDIV = 0x05, 2, 1;
    MOD = 0x06, 2, 1;
    SMOD = 0x07, 2, 1;
    ADDMOD = 0x08, 3, 1;
    MULMOD = 0x09, 3, 1;
    EXP = 0x0A, 2, 1;
    SIGNEXTEND = 0x0B, 2, 1;

    LT = 0x10, 2, 1;
    GT = 0x11, 2, 1;
    SLT = 0x12, 2, 1;
    SGT = 0x13, 2, 1;
    EQ = 0x14, 2, 1;
    ISZERO = 0x15, 1, 1;
    AND = 0x16, 2, 1;
    OR = 0x17, 2, 1;
    XOR = 0x18, 2, 1;
    NOT = 0x19, 1, 1;
    BYTE = 0x1A, 2, 1;
    SHL = 0x1B, 2, 1;
    SHR = 0x1C, 2, 1;
    SAR = 0x1D, 2, 1;

    SHA3 = 0x20, 2, 1;

    ADDRESS = 0x30, 0, 1;
    BALANCE = 0x31, 1, 1;
    ORIGIN = 0x32, 0, 1;
    CALLER = 0x33, 0, 1;
    CALLVALUE = 0x34, 0, 1;
    CALLDATALOAD = 0x35, 1, 1;
    CALLDATASIZE = 0x36, 0, 1;
    CALLDATACOPY = 0x37, 3, 0;
    CODESIZE = 0x38, 0, 1;
    CODECOPY = 0x39, 3, 0;
    GASPRICE = 0x3A, 0, 1;
    EXTCODESIZE = 0x3B, 1, 1;
    EXTCODECOPY = 0x3C, 4, 0;
    RETURNDATASIZE = 0x3D, 0, 1;
    RETURNDATACOPY = 0x3E, 3, 0;
    EXTCODEHASH = 0x3F, 1, 1;

    BLOCKHASH = 0x40, 1, 1;
    COINBASE = 0x41, 0, 1;
    TIMESTAMP = 0x42, 0, 1;
    NUMBER = 0x43, 0, 1;
    DIFFICULTY = 0x44, 0, 1;
    GASLIMIT = 0x45, 0, 1;

    POP = 0x50, 1, 0;
    MLOAD = 0x51, 1, 1;
    MSTORE = 0x52, 2, 0;
    MSTORE8 = 0x53, 2, 0;
    SLOAD = 0x54, 1, 1;
    SSTORE = 0x55, 2, 0;
    JUMP = 0x56, 1, 0;
    JUMPI = 0x57, 2, 0;
    PC = 0x58, 0, 1;
    MSIZE = 0x59, 0, 1;
    GAS = 0x5A, 0, 1;
    JUMPDEST = 0x5B, 0, 0;

    PUSH1 = 0x60, 0, 1;
    PUSH2 = 0x61, 0, 1;
    PUSH3 = 0x62, 0, 1;
    PUSH4 = 0x63, 0, 1;
    PUSH5 = 0x64, 0, 1;
    PUSH6 = 0x65, 0, 1;
    PUSH7 = 0x66, 0, 1;
    PUSH8 = 0x67, 0, 1;
    PUSH9 = 0x68, 0, 1;
    PUSH10 = 0x69, 0, 1;
    PUSH11 = 0x6A, 0, 1;
    PUSH12 = 0x6B, 0, 1;
    PUSH13 = 0x6C, 0, 1;
    PUSH14 = 0x6D, 0, 1;
    PUSH15 = 0x6E, 0, 1;
    PUSH16 = 0x6F, 0, 1;
    PUSH17 = 0x70, 0, 1;
    PUSH18 = 0x71, 0, 1;
    PUSH19 = 0x72, 0, 1;
    PUSH20 = 0x73, 0, 1;
    PUSH21 = 0x74, 0, 1;
    PUSH22 = 0x75, 0, 1;
    PUSH23 = 0x76, 0, 1;
    PUSH24 = 0x77, 0, 1;
    PUSH25 = 0x78, 0, 1;
    PUSH26 = 0x79, 0, 1;
    PUSH27 = 0x7A, 0, 1;
    PUSH28 = 0x7B, 0, 1;
    PUSH29 = 0x7C, 0, 1;
    PUSH30 = 0x7D, 0, 1;
    PUSH31 = 0x7E, 0, 1;
    PUSH32 = 0x7F, 0, 1;

    DUP1 = 0x80, 1, 2;
    DUP2 = 0x81, 2, 3;
    DUP3 = 0x82, 3, 4;
    DUP4 = 0x83, 4, 5;
    DUP5 = 0x84, 5, 6;
    DUP6 = 0x85, 6, 7;
    DUP7 = 0x86, 7, 8;
    DUP8 = 0x87, 8, 9;
    DUP9 = 0x88, 9, 10;
    DUP10 = 0x89, 10, 11;
    DUP11 = 0x8A, 11, 12;
    DUP12 = 0x8B, 12, 13;
    DUP13 = 0x8C, 13, 14;
    DUP14 = 0x8D, 14, 15;
    DUP15 = 0x8E, 15, 16;
    DUP16 = 0x8F, 16, 17;

    SWAP1 = 0x90, 2, 2;
    SWAP2 = 0x91, 3, 3;
    SWAP3 = 0x92, 4, 4;
    SWAP4 = 0x93, 5, 5;
    SWAP5 = 0x94, 6, 6;
    SWAP6 = 0x95, 7, 7;
    SWAP7 = 0x96, 8, 8;
    SWAP8 = 0x97, 9, 9;
    SWAP9 = 0x98, 10, 10;
    SWAP10 = 0x99, 11, 11;
    SWAP11 = 0x9A, 12, 12;
    SWAP12 = 0x9B, 13, 13;
    SWAP13 = 0x9C, 14, 14;
    SWAP14 = 0x9D, 15, 15;
    SWAP15 = 0x9E, 16, 16;
    SWAP16 = 0x9F, 17, 17;

    LOG0 = 0xA0, 2, 0;
    LOG1 = 0xA1, 3, 0;
    LOG2 = 0xA2, 4, 0;
    LOG3 = 0xA3, 5, 0;
    LOG4 = 0xA4, 6, 0;

    CREATE = 0xF0, 3, 1;
    CALL = 0xF1, 7, 1;
    CALLCODE = 0xF2, 7, 1;
    RETURN = 0xF3, 2, 0;
    DELEGATECALL = 0xF4, 6, 1;
    CREATE2 = 0xF5, 4, 1;
    STATICCALL = 0xFA, 6, 1;
    REVERT = 0xFD, 2, 0;
    INVALID = 0xFE, 0, 0;
    SELFDESTRUCT = 0xFF, 1, 0;
}

impl Opcode {
    /// Immediate bytes following PUSHn; 0 for every other opcode
    pub fn push_size(self) -> usize {
        match self as u8 {
            b @ 0x60..=0x7F => usize::from(b - 0x5F),
            _ => 0,
        }
    }

    pub fn is_push(self) -> bool {
        self.push_size() != 0
    }

    /// n of DUPn, else 0
    pub fn dup_depth(self) -> usize {
        match self as u8 {
            b @ 0x80..=0x8F => usize::from(b - 0x7F),
            _ => 0,
        }
    }

    /// n of SWAPn, else 0
    pub fn swap_depth(self) -> usize {
        match self as u8 {
            b @ 0x90..=0x9F => usize::from(b - 0x8F),
            _ => 0,
        }
    }

    /// Topics popped by LOGn, else 0
    pub fn log_topics(self) -> usize {
        match self as u8 {
            b @ 0xA0..=0xA4 => usize::from(b - 0xA0),
            _ => 0,
        }
    }

    /// First fork whose jump table contains this opcode.
    ///
    /// `INVALID` is never part of a jump table.
    pub fn introduced_in(self) -> Option<Fork> {
        match self {
            Opcode::INVALID => None,
            Opcode::DELEGATECALL => Some(Fork::Homestead),
            Opcode::REVERT
            | Opcode::RETURNDATASIZE
            | Opcode::RETURNDATACOPY
            | Opcode::STATICCALL => Some(Fork::Atlantis),
            Opcode::SHL | Opcode::SHR | Opcode::SAR | Opcode::CREATE2 | Opcode::EXTCODEHASH => {
                Some(Fork::Agharta)
            }
            _ => Some(Fork::Frontier),
        }
    }

    /// Forbidden inside a read-only call
    pub fn is_state_modifying(self) -> bool {
        matches!(
            self,
            Opcode::SSTORE
                | Opcode::LOG0
                | Opcode::LOG1
                | Opcode::LOG2
                | Opcode::LOG3
                | Opcode::LOG4
                | Opcode::CREATE
                | Opcode::CREATE2
                | Opcode::SELFDESTRUCT
        )
    }

    /// Replaces the return data buffer with its result
    pub fn is_returning(self) -> bool {
        matches!(
            self,
            Opcode::CALL
                | Opcode::CALLCODE
                | Opcode::DELEGATECALL
                | Opcode::STATICCALL
                | Opcode::CREATE
                | Opcode::CREATE2
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_byte() {
        assert_eq!(Opcode::from_byte(0x00), Some(Opcode::STOP));
        assert_eq!(Opcode::from_byte(0x20), Some(Opcode::SHA3));
        assert_eq!(Opcode::from_byte(0x60), Some(Opcode::PUSH1));
        assert_eq!(Opcode::from_byte(0xFF), Some(Opcode::SELFDESTRUCT));
        assert_eq!(Opcode::from_byte(0x0C), None);
        assert_eq!(Opcode::from_byte(0x5F), None);
        assert_eq!(Opcode::from_byte(0xEF), None);
    }

    #[test]
    fn test_from_byte_round_trips_discriminant() {
        for byte in 0..=255u8 {
            if let Some(op) = Opcode::from_byte(byte) {
                assert_eq!(op as u8, byte);
            }
        }
    }

    #[test]
    fn test_push_size() {
        for i in 1..=32u8 {
            let op = Opcode::from_byte(0x5F + i).unwrap();
            assert_eq!(op.push_size(), i as usize);
            assert!(op.is_push());
        }
        assert_eq!(Opcode::ADD.push_size(), 0);
        assert!(!Opcode::POP.is_push());
    }

    #[test]
    fn test_dup_swap_stack_requirements() {
        for n in 1..=16u8 {
            let dup = Opcode::from_byte(0x7F + n).unwrap();
            assert_eq!(dup.dup_depth(), n as usize);
            assert_eq!(dup.stack_io(), (n as usize, n as usize + 1));

            let swap = Opcode::from_byte(0x8F + n).unwrap();
            assert_eq!(swap.swap_depth(), n as usize);
            assert_eq!(swap.stack_io(), (n as usize + 1, n as usize + 1));
        }
    }

    #[test]
    fn test_log_topics() {
        for n in 0..=4u8 {
            let log = Opcode::from_byte(0xA0 + n).unwrap();
            assert_eq!(log.log_topics(), n as usize);
            assert_eq!(log.stack_io().0, n as usize + 2);
        }
        assert_eq!(Opcode::ADD.log_topics(), 0);
    }

    #[test]
    fn test_introduced_in() {
        assert_eq!(Opcode::ADD.introduced_in(), Some(Fork::Frontier));
        assert_eq!(Opcode::DELEGATECALL.introduced_in(), Some(Fork::Homestead));
        assert_eq!(Opcode::STATICCALL.introduced_in(), Some(Fork::Atlantis));
        assert_eq!(Opcode::CREATE2.introduced_in(), Some(Fork::Agharta));
        assert_eq!(Opcode::INVALID.introduced_in(), None);
    }

    #[test]
    fn test_flags() {
        assert!(Opcode::SSTORE.is_state_modifying());
        assert!(Opcode::LOG3.is_state_modifying());
        assert!(!Opcode::CALL.is_state_modifying());
        assert!(Opcode::CREATE2.is_returning());
        assert!(!Opcode::RETURN.is_returning());
    }

    #[test]
    fn test_display() {
        assert_eq!(Opcode::SELFDESTRUCT.to_string(), "SELFDESTRUCT");
        assert_eq!(Opcode::PUSH32.to_string(), "PUSH32");
    }
}
