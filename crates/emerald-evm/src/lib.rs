//! # emerald-evm
//!
//! EVM bytecode interpreter core.
//!
//! This crate provides:
//! - Word stack, byte memory and jump destination analysis
//! - Fork-aware gas schedule with net-metered SSTORE refunds
//! - Opcode dispatch and the interpreter loop
//! - Precompiled contract dispatch
//! - An in-memory [`Environment`] for running contracts without a database
//!
//! The interpreter is host-agnostic: world state, sub-calls and fork rules
//! are reached through the [`Environment`] and [`RuleSet`] traits.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod context;
pub mod contract;
pub mod environment;
pub mod error;
pub mod gas;
mod instructions;
pub mod interpreter;
pub mod jump_table;
pub mod jumpdest;
pub mod memory;
pub mod memory_env;
pub mod opcode;
pub mod precompile;
pub mod rules;
pub mod stack;
pub mod word;

pub use context::{BlockContext, CallKind, CallOutcome, CallParams, CreateParams, TxContext};
pub use contract::Contract;
pub use environment::{Environment, StateReader};
pub use error::{EvmError, EvmResult, FrameResult, Log, Outcome};
pub use gas::{Cost, GasTable, OriginalStorage};
pub use interpreter::{Interpreter, ResolvedRules};
pub use jump_table::JumpTable;
pub use jumpdest::{JumpDestCache, JumpDests};
pub use memory::Memory;
pub use memory_env::{create2_address, create_address, Account, MemoryEnv};
pub use opcode::Opcode;
pub use precompile::{Precompile, PrecompileSet};
pub use rules::{ChainConfig, ConfigError, Fork, RuleSet};
pub use stack::Stack;
