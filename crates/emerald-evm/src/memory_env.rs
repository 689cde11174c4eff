//! In-memory world state
//!
//! [`MemoryEnv`] implements [`Environment`] over plain maps. Nested calls and
//! creations run a fresh interpreter against the same environment and share
//! its resolved fork rules; a snapshot of the world state is taken before
//! each one and restored when it does not succeed.

use crate::context::{BlockContext, CallKind, CallOutcome, CallParams, CreateParams, TxContext};
use crate::contract::Contract;
use crate::environment::{Environment, StateReader};
use crate::error::{EvmError, FrameResult, Log, Outcome};
use crate::gas::cost;
use crate::interpreter::{Interpreter, ResolvedRules};
use crate::jumpdest::JumpDestCache;
use crate::precompile::PrecompileSet;
use crate::rules::{ChainConfig, Fork, RuleSet};
use bytes::Bytes;
use emerald_crypto::{keccak256, KECCAK_EMPTY};
use emerald_primitives::{Address, H256, U256};
use rlp::RlpStream;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// Account state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Account {
    pub balance: U256,
    pub nonce: u64,
    pub code: Bytes,
    pub storage: BTreeMap<U256, U256>,
}

impl Account {
    /// Account holding only a balance
    pub fn with_balance(balance: U256) -> Self {
        Self {
            balance,
            ..Default::default()
        }
    }

    /// Account holding code
    pub fn with_code(code: Bytes) -> Self {
        Self {
            code,
            ..Default::default()
        }
    }
}

/// Everything a failed call rolls back
#[derive(Debug, Clone, Default)]
struct WorldState {
    accounts: BTreeMap<Address, Account>,
    refund: i64,
    suicides: BTreeSet<Address>,
    logs: Vec<Log>,
}

/// Map-backed [`Environment`]
pub struct MemoryEnv {
    config: ChainConfig,
    block: BlockContext,
    tx: TxContext,
    state: WorldState,
    block_hashes: BTreeMap<u64, H256>,
    depth: usize,
    read_only: bool,
    return_data: Bytes,
    precompiles: Arc<PrecompileSet>,
    jumpdests: Arc<JumpDestCache>,
    /// Built on first execution for the current block
    resolved: Option<Arc<ResolvedRules>>,
}

impl MemoryEnv {
    pub fn new(config: ChainConfig) -> Self {
        Self {
            config,
            block: BlockContext::default(),
            tx: TxContext::default(),
            state: WorldState::default(),
            block_hashes: BTreeMap::new(),
            depth: 0,
            read_only: false,
            return_data: Bytes::new(),
            precompiles: PrecompileSet::builtin(),
            jumpdests: JumpDestCache::global(),
            resolved: None,
        }
    }

    pub fn with_block(mut self, block: BlockContext) -> Self {
        self.block = block;
        self.resolved = None;
        self
    }

    pub fn with_tx(mut self, tx: TxContext) -> Self {
        self.tx = tx;
        self
    }

    pub fn with_precompiles(mut self, precompiles: Arc<PrecompileSet>) -> Self {
        self.precompiles = precompiles;
        self
    }

    pub fn with_jumpdest_cache(mut self, cache: Arc<JumpDestCache>) -> Self {
        self.jumpdests = cache;
        self
    }

    /// Make BLOCKHASH return `hash` for block `number`
    pub fn with_block_hash(mut self, number: u64, hash: H256) -> Self {
        self.block_hashes.insert(number, hash);
        self
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn insert_account(&mut self, address: Address, account: Account) {
        self.state.accounts.insert(address, account);
    }

    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.state.accounts.get(address)
    }

    /// Write a storage slot directly, bypassing gas metering
    pub fn insert_storage(&mut self, address: Address, key: U256, value: U256) {
        self.account_mut(address).storage.insert(key, value);
    }

    /// Refund counter accumulated so far
    pub fn refund(&self) -> i64 {
        self.state.refund
    }

    /// Logs emitted by successful frames
    pub fn logs(&self) -> &[Log] {
        &self.state.logs
    }

    /// Run `contract` at the current depth with this environment's
    /// precompiles and jump destination cache
    pub fn execute(&mut self, contract: &mut Contract, input: Bytes) -> FrameResult {
        let rules = self.resolved_rules();
        let precompiles = self.precompiles.clone();
        let jumpdests = self.jumpdests.clone();
        Interpreter::with_rules(self, rules)
            .with_precompiles(precompiles)
            .with_jumpdest_cache(jumpdests)
            .run(contract, input)
    }

    /// Dispatch and gas tables for the current block, resolved once
    pub fn resolved_rules(&mut self) -> Arc<ResolvedRules> {
        match &self.resolved {
            Some(rules) if rules.block == self.block.number => rules.clone(),
            _ => {
                let rules = Arc::new(ResolvedRules::new(&self.config, self.block.number));
                self.resolved = Some(rules.clone());
                rules
            }
        }
    }

    fn account_mut(&mut self, address: Address) -> &mut Account {
        self.state.accounts.entry(address).or_default()
    }

    fn transfer(&mut self, from: Address, to: Address, value: U256) {
        let sender = self.account_mut(from);
        sender.balance = sender.balance.saturating_sub(value);
        let recipient = self.account_mut(to);
        recipient.balance = recipient.balance.saturating_add(value);
    }
}

/// CREATE address: `keccak256(rlp([sender, nonce]))[12..]`
pub fn create_address(sender: &Address, nonce: u64) -> Address {
    let mut stream = RlpStream::new_list(2);
    stream.append(&sender.as_bytes().to_vec());
    stream.append(&nonce);
    let hash = keccak256(&stream.out());
    Address::from_word(hash.to_word())
}

/// CREATE2 address: `keccak256(0xff ++ sender ++ salt ++ keccak256(init_code))[12..]`
pub fn create2_address(sender: &Address, salt: &H256, init_code: &[u8]) -> Address {
    let mut buf = Vec::with_capacity(1 + 20 + 32 + 32);
    buf.push(0xFF);
    buf.extend_from_slice(sender.as_bytes());
    buf.extend_from_slice(salt.as_bytes());
    buf.extend_from_slice(keccak256(init_code).as_bytes());
    Address::from_word(keccak256(&buf).to_word())
}

impl StateReader for MemoryEnv {
    fn exists(&self, address: &Address) -> bool {
        self.state.accounts.contains_key(address)
    }

    fn balance(&self, address: &Address) -> U256 {
        self.account(address).map(|a| a.balance).unwrap_or_default()
    }

    fn code(&self, address: &Address) -> Bytes {
        self.account(address).map(|a| a.code.clone()).unwrap_or_default()
    }

    fn code_size(&self, address: &Address) -> usize {
        self.account(address).map_or(0, |a| a.code.len())
    }

    fn code_hash(&self, address: &Address) -> H256 {
        match self.account(address) {
            Some(account) if account.code.is_empty() => KECCAK_EMPTY,
            Some(account) => keccak256(&account.code),
            None => H256::ZERO,
        }
    }

    fn storage(&self, address: &Address, key: U256) -> U256 {
        self.account(address)
            .and_then(|a| a.storage.get(&key).copied())
            .unwrap_or_default()
    }

    fn has_suicided(&self, address: &Address) -> bool {
        self.state.suicides.contains(address)
    }

    fn block_hash(&self, number: u64) -> H256 {
        self.block_hashes.get(&number).copied().unwrap_or(H256::ZERO)
    }
}

impl Environment for MemoryEnv {
    fn rules(&self) -> &dyn RuleSet {
        &self.config
    }

    fn block(&self) -> &BlockContext {
        &self.block
    }

    fn tx(&self) -> &TxContext {
        &self.tx
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn set_depth(&mut self, depth: usize) {
        self.depth = depth;
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn return_data(&self) -> &Bytes {
        &self.return_data
    }

    fn set_return_data(&mut self, data: Bytes) {
        self.return_data = data;
    }

    fn set_storage(&mut self, address: &Address, key: U256, value: U256) {
        let storage = &mut self.account_mut(*address).storage;
        if value.is_zero() {
            storage.remove(&key);
        } else {
            storage.insert(key, value);
        }
    }

    fn add_refund(&mut self, delta: i64) {
        self.state.refund += delta;
    }

    fn suicide(&mut self, address: &Address, beneficiary: &Address) {
        let balance = self.balance(address);
        let recipient = self.account_mut(*beneficiary);
        recipient.balance = recipient.balance.saturating_add(balance);
        self.account_mut(*address).balance = U256::zero();
        self.state.suicides.insert(*address);
    }

    fn log(&mut self, log: Log) {
        self.state.logs.push(log);
    }

    fn call(&mut self, params: CallParams) -> CallOutcome {
        if params.kind.transfers_value() && self.balance(&params.caller) < params.value {
            return CallOutcome::rejected(EvmError::InsufficientBalance, params.gas);
        }

        let snapshot = self.state.clone();
        let read_only = self.read_only;
        match params.kind {
            CallKind::Call | CallKind::CallCode => {
                self.transfer(params.caller, params.address, params.value)
            }
            CallKind::StaticCall => {
                self.account_mut(params.address);
                self.read_only = true;
            }
            CallKind::DelegateCall => {}
        }

        let code = self.code(&params.code_address);
        let mut contract = Contract::new(params.caller, params.address, params.value, params.gas)
            .with_code(code, None)
            .with_code_address(params.code_address);
        let result = self.execute(&mut contract, params.input);
        self.read_only = read_only;

        if !result.is_success() {
            self.state = snapshot;
        }
        debug!(
            kind = ?params.kind,
            to = %params.address,
            outcome = ?result.outcome,
            gas_left = result.gas_left,
            "call finished"
        );
        CallOutcome {
            outcome: result.outcome,
            output: result.output,
            gas_left: result.gas_left,
            created: None,
        }
    }

    fn create(&mut self, params: CreateParams) -> CallOutcome {
        if self.balance(&params.caller) < params.value {
            return CallOutcome::rejected(EvmError::InsufficientBalance, params.gas);
        }

        let sender = self.account_mut(params.caller);
        let nonce = sender.nonce;
        sender.nonce += 1;
        let address = match &params.salt {
            Some(salt) => create2_address(&params.caller, salt, &params.init_code),
            None => create_address(&params.caller, nonce),
        };

        if self
            .account(&address)
            .is_some_and(|a| a.nonce != 0 || !a.code.is_empty())
        {
            debug!(%address, "contract address collision");
            return CallOutcome {
                outcome: Outcome::Failed(EvmError::ContractAddressCollision),
                output: Bytes::new(),
                gas_left: 0,
                created: None,
            };
        }

        let snapshot = self.state.clone();
        self.transfer(params.caller, address, params.value);

        let mut contract = Contract::new(params.caller, address, params.value, params.gas)
            .with_code(params.init_code, None);
        let result = self.execute(&mut contract, Bytes::new());

        let mut outcome = result.outcome;
        let mut gas_left = result.gas_left;
        if outcome.is_success() {
            let deposit = result.output.len() as u64 * cost::CREATE_DATA;
            if gas_left >= deposit {
                gas_left -= deposit;
                self.account_mut(address).code = result.output.clone();
            } else if self.config.is_active(Fork::Homestead, self.block.number) {
                outcome = Outcome::Failed(EvmError::CodeStoreOutOfGas);
                gas_left = 0;
            }
        }

        if !outcome.is_success() {
            self.state = snapshot;
        }
        debug!(%address, outcome = ?outcome, gas_left, "create finished");
        let created = outcome.is_success().then_some(address);
        CallOutcome {
            outcome,
            output: result.output,
            gas_left,
            created,
        }
    }
}
