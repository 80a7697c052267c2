// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! In-process stand-ins for the node-under-test.
//!
//! `SimGateway` is a tiny ledger with fees and the two string-store
//! contracts. `SimBackend` persists that ledger through the data directory
//! and the snapshot file, so a coordinator run exercises the real wipe.
#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use snapcheck_core::abi::{encode_strings, event_topic, GET_STRING, NESTED_DEPLOY, NEW_STRING_EVENT, SET_STRING};
use snapcheck_core::types::{event_log, included_receipt, units};
use snapcheck_core::{Address, Bytes, Receipt, RpcError, RpcGateway, RpcResult, TxHash, B256, U256};
use snapcheck_node::backend::NodeBackend;
use snapcheck_node::config::{HarnessConfig, LaunchMode, SettleConfig};
use snapcheck_node::contracts::ContractArtifacts;
use snapcheck_node::errors::{HarnessError, HarnessResult};

pub const SIM_STRING_CODE: &[u8] = b"sim:string-storage";
pub const SIM_DAC_CODE: &[u8] = b"sim:deploy-another";
pub const GENESIS_UNITS: u64 = 1_000_000;
pub const STATE_FILE: &str = "ledger.json";

pub fn sim_artifacts() -> ContractArtifacts {
    ContractArtifacts::new(SIM_STRING_CODE.to_vec(), SIM_DAC_CODE.to_vec())
}

/// Flat fee charged for every submission.
pub fn fee() -> U256 {
    U256::from(21_000u64 * 1_000_000_000)
}

pub fn faucet_address() -> Address {
    Address::repeat_byte(0xfa)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter("debug").try_init();
}

/// Harness config pointing at `dir`, with every wait removed.
pub fn test_config(dir: &Path, seed: u64, rounds: u32) -> HarnessConfig {
    let mut cfg = HarnessConfig::default();
    cfg.datadir = dir.join("data");
    cfg.keystore = Some(dir.join("keystore"));
    cfg.snapshot_file = dir.join("snapshot.bin");
    cfg.seed = Some(seed);
    cfg.workload.rounds = rounds;
    cfg.settle = SettleConfig::immediate();
    cfg
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    pub faucet: Address,
    pub balances: BTreeMap<Address, U256>,
    pub strings: BTreeMap<Address, String>,
    pub deployers: BTreeSet<Address>,
    pub next_address: u64,
    pub next_tx: u64,
}

impl LedgerState {
    pub fn genesis() -> Self {
        let faucet = faucet_address();
        let mut balances = BTreeMap::new();
        balances.insert(faucet, units(GENESIS_UNITS));
        Self {
            faucet,
            balances,
            strings: BTreeMap::new(),
            deployers: BTreeSet::new(),
            next_address: 0,
            next_tx: 0,
        }
    }

    pub fn balance(&self, address: &Address) -> U256 {
        self.balances.get(address).copied().unwrap_or_default()
    }

    fn fresh_address(&mut self) -> Address {
        self.next_address += 1;
        let mut bytes = [0u8; 20];
        bytes[0] = 0x5c;
        bytes[12..].copy_from_slice(&self.next_address.to_be_bytes());
        Address::from(bytes)
    }

    fn next_hash(&mut self) -> TxHash {
        self.next_tx += 1;
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&self.next_tx.to_be_bytes());
        B256::from(bytes)
    }

    /// Debit `amount` plus the fee, or refuse like a node would.
    fn charge(&mut self, from: Address, amount: U256) -> RpcResult<TxHash> {
        let total = amount + fee();
        let balance = self.balance(&from);
        if balance < total {
            return Err(RpcError::JsonRpc {
                code: -32000,
                message: format!("insufficient funds for gas * price + value: have {} want {}", balance, total),
            });
        }
        self.balances.insert(from, balance - total);
        Ok(self.next_hash())
    }

    fn credit(&mut self, to: Address, amount: U256) {
        let balance = self.balance(&to);
        self.balances.insert(to, balance + amount);
    }
}

/// One value transfer as the ledger saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub from: Address,
    pub to: Address,
    pub amount: U256,
    /// Sender balance at the moment of submission.
    pub balance_before: U256,
}

#[derive(Clone)]
pub struct SimGateway {
    state: Arc<Mutex<LedgerState>>,
    journal: Arc<Mutex<Vec<Submission>>>,
    calls: Arc<AtomicUsize>,
    fail_after: Option<usize>,
    /// Faucet balance reads that still report zero.
    faucet_warmup: Arc<AtomicU32>,
}

impl SimGateway {
    pub fn new(state: Arc<Mutex<LedgerState>>) -> Self {
        Self {
            state,
            journal: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(AtomicUsize::new(0)),
            fail_after: None,
            faucet_warmup: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn genesis() -> Self {
        Self::new(Arc::new(Mutex::new(LedgerState::genesis())))
    }

    pub fn failing_after(mut self, calls: usize) -> Self {
        self.fail_after = Some(calls);
        self
    }

    pub fn with_faucet_warmup(self, reads: u32) -> Self {
        self.faucet_warmup.store(reads, Ordering::SeqCst);
        self
    }

    pub fn state(&self) -> LedgerState {
        self.state.lock().unwrap().clone()
    }

    pub fn journal(&self) -> Vec<Submission> {
        self.journal.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn tick(&self) -> RpcResult<()> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match self.fail_after {
            Some(limit) if n > limit => Err(RpcError::Transport("connection reset by peer".into())),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl RpcGateway for SimGateway {
    async fn get_balance(&self, address: Address) -> RpcResult<U256> {
        self.tick()?;
        let state = self.state.lock().unwrap();
        if address == state.faucet {
            let warm = self.faucet_warmup.load(Ordering::SeqCst);
            if warm > 0 {
                self.faucet_warmup.store(warm - 1, Ordering::SeqCst);
                return Ok(U256::ZERO);
            }
        }
        Ok(state.balance(&address))
    }

    async fn send_value(&self, from: Address, to: Address, amount: U256) -> RpcResult<TxHash> {
        self.tick()?;
        let mut state = self.state.lock().unwrap();
        let balance_before = state.balance(&from);
        let hash = state.charge(from, amount)?;
        state.credit(to, amount);
        self.journal.lock().unwrap().push(Submission { from, to, amount, balance_before });
        Ok(hash)
    }

    async fn deploy_contract(&self, from: Address, code: &[u8], args: &[&str], _gas: u64) -> RpcResult<Address> {
        self.tick()?;
        let mut state = self.state.lock().unwrap();
        state.charge(from, U256::ZERO)?;
        let contract = state.fresh_address();
        if code == SIM_STRING_CODE {
            let value = args.first().copied().unwrap_or_default();
            state.strings.insert(contract, value.to_string());
        } else if code == SIM_DAC_CODE {
            state.deployers.insert(contract);
        } else {
            return Err(RpcError::JsonRpc { code: -32000, message: "invalid opcode".into() });
        }
        Ok(contract)
    }

    async fn transact_contract(
        &self,
        from: Address,
        contract: Address,
        method: &str,
        args: &[&str],
        _gas: u64,
    ) -> RpcResult<Receipt> {
        self.tick()?;
        let mut state = self.state.lock().unwrap();
        let value = args.first().copied().unwrap_or_default().to_string();

        let mut logs = Vec::new();
        if method == SET_STRING && state.strings.contains_key(&contract) {
            state.strings.insert(contract, value);
        } else if method == NESTED_DEPLOY && state.deployers.contains(&contract) {
            let nested = state.fresh_address();
            state.strings.insert(nested, value);
            logs.push(event_log(
                contract,
                vec![event_topic(NEW_STRING_EVENT), nested.into_word()],
                Bytes::new(),
            ));
        } else {
            return Err(RpcError::JsonRpc { code: 3, message: "execution reverted".into() });
        }

        let hash = state.charge(from, U256::ZERO)?;
        Ok(included_receipt(hash, from, Some(contract), None, logs))
    }

    async fn call_contract(&self, contract: Address, method: &str, _args: &[&str]) -> RpcResult<Bytes> {
        self.tick()?;
        let state = self.state.lock().unwrap();
        match state.strings.get(&contract) {
            Some(value) if method == GET_STRING => Ok(Bytes::from(encode_strings(&[value.as_str()]))),
            _ => Ok(Bytes::new()),
        }
    }

    async fn fund_from_faucet(&self, to: Address, amount: U256) -> RpcResult<TxHash> {
        let faucet = self.state.lock().unwrap().faucet;
        self.send_value(faucet, to, amount).await
    }

    async fn faucet_account(&self) -> RpcResult<Address> {
        self.tick()?;
        Ok(self.state.lock().unwrap().faucet)
    }

    async fn new_account(&self) -> RpcResult<Address> {
        self.tick()?;
        Ok(self.state.lock().unwrap().fresh_address())
    }
}

/// Ways the simulated node can mishandle a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    None,
    /// Restored node is missing one string contract.
    DropStringOnLoad,
    /// Restored faucet holds one extra wei.
    SkewFaucetOnLoad,
    /// `--load-snapshot` is ignored and the node boots from genesis.
    IgnoreSnapshot,
    /// Every RPC after the given number of calls fails.
    RpcFailsAfter(usize),
}

pub struct SimBackend {
    datadir: PathBuf,
    live: Option<Arc<Mutex<LedgerState>>>,
    fault: Fault,
    launches: Arc<Mutex<Vec<LaunchMode>>>,
}

impl SimBackend {
    pub fn new(datadir: PathBuf) -> Self {
        Self::with_fault(datadir, Fault::None)
    }

    pub fn with_fault(datadir: PathBuf, fault: Fault) -> Self {
        Self {
            datadir,
            live: None,
            fault,
            launches: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle on the launch history that outlives the backend.
    pub fn launch_log(&self) -> Arc<Mutex<Vec<LaunchMode>>> {
        self.launches.clone()
    }

    fn state_path(&self) -> PathBuf {
        self.datadir.join(STATE_FILE)
    }

    fn read_state(path: &Path) -> HarnessResult<LedgerState> {
        let raw = std::fs::read(path)?;
        serde_json::from_slice(&raw).map_err(|e| HarnessError::Process(format!("corrupt state {}: {}", path.display(), e)))
    }

    fn write_state(path: &Path, state: &LedgerState) -> HarnessResult<()> {
        let raw = serde_json::to_vec_pretty(state).map_err(|e| HarnessError::Process(e.to_string()))?;
        std::fs::write(path, raw)?;
        Ok(())
    }
}

#[async_trait]
impl NodeBackend for SimBackend {
    type Gateway = SimGateway;

    fn datadir(&self) -> &Path {
        &self.datadir
    }

    async fn launch(&mut self, mode: &LaunchMode) -> HarnessResult<()> {
        if self.live.is_some() {
            return Err(HarnessError::Process("sim node already running".into()));
        }
        self.launches.lock().unwrap().push(mode.clone());

        let state = match mode {
            LaunchMode::Normal => {
                if self.state_path().exists() {
                    Self::read_state(&self.state_path())?
                } else {
                    LedgerState::genesis()
                }
            }
            LaunchMode::SaveSnapshot(file) => {
                let state = Self::read_state(&self.state_path())?;
                Self::write_state(file, &state)?;
                state
            }
            LaunchMode::LoadSnapshot(file) => {
                if self.state_path().exists() {
                    return Err(HarnessError::Process("load-snapshot into a non-empty datadir".into()));
                }
                let mut state = Self::read_state(file)?;
                match self.fault {
                    Fault::DropStringOnLoad => {
                        let first = state.strings.keys().next().copied();
                        if let Some(contract) = first {
                            state.strings.remove(&contract);
                        }
                    }
                    Fault::SkewFaucetOnLoad => {
                        let faucet = state.faucet;
                        state.credit(faucet, U256::from(1u64));
                    }
                    Fault::IgnoreSnapshot => state = LedgerState::genesis(),
                    Fault::None | Fault::RpcFailsAfter(_) => {}
                }
                state
            }
        };

        std::fs::create_dir_all(&self.datadir)?;
        self.live = Some(Arc::new(Mutex::new(state)));
        Ok(())
    }

    async fn stop(&mut self) -> HarnessResult<()> {
        let live = self
            .live
            .take()
            .ok_or_else(|| HarnessError::Process("sim node not running".into()))?;
        let state = live.lock().unwrap().clone();
        Self::write_state(&self.state_path(), &state)
    }

    async fn connect(&mut self) -> HarnessResult<SimGateway> {
        let live = self
            .live
            .clone()
            .ok_or_else(|| HarnessError::Process("sim node not running".into()))?;
        let gateway = SimGateway::new(live);
        Ok(match self.fault {
            Fault::RpcFailsAfter(n) => gateway.failing_after(n),
            _ => gateway,
        })
    }
}
