// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Randomized transaction workload.
//!
//! Every submission goes straight to the node and any RPC error aborts the
//! run. There is no retry.

use rand::Rng;
use serde::Serialize;
use snapcheck_core::abi::{nested_contract_address, NESTED_DEPLOY, SET_STRING};
use snapcheck_core::types::receipt_logs;
use snapcheck_core::config::{
    WorkloadParams, DAC_DEPLOY_GAS, NESTED_DEPLOY_GAS, STRING_DEPLOY_GAS, STRING_UPDATE_GAS,
};
use snapcheck_core::{Address, RpcGateway, StateOracle, WorkloadPlanner, U256};

use crate::contracts::ContractArtifacts;
use crate::errors::{HarnessError, HarnessResult};
use crate::settle::{SettleReason, Settler};
use crate::telemetry::{CONTRACTS_DEPLOYED, STRINGS_UPDATED, TRANSFERS_SKIPPED, TRANSFERS_SUBMITTED};

/// What one run actually did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkloadSummary {
    pub rounds: u32,
    pub accounts: usize,
    pub peer_transfers: u32,
    /// Peer transfers not attempted because the source was at or below the threshold.
    pub gated_transfers: u32,
    pub topups: u32,
    pub string_deploys: u32,
    pub nested_deploys: u32,
    pub string_updates: u32,
}

pub struct WorkloadEngine<R: Rng> {
    planner: WorkloadPlanner<R>,
    params: WorkloadParams,
    artifacts: ContractArtifacts,
    settler: Settler,
    faucet: Option<Address>,
    /// Generated accounts in creation order; the first is the root.
    accounts: Vec<Address>,
    /// Generated accounts that have submitted, in order of first submission.
    senders: Vec<Address>,
    summary: WorkloadSummary,
}

impl<R: Rng + Send> WorkloadEngine<R> {
    pub fn new(
        planner: WorkloadPlanner<R>,
        params: WorkloadParams,
        artifacts: ContractArtifacts,
        settler: Settler,
    ) -> Self {
        Self {
            planner,
            params,
            artifacts,
            settler,
            faucet: None,
            accounts: Vec::new(),
            senders: Vec::new(),
            summary: WorkloadSummary::default(),
        }
    }

    pub fn accounts(&self) -> &[Address] {
        &self.accounts
    }

    pub fn root(&self) -> Option<Address> {
        self.accounts.first().copied()
    }

    pub fn faucet(&self) -> Option<Address> {
        self.faucet
    }

    /// Generated accounts whose nonce the workload advanced.
    pub fn senders(&self) -> &[Address] {
        &self.senders
    }

    fn note_sender(&mut self, account: Address) {
        if !self.senders.contains(&account) {
            self.senders.push(account);
        }
    }

    pub fn summary(&self) -> &WorkloadSummary {
        &self.summary
    }

    /// Faucet first, then every generated account: the addresses whose
    /// balances make up the reference snapshot.
    pub fn balance_addresses(&self) -> Vec<Address> {
        self.faucet.iter().chain(self.accounts.iter()).copied().collect()
    }

    /// Create the root account and fund it with half of the faucet's balance
    /// once the faucet has any.
    pub async fn bootstrap<G>(&mut self, gateway: &G) -> HarnessResult<Address>
    where
        G: RpcGateway + ?Sized,
    {
        let root = gateway.new_account().await?;
        self.accounts.push(root);

        let faucet = gateway.faucet_account().await?;
        self.faucet = Some(faucet);

        let mut faucet_balance = gateway.get_balance(faucet).await?;
        while faucet_balance.is_zero() {
            self.settler.settle(SettleReason::FaucetPoll).await;
            faucet_balance = gateway.get_balance(faucet).await?;
        }

        let grant = faucet_balance / U256::from(2u64);
        gateway.fund_from_faucet(root, grant).await?;
        tracing::info!(%root, %faucet, %grant, "Root account funded");
        self.settler.settle(SettleReason::BlockInclusion).await;

        Ok(root)
    }

    /// Run every round, mirroring contract writes into `oracle`.
    pub async fn run<G>(&mut self, gateway: &G, oracle: &mut StateOracle) -> HarnessResult<WorkloadSummary>
    where
        G: RpcGateway + ?Sized,
    {
        let root = self.root().ok_or(HarnessError::NotBootstrapped)?;

        for round in 0..self.params.rounds {
            tracing::info!(round, "Workload round");

            self.accounts.push(gateway.new_account().await?);

            for _ in 0..self.params.inner_iterations {
                self.transfer_step(gateway, root).await?;
            }

            if let Some(value) = self.planner.string_deploy() {
                let contract = gateway
                    .deploy_contract(root, &self.artifacts.string_storage, &[value.as_str()], STRING_DEPLOY_GAS)
                    .await?;
                tracing::debug!(%contract, len = value.len(), "String store deployed");
                oracle.record_string(contract, value);
                self.note_sender(root);
                self.summary.string_deploys += 1;
                metrics::counter!(CONTRACTS_DEPLOYED, 1);
            }

            if self.planner.wants_nested_deploy() {
                self.nested_deploy(gateway, oracle, root).await?;
            }

            for contract in oracle.tracked_contracts() {
                if let Some(value) = self.planner.string_update() {
                    gateway
                        .transact_contract(root, contract, SET_STRING, &[value.as_str()], STRING_UPDATE_GAS)
                        .await?;
                    tracing::debug!(%contract, len = value.len(), "String updated");
                    oracle.record_string(contract, value);
                    self.note_sender(root);
                    self.summary.string_updates += 1;
                    metrics::counter!(STRINGS_UPDATED, 1);
                }
            }

            self.summary.rounds += 1;
            self.settler.settle(SettleReason::BlockInclusion).await;
        }

        self.summary.accounts = self.accounts.len();
        Ok(self.summary.clone())
    }

    async fn transfer_step<G>(&mut self, gateway: &G, root: Address) -> HarnessResult<()>
    where
        G: RpcGateway + ?Sized,
    {
        let active = self.accounts.len();
        let from = self.accounts[self.planner.pick_account(active)];

        // Live query: fees are not modelled, so a mirrored balance would lie.
        let balance = gateway.get_balance(from).await?;
        if balance > self.params.transfer_threshold {
            if self.planner.wants_peer_transfer() {
                let (to_index, amount) = self.planner.peer_transfer(active);
                let to = self.accounts[to_index];
                gateway.send_value(from, to, amount).await?;
                tracing::debug!(%from, %to, %amount, "Peer transfer");
                self.note_sender(from);
                self.summary.peer_transfers += 1;
                metrics::counter!(TRANSFERS_SUBMITTED, 1);
            }
        } else {
            self.summary.gated_transfers += 1;
            metrics::counter!(TRANSFERS_SKIPPED, 1);
        }

        if let Some(amount) = self.planner.root_topup() {
            gateway.send_value(root, from, amount).await?;
            tracing::debug!(to = %from, %amount, "Root top-up");
            self.note_sender(root);
            self.summary.topups += 1;
            metrics::counter!(TRANSFERS_SUBMITTED, 1);
        }
        Ok(())
    }

    /// Deploy the self-deploying contract, have it deploy a nested string
    /// store and track the nested one.
    async fn nested_deploy<G>(
        &mut self,
        gateway: &G,
        oracle: &mut StateOracle,
        root: Address,
    ) -> HarnessResult<()>
    where
        G: RpcGateway + ?Sized,
    {
        let deployer = gateway
            .deploy_contract(root, &self.artifacts.deploy_another, &[], DAC_DEPLOY_GAS)
            .await?;
        let value = self.planner.random_string();
        let receipt = gateway
            .transact_contract(root, deployer, NESTED_DEPLOY, &[value.as_str()], NESTED_DEPLOY_GAS)
            .await?;
        let nested = nested_contract_address(receipt_logs(&receipt))?;
        tracing::debug!(%deployer, %nested, len = value.len(), "Nested string store deployed");
        oracle.record_string(nested, value);
        self.note_sender(root);
        self.summary.nested_deploys += 1;
        metrics::counter!(CONTRACTS_DEPLOYED, 1);
        Ok(())
    }
}
