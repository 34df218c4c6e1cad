// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Historical event and state reads from the lockdrop contracts over RPC.

use alloy::{
    eips::BlockId,
    primitives::{Address, B256, U256},
    providers::Provider,
    rpc::types::{BlockNumberOrTag, Filter, Log},
    sol_types::SolEvent,
};
use anyhow::Context;
use async_trait::async_trait;

use crate::{
    contracts::{ILockdrop, LOCK_SLOT_OWNER, LOCK_SLOT_UNLOCK_TIME},
    deployments::Deployment,
    error::AllocationError,
    events::{LockEvent, SignalEvent},
    signals::BalanceSource,
};

/// Widest block span of a single `eth_getLogs` call. Public endpoints cap
/// the range, so a lockdrop-length scan is split into windows this size.
const LOG_WINDOW_BLOCKS: u64 = 5000;

/// Owner and unlock time read directly from a deployed lock contract's
/// fixed two-slot storage layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LockStorage {
    pub owner: Address,
    pub unlock_time: u64,
}

/// Reads lockdrop events and balances from one or more contract instances.
#[derive(Clone, Debug)]
pub struct LockdropSource<P> {
    provider: P,
    contracts: Vec<Address>,
}

impl<P: Provider> LockdropSource<P> {
    pub fn new(provider: P, contracts: Vec<Address>) -> Self {
        Self { provider, contracts }
    }

    pub fn from_deployment(provider: P, deployment: &Deployment) -> Self {
        Self::new(provider, deployment.lockdrop_contracts.clone())
    }

    pub async fn current_block(&self) -> Result<u64, AllocationError> {
        let block =
            self.provider.get_block_number().await.context("Failed to get block number")?;
        Ok(block)
    }

    /// The lockdrop's start timestamp, read from the first contract instance.
    /// All instances of one lockdrop share the same constant.
    pub async fn lock_start_time(&self) -> Result<u64, AllocationError> {
        let address = *self
            .contracts
            .first()
            .ok_or_else(|| anyhow::anyhow!("no lockdrop contracts configured"))?;
        let lockdrop = ILockdrop::new(address, &self.provider);
        let start = lockdrop
            .LOCK_START_TIME()
            .call()
            .await
            .context("Failed to read LOCK_START_TIME")?;
        Ok(start.saturating_to::<u64>())
    }

    /// Fetch and decode all `Locked` events across the configured contracts,
    /// ordered by block, transaction index and log index.
    pub async fn lock_events(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<LockEvent>, AllocationError> {
        let logs = self
            .fetch_sorted_logs(ILockdrop::Locked::SIGNATURE_HASH, from_block, to_block)
            .await
            .context("Failed to get Locked logs")?;
        tracing::info!(count = logs.len(), "fetched Locked events");

        let mut events = Vec::with_capacity(logs.len());
        for log in &logs {
            match LockEvent::from_log(log) {
                Some(event) => events.push(event),
                None => tracing::warn!(?log, "skipping undecodable Locked log"),
            }
        }
        Ok(events)
    }

    /// Fetch and decode all `Signaled` events across the configured
    /// contracts, ordered by block, transaction index and log index.
    pub async fn signal_events(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<SignalEvent>, AllocationError> {
        let logs = self
            .fetch_sorted_logs(ILockdrop::Signaled::SIGNATURE_HASH, from_block, to_block)
            .await
            .context("Failed to get Signaled logs")?;
        tracing::info!(count = logs.len(), "fetched Signaled events");

        let mut events = Vec::with_capacity(logs.len());
        for log in &logs {
            match SignalEvent::from_log(log) {
                Some(event) => events.push(event),
                None => tracing::warn!(?log, "skipping undecodable Signaled log"),
            }
        }
        Ok(events)
    }

    /// Read a deployed lock's owner and unlock time from its storage slots.
    pub async fn lock_storage(&self, lock_addr: Address) -> Result<LockStorage, AllocationError> {
        let owner_word = self
            .provider
            .get_storage_at(lock_addr, U256::from(LOCK_SLOT_OWNER))
            .await
            .context("Failed to read lock owner slot")?;
        let unlock_word = self
            .provider
            .get_storage_at(lock_addr, U256::from(LOCK_SLOT_UNLOCK_TIME))
            .await
            .context("Failed to read lock unlock-time slot")?;

        Ok(LockStorage {
            owner: Address::from_word(B256::from(owner_word)),
            unlock_time: unlock_word.saturating_to::<u64>(),
        })
    }

    /// Scan one event signature over a block range, window by window.
    async fn scan_logs(
        &self,
        filter: &Filter,
        from_block: u64,
        to_block: u64,
    ) -> anyhow::Result<Vec<Log>> {
        let mut logs = Vec::new();
        let mut window_start = from_block;
        while window_start <= to_block {
            let window_end = to_block.min(window_start.saturating_add(LOG_WINDOW_BLOCKS - 1));
            let windowed = filter
                .clone()
                .from_block(BlockNumberOrTag::Number(window_start))
                .to_block(BlockNumberOrTag::Number(window_end));
            logs.extend(self.provider.get_logs(&windowed).await?);
            window_start = window_end + 1;
        }
        Ok(logs)
    }

    async fn fetch_sorted_logs(
        &self,
        signature: B256,
        from_block: u64,
        to_block: u64,
    ) -> anyhow::Result<Vec<Log>> {
        let mut logs = Vec::new();
        for contract in &self.contracts {
            let filter = Filter::new().address(*contract).event_signature(signature);
            logs.extend(self.scan_logs(&filter, from_block, to_block).await?);
        }
        // Merge instances into one chain-ordered stream.
        logs.sort_by_key(|log| {
            (
                log.block_number.unwrap_or_default(),
                log.transaction_index.unwrap_or_default(),
                log.log_index.unwrap_or_default(),
            )
        });
        Ok(logs)
    }
}

#[async_trait]
impl<P: Provider> BalanceSource for LockdropSource<P> {
    async fn balance_at(&self, address: Address, block: u64) -> anyhow::Result<U256> {
        self.provider
            .get_balance(address)
            .block_id(BlockId::from(block))
            .await
            .with_context(|| format!("Failed to get balance of {address} at block {block}"))
    }
}
