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

//! Aggregation of `Signaled` events, with balance resolution at a cutoff
//! block.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;

use crate::{
    deployments::Deployment,
    error::AllocationError,
    events::{IdentityKey, SignalEvent},
    locks::AggregatedEntry,
    schedule::{effective_value, Term, NO_EARLY_BONUS_FACTOR},
};

/// Reads an address's balance at a fixed block height.
///
/// Implemented for the live RPC source and by test fakes.
#[async_trait]
pub trait BalanceSource: Sync {
    async fn balance_at(&self, address: Address, block: u64) -> anyhow::Result<U256>;
}

/// Bounded retry with exponential backoff for balance resolution.
///
/// Once the attempt budget is spent the batch fails with
/// [`AllocationError::UnresolvableBalance`] rather than hanging on a dead
/// archive node.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(120),
        }
    }
}

async fn resolve_with_retry<S: BalanceSource>(
    source: &S,
    address: Address,
    block: u64,
    policy: RetryPolicy,
) -> Result<U256, AllocationError> {
    let mut delay = policy.initial_delay;
    for attempt in 1..=policy.max_attempts {
        match source.balance_at(address, block).await {
            Ok(balance) => return Ok(balance),
            Err(err) => {
                tracing::warn!(
                    %address,
                    block,
                    attempt,
                    max_attempts = policy.max_attempts,
                    "balance lookup failed: {err:#}"
                );
            }
        }
        if attempt < policy.max_attempts {
            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(policy.max_delay);
        }
    }
    Err(AllocationError::UnresolvableBalance { address, block })
}

/// Result of scanning all `Signaled` events.
#[derive(Clone, Debug, Default)]
pub struct SignalAggregate {
    /// Ordinary signals, keyed by identity key. Entries carry no origin
    /// address list.
    pub signals: BTreeMap<IdentityKey, AggregatedEntry>,
    /// Contributions from known generalized-lock contracts, valued at the
    /// three-month bonus and kept out of `signals`.
    pub generalized_locks: BTreeMap<IdentityKey, U256>,
    /// Total raw balance signaled across all non-duplicate events.
    pub total_raw: U256,
    /// Total effective value across all non-duplicate events.
    pub total_effective: U256,
}

/// Fold signal events into per-identity aggregates.
///
/// Only the first event for a given signaling contract counts; later events
/// for the same contract are ignored outright and their balances are never
/// fetched. Balances of the surviving events are resolved concurrently at
/// the deployment's cutoff block, then merged sequentially in original event
/// order so key-merge ordering stays deterministic.
pub async fn aggregate_signals<S: BalanceSource>(
    events: &[SignalEvent],
    source: &S,
    deployment: &Deployment,
    retry: RetryPolicy,
) -> Result<SignalAggregate, AllocationError> {
    // First-seen-wins dedup by signaling contract address.
    let mut seen: HashSet<Address> = HashSet::new();
    let unique: Vec<&SignalEvent> =
        events.iter().filter(|event| seen.insert(event.contract_addr)).collect();
    if unique.len() < events.len() {
        tracing::info!(
            duplicates = events.len() - unique.len(),
            "ignored duplicate signal events"
        );
    }

    let cutoff = deployment.signal_cutoff_block;
    let balances = futures_util::future::try_join_all(
        unique.iter().map(|event| resolve_with_retry(source, event.contract_addr, cutoff, retry)),
    )
    .await?;

    let mut aggregate = SignalAggregate::default();

    for (event, balance) in unique.iter().zip(balances) {
        if deployment.is_generalized_lock(&event.contract_addr) {
            // Generalized locks are valued as three-month locks and kept in
            // their own bucket.
            let value = effective_value(balance, Some(Term::ThreeMonths), NO_EARLY_BONUS_FACTOR)?;
            tracing::info!(contract = %event.contract_addr, %balance, "generalized lock");
            *aggregate.generalized_locks.entry(event.genesis_key.clone()).or_default() += value;
            aggregate.total_raw += balance;
            aggregate.total_effective += value;
            continue;
        }

        let value = effective_value(balance, Some(Term::Signaling), NO_EARLY_BONUS_FACTOR)?;
        aggregate.total_raw += balance;
        aggregate.total_effective += value;
        aggregate
            .signals
            .entry(event.genesis_key.clone())
            .or_default()
            .merge(balance, value, None);
    }

    tracing::info!(
        events = unique.len(),
        keys = aggregate.signals.len(),
        generalized_keys = aggregate.generalized_locks.len(),
        total_raw = %aggregate.total_raw,
        total_effective = %aggregate.total_effective,
        "aggregated signal events"
    );

    Ok(aggregate)
}
