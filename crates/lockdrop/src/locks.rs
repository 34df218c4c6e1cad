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

//! Aggregation of `Locked` events into per-identity entries.

use std::collections::BTreeMap;

use alloy::primitives::{Address, U256};

use crate::{
    error::AllocationError,
    events::{IdentityKey, LockEvent},
    schedule::{effective_value, EarlyBonus},
};

/// Aggregated contributions under a single identity key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AggregatedEntry {
    /// Sum of raw contribution amounts, exact big-integer arithmetic.
    pub raw_amount: U256,
    /// Sum of per-event bonus-adjusted values (each floored individually).
    pub effective_value: U256,
    /// Contributing origin addresses, most recently merged first. Empty for
    /// signal entries, which do not track origins.
    pub origin_addresses: Vec<Address>,
}

impl AggregatedEntry {
    /// Merge one contribution. Summation is associative and commutative, so
    /// final totals are independent of event order; the address list is not,
    /// and keeps the most recent origin first.
    pub fn merge(&mut self, raw: U256, effective: U256, origin: Option<Address>) {
        self.raw_amount += raw;
        self.effective_value += effective;
        if let Some(origin) = origin {
            self.origin_addresses.insert(0, origin);
        }
    }
}

/// Result of scanning all `Locked` events.
#[derive(Clone, Debug, Default)]
pub struct LockAggregate {
    /// All locks, keyed by identity key.
    pub locks: BTreeMap<IdentityKey, AggregatedEntry>,
    /// Locks whose events were validator-flagged; a key can appear here and
    /// in `locks`.
    pub validator_locks: BTreeMap<IdentityKey, AggregatedEntry>,
    /// Total raw amount locked across all events.
    pub total_raw: U256,
    /// Total effective value across all events.
    pub total_effective: U256,
}

/// Fold lock events into per-identity aggregates.
///
/// Every event contributes to the totals, validator-flagged or not; an event
/// with an unrecognized term contributes its raw amount with zero effective
/// value. No event is dropped. Fails only when an event's effective value
/// does not fit in 256 bits.
pub fn aggregate_locks(
    events: &[LockEvent],
    lock_start: u64,
    early_bonus: &impl EarlyBonus,
) -> Result<LockAggregate, AllocationError> {
    let mut aggregate = LockAggregate::default();

    for event in events {
        let factor = early_bonus.factor(event.lock_time, lock_start);
        let value = effective_value(event.amount, event.term, factor)?;
        if event.term.is_none() {
            tracing::debug!(
                owner = %event.owner,
                amount = %event.amount,
                "lock event with unrecognized term, effective value forfeited"
            );
        }

        aggregate.total_raw += event.amount;
        aggregate.total_effective += value;

        if event.is_validator {
            aggregate
                .validator_locks
                .entry(event.genesis_key.clone())
                .or_default()
                .merge(event.amount, value, Some(event.lock_addr));
        }

        aggregate
            .locks
            .entry(event.genesis_key.clone())
            .or_default()
            .merge(event.amount, value, Some(event.lock_addr));
    }

    tracing::info!(
        events = events.len(),
        keys = aggregate.locks.len(),
        validator_keys = aggregate.validator_locks.len(),
        total_raw = %aggregate.total_raw,
        total_effective = %aggregate.total_effective,
        "aggregated lock events"
    );

    Ok(aggregate)
}
