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

//! Proportional distribution of the total allocation into balance and
//! vesting records.

use std::collections::BTreeMap;

use alloy::primitives::U256;

use crate::{
    error::AllocationError,
    events::IdentityKey,
    locks::AggregatedEntry,
    mul_div, VESTING_DURATION_BLOCKS, VESTING_START_PERIOD,
};

/// Share of a signaler's allocation that is liquid at launch, in percent.
/// The rest vests over [`VESTING_DURATION_BLOCKS`].
pub const SIGNAL_LIQUID_PERCENT: u64 = 25;

/// A genesis balance for one identity key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceRecord {
    pub key: IdentityKey,
    pub amount: U256,
}

/// A genesis vesting entry for one identity key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VestingRecord {
    pub key: IdentityKey,
    pub duration_blocks: u64,
    pub start_period: u64,
    pub liquid_amount: U256,
}

impl VestingRecord {
    fn new(key: IdentityKey, liquid_amount: U256) -> Self {
        Self {
            key,
            duration_blocks: VESTING_DURATION_BLOCKS,
            start_period: VESTING_START_PERIOD,
            liquid_amount,
        }
    }
}

/// Convert aggregated locks, signals and generalized locks into balance and
/// vesting records, scaled by `total_allocation / total_effective`.
///
/// Lockers and generalized locks are fully liquid at launch; signalers get
/// [`SIGNAL_LIQUID_PERCENT`] liquid. A record that cannot be processed is
/// logged and skipped without aborting the batch. The output may contain the
/// same key several times across the three sources; deduplication happens in
/// [`crate::dedup::combine_to_unique`].
pub fn build_balances(
    locks: &BTreeMap<IdentityKey, AggregatedEntry>,
    signals: &BTreeMap<IdentityKey, AggregatedEntry>,
    generalized_locks: &BTreeMap<IdentityKey, U256>,
    total_allocation: U256,
    total_effective: U256,
) -> Result<(Vec<BalanceRecord>, Vec<VestingRecord>), AllocationError> {
    let entries = locks.len() + signals.len() + generalized_locks.len();
    if entries > 0 && total_effective.is_zero() {
        return Err(AllocationError::ZeroTotalEffective);
    }

    let mut balances = Vec::with_capacity(entries);
    let mut vesting = Vec::with_capacity(entries);

    let scale = |key: &IdentityKey, effective: U256| -> Option<U256> {
        if key.is_empty() {
            tracing::warn!("skipping record with empty identity key");
            return None;
        }
        match mul_div(effective, total_allocation, total_effective) {
            Ok(amount) => Some(amount),
            Err(err) => {
                tracing::warn!(key = %key.to_hex(), %effective, "skipping record: {err}");
                None
            }
        }
    };

    // Locks: the entire balance is liquid at launch.
    for (key, entry) in locks {
        let Some(amount) = scale(key, entry.effective_value) else { continue };
        balances.push(BalanceRecord { key: key.clone(), amount });
        vesting.push(VestingRecord::new(key.clone(), amount));
    }

    // Signals: only a quarter of the allocation is liquid at launch.
    for (key, entry) in signals {
        let liquid_value = match mul_div(
            entry.effective_value,
            U256::from(SIGNAL_LIQUID_PERCENT),
            U256::from(100u64),
        ) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(
                    key = %key.to_hex(),
                    effective = %entry.effective_value,
                    "skipping record: {err}"
                );
                continue;
            }
        };
        let Some(amount) = scale(key, entry.effective_value) else { continue };
        let Some(liquid) = scale(key, liquid_value) else { continue };
        balances.push(BalanceRecord { key: key.clone(), amount });
        vesting.push(VestingRecord::new(key.clone(), liquid));
    }

    // Generalized locks behave like locks: fully liquid.
    for (key, effective) in generalized_locks {
        let Some(amount) = scale(key, *effective) else { continue };
        balances.push(BalanceRecord { key: key.clone(), amount });
        vesting.push(VestingRecord::new(key.clone(), amount));
    }

    tracing::info!(
        balances = balances.len(),
        vesting = vesting.len(),
        "built allocation records"
    );

    Ok((balances, vesting))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(effective: u64) -> AggregatedEntry {
        AggregatedEntry {
            raw_amount: U256::from(effective),
            effective_value: U256::from(effective),
            origin_addresses: Vec::new(),
        }
    }

    fn key(name: &[u8]) -> IdentityKey {
        IdentityKey::new(name)
    }

    #[test]
    fn locks_are_fully_liquid() {
        let locks = BTreeMap::from([(key(b"a"), entry(100))]);
        let (balances, vesting) = build_balances(
            &locks,
            &BTreeMap::new(),
            &BTreeMap::new(),
            U256::from(1_000u64),
            U256::from(100u64),
        )
        .unwrap();
        assert_eq!(balances, vec![BalanceRecord { key: key(b"a"), amount: U256::from(1_000u64) }]);
        assert_eq!(vesting[0].liquid_amount, U256::from(1_000u64));
        assert_eq!(vesting[0].duration_blocks, VESTING_DURATION_BLOCKS);
        assert_eq!(vesting[0].start_period, VESTING_START_PERIOD);
    }

    #[test]
    fn signals_are_quarter_liquid() {
        let signals = BTreeMap::from([(key(b"s"), entry(100))]);
        let (balances, vesting) = build_balances(
            &BTreeMap::new(),
            &signals,
            &BTreeMap::new(),
            U256::from(1_000u64),
            U256::from(100u64),
        )
        .unwrap();
        assert_eq!(balances[0].amount, U256::from(1_000u64));
        assert_eq!(vesting[0].liquid_amount, U256::from(250u64));
    }

    #[test]
    fn duplicate_keys_across_sources_are_kept() {
        let locks = BTreeMap::from([(key(b"x"), entry(100))]);
        let signals = BTreeMap::from([(key(b"x"), entry(300))]);
        let (balances, _) = build_balances(
            &locks,
            &signals,
            &BTreeMap::new(),
            U256::from(400u64),
            U256::from(400u64),
        )
        .unwrap();
        assert_eq!(balances.len(), 2);
        assert_eq!(balances[0].key, balances[1].key);
    }

    #[test]
    fn truncation_loss_is_bounded_by_key_count() {
        // Three entries that do not divide evenly into the allocation.
        let locks = BTreeMap::from([
            (key(b"a"), entry(1)),
            (key(b"b"), entry(1)),
            (key(b"c"), entry(1)),
        ]);
        let total_allocation = U256::from(1_000u64);
        let (balances, _) = build_balances(
            &locks,
            &BTreeMap::new(),
            &BTreeMap::new(),
            total_allocation,
            U256::from(3u64),
        )
        .unwrap();
        let sum: U256 = balances.iter().map(|b| b.amount).sum();
        assert!(sum <= total_allocation);
        assert!(total_allocation - sum < U256::from(balances.len() as u64));
    }

    #[test]
    fn extreme_signal_value_is_skipped_not_wrapped() {
        // The liquid-share product of the oversized entry exceeds 256 bits;
        // the record is dropped with a warning instead of wrapping into a
        // garbage vesting row. The well-formed entry survives.
        let huge = U256::MAX / U256::from(20u64);
        let signals = BTreeMap::from([
            (
                key(b"huge"),
                AggregatedEntry {
                    raw_amount: huge,
                    effective_value: huge,
                    origin_addresses: Vec::new(),
                },
            ),
            (key(b"ok"), entry(100)),
        ]);
        let (balances, vesting) = build_balances(
            &BTreeMap::new(),
            &signals,
            &BTreeMap::new(),
            U256::from(10u64),
            huge + U256::from(100u64),
        )
        .unwrap();
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].key, key(b"ok"));
        assert_eq!(vesting.len(), 1);
    }

    #[test]
    fn malformed_key_is_skipped_not_fatal() {
        let locks = BTreeMap::from([(key(b""), entry(100)), (key(b"ok"), entry(100))]);
        let (balances, vesting) = build_balances(
            &locks,
            &BTreeMap::new(),
            &BTreeMap::new(),
            U256::from(200u64),
            U256::from(200u64),
        )
        .unwrap();
        assert_eq!(balances.len(), 1);
        assert_eq!(vesting.len(), 1);
        assert_eq!(balances[0].key, key(b"ok"));
    }

    #[test]
    fn zero_total_effective_is_fatal_when_entries_exist() {
        let locks = BTreeMap::from([(key(b"a"), entry(0))]);
        let err = build_balances(
            &locks,
            &BTreeMap::new(),
            &BTreeMap::new(),
            U256::from(1_000u64),
            U256::ZERO,
        )
        .unwrap_err();
        assert!(matches!(err, AllocationError::ZeroTotalEffective));
    }

    #[test]
    fn empty_inputs_produce_empty_outputs() {
        let (balances, vesting) = build_balances(
            &BTreeMap::new(),
            &BTreeMap::new(),
            &BTreeMap::new(),
            U256::from(1_000u64),
            U256::ZERO,
        )
        .unwrap();
        assert!(balances.is_empty());
        assert!(vesting.is_empty());
    }
}
