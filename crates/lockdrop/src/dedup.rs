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

//! Final merge of balance and vesting records into a unique-key ledger.

use std::collections::BTreeMap;

use alloy::primitives::U256;

use crate::{
    allocation::{BalanceRecord, VestingRecord},
    error::AllocationError,
    events::IdentityKey,
};

/// The final genesis ledger: one balance per identity key, vesting entries
/// only for keys that are not fully liquid, and the grand total.
#[derive(Clone, Debug, Default)]
pub struct GenesisLedger {
    pub balances: Vec<BalanceRecord>,
    pub vesting: Vec<VestingRecord>,
    pub total: U256,
}

impl GenesisLedger {
    /// Check the ledger total against the configured allocation.
    ///
    /// Floor division loses strictly less than one unit per unique key, so
    /// the total must be within `balances.len()` below `total_allocation`
    /// and never above it. Anything else means the computation is corrupt
    /// and the ledger must not be used for genesis generation.
    pub fn verify(&self, total_allocation: U256) -> Result<(), AllocationError> {
        let unique_keys = self.balances.len();
        let in_bound = self.total <= total_allocation
            && total_allocation - self.total < U256::from(unique_keys.max(1) as u64);
        if !in_bound {
            tracing::error!(
                total = %self.total,
                %total_allocation,
                unique_keys,
                "allocation integrity violation"
            );
            return Err(AllocationError::AllocationIntegrity {
                total: self.total,
                total_allocation,
                unique_keys,
            });
        }
        Ok(())
    }
}

/// Merge records sharing an identity key into one, and drop vesting entries
/// whose liquid amount equals the key's full balance (a fully-liquid account
/// needs no vesting entry).
pub fn combine_to_unique(
    balances: Vec<BalanceRecord>,
    vesting: Vec<VestingRecord>,
) -> GenesisLedger {
    let mut balance_map: BTreeMap<IdentityKey, U256> = BTreeMap::new();
    for record in balances {
        *balance_map.entry(record.key).or_default() += record.amount;
    }

    let mut vesting_map: BTreeMap<IdentityKey, U256> = BTreeMap::new();
    for record in vesting {
        *vesting_map.entry(record.key).or_default() += record.liquid_amount;
    }

    let mut total = U256::ZERO;
    let unique_balances: Vec<BalanceRecord> = balance_map
        .iter()
        .map(|(key, amount)| {
            total += *amount;
            BalanceRecord { key: key.clone(), amount: *amount }
        })
        .collect();

    let unique_vesting: Vec<VestingRecord> = vesting_map
        .into_iter()
        .filter(|(key, liquid)| balance_map.get(key) != Some(liquid))
        .map(|(key, liquid)| VestingRecord {
            key,
            duration_blocks: crate::VESTING_DURATION_BLOCKS,
            start_period: crate::VESTING_START_PERIOD,
            liquid_amount: liquid,
        })
        .collect();

    tracing::info!(
        balances = unique_balances.len(),
        vesting = unique_vesting.len(),
        %total,
        "combined records to unique keys"
    );

    GenesisLedger { balances: unique_balances, vesting: unique_vesting, total }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &[u8]) -> IdentityKey {
        IdentityKey::new(name)
    }

    fn balance(name: &[u8], amount: u64) -> BalanceRecord {
        BalanceRecord { key: key(name), amount: U256::from(amount) }
    }

    fn vest(name: &[u8], liquid: u64) -> VestingRecord {
        VestingRecord {
            key: key(name),
            duration_blocks: crate::VESTING_DURATION_BLOCKS,
            start_period: crate::VESTING_START_PERIOD,
            liquid_amount: U256::from(liquid),
        }
    }

    #[test]
    fn balances_merge_per_key() {
        let ledger = combine_to_unique(
            vec![balance(b"a", 100), balance(b"b", 50), balance(b"a", 25)],
            vec![],
        );
        assert_eq!(ledger.balances.len(), 2);
        let merged = ledger.balances.iter().find(|b| b.key == key(b"a")).unwrap();
        assert_eq!(merged.amount, U256::from(125u64));
        assert_eq!(ledger.total, U256::from(175u64));
    }

    #[test]
    fn no_duplicate_keys_in_output() {
        let ledger = combine_to_unique(
            vec![balance(b"a", 1), balance(b"a", 2), balance(b"a", 3)],
            vec![],
        );
        assert_eq!(ledger.balances.len(), 1);
    }

    #[test]
    fn fully_liquid_vesting_is_dropped() {
        // Lock: 100 fully liquid. Signal for same key: 100 with 25 liquid.
        let ledger = combine_to_unique(
            vec![balance(b"a", 100), balance(b"a", 100), balance(b"b", 40)],
            vec![vest(b"a", 100), vest(b"a", 25), vest(b"b", 40)],
        );
        // Key a: balance 200, liquid 125 -> vesting kept.
        // Key b: balance 40, liquid 40 -> fully liquid, dropped.
        assert_eq!(ledger.vesting.len(), 1);
        assert_eq!(ledger.vesting[0].key, key(b"a"));
        assert_eq!(ledger.vesting[0].liquid_amount, U256::from(125u64));
    }

    #[test]
    fn verify_accepts_exact_total() {
        let ledger = combine_to_unique(vec![balance(b"a", 600), balance(b"b", 400)], vec![]);
        ledger.verify(U256::from(1_000u64)).unwrap();
    }

    #[test]
    fn verify_accepts_truncation_loss_below_key_count() {
        let ledger = combine_to_unique(vec![balance(b"a", 499), balance(b"b", 500)], vec![]);
        ledger.verify(U256::from(1_000u64)).unwrap();
    }

    #[test]
    fn verify_rejects_overshoot() {
        let ledger = combine_to_unique(vec![balance(b"a", 1_001)], vec![]);
        let err = ledger.verify(U256::from(1_000u64)).unwrap_err();
        assert!(matches!(err, AllocationError::AllocationIntegrity { .. }));
    }

    #[test]
    fn verify_rejects_excess_loss() {
        let ledger = combine_to_unique(vec![balance(b"a", 500), balance(b"b", 400)], vec![]);
        assert!(ledger.verify(U256::from(1_000u64)).is_err());
    }
}
