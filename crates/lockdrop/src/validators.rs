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

//! Validator selection by stake ranking over validator-flagged locks.

use std::collections::BTreeMap;

use alloy::primitives::{B256, U256};

use crate::{error::AllocationError, events::IdentityKey, locks::AggregatedEntry, mul_div};

/// A selected validator: the three submitted session keys and the stake
/// backing them at genesis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatorDescriptor {
    pub stash: B256,
    pub controller: B256,
    pub session: B256,
    pub stake: U256,
}

/// Rank validator-eligible locks by stake and return the top
/// `num_validators`.
///
/// Only entries whose identity key decomposes into a stash/controller/session
/// triple are eligible; others are excluded without comment. Stake is the
/// allocation fraction of the entry's effective value less the existential
/// deposit (saturating at zero below the deposit). Ties keep the input
/// (key) order; fewer eligible entries than requested returns all of them.
pub fn select_validators(
    validator_locks: &BTreeMap<IdentityKey, AggregatedEntry>,
    total_allocation: U256,
    total_effective: U256,
    num_validators: usize,
    existential_deposit: U256,
) -> Result<Vec<ValidatorDescriptor>, AllocationError> {
    let mut eligible = Vec::new();
    for (key, entry) in validator_locks {
        let Some((stash, controller, session)) = key.validator_triple() else {
            continue;
        };
        let stakeable = entry.effective_value.saturating_sub(existential_deposit);
        let stake = mul_div(stakeable, total_allocation, total_effective)?;
        eligible.push(ValidatorDescriptor { stash, controller, session, stake });
    }

    // Stable: ties keep key order from the map iteration above.
    eligible.sort_by(|a, b| b.stake.cmp(&a.stake));
    eligible.truncate(num_validators);

    tracing::info!(selected = eligible.len(), requested = num_validators, "selected validators");

    Ok(eligible)
}
