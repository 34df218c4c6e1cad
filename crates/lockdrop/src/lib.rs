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

//! Genesis allocation computation for a lockdrop token distribution.
//!
//! A lockdrop contract on an existing chain records `Locked` and `Signaled`
//! events. This crate scans those events, computes each participant's
//! term-bonus-adjusted effective value, aggregates contributions per
//! target-chain identity key, and proportionally distributes a fixed total
//! allocation into genesis balance and vesting records. Validator-flagged
//! locks are additionally ranked by stake to pick an initial validator set.
//!
//! The whole computation is a single deterministic batch: events in, a
//! [`genesis::GenesisAllocation`] out. Nothing is persisted.

pub mod allocation;
pub mod contracts;
pub mod dedup;
pub mod deployments;
pub mod error;
pub mod events;
pub mod genesis;
pub mod locks;
pub mod schedule;
pub mod signals;
pub mod source;
pub mod validators;

use alloy::primitives::U256;

/// Minimum balance subtracted before computing a validator's stakeable amount.
pub const DEFAULT_EXISTENTIAL_DEPOSIT: u128 = 100_000_000_000_000;

/// Vesting duration of every vesting record, roughly one year of blocks.
pub const VESTING_DURATION_BLOCKS: u64 = 5_256_000;

/// Starting period of every vesting record.
pub const VESTING_START_PERIOD: u64 = 1;

pub use allocation::{build_balances, BalanceRecord, VestingRecord};
pub use dedup::{combine_to_unique, GenesisLedger};
pub use deployments::Deployment;
pub use error::AllocationError;
pub use events::{IdentityKey, LockEvent, SignalEvent};
pub use locks::{aggregate_locks, AggregatedEntry, LockAggregate};
pub use schedule::{EarlyBonus, NoEarlyBonus, SteppedDecay, Term};
pub use signals::{aggregate_signals, BalanceSource, RetryPolicy, SignalAggregate};
pub use source::LockdropSource;
pub use validators::{select_validators, ValidatorDescriptor};

/// `value * numerator / denominator` with floor division.
///
/// Used for every proportional-allocation scaling step. Multiplication comes
/// first so the division only truncates once, at the end; an overflowing
/// product is surfaced as an error rather than wrapped.
pub(crate) fn mul_div(
    value: U256,
    numerator: U256,
    denominator: U256,
) -> Result<U256, AllocationError> {
    if denominator.is_zero() {
        return Err(AllocationError::ZeroTotalEffective);
    }
    value
        .checked_mul(numerator)
        .map(|product| product / denominator)
        .ok_or(AllocationError::Overflow("allocation fraction"))
}
