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

//! Error types for the allocation pipeline.

use alloy::primitives::{Address, U256};
use thiserror::Error;

/// Errors surfaced by the allocation pipeline.
///
/// Per-record problems (a malformed key, an undecodable log) are handled
/// locally with a warning and never reach this type; these variants are the
/// batch-fatal conditions.
#[derive(Error, Debug)]
pub enum AllocationError {
    /// A signaling contract's balance could not be resolved within the retry
    /// budget.
    #[error("could not resolve balance of {address} at block {block} within retry budget")]
    UnresolvableBalance { address: Address, block: u64 },

    /// The final ledger total drifted from the configured allocation by more
    /// than the integer-truncation bound.
    #[error(
        "ledger total {total} outside truncation bound of allocation {total_allocation} \
         ({unique_keys} unique keys)"
    )]
    AllocationIntegrity { total: U256, total_allocation: U256, unique_keys: usize },

    /// Allocation requested against a zero total effective value.
    #[error("total effective value is zero, nothing to allocate against")]
    ZeroTotalEffective,

    /// An intermediate product exceeded 256 bits.
    #[error("arithmetic overflow computing {0}")]
    Overflow(&'static str),

    /// RPC or event-source failure.
    #[error("event source error: {0}")]
    Source(#[from] anyhow::Error),
}
