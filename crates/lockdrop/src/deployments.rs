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

//! Deployment parameters for a lockdrop scan.

use alloy::primitives::Address;

/// Everything chain-specific the pipeline needs: which lockdrop contract
/// instances to scan, which signaling contracts are treated as generalized
/// locks, and the block at which signal balances are snapshotted.
#[derive(Clone, Debug)]
pub struct Deployment {
    /// Lockdrop contract instances to scan for events.
    pub lockdrop_contracts: Vec<Address>,
    /// Known contracts whose signaled balance counts as a three-month lock.
    pub generalized_locks: Vec<Address>,
    /// Block height at which signal balances are read.
    pub signal_cutoff_block: u64,
    /// First block of the event scan.
    pub from_block: u64,
}

impl Deployment {
    pub fn new(lockdrop_contracts: Vec<Address>, signal_cutoff_block: u64) -> Self {
        Self { lockdrop_contracts, generalized_locks: Vec::new(), signal_cutoff_block, from_block: 0 }
    }

    pub fn with_generalized_locks(mut self, addresses: Vec<Address>) -> Self {
        self.generalized_locks = addresses;
        self
    }

    pub fn with_from_block(mut self, from_block: u64) -> Self {
        self.from_block = from_block;
        self
    }

    pub fn is_generalized_lock(&self, address: &Address) -> bool {
        self.generalized_locks.contains(address)
    }
}
