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

//! Typed lockdrop events, decoded eagerly at the source boundary.

use alloy::{primitives::{Address, B256, U256}, rpc::types::Log};

use crate::{contracts::ILockdrop, schedule::Term};

/// A participant's identity key on the target chain.
///
/// Treated as an opaque byte string: single-account keys are 32 bytes,
/// validator submissions concatenate stash, controller and session keys into
/// 96 bytes. Keys of any other length are carried through unchanged; the only
/// place a length matters is [`IdentityKey::validator_triple`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdentityKey(Vec<u8>);

impl IdentityKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Hex rendering without a `0x` or chain-type prefix, as expected by the
    /// target chain's genesis format.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Decompose into (stash, controller, session) keys.
    ///
    /// Only keys that are exactly three 32-byte sub-keys qualify; anything
    /// else yields `None`.
    pub fn validator_triple(&self) -> Option<(B256, B256, B256)> {
        if self.0.len() != 96 {
            return None;
        }
        Some((
            B256::from_slice(&self.0[..32]),
            B256::from_slice(&self.0[32..64]),
            B256::from_slice(&self.0[64..]),
        ))
    }
}

impl From<&[u8]> for IdentityKey {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

/// A decoded `Locked` event.
#[derive(Clone, Debug)]
pub struct LockEvent {
    /// Account that created the lock.
    pub owner: Address,
    /// Address of the deployed lock contract holding the funds.
    pub lock_addr: Address,
    /// Target-chain identity key the allocation accrues to.
    pub genesis_key: IdentityKey,
    /// Lock term; `None` when the event carried an unrecognized term index,
    /// which forfeits the lock's effective value by policy.
    pub term: Option<Term>,
    /// Locked amount in native smallest units.
    pub amount: U256,
    /// Whether the participant opted in as a validator candidate.
    pub is_validator: bool,
    /// Timestamp at which the lock was created.
    pub lock_time: u64,
}

impl LockEvent {
    /// Decode a raw log. Returns `None` for logs that do not decode as a
    /// `Locked` event.
    pub fn from_log(log: &Log) -> Option<Self> {
        let decoded = log.log_decode::<ILockdrop::Locked>().ok()?;
        let data = &decoded.inner.data;
        Some(Self {
            owner: data.owner,
            lock_addr: data.lockAddr,
            genesis_key: IdentityKey::new(data.genesisKey.to_vec()),
            term: Term::from_index(data.term),
            amount: data.amount,
            is_validator: data.isValidator,
            lock_time: data.time.saturating_to::<u64>(),
        })
    }
}

/// A decoded `Signaled` event.
///
/// The signaled balance is not part of the raw event; it is resolved against
/// the chain at the configured cutoff block during aggregation.
#[derive(Clone, Debug)]
pub struct SignalEvent {
    /// The signaling contract whose balance backs the claim.
    pub contract_addr: Address,
    /// Target-chain identity key the allocation accrues to.
    pub genesis_key: IdentityKey,
}

impl SignalEvent {
    /// Decode a raw log. Returns `None` for logs that do not decode as a
    /// `Signaled` event.
    pub fn from_log(log: &Log) -> Option<Self> {
        let decoded = log.log_decode::<ILockdrop::Signaled>().ok()?;
        let data = &decoded.inner.data;
        Some(Self {
            contract_addr: data.contractAddr,
            genesis_key: IdentityKey::new(data.genesisKey.to_vec()),
        })
    }
}
