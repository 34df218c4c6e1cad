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

//! Serialization of the final ledger into the target chain's genesis format.
//!
//! Balances are `[identityKeyHex, amountDecimalString]` pairs, vesting
//! entries `[identityKeyHex, durationBlocks, startPeriod, liquidDecimal]`,
//! and validators `[stashHex, controllerHex, sessionHex, stakeDecimal]`.
//! Keys are hex without any chain-type prefix.

use serde::ser::{Serialize, SerializeTuple, Serializer};

use crate::{
    allocation::{BalanceRecord, VestingRecord},
    dedup::GenesisLedger,
    validators::ValidatorDescriptor,
};

impl Serialize for BalanceRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.key.to_hex())?;
        tuple.serialize_element(&self.amount.to_string())?;
        tuple.end()
    }
}

impl Serialize for VestingRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(4)?;
        tuple.serialize_element(&self.key.to_hex())?;
        tuple.serialize_element(&self.duration_blocks)?;
        tuple.serialize_element(&self.start_period)?;
        tuple.serialize_element(&self.liquid_amount.to_string())?;
        tuple.end()
    }
}

impl Serialize for ValidatorDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(4)?;
        tuple.serialize_element(&hex::encode(self.stash))?;
        tuple.serialize_element(&hex::encode(self.controller))?;
        tuple.serialize_element(&hex::encode(self.session))?;
        tuple.serialize_element(&self.stake.to_string())?;
        tuple.end()
    }
}

/// The complete genesis snapshot, ready to serialize.
#[derive(Debug, serde::Serialize)]
pub struct GenesisAllocation {
    pub balances: Vec<BalanceRecord>,
    pub vesting: Vec<VestingRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<ValidatorDescriptor>,
}

impl GenesisAllocation {
    pub fn new(ledger: GenesisLedger, validators: Vec<ValidatorDescriptor>) -> Self {
        Self { balances: ledger.balances, vesting: ledger.vesting, validators }
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
