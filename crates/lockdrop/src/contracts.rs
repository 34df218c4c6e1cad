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

//! Smart contract interface for the lockdrop contract.

alloy::sol! {
    #[sol(rpc, all_derives)]
    interface ILockdrop {
        /// Emitted when a participant time-locks currency. `term` is the
        /// contract's term enum index (0 = 3mo .. 5 = 36mo), `genesisKey` the
        /// participant's target-chain identity key, and `time` the lock
        /// timestamp.
        event Locked(
            address indexed owner,
            uint256 amount,
            address lockAddr,
            uint8 term,
            bytes genesisKey,
            bool isValidator,
            uint256 time
        );

        /// Emitted when a participant signals with a deployed contract's
        /// balance instead of locking.
        event Signaled(address indexed contractAddr, bytes genesisKey, uint256 time);

        function LOCK_START_TIME() external view returns (uint256);
        function LOCK_END_TIME() external view returns (uint256);
    }
}

/// Storage slot of the owner address in a deployed lock contract.
pub const LOCK_SLOT_OWNER: u64 = 0;

/// Storage slot of the unlock timestamp in a deployed lock contract.
pub const LOCK_SLOT_UNLOCK_TIME: u64 = 1;
