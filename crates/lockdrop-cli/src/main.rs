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

//! One-shot batch job: scan a lockdrop's events and write the genesis
//! allocation snapshot as JSON.

use std::path::PathBuf;

use alloy::{
    primitives::{Address, U256},
    providers::ProviderBuilder,
};
use anyhow::{bail, Result};
use clap::Parser;
use lockdrop_allocation::{
    aggregate_locks, aggregate_signals, build_balances, combine_to_unique,
    genesis::GenesisAllocation, select_validators, Deployment, LockdropSource, RetryPolicy,
    SteppedDecay, DEFAULT_EXISTENTIAL_DEPOSIT,
};
use url::Url;

/// Arguments of the genesis allocation job.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct MainArgs {
    /// URL of the Ethereum RPC endpoint (archive node for balance snapshots).
    #[clap(short, long, env)]
    rpc_url: Url,
    /// Lockdrop contract addresses to scan, comma separated.
    #[clap(short, long, env, value_delimiter = ',', required = true)]
    lockdrop_address: Vec<Address>,
    /// Known generalized-lock contract addresses, comma separated.
    #[clap(long, env, value_delimiter = ',')]
    generalized_lock: Vec<Address>,
    /// Total allocation to distribute, in target-chain smallest units.
    #[clap(long, env)]
    total_allocation: U256,
    /// Block at which signal balances are snapshotted. Defaults to the scan's
    /// end block.
    #[clap(long, env)]
    cutoff_block: Option<u64>,
    /// First block of the event scan.
    #[clap(long, env, default_value_t = 0)]
    from_block: u64,
    /// Last block of the event scan. Defaults to the current block.
    #[clap(long, env)]
    to_block: Option<u64>,
    /// Number of validators to select from validator-flagged locks.
    #[clap(long, env, default_value_t = 0)]
    num_validators: usize,
    /// Existential deposit subtracted before computing validator stakes.
    #[clap(long, env, default_value_t = DEFAULT_EXISTENTIAL_DEPOSIT)]
    existential_deposit: u128,
    /// Early-participation bonus factor at lockdrop start, in percent.
    /// 100 disables the early bonus.
    #[clap(long, env, default_value_t = 100)]
    early_bonus_start_factor: u64,
    /// Seconds over which the early-participation bonus decays to 100.
    #[clap(long, env, default_value_t = 0)]
    early_bonus_duration: u64,
    /// Number of equal decay steps of the early-participation bonus.
    #[clap(long, env, default_value_t = 5)]
    early_bonus_steps: u64,
    /// Maximum balance-lookup attempts per signaling contract.
    #[clap(long, env, default_value_t = 8)]
    balance_retry_attempts: u32,
    /// Output path of the genesis allocation JSON.
    #[clap(short, long, env, default_value = "genesis-allocation.json")]
    out: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!("Loaded environment variables from {:?}", path),
        Err(e) if e.not_found() => tracing::debug!("No .env file found"),
        Err(e) => bail!("failed to load .env file: {}", e),
    }

    let args = MainArgs::parse();

    run(&args).await
}

async fn run(args: &MainArgs) -> Result<()> {
    let provider = ProviderBuilder::new().connect_http(args.rpc_url.clone());

    let probe = LockdropSource::new(provider.clone(), args.lockdrop_address.clone());
    let to_block = match args.to_block {
        Some(block) => block,
        None => probe.current_block().await?,
    };
    let cutoff_block = args.cutoff_block.unwrap_or(to_block);

    let deployment = Deployment::new(args.lockdrop_address.clone(), cutoff_block)
        .with_generalized_locks(args.generalized_lock.clone())
        .with_from_block(args.from_block);
    let source = LockdropSource::from_deployment(provider, &deployment);

    tracing::info!(
        contracts = deployment.lockdrop_contracts.len(),
        from_block = deployment.from_block,
        to_block,
        cutoff_block,
        "scanning lockdrop events"
    );

    let lock_start = source.lock_start_time().await?;
    let lock_events = source.lock_events(deployment.from_block, to_block).await?;
    let signal_events = source.signal_events(deployment.from_block, to_block).await?;

    let early_bonus = SteppedDecay {
        start_factor: args.early_bonus_start_factor,
        duration: args.early_bonus_duration,
        steps: args.early_bonus_steps,
    };
    let retry = RetryPolicy { max_attempts: args.balance_retry_attempts, ..Default::default() };

    let locks = aggregate_locks(&lock_events, lock_start, &early_bonus)?;
    let signals = aggregate_signals(&signal_events, &source, &deployment, retry).await?;

    let total_effective = locks.total_effective + signals.total_effective;
    tracing::info!(
        total_locked = %locks.total_raw,
        total_signaled = %signals.total_raw,
        %total_effective,
        "aggregation complete"
    );

    let (balances, vesting) = build_balances(
        &locks.locks,
        &signals.signals,
        &signals.generalized_locks,
        args.total_allocation,
        total_effective,
    )?;

    let ledger = combine_to_unique(balances, vesting);
    ledger.verify(args.total_allocation)?;

    let validators = select_validators(
        &locks.validator_locks,
        args.total_allocation,
        total_effective,
        args.num_validators,
        U256::from(args.existential_deposit),
    )?;

    let genesis = GenesisAllocation::new(ledger, validators);
    std::fs::write(&args.out, genesis.to_json_string()?)?;
    tracing::info!(out = %args.out.display(), "wrote genesis allocation");

    Ok(())
}
