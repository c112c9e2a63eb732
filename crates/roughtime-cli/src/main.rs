// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! getroughtime: query Roughtime authorities.
//!
//! ```sh
//! # Chain through every authority in a server list and print the offset.
//! getroughtime --config roughtime.json
//!
//! # Query a single Google-dialect authority.
//! getroughtime --ping localhost:2002 --pubkey <base64 Ed25519 key>
//! ```

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{TimeDelta, Utc};
use clap::{ArgGroup, Parser};
use log::debug;
use roughtime_client::aggregate::estimate_offset;
use roughtime_client::config::{Authority, decode_public_key};
use roughtime_client::protocol::RoughtimeProtocol;
use roughtime_client::query::{DEFAULT_QUERY_ATTEMPTS, query};
use roughtime_client::sequence::{LogSink, run_from_file};

/// Authorities claiming more uncertainty than this are left out of the offset.
const RADIUS_THRESHOLD: Duration = Duration::from_secs(10);

/// A simple Roughtime client.
#[derive(Parser, Debug)]
#[command(name = "getroughtime", version, about, long_about = None)]
#[command(group(ArgGroup::new("mode").required(true).args(["config", "ping"])))]
struct Cli {
    /// A JSON list of Roughtime servers
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Send a single request to ADDR, e.g. localhost:2002
    #[arg(long, value_name = "ADDR", requires = "pubkey")]
    ping: Option<String>,

    /// Base64 Ed25519 public key of the --ping address
    #[arg(long, value_name = "BASE64")]
    pubkey: Option<String>,

    /// Number of times to try each server
    #[arg(long, default_value_t = DEFAULT_QUERY_ATTEMPTS)]
    attempts: usize,

    /// Time to wait for each reply, e.g. 500ms, 2s or 1m30s
    #[arg(long, default_value = "1s", value_parser = parse_timeout)]
    timeout: Duration,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    debug!("{cli:?}");

    // The "mode" group guarantees exactly one of --config and --ping.
    if let Some(path) = &cli.config {
        return run_config(path, cli.attempts, cli.timeout);
    }
    let address = cli.ping.as_deref().context("ping: missing address")?;
    let pubkey = cli.pubkey.as_deref().context("ping: missing --pubkey")?;
    ping(address, pubkey, cli.attempts, cli.timeout)
}

fn run_config(path: &Path, attempts: usize, timeout: Duration) -> Result<()> {
    let t0 = Utc::now();
    let outcomes = run_from_file(
        &RoughtimeProtocol,
        path,
        attempts,
        timeout,
        None,
        &mut LogSink,
    )?;
    let delta = estimate_offset(&outcomes, t0, RADIUS_THRESHOLD)?;
    println!("delta: {}", format_delta(delta));
    Ok(())
}

fn ping(address: &str, pubkey: &str, attempts: usize, timeout: Duration) -> Result<()> {
    let public_key = decode_public_key(pubkey).context("pubkey decode error")?;
    let authority = Authority::udp("", public_key.to_vec(), address);

    let start = Instant::now();
    let record = query(&RoughtimeProtocol, &authority, attempts, timeout, None)
        .context("ping error")?;
    let delay = truncate_to_millis(start.elapsed());
    println!("ping response: {record} (in {delay:?})");
    Ok(())
}

/// A non-zero duration such as `500ms`, `2s` or `1m30s`.
fn parse_timeout(s: &str) -> Result<Duration, String> {
    match humantime::parse_duration(s) {
        Ok(d) if d.is_zero() => Err("timeout must be non-zero".to_string()),
        Ok(d) => Ok(d),
        Err(e) => Err(format!("invalid duration {s:?}: {e}")),
    }
}

fn truncate_to_millis(d: Duration) -> Duration {
    Duration::from_millis(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Signed offset truncated to milliseconds, e.g. `-1.25s`.
fn format_delta(delta: TimeDelta) -> String {
    let ms = delta.num_milliseconds();
    let sign = if ms < 0 { "-" } else { "" };
    format!("{sign}{:?}", Duration::from_millis(ms.unsigned_abs()))
}
