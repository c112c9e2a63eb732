// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Sequential, chained querying of a list of authorities.
//!
//! Authorities are queried strictly one after another. Each request's nonce
//! is derived from the last *successful* reply, so a failed authority leaves
//! the cursor where it was and the next one chains past it.

use std::path::Path;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::config::{Authority, load_config};
use crate::error::{ClientError, ConfigError, Result};
use crate::protocol::Protocol;
use crate::query::{QueryRecord, query};

/// The result of querying one authority within a sequence.
#[derive(Debug)]
pub struct Outcome {
    /// The authority that was queried.
    pub authority: Authority,
    /// Wall-clock time spent on the query, retries included.
    pub delay: Duration,
    result: Result<QueryRecord>,
}

impl Outcome {
    /// A successful outcome.
    pub fn success(authority: Authority, delay: Duration, record: QueryRecord) -> Self {
        Outcome {
            authority,
            delay,
            result: Ok(record),
        }
    }

    /// A failed outcome.
    pub fn failure(authority: Authority, delay: Duration, error: ClientError) -> Self {
        Outcome {
            authority,
            delay,
            result: Err(error),
        }
    }

    /// The verified record, if the query succeeded.
    pub fn record(&self) -> Option<&QueryRecord> {
        self.result.as_ref().ok()
    }

    /// Why the query failed, if it did.
    pub fn error(&self) -> Option<&ClientError> {
        self.result.as_ref().err()
    }

    /// Whether the query succeeded.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Receives per-authority progress from [`run_sequence`].
pub trait QuerySink {
    /// `authority` answered after `delay`.
    fn success(&mut self, authority: &Authority, record: &QueryRecord, delay: Duration);

    /// `authority` failed and the sequence moved on.
    fn skipped(&mut self, authority: &Authority, error: &ClientError);
}

/// Forwards sequence progress to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl QuerySink for LogSink {
    fn success(&mut self, authority: &Authority, record: &QueryRecord, delay: Duration) {
        let delay = Duration::from_millis(delay.as_millis() as u64);
        info!("{}: {} (in {:?})", authority.name, record, delay);
    }

    fn skipped(&mut self, authority: &Authority, error: &ClientError) {
        warn!("skipped {}: {}", authority.name, error);
    }
}

/// Drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct Discard;

impl QuerySink for Discard {
    fn success(&mut self, _: &Authority, _: &QueryRecord, _: Duration) {}

    fn skipped(&mut self, _: &Authority, _: &ClientError) {}
}

/// Query each authority in order, chaining every nonce to the last
/// successful reply, starting from `previous_reply`.
///
/// Always returns one [`Outcome`] per authority, in input order; a failing
/// authority is recorded and never stops the sequence.
pub fn run_sequence<P: Protocol + ?Sized>(
    protocol: &P,
    authorities: &[Authority],
    attempts: usize,
    timeout: Duration,
    previous_reply: Option<&[u8]>,
    sink: &mut dyn QuerySink,
) -> Vec<Outcome> {
    let mut outcomes: Vec<Outcome> = Vec::with_capacity(authorities.len());
    // Index of the outcome holding the last successful reply.
    let mut cursor: Option<usize> = None;

    for authority in authorities {
        let previous = match cursor {
            Some(i) => outcomes[i].record().map(|r| r.reply.as_slice()),
            None => previous_reply,
        };

        let start = Instant::now();
        let result = query(protocol, authority, attempts, timeout, previous);
        let delay = start.elapsed();

        let outcome = match result {
            Ok(record) => {
                sink.success(authority, &record, delay);
                cursor = Some(outcomes.len());
                Outcome::success(authority.clone(), delay, record)
            }
            Err(error) => {
                sink.skipped(authority, &error);
                Outcome::failure(authority.clone(), delay, error)
            }
        };
        outcomes.push(outcome);
    }
    outcomes
}

/// Load authorities from the JSON file at `path` and run them as a
/// sequence.
///
/// Stricter than [`load_config`]: a file with no usable authority, or one
/// in which any authority would be skipped, is rejected.
pub fn run_from_file<P: Protocol + ?Sized>(
    protocol: &P,
    path: impl AsRef<Path>,
    attempts: usize,
    timeout: Duration,
    previous_reply: Option<&[u8]>,
    sink: &mut dyn QuerySink,
) -> Result<Vec<Outcome>> {
    let path = path.as_ref();
    let (authorities, skipped) = load_config(path)?;
    if authorities.is_empty() {
        return Err(ConfigError::NoSuitableServers {
            path: path.to_path_buf(),
        }
        .into());
    }
    if skipped > 0 {
        return Err(ConfigError::WouldSkip { count: skipped }.into());
    }
    Ok(run_sequence(
        protocol,
        &authorities,
        attempts,
        timeout,
        previous_reply,
        sink,
    ))
}
