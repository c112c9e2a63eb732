// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Chained, auditable Roughtime client.
//!
//! Queries a list of Roughtime authorities one after another, deriving each
//! request nonce from the previous successful reply. The resulting
//! [`Chain`](chain::Chain) can be re-verified offline to prove the replies
//! were produced in order, and [`estimate_offset`](aggregate::estimate_offset)
//! turns the outcomes into a delay-corrected clock offset.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use roughtime_client::aggregate::estimate_offset;
//! use roughtime_client::chain::Chain;
//! use roughtime_client::protocol::RoughtimeProtocol;
//! use roughtime_client::query::{DEFAULT_QUERY_ATTEMPTS, DEFAULT_QUERY_TIMEOUT};
//! use roughtime_client::sequence::{LogSink, run_from_file};
//!
//! # fn main() -> roughtime_client::error::Result<()> {
//! let t0 = chrono::Utc::now();
//! let outcomes = run_from_file(
//!     &RoughtimeProtocol,
//!     "roughtime.json",
//!     DEFAULT_QUERY_ATTEMPTS,
//!     DEFAULT_QUERY_TIMEOUT,
//!     None,
//!     &mut LogSink,
//! )?;
//!
//! Chain::build(&outcomes).verify(&RoughtimeProtocol, None)?;
//! let offset = estimate_offset(&outcomes, t0, Duration::from_secs(10))?;
//! println!("delta: {offset}");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

/// Delay-corrected offset estimation.
pub mod aggregate;
/// Offline re-verification of a query sequence.
pub mod chain;
/// Authority configuration.
pub mod config;
/// Client error types.
pub mod error;
/// The wire and crypto seam.
pub mod protocol;
/// Single-authority queries.
pub mod query;
/// Sequential chained querying.
pub mod sequence;

pub use roughtime_proto::Version;
