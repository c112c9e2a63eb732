// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! The wire and crypto capability consumed by the query, chain, and
//! aggregation layers.
//!
//! Everything above this module talks to Roughtime only through
//! [`Protocol`], so a test double with canned answers can stand in for real
//! keys and real replies.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::RngCore;
use roughtime_proto::{Request, RoughtimeError, Version};

pub use roughtime_proto::MIN_REQUEST_SIZE;

/// Request building, reply verification, and nonce chaining.
pub trait Protocol {
    /// Build a request whose nonce is chained to `previous_reply`.
    ///
    /// Implementations must return at least [`MIN_REQUEST_SIZE`] bytes of
    /// message.
    fn build_request(
        &self,
        version: Version,
        rng: &mut dyn RngCore,
        previous_reply: Option<&[u8]>,
    ) -> Result<Request, RoughtimeError>;

    /// Verify `reply` against `public_key` and `nonce`, returning the signed
    /// midpoint and radius.
    fn verify_reply(
        &self,
        version: Version,
        reply: &[u8],
        public_key: &[u8],
        nonce: &[u8],
    ) -> Result<(DateTime<Utc>, Duration), RoughtimeError>;

    /// Fill `out` with the nonce derived from `previous_reply` and `blind`.
    fn chain_nonce(&self, out: &mut [u8], previous_reply: Option<&[u8]>, blind: &[u8]);
}

/// [`Protocol`] backed by `roughtime-proto`.
#[derive(Clone, Copy, Debug, Default)]
pub struct RoughtimeProtocol;

impl Protocol for RoughtimeProtocol {
    fn build_request(
        &self,
        version: Version,
        rng: &mut dyn RngCore,
        previous_reply: Option<&[u8]>,
    ) -> Result<Request, RoughtimeError> {
        roughtime_proto::build_request(version, rng, previous_reply)
    }

    fn verify_reply(
        &self,
        version: Version,
        reply: &[u8],
        public_key: &[u8],
        nonce: &[u8],
    ) -> Result<(DateTime<Utc>, Duration), RoughtimeError> {
        let time = roughtime_proto::verify_reply(version, reply, public_key, nonce)?;
        Ok((time.midpoint()?, time.radius()))
    }

    fn chain_nonce(&self, out: &mut [u8], previous_reply: Option<&[u8]>, blind: &[u8]) {
        roughtime_proto::chain_nonce(out, previous_reply, blind)
    }
}
