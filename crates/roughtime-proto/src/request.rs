// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Request construction and chained nonce derivation.
//!
//! Every nonce is `SHA-512(previous_reply || blind)`, truncated to the
//! dialect's nonce size. Keeping the blind lets an auditor recompute the nonce
//! later and prove the request was built after `previous_reply` existed.

use rand::RngCore;
use ring::digest;

use crate::error::RoughtimeError;
use crate::types::{IETF_VERSION, MIN_REQUEST_SIZE, Version, tag};
use crate::wire::{build_tag_value_map, encode_envelope};

/// A request ready to send, with the values needed to verify its reply.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Request {
    /// Nonce the authority must sign over.
    pub nonce: Vec<u8>,
    /// Random blind the nonce was derived from.
    pub blind: Vec<u8>,
    /// Encoded request datagram.
    pub bytes: Vec<u8>,
}

/// Build a request whose nonce is chained to `previous_reply`.
///
/// A fresh blind of [`Version::nonce_len`] bytes is drawn from `rng`. With no
/// previous reply the nonce commits to the blind alone, which still lets the
/// first link of a chain be re-derived.
pub fn build_request(
    version: Version,
    rng: &mut dyn RngCore,
    previous_reply: Option<&[u8]>,
) -> Result<Request, RoughtimeError> {
    let mut blind = vec![0u8; version.nonce_len()];
    rng.fill_bytes(&mut blind);

    let mut nonce = vec![0u8; version.nonce_len()];
    chain_nonce(&mut nonce, previous_reply, &blind);

    let bytes = encode_request(version, &nonce)?;
    Ok(Request {
        nonce,
        blind,
        bytes,
    })
}

/// Encode a request carrying `nonce` in the given dialect.
pub fn encode_request(version: Version, nonce: &[u8]) -> Result<Vec<u8>, RoughtimeError> {
    if nonce.len() != version.nonce_len() {
        return Err(RoughtimeError::InvalidNonceLength {
            expected: version.nonce_len(),
            actual: nonce.len(),
        });
    }

    match version {
        Version::Google => {
            // NONC = 0x434e4f4e < PAD\xff = 0xff444150
            let unpadded = build_tag_value_map(&[(&tag::NONC, nonce)]);
            let padding = vec![0u8; padding_len(unpadded.len())];
            Ok(build_tag_value_map(&[
                (&tag::NONC, nonce),
                (&tag::PAD, &padding),
            ]))
        }
        Version::Ietf => {
            // VER\0 < NONC < TYPE < ZZZZ
            let ver = IETF_VERSION.to_le_bytes();
            let msg_type = 0u32.to_le_bytes();
            let unpadded = build_tag_value_map(&[
                (&tag::VER, &ver),
                (&tag::NONC, nonce),
                (&tag::TYPE, &msg_type),
            ]);
            let padding = vec![0u8; padding_len(unpadded.len())];
            let message = build_tag_value_map(&[
                (&tag::VER, &ver),
                (&tag::NONC, nonce),
                (&tag::TYPE, &msg_type),
                (&tag::ZZZZ, &padding),
            ]);
            Ok(encode_envelope(&message))
        }
    }
}

/// Padding needed so that adding one more tag brings the message to
/// [`MIN_REQUEST_SIZE`]. The extra tag costs 8 header bytes.
fn padding_len(unpadded: usize) -> usize {
    MIN_REQUEST_SIZE.saturating_sub(unpadded + 8)
}

/// Derive a chained nonce into `out`.
///
/// Writes the first `out.len()` bytes of `SHA-512(previous_reply || blind)`;
/// an absent previous reply hashes as empty. `out` longer than 64 bytes is
/// only partially written.
pub fn chain_nonce(out: &mut [u8], previous_reply: Option<&[u8]>, blind: &[u8]) {
    let mut ctx = digest::Context::new(&digest::SHA512);
    if let Some(prev) = previous_reply {
        ctx.update(prev);
    }
    ctx.update(blind);
    let hash = ctx.finish();

    let n = out.len().min(hash.as_ref().len());
    out[..n].copy_from_slice(&hash.as_ref()[..n]);
}
