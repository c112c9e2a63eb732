// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Roughtime protocol primitives: wire codec, chained request building, and
//! reply verification.
//!
//! Two dialects are supported, selected by [`Version`]: the original Google
//! protocol (bare messages, 64-byte nonces) and the IETF draft (`ROUGHTIM`
//! envelope, 32-byte nonces). Both use Ed25519 signatures and SHA-512 Merkle
//! trees.
//!
//! # Usage
//!
//! ```no_run
//! use roughtime_proto::{Version, build_request, verify_reply};
//!
//! let mut rng = rand::rng();
//! let request = build_request(Version::Google, &mut rng, None).unwrap();
//!
//! // Send `request.bytes` to the authority over UDP and read `reply`.
//! # let reply = vec![];
//! # let public_key = [0u8; 32];
//! let time = verify_reply(Version::Google, &reply, &public_key, &request.nonce).unwrap();
//! println!("midpoint {}us ±{}us", time.midpoint_us, time.radius_us);
//! ```

#![warn(missing_docs)]

mod crypto;
mod error;
mod request;
mod types;
pub mod wire;

pub use crypto::verify_reply;
pub use error::RoughtimeError;
pub use request::{Request, build_request, chain_nonce, encode_request};
pub use types::{IETF_VERSION, MIN_REQUEST_SIZE, Version, VerifiedTime, tag};
