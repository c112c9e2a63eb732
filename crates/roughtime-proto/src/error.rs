// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Error types for Roughtime message parsing and verification.
//!
//! [`RoughtimeError`] covers three groups of failures: malformed messages
//! (bad framing, tag ordering, missing or mis-sized tags), cryptographic
//! rejections (signatures, Merkle proof, nonce binding, delegation window),
//! and caller input that does not fit the selected dialect.

use thiserror::Error;

/// Errors that can occur during Roughtime message parsing or verification.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum RoughtimeError {
    /// The envelope magic bytes do not match `ROUGHTIM` (LE).
    #[error("invalid Roughtime envelope magic")]
    InvalidMagic,
    /// The message is shorter than the minimum required length.
    #[error("message too short: needed {needed} bytes, got {available}")]
    MessageTooShort {
        /// Number of bytes needed.
        needed: usize,
        /// Number of bytes available.
        available: usize,
    },
    /// Tags in a tag-value map are not in ascending order.
    #[error("tags not in ascending order")]
    InvalidTagOrder,
    /// A tag-value offset points beyond the value region.
    #[error("tag-value offset out of bounds")]
    OffsetOutOfBounds,
    /// A required tag is missing from the message.
    #[error("missing required tag: {}", tag_name(.tag))]
    MissingTag {
        /// The 4-byte ASCII tag that was expected.
        tag: [u8; 4],
    },
    /// A tag's value has an unexpected length.
    #[error(
        "tag {} has invalid length: expected {expected}, got {actual}",
        tag_name(.tag)
    )]
    InvalidTagLength {
        /// The 4-byte ASCII tag.
        tag: [u8; 4],
        /// The expected length.
        expected: usize,
        /// The actual length.
        actual: usize,
    },
    /// Ed25519 signature verification failed.
    #[error("Ed25519 signature verification failed")]
    SignatureVerificationFailed,
    /// The delegation certificate does not cover the midpoint (MIDP outside MINT..MAXT).
    #[error("delegation certificate expired")]
    DelegationExpired,
    /// Merkle tree path verification failed.
    #[error("Merkle tree path verification failed")]
    MerkleVerificationFailed,
    /// The nonce echoed in the response does not match the request.
    #[error("nonce mismatch")]
    NonceMismatch,
    /// The TYPE tag has an unexpected value.
    #[error("invalid TYPE value: {value}")]
    InvalidType {
        /// The TYPE value encountered.
        value: u32,
    },
    /// The long-term public key is not a 32-byte Ed25519 key.
    #[error("public key must be 32 bytes, got {len}")]
    InvalidPublicKey {
        /// Length of the supplied key.
        len: usize,
    },
    /// A nonce or blind does not have the length the dialect requires.
    #[error("nonce must be {expected} bytes, got {actual}")]
    InvalidNonceLength {
        /// Nonce size of the selected dialect.
        expected: usize,
        /// Length of the supplied value.
        actual: usize,
    },
    /// The verified midpoint cannot be represented as a calendar time.
    #[error("midpoint out of range: {midpoint_us} us")]
    TimestampOutOfRange {
        /// Raw MIDP value in microseconds since the Unix epoch.
        midpoint_us: u64,
    },
}

fn tag_name(tag: &[u8; 4]) -> &str {
    core::str::from_utf8(tag).unwrap_or("????")
}
