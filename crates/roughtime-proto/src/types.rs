// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Roughtime dialects, tag constants, and the verified time value.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::RoughtimeError;

/// Minimum size of a request message; servers drop anything smaller to
/// prevent amplification.
pub const MIN_REQUEST_SIZE: usize = 1024;

/// Value of the `VER` tag sent in IETF requests.
pub const IETF_VERSION: u32 = 1;

/// Well-known Roughtime tags.
///
/// Tags are 4-byte ASCII values compared as little-endian `u32` for sort order.
pub mod tag {
    /// Certificate: contains nested DELE and SIG.
    pub const CERT: [u8; 4] = *b"CERT";
    /// Delegation: contains MINT, MAXT, PUBK.
    pub const DELE: [u8; 4] = *b"DELE";
    /// Index of the nonce leaf in the Merkle tree.
    pub const INDX: [u8; 4] = *b"INDX";
    /// Delegated public key (32 bytes, Ed25519).
    pub const PUBK: [u8; 4] = *b"PUBK";
    /// Midpoint timestamp (microseconds since Unix epoch).
    pub const MIDP: [u8; 4] = *b"MIDP";
    /// Start of the delegation window.
    pub const MINT: [u8; 4] = *b"MINT";
    /// End of the delegation window.
    pub const MAXT: [u8; 4] = *b"MAXT";
    /// Client nonce.
    pub const NONC: [u8; 4] = *b"NONC";
    /// Google-dialect request padding.
    pub const PAD: [u8; 4] = *b"PAD\xff";
    /// Merkle sibling hashes from leaf to root.
    pub const PATH: [u8; 4] = *b"PATH";
    /// Radius of uncertainty (microseconds).
    pub const RADI: [u8; 4] = *b"RADI";
    /// Merkle tree root.
    pub const ROOT: [u8; 4] = *b"ROOT";
    /// Ed25519 signature (64 bytes).
    pub const SIG: [u8; 4] = *b"SIG\0";
    /// Signed response: contains MIDP, RADI, ROOT.
    pub const SREP: [u8; 4] = *b"SREP";
    /// Message type (0 = request, 1 = response).
    pub const TYPE: [u8; 4] = *b"TYPE";
    /// Protocol version (single u32).
    pub const VER: [u8; 4] = *b"VER\0";
    /// IETF-dialect request padding.
    pub const ZZZZ: [u8; 4] = *b"ZZZZ";
}

/// Wire dialect spoken by an authority.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Version {
    /// The original Google Roughtime protocol.
    Google,
    /// The IETF draft protocol (`ROUGHTIM` envelope, 32-byte nonces).
    Ietf,
}

impl Version {
    /// Resolve a configuration version tag.
    ///
    /// An empty tag selects [`Version::Google`]; unknown tags yield `None`.
    pub fn from_tag(tag: &str) -> Option<Version> {
        match tag {
            "IETF-Roughtime" => Some(Version::Ietf),
            "Google-Roughtime" | "" => Some(Version::Google),
            _ => None,
        }
    }

    /// Size of the nonce and of the blind, in bytes.
    pub fn nonce_len(self) -> usize {
        match self {
            Version::Google => 64,
            Version::Ietf => 32,
        }
    }

    /// Size of a Merkle tree node, in bytes.
    pub fn hash_len(self) -> usize {
        self.nonce_len()
    }

    /// Prefix of the message signed by the long-term key over `DELE`.
    pub fn delegation_context(self) -> &'static [u8] {
        match self {
            Version::Google => b"RoughTime v1 delegation signature--\0",
            Version::Ietf => b"RoughTime v1 delegation signature\0",
        }
    }

    /// Prefix of the message signed by the delegated key over `SREP`.
    pub fn response_context(self) -> &'static [u8] {
        b"RoughTime v1 response signature\0"
    }

    /// Whether messages are framed in a `ROUGHTIM` envelope.
    pub fn uses_envelope(self) -> bool {
        matches!(self, Version::Ietf)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Google => f.write_str("Google-Roughtime"),
            Version::Ietf => f.write_str("IETF-Roughtime"),
        }
    }
}

/// Midpoint and radius extracted from a verified reply.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VerifiedTime {
    /// Midpoint timestamp in microseconds since Unix epoch.
    pub midpoint_us: u64,
    /// Radius of uncertainty in microseconds.
    pub radius_us: u32,
}

impl VerifiedTime {
    /// Midpoint as a UTC calendar time.
    pub fn midpoint(&self) -> Result<DateTime<Utc>, RoughtimeError> {
        let out_of_range = RoughtimeError::TimestampOutOfRange {
            midpoint_us: self.midpoint_us,
        };
        let secs = i64::try_from(self.midpoint_us / 1_000_000).map_err(|_| out_of_range.clone())?;
        let nanos = (self.midpoint_us % 1_000_000) as u32 * 1_000;
        DateTime::from_timestamp(secs, nanos).ok_or(out_of_range)
    }

    /// Radius as a duration.
    pub fn radius(&self) -> Duration {
        Duration::from_micros(u64::from(self.radius_us))
    }
}

pub(crate) fn read_u64_le(data: &[u8], tag: &[u8; 4]) -> Result<u64, RoughtimeError> {
    let bytes: [u8; 8] = data
        .try_into()
        .map_err(|_| RoughtimeError::InvalidTagLength {
            tag: *tag,
            expected: 8,
            actual: data.len(),
        })?;
    Ok(u64::from_le_bytes(bytes))
}

pub(crate) fn read_u32_le(data: &[u8], tag: &[u8; 4]) -> Result<u32, RoughtimeError> {
    let bytes: [u8; 4] = data
        .try_into()
        .map_err(|_| RoughtimeError::InvalidTagLength {
            tag: *tag,
            expected: 4,
            actual: data.len(),
        })?;
    Ok(u32::from_le_bytes(bytes))
}
