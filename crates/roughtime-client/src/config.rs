// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Authority descriptors and the JSON server list.
//!
//! ```json
//! {
//!   "servers": [
//!     {
//!       "name": "Cloudflare-Roughtime",
//!       "version": "IETF-Roughtime",
//!       "publicKeyType": "ed25519",
//!       "publicKey": "0GD7c3yP8xEc4Zl2zeuN2SlLvDVVocjsPSL8/Rl/7zg=",
//!       "addresses": [{ "protocol": "udp", "address": "roughtime.cloudflare.com:2003" }]
//!     }
//!   ]
//! }
//! ```
//!
//! Only Ed25519 authorities reachable over UDP are usable; others are
//! skipped and counted rather than rejected.

use std::collections::HashSet;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use roughtime_proto::Version;
use serde::Deserialize;

use crate::error::ConfigError;

/// The only accepted public key type.
pub const ED25519: &str = "ed25519";

/// Length of an Ed25519 public key.
pub const PUBLIC_KEY_LEN: usize = 32;

/// A remote time authority.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authority {
    /// Name, unique within a batch.
    pub name: String,
    /// Version tag selecting the wire dialect; empty means Google.
    #[serde(default)]
    pub version: String,
    /// Key algorithm; only `ed25519` is supported.
    pub public_key_type: String,
    /// Long-term public key (base64 in JSON).
    #[serde(with = "base64_bytes")]
    pub public_key: Vec<u8>,
    /// Transport addresses in preference order.
    pub addresses: Vec<AuthorityAddress>,
}

/// One transport endpoint of an authority.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct AuthorityAddress {
    /// Transport, e.g. `udp`, `udp4`, `udp6`, `tcp`.
    pub protocol: String,
    /// `host:port`.
    pub address: String,
}

#[derive(Deserialize)]
struct ServerList {
    servers: Vec<Authority>,
}

impl Authority {
    /// An Ed25519 authority with a single UDP address and the default dialect.
    pub fn udp(name: impl Into<String>, public_key: Vec<u8>, address: impl Into<String>) -> Self {
        Authority {
            name: name.into(),
            version: String::new(),
            public_key_type: ED25519.to_string(),
            public_key,
            addresses: vec![AuthorityAddress {
                protocol: "udp".to_string(),
                address: address.into(),
            }],
        }
    }

    /// Replace the version tag.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Resolve the version tag to a dialect.
    pub fn version(&self) -> Result<Version, ConfigError> {
        Version::from_tag(&self.version).ok_or_else(|| ConfigError::UnrecognizedVersion {
            name: self.name.clone(),
            version: self.version.clone(),
        })
    }

    /// First address advertised for UDP.
    pub fn udp_address(&self) -> Option<&str> {
        self.addresses
            .iter()
            .find(|a| matches!(a.protocol.as_str(), "udp" | "udp4" | "udp6"))
            .map(|a| a.address.as_str())
    }
}

/// Parse a JSON server list.
///
/// Returns the usable authorities in file order and the number skipped for
/// an unsupported key type or a missing UDP address. A duplicate name, a
/// malformed Ed25519 key, or a malformed UDP address fails the whole batch.
pub fn parse_config(json: &[u8]) -> Result<(Vec<Authority>, usize), ConfigError> {
    let list: ServerList = serde_json::from_slice(json)?;

    let mut seen = HashSet::new();
    let mut servers = Vec::with_capacity(list.servers.len());
    let mut skipped = 0;
    for server in list.servers {
        if !seen.insert(server.name.clone()) {
            return Err(ConfigError::DuplicateName { name: server.name });
        }
        if server.public_key_type != ED25519 {
            skipped += 1;
            continue;
        }
        if server.public_key.len() != PUBLIC_KEY_LEN {
            return Err(ConfigError::InvalidPublicKey {
                detail: format!(
                    "must be {PUBLIC_KEY_LEN} bytes, got {}",
                    server.public_key.len()
                ),
                name: server.name,
            });
        }
        let Some(address) = server.udp_address() else {
            skipped += 1;
            continue;
        };
        check_host_port(address).map_err(|detail| ConfigError::InvalidAddress {
            name: server.name.clone(),
            detail,
        })?;
        servers.push(server);
    }
    Ok((servers, skipped))
}

/// Read and parse a JSON server list from `path`.
pub fn load_config(path: impl AsRef<Path>) -> Result<(Vec<Authority>, usize), ConfigError> {
    let path = path.as_ref();
    let json = std::fs::read(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&json)
}

/// Decode a standalone base64 Ed25519 public key.
pub fn decode_public_key(encoded: &str) -> Result<[u8; PUBLIC_KEY_LEN], ConfigError> {
    let invalid = |detail: String| ConfigError::InvalidPublicKey {
        name: String::new(),
        detail,
    };
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| invalid(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| invalid(format!("must be {PUBLIC_KEY_LEN} bytes, got {}", b.len())))
}

/// Syntactic `host:port` check; resolution happens at query time.
fn check_host_port(address: &str) -> Result<(), String> {
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| format!("missing port in {address:?}"))?;
    if host.is_empty() {
        return Err(format!("missing host in {address:?}"));
    }
    port.parse::<u16>()
        .map(|_| ())
        .map_err(|e| format!("bad port in {address:?}: {e}"))
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer};

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(d)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
