// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Error types for the Roughtime client.
//!
//! [`ClientError`] groups failures by what the caller can do about them:
//! configuration problems are fatal to one authority (or to loading a whole
//! batch), transport and verification failures are terminal for one query,
//! and chain or aggregation failures are terminal for that computation.
//!
//! Callers that need an [`io::Error`] can convert; the typed error stays
//! reachable through `io::Error::get_ref()`:
//!
//! ```
//! use roughtime_client::error::{AggregateError, ClientError};
//!
//! let err: std::io::Error = ClientError::Aggregate(AggregateError::NoResults).into();
//! let inner = err.get_ref().and_then(|e| e.downcast_ref::<ClientError>());
//! assert!(matches!(inner, Some(ClientError::Aggregate(AggregateError::NoResults))));
//! ```

use std::io;
use std::path::PathBuf;

use roughtime_proto::RoughtimeError;
use thiserror::Error;

/// Result alias used across the client.
pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Errors that can occur during Roughtime client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Invalid or unsupported authority configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Every attempt timed out.
    #[error("no reply")]
    NoReply,
    /// A read failed for a reason other than the deadline.
    #[error("reading from socket: {0}")]
    Recv(io::Error),
    /// Socket setup or send failure.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The reply failed verification.
    #[error(transparent)]
    Protocol(#[from] RoughtimeError),
    /// Offline re-verification of a chain failed.
    #[error(transparent)]
    Chain(#[from] ChainError),
    /// The offset estimate could not be computed.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The version tag names no supported dialect.
    #[error("unrecognized version for server {name}: {version}")]
    UnrecognizedVersion {
        /// Authority name.
        name: String,
        /// The offending tag.
        version: String,
    },
    /// The authority advertises no UDP address.
    #[error("{name:?} lists no UDP address")]
    NoUdpAddress {
        /// Authority name.
        name: String,
    },
    /// The UDP address did not resolve to a socket address.
    #[error("{name:?} lists invalid address: {detail}")]
    InvalidAddress {
        /// Authority name.
        name: String,
        /// Resolver detail.
        detail: String,
    },
    /// A zero read deadline cannot be set on a socket.
    #[error("query timeout must be non-zero")]
    ZeroTimeout,
    /// Two authorities in one batch share a name.
    #[error("duplicate server name: {name:?}")]
    DuplicateName {
        /// The repeated name.
        name: String,
    },
    /// An Ed25519 key that is not 32 bytes, or not valid base64.
    #[error("invalid public key for {name:?}: {detail}")]
    InvalidPublicKey {
        /// Authority name.
        name: String,
        /// What was wrong with it.
        detail: String,
    },
    /// The configuration is not valid JSON of the expected shape.
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// The configuration file could not be read.
    #[error("reading {}: {source}", .path.display())]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// The file lists no authority this client can query.
    #[error("{} has no suitable servers", .path.display())]
    NoSuitableServers {
        /// The configuration file.
        path: PathBuf,
    },
    /// Some listed authorities would be silently skipped.
    #[error("would skip {count} servers")]
    WouldSkip {
        /// Number of skipped authorities.
        count: usize,
    },
}

/// Chain re-verification errors, located by link.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The link's authority has an unusable configuration.
    #[error("link {index} ({name}): {source}")]
    Config {
        /// Position of the link, head = 0.
        index: usize,
        /// Authority name.
        name: String,
        /// Underlying error.
        source: ConfigError,
    },
    /// The stored reply no longer verifies against the re-derived nonce.
    #[error("link {index} ({name}): {source}")]
    Verification {
        /// Position of the link, head = 0.
        index: usize,
        /// Authority name.
        name: String,
        /// Underlying error.
        source: RoughtimeError,
    },
    /// The reply verifies but disagrees with the stored midpoint or radius.
    #[error("link {index} ({name}): timestamp mismatch")]
    TimestampMismatch {
        /// Position of the link, head = 0.
        index: usize,
        /// Authority name.
        name: String,
    },
}

/// Offset estimation errors.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum AggregateError {
    /// No outcomes were supplied.
    #[error("no results")]
    NoResults,
    /// Every outcome failed or exceeded the radius threshold.
    #[error("no valid responses")]
    NoValidResponses,
    /// An offset or accumulated delay does not fit a signed duration.
    #[error("offset out of range")]
    OutOfRange,
}

impl From<ClientError> for io::Error {
    fn from(err: ClientError) -> io::Error {
        let kind = match &err {
            ClientError::Config(_) => io::ErrorKind::InvalidInput,
            ClientError::NoReply => io::ErrorKind::TimedOut,
            ClientError::Recv(e) | ClientError::Io(e) => e.kind(),
            ClientError::Protocol(_) | ClientError::Chain(_) => io::ErrorKind::InvalidData,
            ClientError::Aggregate(_) => io::ErrorKind::Other,
        };
        if let ClientError::Io(e) = err {
            return e;
        }
        io::Error::new(kind, err)
    }
}
