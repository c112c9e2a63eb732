// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Blocking single-authority query with bounded retries.
//!
//! Each attempt uses its own UDP socket, connected to the authority and
//! dropped when the attempt ends. Read timeouts move on to the next attempt;
//! any other socket error ends the query.

use std::fmt;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::debug;
use rand::RngCore;

use crate::config::Authority;
use crate::error::{ClientError, ConfigError, Result};
use crate::protocol::{MIN_REQUEST_SIZE, Protocol};

/// Attempts per authority when the caller has no preference.
pub const DEFAULT_QUERY_ATTEMPTS: usize = 3;

/// Per-attempt read deadline when the caller has no preference.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(1);

/// Replies longer than this are truncated.
const RECV_BUF_SIZE: usize = 1024;

/// A verified exchange with one authority.
///
/// The raw request, blind, and reply are kept so the exchange can be
/// re-verified offline as part of a [`Chain`](crate::chain::Chain).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QueryRecord {
    /// Request datagram as sent.
    pub request: Vec<u8>,
    /// Blind the request nonce was derived from.
    pub blind: Vec<u8>,
    /// Reply datagram as received.
    pub reply: Vec<u8>,
    /// Signed midpoint.
    pub midpoint: DateTime<Utc>,
    /// Signed radius of uncertainty.
    pub radius: Duration,
}

impl QueryRecord {
    /// The authority's time: midpoint and radius.
    pub fn now(&self) -> (DateTime<Utc>, Duration) {
        (self.midpoint, self.radius)
    }
}

impl fmt::Display for QueryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ±{:?}", self.midpoint, self.radius)
    }
}

/// Query `authority` with a nonce chained to `previous_reply`.
///
/// Makes up to `attempts` send/receive attempts, each with a read deadline of
/// `timeout`, and verifies the first reply received.
///
/// # Errors
///
/// - [`ClientError::Config`] if `timeout` is zero, the version tag is
///   unrecognized, or there is no usable UDP address.
/// - [`ClientError::NoReply`] if every attempt timed out.
/// - [`ClientError::Recv`] or [`ClientError::Io`] on other socket errors.
/// - [`ClientError::Protocol`] if the reply fails verification.
///
/// # Examples
///
/// ```no_run
/// use roughtime_client::config::{Authority, decode_public_key};
/// use roughtime_client::protocol::RoughtimeProtocol;
/// use roughtime_client::query::{self, DEFAULT_QUERY_ATTEMPTS, DEFAULT_QUERY_TIMEOUT};
///
/// let pk = decode_public_key("0GD7c3yP8xEc4Zl2zeuN2SlLvDVVocjsPSL8/Rl/7zg=").unwrap();
/// let authority = Authority::udp("cloudflare", pk.to_vec(), "roughtime.cloudflare.com:2003")
///     .with_version("IETF-Roughtime");
/// let record = query::query(
///     &RoughtimeProtocol,
///     &authority,
///     DEFAULT_QUERY_ATTEMPTS,
///     DEFAULT_QUERY_TIMEOUT,
///     None,
/// )
/// .unwrap();
/// println!("{record}");
/// ```
pub fn query<P: Protocol + ?Sized>(
    protocol: &P,
    authority: &Authority,
    attempts: usize,
    timeout: Duration,
    previous_reply: Option<&[u8]>,
) -> Result<QueryRecord> {
    query_with_rng(
        protocol,
        authority,
        attempts,
        timeout,
        previous_reply,
        &mut rand::rng(),
    )
}

/// [`query`] with an explicit source for the blind.
pub fn query_with_rng<P: Protocol + ?Sized>(
    protocol: &P,
    authority: &Authority,
    attempts: usize,
    timeout: Duration,
    previous_reply: Option<&[u8]>,
    rng: &mut dyn RngCore,
) -> Result<QueryRecord> {
    if timeout.is_zero() {
        return Err(ConfigError::ZeroTimeout.into());
    }
    let version = authority.version()?;
    let request = protocol.build_request(version, rng, previous_reply)?;
    assert!(
        request.bytes.len() >= MIN_REQUEST_SIZE,
        "request of {} bytes is below the {MIN_REQUEST_SIZE}-byte minimum",
        request.bytes.len()
    );

    let address = authority
        .udp_address()
        .ok_or_else(|| ConfigError::NoUdpAddress {
            name: authority.name.clone(),
        })?;
    let target = resolve(&authority.name, address)?;

    let mut reply = None;
    for attempt in 1..=attempts {
        reply = exchange(target, &request.bytes, timeout)?;
        if reply.is_some() {
            break;
        }
        debug!("roughtime: attempt {attempt}/{attempts} to {target} timed out");
    }
    let reply = reply.ok_or(ClientError::NoReply)?;

    let (midpoint, radius) =
        protocol.verify_reply(version, &reply, &authority.public_key, &request.nonce)?;

    Ok(QueryRecord {
        request: request.bytes,
        blind: request.blind,
        reply,
        midpoint,
        radius,
    })
}

/// One send/receive round on a fresh socket. `None` means the read timed out.
fn exchange(target: SocketAddr, request: &[u8], timeout: Duration) -> Result<Option<Vec<u8>>> {
    let sock = UdpSocket::bind(bind_addr_for(&target))?;
    sock.connect(target)?;
    sock.set_read_timeout(Some(timeout))?;

    let sent = sock.send(request)?;
    debug!("roughtime: sent {sent} bytes to {target}");

    let mut buf = [0u8; RECV_BUF_SIZE];
    match sock.recv(&mut buf) {
        Ok(len) => {
            debug!("roughtime: recv {len} bytes from {target}");
            Ok(Some(buf[..len].to_vec()))
        }
        Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
            Ok(None)
        }
        Err(e) => Err(ClientError::Recv(e)),
    }
}

fn resolve(name: &str, address: &str) -> Result<SocketAddr, ConfigError> {
    let invalid = |detail: String| ConfigError::InvalidAddress {
        name: name.to_string(),
        detail,
    };
    address
        .to_socket_addrs()
        .map_err(|e| invalid(e.to_string()))?
        .next()
        .ok_or_else(|| invalid(format!("{address} resolved to no socket addresses")))
}

/// Wildcard bind address matching the target's family.
fn bind_addr_for(target: &SocketAddr) -> SocketAddr {
    match target {
        SocketAddr::V4(_) => SocketAddr::from(([0, 0, 0, 0], 0)),
        SocketAddr::V6(_) => SocketAddr::from(([0u16; 8], 0)),
    }
}
