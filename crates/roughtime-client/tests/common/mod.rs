// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Shared helpers for integration tests: loopback Roughtime authorities.

// Integration test helpers are `pub` so each `tests/*.rs` file can import them
// via `mod common`; not every file uses every helper.
#![allow(dead_code, unreachable_pub)]

use std::cell::RefCell;
use std::net::UdpSocket;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::RngCore;
use ring::digest;
use ring::signature::{Ed25519KeyPair, KeyPair};
use roughtime_client::config::Authority;
use roughtime_client::protocol::{Protocol, RoughtimeProtocol};
use roughtime_proto::wire::{TagValueMap, build_tag_value_map, decode_envelope, encode_envelope};
use roughtime_proto::{Request, RoughtimeError, Version, tag};

/// Read deadline used by tests against loopback authorities.
pub const TIMEOUT: Duration = Duration::from_millis(200);

/// Deadline for authorities that never answer.
pub const SHORT_TIMEOUT: Duration = Duration::from_millis(30);

/// 2023-11-14T22:13:20Z
pub const MIDPOINT_US: u64 = 1_700_000_000_000_000;

/// Signs replies the way a single-leaf Roughtime server does.
pub struct Signer {
    root: Ed25519KeyPair,
    online: Ed25519KeyPair,
    version: Version,
    midpoint_us: u64,
    radius_us: u32,
}

impl Signer {
    pub fn new(seed: u8, version: Version, midpoint_us: u64, radius_us: u32) -> Self {
        Signer {
            root: Ed25519KeyPair::from_seed_unchecked(&[seed; 32]).unwrap(),
            online: Ed25519KeyPair::from_seed_unchecked(&[seed.wrapping_add(1); 32]).unwrap(),
            version,
            midpoint_us,
            radius_us,
        }
    }

    pub fn public_key(&self) -> Vec<u8> {
        self.root.public_key().as_ref().to_vec()
    }

    /// The nonce carried by a request datagram.
    pub fn request_nonce(&self, request: &[u8]) -> Vec<u8> {
        let message = if self.version.uses_envelope() {
            decode_envelope(request).unwrap()
        } else {
            request
        };
        TagValueMap::parse(message)
            .unwrap()
            .require(&tag::NONC)
            .unwrap()
            .to_vec()
    }

    /// Reply to a request datagram.
    pub fn reply(&self, request: &[u8]) -> Vec<u8> {
        let nonce = self.request_nonce(request);
        let mut leaf = digest::Context::new(&digest::SHA512);
        leaf.update(&[0x00]);
        leaf.update(&nonce);
        let root = leaf.finish().as_ref()[..self.version.hash_len()].to_vec();

        let srep = build_tag_value_map(&[
            (&tag::RADI, &self.radius_us.to_le_bytes()),
            (&tag::MIDP, &self.midpoint_us.to_le_bytes()),
            (&tag::ROOT, &root),
        ]);
        let dele = build_tag_value_map(&[
            (&tag::PUBK, self.online.public_key().as_ref()),
            (&tag::MINT, &0u64.to_le_bytes()),
            (&tag::MAXT, &u64::MAX.to_le_bytes()),
        ]);
        let cert_sig = self
            .root
            .sign(&[self.version.delegation_context(), dele.as_slice()].concat());
        let cert = build_tag_value_map(&[(&tag::SIG, cert_sig.as_ref()), (&tag::DELE, &dele)]);
        let srep_sig = self
            .online
            .sign(&[self.version.response_context(), srep.as_slice()].concat());

        let index = 0u32.to_le_bytes();
        let message = build_tag_value_map(&[
            (&tag::SIG, srep_sig.as_ref()),
            (&tag::PATH, &[]),
            (&tag::SREP, &srep),
            (&tag::CERT, &cert),
            (&tag::INDX, &index),
        ]);
        if self.version.uses_envelope() {
            encode_envelope(&message)
        } else {
            message
        }
    }
}

/// A signing authority answering on a loopback UDP port until dropped.
pub struct FakeAuthority {
    pub address: String,
    pub public_key: Vec<u8>,
    pub version: Version,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl FakeAuthority {
    pub fn spawn(seed: u8, version: Version, radius_us: u32) -> Self {
        let signer = Signer::new(seed, version, MIDPOINT_US, radius_us);
        let public_key = signer.public_key();

        let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
        sock.set_read_timeout(Some(Duration::from_millis(20))).unwrap();
        let address = sock.local_addr().unwrap().to_string();

        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            let mut buf = [0u8; 2048];
            while !flag.load(Ordering::Relaxed) {
                let Ok((len, peer)) = sock.recv_from(&mut buf) else {
                    continue;
                };
                let _ = sock.send_to(&signer.reply(&buf[..len]), peer);
            }
        });

        FakeAuthority {
            address,
            public_key,
            version,
            stop,
            handle: Some(handle),
        }
    }

    /// Descriptor pointing at this authority.
    pub fn authority(&self, name: &str) -> Authority {
        Authority::udp(name, self.public_key.clone(), self.address.clone())
            .with_version(self.version.to_string())
    }
}

impl Drop for FakeAuthority {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// A bound socket that never answers, so every attempt times out.
pub struct SilentAuthority {
    sock: UdpSocket,
}

impl SilentAuthority {
    pub fn bind() -> Self {
        SilentAuthority {
            sock: UdpSocket::bind("127.0.0.1:0").unwrap(),
        }
    }

    pub fn authority(&self, name: &str) -> Authority {
        Authority::udp(
            name,
            vec![0; 32],
            self.sock.local_addr().unwrap().to_string(),
        )
    }
}

/// [`RoughtimeProtocol`] that remembers the previous reply passed to each
/// `build_request` call.
#[derive(Default)]
pub struct Recording {
    pub previous: RefCell<Vec<Option<Vec<u8>>>>,
}

impl Protocol for Recording {
    fn build_request(
        &self,
        version: Version,
        rng: &mut dyn RngCore,
        previous_reply: Option<&[u8]>,
    ) -> Result<Request, RoughtimeError> {
        self.previous
            .borrow_mut()
            .push(previous_reply.map(<[u8]>::to_vec));
        RoughtimeProtocol.build_request(version, rng, previous_reply)
    }

    fn verify_reply(
        &self,
        version: Version,
        reply: &[u8],
        public_key: &[u8],
        nonce: &[u8],
    ) -> Result<(DateTime<Utc>, Duration), RoughtimeError> {
        RoughtimeProtocol.verify_reply(version, reply, public_key, nonce)
    }

    fn chain_nonce(&self, out: &mut [u8], previous_reply: Option<&[u8]>, blind: &[u8]) {
        RoughtimeProtocol.chain_nonce(out, previous_reply, blind)
    }
}
