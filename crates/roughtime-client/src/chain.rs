// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Offline-auditable chain of successful queries.
//!
//! Every nonce in a sequence is a one-way function of the previous
//! successful reply. Re-deriving each nonce from the stored blinds and
//! re-verifying each stored reply proves, without network access, that every
//! reply was produced after the one before it.

use crate::config::Authority;
use crate::error::{ChainError, Result};
use crate::protocol::Protocol;
use crate::query::QueryRecord;
use crate::sequence::Outcome;

/// One successful query in a [`Chain`].
#[derive(Clone, Copy, Debug)]
pub struct Link<'a> {
    /// The verified exchange.
    pub record: &'a QueryRecord,
    /// The authority that produced it.
    pub authority: &'a Authority,
    /// Index of the following link; `None` at the tail.
    pub next: Option<usize>,
}

/// Successful outcomes of a sequence, linked in their original order.
#[derive(Clone, Debug, Default)]
pub struct Chain<'a> {
    links: Vec<Link<'a>>,
}

impl<'a> Chain<'a> {
    /// Link the successful outcomes, skipping failures.
    pub fn build(outcomes: &'a [Outcome]) -> Self {
        let mut links: Vec<Link<'a>> = outcomes
            .iter()
            .filter_map(|o| {
                o.record().map(|record| Link {
                    record,
                    authority: &o.authority,
                    next: None,
                })
            })
            .collect();
        let len = links.len();
        for (i, link) in links.iter_mut().enumerate() {
            link.next = (i + 1 < len).then_some(i + 1);
        }
        Chain { links }
    }

    /// The first link, if any.
    pub fn head(&self) -> Option<&Link<'a>> {
        self.links.first()
    }

    /// The link following `link`.
    pub fn successor(&self, link: &Link<'a>) -> Option<&Link<'a>> {
        link.next.and_then(|i| self.links.get(i))
    }

    /// Number of links.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether the chain has no links.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Links from head to tail.
    pub fn iter(&self) -> impl Iterator<Item = &Link<'a>> {
        std::iter::successors(self.head(), move |link| self.successor(link))
    }

    /// Re-verify every link, starting from `previous_reply`.
    ///
    /// Each link's nonce is re-derived from the preceding reply and its
    /// stored blind; the stored reply must verify against it and reproduce
    /// the stored midpoint and radius. The dialect is taken from each link's
    /// own authority. Stops at the first failing link.
    pub fn verify<P: Protocol + ?Sized>(
        &self,
        protocol: &P,
        previous_reply: Option<&[u8]>,
    ) -> Result<()> {
        let mut previous = previous_reply;
        for (index, link) in self.iter().enumerate() {
            let name = || link.authority.name.clone();
            let version = link
                .authority
                .version()
                .map_err(|source| ChainError::Config {
                    index,
                    name: name(),
                    source,
                })?;

            let mut nonce = vec![0u8; version.nonce_len()];
            protocol.chain_nonce(&mut nonce, previous, &link.record.blind);

            let (midpoint, radius) = protocol
                .verify_reply(
                    version,
                    &link.record.reply,
                    &link.authority.public_key,
                    &nonce,
                )
                .map_err(|source| ChainError::Verification {
                    index,
                    name: name(),
                    source,
                })?;
            if midpoint != link.record.midpoint || radius != link.record.radius {
                return Err(ChainError::TimestampMismatch {
                    index,
                    name: name(),
                }
                .into());
            }

            previous = Some(link.record.reply.as_slice());
        }
        Ok(())
    }

    /// Whether [`verify`](Chain::verify) succeeds.
    pub fn is_valid<P: Protocol + ?Sized>(
        &self,
        protocol: &P,
        previous_reply: Option<&[u8]>,
    ) -> bool {
        self.verify(protocol, previous_reply).is_ok()
    }
}
