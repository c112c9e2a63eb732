// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Reply verification: Ed25519 delegation and response signatures, and the
//! SHA-512 Merkle proof binding our nonce into the signed root.

use ring::{digest, signature};

use crate::error::RoughtimeError;
use crate::types::{self, Version, VerifiedTime, tag};
use crate::wire::{TagValueMap, decode_envelope};

/// Ed25519 signature length.
const SIGNATURE_LEN: usize = 64;

/// Ed25519 public key length.
const PUBLIC_KEY_LEN: usize = 32;

/// Verify `sig` by `public_key` over `context || body`.
fn verify_signature(
    public_key: &[u8],
    context: &[u8],
    body: &[u8],
    sig: &[u8],
) -> Result<(), RoughtimeError> {
    let mut msg = Vec::with_capacity(context.len() + body.len());
    msg.extend_from_slice(context);
    msg.extend_from_slice(body);

    signature::UnparsedPublicKey::new(&signature::ED25519, public_key)
        .verify(&msg, sig)
        .map_err(|_| RoughtimeError::SignatureVerificationFailed)
}

/// SHA-512 of `prefix || parts`, truncated to the dialect's node size.
fn tree_hash(version: Version, prefix: u8, parts: &[&[u8]]) -> Vec<u8> {
    let mut ctx = digest::Context::new(&digest::SHA512);
    ctx.update(&[prefix]);
    for part in parts {
        ctx.update(part);
    }
    ctx.finish().as_ref()[..version.hash_len()].to_vec()
}

/// Walk the Merkle path from the nonce leaf and compare with `root`.
///
/// Bit `i` of `index` says whether the running hash is the right child at
/// level `i`. Bits above the path depth must be clear.
fn verify_merkle_path(
    version: Version,
    nonce: &[u8],
    root: &[u8],
    path: &[u8],
    index: u32,
) -> Result<(), RoughtimeError> {
    let node_len = version.hash_len();
    if root.len() != node_len {
        return Err(RoughtimeError::InvalidTagLength {
            tag: tag::ROOT,
            expected: node_len,
            actual: root.len(),
        });
    }
    if path.len() % node_len != 0 {
        return Err(RoughtimeError::MerkleVerificationFailed);
    }
    let depth = path.len() / node_len;
    if depth < 32 && index >> depth != 0 {
        return Err(RoughtimeError::MerkleVerificationFailed);
    }

    let mut current = tree_hash(version, 0x00, &[nonce]);
    for (level, sibling) in path.chunks_exact(node_len).enumerate() {
        current = if (index >> level) & 1 == 0 {
            tree_hash(version, 0x01, &[&current, sibling])
        } else {
            tree_hash(version, 0x01, &[sibling, &current])
        };
    }

    if current != root {
        return Err(RoughtimeError::MerkleVerificationFailed);
    }
    Ok(())
}

/// Fully verify a reply and extract the signed time.
///
/// 1. Strip the envelope (IETF only) and parse the outer map.
/// 2. Check the long-term key's signature over `DELE`.
/// 3. Check the delegated key's signature over `SREP`.
/// 4. Require `MINT <= MIDP <= MAXT`.
/// 5. Check the Merkle path from `nonce` to `ROOT`.
/// 6. IETF: `TYPE`, if present, must be 1 and `NONC`, if present, must match.
pub fn verify_reply(
    version: Version,
    reply: &[u8],
    public_key: &[u8],
    nonce: &[u8],
) -> Result<VerifiedTime, RoughtimeError> {
    if public_key.len() != PUBLIC_KEY_LEN {
        return Err(RoughtimeError::InvalidPublicKey {
            len: public_key.len(),
        });
    }
    if nonce.len() != version.nonce_len() {
        return Err(RoughtimeError::InvalidNonceLength {
            expected: version.nonce_len(),
            actual: nonce.len(),
        });
    }

    let message = if version.uses_envelope() {
        decode_envelope(reply)?
    } else {
        reply
    };
    let outer = TagValueMap::parse(message)?;

    // Delegation certificate.
    let cert = outer.get_nested(&tag::CERT)?;
    let dele_bytes = cert.require(&tag::DELE)?;
    let cert_sig = cert.require_len(&tag::SIG, SIGNATURE_LEN)?;
    verify_signature(
        public_key,
        version.delegation_context(),
        dele_bytes,
        cert_sig,
    )?;
    let dele = TagValueMap::parse(dele_bytes)?;
    let delegated_pk = dele.require_len(&tag::PUBK, PUBLIC_KEY_LEN)?;

    // Signed response.
    let srep_bytes = outer.require(&tag::SREP)?;
    let srep_sig = outer.require_len(&tag::SIG, SIGNATURE_LEN)?;
    verify_signature(
        delegated_pk,
        version.response_context(),
        srep_bytes,
        srep_sig,
    )?;
    let srep = TagValueMap::parse(srep_bytes)?;
    let midpoint_us = types::read_u64_le(srep.require(&tag::MIDP)?, &tag::MIDP)?;
    let radius_us = types::read_u32_le(srep.require(&tag::RADI)?, &tag::RADI)?;

    let mint = types::read_u64_le(dele.require(&tag::MINT)?, &tag::MINT)?;
    let maxt = types::read_u64_le(dele.require(&tag::MAXT)?, &tag::MAXT)?;
    if midpoint_us < mint || midpoint_us > maxt {
        return Err(RoughtimeError::DelegationExpired);
    }

    let index = types::read_u32_le(outer.require(&tag::INDX)?, &tag::INDX)?;
    verify_merkle_path(
        version,
        nonce,
        srep.require(&tag::ROOT)?,
        outer.require(&tag::PATH)?,
        index,
    )?;

    if version == Version::Ietf {
        if let Some(value) = outer.get(&tag::TYPE) {
            let msg_type = types::read_u32_le(value, &tag::TYPE)?;
            if msg_type != 1 {
                return Err(RoughtimeError::InvalidType { value: msg_type });
            }
        }
        if let Some(echoed) = outer.get(&tag::NONC) {
            if echoed != nonce {
                return Err(RoughtimeError::NonceMismatch);
            }
        }
    }

    Ok(VerifiedTime {
        midpoint_us,
        radius_us,
    })
}
