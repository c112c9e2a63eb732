// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Tag-value map codec shared by both Roughtime dialects.
//!
//! A message is a header followed by a value region:
//!
//! ```text
//! num_tags: u32 LE
//! offsets:  [u32 LE; N-1]   (end of each value but the last, relative to the value region)
//! tags:     [[u8; 4]; N]    (strictly ascending as LE u32)
//! values:   [u8]
//! ```
//!
//! IETF messages are additionally framed by an envelope: the magic
//! `ROUGHTIM` (as a LE u64) and a u32 LE length. Google messages travel bare.

use crate::error::RoughtimeError;

/// `"ROUGHTIM"` read as a little-endian u64.
const ENVELOPE_MAGIC: u64 = 0x4d49_5448_4755_4f52;

/// Envelope header: 8 bytes magic + 4 bytes length.
pub const ENVELOPE_HEADER_LEN: usize = 12;

/// A parsed tag-value map borrowing the message it was parsed from.
#[derive(Debug, PartialEq)]
pub struct TagValueMap<'a> {
    tags: &'a [u8],
    offsets: &'a [u8],
    values: &'a [u8],
}

impl<'a> TagValueMap<'a> {
    /// Parse and validate the header of a tag-value map.
    ///
    /// Tags must be strictly ascending and offsets must be non-decreasing and
    /// inside the value region; values are not interpreted.
    pub fn parse(buf: &'a [u8]) -> Result<Self, RoughtimeError> {
        if buf.len() < 4 {
            return Err(RoughtimeError::MessageTooShort {
                needed: 4,
                available: buf.len(),
            });
        }
        let count = le_u32(buf, 0) as usize;
        if count == 0 {
            return Ok(TagValueMap {
                tags: &[],
                offsets: &[],
                values: &buf[4..],
            });
        }

        let header_len = count
            .checked_mul(8)
            .ok_or(RoughtimeError::OffsetOutOfBounds)?;
        if buf.len() < header_len {
            return Err(RoughtimeError::MessageTooShort {
                needed: header_len,
                available: buf.len(),
            });
        }
        let offsets_end = 4 + (count - 1) * 4;
        let offsets = &buf[4..offsets_end];
        let tags = &buf[offsets_end..header_len];
        let values = &buf[header_len..];

        let ascending = tags
            .chunks_exact(4)
            .zip(tags.chunks_exact(4).skip(1))
            .all(|(a, b)| le_u32(a, 0) < le_u32(b, 0));
        if !ascending {
            return Err(RoughtimeError::InvalidTagOrder);
        }

        let mut floor = 0usize;
        for chunk in offsets.chunks_exact(4) {
            let off = le_u32(chunk, 0) as usize;
            if off < floor || off > values.len() {
                return Err(RoughtimeError::OffsetOutOfBounds);
            }
            floor = off;
        }

        Ok(TagValueMap {
            tags,
            offsets,
            values,
        })
    }

    /// Number of tags in the map.
    pub fn len(&self) -> usize {
        self.tags.len() / 4
    }

    /// Whether the map carries no tags.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Value of `tag`, if present.
    pub fn get(&self, tag: &[u8; 4]) -> Option<&'a [u8]> {
        let want = le_u32(tag, 0);
        let idx = self
            .tags
            .chunks_exact(4)
            .position(|t| le_u32(t, 0) == want)?;
        let start = if idx == 0 {
            0
        } else {
            le_u32(self.offsets, (idx - 1) * 4) as usize
        };
        let end = if idx + 1 == self.len() {
            self.values.len()
        } else {
            le_u32(self.offsets, idx * 4) as usize
        };
        Some(&self.values[start..end])
    }

    /// Value of `tag`, or [`RoughtimeError::MissingTag`].
    pub fn require(&self, tag: &[u8; 4]) -> Result<&'a [u8], RoughtimeError> {
        self.get(tag).ok_or(RoughtimeError::MissingTag { tag: *tag })
    }

    /// Value of `tag` checked to be exactly `len` bytes.
    pub fn require_len(&self, tag: &[u8; 4], len: usize) -> Result<&'a [u8], RoughtimeError> {
        let value = self.require(tag)?;
        if value.len() != len {
            return Err(RoughtimeError::InvalidTagLength {
                tag: *tag,
                expected: len,
                actual: value.len(),
            });
        }
        Ok(value)
    }

    /// Parse the value of `tag` as a nested map.
    pub fn get_nested(&self, tag: &[u8; 4]) -> Result<TagValueMap<'a>, RoughtimeError> {
        TagValueMap::parse(self.require(tag)?)
    }
}

/// Strip the `ROUGHTIM` envelope, returning the framed message.
///
/// Bytes past the declared length are ignored.
pub fn decode_envelope(buf: &[u8]) -> Result<&[u8], RoughtimeError> {
    if buf.len() < ENVELOPE_HEADER_LEN {
        return Err(RoughtimeError::MessageTooShort {
            needed: ENVELOPE_HEADER_LEN,
            available: buf.len(),
        });
    }
    let mut magic = [0u8; 8];
    magic.copy_from_slice(&buf[..8]);
    if u64::from_le_bytes(magic) != ENVELOPE_MAGIC {
        return Err(RoughtimeError::InvalidMagic);
    }
    let total = ENVELOPE_HEADER_LEN + le_u32(buf, 8) as usize;
    if buf.len() < total {
        return Err(RoughtimeError::MessageTooShort {
            needed: total,
            available: buf.len(),
        });
    }
    Ok(&buf[ENVELOPE_HEADER_LEN..total])
}

/// Frame `message` in a `ROUGHTIM` envelope.
pub fn encode_envelope(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(ENVELOPE_HEADER_LEN + message.len());
    out.extend_from_slice(&ENVELOPE_MAGIC.to_le_bytes());
    out.extend_from_slice(&(message.len() as u32).to_le_bytes());
    out.extend_from_slice(message);
    out
}

/// Serialize `entries` as a tag-value map.
///
/// # Panics
///
/// Panics if the tags are not strictly ascending as LE u32, or if any value
/// other than the last has a length that is not a multiple of 4.
pub fn build_tag_value_map(entries: &[(&[u8; 4], &[u8])]) -> Vec<u8> {
    for pair in entries.windows(2) {
        assert!(
            le_u32(pair[0].0, 0) < le_u32(pair[1].0, 0),
            "tags must be sorted in ascending LE u32 order"
        );
    }
    if let Some((_, head)) = entries.split_last() {
        assert!(
            head.iter().all(|(_, v)| v.len() % 4 == 0),
            "all values except the last must be 4-byte aligned"
        );
    }

    let values_len: usize = entries.iter().map(|(_, v)| v.len()).sum();
    let mut out = Vec::with_capacity(4 + entries.len() * 8 + values_len);
    out.extend_from_slice(&(entries.len() as u32).to_le_bytes());

    let mut end = 0u32;
    for (_, value) in entries.iter().take(entries.len().saturating_sub(1)) {
        end += value.len() as u32;
        out.extend_from_slice(&end.to_le_bytes());
    }
    for (tag, _) in entries {
        out.extend_from_slice(*tag);
    }
    for (_, value) in entries {
        out.extend_from_slice(value);
    }
    out
}

fn le_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_map() {
        let data = build_tag_value_map(&[]);
        let map = TagValueMap::parse(&data).unwrap();
        assert!(map.is_empty());
        assert!(map.get(b"NONC").is_none());
    }

    #[test]
    fn test_single_tag_takes_whole_value_region() {
        let value = b"hello world!";
        let data = build_tag_value_map(&[(b"NONC", value)]);
        let map = TagValueMap::parse(&data).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(b"NONC"), Some(value.as_slice()));
        assert!(map.get(b"SIG\0").is_none());
    }

    #[test]
    fn test_multiple_tags() {
        // SIG\0 = 0x00474953 < NONC = 0x434e4f4e < CERT = 0x54524543
        let sig = [0u8; 64];
        let nonc = [1u8; 32];
        let cert = [2u8; 16];
        let data = build_tag_value_map(&[(b"SIG\0", &sig), (b"NONC", &nonc), (b"CERT", &cert)]);
        let map = TagValueMap::parse(&data).unwrap();
        assert_eq!(map.get(b"SIG\0"), Some(sig.as_slice()));
        assert_eq!(map.get(b"NONC"), Some(nonc.as_slice()));
        assert_eq!(map.get(b"CERT"), Some(cert.as_slice()));
    }

    #[test]
    fn test_require_len() {
        let data = build_tag_value_map(&[(b"RADI", &[1, 0, 0, 0])]);
        let map = TagValueMap::parse(&data).unwrap();
        assert!(map.require_len(b"RADI", 4).is_ok());
        assert_eq!(
            map.require_len(b"RADI", 8),
            Err(RoughtimeError::InvalidTagLength {
                tag: *b"RADI",
                expected: 8,
                actual: 4,
            })
        );
    }

    #[test]
    fn test_envelope_roundtrip() {
        let msg = b"test message";
        let envelope = encode_envelope(msg);
        assert_eq!(envelope.len(), ENVELOPE_HEADER_LEN + msg.len());
        assert_eq!(decode_envelope(&envelope).unwrap(), msg);
    }

    #[test]
    fn test_envelope_ignores_trailing_bytes() {
        let mut envelope = encode_envelope(b"abcd");
        envelope.extend_from_slice(b"junk");
        assert_eq!(decode_envelope(&envelope).unwrap(), b"abcd");
    }

    #[test]
    fn test_envelope_invalid_magic() {
        let mut envelope = encode_envelope(b"test");
        envelope[0] = 0xFF;
        assert_eq!(decode_envelope(&envelope), Err(RoughtimeError::InvalidMagic));
    }

    #[test]
    fn test_envelope_truncated_body() {
        let envelope = encode_envelope(b"test message");
        assert_eq!(
            decode_envelope(&envelope[..16]),
            Err(RoughtimeError::MessageTooShort {
                needed: 24,
                available: 16,
            })
        );
    }

    #[test]
    fn test_envelope_too_short() {
        assert_eq!(
            decode_envelope(&[0; 4]),
            Err(RoughtimeError::MessageTooShort {
                needed: 12,
                available: 4
            })
        );
    }

    #[test]
    fn test_invalid_tag_order() {
        let mut data = Vec::new();
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&4u32.to_le_bytes());
        data.extend_from_slice(b"CERT"); // 0x54524543
        data.extend_from_slice(b"NONC"); // 0x434e4f4e, must come first
        data.extend_from_slice(&[0; 8]);
        assert_eq!(
            TagValueMap::parse(&data),
            Err(RoughtimeError::InvalidTagOrder)
        );
    }

    #[test]
    fn test_duplicate_tag_rejected() {
        let mut data = Vec::new();
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&4u32.to_le_bytes());
        data.extend_from_slice(b"NONC");
        data.extend_from_slice(b"NONC");
        data.extend_from_slice(&[0; 8]);
        assert_eq!(
            TagValueMap::parse(&data),
            Err(RoughtimeError::InvalidTagOrder)
        );
    }

    #[test]
    fn test_offset_past_value_region() {
        let mut data = Vec::new();
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&64u32.to_le_bytes());
        data.extend_from_slice(b"SIG\0");
        data.extend_from_slice(b"NONC");
        data.extend_from_slice(&[0; 8]);
        assert_eq!(
            TagValueMap::parse(&data),
            Err(RoughtimeError::OffsetOutOfBounds)
        );
    }

    #[test]
    fn test_header_longer_than_buffer() {
        let data = 3u32.to_le_bytes();
        assert_eq!(
            TagValueMap::parse(&data),
            Err(RoughtimeError::MessageTooShort {
                needed: 24,
                available: 4,
            })
        );
    }

    #[test]
    fn test_require_missing_tag() {
        let data = build_tag_value_map(&[(b"NONC", &[0; 32])]);
        let map = TagValueMap::parse(&data).unwrap();
        assert_eq!(
            map.require(b"SIG\0"),
            Err(RoughtimeError::MissingTag { tag: *b"SIG\0" })
        );
    }

    #[test]
    fn test_nested_map() {
        let inner = build_tag_value_map(&[(b"NONC", &[42u8; 32])]);
        let data = build_tag_value_map(&[(b"CERT", &inner)]);
        let outer = TagValueMap::parse(&data).unwrap();
        let nested = outer.get_nested(b"CERT").unwrap();
        assert_eq!(nested.get(b"NONC"), Some([42u8; 32].as_slice()));
    }

    #[test]
    #[should_panic(expected = "ascending")]
    fn test_build_rejects_unsorted_tags() {
        build_tag_value_map(&[(b"CERT", &[0; 4]), (b"NONC", &[0; 4])]);
    }
}
