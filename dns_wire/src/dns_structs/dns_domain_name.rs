use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dns_parse::wire_buffer::{peek_u8_at, slice_at, WireWriter};
use crate::error::WireError;

pub const MAX_LABEL_LEN: usize = 63;

const POINTER_MASK: u8 = 0b1100_0000;

/// A domain name as a list of raw labels. Label octets are kept exactly as
/// received; only `Display` interprets them as text.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, Default)]
pub struct Domain {
    labels: Vec<Vec<u8>>,
}

impl Domain {
    pub fn root() -> Domain {
        Domain { labels: Vec::new() }
    }

    /// Splits a dotted name into labels. Empty segments (including the one a
    /// trailing dot would produce) are dropped. Label length is only checked
    /// on encode.
    pub fn new(input: &str) -> Domain {
        let labels = input
            .split('.')
            .filter(|segment| !segment.is_empty())
            .map(|segment| segment.as_bytes().to_vec())
            .collect();
        Domain { labels }
    }

    pub fn labels(&self) -> &[Vec<u8>] {
        &self.labels
    }

    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    /// Fully expanded wire form: `<len><label>...` followed by a zero byte.
    /// Never emits compression pointers.
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        let mut writer = WireWriter::with_limit(usize::MAX);
        self.write_to(&mut writer)?;
        Ok(writer.into_bytes())
    }

    pub fn write_to(&self, writer: &mut WireWriter) -> Result<(), WireError> {
        for label in &self.labels {
            let len = label.len();
            if len > MAX_LABEL_LEN {
                return Err(WireError::LabelTooLong(len));
            }
            writer.write_u8(len as u8)?;
            writer.write_bytes(label)?;
        }
        writer.write_u8(0)
    }

    /// Decodes the name starting at `start` in `message`.
    ///
    /// Returns the name and the number of bytes it occupies at `start`, which
    /// stops right after the first compression pointer if there is one.
    /// Pointers are absolute offsets into `message`; every offset reached
    /// through a pointer is remembered, and revisiting one is a
    /// [`WireError::CompressionLoop`].
    pub fn decode(message: &[u8], start: usize) -> Result<(Domain, usize), WireError> {
        let mut labels = Vec::new();
        let mut visited = HashSet::from([start]);
        let mut pos = start;
        // bytes at `start` that belong to this name, fixed by the first pointer
        let mut consumed: Option<usize> = None;

        loop {
            let len = peek_u8_at(message, pos)?;

            if len & POINTER_MASK == POINTER_MASK {
                let low = peek_u8_at(message, pos + 1)?;
                let target = (usize::from(len & !POINTER_MASK) << 8) | usize::from(low);
                if consumed.is_none() {
                    consumed = Some(pos + 2 - start);
                }
                if !visited.insert(target) {
                    return Err(WireError::CompressionLoop(target));
                }
                pos = target;
                continue;
            }

            let len = usize::from(len);
            if len > MAX_LABEL_LEN {
                return Err(WireError::LabelTooLong(len));
            }
            if len == 0 {
                // pos may sit before start once a pointer was followed
                let consumed = match consumed {
                    Some(consumed) => consumed,
                    None => pos + 1 - start,
                };
                return Ok((Domain { labels }, consumed));
            }

            labels.push(slice_at(message, pos + 1, len)?.to_vec());
            pos += 1 + len;
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        for (i, label) in self.labels.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&String::from_utf8_lossy(label))?;
        }
        Ok(())
    }
}

#[test]
fn test_new_with_empty_string() {
    assert!(Domain::new("").is_root());
    assert!(Domain::new(".").is_root());
}

#[test]
fn test_trailing_dot_domain() {
    assert_eq!(Domain::new("example.com"), Domain::new("example.com."));
}

#[test]
fn test_case_preserved() {
    assert_eq!(Domain::new("WwW.Example.COM").to_string(), "WwW.Example.COM");
}

#[test]
fn test_encode_labels() {
    let encoded = Domain::new("codecrafters.io").encode().unwrap();
    assert_eq!(encoded, b"\x0ccodecrafters\x02io\x00".to_vec());
}

#[test]
fn test_encode_root() {
    assert_eq!(Domain::root().encode().unwrap(), vec![0]);
}

#[test]
fn test_encode_label_too_long() {
    let name = format!("{}.com", "a".repeat(64));
    assert_eq!(
        Domain::new(&name).encode(),
        Err(WireError::LabelTooLong(64))
    );
    let name = format!("{}.com", "a".repeat(63));
    assert!(Domain::new(&name).encode().is_ok());
}

#[test]
fn test_round_trip() {
    let max_label = "z".repeat(63);
    for name in ["a", "example.com", "Mixed-Case.Example.org", max_label.as_str()] {
        let encoded = Domain::new(name).encode().unwrap();
        let (decoded, consumed) = Domain::decode(&encoded, 0).unwrap();
        assert_eq!(decoded.to_string(), name);
        assert_eq!(consumed, encoded.len());
    }
}

#[test]
fn test_decode_pointer() {
    // "example.com" at offset 0, then "www" + pointer to 0 at offset 13
    let mut buf = b"\x07example\x03com\x00".to_vec();
    buf.extend_from_slice(b"\x03www\xc0\x00");

    let (first, consumed) = Domain::decode(&buf, 0).unwrap();
    assert_eq!(first.to_string(), "example.com");
    assert_eq!(consumed, 13);

    let (second, consumed) = Domain::decode(&buf, 13).unwrap();
    assert_eq!(second.to_string(), "www.example.com");
    assert_eq!(consumed, 6);
}

#[test]
fn test_decode_pointer_only() {
    let mut buf = b"\x07example\x03com\x00".to_vec();
    buf.extend_from_slice(&[0xc0, 0x00]);
    let (name, consumed) = Domain::decode(&buf, 13).unwrap();
    assert_eq!(name.to_string(), "example.com");
    assert_eq!(consumed, 2);
}

#[test]
fn test_decode_self_pointer() {
    let buf = [0xc0, 0x00];
    assert_eq!(Domain::decode(&buf, 0), Err(WireError::CompressionLoop(0)));
}

#[test]
fn test_decode_longer_cycle() {
    // 0 -> "a" then pointer to 4, 4 -> pointer to 0
    let buf = [0x01, b'a', 0xc0, 0x04, 0xc0, 0x00];
    assert_eq!(Domain::decode(&buf, 0), Err(WireError::CompressionLoop(0)));
}

#[test]
fn test_decode_label_length_64() {
    let mut buf = vec![64];
    buf.extend_from_slice(&[b'a'; 64]);
    buf.push(0);
    assert_eq!(Domain::decode(&buf, 0), Err(WireError::LabelTooLong(64)));
}

#[test]
fn test_decode_truncated() {
    assert!(matches!(
        Domain::decode(b"\x07exam", 0),
        Err(WireError::TruncatedMessage { .. })
    ));
    // missing terminator
    assert!(matches!(
        Domain::decode(b"\x03com", 0),
        Err(WireError::TruncatedMessage { .. })
    ));
    // pointer cut in half
    assert!(matches!(
        Domain::decode(&[0xc0], 0),
        Err(WireError::TruncatedMessage { .. })
    ));
    // pointer past the end
    assert!(matches!(
        Domain::decode(&[0xc0, 0x20], 0),
        Err(WireError::TruncatedMessage { .. })
    ));
}

#[test]
fn test_decode_pointer_to_earlier_name() {
    // header-sized padding, "example.com" at 12, then "mail" + pointer at 25
    let mut buf = vec![0u8; 12];
    buf.extend_from_slice(b"\x07example\x03com\x00");
    buf.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
    let second = buf.len();
    buf.extend_from_slice(b"\x04mail\xc0\x0c");
    let pointer_only = buf.len();
    buf.extend_from_slice(&[0xc0, 0x0c]);

    let (name, consumed) = Domain::decode(&buf, second).unwrap();
    assert_eq!(name.to_string(), "mail.example.com");
    assert_eq!(consumed, 7);

    let (name, consumed) = Domain::decode(&buf, pointer_only).unwrap();
    assert_eq!(name.to_string(), "example.com");
    assert_eq!(consumed, 2);
}

#[test]
fn test_binary_label_kept_verbatim() {
    let mut wire = vec![30];
    wire.extend_from_slice(&[0xff; 30]);
    wire.extend_from_slice(b"\x03com\x00");

    let (name, consumed) = Domain::decode(&wire, 0).unwrap();
    assert_eq!(consumed, wire.len());
    assert_eq!(name.labels()[0], vec![0xff; 30]);
    assert_eq!(name.encode().unwrap(), wire);
}
