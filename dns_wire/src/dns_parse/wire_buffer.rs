use crate::error::WireError;
use crate::MAX_UDP_MESSAGE_SIZE;

/// Read cursor over a received datagram.
///
/// Every multi-byte value is read in network byte order. Reading past the end
/// of the buffer yields [`WireError::TruncatedMessage`] instead of panicking.
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> WireReader<'a> {
        WireReader { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// The whole message, needed to follow compression pointers.
    pub fn message(&self) -> &'a [u8] {
        self.buf
    }

    pub fn skip(&mut self, steps: usize) -> Result<(), WireError> {
        self.read_bytes(steps).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        let byte = peek_u8_at(self.buf, self.pos)?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn read_u16(&mut self) -> Result<u16, WireError> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, WireError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        let bytes = slice_at(self.buf, self.pos, len)?;
        self.pos += len;
        Ok(bytes)
    }
}

/// Single byte at an absolute offset, without moving any cursor.
pub fn peek_u8_at(buf: &[u8], offset: usize) -> Result<u8, WireError> {
    buf.get(offset)
        .copied()
        .ok_or(WireError::TruncatedMessage { offset, needed: 1 })
}

/// `len` bytes starting at an absolute offset.
pub fn slice_at(buf: &[u8], offset: usize, len: usize) -> Result<&[u8], WireError> {
    offset
        .checked_add(len)
        .and_then(|end| buf.get(offset..end))
        .ok_or(WireError::TruncatedMessage {
            offset,
            needed: len,
        })
}

/// Growable output buffer with a hard size limit.
pub struct WireWriter {
    buf: Vec<u8>,
    limit: usize,
}

impl Default for WireWriter {
    fn default() -> Self {
        WireWriter::with_limit(MAX_UDP_MESSAGE_SIZE)
    }
}

impl WireWriter {
    pub fn with_limit(limit: usize) -> WireWriter {
        WireWriter {
            buf: Vec::with_capacity(limit.min(MAX_UDP_MESSAGE_SIZE)),
            limit,
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), WireError> {
        self.write_bytes(&[value])
    }

    pub fn write_u16(&mut self, value: u16) -> Result<(), WireError> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<(), WireError> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), WireError> {
        if self.buf.len() + bytes.len() > self.limit {
            return Err(WireError::BufferOverflow { limit: self.limit });
        }
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[test]
fn test_reader_big_endian() {
    let data = [0x12, 0x34, 0x00, 0x00, 0x00, 0x3c, 0xff];
    let mut reader = WireReader::new(&data);
    assert_eq!(reader.read_u16().unwrap(), 0x1234);
    assert_eq!(reader.read_u32().unwrap(), 60);
    assert_eq!(reader.read_u8().unwrap(), 0xff);
    assert_eq!(reader.remaining(), 0);
}

#[test]
fn test_reader_past_end() {
    let data = [0x01];
    let mut reader = WireReader::new(&data);
    assert_eq!(
        reader.read_u16(),
        Err(WireError::TruncatedMessage {
            offset: 0,
            needed: 2
        })
    );
    // a failed read leaves the cursor where it was
    assert_eq!(reader.position(), 0);
}

#[test]
fn test_slice_at_overflowing_offset() {
    let data = [0u8; 4];
    assert!(slice_at(&data, usize::MAX, 2).is_err());
}

#[test]
fn test_writer_limit() {
    let mut writer = WireWriter::with_limit(3);
    writer.write_u16(0xabcd).unwrap();
    assert_eq!(
        writer.write_u16(1),
        Err(WireError::BufferOverflow { limit: 3 })
    );
    writer.write_u8(7).unwrap();
    assert_eq!(writer.into_bytes(), vec![0xab, 0xcd, 7]);
}
