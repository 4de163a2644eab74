//! Primitive reads over block payloads and blk file streams.

use std::io::{self, BufRead, Read, Seek, SeekFrom};

use byteorder::{ByteOrder, LittleEndian};

use crate::error::ContentError;

/// Zero bytes peeked one at a time before switching to chunked scanning.
pub const SMALL_SKIP_LIMIT: usize = 1000;

/// Chunk size used to scan long runs of zero padding.
pub const SKIP_CHUNK_SIZE: usize = 1_000_000;

/// Little-endian cursor over one block's payload.
///
/// Every read is bounds checked; running past the end means the block is
/// corrupt and yields [`ContentError::OutOfBounds`].
#[derive(Debug, Clone)]
pub struct BlockReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> BlockReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        BlockReader { buffer, position: 0 }
    }

    /// Offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes left after the cursor.
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    /// The whole underlying buffer, for hashing already consumed ranges.
    pub fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    /// Bytes in `[start, end)` of the underlying buffer.
    pub fn slice(&self, start: usize, end: usize) -> Result<&'a [u8], ContentError> {
        if start > end || end > self.buffer.len() {
            return Err(ContentError::OutOfBounds {
                offset: start,
                requested: end.saturating_sub(start),
                available: self.buffer.len(),
            });
        }
        Ok(&self.buffer[start..end])
    }

    /// Next `count` bytes without advancing.
    pub fn peek_bytes(&self, count: usize) -> Result<&'a [u8], ContentError> {
        let end = self
            .position
            .checked_add(count)
            .filter(|end| *end <= self.buffer.len())
            .ok_or(ContentError::OutOfBounds {
                offset: self.position,
                requested: count,
                available: self.buffer.len(),
            })?;
        Ok(&self.buffer[self.position..end])
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], ContentError> {
        let bytes = self.peek_bytes(count)?;
        self.position += count;
        Ok(bytes)
    }

    /// Read exactly `N` bytes into an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ContentError> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.read_bytes(N)?);
        Ok(array)
    }

    pub fn read_u8(&mut self) -> Result<u8, ContentError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, ContentError> {
        Ok(LittleEndian::read_u16(self.read_bytes(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32, ContentError> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64, ContentError> {
        Ok(LittleEndian::read_u64(self.read_bytes(8)?))
    }

    pub fn skip(&mut self, count: usize) -> Result<(), ContentError> {
        self.read_bytes(count).map(|_| ())
    }

    /// Read a Bitcoin compact-size integer.
    ///
    /// A first byte below `0xFD` is the value itself; `0xFD`, `0xFE` and
    /// `0xFF` announce a little-endian `u16`, `u32` and `u64`. Non-minimal
    /// encodings are accepted.
    pub fn read_varint(&mut self) -> Result<u64, ContentError> {
        match self.read_u8()? {
            0xFD => self.read_u16().map(u64::from),
            0xFE => self.read_u32().map(u64::from),
            0xFF => self.read_u64(),
            small => Ok(u64::from(small)),
        }
    }

    /// Read a compact-size integer used as a length or count.
    pub fn read_varint_len(&mut self) -> Result<usize, ContentError> {
        let value = self.read_varint()?;
        usize::try_from(value).map_err(|_| ContentError::LengthOverflow(value))
    }

    /// Read a compact-size length followed by that many bytes.
    pub fn read_var_bytes(&mut self) -> Result<&'a [u8], ContentError> {
        let len = self.read_varint_len()?;
        self.read_bytes(len)
    }
}

/// Encode a variable-length integer (Bitcoin compact size).
pub fn encode_varint(value: u64, output: &mut Vec<u8>) {
    if value < 0xfd {
        output.push(value as u8);
    } else if value <= 0xffff {
        output.push(0xfd);
        output.extend_from_slice(&(value as u16).to_le_bytes());
    } else if value <= 0xffff_ffff {
        output.push(0xfe);
        output.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        output.push(0xff);
        output.extend_from_slice(&value.to_le_bytes());
    }
}

/// Advance `reader` past a run of zero bytes.
///
/// Returns `true` when a non-zero byte follows the run, `false` when the
/// stream ends first. Padding is peeked byte by byte for the first
/// [`SMALL_SKIP_LIMIT`] bytes; longer runs are scanned in
/// [`SKIP_CHUNK_SIZE`] chunks, seeking back to the first non-zero byte.
pub fn skip_zero_bytes<R: BufRead + Seek>(reader: &mut R) -> io::Result<bool> {
    let mut skipped = 0usize;
    while skipped < SMALL_SKIP_LIMIT {
        match reader.fill_buf()?.first().copied() {
            None => return Ok(false),
            Some(0) => {
                reader.consume(1);
                skipped += 1;
            }
            Some(_) => return Ok(true),
        }
    }

    let start = reader.stream_position()?;
    let mut chunk = vec![0u8; SKIP_CHUNK_SIZE];
    loop {
        let chunk_start = reader.stream_position()?;
        let read = read_up_to(reader, &mut chunk)?;
        if let Some(offset) = chunk[..read].iter().position(|b| *b != 0) {
            let resume = chunk_start + offset as u64;
            reader.seek(SeekFrom::Start(resume))?;
            log::debug!("Skipped {} bytes of zero padding", resume - start + skipped as u64);
            return Ok(true);
        }
        if read < chunk.len() {
            log::debug!("Zero padding runs to end of stream");
            return Ok(false);
        }
    }
}

/// Fill `buffer` as far as the stream allows; returns the byte count read.
fn read_up_to<R: Read>(reader: &mut R, buffer: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor};

    #[test]
    fn test_fixed_width_reads() {
        let data = [
            0xAB, // u8
            0x34, 0x12, // u16
            0xEF, 0xBE, 0xAD, 0xDE, // u32
            0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01, // u64
        ];
        let mut reader = BlockReader::new(&data);

        assert_eq!(reader.read_u8().unwrap(), 0xAB);
        assert_eq!(reader.read_u16().unwrap(), 0x1234);
        assert_eq!(reader.read_u32().unwrap(), 0xDEADBEEF);
        assert_eq!(reader.read_u64().unwrap(), 0x0102030405060708);
        assert_eq!(reader.position(), data.len());
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_read_past_end_is_out_of_bounds() {
        let data = [1u8, 2, 3];
        let mut reader = BlockReader::new(&data);
        reader.skip(2).unwrap();

        assert_eq!(
            reader.read_u32(),
            Err(ContentError::OutOfBounds { offset: 2, requested: 4, available: 3 })
        );
        // A failed read does not move the cursor
        assert_eq!(reader.position(), 2);
        assert_eq!(reader.read_u8().unwrap(), 3);
    }

    #[test]
    fn test_varint_round_trip_at_width_boundaries() {
        let cases: [(u64, usize); 8] = [
            (0, 1),
            (0xFC, 1),
            (0xFD, 3),
            (0xFFFE, 3),
            (0xFFFF, 3),
            (0xFFFF_FFFE, 5),
            (0xFFFF_FFFF, 5),
            (u64::MAX, 9),
        ];

        for (value, width) in cases {
            let mut encoded = Vec::new();
            encode_varint(value, &mut encoded);
            assert_eq!(encoded.len(), width, "width of {value:#x}");

            let mut reader = BlockReader::new(&encoded);
            assert_eq!(reader.read_varint().unwrap(), value);
            assert_eq!(reader.remaining(), 0);
        }
    }

    #[test]
    fn test_varint_accepts_non_minimal_encoding() {
        // 5 encoded with a 0xFD prefix
        let data = [0xFD, 0x05, 0x00];
        assert_eq!(BlockReader::new(&data).read_varint().unwrap(), 5);
    }

    #[test]
    fn test_var_bytes_length_beyond_buffer() {
        let data = [0x05, 0xAA, 0xBB];
        let mut reader = BlockReader::new(&data);
        assert!(matches!(
            reader.read_var_bytes(),
            Err(ContentError::OutOfBounds { requested: 5, .. })
        ));
    }

    #[test]
    fn test_slice_of_consumed_range() {
        let data = [1u8, 2, 3, 4];
        let mut reader = BlockReader::new(&data);
        reader.skip(3).unwrap();
        assert_eq!(reader.slice(1, 3).unwrap(), &[2, 3]);
        assert!(reader.slice(2, 5).is_err());
    }

    fn padded(zeros: usize, tail: &[u8]) -> Vec<u8> {
        let mut data = vec![0u8; zeros];
        data.extend_from_slice(tail);
        data
    }

    #[test]
    fn test_skip_short_padding() {
        let mut reader = BufReader::new(Cursor::new(padded(10, &[0xF9, 0xBE])));
        assert!(skip_zero_bytes(&mut reader).unwrap());
        assert_eq!(reader.stream_position().unwrap(), 10);
    }

    #[test]
    fn test_skip_padding_beyond_small_limit() {
        let mut reader = BufReader::new(Cursor::new(padded(2000, &[0xF9, 0xBE, 0xB4, 0xD9])));
        assert!(skip_zero_bytes(&mut reader).unwrap());
        assert_eq!(reader.stream_position().unwrap(), 2000);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic).unwrap();
        assert_eq!(u32::from_le_bytes(magic), 0xD9B4BEF9);
    }

    #[test]
    fn test_skip_padding_across_chunks() {
        let zeros = SKIP_CHUNK_SIZE + SMALL_SKIP_LIMIT + 17;
        let mut reader = BufReader::new(Cursor::new(padded(zeros, &[0x01])));
        assert!(skip_zero_bytes(&mut reader).unwrap());
        assert_eq!(reader.stream_position().unwrap(), zeros as u64);
    }

    #[test]
    fn test_skip_padding_to_end_of_stream() {
        let mut reader = BufReader::new(Cursor::new(vec![0u8; 5000]));
        assert!(!skip_zero_bytes(&mut reader).unwrap());

        let mut empty = BufReader::new(Cursor::new(Vec::new()));
        assert!(!skip_zero_bytes(&mut empty).unwrap());
    }

    #[test]
    fn test_no_padding_does_not_move() {
        let mut reader = BufReader::new(Cursor::new(vec![0xF9u8, 0x00]));
        assert!(skip_zero_bytes(&mut reader).unwrap());
        assert_eq!(reader.stream_position().unwrap(), 0);
    }
}
