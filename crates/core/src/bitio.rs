//! Byte- and bit-level stream I/O.
//!
//! These are the collaborators the codec reads symbols and code bits through.
//! Bits are packed MSB-first (most significant bit first) within each byte.
//!
//! # Padding Rules
//! - BitWriter: pads the final partial byte with trailing zeros on `finish`
//! - BitReader: hands out padding bits like any other bit; the caller decides
//!   when to stop (see `decoder`)
//!
//! # Example
//! ```
//! use huffcodec_core::bitio::{BitReader, BitWriter};
//!
//! let mut writer = BitWriter::new(Vec::new());
//! for bit in [true, false, true, true, true] {
//!     writer.write_bit(bit).unwrap();
//! }
//! // Total: 10111 -> padded to 10111000
//! let bytes = writer.finish().unwrap();
//! assert_eq!(bytes, vec![0b1011_1000]);
//!
//! let mut reader = BitReader::new(&bytes[..]);
//! assert!(reader.read_bit().unwrap());
//! assert!(!reader.read_bit().unwrap());
//! ```

use std::io::{BufRead, Write};

use crate::error::{BitIoError, Result};

/// Reads single bytes from a buffered source, with an exhaustion check that
/// does not consume anything.
#[derive(Debug)]
pub struct ByteReader<R> {
    inner: R,
    /// Bytes handed out so far
    offset: u64,
}

impl<R: BufRead> ByteReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, offset: 0 }
    }

    /// True once the underlying source has no more bytes.
    pub fn is_exhausted(&mut self) -> Result<bool> {
        Ok(self.inner.fill_buf()?.is_empty())
    }

    /// Read the next byte.
    ///
    /// # Errors
    /// `BitIoError::UnexpectedEof` if the source is exhausted.
    pub fn read_byte(&mut self) -> Result<u8> {
        let byte = match self.inner.fill_buf()?.first() {
            Some(&b) => b,
            None => {
                return Err(BitIoError::UnexpectedEof {
                    offset: self.offset,
                }
                .into())
            }
        };
        self.inner.consume(1);
        self.offset += 1;
        Ok(byte)
    }

    /// Number of bytes read so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Visit every remaining byte in bulk, in order, until the source is exhausted.
    ///
    /// Equivalent to calling `read_byte` until `is_exhausted`, without the
    /// per-byte buffer round trip.
    pub fn for_each_chunk<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(u64, &[u8]) -> Result<()>,
    {
        loop {
            let chunk = self.inner.fill_buf()?;
            if chunk.is_empty() {
                return Ok(());
            }
            let len = chunk.len();
            f(self.offset, chunk)?;
            self.inner.consume(len);
            self.offset += len as u64;
        }
    }
}

/// Writes single bytes to a sink.
///
/// Wrap files in a `BufWriter` before handing them over; this type does no
/// buffering of its own.
#[derive(Debug)]
pub struct ByteWriter<W> {
    inner: W,
    written: u64,
}

impl<W: Write> ByteWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    pub fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.inner.write_all(&[byte])?;
        self.written += 1;
        Ok(())
    }

    /// Number of bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Flush everything to the sink and hand it back.
    pub fn finish(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Writes bits MSB-first to a byte sink.
///
/// Accumulates bits in a one-byte buffer and writes each byte as soon as it
/// is complete. `finish` pads the final partial byte with zeros.
///
/// # Invariants
/// - `bit_count` is always < 8
/// - unused low bits of `bit_buffer` are zero
#[derive(Debug)]
pub struct BitWriter<W> {
    inner: ByteWriter<W>,
    /// Accumulator for the current partial byte (MSB-aligned)
    bit_buffer: u8,
    /// Number of bits in bit_buffer (0-7)
    bit_count: u8,
}

impl<W: Write> BitWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: ByteWriter::new(inner),
            bit_buffer: 0,
            bit_count: 0,
        }
    }

    /// Append one bit.
    pub fn write_bit(&mut self, bit: bool) -> Result<()> {
        if bit {
            self.bit_buffer |= 0x80 >> self.bit_count;
        }
        self.bit_count += 1;

        if self.bit_count == 8 {
            self.inner.write_byte(self.bit_buffer)?;
            self.bit_buffer = 0;
            self.bit_count = 0;
        }
        Ok(())
    }

    /// Append a sequence of bits in order.
    pub fn write_all_bits(&mut self, bits: &[bool]) -> Result<()> {
        for &bit in bits {
            self.write_bit(bit)?;
        }
        Ok(())
    }

    /// Total number of bits written (including the partial byte).
    pub fn bit_len(&self) -> u64 {
        self.inner.bytes_written() * 8 + self.bit_count as u64
    }

    /// Zero bits `finish` will append to complete the last byte.
    pub fn padding_bits(&self) -> u8 {
        if self.bit_count == 0 {
            0
        } else {
            8 - self.bit_count
        }
    }

    /// Pad the partial byte with zeros, flush, and hand the sink back.
    pub fn finish(mut self) -> Result<W> {
        if self.bit_count > 0 {
            self.inner.write_byte(self.bit_buffer)?;
            self.bit_buffer = 0;
            self.bit_count = 0;
        }
        self.inner.finish()
    }
}

/// Reads bits MSB-first from a byte source.
///
/// Padding bits at the end of the source are not distinguishable from data.
#[derive(Debug)]
pub struct BitReader<R> {
    inner: ByteReader<R>,
    /// Byte currently being consumed
    current: u8,
    /// Bits of `current` not yet handed out (0-8)
    bits_left: u8,
    /// Bits handed out so far
    position: u64,
}

impl<R: BufRead> BitReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: ByteReader::new(inner),
            current: 0,
            bits_left: 0,
            position: 0,
        }
    }

    /// True once every bit of every byte has been read.
    pub fn is_exhausted(&mut self) -> Result<bool> {
        Ok(self.bits_left == 0 && self.inner.is_exhausted()?)
    }

    /// Read a single bit.
    ///
    /// # Errors
    /// `BitIoError::BitsExhausted` if no bits remain.
    pub fn read_bit(&mut self) -> Result<bool> {
        if self.bits_left == 0 {
            if self.inner.is_exhausted()? {
                return Err(BitIoError::BitsExhausted {
                    position: self.position,
                }
                .into());
            }
            self.current = self.inner.read_byte()?;
            self.bits_left = 8;
        }

        self.bits_left -= 1;
        self.position += 1;
        Ok((self.current >> self.bits_left) & 1 == 1)
    }

    /// Current bit position (number of bits read).
    pub fn position(&self) -> u64 {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn write_bits(bits: &[u8]) -> Vec<u8> {
        let mut writer = BitWriter::new(Vec::new());
        for &b in bits {
            writer.write_bit(b == 1).unwrap();
        }
        writer.finish().unwrap()
    }

    fn read_all_bits(bytes: &[u8]) -> Vec<bool> {
        let mut reader = BitReader::new(bytes);
        let mut out = Vec::new();
        while !reader.is_exhausted().unwrap() {
            out.push(reader.read_bit().unwrap());
        }
        out
    }

    #[test]
    fn test_write_read_single_byte() {
        let bytes = write_bits(&[1, 0, 1, 1, 0, 0, 1, 1]);
        assert_eq!(bytes, vec![0b10110011]);

        let bits = read_all_bits(&bytes);
        assert_eq!(
            bits,
            vec![true, false, true, true, false, false, true, true]
        );
    }

    #[test]
    fn test_padding() {
        let bytes = write_bits(&[1]);
        assert_eq!(bytes, vec![0b10000000]);
    }

    #[test]
    fn test_padding_bits_count() {
        let mut writer = BitWriter::new(Vec::new());
        assert_eq!(writer.padding_bits(), 0);
        writer.write_all_bits(&[true, true, false]).unwrap();
        assert_eq!(writer.bit_len(), 3);
        assert_eq!(writer.padding_bits(), 5);
        writer.write_all_bits(&[false; 5]).unwrap();
        assert_eq!(writer.padding_bits(), 0);
        assert_eq!(writer.finish().unwrap(), vec![0b11000000]);
    }

    #[test]
    fn test_multi_byte() {
        let bytes = write_bits(&[1, 0, 1, 0, 1, 0, 1, 1, 1, 1, 1, 1]);
        assert_eq!(bytes, vec![0b10101011, 0b11110000]);
        assert_eq!(read_all_bits(&bytes).len(), 16);
    }

    #[test]
    fn test_empty_writer() {
        let writer = BitWriter::new(Vec::new());
        assert!(writer.finish().unwrap().is_empty());
    }

    #[test]
    fn test_read_past_end() {
        let data = [0b10101010u8];
        let mut reader = BitReader::new(&data[..]);

        for _ in 0..8 {
            reader.read_bit().unwrap();
        }
        assert!(reader.is_exhausted().unwrap());
        assert!(matches!(
            reader.read_bit(),
            Err(Error::BitIo(BitIoError::BitsExhausted { position: 8 }))
        ));
    }

    #[test]
    fn test_byte_reader() {
        let data = b"ab";
        let mut reader = ByteReader::new(&data[..]);
        assert!(!reader.is_exhausted().unwrap());
        assert_eq!(reader.read_byte().unwrap(), b'a');
        assert_eq!(reader.read_byte().unwrap(), b'b');
        assert_eq!(reader.offset(), 2);
        assert!(reader.is_exhausted().unwrap());
        assert!(matches!(
            reader.read_byte(),
            Err(Error::BitIo(BitIoError::UnexpectedEof { offset: 2 }))
        ));
    }

    #[test]
    fn test_byte_reader_chunks_cover_everything() {
        let data: Vec<u8> = (0..=255).collect();
        // Tiny buffer to force many chunks
        let source = std::io::BufReader::with_capacity(7, &data[..]);
        let mut reader = ByteReader::new(source);

        let mut seen = Vec::new();
        let mut offsets = Vec::new();
        reader
            .for_each_chunk(|offset, chunk| {
                offsets.push(offset);
                seen.extend_from_slice(chunk);
                Ok(())
            })
            .unwrap();

        assert_eq!(seen, data);
        assert_eq!(offsets[0], 0);
        assert_eq!(offsets[1], 7);
        assert_eq!(reader.offset(), 256);
    }

    #[test]
    fn test_byte_writer() {
        let mut writer = ByteWriter::new(Vec::new());
        writer.write_byte(0x41).unwrap();
        writer.write_byte(0x42).unwrap();
        assert_eq!(writer.bytes_written(), 2);
        assert_eq!(writer.finish().unwrap(), b"AB".to_vec());
    }

    #[test]
    fn test_bits_position() {
        let data = [0xFF, 0x00];
        let mut reader = BitReader::new(&data[..]);
        for _ in 0..5 {
            assert!(reader.read_bit().unwrap());
        }
        assert_eq!(reader.position(), 5);
        for _ in 0..3 {
            reader.read_bit().unwrap();
        }
        assert!(!reader.read_bit().unwrap());
        assert_eq!(reader.position(), 9);
    }
}
