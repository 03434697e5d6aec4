//! Stream encoder: input symbols to a packed bit stream.

use std::io::{BufRead, Write};

use tracing::debug;

use crate::bitio::{BitWriter, ByteReader};
use crate::code::{Code, CodeTable};
use crate::error::{Error, Result};

/// What one encoding pass produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSummary {
    /// Input symbols consumed
    pub symbols: u64,
    /// Code bits written, excluding padding
    pub bits: u64,
    /// Zero bits appended to complete the final byte
    pub padding_bits: u8,
    /// CRC32 of the input bytes
    pub crc32: u32,
}

impl EncodeSummary {
    /// Payload size in bytes, padding included.
    pub fn payload_bytes(&self) -> u64 {
        (self.bits + self.padding_bits as u64) / 8
    }
}

/// Writes the concatenated codes of an input stream.
pub struct StreamEncoder<'a> {
    lookup: Vec<Option<&'a Code>>,
}

impl<'a> StreamEncoder<'a> {
    pub fn new(codes: &'a CodeTable) -> Self {
        Self {
            lookup: codes.to_lookup(),
        }
    }

    /// Encode every byte of `input` into `output`.
    ///
    /// The final partial byte is zero-padded and the sink is flushed before
    /// returning.
    ///
    /// # Errors
    /// - `Error::MissingCode` if the input holds a symbol the code table does
    ///   not cover (the table was built from different data)
    /// - I/O errors from either stream
    pub fn encode<R: BufRead, W: Write>(&self, input: R, output: W) -> Result<EncodeSummary> {
        let mut source = ByteReader::new(input);
        let mut sink = BitWriter::new(output);
        let mut hasher = crc32fast::Hasher::new();

        source.for_each_chunk(|offset, chunk| {
            hasher.update(chunk);
            for (i, &symbol) in chunk.iter().enumerate() {
                let code = self.lookup[symbol as usize].ok_or_else(|| Error::MissingCode {
                    symbol,
                    offset: offset + i as u64,
                })?;
                sink.write_all_bits(code.bits())?;
            }
            Ok(())
        })?;

        let summary = EncodeSummary {
            symbols: source.offset(),
            bits: sink.bit_len(),
            padding_bits: sink.padding_bits(),
            crc32: hasher.finalize(),
        };
        sink.finish()?;

        debug!(
            symbols = summary.symbols,
            bits = summary.bits,
            padding = summary.padding_bits,
            "encoded stream"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::FrequencyTable;
    use crate::tree::HuffmanTree;

    fn codes_for(data: &[u8]) -> CodeTable {
        let table = FrequencyTable::from_bytes(data);
        CodeTable::from_tree(&HuffmanTree::build(&table).unwrap())
    }

    #[test]
    fn test_scenario_bits() {
        let data = b"AAAAABBBCCD";
        let codes = codes_for(data);
        let mut out = Vec::new();
        let summary = StreamEncoder::new(&codes).encode(&data[..], &mut out).unwrap();

        // A=0 B=10 C=111 D=110:
        // 00000 101010 111111 110 -> 00000101 01011111 11100000
        assert_eq!(out, vec![0b0000_0101, 0b0101_1111, 0b1110_0000]);
        assert_eq!(summary.symbols, 11);
        assert_eq!(summary.bits, 20);
        assert_eq!(summary.padding_bits, 4);
        assert_eq!(summary.payload_bytes(), 3);
        assert_eq!(summary.crc32, crc32fast::hash(data));
    }

    #[test]
    fn test_single_symbol() {
        let data = [b'a'; 10];
        let codes = codes_for(&data);
        let mut out = Vec::new();
        let summary = StreamEncoder::new(&codes).encode(&data[..], &mut out).unwrap();
        assert_eq!(out, vec![0, 0]);
        assert_eq!(summary.bits, 10);
        assert_eq!(summary.padding_bits, 6);
    }

    #[test]
    fn test_missing_code() {
        let codes = codes_for(b"abc");
        let mut out = Vec::new();
        let err = StreamEncoder::new(&codes)
            .encode(&b"abcabz"[..], &mut out)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingCode {
                symbol: b'z',
                offset: 5
            }
        ));
    }

    #[test]
    fn test_empty_input_writes_nothing() {
        let codes = codes_for(b"abc");
        let mut out = Vec::new();
        let summary = StreamEncoder::new(&codes).encode(&b""[..], &mut out).unwrap();
        assert!(out.is_empty());
        assert_eq!(summary.bits, 0);
        assert_eq!(summary.padding_bits, 0);
    }

    #[test]
    fn test_bits_match_prediction() {
        let data = b"she sells sea shells by the sea shore";
        let table = FrequencyTable::from_bytes(data);
        let codes = CodeTable::from_tree(&HuffmanTree::build(&table).unwrap());
        let mut out = Vec::new();
        let summary = StreamEncoder::new(&codes).encode(&data[..], &mut out).unwrap();
        assert_eq!(Some(summary.bits), codes.encoded_bits(&table));
        assert_eq!(out.len() as u64, summary.payload_bytes());
    }
}
