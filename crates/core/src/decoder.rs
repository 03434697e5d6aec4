//! Stream decoder: packed bit stream back to symbols.
//!
//! The decoder walks the tree one bit at a time: `0` moves the cursor to the
//! left child, `1` to the right child. Landing on a leaf emits its symbol and
//! puts the cursor back at the root.
//!
//! # Termination
//!
//! The payload has no length field and its last byte is zero-padded, so the
//! bit stream alone cannot say where the data ends. Two modes exist:
//!
//! - **Counted** (`with_expected_symbols`): stop after exactly that many
//!   symbols; any bits left over are padding and are skipped. Running out of
//!   bits first is a truncation error. The pipeline always uses this mode
//!   with the symbol total taken from the frequency table.
//! - **Bit walk** (`new`): stop when the bits run out. Running out with the
//!   cursor mid-path is a truncation error. Pad bits that happen to complete
//!   a code decode as extra symbols.
//!
//! A tree whose root is a leaf maps every bit, whatever its value, to the
//! sole symbol.

use std::io::{BufRead, Write};

use tracing::{debug, warn};

use crate::bitio::{BitReader, ByteWriter};
use crate::error::{Error, Result};
use crate::metrics::ChecksumWriter;
use crate::tree::{HuffmanTree, Node};

/// What one decoding pass produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeSummary {
    /// Symbols written to the output
    pub symbols: u64,
    /// Bits consumed to produce them
    pub bits: u64,
    /// Bits left over after the last symbol (counted mode only)
    pub trailing_bits: u64,
    /// CRC32 of the decoded bytes
    pub crc32: u32,
}

/// Decodes a bit stream with a rebuilt Huffman tree.
pub struct StreamDecoder<'a> {
    tree: &'a HuffmanTree,
    expected_symbols: Option<u64>,
}

impl<'a> StreamDecoder<'a> {
    /// Bit-walk decoder: runs until the bit source is exhausted.
    pub fn new(tree: &'a HuffmanTree) -> Self {
        Self {
            tree,
            expected_symbols: None,
        }
    }

    /// Counted decoder: stops after `symbols` symbols.
    pub fn with_expected_symbols(tree: &'a HuffmanTree, symbols: u64) -> Self {
        Self {
            tree,
            expected_symbols: Some(symbols),
        }
    }

    /// Decode `input` into `output`, flushing the output before returning.
    ///
    /// # Errors
    /// - `Error::TruncatedStream` if the bits run out mid-code, or (counted
    ///   mode) before the expected number of symbols was produced
    /// - I/O errors from either stream
    pub fn decode<R: BufRead, W: Write>(&self, input: R, output: W) -> Result<DecodeSummary> {
        let root = self.tree.root();
        let mut bits = BitReader::new(input);
        let mut sink = ByteWriter::new(ChecksumWriter::new(output));

        let mut cursor = root;
        let mut at_root = true;
        let mut symbols = 0u64;

        loop {
            if self.expected_symbols == Some(symbols) {
                break;
            }
            if bits.is_exhausted()? {
                if !at_root || self.expected_symbols.is_some() {
                    return Err(Error::TruncatedStream {
                        bit_position: bits.position(),
                        symbols_decoded: symbols,
                        mid_path: !at_root,
                    });
                }
                break;
            }

            let bit = bits.read_bit()?;
            cursor = match cursor {
                Node::Internal { left, right, .. } => {
                    if bit {
                        &**right
                    } else {
                        &**left
                    }
                }
                // Root-only tree: one bit per symbol
                Node::Leaf { .. } => cursor,
            };

            if let Node::Leaf { symbol, .. } = cursor {
                sink.write_byte(*symbol)?;
                symbols += 1;
                cursor = root;
                at_root = true;
            } else {
                at_root = false;
            }
        }

        let consumed = bits.position();
        let mut trailing_bits = 0u64;
        let mut trailing_ones = false;
        while !bits.is_exhausted()? {
            trailing_ones |= bits.read_bit()?;
            trailing_bits += 1;
        }
        if trailing_bits >= 8 || trailing_ones {
            warn!(
                trailing_bits,
                trailing_ones, "payload has leftover bits that are not zero padding"
            );
        }

        let crc32 = sink.finish()?.crc32();
        let summary = DecodeSummary {
            symbols,
            bits: consumed,
            trailing_bits,
            crc32,
        };
        debug!(
            symbols = summary.symbols,
            bits = summary.bits,
            trailing = summary.trailing_bits,
            "decoded stream"
        );
        Ok(summary)
    }
}
