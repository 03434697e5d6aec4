//! Error types for the huffcodec core.
//!
//! Every failure aborts the encode or decode call in progress. Nothing is
//! retried internally; errors carry enough context (file path, line number,
//! bit position) for the caller to diagnose the problem.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all codec operations.
///
/// Each variant corresponds to a specific failure domain:
/// - Tree building: no symbols to build a tree from, or counts that overflow
/// - Frequency table: malformed persisted record
/// - Decoding: bit stream ended in the middle of a code
/// - Encoding: a symbol has no code (table/input mismatch)
/// - Bit I/O and file I/O
#[derive(Debug, Error)]
pub enum Error {
    /// The frequency table has no symbols, so there is nothing to build a tree from.
    #[error("empty frequency table: no symbols to encode")]
    EmptyInput,

    /// A persisted frequency-table record could not be parsed.
    #[error("frequency table format error: {0}")]
    Format(#[from] FormatError),

    /// The bit source ran out before the decoder finished the current symbol
    /// (or before the expected number of symbols was produced).
    #[error(
        "truncated stream: bits exhausted at bit {bit_position} after {symbols_decoded} symbols{}",
        mid_code_suffix(.mid_path)
    )]
    TruncatedStream {
        bit_position: u64,
        symbols_decoded: u64,
        mid_path: bool,
    },

    /// The encoder met a symbol with no entry in the code table. The table
    /// was not derived from this input.
    #[error("no code for symbol {symbol:#04x} at input offset {offset}")]
    MissingCode { symbol: u8, offset: u64 },

    /// An in-memory frequency table whose counts do not fit in a `u64` total.
    #[error("symbol counts sum past u64::MAX")]
    CountOverflow,

    /// Bit I/O operation failed
    #[error("bit I/O error: {0}")]
    BitIo(#[from] BitIoError),

    /// Stream I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File I/O error, with the path that failed
    #[error("{}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid caller-supplied configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Attach a file path to an I/O error. Other errors pass through untouched.
    pub fn with_path(self, path: impl Into<PathBuf>) -> Self {
        match self {
            Error::Io(source) => Error::File {
                path: path.into(),
                source,
            },
            other => other,
        }
    }
}

fn mid_code_suffix(mid_path: &bool) -> &'static str {
    if *mid_path {
        " (mid-code)"
    } else {
        ""
    }
}

/// Bit-level I/O errors.
#[derive(Debug, Error)]
pub enum BitIoError {
    /// Attempted to read a byte from an exhausted source
    #[error("unexpected end of byte stream at offset {offset}")]
    UnexpectedEof { offset: u64 },

    /// Attempted to read a bit from an exhausted source
    #[error("unexpected end of bit stream at bit {position}")]
    BitsExhausted { position: u64 },
}

/// Frequency-table parse errors. Line numbers are 1-based.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("line {line}: missing ':' separator in {content:?}")]
    MissingSeparator { line: usize, content: String },

    #[error("line {line}: record is not valid UTF-8: {content:?}")]
    InvalidEncoding { line: usize, content: String },

    #[error("line {line}: symbol field is not an 8-bit binary number in {content:?}")]
    InvalidSymbol { line: usize, content: String },

    #[error("line {line}: count is not a non-negative integer in {content:?}")]
    InvalidCount { line: usize, content: String },

    #[error("line {line}: symbol {symbol:#04x} listed more than once")]
    DuplicateSymbol { line: usize, symbol: u8 },

    #[error("line {line}: total symbol count overflows u64")]
    TotalOverflow { line: usize },
}

/// Type alias for Result with our Error type
pub type Result<T> = std::result::Result<T, Error>;
