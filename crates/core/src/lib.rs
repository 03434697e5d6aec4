//! huffcodec-core: lossless file compression with a frequency-table Huffman code
//!
//! This library provides the core components for a codec that:
//! - Counts byte frequencies in the input
//! - Persists them as a sorted text table, the decoder's only side channel
//! - Builds a Huffman tree from the table and derives a prefix-free code
//! - Encodes the input into a packed bit stream and decodes it back
//!
//! # Architecture
//!
//! The system is designed around clear module boundaries:
//! - `bitio`: Byte- and bit-level stream reading/writing
//! - `frequency`: Symbol frequency measurement
//! - `freq_file`: Persisted frequency-table format
//! - `tree`: Huffman tree construction
//! - `code`: Code table derivation from the tree
//! - `encoder` / `decoder`: Bit-exact stream transducers
//! - `pipeline`: End-to-end encode/decode over buffers, streams, and files
//! - `metrics`: Observable run statistics
//!
//! # Design Principles
//!
//! - **No panics**: All errors are structured and surfaced to the caller
//! - **Deterministic**: The same input always produces the same table and payload
//! - **Table is the contract**: Both directions build the tree from the persisted table
//!
//! # Example
//!
//! ```
//! use huffcodec_core::pipeline::{decode_bytes, encode_bytes};
//!
//! let encoded = encode_bytes(b"AAAAABBBCCD").unwrap();
//! assert_eq!(encoded.payload.len(), 3);
//! let decoded = decode_bytes(&encoded.table, &encoded.payload).unwrap();
//! assert_eq!(decoded, b"AAAAABBBCCD");
//! ```

pub mod bitio;
pub mod code;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod freq_file;
pub mod frequency;
pub mod metrics;
pub mod pipeline;
pub mod tree;

// Re-export commonly used types
pub use code::{Code, CodeTable};
pub use decoder::StreamDecoder;
pub use encoder::StreamEncoder;
pub use error::{Error, Result};
pub use frequency::FrequencyTable;
pub use metrics::Metrics;
pub use tree::{HuffmanTree, Node};
