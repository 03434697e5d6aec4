//! End-to-end encode and decode.
//!
//! Encode: measure frequencies, persist the table, read the table back,
//! build the tree and code table from it, then re-read the input and write
//! the payload. Decode: read the table, rebuild the tree, decode the payload.
//!
//! Both directions derive the tree from the persisted table, never from
//! in-memory state, so whatever the encoder used is exactly what the decoder
//! will rebuild.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::debug;

use crate::code::CodeTable;
use crate::decoder::StreamDecoder;
use crate::encoder::StreamEncoder;
use crate::error::{Error, Result};
use crate::freq_file;
use crate::frequency::FrequencyTable;
use crate::metrics::{Metrics, Operation};
use crate::tree::HuffmanTree;

/// An in-memory encoding: the table the decoder needs plus the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub table: FrequencyTable,
    pub payload: Vec<u8>,
    /// Payload bits excluding padding
    pub bit_len: u64,
}

/// Encode a buffer in memory.
pub fn encode_bytes(data: &[u8]) -> Result<Encoded> {
    let table = FrequencyTable::from_bytes(data);
    let tree = HuffmanTree::build(&table)?;
    let codes = CodeTable::from_tree(&tree);

    let mut payload = Vec::new();
    let summary = StreamEncoder::new(&codes).encode(data, &mut payload)?;

    Ok(Encoded {
        table,
        payload,
        bit_len: summary.bits,
    })
}

/// Decode a payload in memory with the table it was encoded with.
pub fn decode_bytes(table: &FrequencyTable, payload: &[u8]) -> Result<Vec<u8>> {
    let tree = HuffmanTree::build(table)?;
    // Every symbol takes at least one bit
    let capacity = table.total().min(payload.len() as u64 * 8);
    let mut out = Vec::with_capacity(capacity as usize);
    StreamDecoder::with_expected_symbols(&tree, table.total()).decode(payload, &mut out)?;
    Ok(out)
}

/// Encode `input` into `output`, writing the frequency table to `freq`.
///
/// `input` is read twice: once to count symbols and once to encode them.
pub fn encode_stream<R, W, F>(mut input: R, output: W, mut freq: F) -> Result<Metrics>
where
    R: BufRead + Seek,
    W: Write,
    F: Write,
{
    let mut metrics = Metrics::new(Operation::Encode);

    let table = FrequencyTable::from_reader(&mut input)?;
    if table.is_empty() {
        return Err(Error::EmptyInput);
    }

    let text = freq_file::to_string(&table);
    freq.write_all(text.as_bytes())?;
    freq.flush()?;
    metrics.table_bytes = text.len() as u64;

    // Build from the persisted form, exactly as the decoder will
    let table = freq_file::parse_table(&text)?;

    input.seek(SeekFrom::Start(0))?;
    encode_with_table(&table, input, output, &mut metrics)?;

    metrics.complete();
    Ok(metrics)
}

/// Decode `input` into `output` using the frequency table read from `freq`.
pub fn decode_stream<R, F, W>(input: R, freq: F, output: W) -> Result<Metrics>
where
    R: BufRead,
    F: BufRead,
    W: Write,
{
    let mut metrics = Metrics::new(Operation::Decode);

    let table = freq_file::read_table(freq)?;
    decode_with_table(&table, input, output, &mut metrics)?;

    metrics.complete();
    Ok(metrics)
}

/// Encode the file at `input` into `output`, writing the table to `freq`.
///
/// I/O errors carry the path of the file involved. Partial output files are
/// left in place on failure.
pub fn encode_file(input: &Path, output: &Path, freq: &Path) -> Result<Metrics> {
    let mut metrics = Metrics::new(Operation::Encode);

    let table = FrequencyTable::from_reader(open(input)?).map_err(|e| e.with_path(input))?;
    if table.is_empty() {
        return Err(Error::EmptyInput);
    }

    let freq_out = create(freq)?;
    metrics.table_bytes = freq_file::write_table(&table, freq_out).map_err(|e| e.with_path(freq))?;

    let table = freq_file::read_table(open(freq)?).map_err(|e| e.with_path(freq))?;

    let mut source = Tracked::new(open(input)?);
    let mut sink = Tracked::new(create(output)?);
    encode_with_table(&table, &mut source, &mut sink, &mut metrics)
        .and_then(|()| Ok(sink.flush()?))
        .map_err(|e| attribute(e, &[(source.failed, input), (sink.failed, output)]))?;

    debug!(
        input = %input.display(),
        output = %output.display(),
        freq = %freq.display(),
        "encoded file"
    );
    metrics.complete();
    Ok(metrics)
}

/// Decode the file at `input` into `output` using the table in `freq`.
pub fn decode_file(input: &Path, output: &Path, freq: &Path) -> Result<Metrics> {
    let mut metrics = Metrics::new(Operation::Decode);

    let table = freq_file::read_table(open(freq)?).map_err(|e| e.with_path(freq))?;

    let mut source = Tracked::new(open(input)?);
    let mut sink = Tracked::new(create(output)?);
    decode_with_table(&table, &mut source, &mut sink, &mut metrics)
        .and_then(|()| Ok(sink.flush()?))
        .map_err(|e| attribute(e, &[(source.failed, input), (sink.failed, output)]))?;

    debug!(
        input = %input.display(),
        output = %output.display(),
        freq = %freq.display(),
        "decoded file"
    );
    metrics.complete();
    Ok(metrics)
}

fn encode_with_table<R: BufRead, W: Write>(
    table: &FrequencyTable,
    input: R,
    output: W,
    metrics: &mut Metrics,
) -> Result<()> {
    let tree = HuffmanTree::build(table)?;
    let codes = CodeTable::from_tree(&tree);
    let summary = StreamEncoder::new(&codes).encode(input, output)?;

    metrics.raw_bytes = summary.symbols;
    metrics.payload_bytes = summary.payload_bytes();
    metrics.encoded_bits = summary.bits;
    metrics.padding_bits = summary.padding_bits as u64;
    metrics.raw_crc32 = summary.crc32;
    record_code_stats(table, &tree, metrics);
    Ok(())
}

fn decode_with_table<R: BufRead, W: Write>(
    table: &FrequencyTable,
    input: R,
    output: W,
    metrics: &mut Metrics,
) -> Result<()> {
    let tree = HuffmanTree::build(table)?;
    let summary = StreamDecoder::with_expected_symbols(&tree, table.total()).decode(input, output)?;

    metrics.raw_bytes = summary.symbols;
    metrics.payload_bytes = (summary.bits + summary.trailing_bits).div_ceil(8);
    metrics.encoded_bits = summary.bits;
    metrics.padding_bits = summary.trailing_bits;
    metrics.raw_crc32 = summary.crc32;
    metrics.table_bytes = freq_file::to_string(table).len() as u64;
    record_code_stats(table, &tree, metrics);
    Ok(())
}

fn record_code_stats(table: &FrequencyTable, tree: &HuffmanTree, metrics: &mut Metrics) {
    metrics.distinct_symbols = table.len();
    metrics.tree_depth = tree.depth();
    metrics.entropy_bits = table.entropy();
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| Error::from(e).with_path(path))
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| Error::from(e).with_path(path))
}

/// Stream wrapper that remembers whether one of its I/O calls failed, so an
/// error surfacing from a codec pass can be tied back to its file.
struct Tracked<T> {
    inner: T,
    failed: bool,
}

impl<T> Tracked<T> {
    fn new(inner: T) -> Self {
        Self {
            inner,
            failed: false,
        }
    }

    fn note<U>(&mut self, result: io::Result<U>) -> io::Result<U> {
        if result.is_err() {
            self.failed = true;
        }
        result
    }
}

impl<R: Read> Read for Tracked<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let result = self.inner.read(buf);
        self.note(result)
    }
}

impl<R: BufRead> BufRead for Tracked<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self.inner.fill_buf() {
            Ok(buf) => Ok(buf),
            Err(e) => {
                self.failed = true;
                Err(e)
            }
        }
    }

    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt);
    }
}

impl<W: Write> Write for Tracked<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let result = self.inner.write(buf);
        self.note(result)
    }

    fn flush(&mut self) -> io::Result<()> {
        let result = self.inner.flush();
        self.note(result)
    }
}

/// Attach the path of the first stream that failed to an I/O error.
fn attribute(err: Error, streams: &[(bool, &Path)]) -> Error {
    match streams.iter().find(|(failed, _)| *failed) {
        Some((_, path)) => err.with_path(*path),
        None => err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_bytes_round_trip() {
        let data = b"AAAAABBBCCD";
        let encoded = encode_bytes(data).unwrap();
        assert_eq!(encoded.bit_len, 20);
        assert_eq!(encoded.payload.len(), 3);
        assert_eq!(decode_bytes(&encoded.table, &encoded.payload).unwrap(), data);
    }

    #[test]
    fn test_bytes_empty_input() {
        assert!(matches!(encode_bytes(b""), Err(Error::EmptyInput)));
    }

    #[test]
    fn test_stream_round_trip() {
        let data = b"the rain in spain stays mainly in the plain".to_vec();

        let mut payload = Vec::new();
        let mut freq = Vec::new();
        let metrics = encode_stream(Cursor::new(&data), &mut payload, &mut freq).unwrap();
        assert_eq!(metrics.raw_bytes, data.len() as u64);
        assert_eq!(metrics.payload_bytes, payload.len() as u64);
        assert_eq!(metrics.table_bytes, freq.len() as u64);
        assert_eq!(metrics.raw_crc32, crc32fast::hash(&data));

        let mut decoded = Vec::new();
        let metrics = decode_stream(&payload[..], &freq[..], &mut decoded).unwrap();
        assert_eq!(decoded, data);
        assert_eq!(metrics.raw_crc32, crc32fast::hash(&data));
        assert_eq!(metrics.payload_bytes, payload.len() as u64);
        assert!(metrics.padding_bits < 8);
    }

    #[test]
    fn test_stream_empty_input_writes_no_table() {
        let mut payload = Vec::new();
        let mut freq = Vec::new();
        let err = encode_stream(Cursor::new(Vec::new()), &mut payload, &mut freq).unwrap_err();
        assert!(matches!(err, Error::EmptyInput));
        assert!(freq.is_empty());
        assert!(payload.is_empty());
    }

    #[test]
    fn test_decode_with_empty_table() {
        let mut out = Vec::new();
        let err = decode_stream(&b"\x00"[..], &b""[..], &mut out).unwrap_err();
        assert!(matches!(err, Error::EmptyInput));
    }

    #[test]
    fn test_decode_with_malformed_table() {
        let mut out = Vec::new();
        let err = decode_stream(&b"\x00"[..], &b"0100000:1\n"[..], &mut out).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_payload_mismatched_table_is_truncated() {
        let encoded = encode_bytes(b"abcdefgh").unwrap();
        let bigger: FrequencyTable = encoded
            .table
            .iter()
            .map(|(symbol, count)| (symbol, count * 100))
            .collect();
        let err = decode_bytes(&bigger, &encoded.payload).unwrap_err();
        assert!(matches!(err, Error::TruncatedStream { .. }));
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_tracked_marks_failing_stream() {
        let mut source = Tracked::new(&b"abcabcabc"[..]);
        let mut sink = Tracked::new(FailingWriter);
        let table = FrequencyTable::from_bytes(b"abc");
        let mut metrics = Metrics::new(Operation::Encode);

        let err = encode_with_table(&table, &mut source, &mut sink, &mut metrics).unwrap_err();
        assert!(!source.failed);
        assert!(sink.failed);

        let err = attribute(
            err,
            &[(source.failed, Path::new("in.txt")), (sink.failed, Path::new("out.huf"))],
        );
        match err {
            Error::File { path, .. } => assert_eq!(path, Path::new("out.huf")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_attribute_without_failure_keeps_error() {
        let err = Error::Io(io::Error::new(io::ErrorKind::Other, "boom"));
        let err = attribute(err, &[(false, Path::new("a")), (false, Path::new("b"))]);
        assert!(matches!(err, Error::Io(_)));
    }
}
