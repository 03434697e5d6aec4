//! Metrics for a single encode or decode run.
//!
//! Records sizes, code statistics, checksums, and timing so the driver can
//! report what a run did and verify a round trip.
//!
//! # Thread Safety
//!
//! `Metrics` is a plain value owned by the run that fills it in. Concurrent
//! runs each keep their own.

use std::io::{self, Write};
use std::time::{Duration, Instant};

/// Which direction a run went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Encode,
    Decode,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Encode => "encode",
            Operation::Decode => "decode",
        }
    }
}

/// Metrics for one encode or decode run.
#[derive(Debug, Clone)]
pub struct Metrics {
    pub operation: Operation,

    // === Timing ===
    /// When the run started
    pub start_time: Instant,

    /// When the run ended (set on completion)
    pub end_time: Option<Instant>,

    // === Sizes ===
    /// Uncompressed bytes (read on encode, written on decode)
    pub raw_bytes: u64,

    /// Encoded payload bytes, padding included
    pub payload_bytes: u64,

    /// Size of the persisted frequency table
    pub table_bytes: u64,

    // === Code ===
    /// Distinct symbols in the frequency table
    pub distinct_symbols: usize,

    /// Payload bits excluding padding
    pub encoded_bits: u64,

    /// Zero bits padding the last payload byte
    pub padding_bits: u64,

    /// Longest root-to-leaf path in the tree
    pub tree_depth: usize,

    /// Shannon entropy of the symbol distribution, bits per symbol
    pub entropy_bits: f64,

    // === Integrity ===
    /// CRC32 of the uncompressed bytes
    pub raw_crc32: u32,
}

impl Metrics {
    /// Create new metrics with start time set to now.
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            start_time: Instant::now(),
            end_time: None,
            raw_bytes: 0,
            payload_bytes: 0,
            table_bytes: 0,
            distinct_symbols: 0,
            encoded_bits: 0,
            padding_bits: 0,
            tree_depth: 0,
            entropy_bits: 0.0,
            raw_crc32: 0,
        }
    }

    /// Mark the run as complete.
    pub fn complete(&mut self) {
        self.end_time = Some(Instant::now());
    }

    /// Get total duration (or current elapsed if not complete).
    pub fn duration(&self) -> Duration {
        match self.end_time {
            Some(end) => end.duration_since(self.start_time),
            None => self.start_time.elapsed(),
        }
    }

    /// Compute compression ratio (payload / raw).
    ///
    /// Returns 0.0 if no data was processed.
    pub fn compression_ratio(&self) -> f64 {
        if self.raw_bytes == 0 {
            0.0
        } else {
            self.payload_bytes as f64 / self.raw_bytes as f64
        }
    }

    /// Compression ratio counting the frequency table as part of the output.
    pub fn total_ratio(&self) -> f64 {
        if self.raw_bytes == 0 {
            0.0
        } else {
            (self.payload_bytes + self.table_bytes) as f64 / self.raw_bytes as f64
        }
    }

    /// Average code length in bits per symbol.
    pub fn average_code_bits(&self) -> f64 {
        if self.raw_bytes == 0 {
            0.0
        } else {
            self.encoded_bits as f64 / self.raw_bytes as f64
        }
    }

    /// Compute throughput in uncompressed bytes/second.
    pub fn throughput_bps(&self) -> f64 {
        let duration_secs = self.duration().as_secs_f64();
        if duration_secs == 0.0 {
            0.0
        } else {
            self.raw_bytes as f64 / duration_secs
        }
    }

    /// Print a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n=== {} summary ===", self.operation.as_str());
        println!("Duration: {} ms", self.duration().as_millis());
        println!();

        println!("Raw:     {} bytes ({:.2} MiB)", self.raw_bytes, mib(self.raw_bytes));
        println!("Payload: {} bytes ({:.2} MiB)", self.payload_bytes, mib(self.payload_bytes));
        println!("Table:   {} bytes", self.table_bytes);
        println!(
            "Ratio:   {:.1}% ({:.1}% with table)",
            self.compression_ratio() * 100.0,
            self.total_ratio() * 100.0
        );
        println!();

        println!("=== Code ===");
        println!("Distinct symbols: {}", self.distinct_symbols);
        println!("Tree depth: {}", self.tree_depth);
        println!("Average code length: {:.3} bits/symbol", self.average_code_bits());
        println!("Entropy: {:.3} bits/symbol", self.entropy_bits);
        println!("Encoded bits: {} (+{} padding)", self.encoded_bits, self.padding_bits);
        println!("CRC32: {:#010x}", self.raw_crc32);
        println!();

        println!("Throughput: {:.2} MB/s", self.throughput_bps() / 1_000_000.0);
    }

    /// Export metrics as a simple text format (for parsing/testing).
    pub fn export_text(&self) -> String {
        format!(
            "operation={}\n\
             duration_ms={}\n\
             raw_bytes={}\n\
             payload_bytes={}\n\
             table_bytes={}\n\
             compression_ratio={:.4}\n\
             distinct_symbols={}\n\
             encoded_bits={}\n\
             padding_bits={}\n\
             tree_depth={}\n\
             entropy_bits={:.4}\n\
             raw_crc32={:#010x}\n",
            self.operation.as_str(),
            self.duration().as_millis(),
            self.raw_bytes,
            self.payload_bytes,
            self.table_bytes,
            self.compression_ratio(),
            self.distinct_symbols,
            self.encoded_bits,
            self.padding_bits,
            self.tree_depth,
            self.entropy_bits,
            self.raw_crc32,
        )
    }
}

fn mib(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0
}

/// Write adapter that keeps a running CRC32 of everything written through it.
#[derive(Debug)]
pub struct ChecksumWriter<W> {
    inner: W,
    hasher: crc32fast::Hasher,
}

impl<W: Write> ChecksumWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: crc32fast::Hasher::new(),
        }
    }

    /// CRC32 of the bytes written so far.
    pub fn crc32(&self) -> u32 {
        self.hasher.clone().finalize()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for ChecksumWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new(Operation::Encode);
        assert!(metrics.end_time.is_none());
        assert!(metrics.duration().as_millis() < 100); // Should be recent
    }

    #[test]
    fn test_compression_ratio() {
        let mut metrics = Metrics::new(Operation::Encode);
        metrics.raw_bytes = 1000;
        metrics.payload_bytes = 750;
        metrics.table_bytes = 50;

        assert_eq!(metrics.compression_ratio(), 0.75);
        assert_eq!(metrics.total_ratio(), 0.8);
    }

    #[test]
    fn test_ratios_with_no_data() {
        let metrics = Metrics::new(Operation::Decode);
        assert_eq!(metrics.compression_ratio(), 0.0);
        assert_eq!(metrics.total_ratio(), 0.0);
        assert_eq!(metrics.average_code_bits(), 0.0);
    }

    #[test]
    fn test_average_code_bits() {
        let mut metrics = Metrics::new(Operation::Encode);
        metrics.raw_bytes = 11;
        metrics.encoded_bits = 20;
        assert!((metrics.average_code_bits() - 20.0 / 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_throughput() {
        let mut metrics = Metrics::new(Operation::Encode);
        metrics.raw_bytes = 1_000_000;

        std::thread::sleep(Duration::from_millis(10));
        metrics.complete();

        assert!(metrics.throughput_bps() > 0.0);
    }

    #[test]
    fn test_export_text() {
        let mut metrics = Metrics::new(Operation::Decode);
        metrics.raw_bytes = 1000;
        metrics.payload_bytes = 600;
        metrics.raw_crc32 = 0xdeadbeef;

        let text = metrics.export_text();
        assert!(text.contains("operation=decode"));
        assert!(text.contains("raw_bytes=1000"));
        assert!(text.contains("payload_bytes=600"));
        assert!(text.contains("raw_crc32=0xdeadbeef"));
    }

    #[test]
    fn test_checksum_writer() {
        let mut writer = ChecksumWriter::new(Vec::new());
        writer.write_all(b"hello ").unwrap();
        writer.write_all(b"world").unwrap();
        assert_eq!(writer.crc32(), crc32fast::hash(b"hello world"));
        assert_eq!(writer.into_inner(), b"hello world".to_vec());
    }
}
