//! huffcodec: compress files with a frequency-table Huffman code
//!
//! ## Usage
//!
//! ```bash
//! # Compress: writes book.txt.huf and book.txt.huf.freq
//! huffcodec encode book.txt
//!
//! # Decompress: reads book.txt.huf.freq, writes book.txt
//! huffcodec decode book.txt.huf
//!
//! # Round trip through a temporary directory and compare checksums
//! huffcodec verify book.txt
//!
//! # Write a reproducible sample input
//! huffcodec generate sample.bin --size 1048576 --seed 42
//! ```

mod config;
mod input_gen;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use huffcodec_core::pipeline::{decode_file, encode_file};
use huffcodec_core::Metrics;

use crate::config::{Config, Mode};

/// Lossless file compression with a frequency-table Huffman code.
#[derive(Parser, Debug)]
#[command(name = "huffcodec")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Don't print the metrics summary
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Print the resolved configuration before running
    #[arg(long, global = true)]
    print_config: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compress a file
    Encode {
        /// File to compress
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Encoded payload path (default: INPUT.huf)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Frequency table path (default: OUTPUT.freq)
        #[arg(short, long, value_name = "FREQ")]
        freq: Option<PathBuf>,
    },

    /// Decompress a file
    Decode {
        /// Encoded payload
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Decoded output path (default: INPUT without .huf, else INPUT.dec)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Frequency table path (default: INPUT.freq)
        #[arg(short, long, value_name = "FREQ")]
        freq: Option<PathBuf>,
    },

    /// Encode and decode a file in a temporary directory and compare checksums
    Verify {
        /// File to round-trip
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },

    /// Write a seeded sample input file
    Generate {
        /// File to write
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Size in bytes
        #[arg(long, default_value = "1048576")]
        size: usize,

        /// Random seed (default: derived from the clock)
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    let Args {
        command,
        log_level,
        quiet,
        print_config,
    } = Args::parse();
    init_logging(&log_level)?;

    match command {
        Command::Encode {
            input,
            output,
            freq,
        } => run(Config::encode(input, output, freq), quiet, print_config),
        Command::Decode {
            input,
            output,
            freq,
        } => run(Config::decode(input, output, freq), quiet, print_config),
        Command::Verify { input } => verify(&input, quiet),
        Command::Generate { output, size, seed } => generate(&output, size, seed),
    }
}

fn init_logging(log_level: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => bail!("unknown log level: {other}"),
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")
}

fn run(mut config: Config, quiet: bool, print_config: bool) -> Result<()> {
    config.print_metrics = !quiet;
    if print_config {
        config.print();
    }
    config.validate()?;
    debug!(?config, "resolved configuration");

    let metrics = match config.mode {
        Mode::Encode => encode_file(&config.input, &config.output, &config.freq)
            .with_context(|| format!("failed to encode {}", config.input.display()))?,
        Mode::Decode => decode_file(&config.input, &config.output, &config.freq)
            .with_context(|| format!("failed to decode {}", config.input.display()))?,
    };

    info!(
        input = %config.input.display(),
        output = %config.output.display(),
        freq = %config.freq.display(),
        bytes = metrics.raw_bytes,
        "{} complete",
        metrics.operation.as_str()
    );
    if config.print_metrics {
        metrics.print_summary();
    }
    Ok(())
}

fn verify(input: &Path, quiet: bool) -> Result<()> {
    let dir = tempfile::tempdir().context("failed to create temporary directory")?;
    let encoded = dir.path().join("payload.huf");
    let freq = dir.path().join("payload.huf.freq");
    let decoded = dir.path().join("decoded");

    let encode_metrics = encode_file(input, &encoded, &freq)
        .with_context(|| format!("failed to encode {}", input.display()))?;
    let decode_metrics = decode_file(&encoded, &decoded, &freq)
        .context("failed to decode the encoded payload")?;

    let original_crc = encode_metrics.raw_crc32;
    let decoded_crc = file_crc32(&decoded)?;
    let matched = original_crc == decoded_crc
        && decode_metrics.raw_crc32 == decoded_crc
        && encode_metrics.raw_bytes == decode_metrics.raw_bytes;

    if !quiet {
        print_verify(&encode_metrics, &decode_metrics, decoded_crc);
    }
    if !matched {
        bail!(
            "round trip mismatch for {}: original crc32 {:#010x}, decoded crc32 {:#010x}",
            input.display(),
            original_crc,
            decoded_crc
        );
    }
    info!(input = %input.display(), crc32 = original_crc, "round trip verified");
    Ok(())
}

fn print_verify(encode: &Metrics, decode: &Metrics, decoded_crc: u32) {
    encode.print_summary();
    println!("\n=== verify ===");
    println!("Original: {} bytes, crc32 {:#010x}", encode.raw_bytes, encode.raw_crc32);
    println!("Decoded:  {} bytes, crc32 {:#010x}", decode.raw_bytes, decoded_crc);
}

fn file_crc32(path: &Path) -> Result<u32> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut hasher = crc32fast::Hasher::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader
            .read(&mut buf)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}

fn generate(output: &Path, size: usize, seed: Option<u64>) -> Result<()> {
    let seed = seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    });

    let written = input_gen::write_sample_file(output, seed, size)
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!(output = %output.display(), bytes = written, seed, "generated sample input");
    println!("Wrote {} bytes to {} (seed {})", written, output.display(), seed);
    Ok(())
}
