//! Resolved configuration for a codec run.
//!
//! Command-line arguments leave most paths optional; this module fills in the
//! defaults and checks the result before any file is touched.
//!
//! # Defaults
//!
//! - encode: `OUTPUT = INPUT.huf`, `FREQ = OUTPUT.freq`
//! - decode: `FREQ = INPUT.freq`, `OUTPUT = INPUT` without `.huf`, else `INPUT.dec`

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use huffcodec_core::error::{Error, Result};

/// Extension given to encoded payloads.
pub const PAYLOAD_EXTENSION: &str = "huf";
/// Extension appended for the frequency table.
pub const FREQ_EXTENSION: &str = "freq";
/// Extension appended when a decode output can't be derived by stripping.
pub const DECODED_EXTENSION: &str = "dec";

/// Direction of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Encode,
    Decode,
}

/// Complete configuration for an encode or decode run.
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,

    // === Files ===
    /// File read by the run
    pub input: PathBuf,

    /// File written by the run
    pub output: PathBuf,

    /// Frequency table (written on encode, read on decode)
    pub freq: PathBuf,

    // === Behavior ===
    /// Whether to print the metrics summary
    pub print_metrics: bool,
}

impl Config {
    pub fn encode(input: PathBuf, output: Option<PathBuf>, freq: Option<PathBuf>) -> Self {
        let output = output.unwrap_or_else(|| append_extension(&input, PAYLOAD_EXTENSION));
        let freq = freq.unwrap_or_else(|| append_extension(&output, FREQ_EXTENSION));
        Self {
            mode: Mode::Encode,
            input,
            output,
            freq,
            print_metrics: true,
        }
    }

    pub fn decode(input: PathBuf, output: Option<PathBuf>, freq: Option<PathBuf>) -> Self {
        let freq = freq.unwrap_or_else(|| append_extension(&input, FREQ_EXTENSION));
        let output = output.unwrap_or_else(|| default_decode_output(&input));
        Self {
            mode: Mode::Decode,
            input,
            output,
            freq,
            print_metrics: true,
        }
    }

    /// Check the resolved paths.
    ///
    /// The input must exist and the three paths must name different files.
    pub fn validate(&self) -> Result<()> {
        if !self.input.is_file() {
            return Err(Error::Config(format!(
                "input file {} does not exist",
                self.input.display()
            )));
        }
        if self.mode == Mode::Decode && !self.freq.is_file() {
            return Err(Error::Config(format!(
                "frequency table {} does not exist",
                self.freq.display()
            )));
        }

        let pairs = [
            ("output", &self.output, "input", &self.input),
            ("frequency table", &self.freq, "input", &self.input),
            ("frequency table", &self.freq, "output", &self.output),
        ];
        for (a_name, a, b_name, b) in pairs {
            if same_file(a, b) {
                return Err(Error::Config(format!(
                    "{a_name} and {b_name} are the same file: {}",
                    a.display()
                )));
            }
        }
        Ok(())
    }

    /// Print the configuration in human-readable form.
    pub fn print(&self) {
        println!("=== Configuration ===");
        println!("Mode:            {:?}", self.mode);
        println!("Input file:      {}", self.input.display());
        println!("Output file:     {}", self.output.display());
        println!("Frequency table: {}", self.freq.display());
        println!();
    }
}

fn append_extension(path: &Path, extension: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

fn default_decode_output(input: &Path) -> PathBuf {
    match input.extension() {
        Some(ext) if ext == PAYLOAD_EXTENSION => input.with_extension(""),
        _ => append_extension(input, DECODED_EXTENSION),
    }
}

/// Lexical match, or both resolve to the same place.
fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (resolve(a), resolve(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Canonical form of `path`. A file that doesn't exist yet resolves through
/// its parent directory.
fn resolve(path: &Path) -> Option<PathBuf> {
    if let Ok(resolved) = path.canonicalize() {
        return Some(resolved);
    }
    let name = path.file_name()?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    parent.canonicalize().ok().map(|dir| dir.join(name))
}
