//! Sample input generation.
//!
//! `huffcodec generate` writes a seeded file whose byte distribution is far
//! from uniform in some stretches and close to uniform in others, so the
//! encode summary shows both ends of what a frequency code can do.
//!
//! Blocks are drawn from four kinds:
//! - runs of one byte (a one-bit code per symbol at best)
//! - English-like text with a skewed letter distribution
//! - short repeating byte patterns
//! - uniformly random bytes (no gain possible)

use std::io::{self, Write};
use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Largest block drawn from one kind before picking again.
const BLOCK_BYTES: usize = 4096;

/// Letters roughly in order of English frequency; earlier ones are drawn more.
const TEXT_ALPHABET: &[u8] = b" etaoinshrdlucmfwypvbgkjqxz.,\n";

/// Generate `size_bytes` of sample data from `seed`.
pub fn generate_sample_data(seed: u64, size_bytes: usize) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut data = Vec::with_capacity(size_bytes);

    while data.len() < size_bytes {
        let block = (size_bytes - data.len()).min(rng.gen_range(256..=BLOCK_BYTES));

        match rng.gen_range(0..10u8) {
            0..=1 => {
                let byte: u8 = rng.gen();
                data.extend(std::iter::repeat(byte).take(block));
            }
            2..=5 => {
                for _ in 0..block {
                    data.push(skewed_letter(&mut rng));
                }
            }
            6..=7 => {
                let pattern_len = rng.gen_range(3..=24);
                let pattern: Vec<u8> = (0..pattern_len).map(|_| rng.gen()).collect();
                data.extend(pattern.iter().cycle().take(block));
            }
            _ => {
                let start = data.len();
                data.resize(start + block, 0);
                rng.fill(&mut data[start..]);
            }
        }
    }

    data
}

/// Pick from `TEXT_ALPHABET` with probability falling off toward the end.
fn skewed_letter(rng: &mut ChaCha8Rng) -> u8 {
    let r: f64 = rng.gen();
    let idx = (r * r * TEXT_ALPHABET.len() as f64) as usize;
    TEXT_ALPHABET[idx.min(TEXT_ALPHABET.len() - 1)]
}

/// Write generated data to `path`, returning the number of bytes written.
pub fn write_sample_file(path: &Path, seed: u64, size_bytes: usize) -> io::Result<usize> {
    let data = generate_sample_data(seed, size_bytes);
    let mut file = io::BufWriter::new(std::fs::File::create(path)?);
    file.write_all(&data)?;
    file.flush()?;
    Ok(data.len())
}
