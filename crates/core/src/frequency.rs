//! Symbol frequency measurement.
//!
//! A `FrequencyTable` maps each byte value that occurs in the input to the
//! number of times it occurs. Symbols that never occur are absent, so the
//! table's symbols are exactly the leaves of the Huffman tree built from it.

use std::collections::BTreeMap;
use std::io::BufRead;

use tracing::debug;

use crate::bitio::ByteReader;
use crate::error::Result;

/// Mapping from symbol (byte value) to occurrence count.
///
/// Backed by a `BTreeMap`, so iteration is in ascending symbol order and
/// equality ignores the order records were inserted in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: BTreeMap<u8, u64>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every byte of an in-memory buffer.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut histogram = [0u64; 256];
        for &byte in data {
            histogram[byte as usize] += 1;
        }
        Self::from_histogram(&histogram)
    }

    /// Count every byte of a stream until it is exhausted.
    ///
    /// The stream is fully consumed; callers that need the bytes again must
    /// re-open or rewind it.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut histogram = [0u64; 256];
        let mut source = ByteReader::new(reader);
        source.for_each_chunk(|_, chunk| {
            for &byte in chunk {
                histogram[byte as usize] += 1;
            }
            Ok(())
        })?;

        let table = Self::from_histogram(&histogram);
        debug!(
            bytes = source.offset(),
            symbols = table.len(),
            "measured symbol frequencies"
        );
        Ok(table)
    }

    /// Build a table from a dense 256-entry histogram, skipping zero counts.
    pub fn from_histogram(histogram: &[u64; 256]) -> Self {
        let counts = histogram
            .iter()
            .enumerate()
            .filter(|(_, &count)| count > 0)
            .map(|(symbol, &count)| (symbol as u8, count))
            .collect();
        Self { counts }
    }

    /// Set the count for a symbol, returning the previous count if any.
    pub fn insert(&mut self, symbol: u8, count: u64) -> Option<u64> {
        self.counts.insert(symbol, count)
    }

    pub fn get(&self, symbol: u8) -> Option<u64> {
        self.counts.get(&symbol).copied()
    }

    pub fn contains(&self, symbol: u8) -> bool {
        self.counts.contains_key(&symbol)
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total number of symbols counted (the original input length).
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Iterate `(symbol, count)` pairs in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.counts.iter().map(|(&symbol, &count)| (symbol, count))
    }

    /// Records sorted by count descending, ties by ascending symbol.
    ///
    /// This is the order the persisted table is written in.
    pub fn sorted_by_count(&self) -> Vec<(u8, u64)> {
        let mut records: Vec<(u8, u64)> = self.iter().collect();
        records.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        records
    }

    /// Zeroth-order Shannon entropy in bits per symbol.
    ///
    /// Lower bound for the average Huffman code length of this distribution.
    pub fn entropy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let total = total as f64;
        self.counts
            .values()
            .filter(|&&count| count > 0)
            .map(|&count| {
                let p = count as f64 / total;
                -p * p.log2()
            })
            .sum()
    }
}

impl FromIterator<(u8, u64)> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = (u8, u64)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().collect(),
        }
    }
}
