//! Code table generation.
//!
//! A symbol's code is the path from the root to its leaf: `0` for every step
//! to a left child, `1` for every step to a right child. Because every leaf
//! ends a path in a full binary tree, no code is a prefix of another.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::frequency::FrequencyTable;
use crate::tree::{HuffmanTree, Node};

/// A bit-string code, first bit first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Code {
    bits: Vec<bool>,
}

impl Code {
    pub fn new(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// True if `self` is a (non-strict) prefix of `other`.
    pub fn is_prefix_of(&self, other: &Code) -> bool {
        other.bits.starts_with(&self.bits)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &bit in &self.bits {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Mapping from symbol to its code, one entry per leaf of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTable {
    codes: BTreeMap<u8, Code>,
}

impl CodeTable {
    /// Derive the code table for a tree.
    ///
    /// A tree whose root is a leaf gives its sole symbol the one-bit code
    /// `0`; a zero-length code could not be read back.
    pub fn from_tree(tree: &HuffmanTree) -> Self {
        let mut codes = BTreeMap::new();

        match tree.root() {
            Node::Leaf { symbol, .. } => {
                codes.insert(*symbol, Code::new(vec![false]));
            }
            root => {
                let mut path = Vec::new();
                assign(root, &mut path, &mut codes);
            }
        }

        debug!(
            symbols = codes.len(),
            longest = codes.values().map(Code::len).max().unwrap_or(0),
            "generated code table"
        );
        Self { codes }
    }

    pub fn get(&self, symbol: u8) -> Option<&Code> {
        self.codes.get(&symbol)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Iterate `(symbol, code)` in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &Code)> + '_ {
        self.codes.iter().map(|(&symbol, code)| (symbol, code))
    }

    /// Dense lookup indexed by symbol value.
    pub fn to_lookup(&self) -> Vec<Option<&Code>> {
        let mut lookup = vec![None; 256];
        for (symbol, code) in self.iter() {
            lookup[symbol as usize] = Some(code);
        }
        lookup
    }

    /// True if no code is a prefix of another.
    pub fn is_prefix_free(&self) -> bool {
        let mut sorted: Vec<&Code> = self.codes.values().collect();
        // In lexicographic order a prefix sorts immediately before some code
        // it prefixes, so checking neighbours is enough.
        sorted.sort();
        sorted.windows(2).all(|pair| !pair[0].is_prefix_of(pair[1]))
    }

    /// Exact payload length in bits for an input with these frequencies.
    ///
    /// Returns `None` if the table holds a symbol this code table lacks.
    pub fn encoded_bits(&self, table: &FrequencyTable) -> Option<u64> {
        table.iter().try_fold(0u64, |acc, (symbol, count)| {
            let len = self.get(symbol)?.len() as u64;
            acc.checked_add(len.checked_mul(count)?)
        })
    }

    /// Average code length in bits per symbol, weighted by `table`.
    pub fn average_length(&self, table: &FrequencyTable) -> f64 {
        let total = table.total();
        match self.encoded_bits(table) {
            Some(bits) if total > 0 => bits as f64 / total as f64,
            _ => 0.0,
        }
    }
}

fn assign(node: &Node, path: &mut Vec<bool>, codes: &mut BTreeMap<u8, Code>) {
    match node {
        Node::Leaf { symbol, .. } => {
            codes.insert(*symbol, Code::new(path.clone()));
        }
        Node::Internal { left, right, .. } => {
            path.push(false);
            assign(left, path, codes);
            path.pop();

            path.push(true);
            assign(right, path, codes);
            path.pop();
        }
    }
}
