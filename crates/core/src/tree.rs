//! Huffman tree construction.
//!
//! The tree is a full binary tree: every internal node owns exactly two
//! children, and the leaves are exactly the symbols of the frequency table.
//! `Node` is a sum type, so a node with a single child cannot be expressed.
//!
//! # Tie-breaking
//!
//! Nodes are ordered by `(weight, sequence)`. Leaves are seeded in ascending
//! symbol order and take sequence numbers `0..n`; every internal node takes
//! the next sequence number when it is created. The two lowest keys are
//! removed on each step and the first one removed becomes the left child.
//! The same table therefore always yields the same tree, and the encoder and
//! decoder (which both rebuild it from the persisted table) agree on it.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap};

use tracing::debug;

use crate::error::{Error, Result};
use crate::frequency::FrequencyTable;

/// A node of the Huffman tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf {
        symbol: u8,
        weight: u64,
    },
    Internal {
        /// Sum of both children's weights
        weight: u64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    pub fn weight(&self) -> u64 {
        match self {
            Node::Leaf { weight, .. } | Node::Internal { weight, .. } => *weight,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Combine two subtrees under a new internal node.
    fn merge(left: Node, right: Node) -> Node {
        Node::Internal {
            weight: left.weight() + right.weight(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

/// Priority-queue entry. Ordered by weight, then creation sequence; the node
/// itself takes no part in the ordering.
#[derive(Debug)]
struct QueueEntry {
    weight: u64,
    sequence: usize,
    node: Node,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .cmp(&other.weight)
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A built Huffman tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    root: Node,
}

impl HuffmanTree {
    /// Build the tree for a frequency table.
    ///
    /// A single-symbol table yields a tree whose root is that symbol's leaf.
    ///
    /// # Errors
    /// - `Error::EmptyInput` if the table has no symbols
    /// - `Error::CountOverflow` if the counts sum past `u64::MAX`
    pub fn build(table: &FrequencyTable) -> Result<Self> {
        if table.is_empty() {
            return Err(Error::EmptyInput);
        }
        table
            .iter()
            .try_fold(0u64, |acc, (_, count)| acc.checked_add(count))
            .ok_or(Error::CountOverflow)?;

        let mut heap: BinaryHeap<Reverse<QueueEntry>> = table
            .iter()
            .enumerate()
            .map(|(sequence, (symbol, weight))| {
                Reverse(QueueEntry {
                    weight,
                    sequence,
                    node: Node::Leaf { symbol, weight },
                })
            })
            .collect();
        let mut next_sequence = heap.len();

        loop {
            let Reverse(first) = heap.pop().ok_or(Error::EmptyInput)?;
            let Some(Reverse(second)) = heap.pop() else {
                let tree = HuffmanTree { root: first.node };
                debug!(
                    leaves = tree.leaf_count(),
                    depth = tree.depth(),
                    weight = tree.weight(),
                    "built huffman tree"
                );
                return Ok(tree);
            };

            let node = Node::merge(first.node, second.node);
            heap.push(Reverse(QueueEntry {
                weight: node.weight(),
                sequence: next_sequence,
                node,
            }));
            next_sequence += 1;
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Total weight (the number of symbols in the original input).
    pub fn weight(&self) -> u64 {
        self.root.weight()
    }

    /// Number of leaves (distinct symbols).
    pub fn leaf_count(&self) -> usize {
        fn count(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 1,
                Node::Internal { left, right, .. } => count(left) + count(right),
            }
        }
        count(&self.root)
    }

    /// Length of the longest root-to-leaf path. A root-only tree has depth 0.
    pub fn depth(&self) -> usize {
        fn depth(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 0,
                Node::Internal { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        depth(&self.root)
    }

    /// Depth of every leaf, keyed by symbol.
    ///
    /// This is the raw path length; a root-only tree reports 0 for its sole
    /// symbol even though that symbol is coded with one bit.
    pub fn leaf_depths(&self) -> BTreeMap<u8, usize> {
        fn walk(node: &Node, depth: usize, out: &mut BTreeMap<u8, usize>) {
            match node {
                Node::Leaf { symbol, .. } => {
                    out.insert(*symbol, depth);
                }
                Node::Internal { left, right, .. } => {
                    walk(left, depth + 1, out);
                    walk(right, depth + 1, out);
                }
            }
        }
        let mut out = BTreeMap::new();
        walk(&self.root, 0, &mut out);
        out
    }
}
