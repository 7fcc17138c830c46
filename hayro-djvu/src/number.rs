//! Decoding of bounded signed integers.
//!
//! A number is decoded as a sequence of binary decisions that narrow down the
//! value: first its sign, then an upper bound found by doubling, and finally a
//! binary search within that bound. Every branch point of this search owns an
//! adaptive context. The contexts form a binary tree whose nodes are allocated
//! the first time a branch is reached, so frequently seen values quickly get
//! cheap to code.

use alloc::vec::Vec;

use crate::zp::{Context, ZpDecoder};

/// The largest number that is ever coded.
pub(crate) const BIG_POSITIVE: i32 = 262142;
/// The smallest number that is ever coded.
pub(crate) const BIG_NEGATIVE: i32 = -262143;

/// Number of nodes the arena grows by.
const CHUNK: usize = 20000;
/// Initial arena capacity.
const INITIAL_CAPACITY: usize = 20500;

/// The independent trees a JB2 stream codes numbers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tree {
    RecordType,
    ImageSize,
    MatchIndex,
    AbsoluteSizeX,
    AbsoluteSizeY,
    RelativeSizeX,
    RelativeSizeY,
    AbsoluteLocationX,
    AbsoluteLocationY,
    SameLineX,
    SameLineY,
    NewLineX,
    NewLineY,
    CommentLength,
    CommentOctet,
    InheritedShapeCount,
}

impl Tree {
    const COUNT: usize = 16;
}

/// A tree node. Index 0 means "not allocated yet".
#[derive(Debug, Clone, Copy, Default)]
struct Node {
    context: Context,
    left: u32,
    right: u32,
}

/// Where the next node of a traversal hangs.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Root(Tree),
    Left(u32),
    Right(u32),
}

/// A decoder for bounded integers, backed by an arena of tree nodes.
#[derive(Debug, Clone)]
pub(crate) struct NumberDecoder {
    roots: [u32; Tree::COUNT],
    nodes: Vec<Node>,
}

impl NumberDecoder {
    pub(crate) fn new() -> Self {
        let mut nodes = Vec::with_capacity(INITIAL_CAPACITY);
        nodes.push(Node::default());

        Self {
            roots: [0; Tree::COUNT],
            nodes,
        }
    }

    /// Forget everything learned so far.
    pub(crate) fn reset(&mut self) {
        self.roots = [0; Tree::COUNT];
        self.nodes.clear();
        self.nodes.push(Node::default());
    }

    /// Decode a number in `low..=high` using the given tree.
    ///
    /// If the range is empty, `low` is returned without consuming any data.
    pub(crate) fn decode(
        &mut self,
        zp: &mut ZpDecoder<'_>,
        tree: Tree,
        low: i32,
        high: i32,
    ) -> i32 {
        let mut low = i64::from(low);
        let mut high = i64::from(high);
        let mut negative = false;
        let mut cutoff: i64 = 0;
        let mut range: i64 = 0xffff_ffff;
        let mut phase = Phase::Sign;
        let mut slot = Slot::Root(tree);

        while range != 1 {
            let node = match self.child(slot) {
                0 => self.allocate(slot),
                node => node,
            };

            let decision = low >= cutoff
                || (high >= cutoff && zp.decode(&mut self.nodes[node as usize].context));

            slot = if decision {
                Slot::Right(node)
            } else {
                Slot::Left(node)
            };

            match phase {
                Phase::Sign => {
                    negative = !decision;

                    if negative {
                        (low, high) = (-high - 1, -low - 1);
                    }

                    phase = Phase::Bound;
                    cutoff = 1;
                }
                Phase::Bound => {
                    if decision {
                        cutoff += cutoff + 1;
                    } else {
                        phase = Phase::Search;
                        range = (cutoff + 1) / 2;

                        if range == 1 {
                            cutoff = 0;
                        } else {
                            cutoff -= range / 2;
                        }
                    }
                }
                Phase::Search => {
                    range /= 2;

                    if range != 1 {
                        if decision {
                            cutoff += range / 2;
                        } else {
                            cutoff -= range / 2;
                        }
                    } else if !decision {
                        cutoff -= 1;
                    }
                }
            }
        }

        let value = if negative { -cutoff - 1 } else { cutoff };

        // The decisions keep `value` within the bounds, which fit into `i32`.
        value as i32
    }

    fn child(&self, slot: Slot) -> u32 {
        match slot {
            Slot::Root(tree) => self.roots[tree as usize],
            Slot::Left(node) => self.nodes[node as usize].left,
            Slot::Right(node) => self.nodes[node as usize].right,
        }
    }

    fn allocate(&mut self, slot: Slot) -> u32 {
        if self.nodes.len() == self.nodes.capacity() {
            self.nodes.reserve(CHUNK);
        }

        let index = self.nodes.len() as u32;
        self.nodes.push(Node::default());

        match slot {
            Slot::Root(tree) => self.roots[tree as usize] = index,
            Slot::Left(node) => self.nodes[node as usize].left = index,
            Slot::Right(node) => self.nodes[node as usize].right = index,
        }

        index
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Sign,
    Bound,
    Search,
}
