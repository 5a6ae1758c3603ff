use std::fmt::{Display, Formatter};
use thiserror::Error;

/// A contiguous address range `[base_address, base_address + length)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryBlock {
    pub base_address: usize,
    pub length: usize,
}

impl MemoryBlock {
    pub fn new(base_address: usize, length: usize) -> Self {
        Self {
            base_address,
            length,
        }
    }

    /// One past the last address covered by this block.
    pub fn end(&self) -> usize {
        self.base_address + self.length
    }

    /// True when `next` starts exactly where this block ends.
    pub fn is_adjacent_to(&self, next: &MemoryBlock) -> bool {
        self.end() == next.base_address
    }

    fn overlaps(&self, other: &MemoryBlock) -> bool {
        self.base_address < other.end() && other.base_address < self.end()
    }
}

impl Display for MemoryBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} , {})", self.base_address, self.length)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemoryError {
    #[error("nothing is allocated, cannot free address {0}")]
    NothingAllocated(usize),
    #[error("blocks {0} and {1} overlap")]
    Overlap(MemoryBlock, MemoryBlock),
    #[error("block at address {0} has zero length")]
    ZeroLength(usize),
    #[error("blocks cover {actual} words but the space manages {expected}")]
    SizeMismatch { expected: usize, actual: usize },
}

mod space;
pub use space::*;
