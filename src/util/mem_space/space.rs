use super::{MemoryBlock, MemoryError};
use std::fmt::{Debug, Display, Formatter};

/// A simulated linear address space of fixed size.
///
/// Only the bookkeeping is modelled: `allocated` holds the ranges handed out
/// to callers in allocation order, `free` holds the ranges still available.
/// Every address in `[0, total_size)` is covered by exactly one block of the
/// two lists.
#[derive(Clone)]
pub struct MemorySpace {
    total_size: usize,
    allocated: Vec<MemoryBlock>,
    free: Vec<MemoryBlock>,
}

impl Debug for MemorySpace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MemorySpace {{ total_size: {}, allocated: {}, free: {} }}",
            self.total_size,
            self.allocated.len(),
            self.free.len()
        )
    }
}

/// Free list on the first line, allocated list on the second.
impl Display for MemorySpace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for block in &self.free {
            write!(f, "{block} ")?;
        }
        writeln!(f)?;
        for block in &self.allocated {
            write!(f, "{block} ")?;
        }
        Ok(())
    }
}

impl MemorySpace {
    /// Creates a space managing `total_size` words, all of them free.
    pub fn new(total_size: usize) -> Self {
        MemorySpace {
            total_size,
            allocated: Vec::new(),
            free: Self::initial_free_list(total_size),
        }
    }

    fn initial_free_list(total_size: usize) -> Vec<MemoryBlock> {
        // a zero sized space has nothing to hand out.
        if total_size == 0 {
            Vec::new()
        } else {
            vec![MemoryBlock::new(0, total_size)]
        }
    }

    #[cfg(test)]
    pub(crate) fn with_free_blocks(total_size: usize, free: Vec<MemoryBlock>) -> Self {
        MemorySpace {
            total_size,
            allocated: Vec::new(),
            free,
        }
    }

    /// Allocates `length` words with a first-fit scan of the free list.
    ///
    /// The free list is scanned in its current order, not by address. An exact
    /// fit moves the free block over to the allocated list; a larger block is
    /// split and its remainder stays in place.
    ///
    /// Returns the base address of the new allocation, or `None` when no free
    /// block is large enough. Failure never triggers a defragmentation; callers
    /// may run [`MemorySpace::defrag`] themselves and retry.
    pub fn malloc(&mut self, length: usize) -> Option<usize> {
        if length == 0 {
            log::warn!("malloc of zero words rejected");
            return None;
        }

        let Some(idx) = self.free.iter().position(|block| block.length >= length) else {
            log::debug!("malloc({length}) failed, {} free blocks", self.free.len());
            return None;
        };

        let block = if self.free[idx].length == length {
            self.free.remove(idx)
        } else {
            let found = &mut self.free[idx];
            let block = MemoryBlock::new(found.base_address, length);
            found.base_address += length;
            found.length -= length;
            block
        };
        self.allocated.push(block);

        log::debug!("malloc({length}) -> {}", block.base_address);
        Some(block.base_address)
    }

    /// Returns the allocated block starting at `address` to the tail of the
    /// free list, unchanged and without coalescing.
    ///
    /// Fails only when nothing at all is allocated. An address that matches no
    /// allocated block is ignored.
    pub fn free(&mut self, address: usize) -> Result<(), MemoryError> {
        if self.allocated.is_empty() {
            log::warn!("free({address}) with nothing allocated");
            return Err(MemoryError::NothingAllocated(address));
        }

        match self
            .allocated
            .iter()
            .position(|block| block.base_address == address)
        {
            Some(idx) => {
                let block = self.allocated.remove(idx);
                self.free.push(block);
                log::debug!("free({address}) released {block}");
            }
            None => log::trace!("free({address}) matched no allocated block"),
        }
        Ok(())
    }

    /// Sorts the free list by address and merges every run of adjacent
    /// blocks into one.
    pub fn defrag(&mut self) {
        if self.free.len() <= 1 {
            return;
        }
        let before = self.free.len();

        self.free.sort_by_key(|block| block.base_address);
        let mut cur = 0;
        while cur + 1 < self.free.len() {
            if self.free[cur].is_adjacent_to(&self.free[cur + 1]) {
                let next = self.free.remove(cur + 1);
                self.free[cur].length += next.length;
                // stay on `cur`, the new neighbour may be adjacent too.
            } else {
                cur += 1;
            }
        }

        log::debug!("defrag merged {before} free blocks into {}", self.free.len());
    }

    /// Drops every allocation and rewinds to a single free block.
    pub fn reset(&mut self) {
        self.allocated.clear();
        self.free = Self::initial_free_list(self.total_size);
    }

    pub fn total_size(&self) -> usize {
        self.total_size
    }

    pub fn free_blocks(&self) -> &[MemoryBlock] {
        &self.free
    }

    pub fn allocated_blocks(&self) -> &[MemoryBlock] {
        &self.allocated
    }

    pub fn free_size(&self) -> usize {
        self.free.iter().map(|block| block.length).sum()
    }

    pub fn allocated_size(&self) -> usize {
        self.allocated.iter().map(|block| block.length).sum()
    }

    /// The biggest request that would currently succeed.
    pub fn largest_free_block(&self) -> Option<MemoryBlock> {
        self.free.iter().copied().max_by_key(|block| block.length)
    }

    /// Looks up the allocated block whose base address is `address`.
    pub fn lookup(&self, address: usize) -> Option<MemoryBlock> {
        self.allocated
            .iter()
            .find(|block| block.base_address == address)
            .copied()
    }

    /// Verifies that both lists together tile the space: positive lengths,
    /// no overlaps, and lengths summing to the total size.
    pub fn check_invariants(&self) -> Result<(), MemoryError> {
        let mut all: Vec<MemoryBlock> = self
            .free
            .iter()
            .chain(self.allocated.iter())
            .copied()
            .collect();

        if let Some(block) = all.iter().find(|block| block.length == 0) {
            return Err(MemoryError::ZeroLength(block.base_address));
        }

        all.sort_by_key(|block| block.base_address);
        for pair in all.windows(2) {
            if pair[0].overlaps(&pair[1]) {
                return Err(MemoryError::Overlap(pair[0], pair[1]));
            }
        }

        let actual: usize = all.iter().map(|block| block.length).sum();
        if actual != self.total_size {
            return Err(MemoryError::SizeMismatch {
                expected: self.total_size,
                actual,
            });
        }
        Ok(())
    }
}
