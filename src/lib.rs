//! Simulated first-fit memory allocator.
//!
//! [`MemorySpace`] tracks a fixed linear address space as two lists of
//! [`MemoryBlock`] ranges: the blocks handed out by `malloc` and the blocks
//! still free. No real memory is touched.
//!
//! ```
//! use mem_space::MemorySpace;
//!
//! let mut space = MemorySpace::new(100);
//! assert_eq!(space.malloc(20), Some(0));
//! assert_eq!(space.malloc(30), Some(20));
//! space.free(0).unwrap();
//! space.defrag();
//! assert_eq!(space.malloc(15), Some(0));
//! ```

pub mod stress;
pub mod util;

pub use util::{MemoryBlock, MemoryError, MemorySpace};
