mod mem_space;
pub use mem_space::*;

mod bench;
pub use bench::*;
