//! Memory management: the process-wide arena and the Rust-side heap
//! fed by it.

pub mod arena;

#[cfg(feature = "alloc")]
pub mod heap;

pub use arena::Arena;
