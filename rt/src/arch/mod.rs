//! Architecture support.
//!
//! The bridge needs exactly two things from the hardware: the live
//! top-of-stack address, re-read on every arena growth check, and a
//! terminal halt. Cortex-M targets read the MSP register; every other
//! target (notably the host running the unit tests) substitutes a
//! portable stand-in.

#[cfg(all(target_arch = "arm", target_os = "none"))]
pub mod arm;

#[cfg(all(target_arch = "arm", target_os = "none"))]
pub use arm::*;

#[cfg(not(all(target_arch = "arm", target_os = "none")))]
pub mod host;

#[cfg(not(all(target_arch = "arm", target_os = "none")))]
pub use host::*;
