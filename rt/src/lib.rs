//! Ferrite runtime bridge
//!
//! The layer between a standard-library-shaped world and the bare metal:
//! dynamic memory growth with stack-collision detection, constructor and
//! destructor sequencing, and the minimal descriptor I/O a C standard
//! library expects to link against. Everything else in the firmware
//! (scheduler, drivers, application tasks) sits above this crate and
//! reaches it only through the standard library's allocator and startup
//! path, never directly.
//!
//! On a bare-metal build (`target_os = "none"`) the [`newlib`] module
//! exports the exact symbol set newlib links against (`_sbrk`, `_write`,
//! `__libc_init_array`, ...). On any other target those exports are
//! compiled out and the portable modules underneath them are unit-tested
//! with an ordinary host toolchain.
//!
//! Real console I/O is an embedding concern, not a gap here: install a
//! [`syscall::Transport`] that routes `write` to a peripheral and the
//! remaining operations keep their stub contracts.
//!
//! ```ignore
//! struct Uart1;
//!
//! impl ferrite_rt::Transport for Uart1 {
//!     fn write(&self, _fd: ferrite_rt::Descriptor, buf: &[u8]) -> Result<usize, ferrite_rt::Errno> {
//!         uart1::send(buf);
//!         Ok(buf.len())
//!     }
//! }
//!
//! static UART1: Uart1 = Uart1;
//! ferrite_rt::install_transport(&UART1);
//! ```

#![no_std]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod arch;
pub mod diag;
pub mod error;
pub mod mm;
pub mod startup;
pub mod syscall;

#[cfg(target_os = "none")]
pub mod newlib;

/// The allocator serving Rust `alloc` on the target, fed by the same
/// arena `_sbrk` grows. Host builds keep the host allocator.
#[cfg(all(feature = "alloc", target_os = "none"))]
#[global_allocator]
static ALLOCATOR: mm::heap::ArenaHeap = mm::heap::ArenaHeap::empty();

/// Get a reference to the global allocator
#[cfg(all(feature = "alloc", target_os = "none"))]
pub fn global_heap() -> &'static mm::heap::ArenaHeap {
    &ALLOCATOR
}

pub use error::{ArenaError, Errno};
pub use syscall::{install_transport, Descriptor, Transport};
