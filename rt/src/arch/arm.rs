//! ARM Cortex-M primitives.

use cortex_m::register::msp;

/// The live top-of-stack address.
///
/// Never cache this across calls; it moves with every call frame, and
/// the collision check is only meaningful against the value it holds at
/// the moment of the check.
#[inline]
pub fn stack_pointer() -> usize {
    msp::read() as usize
}

/// Park the core forever. There is nothing above this process to return
/// control to.
#[inline]
pub fn halt() -> ! {
    loop {
        core::hint::spin_loop();
    }
}
