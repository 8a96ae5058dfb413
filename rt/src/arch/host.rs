//! Stand-ins for host builds and targets without a dedicated
//! implementation.

/// Approximate the top of the current stack with the address of a fresh
/// stack local. Unit tests that need an exact limit drive
/// [`crate::mm::arena::Arena::grow`] directly instead.
#[inline]
pub fn stack_pointer() -> usize {
    let probe = 0u8;
    core::ptr::addr_of!(probe) as usize
}

/// Park the thread forever.
#[inline]
pub fn halt() -> ! {
    loop {
        core::hint::spin_loop();
    }
}
