//! The Rust-side heap, fed by the process arena.
//!
//! Plays the role newlib's `malloc` plays over `_sbrk`: a free-list
//! allocator that claims arena space in granules as demand grows and
//! recycles blocks internally. The arena underneath stays append-only.
//!
//! The heap relies on its claimed region staying contiguous, so it must
//! be the arena's only consumer: linking C code whose `malloc` also
//! calls `_sbrk` is not supported alongside this allocator.

use core::alloc::{GlobalAlloc, Layout};
use core::ptr::{self, NonNull};

use linked_list_allocator::Heap;
use spin::Mutex;

use crate::error::ArenaError;
use crate::mm::arena;

/// Bytes claimed from the arena per extension, at minimum. Small enough
/// for MCU-class RAM, large enough that byte-sized allocations do not
/// each pay a growth round-trip.
pub const GROWTH_GRANULE: usize = 1024;

/// `GlobalAlloc` over a [`Heap`] whose region is grown on demand through
/// [`arena::grow`].
pub struct ArenaHeap {
    inner: Mutex<Heap>,
}

impl ArenaHeap {
    /// An allocator that has claimed nothing yet.
    pub const fn empty() -> Self {
        Self {
            inner: Mutex::new(Heap::empty()),
        }
    }

    /// Bytes currently handed out.
    pub fn used(&self) -> usize {
        self.inner.lock().used()
    }

    /// Bytes claimed from the arena but free for reuse.
    pub fn free(&self) -> usize {
        self.inner.lock().free()
    }

    /// Serve `layout` from `heap`, claiming more arena space through
    /// `grow` on exhaustion. `grow` is the process-wide arena in
    /// production; tests inject their own.
    fn allocate_in(
        heap: &mut Heap,
        layout: Layout,
        grow: &mut dyn FnMut(isize) -> Result<usize, ArenaError>,
    ) -> *mut u8 {
        if let Ok(block) = heap.allocate_first_fit(layout) {
            return block.as_ptr();
        }

        let shortfall = layout.size() + layout.align();
        let claim = (shortfall + GROWTH_GRANULE - 1) & !(GROWTH_GRANULE - 1);
        let previous = match grow(claim as isize) {
            Ok(previous) => previous,
            Err(_) => return ptr::null_mut(),
        };

        if heap.size() == 0 {
            // SAFETY: `[previous, previous + claim)` was just handed out by
            // the arena and nothing else holds it.
            unsafe { heap.init(previous as *mut u8, claim) };
        } else if previous == heap.top() as usize {
            // SAFETY: the new region starts exactly at the heap's top, so
            // the heap stays one contiguous range it exclusively owns.
            unsafe { heap.extend(claim) };
        } else {
            // A foreign consumer grew the arena since the last extension.
            // The gap belongs to it; absorbing it would hand the same bytes
            // out twice. The claimed block is stranded instead.
            log::warn!(
                "arena no longer contiguous with the heap; {} claimed bytes stranded",
                claim
            );
            return ptr::null_mut();
        }

        heap.allocate_first_fit(layout)
            .map(|block| block.as_ptr())
            .unwrap_or(ptr::null_mut())
    }
}

unsafe impl GlobalAlloc for ArenaHeap {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let mut heap = self.inner.lock();
        Self::allocate_in(&mut heap, layout, &mut arena::grow)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        // SAFETY: `ptr` came from `alloc` with this `layout` on this heap
        // (GlobalAlloc contract), so it is non-null, aligned, and no longer
        // in use by the caller.
        unsafe {
            self.inner.lock().deallocate(NonNull::new_unchecked(ptr), layout);
        }
    }
}

#[cfg(all(test, not(target_os = "none")))]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::mm::arena::Arena;

    struct TestRegion {
        arena: Arena,
        limit: usize,
    }

    fn test_region(len: usize) -> TestRegion {
        let region = vec![0u8; len].leak();
        let origin = region.as_ptr() as usize;
        TestRegion {
            arena: Arena::new(origin),
            limit: origin + len,
        }
    }

    #[test]
    fn serves_writable_blocks_and_recycles_freed_space() {
        let mut region = test_region(64 * 1024);
        let limit = region.limit;
        let mut grow = |by: isize| region.arena.grow(by, limit);
        let mut heap = Heap::empty();
        let layout = Layout::from_size_align(64, 8).unwrap();

        let a = ArenaHeap::allocate_in(&mut heap, layout, &mut grow);
        assert!(!a.is_null());
        // SAFETY: `a` points at 64 writable bytes served from the region.
        unsafe { ptr::write_bytes(a, 0xAB, 64) };

        let b = ArenaHeap::allocate_in(&mut heap, layout, &mut grow);
        assert!(!b.is_null());
        assert_ne!(a, b);

        // SAFETY: `a` was allocated above with `layout` and is unused now.
        unsafe { heap.deallocate(NonNull::new(a).unwrap(), layout) };

        // The freed block is recycled: no further arena growth happens.
        let brk_before = region.arena.brk();
        let mut grow_again = |by: isize| region.arena.grow(by, limit);
        let c = ArenaHeap::allocate_in(&mut heap, layout, &mut grow_again);
        assert!(!c.is_null());
        assert_eq!(region.arena.brk(), brk_before);
    }

    #[test]
    fn claims_follow_demand_in_granules() {
        let mut region = test_region(64 * 1024);
        let limit = region.limit;
        let origin = region.arena.origin();
        let mut heap = Heap::empty();

        let small = Layout::from_size_align(16, 8).unwrap();
        let mut grow = |by: isize| region.arena.grow(by, limit);
        assert!(!ArenaHeap::allocate_in(&mut heap, small, &mut grow).is_null());
        assert_eq!(region.arena.brk(), origin + GROWTH_GRANULE);

        let large = Layout::from_size_align(3 * GROWTH_GRANULE, 8).unwrap();
        let mut grow_again = |by: isize| region.arena.grow(by, limit);
        assert!(!ArenaHeap::allocate_in(&mut heap, large, &mut grow_again).is_null());
        assert!(region.arena.brk() >= origin + 4 * GROWTH_GRANULE);
    }

    #[test]
    fn refused_growth_yields_null() {
        // A limit tighter than one granule refuses the very first claim.
        let mut arena = Arena::new(0x2000_0000);
        let mut grow = |by: isize| arena.grow(by, 0x2000_0100);
        let mut heap = Heap::empty();
        let layout = Layout::from_size_align(64, 8).unwrap();
        assert!(ArenaHeap::allocate_in(&mut heap, layout, &mut grow).is_null());
    }

    #[test]
    fn foreign_arena_growth_is_not_absorbed() {
        let mut region = test_region(64 * 1024);
        let limit = region.limit;
        let mut grow = |by: isize| region.arena.grow(by, limit);
        let mut heap = Heap::empty();

        let layout = Layout::from_size_align(64, 8).unwrap();
        assert!(!ArenaHeap::allocate_in(&mut heap, layout, &mut grow).is_null());

        // Another consumer takes arena space behind the heap's back.
        region.arena.grow(128, limit).unwrap();

        // The next extension attempt sees the gap and refuses rather than
        // absorbing bytes it does not own.
        let big = Layout::from_size_align(2 * GROWTH_GRANULE, 8).unwrap();
        let mut grow_again = |by: isize| region.arena.grow(by, limit);
        assert!(ArenaHeap::allocate_in(&mut heap, big, &mut grow_again).is_null());
    }
}
