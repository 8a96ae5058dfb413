//! The dynamically-growable memory arena and its stack-collision guard.
//!
//! One arena exists per process. Its origin is fixed at link time (the
//! first address past zero-initialized data); its break only ever moves
//! by explicit [`grow`] requests, and space handed out is never taken
//! back at this layer. Reuse is the business of the allocator sitting
//! on top: `mm::heap` on the Rust side, newlib's `malloc` through
//! `_sbrk` on the C side.

use spin::Mutex;

use crate::arch;
use crate::error::ArenaError;

/// A growable region bounded below by its origin and above by whatever
/// limit each growth request is checked against -- the live stack
/// pointer, for the process-wide arena.
#[derive(Debug, Clone, Copy)]
pub struct Arena {
    origin: usize,
    brk: usize,
}

impl Arena {
    /// An arena rooted at `origin` with nothing handed out yet.
    pub const fn new(origin: usize) -> Self {
        Self {
            origin,
            brk: origin,
        }
    }

    /// The fixed lower bound of the arena.
    pub fn origin(&self) -> usize {
        self.origin
    }

    /// The current end of the arena; the address the next successful
    /// grow request hands out.
    pub fn brk(&self) -> usize {
        self.brk
    }

    /// Move the break by `by` bytes, checked against `limit`, and return
    /// the previous break -- the base of the newly usable block when
    /// `by` is positive.
    ///
    /// The request is refused when the proposed break would meet or pass
    /// `limit` (heap/stack collision) or fall below the arena origin.
    /// Refusal leaves the break untouched; whether refusal is fatal is
    /// the caller's decision, which keeps this check testable without
    /// hardware.
    pub fn grow(&mut self, by: isize, limit: usize) -> Result<usize, ArenaError> {
        let refusal = ArenaError::Collision {
            brk: self.brk,
            requested: by,
            limit,
        };
        let proposed = match self.brk.checked_add_signed(by) {
            Some(proposed) => proposed,
            None => return Err(refusal),
        };
        if proposed >= limit || proposed < self.origin {
            return Err(refusal);
        }
        let previous = self.brk;
        self.brk = proposed;
        Ok(previous)
    }
}

static PROCESS_ARENA: Mutex<Option<Arena>> = Mutex::new(None);

/// Root the process-wide arena at `origin`. The first call wins and
/// later calls are no-ops, so the lazy attach in `_sbrk` stays
/// idempotent.
pub fn attach(origin: usize) {
    let mut arena = PROCESS_ARENA.lock();
    if arena.is_none() {
        *arena = Some(Arena::new(origin));
    }
}

/// Grow the process-wide arena, checked against the stack pointer as it
/// is right now.
///
/// The internal lock makes one call's read-check-advance atomic with
/// respect to other tasks, so concurrent callers each receive disjoint
/// blocks. It does not make growth safe from interrupt context -- a
/// handler spinning on a lock held by the task it preempted never
/// finishes. Keep allocation out of interrupt handlers, or serialize
/// above this layer.
pub fn grow(by: isize) -> Result<usize, ArenaError> {
    let mut arena = PROCESS_ARENA.lock();
    let arena = arena.as_mut().ok_or(ArenaError::Unattached)?;
    arena.grow(by, arch::stack_pointer())
}

#[cfg(all(test, not(target_os = "none")))]
mod tests {
    use super::*;
    use crate::error::ArenaError;

    #[test]
    fn growth_is_monotonic_and_gapless() {
        let mut arena = Arena::new(0x1000);
        assert_eq!(arena.grow(0x50, 0x1100), Ok(0x1000));
        assert_eq!(arena.brk(), 0x1050);
        assert_eq!(arena.grow(0x20, 0x1100), Ok(0x1050));
        assert_eq!(arena.brk(), 0x1070);
        assert_eq!(arena.origin(), 0x1000);
    }

    #[test]
    fn collision_is_refused_and_break_unchanged() {
        let mut arena = Arena::new(0x1000);
        arena.grow(0x50, 0x1100).unwrap();
        assert_eq!(
            arena.grow(0xB0, 0x1100),
            Err(ArenaError::Collision {
                brk: 0x1050,
                requested: 0xB0,
                limit: 0x1100,
            })
        );
        assert_eq!(arena.brk(), 0x1050);
    }

    #[test]
    fn break_reaching_limit_exactly_is_refused() {
        let mut arena = Arena::new(0x1000);
        assert!(arena.grow(0x100, 0x1100).is_err());
        assert_eq!(arena.grow(0xFF, 0x1100), Ok(0x1000));
        assert_eq!(arena.brk(), 0x10FF);
    }

    #[test]
    fn zero_growth_reports_the_current_break() {
        let mut arena = Arena::new(0x1000);
        assert_eq!(arena.grow(0, 0x1100), Ok(0x1000));
        assert_eq!(arena.brk(), 0x1000);
    }

    #[test]
    fn negative_growth_moves_down_but_never_below_origin() {
        let mut arena = Arena::new(0x1000);
        arena.grow(0x80, 0x1100).unwrap();
        assert_eq!(arena.grow(-0x30, 0x1100), Ok(0x1080));
        assert_eq!(arena.brk(), 0x1050);
        assert!(arena.grow(-0x60, 0x1100).is_err());
        assert_eq!(arena.brk(), 0x1050);
    }

    #[test]
    fn overflowing_request_is_refused() {
        let mut arena = Arena::new(usize::MAX - 0x10);
        assert!(arena.grow(0x20, usize::MAX).is_err());
        assert_eq!(arena.brk(), usize::MAX - 0x10);
    }

    #[test]
    fn process_arena_attaches_once_and_grows_against_the_live_stack() {
        // Bookkeeping only; nothing dereferences these addresses.
        attach(0x4000_0000);
        attach(0x5000_0000);
        let first = grow(0x40).unwrap();
        assert!((0x4000_0000..0x5000_0000).contains(&first));
        let second = grow(0x40).unwrap();
        assert_eq!(second, first + 0x40);
    }
}
