//! Error types for the runtime bridge.
//!
//! Exactly two failure classes exist at this layer: soft failures the
//! standard library sees as errno values, and the fatal heap/stack
//! collision, which never surfaces as a value at the C ABI (the `_sbrk`
//! shim in the `newlib` module halts instead).

use core::fmt;

/// Result type for the descriptor I/O shim operations.
pub type IoResult<T> = Result<T, Errno>;

/// Errno values the bridge reports, with newlib's numeric assignments.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Errno {
    /// `EBADF` -- descriptor outside the supported set.
    BadFileNumber = 9,
    /// `ENOMEM` -- arena growth refused.
    OutOfMemory = 12,
    /// `EINVAL` -- argument outside the supported domain.
    InvalidArgument = 22,
    /// `ENOSYS` -- operation not backed by any transport.
    NotSupported = 88,
}

impl Errno {
    /// The raw value stored into the shim's errno cell.
    pub fn as_raw(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Errno::BadFileNumber => "bad file number (EBADF)",
            Errno::OutOfMemory => "out of memory (ENOMEM)",
            Errno::InvalidArgument => "invalid argument (EINVAL)",
            Errno::NotSupported => "operation not supported (ENOSYS)",
        };
        write!(f, "{}", text)
    }
}

/// Why an arena growth request was not carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaError {
    /// The proposed break would meet or pass the live stack pointer, or
    /// fall below the arena origin.
    Collision {
        brk: usize,
        requested: isize,
        limit: usize,
    },
    /// The process-wide arena has not been attached to its origin yet.
    Unattached,
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArenaError::Collision {
                brk,
                requested,
                limit,
            } => write!(
                f,
                "break {:#x} moved by {} would cross limit {:#x}",
                brk, requested, limit
            ),
            ArenaError::Unattached => write!(f, "arena not attached to an origin"),
        }
    }
}

impl From<ArenaError> for Errno {
    fn from(_err: ArenaError) -> Self {
        Errno::OutOfMemory
    }
}

#[cfg(all(test, not(target_os = "none")))]
mod tests {
    use super::*;

    #[test]
    fn errno_values_match_newlib() {
        assert_eq!(Errno::BadFileNumber.as_raw(), 9);
        assert_eq!(Errno::OutOfMemory.as_raw(), 12);
        assert_eq!(Errno::InvalidArgument.as_raw(), 22);
        assert_eq!(Errno::NotSupported.as_raw(), 88);
    }

    #[test]
    fn arena_errors_map_to_enomem() {
        let refusal = ArenaError::Collision {
            brk: 0x1050,
            requested: 0xB0,
            limit: 0x1100,
        };
        assert_eq!(Errno::from(refusal), Errno::OutOfMemory);
        assert_eq!(Errno::from(ArenaError::Unattached), Errno::OutOfMemory);
    }
}
