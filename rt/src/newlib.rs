//! The C ABI the standard library links against.
//!
//! Symbol names, signatures, and return-value conventions here are
//! newlib's and must stay exactly as that library expects. Each export
//! is a thin shim over the portable modules (`mm`, `startup`,
//! `syscall`); nothing in this file carries logic of its own beyond
//! argument marshalling and the errno cell.
//!
//! The original convention marks these symbols weak so an application
//! can override individual calls at link time. Stable Rust has no weak
//! linkage; the override point is [`crate::syscall::Transport`]
//! instead, and this crate owns the symbols outright (including the
//! `_init`/`_fini` hooks, so newlib's crt hook objects must not also be
//! linked).

use core::ffi::{c_char, c_int, c_void};
use core::sync::atomic::{AtomicI32, Ordering};

use crate::error::Errno;
use crate::startup::{CtorFn, StartupTables};
use crate::{arch, diag, mm, startup, syscall};

/// Linker-provided section symbols, isolated here so no other module
/// declares raw externs.
mod sections {
    use core::ptr;

    use crate::startup::CtorFn;

    extern "C" {
        static _ebss: u8;
        static __preinit_array_start: CtorFn;
        static __preinit_array_end: CtorFn;
        static __init_array_start: CtorFn;
        static __init_array_end: CtorFn;
        static __fini_array_start: CtorFn;
        static __fini_array_end: CtorFn;
    }

    /// Turn a pair of bound symbols into the table they delimit.
    ///
    /// # Safety
    ///
    /// `[start, end)` must delimit a linker-emitted array of function
    /// pointers.
    unsafe fn table(start: *const CtorFn, end: *const CtorFn) -> &'static [CtorFn] {
        let len = (end as usize - start as usize) / core::mem::size_of::<CtorFn>();
        // SAFETY: per this function's contract the range is a live array
        // of `len` function pointers.
        unsafe { core::slice::from_raw_parts(start, len) }
    }

    /// First address past zero-initialized data; the arena's origin.
    pub(super) fn static_data_end() -> usize {
        // SAFETY: the symbol is emitted by the link script; only its
        // address is taken, the location itself is never read.
        unsafe { ptr::addr_of!(_ebss) as usize }
    }

    pub(super) fn preinit_table() -> &'static [CtorFn] {
        // SAFETY: the linker guarantees these two symbols bound the
        // pre-initialization function-pointer array.
        unsafe {
            table(
                ptr::addr_of!(__preinit_array_start),
                ptr::addr_of!(__preinit_array_end),
            )
        }
    }

    pub(super) fn init_table() -> &'static [CtorFn] {
        // SAFETY: the linker guarantees these two symbols bound the
        // initialization function-pointer array.
        unsafe {
            table(
                ptr::addr_of!(__init_array_start),
                ptr::addr_of!(__init_array_end),
            )
        }
    }

    pub(super) fn fini_table() -> &'static [CtorFn] {
        // SAFETY: the linker guarantees these two symbols bound the
        // finalization function-pointer array.
        unsafe {
            table(
                ptr::addr_of!(__fini_array_start),
                ptr::addr_of!(__fini_array_end),
            )
        }
    }
}

static LAST_ERROR: AtomicI32 = AtomicI32::new(0);

/// The most recent shim failure, newlib-numbered. The bridge cannot
/// reach newlib's reentrant `errno` portably, so it keeps its own cell.
pub fn last_error() -> i32 {
    LAST_ERROR.load(Ordering::Relaxed)
}

fn set_errno(err: Errno) {
    LAST_ERROR.store(err.as_raw(), Ordering::Relaxed);
}

/// `struct stat` as newlib lays it out for this target. Only `st_mode`
/// carries information here; the other fields exist so the layout
/// matches.
#[repr(C)]
pub struct Stat {
    pub st_dev: i16,
    pub st_ino: u16,
    pub st_mode: u32,
    pub st_nlink: u16,
    pub st_uid: u16,
    pub st_gid: u16,
    pub st_rdev: i16,
    pub st_size: i32,
    pub st_atime: i32,
    pub st_spare1: i32,
    pub st_mtime: i32,
    pub st_spare2: i32,
    pub st_ctime: i32,
    pub st_spare3: i32,
    pub st_blksize: i32,
    pub st_blocks: i32,
    pub st_spare4: [i32; 2],
}

/// Increase program data space; `malloc` and friends depend on this.
/// Returns the previous arena end. Refusal is a heap/stack collision
/// and fatal: there is no safe continuation once the regions have met.
#[no_mangle]
pub extern "C" fn _sbrk(incr: isize) -> *mut c_void {
    mm::arena::attach(sections::static_data_end());
    match mm::arena::grow(incr) {
        Ok(previous) => previous as *mut c_void,
        Err(refusal) => {
            set_errno(Errno::OutOfMemory);
            log::error!("heap growth refused: {}", refusal);
            arch::halt()
        }
    }
}

/// Run the pre-initialization and initialization tables, then `_init`.
/// Called by the toolchain entry point before `main`.
#[no_mangle]
pub extern "C" fn __libc_init_array() {
    diag::init();
    let tables = StartupTables {
        preinit: sections::preinit_table(),
        init: sections::init_table(),
    };
    // SAFETY: the tables come from the linker's constructor sections and
    // the entry point runs this exactly once before main.
    unsafe { startup::run_startup(&tables, Some(_init as CtorFn)) };
}

/// Run the finalization table in reverse, then `_fini`.
#[no_mangle]
pub extern "C" fn __libc_fini_array() {
    // SAFETY: the table comes from the linker's destructor section and
    // teardown happens at most once.
    unsafe { startup::run_shutdown(sections::fini_table(), Some(_fini as CtorFn)) };
}

/// Post-constructor hook. Nothing to do in the baseline bridge.
#[no_mangle]
pub extern "C" fn _init() {}

/// Pre-teardown hook counterpart of [`_init`].
#[no_mangle]
pub extern "C" fn _fini() {}

/// Write to a file. Reports the transport's answer; the baseline
/// transport supports nothing, so newlib sees an ordinary I/O error.
#[no_mangle]
pub extern "C" fn _write(file: c_int, ptr: *const c_char, len: c_int) -> c_int {
    if ptr.is_null() || len < 0 {
        set_errno(Errno::InvalidArgument);
        return -1;
    }
    // SAFETY: newlib hands a live buffer of `len` bytes at `ptr`; both
    // were checked above.
    let buf = unsafe { core::slice::from_raw_parts(ptr.cast::<u8>(), len as usize) };
    match syscall::write(file, buf) {
        Ok(count) => count as c_int,
        Err(err) => {
            set_errno(err);
            -1
        }
    }
}

/// Read from a file. Never blocks.
#[no_mangle]
pub extern "C" fn _read(file: c_int, ptr: *mut c_char, len: c_int) -> c_int {
    if ptr.is_null() || len < 0 {
        set_errno(Errno::InvalidArgument);
        return -1;
    }
    // SAFETY: newlib hands a live buffer of `len` bytes at `ptr`; both
    // were checked above.
    let buf = unsafe { core::slice::from_raw_parts_mut(ptr.cast::<u8>(), len as usize) };
    match syscall::read(file, buf) {
        Ok(count) => count as c_int,
        Err(err) => {
            set_errno(err);
            -1
        }
    }
}

/// Close a file.
#[no_mangle]
pub extern "C" fn _close(file: c_int) -> c_int {
    match syscall::close(file) {
        Ok(()) => 0,
        Err(err) => {
            set_errno(err);
            -1
        }
    }
}

/// Set position in a file.
#[no_mangle]
pub extern "C" fn _lseek(file: c_int, offset: c_int, whence: c_int) -> c_int {
    match syscall::lseek(file, offset, whence) {
        Ok(position) => position,
        Err(err) => {
            set_errno(err);
            -1
        }
    }
}

/// Status of an open file: everything is a character-special device.
#[no_mangle]
pub extern "C" fn _fstat(file: c_int, st: *mut Stat) -> c_int {
    if st.is_null() {
        set_errno(Errno::InvalidArgument);
        return -1;
    }
    match syscall::fstat(file) {
        Ok(mode) => {
            // SAFETY: newlib hands a live `struct stat`; null was rejected
            // above.
            unsafe {
                core::ptr::write_bytes(st, 0, 1);
                (*st).st_mode = mode.bits();
            }
            0
        }
        Err(err) => {
            set_errno(err);
            -1
        }
    }
}

/// Query whether the stream is a terminal.
#[no_mangle]
pub extern "C" fn _isatty(file: c_int) -> c_int {
    match syscall::isatty(file) {
        Ok(true) => 1,
        Ok(false) => 0,
        Err(err) => {
            set_errno(err);
            0
        }
    }
}

/// Send a signal. No signal delivery is supported.
#[no_mangle]
pub extern "C" fn _kill(pid: c_int, sig: c_int) -> c_int {
    match syscall::kill(pid, sig) {
        Ok(()) => 0,
        Err(err) => {
            set_errno(err);
            -1
        }
    }
}

/// Process id of the single logical process.
#[no_mangle]
pub extern "C" fn _getpid() -> c_int {
    syscall::getpid()
}

/// Terminate the calling process. Never returns.
#[no_mangle]
pub extern "C" fn _exit(code: c_int) -> ! {
    syscall::exit(code)
}
