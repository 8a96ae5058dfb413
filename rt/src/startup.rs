//! Startup and shutdown sequencing.
//!
//! The toolchain entry point hands control here before the application
//! `main`: every constructor the linker collected runs exactly once, in
//! table order, before any task exists. The shutdown half is defined
//! for completeness; nothing on this class of target ever tears the
//! process down, so in practice it never runs.
//!
//! The tables are injected by the caller rather than read from linker
//! symbols here, which keeps the sequencer independent of any symbol
//! mechanism. On the target, [`crate::newlib`] builds them from the
//! `__preinit_array`/`__init_array`/`__fini_array` bounds.

/// A linker-collected constructor or destructor entry: no arguments, no
/// return value, C calling convention.
pub type CtorFn = unsafe extern "C" fn();

/// The two startup tables, pre-initialization first.
#[derive(Clone, Copy)]
pub struct StartupTables<'a> {
    pub preinit: &'a [CtorFn],
    pub init: &'a [CtorFn],
}

/// Run every pre-initialization entry in ascending order, then every
/// initialization entry in ascending order, then the hook.
///
/// Either table may be empty. Entries have no way to report failure; a
/// misbehaving entry faults through whatever mechanism the hardware
/// provides, not through this layer.
///
/// # Safety
///
/// Every entry (and the hook) must be a valid no-argument function,
/// safe to call at this point in the boot sequence, and the caller must
/// invoke this exactly once per process.
pub unsafe fn run_startup(tables: &StartupTables<'_>, post_hook: Option<CtorFn>) {
    log::debug!(
        "running {} pre-init and {} init entries",
        tables.preinit.len(),
        tables.init.len()
    );
    for ctor in tables.preinit {
        // SAFETY: upheld by the caller per this function's contract.
        unsafe { ctor() };
    }
    for ctor in tables.init {
        // SAFETY: upheld by the caller per this function's contract.
        unsafe { ctor() };
    }
    if let Some(hook) = post_hook {
        // SAFETY: upheld by the caller per this function's contract.
        unsafe { hook() };
    }
}

/// Run every finalization entry in descending order, then the hook.
///
/// # Safety
///
/// Same contract as [`run_startup`]: valid entries, called at most once
/// per process.
pub unsafe fn run_shutdown(fini: &[CtorFn], final_hook: Option<CtorFn>) {
    log::debug!("running {} finalization entries", fini.len());
    for dtor in fini.iter().rev() {
        // SAFETY: upheld by the caller per this function's contract.
        unsafe { dtor() };
    }
    if let Some(hook) = final_hook {
        // SAFETY: upheld by the caller per this function's contract.
        unsafe { hook() };
    }
}
