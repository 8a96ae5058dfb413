//! The descriptor I/O shim.
//!
//! The nine operations a C standard library expects from its lowest
//! layer, each total: no operation blocks, every call returns
//! immediately with its contract's answer. There is no descriptor
//! table and no open step -- classification is recomputed from the raw
//! integer on every call, because the shim serves character-device
//! endpoints only.
//!
//! `write`, `read`, and `close` dispatch through the installed
//! [`Transport`]; the baseline [`NullTransport`] reports everything as
//! unsupported. That is the intended extension point: an embedding
//! routes `write` to its UART by installing a transport, and the
//! remaining operations keep their stubs.

use core::ffi::c_int;

use bitflags::bitflags;
use spin::RwLock;

use crate::error::{Errno, IoResult};

/// The process identifier reported for the single logical process.
pub const BRIDGE_PID: c_int = 1;

pub const STDIN_FILENO: c_int = 0;
pub const STDOUT_FILENO: c_int = 1;
pub const STDERR_FILENO: c_int = 2;

/// Classification of a raw descriptor value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descriptor {
    Stdin,
    Stdout,
    Stderr,
    Other(c_int),
}

impl Descriptor {
    pub fn from_raw(fd: c_int) -> Self {
        match fd {
            STDIN_FILENO => Descriptor::Stdin,
            STDOUT_FILENO => Descriptor::Stdout,
            STDERR_FILENO => Descriptor::Stderr,
            other => Descriptor::Other(other),
        }
    }

    /// The standard descriptors are the only ones the shim recognizes.
    pub fn is_standard(self) -> bool {
        !matches!(self, Descriptor::Other(_))
    }
}

bitflags! {
    /// File classification bits as `stat.st_mode` encodes them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FileMode: u32 {
        const FIFO = 0o010000;
        const CHARACTER_DEVICE = 0o020000;
        const DIRECTORY = 0o040000;
        const BLOCK_DEVICE = 0o060000;
        const REGULAR = 0o100000;
    }
}

/// Byte transport behind `write`, `read`, and `close`.
///
/// The provided methods are the baseline contract: nothing is
/// supported. An embedding implements the subset it can back and
/// installs one instance with [`install_transport`]; untouched methods
/// keep reporting [`Errno::NotSupported`].
pub trait Transport: Sync {
    fn write(&self, descriptor: Descriptor, buf: &[u8]) -> IoResult<usize> {
        let _ = (descriptor, buf);
        Err(Errno::NotSupported)
    }

    fn read(&self, descriptor: Descriptor, buf: &mut [u8]) -> IoResult<usize> {
        let _ = (descriptor, buf);
        Err(Errno::NotSupported)
    }

    fn close(&self, descriptor: Descriptor) -> IoResult<()> {
        let _ = descriptor;
        Err(Errno::NotSupported)
    }
}

/// The baseline transport: every operation unsupported.
pub struct NullTransport;

impl Transport for NullTransport {}

static TRANSPORT: RwLock<&'static dyn Transport> = RwLock::new(&NullTransport);

/// Replace the process-wide transport. Usually done once, early, by the
/// embedding that owns the console peripheral.
pub fn install_transport(transport: &'static dyn Transport) {
    *TRANSPORT.write() = transport;
}

pub fn write(fd: c_int, buf: &[u8]) -> IoResult<usize> {
    TRANSPORT.read().write(Descriptor::from_raw(fd), buf)
}

pub fn read(fd: c_int, buf: &mut [u8]) -> IoResult<usize> {
    TRANSPORT.read().read(Descriptor::from_raw(fd), buf)
}

pub fn close(fd: c_int) -> IoResult<()> {
    TRANSPORT.read().close(Descriptor::from_raw(fd))
}

/// There is no seekable backing store; every seek lands at position 0.
pub fn lseek(fd: c_int, offset: c_int, whence: c_int) -> IoResult<c_int> {
    let _ = (fd, offset, whence);
    Ok(0)
}

/// Every endpoint the shim serves behaves as an unbuffered character
/// device.
pub fn fstat(fd: c_int) -> IoResult<FileMode> {
    let _ = fd;
    Ok(FileMode::CHARACTER_DEVICE)
}

/// The three standard descriptors are terminals; any other value is not
/// a valid descriptor here.
pub fn isatty(fd: c_int) -> IoResult<bool> {
    if Descriptor::from_raw(fd).is_standard() {
        Ok(true)
    } else {
        Err(Errno::BadFileNumber)
    }
}

/// No signal delivery exists on this target.
pub fn kill(pid: c_int, signal: c_int) -> IoResult<()> {
    let _ = (pid, signal);
    Err(Errno::InvalidArgument)
}

/// The single logical process.
pub fn getpid() -> c_int {
    BRIDGE_PID
}

/// Halt the process permanently. Intentional: there is nothing above
/// this process to return control to.
pub fn exit(code: c_int) -> ! {
    log::error!("exit({}) requested, parking the core", code);
    crate::arch::halt()
}
