//! Buffered diagnostics for the runtime bridge.
//!
//! The bridge runs before any console or scheduler exists, so messages
//! are held in a fixed-size, heap-free ring and drained later by
//! whatever the firmware brings up (a logging task, a debugger reading
//! RAM). The ring backs the standard `log` facade: after [`init`],
//! every `log::warn!` in the process lands here.
//!
//! Once full, the ring wraps around and silently overwrites the oldest
//! entries.

use core::fmt::{self, Write as _};

use log::{LevelFilter, Log, Metadata, Record};
use spin::Mutex;

/// Entries the ring holds before it starts overwriting the oldest.
pub const DIAG_CAPACITY: usize = 32;

/// Bytes kept per message; longer messages are truncated.
pub const DIAG_MESSAGE_MAX_LEN: usize = 96;

/// One buffered diagnostic record.
#[derive(Clone, Copy)]
pub struct DiagEntry {
    level: log::Level,
    len: usize,
    text: [u8; DIAG_MESSAGE_MAX_LEN],
}

impl DiagEntry {
    const EMPTY: DiagEntry = DiagEntry {
        level: log::Level::Error,
        len: 0,
        text: [0; DIAG_MESSAGE_MAX_LEN],
    };

    pub fn level(&self) -> log::Level {
        self.level
    }

    pub fn text(&self) -> &str {
        // The writer only ever cuts on a char boundary, so this cannot
        // actually fail.
        core::str::from_utf8(&self.text[..self.len]).unwrap_or("")
    }
}

/// Formats into a fixed buffer, truncating on a char boundary.
struct EntryWriter {
    text: [u8; DIAG_MESSAGE_MAX_LEN],
    len: usize,
}

impl fmt::Write for EntryWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let remaining = DIAG_MESSAGE_MAX_LEN - self.len;
        let take = if s.len() <= remaining {
            s.len()
        } else {
            let mut cut = remaining;
            while cut > 0 && !s.is_char_boundary(cut) {
                cut -= 1;
            }
            cut
        };
        self.text[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        Ok(())
    }
}

struct DiagBuffer {
    entries: [DiagEntry; DIAG_CAPACITY],
    head: usize,
    len: usize,
}

impl DiagBuffer {
    const fn new() -> Self {
        Self {
            entries: [DiagEntry::EMPTY; DIAG_CAPACITY],
            head: 0,
            len: 0,
        }
    }

    fn push(&mut self, entry: DiagEntry) {
        if self.len == DIAG_CAPACITY {
            self.entries[self.head] = entry;
            self.head = (self.head + 1) % DIAG_CAPACITY;
        } else {
            self.entries[(self.head + self.len) % DIAG_CAPACITY] = entry;
            self.len += 1;
        }
    }

    fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    fn for_each(&self, f: &mut dyn FnMut(&DiagEntry)) {
        for i in 0..self.len {
            f(&self.entries[(self.head + i) % DIAG_CAPACITY]);
        }
    }
}

static DIAG: Mutex<DiagBuffer> = Mutex::new(DiagBuffer::new());

struct DiagLogger;

static LOGGER: DiagLogger = DiagLogger;

impl Log for DiagLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut writer = EntryWriter {
            text: [0; DIAG_MESSAGE_MAX_LEN],
            len: 0,
        };
        let _ = write!(writer, "{}", record.args());
        DIAG.lock().push(DiagEntry {
            level: record.level(),
            len: writer.len,
            text: writer.text,
        });
    }

    fn flush(&self) {}
}

/// Register the ring as the `log` backend at `Info` level. Idempotent;
/// the first registration in the process wins.
pub fn init() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Info);
    }
}

/// Number of entries currently buffered.
pub fn entry_count() -> usize {
    DIAG.lock().len
}

/// Drop every buffered entry.
pub fn clear() {
    DIAG.lock().clear();
}

/// Visit the buffered entries, oldest first.
pub fn for_each_entry(mut f: impl FnMut(&DiagEntry)) {
    DIAG.lock().for_each(&mut f);
}

#[cfg(all(test, not(target_os = "none")))]
mod tests {
    use super::*;

    // The facade-driven tests below share the global ring; each holds
    // this for its whole body.
    static SERIAL: Mutex<()> = Mutex::new(());

    #[test]
    fn ring_preserves_order_and_overwrites_oldest() {
        let mut buffer = DiagBuffer::new();
        for i in 0..DIAG_CAPACITY + 4 {
            let mut writer = EntryWriter {
                text: [0; DIAG_MESSAGE_MAX_LEN],
                len: 0,
            };
            let _ = write!(writer, "entry {}", i);
            buffer.push(DiagEntry {
                level: log::Level::Info,
                len: writer.len,
                text: writer.text,
            });
        }
        assert_eq!(buffer.len, DIAG_CAPACITY);

        let mut index = 0;
        buffer.for_each(&mut |e| {
            if index == 0 {
                assert_eq!(e.text(), "entry 4");
            }
            index += 1;
        });
        assert_eq!(index, DIAG_CAPACITY);
    }

    #[test]
    fn truncation_lands_on_a_char_boundary() {
        let mut writer = EntryWriter {
            text: [0; DIAG_MESSAGE_MAX_LEN],
            len: 0,
        };
        // 95 ASCII bytes, then a two-byte char that cannot fit whole.
        for _ in 0..DIAG_MESSAGE_MAX_LEN - 1 {
            let _ = writer.write_str("x");
        }
        let _ = writer.write_str("é");
        assert_eq!(writer.len, DIAG_MESSAGE_MAX_LEN - 1);

        let e = DiagEntry {
            level: log::Level::Warn,
            len: writer.len,
            text: writer.text,
        };
        assert!(e.text().ends_with('x'));
    }

    #[test]
    fn records_arrive_through_the_log_facade() {
        let _serial = SERIAL.lock();
        init();
        clear();
        log::info!("bridge diag marker {}", 7);
        assert!(entry_count() >= 1);

        let mut found = false;
        for_each_entry(|e| {
            if e.text() == "bridge diag marker 7" {
                found = true;
                assert_eq!(e.level(), log::Level::Info);
            }
        });
        assert!(found);
    }

    #[test]
    fn debug_records_are_filtered_at_the_default_level() {
        let _serial = SERIAL.lock();
        init();
        clear();
        log::debug!("should not be buffered");
        let mut found = false;
        for_each_entry(|e| {
            if e.text() == "should not be buffered" {
                found = true;
            }
        });
        assert!(!found);
    }
}
