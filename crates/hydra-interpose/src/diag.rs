//! Constructor-safe diagnostics.
//!
//! Shim initialization runs before the host process is fully set up,
//! so diagnostics format into a stack buffer and go straight to fd 2
//! with `libc::write`. Output that overflows the buffer is truncated
//! rather than failed: observability must never break initialization.

use std::fmt;

use libc::c_void;

pub(crate) const DIAG_BUF_SIZE: usize = 256;

/// Fixed-buffer formatter. Writes past the end are dropped.
pub struct StackWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> StackWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.pos]
    }
}

impl fmt::Write for StackWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let bytes = s.as_bytes();
        let remaining = self.buf.len() - self.pos;
        let to_copy = bytes.len().min(remaining);
        self.buf[self.pos..self.pos + to_copy].copy_from_slice(&bytes[..to_copy]);
        self.pos += to_copy;
        Ok(())
    }
}

/// Emit one line on the diagnostic stream.
pub fn write_line(args: fmt::Arguments) {
    use fmt::Write;
    let mut buf = [0u8; DIAG_BUF_SIZE];
    let mut w = StackWriter::new(&mut buf);
    let _ = w.write_fmt(args);
    let _ = w.write_str("\n");
    let msg = w.as_bytes();
    unsafe {
        libc::write(2, msg.as_ptr() as *const c_void, msg.len());
    }
}

/// Report an unrecoverable initialization failure and terminate.
///
/// A missing symbol cannot become available later in the same process,
/// so there is no retry path. Exit status 1 matches `EXIT_FAILURE`.
pub fn fail(args: fmt::Arguments) -> ! {
    write_line(args);
    unsafe { libc::exit(1) }
}

#[macro_export]
macro_rules! diag {
    ($($arg:tt)*) => {
        $crate::diag::write_line(core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! fatal {
    ($($arg:tt)*) => {
        $crate::diag::fail(core::format_args!($($arg)*))
    };
}
