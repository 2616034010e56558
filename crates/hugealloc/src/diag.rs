//! Allocation-free stderr output for the C entry points.
//!
//! When this crate is the process `malloc`, anything that allocates while
//! reporting would re-enter the allocator, so messages are formatted into a
//! stack buffer and written straight to fd 2.

use crate::error::AllocError;
use crate::profile::UsageReport;
use core::fmt::{self, Write};

const BUF_SIZE: usize = 512;

/// `fmt::Write` sink over a fixed stack buffer, flushed to stderr.
pub struct StderrWriter {
    buf: [u8; BUF_SIZE],
    len: usize,
}

impl StderrWriter {
    pub const fn new() -> Self {
        StderrWriter {
            buf: [0; BUF_SIZE],
            len: 0,
        }
    }

    pub fn flush(&mut self) {
        let mut written = 0;
        while written < self.len {
            let ret = unsafe {
                libc::write(
                    2,
                    self.buf[written..].as_ptr() as *const libc::c_void,
                    self.len - written,
                )
            };
            if ret <= 0 {
                break;
            }
            written += ret as usize;
        }
        self.len = 0;
    }
}

impl Write for StderrWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for chunk in s.as_bytes().chunks(BUF_SIZE) {
            if self.len + chunk.len() > BUF_SIZE {
                self.flush();
            }
            self.buf[self.len..self.len + chunk.len()].copy_from_slice(chunk);
            self.len += chunk.len();
        }
        Ok(())
    }
}

impl Drop for StderrWriter {
    fn drop(&mut self) {
        self.flush();
    }
}

/// Report hook of the process-wide allocator.
pub fn write_report(report: &UsageReport) {
    let mut out = StderrWriter::new();
    let _ = writeln!(out, "{}", report);
}

/// Abort on an allocator error: `hugealloc: <error>`.
#[cold]
#[inline(never)]
pub fn fatal(err: &AllocError) -> ! {
    let mut out = StderrWriter::new();
    let _ = writeln!(out, "hugealloc: {}", err);
    out.flush();
    unsafe { libc::abort() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_handles_messages_longer_than_its_buffer() {
        let mut out = StderrWriter::new();
        let long = "x".repeat(BUF_SIZE * 2 + 7);
        out.write_str(&long).unwrap();
        assert_eq!(out.len, 7);
        out.write_str("\n").unwrap();
        assert_eq!(out.len, 8);
    }
}
