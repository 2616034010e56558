//! Chunk directory.
//!
//! Every chunk is preceded in the region by [`HEADER_SIZE`] header bytes, and
//! described by a [`Tracker`] in an out-of-band table. Trackers are created
//! only at the end of the occupied extent and destroyed only from the tail, so
//! the table is a stack whose order is also address order:
//!
//! ```text
//!  region base
//!  |
//!  v
//!  +--------+---------+--------+-------------+--------+-------+
//!  | header | chunk 0 | header |   chunk 1   | header | chk 2 |  ... free space
//!  +--------+---------+--------+-------------+--------+-------+
//!      ^                   ^                     ^
//!      |                   |                     |
//!  table[0]            table[1]              table[2]  <- tail
//! ```
//!
//! Looking a chunk up is a binary search over the table, so a pointer that is
//! not a chunk start is rejected without ever reading region memory.

use crate::error::AllocError;
use crate::integrity::compute_checksum;
use crate::platform;
use crate::util::{align_up, page_size};
use core::mem::size_of;
use core::ptr::{self, NonNull};
use core::slice;

/// In-band record stamped into the header bytes before every chunk.
///
/// The table is authoritative; the stamp only lets an integrity scan notice
/// that a neighbouring chunk was written past its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct ChunkHeader {
    pub slot: u64,
    pub size: u64,
    pub offset: u64,
    pub checksum: u64,
}

/// Bytes reserved in front of every chunk.
pub const HEADER_SIZE: usize = size_of::<ChunkHeader>();

impl ChunkHeader {
    pub fn new(slot: usize, tracker: &Tracker) -> Self {
        ChunkHeader {
            slot: slot as u64,
            size: tracker.size as u64,
            offset: tracker.offset as u64,
            checksum: compute_checksum(tracker.offset, tracker.size, slot),
        }
    }

    /// Headers start wherever the previous chunk ended, so they may be unaligned.
    ///
    /// # Safety
    /// `at` must be valid for `HEADER_SIZE` bytes of writes.
    pub unsafe fn write(&self, at: *mut u8) {
        ptr::write_unaligned(at as *mut ChunkHeader, *self);
    }

    /// # Safety
    /// `at` must be valid for `HEADER_SIZE` bytes of reads.
    pub unsafe fn read(at: *const u8) -> Self {
        ptr::read_unaligned(at as *const ChunkHeader)
    }
}

/// Descriptor of one chunk. Offsets are relative to the region base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct Tracker {
    offset: usize,
    size: usize,
    requested: usize,
    free: bool,
}

impl Tracker {
    pub fn new(offset: usize, size: usize) -> Self {
        Tracker {
            offset,
            size,
            requested: size,
            free: false,
        }
    }

    /// Offset of the header.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Offset of the usable bytes.
    #[inline]
    pub fn chunk_offset(&self) -> usize {
        self.offset + HEADER_SIZE
    }

    /// Offset one past the last usable byte; where the next tracker goes.
    #[inline]
    pub fn end(&self) -> usize {
        self.chunk_offset() + self.size
    }

    /// Reserved size, fixed at creation.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Size asked for by the allocation currently (or last) holding the chunk.
    #[inline]
    pub fn requested(&self) -> usize {
        self.requested
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.free
    }

    pub fn claim(&mut self, requested: usize) {
        debug_assert!(self.free && requested <= self.size);
        self.free = false;
        self.requested = requested;
    }

    pub fn mark_free(&mut self) {
        self.free = true;
    }
}

/// Address-ordered stack of trackers in its own anonymous mapping.
#[derive(Debug)]
pub struct TrackerTable {
    entries: NonNull<Tracker>,
    len: usize,
    capacity: usize,
    mapped_size: usize,
}

unsafe impl Send for TrackerTable {}

impl TrackerTable {
    /// Room for every tracker a region of `region_size` bytes can hold: each
    /// one consumes at least its header.
    pub fn for_region(region_size: usize) -> Result<Self, AllocError> {
        Self::with_capacity(region_size / HEADER_SIZE + 1)
    }

    pub fn with_capacity(capacity: usize) -> Result<Self, AllocError> {
        let size = align_up(capacity.max(1) * size_of::<Tracker>(), page_size());
        let mem = unsafe { platform::map_anonymous(size) };
        let entries = NonNull::new(mem as *mut Tracker).ok_or_else(|| {
            AllocError::ReservationFailed {
                size,
                errno: platform::last_errno(),
            }
        })?;
        Ok(TrackerTable {
            entries,
            len: 0,
            capacity,
            mapped_size: size,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn as_slice(&self) -> &[Tracker] {
        unsafe { slice::from_raw_parts(self.entries.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [Tracker] {
        unsafe { slice::from_raw_parts_mut(self.entries.as_ptr(), self.len) }
    }

    #[inline]
    pub fn last(&self) -> Option<&Tracker> {
        self.as_slice().last()
    }

    /// Append a tracker; returns its slot, or `None` when the table is full.
    pub fn push(&mut self, tracker: Tracker) -> Option<usize> {
        if self.len == self.capacity {
            return None;
        }
        debug_assert!(self.last().map_or(true, |t| t.end() == tracker.offset));
        unsafe { self.entries.as_ptr().add(self.len).write(tracker) };
        self.len += 1;
        Some(self.len - 1)
    }

    pub fn pop(&mut self) -> Option<Tracker> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(unsafe { self.entries.as_ptr().add(self.len).read() })
    }

    /// Slot of the tracker whose chunk starts at `chunk_offset`.
    pub fn find(&self, chunk_offset: usize) -> Option<usize> {
        self.as_slice()
            .binary_search_by_key(&chunk_offset, Tracker::chunk_offset)
            .ok()
    }
}

impl Drop for TrackerTable {
    fn drop(&mut self) {
        unsafe { platform::unmap(self.entries.as_ptr() as *mut u8, self.mapped_size) };
    }
}
