use crate::config::Config;
use crate::error::AllocError;
use crate::integrity::{verify_checksum, IntegrityResult};
use crate::region::Region;
use crate::tracker::{ChunkHeader, Tracker, TrackerTable, HEADER_SIZE};
use core::ptr::NonNull;

/// A reserved region together with the trackers carved out of it.
#[derive(Debug)]
pub struct Heap {
    region: Region,
    trackers: TrackerTable,
    /// Sum of tracker sizes, headers excluded.
    occupied: usize,
    high_water: usize,
    logging: bool,
}

impl Heap {
    pub fn reserve(config: &Config) -> Result<Heap, AllocError> {
        let region = Region::reserve(config.region_size, config.pages, config.logging)?;
        let trackers = TrackerTable::for_region(region.size())?;
        Ok(Heap {
            region,
            trackers,
            occupied: 0,
            high_water: 0,
            logging: config.logging,
        })
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn trackers(&self) -> &[Tracker] {
        self.trackers.as_slice()
    }

    pub fn tracker_count(&self) -> usize {
        self.trackers.len()
    }

    /// Offset just past the tail chunk; 0 when no tracker exists.
    pub fn end_offset(&self) -> usize {
        self.trackers.last().map_or(0, Tracker::end)
    }

    pub fn occupied(&self) -> usize {
        self.occupied
    }

    pub fn high_water_mark(&self) -> usize {
        self.high_water
    }

    /// Slot of the first free tracker, in address order, that fits `size`.
    pub fn first_fit(&self, size: usize) -> Option<usize> {
        self.trackers
            .as_slice()
            .iter()
            .position(|t| t.is_free() && t.size() >= size)
    }

    /// Hand the whole hole at `slot` out again.
    pub fn reuse(&mut self, slot: usize, requested: usize) -> NonNull<u8> {
        let tracker = &mut self.trackers.as_mut_slice()[slot];
        tracker.claim(requested);
        if self.logging {
            log::trace!(
                "reusing chunk {} ({} bytes) for a {} byte request",
                slot,
                tracker.size(),
                requested
            );
        }
        let chunk_offset = tracker.chunk_offset();
        self.region.at(chunk_offset)
    }

    /// Append a new tracker of `size` bytes after the tail.
    ///
    /// Fails without touching the table or the region when header and chunk
    /// would reach the region end.
    pub fn grow(&mut self, size: usize) -> Result<NonNull<u8>, AllocError> {
        let offset = self.end_offset();
        let exhausted = AllocError::RegionExhausted {
            requested: size,
            available: self.region.size().saturating_sub(offset + HEADER_SIZE + 1),
        };
        match size.checked_add(offset + HEADER_SIZE) {
            Some(end) if end < self.region.size() => {}
            _ => return Err(exhausted),
        }

        let tracker = Tracker::new(offset, size);
        let slot = self.trackers.push(tracker).ok_or(exhausted)?;
        unsafe { ChunkHeader::new(slot, &tracker).write(self.region.at(offset).as_ptr()) };

        self.occupied += size;
        self.high_water = self.high_water.max(self.occupied);
        if self.logging {
            log::trace!(
                "placed chunk {} at offset {} ({} bytes)",
                slot,
                tracker.chunk_offset(),
                size
            );
        }
        Ok(self.region.at(tracker.chunk_offset()))
    }

    /// Slot of the live chunk starting at `ptr`.
    pub fn lookup(&self, ptr: NonNull<u8>) -> Result<usize, AllocError> {
        let addr = ptr.as_ptr() as usize;
        let slot = self
            .region
            .offset_of(addr)
            .and_then(|offset| self.trackers.find(offset))
            .ok_or(AllocError::InvalidRelease { addr })?;
        if self.trackers.as_slice()[slot].is_free() {
            return Err(AllocError::DoubleFree { addr });
        }
        Ok(slot)
    }

    /// Mark the chunk at `slot` free and trim the free run at the tail.
    /// Returns how many trackers were removed.
    pub fn free(&mut self, slot: usize) -> usize {
        self.trackers.as_mut_slice()[slot].mark_free();
        if slot + 1 != self.trackers.len() {
            return 0;
        }

        let mut trimmed = 0;
        while self.trackers.last().map_or(false, |t| t.is_free()) {
            if let Some(tracker) = self.trackers.pop() {
                self.occupied -= tracker.size();
                trimmed += 1;
            }
        }
        if self.logging {
            log::trace!("trimmed {} trailing chunks, heap end now {}", trimmed, self.end_offset());
        }
        trimmed
    }

    pub fn check_integrity(&self) -> IntegrityResult {
        let mut result = IntegrityResult::default();
        let mut expected = 0;

        for (slot, tracker) in self.trackers.as_slice().iter().enumerate() {
            result.trackers_checked += 1;
            if tracker.offset() != expected {
                result.contiguity_error();
            }
            expected = tracker.end();

            if tracker.end() >= self.region.size() {
                result.bound_error();
                continue;
            }
            let header = unsafe { ChunkHeader::read(self.region.at(tracker.offset()).as_ptr()) };
            let matches = header.slot == slot as u64
                && header.size == tracker.size() as u64
                && header.offset == tracker.offset() as u64
                && verify_checksum(tracker.offset(), tracker.size(), slot, header.checksum);
            if !matches {
                result.header_mismatch();
            }
        }

        if self.trackers.last().map_or(false, |t| t.is_free()) {
            result.untrimmed_tail();
        }
        result
    }
}
