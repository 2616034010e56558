pub mod heap;

pub use heap::Heap;

use crate::config::Config;
use crate::error::AllocError;
use crate::integrity::IntegrityResult;
use crate::profile::{Profiler, UsageReport};
use crate::region::Region;
use crate::tracker::Tracker;
use core::ptr::NonNull;

#[derive(Debug)]
enum State {
    /// Nothing mapped yet; the first allocation reserves the region.
    Unreserved,
    Ready(Heap),
    /// Reservation was attempted once and failed; it is never retried.
    Failed(AllocError),
}

/// First-fit chunk allocator over one fixed region.
///
/// Chunks are appended at the end of the occupied extent, freed chunks stay
/// in place as holes for later first-fit reuse, and only the free run at the
/// tail is ever given back. Every mutation takes `&mut self`; there is no
/// internal locking.
#[derive(Debug)]
pub struct Allocator {
    config: Config,
    state: State,
    /// Absent when profiling is off.
    profiler: Option<Profiler>,
}

impl Allocator {
    pub const fn new(config: Config) -> Self {
        Allocator {
            config,
            state: State::Unreserved,
            profiler: if config.profiling {
                Some(Profiler::new())
            } else {
                None
            },
        }
    }

    fn heap_mut<'a>(state: &'a mut State, config: &Config) -> Result<&'a mut Heap, AllocError> {
        if let State::Unreserved = state {
            *state = match Heap::reserve(config) {
                Ok(heap) => State::Ready(heap),
                Err(err) => {
                    if config.logging {
                        log::debug!("region reservation failed: {}", err);
                    }
                    State::Failed(err)
                }
            };
        }
        match state {
            State::Ready(heap) => Ok(heap),
            State::Failed(err) => Err(*err),
            State::Unreserved => unreachable!("reservation leaves the unreserved state"),
        }
    }

    fn heap(&self) -> Option<&Heap> {
        match &self.state {
            State::Ready(heap) => Some(heap),
            _ => None,
        }
    }

    /// Allocate `size` bytes.
    ///
    /// The first call reserves the region. A free hole of at least `size`
    /// bytes is reused whole; otherwise the chunk is appended after the tail.
    pub fn allocate(&mut self, size: usize) -> Result<NonNull<u8>, AllocError> {
        let heap = Self::heap_mut(&mut self.state, &self.config)?;
        let (ptr, reused) = match heap.first_fit(size) {
            Some(slot) => (heap.reuse(slot, size), true),
            None => (heap.grow(size)?, false),
        };
        if let Some(profiler) = self.profiler.as_mut() {
            profiler.on_allocate(size, reused, heap.tracker_count());
        }
        Ok(ptr)
    }

    /// Release a chunk returned by [`Allocator::allocate`].
    ///
    /// Pointers that are not the start of a live chunk are rejected and leave
    /// the allocator untouched.
    pub fn release(&mut self, ptr: NonNull<u8>) -> Result<(), AllocError> {
        let addr = ptr.as_ptr() as usize;
        let State::Ready(heap) = &mut self.state else {
            return Err(AllocError::InvalidRelease { addr });
        };
        let logging = self.config.logging;
        let slot = heap.lookup(ptr).map_err(|err| {
            if logging {
                log::debug!("rejected free: {}", err);
            }
            err
        })?;
        heap.free(slot);

        if let Some(profiler) = self.profiler.as_mut() {
            profiler.on_release();
            if let Some(report) = self.config.report {
                report(&profiler.snapshot(
                    heap.end_offset(),
                    heap.occupied(),
                    heap.high_water_mark(),
                    heap.tracker_count(),
                ));
            }
        }
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether the region has been reserved.
    pub fn is_reserved(&self) -> bool {
        self.heap().is_some()
    }

    pub fn region(&self) -> Option<&Region> {
        self.heap().map(Heap::region)
    }

    /// Tail chunk end minus region base, headers included.
    pub fn heap_usage(&self) -> usize {
        self.heap().map_or(0, Heap::end_offset)
    }

    /// Bytes held by trackers (live chunks and holes), headers excluded.
    pub fn occupied(&self) -> usize {
        self.heap().map_or(0, Heap::occupied)
    }

    /// Highest `occupied` value reached so far.
    pub fn high_water_mark(&self) -> usize {
        self.heap().map_or(0, Heap::high_water_mark)
    }

    pub fn tracker_count(&self) -> usize {
        self.heap().map_or(0, Heap::tracker_count)
    }

    /// The chunk directory in address order.
    pub fn trackers(&self) -> &[Tracker] {
        match self.heap() {
            Some(heap) => heap.trackers(),
            None => &[],
        }
    }

    /// Full reserved size of the live chunk at `ptr`.
    pub fn usable_size(&self, ptr: NonNull<u8>) -> Option<usize> {
        let heap = self.heap()?;
        let slot = heap.lookup(ptr).ok()?;
        Some(heap.trackers()[slot].size())
    }

    /// Current usage figures, or `None` when profiling is off.
    pub fn stats(&self) -> Option<UsageReport> {
        let profiler = self.profiler.as_ref()?;
        Some(profiler.snapshot(
            self.heap_usage(),
            self.occupied(),
            self.high_water_mark(),
            self.tracker_count(),
        ))
    }

    pub fn check_integrity(&self) -> IntegrityResult {
        self.heap()
            .map_or_else(IntegrityResult::default, Heap::check_integrity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PagePolicy;
    use crate::tracker::HEADER_SIZE;

    fn allocator() -> Allocator {
        Allocator::new(
            Config::new()
                .pages(PagePolicy::Normal)
                .profiling(true)
                .report(None),
        )
    }

    #[test]
    fn region_is_reserved_lazily() {
        let mut a = allocator();
        assert!(!a.is_reserved());
        assert_eq!(a.heap_usage(), 0);
        let p = a.allocate(16).unwrap();
        assert!(a.is_reserved());
        assert_eq!(
            p.as_ptr() as usize,
            a.region().unwrap().base().as_ptr() as usize + HEADER_SIZE
        );
    }

    #[test]
    fn failed_reservation_is_sticky() {
        let mut a = Allocator::new(
            Config::new()
                .region_size(1 << 46)
                .pages(PagePolicy::Huge)
                .report(None),
        );
        let first = a.allocate(8).unwrap_err();
        assert!(matches!(first, AllocError::ReservationFailed { .. }));
        assert_eq!(a.allocate(8).unwrap_err(), first);
        assert!(!a.is_reserved());
    }

    #[test]
    fn release_before_reservation_is_invalid() {
        let mut a = allocator();
        let mut local = 0u8;
        let err = a.release(NonNull::from(&mut local)).unwrap_err();
        assert!(matches!(err, AllocError::InvalidRelease { .. }));
    }

    #[test]
    fn profiling_off_has_no_stats() {
        let mut a = Allocator::new(Config::new().pages(PagePolicy::Normal).profiling(false));
        let p = a.allocate(64).unwrap();
        a.release(p).unwrap();
        assert!(a.stats().is_none());
        assert_eq!(a.high_water_mark(), 64);
    }

    #[test]
    fn usable_size_reports_whole_hole() {
        let mut a = allocator();
        let big = a.allocate(1024).unwrap();
        let _tail = a.allocate(8).unwrap();
        a.release(big).unwrap();
        let again = a.allocate(100).unwrap();
        assert_eq!(again, big);
        assert_eq!(a.usable_size(again), Some(1024));
        assert_eq!(a.trackers()[0].requested(), 100);
    }

    #[test]
    fn stats_track_requests_and_reuse() {
        let mut a = allocator();
        let p1 = a.allocate(300).unwrap();
        let p2 = a.allocate(200).unwrap();
        a.release(p1).unwrap();
        let p3 = a.allocate(250).unwrap();
        assert_eq!(p3, p1);

        let stats = a.stats().unwrap();
        assert_eq!(stats.largest_request, 300);
        assert_eq!(stats.reuse_count, 1);
        assert_eq!(stats.live_chunks, 2);
        assert_eq!(stats.trackers, 2);
        assert_eq!(stats.peak_usage, 500);

        a.release(p2).unwrap();
        a.release(p3).unwrap();
        let stats = a.stats().unwrap();
        assert_eq!(stats.live_chunks, 0);
        assert_eq!(stats.trackers, 0);
        assert_eq!(stats.heap_usage, 0);
        assert_eq!(stats.peak_trackers, 2);
    }
}
