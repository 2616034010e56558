//! Usage profiler: passive counters over allocate/release events.
//!
//! An allocator built with profiling off has no [`Profiler`] at all, so none
//! of this state exists and releases report nothing.

use core::fmt;

/// Receives a usage snapshot after every release.
pub type ReportHook = fn(&UsageReport);

/// Point-in-time usage figures of one allocator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageReport {
    /// Tail chunk end minus region base, headers included.
    pub heap_usage: usize,
    /// Sum of the reserved sizes of all trackers, headers excluded.
    pub occupied: usize,
    /// Highest `occupied` ever observed.
    pub peak_usage: usize,
    /// Largest single allocation request.
    pub largest_request: usize,
    /// Chunks currently handed out.
    pub live_chunks: usize,
    /// Trackers in the directory: live chunks plus retained holes.
    pub trackers: usize,
    pub peak_trackers: usize,
    /// Allocations served from a free hole instead of growing the tail.
    pub reuse_count: usize,
}

impl fmt::Display for UsageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Heap Usage        : {} Bytes", self.heap_usage)?;
        writeln!(f, "Occupied          : {} Bytes", self.occupied)?;
        writeln!(f, "Peak Heap Usage   : {} Bytes", self.peak_usage)?;
        writeln!(f, "Largest Request   : {} Bytes", self.largest_request)?;
        writeln!(f, "Live Chunks       : {}", self.live_chunks)?;
        writeln!(f, "Trackers          : {}", self.trackers)?;
        writeln!(f, "Peak Trackers     : {}", self.peak_trackers)?;
        write!(f, "Reused Trackers   : {}", self.reuse_count)
    }
}

/// Default report hook: one `info!` record per release.
pub fn log_report(report: &UsageReport) {
    log::info!(target: "hugealloc::profile", "usage after release\n{}", report);
}

/// Counters that cannot be recomputed from the tracker table.
#[derive(Debug, Default)]
pub struct Profiler {
    largest_request: usize,
    live_chunks: usize,
    peak_trackers: usize,
    reuse_count: usize,
}

impl Profiler {
    pub const fn new() -> Self {
        Profiler {
            largest_request: 0,
            live_chunks: 0,
            peak_trackers: 0,
            reuse_count: 0,
        }
    }

    /// Record a successful allocation. `trackers` is the directory length
    /// after placement.
    pub fn on_allocate(&mut self, requested: usize, reused: bool, trackers: usize) {
        self.largest_request = self.largest_request.max(requested);
        self.live_chunks += 1;
        self.peak_trackers = self.peak_trackers.max(trackers);
        if reused {
            self.reuse_count += 1;
        }
    }

    /// Record a successful release.
    pub fn on_release(&mut self) {
        debug_assert!(self.live_chunks > 0, "release without a live chunk");
        self.live_chunks = self.live_chunks.saturating_sub(1);
    }

    /// Combine the counters with the figures owned by the heap.
    pub fn snapshot(
        &self,
        heap_usage: usize,
        occupied: usize,
        peak_usage: usize,
        trackers: usize,
    ) -> UsageReport {
        UsageReport {
            heap_usage,
            occupied,
            peak_usage,
            largest_request: self.largest_request,
            live_chunks: self.live_chunks,
            trackers,
            peak_trackers: self.peak_trackers,
            reuse_count: self.reuse_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_follow_events() {
        let mut profiler = Profiler::new();
        profiler.on_allocate(1024, false, 1);
        profiler.on_allocate(512, false, 2);
        profiler.on_release();
        profiler.on_allocate(256, true, 2);

        let report = profiler.snapshot(1600, 1536, 1536, 2);
        assert_eq!(report.largest_request, 1024);
        assert_eq!(report.live_chunks, 2);
        assert_eq!(report.peak_trackers, 2);
        assert_eq!(report.reuse_count, 1);
        assert_eq!(report.heap_usage, 1600);
    }

    #[test]
    fn report_renders_every_line() {
        let report = UsageReport {
            heap_usage: 0,
            peak_usage: 1024,
            largest_request: 1024,
            peak_trackers: 1,
            ..UsageReport::default()
        };
        let text = report.to_string();
        assert!(text.starts_with("Heap Usage        : 0 Bytes\n"));
        assert!(text.contains("Peak Heap Usage   : 1024 Bytes"));
        assert!(text.contains("Largest Request   : 1024 Bytes"));
        assert!(text.ends_with("Reused Trackers   : 0"));
        assert_eq!(text.lines().count(), 8);
    }
}
