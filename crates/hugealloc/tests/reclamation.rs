//! Placement, tail trimming and release validation.

use hugealloc::{AllocError, Allocator, Config, PagePolicy, HEADER_SIZE};
use std::ptr::NonNull;

fn allocator() -> Allocator {
    Allocator::new(
        Config::new()
            .pages(PagePolicy::Normal)
            .profiling(true)
            .report(None),
    )
}

fn offset_of(a: &Allocator, p: NonNull<u8>) -> usize {
    p.as_ptr() as usize - a.region().unwrap().base().as_ptr() as usize
}

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

#[test]
fn chunks_are_laid_out_back_to_back() {
    let mut a = allocator();
    let p1 = a.allocate(100).unwrap();
    let p2 = a.allocate(7).unwrap();
    let p3 = a.allocate(0).unwrap();
    let p4 = a.allocate(0).unwrap();

    assert_eq!(offset_of(&a, p1), HEADER_SIZE);
    assert_eq!(offset_of(&a, p2), 2 * HEADER_SIZE + 100);
    assert_eq!(offset_of(&a, p3), 3 * HEADER_SIZE + 107);
    // Zero-byte chunks still get distinct addresses.
    assert_ne!(p3, p4);
    assert_eq!(a.heap_usage(), 4 * HEADER_SIZE + 107);
}

#[test]
fn first_fit_takes_earliest_hole_not_tightest() {
    let mut a = allocator();
    let wide = a.allocate(2048).unwrap();
    let _a = a.allocate(16).unwrap();
    let narrow = a.allocate(600).unwrap();
    let _b = a.allocate(16).unwrap();

    a.release(narrow).unwrap();
    a.release(wide).unwrap();

    let p = a.allocate(500).unwrap();
    assert_eq!(p, wide);
    assert_eq!(a.usable_size(p), Some(2048));

    let q = a.allocate(500).unwrap();
    assert_eq!(q, narrow);
}

#[test]
fn hole_too_small_is_skipped() {
    let mut a = allocator();
    let small = a.allocate(64).unwrap();
    let _tail = a.allocate(16).unwrap();
    a.release(small).unwrap();

    let usage = a.heap_usage();
    let p = a.allocate(65).unwrap();
    assert_ne!(p, small);
    assert_eq!(offset_of(&a, p), usage + HEADER_SIZE);
    assert_eq!(a.tracker_count(), 3);
    assert!(a.trackers()[0].is_free());
}

#[test]
fn reused_hole_keeps_its_size() {
    let mut a = allocator();
    let p = a.allocate(4096).unwrap();
    let _tail = a.allocate(1).unwrap();
    let usage = a.heap_usage();
    let occupied = a.occupied();

    a.release(p).unwrap();
    let q = a.allocate(10).unwrap();
    assert_eq!(q, p);
    assert_eq!(a.heap_usage(), usage);
    assert_eq!(a.occupied(), occupied);
    assert_eq!(a.trackers()[0].size(), 4096);
    assert_eq!(a.trackers()[0].requested(), 10);
}

// ---------------------------------------------------------------------------
// Tail trimming
// ---------------------------------------------------------------------------

#[test]
fn tail_release_trims_whole_free_run() {
    let mut a = allocator();
    let p1 = a.allocate(100).unwrap();
    let p2 = a.allocate(200).unwrap();
    let p3 = a.allocate(300).unwrap();
    let p4 = a.allocate(400).unwrap();

    a.release(p2).unwrap();
    a.release(p3).unwrap();
    assert_eq!(a.tracker_count(), 4);

    a.release(p4).unwrap();
    assert_eq!(a.tracker_count(), 1);
    assert_eq!(a.heap_usage(), HEADER_SIZE + 100);
    assert_eq!(a.occupied(), 100);
    assert!(!a.trackers()[0].is_free());

    a.release(p1).unwrap();
    assert_eq!(a.tracker_count(), 0);
    assert_eq!(a.heap_usage(), 0);
    assert_eq!(a.high_water_mark(), 1000);
}

#[test]
fn trim_stops_at_first_live_chunk() {
    let mut a = allocator();
    let p1 = a.allocate(10).unwrap();
    let p2 = a.allocate(20).unwrap();
    let p3 = a.allocate(30).unwrap();

    a.release(p1).unwrap();
    a.release(p3).unwrap();
    // p1 stays as a hole in front of the live p2.
    assert_eq!(a.tracker_count(), 2);
    assert!(a.trackers()[0].is_free());
    assert_eq!(a.heap_usage(), 2 * HEADER_SIZE + 30);

    a.release(p2).unwrap();
    assert_eq!(a.tracker_count(), 0);
}

#[test]
fn space_after_trim_is_handed_out_again() {
    let mut a = allocator();
    let p1 = a.allocate(512).unwrap();
    a.release(p1).unwrap();
    let p2 = a.allocate(64).unwrap();
    assert_eq!(p2, p1);
    assert_eq!(a.trackers()[0].size(), 64);
    assert_eq!(a.stats().unwrap().reuse_count, 0);
}

// ---------------------------------------------------------------------------
// Release validation
// ---------------------------------------------------------------------------

#[test]
fn double_free_of_hole_is_rejected() {
    let mut a = allocator();
    let p = a.allocate(32).unwrap();
    let _tail = a.allocate(32).unwrap();
    a.release(p).unwrap();

    let usage = a.heap_usage();
    assert_eq!(
        a.release(p),
        Err(AllocError::DoubleFree { addr: p.as_ptr() as usize })
    );
    assert_eq!(a.heap_usage(), usage);
    assert_eq!(a.tracker_count(), 2);
}

#[test]
fn free_of_trimmed_chunk_is_invalid() {
    let mut a = allocator();
    let _head = a.allocate(32).unwrap();
    let p = a.allocate(32).unwrap();
    a.release(p).unwrap();

    let err = a.release(p).unwrap_err();
    assert_eq!(err, AllocError::InvalidRelease { addr: p.as_ptr() as usize });
    assert!(!err.is_fatal());
}

#[test]
fn interior_and_foreign_pointers_are_invalid() {
    let mut a = allocator();
    let p = a.allocate(128).unwrap();

    let interior = NonNull::new(p.as_ptr().wrapping_add(8)).unwrap();
    assert!(matches!(a.release(interior), Err(AllocError::InvalidRelease { .. })));

    let header = NonNull::new(p.as_ptr().wrapping_sub(HEADER_SIZE)).unwrap();
    assert!(matches!(a.release(header), Err(AllocError::InvalidRelease { .. })));

    let mut local = [0u8; 16];
    let foreign = NonNull::new(local.as_mut_ptr()).unwrap();
    assert!(matches!(a.release(foreign), Err(AllocError::InvalidRelease { .. })));

    let mut other = allocator();
    let q = other.allocate(128).unwrap();
    assert!(matches!(a.release(q), Err(AllocError::InvalidRelease { .. })));

    assert_eq!(a.tracker_count(), 1);
    a.release(p).unwrap();
    other.release(q).unwrap();
}

// ---------------------------------------------------------------------------
// Region bound
// ---------------------------------------------------------------------------

#[test]
fn chunk_may_not_reach_region_end() {
    let mut a = allocator();
    let first = a.allocate(0).unwrap();
    let size = a.region().unwrap().size();
    let used = a.heap_usage();
    assert_eq!(used, HEADER_SIZE);

    // Ending exactly at the region end is refused.
    let exact = size - used - HEADER_SIZE;
    assert_eq!(
        a.allocate(exact),
        Err(AllocError::RegionExhausted { requested: exact, available: exact - 1 })
    );

    let p = a.allocate(exact - 1).unwrap();
    assert_eq!(a.heap_usage(), size - 1);
    assert!(a.check_integrity().is_ok());

    a.release(p).unwrap();
    a.release(first).unwrap();
}

#[test]
fn huge_request_does_not_overflow() {
    let mut a = allocator();
    assert!(matches!(
        a.allocate(usize::MAX),
        Err(AllocError::RegionExhausted { .. })
    ));
    assert!(matches!(
        a.allocate(usize::MAX - HEADER_SIZE),
        Err(AllocError::RegionExhausted { .. })
    ));
    assert_eq!(a.tracker_count(), 0);
}

// ---------------------------------------------------------------------------
// Integrity
// ---------------------------------------------------------------------------

#[test]
fn overflow_into_next_header_is_detected() {
    let mut a = allocator();
    let p = a.allocate(16).unwrap();
    let _q = a.allocate(16).unwrap();
    assert!(a.check_integrity().is_ok());

    // Writing past the 16 requested bytes lands in the next chunk's header.
    unsafe { p.as_ptr().write_bytes(0xA5, 16 + 8) };

    let result = a.check_integrity();
    assert!(!result.is_ok());
    assert_eq!(result.trackers_checked, 2);
    assert_eq!(result.header_mismatches, 1);
    assert_eq!(result.contiguity_errors, 0);
}

#[test]
fn independent_instances_do_not_share_state() {
    let mut a = allocator();
    let mut b = allocator();
    let pa = a.allocate(256).unwrap();
    let pb = b.allocate(256).unwrap();

    assert_ne!(a.region().unwrap().base(), b.region().unwrap().base());
    assert_eq!(offset_of(&a, pa), offset_of(&b, pb));

    a.release(pa).unwrap();
    assert_eq!(a.heap_usage(), 0);
    assert_eq!(b.heap_usage(), HEADER_SIZE + 256);
    b.release(pb).unwrap();
}
