#![no_main]

use hugealloc::{AllocError, Allocator, Config, PagePolicy, HEADER_SIZE};
use libfuzzer_sys::fuzz_target;

// Fuzz target that exercises the region bound.
// Interprets input as a series of u32 sizes, allocates each one until the
// region is exhausted, writes to the full extent of every chunk, then
// releases everything in reverse.

fuzz_target!(|data: &[u8]| {
    let mut heap = Allocator::new(
        Config::new()
            .region_size(2 * 1024 * 1024)
            .pages(PagePolicy::Normal)
            .report(None),
    );
    let mut chunks = Vec::new();

    let mut i = 0;
    while i + 4 <= data.len() {
        let raw_size = u32::from_le_bytes([data[i], data[i + 1], data[i + 2], data[i + 3]]);
        i += 4;

        // Sizes past the region end must be refused, never wrapped.
        let size = raw_size as usize % (4 * 1024 * 1024);
        let usage = heap.heap_usage();

        match heap.allocate(size) {
            Ok(ptr) => {
                let region = heap.region().unwrap();
                let end = ptr.as_ptr() as usize + size - region.base().as_ptr() as usize;
                assert!(end < region.size(), "chunk of {} bytes ends past the region", size);
                assert_eq!(heap.heap_usage(), usage + HEADER_SIZE + size);

                unsafe { ptr.as_ptr().write_bytes(0xBB, size) };
                chunks.push(ptr);
            }
            Err(AllocError::RegionExhausted { requested, available }) => {
                assert_eq!(requested, size);
                assert!(usage + HEADER_SIZE + size >= heap.region().unwrap().size());
                assert!(available < size.max(1));
                assert_eq!(heap.heap_usage(), usage);
            }
            Err(err) => panic!("allocate({}) failed: {}", size, err),
        }
    }

    assert!(heap.check_integrity().is_ok());
    while let Some(ptr) = chunks.pop() {
        heap.release(ptr).unwrap();
    }
    assert_eq!(heap.heap_usage(), 0);
});
