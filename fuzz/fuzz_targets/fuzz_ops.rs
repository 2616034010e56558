#![no_main]

use hugealloc::{AllocError, Allocator, Config, PagePolicy};
use libfuzzer_sys::fuzz_target;
use std::ptr::NonNull;

/// Fuzz target that interprets a byte slice as a sequence of allocator operations.
///
/// Each operation is encoded as:
///   byte 0: opcode (0=allocate, 1=release, 2=release twice, 3=release interior pointer)
///   byte 1-2: size (little-endian u16)
///   byte 3: slot index (which tracked chunk to operate on)
///
/// We track up to 64 live chunks.
const MAX_SLOTS: usize = 64;

fuzz_target!(|data: &[u8]| {
    let mut heap = Allocator::new(
        Config::new()
            .region_size(1024 * 1024)
            .pages(PagePolicy::Normal)
            .profiling(true)
            .report(None),
    );
    let mut slots: [Option<(NonNull<u8>, usize)>; MAX_SLOTS] = [None; MAX_SLOTS];

    let mut i = 0;
    while i + 4 <= data.len() {
        let opcode = data[i] & 0x03;
        let size = u16::from_le_bytes([data[i + 1], data[i + 2]]) as usize;
        let slot = (data[i + 3] as usize) % MAX_SLOTS;
        i += 4;

        match opcode {
            0 => {
                if let Some((ptr, _)) = slots[slot].take() {
                    heap.release(ptr).unwrap();
                }
                match heap.allocate(size) {
                    Ok(ptr) => {
                        unsafe { ptr.as_ptr().write_bytes(slot as u8, size) };
                        slots[slot] = Some((ptr, size));
                    }
                    Err(AllocError::RegionExhausted { .. }) => {}
                    Err(err) => panic!("allocate({}) failed: {}", size, err),
                }
            }
            1 => {
                if let Some((ptr, size)) = slots[slot].take() {
                    for j in 0..size {
                        assert_eq!(unsafe { *ptr.as_ptr().add(j) }, slot as u8);
                    }
                    heap.release(ptr).unwrap();
                }
            }
            2 => {
                if let Some((ptr, _)) = slots[slot].take() {
                    heap.release(ptr).unwrap();
                    let usage = heap.heap_usage();
                    assert!(heap.release(ptr).is_err());
                    assert_eq!(heap.heap_usage(), usage);
                }
            }
            3 => {
                if let Some((ptr, _)) = slots[slot] {
                    let offset = (size % 64) + 1;
                    let interior = NonNull::new(ptr.as_ptr().wrapping_add(offset)).unwrap();
                    // An interior address may coincide with a later zero-size chunk.
                    let owned = slots.iter().flatten().any(|&(p, _)| p == interior);
                    if !owned {
                        assert!(heap.release(interior).is_err());
                    }
                }
            }
            _ => unreachable!(),
        }

        let result = heap.check_integrity();
        assert!(result.is_ok(), "{:?}", result);
    }

    for (ptr, _) in slots.iter_mut().filter_map(Option::take) {
        heap.release(ptr).unwrap();
    }
    assert_eq!(heap.heap_usage(), 0);
});
