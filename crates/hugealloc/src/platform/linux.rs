use core::ptr;

// Huge page size selector bits from mmap(2): log2(page size) << MAP_HUGE_SHIFT.
const MAP_HUGE_SHIFT: libc::c_int = 26;
const MAP_HUGE_2MB: libc::c_int = 21 << MAP_HUGE_SHIFT;

/// Map anonymous read-write memory backed by base pages.
///
/// # Safety
/// `size` must be page-aligned and non-zero.
pub unsafe fn map_anonymous(size: usize) -> *mut u8 {
    map(size, 0)
}

/// Map anonymous read-write memory backed by 2 MiB hugetlb pages.
/// Fails (null) when the hugetlb pool cannot cover `size`.
///
/// # Safety
/// `size` must be a non-zero multiple of the huge page size.
pub unsafe fn map_huge(size: usize) -> *mut u8 {
    map(size, libc::MAP_HUGETLB | MAP_HUGE_2MB)
}

unsafe fn map(size: usize, extra_flags: libc::c_int) -> *mut u8 {
    let result = libc::mmap(
        ptr::null_mut(),
        size,
        libc::PROT_READ | libc::PROT_WRITE,
        libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | extra_flags,
        -1,
        0,
    );
    if result == libc::MAP_FAILED {
        ptr::null_mut()
    } else {
        result as *mut u8
    }
}

/// Unmap memory.
///
/// # Safety
/// `ptr` must have been returned by one of the map functions with the same `size`.
pub unsafe fn unmap(ptr: *mut u8, size: usize) {
    libc::munmap(ptr as *mut libc::c_void, size);
}

/// Ask for transparent huge pages on a base-page mapping. Best effort.
///
/// # Safety
/// Region must be valid and page-aligned.
pub unsafe fn advise_hugepage(ptr: *mut u8, size: usize) -> bool {
    libc::madvise(ptr as *mut libc::c_void, size, libc::MADV_HUGEPAGE) == 0
}
