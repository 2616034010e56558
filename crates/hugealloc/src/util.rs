use core::sync::atomic::{AtomicUsize, Ordering};

/// Align `value` up to the next multiple of `align`.
/// `align` must be a power of two.
#[inline(always)]
pub const fn align_up(value: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    (value + align - 1) & !(align - 1)
}

/// Check if `value` is aligned to `align`.
#[inline(always)]
pub const fn is_aligned(value: usize, align: usize) -> bool {
    value & (align - 1) == 0
}

/// Size of one huge page (the default hugetlb page size on x86_64 and aarch64).
pub const HUGE_PAGE_SIZE: usize = 2 * 1024 * 1024; // 2 MiB

/// Default region size: exactly one huge page.
pub const DEFAULT_REGION_SIZE: usize = HUGE_PAGE_SIZE;

/// Runtime base page size, 0 until first queried.
static PAGE_SIZE_CACHED: AtomicUsize = AtomicUsize::new(0);

/// Get the system base page size, querying sysconf(_SC_PAGESIZE) once.
#[inline]
pub fn page_size() -> usize {
    let cached = PAGE_SIZE_CACHED.load(Ordering::Relaxed);
    if cached != 0 {
        return cached;
    }
    let ps = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    let ps = if ps > 0 { ps as usize } else { 4096 };
    PAGE_SIZE_CACHED.store(ps, Ordering::Relaxed);
    ps
}
