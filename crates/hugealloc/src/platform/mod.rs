#[cfg(target_os = "linux")]
pub mod linux;
#[cfg(target_os = "linux")]
pub use linux as sys;

#[cfg(target_os = "macos")]
pub mod macos;
#[cfg(target_os = "macos")]
pub use macos as sys;

/// Map anonymous base-page memory. Returns null on failure.
///
/// # Safety
/// Caller must ensure `size` is page-aligned and non-zero.
#[inline]
pub unsafe fn map_anonymous(size: usize) -> *mut u8 {
    sys::map_anonymous(size)
}

/// Map anonymous memory from the huge page pool. Returns null on failure.
///
/// # Safety
/// Caller must ensure `size` is a non-zero multiple of the huge page size.
#[inline]
pub unsafe fn map_huge(size: usize) -> *mut u8 {
    sys::map_huge(size)
}

/// Unmap previously mapped memory.
///
/// # Safety
/// `ptr` must have been returned by `map_anonymous` or `map_huge` and `size` must match.
#[inline]
pub unsafe fn unmap(ptr: *mut u8, size: usize) {
    sys::unmap(ptr, size);
}

/// Hint that a base-page mapping should be promoted to transparent huge pages.
/// Returns whether the kernel accepted the hint.
///
/// # Safety
/// `ptr` and `size` must refer to a valid mapped region and be page-aligned.
#[inline]
pub unsafe fn advise_hugepage(ptr: *mut u8, size: usize) -> bool {
    sys::advise_hugepage(ptr, size)
}

/// errno of the last failed libc call on this thread.
#[inline]
pub fn last_errno() -> i32 {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}
