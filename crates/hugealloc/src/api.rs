//! C entry points.
//!
//! `__wrap_malloc`/`__wrap_free` pair with `-Wl,--wrap=malloc -Wl,--wrap=free`
//! when linking a program against the static library. Plain `malloc`/`free`
//! for `LD_PRELOAD` are exported by the `hugealloc-preload` crate only.
//!
//! Every allocator error aborts the process after a one-line diagnostic.

use crate::diag;
use crate::init;
use core::ffi::c_void;
use core::ptr::NonNull;

#[inline]
unsafe fn malloc_impl(size: usize) -> *mut c_void {
    init::ensure_initialized();
    match init::allocator().allocate(size) {
        Ok(ptr) => ptr.as_ptr() as *mut c_void,
        Err(err) => diag::fatal(&err),
    }
}

#[inline]
unsafe fn free_impl(ptr: *mut c_void) {
    let Some(ptr) = NonNull::new(ptr as *mut u8) else {
        return;
    };
    init::ensure_initialized();
    if let Err(err) = init::allocator().release(ptr) {
        diag::fatal(&err);
    }
}

#[no_mangle]
pub unsafe extern "C" fn __wrap_malloc(size: usize) -> *mut c_void {
    malloc_impl(size)
}

#[no_mangle]
pub unsafe extern "C" fn __wrap_free(ptr: *mut c_void) {
    free_impl(ptr)
}

/// Current heap usage of the process-wide allocator, headers included.
#[no_mangle]
pub unsafe extern "C" fn hugealloc_heap_usage() -> usize {
    if !init::is_initialized() {
        return 0;
    }
    init::allocator().heap_usage()
}
