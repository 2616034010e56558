//! `LD_PRELOAD` shared object: plain `malloc`/`free` backed by hugealloc.
//!
//! Only programs that restrict themselves to `malloc` and `free` are
//! supported; `realloc`, `calloc` and friends still resolve to libc and must
//! never see a hugealloc pointer.

use core::ffi::c_void;
use hugealloc::api;

#[no_mangle]
pub unsafe extern "C" fn malloc(size: usize) -> *mut c_void {
    api::__wrap_malloc(size)
}

#[no_mangle]
pub unsafe extern "C" fn free(ptr: *mut c_void) {
    api::__wrap_free(ptr)
}
