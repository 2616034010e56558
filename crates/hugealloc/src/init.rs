//! The process-wide allocator behind the C entry points.

use crate::allocator::Allocator;
use crate::config::{self, Config};
use crate::diag;
use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU8, Ordering};

const UNINIT: u8 = 0;
const READY: u8 = 1;

static INIT_STATE: AtomicU8 = AtomicU8::new(UNINIT);

struct AllocatorHolder(UnsafeCell<Allocator>);
// Single-threaded by contract: the C entry points are not thread-safe.
unsafe impl Sync for AllocatorHolder {}

static ALLOCATOR: AllocatorHolder = AllocatorHolder(UnsafeCell::new(Allocator::new(
    Config::new().report(Some(diag::write_report)).logging(false),
)));

/// Apply the environment configuration. The region itself is reserved by
/// the first allocation.
///
/// # Safety
/// Must not race with any other call into the process-wide allocator.
pub unsafe fn hugealloc_init() {
    if INIT_STATE.load(Ordering::Acquire) == READY {
        return;
    }
    let base = *(*ALLOCATOR.0.get()).config();
    *ALLOCATOR.0.get() = Allocator::new(config::read_config(base));
    INIT_STATE.store(READY, Ordering::Release);
}

#[inline(always)]
pub unsafe fn ensure_initialized() {
    if INIT_STATE.load(Ordering::Acquire) != READY {
        hugealloc_init();
    }
}

/// # Safety
/// Non-reentrant: the returned reference must not outlive the current
/// allocator call, and no other call may run concurrently.
#[inline(always)]
pub unsafe fn allocator() -> &'static mut Allocator {
    &mut *ALLOCATOR.0.get()
}

#[inline(always)]
pub fn is_initialized() -> bool {
    INIT_STATE.load(Ordering::Acquire) == READY
}
