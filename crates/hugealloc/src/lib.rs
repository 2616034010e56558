//! Huge page backed `malloc`/`free` replacement.
//!
//! All allocations of an [`Allocator`] live in one fixed mapping reserved on
//! first use, preferably from 2 MiB hugetlb pages, so the same sequence of
//! calls yields the same layout on every run. Chunks are placed first-fit,
//! never split or moved, and only the free run at the end of the occupied
//! extent is reclaimed.
//!
//! ```rust,no_run
//! use hugealloc::{Allocator, Config, PagePolicy};
//!
//! let mut heap = Allocator::new(Config::new().pages(PagePolicy::PreferHuge));
//! let chunk = heap.allocate(1024)?;
//! heap.release(chunk)?;
//! assert_eq!(heap.heap_usage(), 0);
//! # Ok::<(), hugealloc::AllocError>(())
//! ```

extern crate libc;

pub mod allocator;
pub mod api;
pub mod config;
pub mod diag;
pub mod error;
pub mod init;
pub mod integrity;
pub mod platform;
pub mod profile;
pub mod region;
pub mod tracker;
pub mod util;

pub use allocator::Allocator;
pub use config::{Config, PagePolicy};
pub use error::AllocError;
pub use integrity::IntegrityResult;
pub use profile::{ReportHook, UsageReport};
pub use region::{Backing, Region};
pub use tracker::{Tracker, HEADER_SIZE};
