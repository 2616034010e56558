use crate::profile::{self, ReportHook};
use crate::util::DEFAULT_REGION_SIZE;

/// Which pages back the region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagePolicy {
    /// hugetlb pages only; reservation fails when the pool is empty.
    Huge,
    /// Try hugetlb, fall back to base pages with a transparent huge page hint.
    PreferHuge,
    /// Base pages only.
    Normal,
}

/// Construction-time settings of an [`crate::Allocator`].
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub region_size: usize,
    pub pages: PagePolicy,
    pub profiling: bool,
    /// Called with a usage snapshot after every release when profiling is on.
    pub report: Option<ReportHook>,
    /// Emit engine records through the `log` facade. Off for the process-wide
    /// instance: a logger allocating through it would re-enter it.
    pub logging: bool,
}

impl Config {
    pub const fn new() -> Self {
        Config {
            region_size: DEFAULT_REGION_SIZE,
            pages: PagePolicy::Huge,
            profiling: cfg!(feature = "profiling"),
            report: Some(profile::log_report),
            logging: true,
        }
    }

    pub const fn region_size(mut self, size: usize) -> Self {
        self.region_size = size;
        self
    }

    pub const fn pages(mut self, pages: PagePolicy) -> Self {
        self.pages = pages;
        self
    }

    pub const fn profiling(mut self, enabled: bool) -> Self {
        self.profiling = enabled;
        self
    }

    pub const fn report(mut self, hook: Option<ReportHook>) -> Self {
        self.report = hook;
        self
    }

    pub const fn logging(mut self, enabled: bool) -> Self {
        self.logging = enabled;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

/// Build the configuration of the process-wide allocator from environment
/// variables, starting from `base`. Unparseable values are ignored.
///
/// # Safety
/// Calls libc::getenv, which is not thread-safe, so must be called during init.
pub unsafe fn read_config(base: Config) -> Config {
    let mut config = base;
    if let Some(size) = getenv_usize(b"HUGEALLOC_REGION_SIZE\0") {
        if size > 0 {
            config.region_size = size;
        }
    }
    if let Some(value) = getenv_bytes(b"HUGEALLOC_PAGES\0") {
        if let Some(pages) = parse_pages(value) {
            config.pages = pages;
        }
    }
    match getenv_bytes(b"HUGEALLOC_PROFILE\0") {
        Some(b"1") => config.profiling = true,
        Some(b"0") => config.profiling = false,
        _ => {}
    }
    config
}

fn parse_pages(value: &[u8]) -> Option<PagePolicy> {
    match value {
        b"huge" => Some(PagePolicy::Huge),
        b"prefer-huge" => Some(PagePolicy::PreferHuge),
        b"normal" => Some(PagePolicy::Normal),
        _ => None,
    }
}

/// Look up an environment variable without allocating.
///
/// # Safety
/// Calls libc::getenv. The returned slice borrows the environment block and
/// is only valid until the environment is modified.
unsafe fn getenv_bytes(key: &[u8]) -> Option<&'static [u8]> {
    let val = libc::getenv(key.as_ptr() as *const libc::c_char);
    if val.is_null() {
        return None;
    }
    Some(core::ffi::CStr::from_ptr(val).to_bytes())
}

/// Parse an environment variable as a usize.
///
/// # Safety
/// Calls libc::getenv.
unsafe fn getenv_usize(key: &[u8]) -> Option<usize> {
    parse_usize(getenv_bytes(key)?)
}

// Parse manually (no std allocation)
fn parse_usize(digits: &[u8]) -> Option<usize> {
    if digits.is_empty() {
        return None;
    }
    let mut result: usize = 0;
    for &byte in digits {
        if !byte.is_ascii_digit() {
            return None;
        }
        result = result.checked_mul(10)?.checked_add((byte - b'0') as usize)?;
    }
    Some(result)
}
