use crate::config::PagePolicy;
use crate::error::AllocError;
use crate::platform;
use crate::util::{align_up, is_aligned, page_size, HUGE_PAGE_SIZE};
use core::ptr::NonNull;

/// Pages that actually back a reserved region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backing {
    /// hugetlb pages: physically contiguous per 2 MiB page.
    HugeTlb,
    /// Base pages with a transparent huge page hint.
    Transparent,
    /// Plain base pages.
    Base,
}

/// The single fixed-size mapping every chunk of an allocator lives in.
///
/// Never grows or shrinks. Unmapped on drop.
#[derive(Debug)]
pub struct Region {
    base: NonNull<u8>,
    size: usize,
    backing: Backing,
}

// The mapping is owned exclusively; nothing else holds its address.
unsafe impl Send for Region {}

impl Region {
    /// Reserve `size` bytes (rounded up to the page granule) according to `pages`.
    /// `logging` selects whether the reservation is reported through `log`.
    pub fn reserve(size: usize, pages: PagePolicy, logging: bool) -> Result<Region, AllocError> {
        let region = match pages {
            PagePolicy::Huge => Self::map_huge(size),
            PagePolicy::Normal => Self::map_base(size, false),
            PagePolicy::PreferHuge => Self::map_huge(size).or_else(|err| {
                if logging {
                    log::warn!("hugetlb reservation failed ({}), falling back to base pages", err);
                }
                Self::map_base(size, true)
            }),
        }?;
        if logging {
            log::debug!(
                "reserved region at {:p}, {} bytes, {:?} pages",
                region.base.as_ptr(),
                region.size,
                region.backing
            );
        }
        Ok(region)
    }

    fn map_huge(size: usize) -> Result<Region, AllocError> {
        let size = align_up(size.max(1), HUGE_PAGE_SIZE);
        let base = unsafe { platform::map_huge(size) };
        let base = NonNull::new(base).ok_or_else(|| AllocError::ReservationFailed {
            size,
            errno: platform::last_errno(),
        })?;
        Ok(Self::mapped(base, size, Backing::HugeTlb))
    }

    fn map_base(size: usize, hint_huge: bool) -> Result<Region, AllocError> {
        let size = align_up(size.max(1), page_size());
        let base = unsafe { platform::map_anonymous(size) };
        let base = NonNull::new(base).ok_or_else(|| AllocError::ReservationFailed {
            size,
            errno: platform::last_errno(),
        })?;
        let backing = if hint_huge && unsafe { platform::advise_hugepage(base.as_ptr(), size) } {
            Backing::Transparent
        } else {
            Backing::Base
        };
        Ok(Self::mapped(base, size, backing))
    }

    fn mapped(base: NonNull<u8>, size: usize, backing: Backing) -> Region {
        debug_assert!(is_aligned(base.as_ptr() as usize, page_size()));
        Region { base, size, backing }
    }

    pub fn base(&self) -> NonNull<u8> {
        self.base
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn backing(&self) -> Backing {
        self.backing
    }

    /// Whether `addr` lies inside the region.
    pub fn contains(&self, addr: usize) -> bool {
        let base = self.base.as_ptr() as usize;
        addr >= base && addr < base + self.size
    }

    /// Offset of `addr` from the base, if it lies inside the region.
    pub fn offset_of(&self, addr: usize) -> Option<usize> {
        if self.contains(addr) {
            Some(addr - self.base.as_ptr() as usize)
        } else {
            None
        }
    }

    /// Pointer at `offset` bytes from the base. `offset` may equal the size.
    pub fn at(&self, offset: usize) -> NonNull<u8> {
        debug_assert!(offset <= self.size);
        unsafe { NonNull::new_unchecked(self.base.as_ptr().add(offset)) }
    }
}

impl Drop for Region {
    fn drop(&mut self) {
        unsafe { platform::unmap(self.base.as_ptr(), self.size) };
    }
}
