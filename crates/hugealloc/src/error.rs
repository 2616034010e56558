use thiserror::Error;

/// Everything that can go wrong inside the allocator engine.
///
/// The engine never terminates the process itself; the C entry points in
/// [`crate::api`] turn every error into an abort.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    #[error("out of memory: {requested} bytes requested, {available} bytes left in the region")]
    RegionExhausted { requested: usize, available: usize },

    #[error("failed to reserve a {size} byte mapping (errno {errno})")]
    ReservationFailed { size: usize, errno: i32 },

    #[error("invalid free of {addr:#x}: not a chunk returned by malloc")]
    InvalidRelease { addr: usize },

    #[error("double free of {addr:#x}: chunk is already free")]
    DoubleFree { addr: usize },
}

impl AllocError {
    /// True for the conditions the allocator cannot recover from on its own.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AllocError::RegionExhausted { .. } | AllocError::ReservationFailed { .. }
        )
    }
}
