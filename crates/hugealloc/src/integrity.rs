/// Checksum stamped into a chunk header.
///
/// Single-round multiplicative hash with a fixed domain constant, so the
/// same layout stamps the same headers on every run.
#[inline(always)]
pub fn compute_checksum(offset: usize, size: usize, slot: usize) -> u64 {
    // Golden ratio constant as the domain separator.
    let input =
        (offset as u64) ^ (size as u64).rotate_left(32) ^ (slot as u64) ^ 0x9E3779B97F4A7C15;
    let h = input.wrapping_mul(0xbf58476d1ce4e5b9);
    h ^ (h >> 31)
}

/// Verify a header checksum.
#[inline(always)]
pub fn verify_checksum(offset: usize, size: usize, slot: usize, stored: u64) -> bool {
    compute_checksum(offset, size, slot) == stored
}

/// Result of an integrity scan over one allocator's tracker table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IntegrityResult {
    pub trackers_checked: usize,
    pub errors_found: usize,
    /// Tracker not starting where its predecessor ends.
    pub contiguity_errors: usize,
    /// Header plus chunk reaching the region end.
    pub bound_errors: usize,
    /// In-band header stamp no longer matching its tracker.
    pub header_mismatches: usize,
    /// Free tracker left at the tail after a release.
    pub untrimmed_tail: usize,
}

impl IntegrityResult {
    pub fn is_ok(&self) -> bool {
        self.errors_found == 0
    }

    pub(crate) fn contiguity_error(&mut self) {
        self.contiguity_errors += 1;
        self.errors_found += 1;
    }

    pub(crate) fn bound_error(&mut self) {
        self.bound_errors += 1;
        self.errors_found += 1;
    }

    pub(crate) fn header_mismatch(&mut self) {
        self.header_mismatches += 1;
        self.errors_found += 1;
    }

    pub(crate) fn untrimmed_tail(&mut self) {
        self.untrimmed_tail += 1;
        self.errors_found += 1;
    }
}
