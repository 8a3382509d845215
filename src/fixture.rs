//! Fixed-capacity buffer fixture seeded identically for both routines.
//!
//! The fixture owns two capacity-sized images, one moved by the reference
//! routine and one by the candidate. Both are allocated once at
//! construction and re-seeded per case, so a sweep performs no per-case
//! allocation and no case can observe a predecessor's bytes.
//!
//! Comparison is deliberately whole-buffer: a move routine that writes
//! outside its destination range corrupts bytes the moved-region check
//! would never look at.

use crate::sweep::MoveCase;

/// First point of divergence between the two images.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mismatch {
    /// Buffer index of the first differing byte.
    pub index: usize,
    /// Byte produced by the reference routine.
    pub expected: u8,
    /// Byte produced by the candidate routine.
    pub actual: u8,
}

/// Two identically seeded buffer images plus the shared capacity.
pub struct MoveFixture {
    reference: Vec<u8>,
    candidate: Vec<u8>,
}

impl MoveFixture {
    /// Allocate both images at `capacity` bytes, zero-filled.
    pub fn new(capacity: usize) -> Self {
        Self {
            reference: vec![0u8; capacity],
            candidate: vec![0u8; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.reference.len()
    }

    /// Re-seed both images for `case`: zero everywhere, then byte `i` of
    /// the source region set to `i mod 256`.
    ///
    /// The caller has already bounds-checked the case; seeding an
    /// out-of-bounds region is a harness bug.
    pub fn seed(&mut self, case: &MoveCase) {
        debug_assert!(case
            .src_offset
            .checked_add(case.data_len)
            .is_some_and(|end| end < self.reference.len()));
        self.reference.fill(0);
        self.candidate.fill(0);
        for i in 0..case.data_len {
            let b = (i % 256) as u8;
            self.reference[case.src_offset + i] = b;
            self.candidate[case.src_offset + i] = b;
        }
    }

    /// Image the reference routine operates on.
    pub fn reference_image(&mut self) -> &mut [u8] {
        &mut self.reference
    }

    /// Image the candidate routine operates on.
    pub fn candidate_image(&mut self) -> &mut [u8] {
        &mut self.candidate
    }

    /// Byte-exact equality over the entire capacity.
    ///
    /// Returns the first mismatch, if any. No partial credit: one
    /// differing byte anywhere fails the case.
    pub fn compare(&self) -> Option<Mismatch> {
        self.reference
            .iter()
            .zip(self.candidate.iter())
            .position(|(r, c)| r != c)
            .map(|index| Mismatch {
                index,
                expected: self.reference[index],
                actual: self.candidate[index],
            })
    }
}
