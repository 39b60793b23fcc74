use bitvec::prelude::*;

/// A fixed-width bit vector produced by one of the image hashers. The width is
/// `hash_size * hash_size` bits.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct ImageHash {
    bits: BitVec<u64, Lsb0>,
}

impl ImageHash {
    /// Build a hash with one bit per value, set where the predicate holds.
    pub(crate) fn from_predicate<T, F>(values: &[T], predicate: F) -> Self
    where
        T: Copy,
        F: Fn(T) -> bool,
    {
        Self {
            bits: values.iter().map(|val| predicate(*val)).collect(),
        }
    }

    /// Number of bits in the hash.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> u32 {
        self.bits.count_ones() as u32
    }

    /// The number of bit positions at which the two hashes differ. Hashes of different
    /// widths additionally differ by every bit that only one of them has.
    pub fn hamming_distance(&self, other: &ImageHash) -> u32 {
        let shared = self
            .bits
            .iter()
            .by_vals()
            .zip(other.bits.iter().by_vals())
            .filter(|(x, y)| x != y)
            .count();

        let unshared = self.bits.len().abs_diff(other.bits.len());

        (shared + unshared) as u32
    }
}
