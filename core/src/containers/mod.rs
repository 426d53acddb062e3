//! Chained hash containers backing the index and every posting set.
//!
//! Both containers hash keys with an FNV-1a variant and keep collisions in
//! per-bucket vectors. The bucket array only grows: once an insert would push
//! the load factor above 1.0 the table is rebuilt with `2 * capacity + 1`
//! buckets.

mod hash_map;
mod hash_set;

pub use hash_map::{HashMap, IntoIter as MapIntoIter, Iter as MapIter};
pub use hash_set::{HashSet, IntoIter as SetIntoIter, Iter as SetIter};

const FNV_OFFSET_BASIS: usize = 2_166_136_261;
const FNV_PRIME: usize = 16_777_619;

/// Keys that can be folded into an FNV-1a hash, one code unit at a time.
///
/// `String` and `str` hash identically so that owned keys can be probed with
/// borrowed ones.
pub trait FnvKey: Eq {
    fn fnv_hash(&self) -> usize;
}

/// Fold a sequence of code units with XOR-then-multiply.
pub fn fnv1a<I>(units: I) -> usize
where
    I: IntoIterator<Item = u32>,
{
    units.into_iter().fold(FNV_OFFSET_BASIS, |hash, unit| {
        (hash ^ unit as usize).wrapping_mul(FNV_PRIME)
    })
}

impl FnvKey for str {
    fn fnv_hash(&self) -> usize {
        fnv1a(self.chars().map(u32::from))
    }
}

impl FnvKey for String {
    fn fnv_hash(&self) -> usize {
        self.as_str().fnv_hash()
    }
}
