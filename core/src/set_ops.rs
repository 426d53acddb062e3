//! Set algebra over [`HashSet`]s, used to combine posting sets.

use crate::containers::{FnvKey, HashSet};

/// Members of both sets. Walks the smaller set and probes the larger one.
pub fn intersect<T: FnvKey + Clone>(a: &HashSet<T>, b: &HashSet<T>) -> HashSet<T> {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.iter().filter(|v| large.contains(*v)).cloned().collect()
}

pub fn union<T: FnvKey + Clone>(a: &HashSet<T>, b: &HashSet<T>) -> HashSet<T> {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let mut result = large.clone();
    result.extend(small.iter().cloned());
    result
}

/// Members of `a` that are not in `b`.
pub fn difference<T: FnvKey + Clone>(a: &HashSet<T>, b: &HashSet<T>) -> HashSet<T> {
    a.iter().filter(|v| !b.contains(*v)).cloned().collect()
}
