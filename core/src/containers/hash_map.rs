use super::FnvKey;
use std::borrow::Borrow;
use std::fmt;

const DEFAULT_CAPACITY: usize = 1009;
const MAX_LOAD_FACTOR: f64 = 1.0;

/// Separate-chaining hash map with growth-only rehashing.
#[derive(Clone)]
pub struct HashMap<K, V> {
    buckets: Vec<Vec<(K, V)>>,
    len: usize,
}

impl<K: FnvKey, V> HashMap<K, V> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a map with `capacity` buckets (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut buckets = Vec::with_capacity(capacity);
        buckets.resize_with(capacity, Vec::new);
        Self { buckets, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.capacity() as f64
    }

    fn bucket_of<Q: FnvKey + ?Sized>(&self, key: &Q) -> usize {
        key.fnv_hash() % self.buckets.len()
    }

    /// Insert or overwrite. Returns the previous value for `key`, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let idx = self.bucket_of(&key);
        if let Some(slot) = self.buckets[idx].iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.push_new(key, value);
        None
    }

    /// Insert only when `key` is absent, with a single bucket scan. Returns
    /// `false` and drops `value` when the key was already present.
    pub fn insert_if_absent(&mut self, key: K, value: V) -> bool {
        let idx = self.bucket_of(&key);
        if self.buckets[idx].iter().any(|(k, _)| *k == key) {
            return false;
        }
        self.push_new(key, value);
        true
    }

    /// Look up `key`, inserting `V::default()` first when it is absent.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let idx = self.bucket_of(&key);
        match self.buckets[idx].iter().position(|(k, _)| *k == key) {
            Some(pos) => &mut self.buckets[idx][pos].1,
            None => self.push_new(key, V::default()),
        }
    }

    fn push_new(&mut self, key: K, value: V) -> &mut V {
        if (self.len + 1) as f64 / self.capacity() as f64 > MAX_LOAD_FACTOR {
            self.rehash(self.capacity() * 2 + 1);
        }
        let idx = self.bucket_of(&key);
        let bucket = &mut self.buckets[idx];
        bucket.push((key, value));
        self.len += 1;
        let last = bucket.len() - 1;
        &mut bucket[last].1
    }

    fn rehash(&mut self, new_capacity: usize) {
        let mut buckets: Vec<Vec<(K, V)>> = Vec::with_capacity(new_capacity);
        buckets.resize_with(new_capacity, Vec::new);
        for (key, value) in std::mem::take(&mut self.buckets).into_iter().flatten() {
            let idx = key.fnv_hash() % new_capacity;
            buckets[idx].push((key, value));
        }
        self.buckets = buckets;
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: FnvKey + ?Sized,
    {
        self.buckets[self.bucket_of(key)]
            .iter()
            .find(|(k, _)| key == k.borrow())
            .map(|(_, v)| v)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: FnvKey + ?Sized,
    {
        let idx = self.bucket_of(key);
        self.buckets[idx]
            .iter_mut()
            .find(|(k, _)| key == k.borrow())
            .map(|(_, v)| v)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: FnvKey + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Remove `key`. Absent keys are a no-op; capacity is left untouched.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: FnvKey + ?Sized,
    {
        let idx = self.bucket_of(key);
        let bucket = &mut self.buckets[idx];
        let pos = bucket.iter().position(|(k, _)| key == k.borrow())?;
        self.len -= 1;
        Some(bucket.swap_remove(pos).1)
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets.iter(),
            current: [].iter(),
            remaining: self.len,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }
}

impl<K: FnvKey, V> Default for HashMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: FnvKey + fmt::Debug, V: fmt::Debug> fmt::Debug for HashMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: FnvKey, V> FromIterator<(K, V)> for HashMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: FnvKey, V> Extend<(K, V)> for HashMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

/// Borrowing iterator in bucket order.
pub struct Iter<'a, K, V> {
    buckets: std::slice::Iter<'a, Vec<(K, V)>>,
    current: std::slice::Iter<'a, (K, V)>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((k, v)) = self.current.next() {
                self.remaining -= 1;
                return Some((k, v));
            }
            self.current = self.buckets.next()?.iter();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K: FnvKey, V> IntoIterator for &'a HashMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct IntoIter<K, V> {
    inner: std::iter::Flatten<std::vec::IntoIter<Vec<(K, V)>>>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl<K: FnvKey, V> IntoIterator for HashMap<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { inner: self.buckets.into_iter().flatten() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_overwrites_by_key() {
        let mut map: HashMap<String, u32> = HashMap::new();
        assert_eq!(map.insert("кот".into(), 1), None);
        assert_eq!(map.insert("кот".into(), 2), Some(1));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("кот"), Some(&2));
    }

    #[test]
    fn get_does_not_create_entries() {
        let map: HashMap<String, u32> = HashMap::new();
        assert_eq!(map.get("пёс"), None);
        assert!(!map.contains_key("пёс"));
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn insert_if_absent_keeps_first_value() {
        let mut map: HashMap<String, u32> = HashMap::with_capacity(1);
        assert!(map.insert_if_absent("кот".into(), 1));
        assert!(!map.insert_if_absent("кот".into(), 2));
        assert!(map.insert_if_absent("пёс".into(), 3));
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("кот"), Some(&1));
        assert_eq!(map.get("пёс"), Some(&3));
    }

    #[test]
    fn get_or_insert_default_vivifies_missing_key() {
        let mut map: HashMap<String, u64> = HashMap::new();
        *map.get_or_insert_default("дом".into()) += 1;
        *map.get_or_insert_default("дом".into()) += 1;
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("дом"), Some(&2));

        let fresh = map.get_or_insert_default("лес".into());
        assert_eq!(*fresh, 0);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn remove_present_and_absent() {
        let mut map: HashMap<String, u32> = (0..5).map(|i| (i.to_string(), i)).collect();
        assert_eq!(map.remove("3"), Some(3));
        assert_eq!(map.len(), 4);
        assert!(!map.contains_key("3"));
        assert_eq!(map.remove("3"), None);
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn growth_keeps_load_factor_and_entries() {
        let mut map: HashMap<String, usize> = HashMap::with_capacity(1);
        let mut capacities = vec![map.capacity()];
        for i in 0..100 {
            map.insert(format!("k{i}"), i);
            assert!(map.load_factor() <= 1.0);
            if *capacities.last().unwrap() != map.capacity() {
                capacities.push(map.capacity());
            }
        }
        assert_eq!(capacities, vec![1, 3, 7, 15, 31, 63, 127]);
        for i in 0..100 {
            assert_eq!(map.get(format!("k{i}").as_str()), Some(&i));
        }
    }

    #[test]
    fn remove_never_shrinks() {
        let mut map: HashMap<String, ()> = HashMap::with_capacity(1);
        for i in 0..10 {
            map.insert(i.to_string(), ());
        }
        let capacity = map.capacity();
        for i in 0..10 {
            map.remove(i.to_string().as_str());
        }
        assert!(map.is_empty());
        assert_eq!(map.capacity(), capacity);
    }

    #[test]
    fn iteration_visits_every_entry_once() {
        let map: HashMap<String, usize> = (0..250).map(|i| (format!("t{i}"), i)).collect();
        let mut seen: Vec<usize> = map.values().copied().collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..250).collect::<Vec<_>>());
        assert_eq!(map.iter().len(), 250);
        assert_eq!(map.into_iter().count(), 250);
    }
}
