use std::{
    borrow::Borrow,
    collections::{hash_map::RandomState, HashMap},
    hash::{BuildHasher, Hash},
    slice,
};

/// Guarantees iteration in insertion order.
/// Unlike [`HashMap`], which has no predictable iteration order, the position of a key in an
/// [`OrderedHashMap`] is stable, which makes it usable for tables where declaration order
/// carries meaning (such as the fields of a class).
#[derive(Debug, Clone)]
pub struct OrderedHashMap<K, V, S = RandomState> {
    inner: HashMap<K, V, S>,
    insertion_order: Vec<K>,
}
impl<K: Eq + Hash + Clone, V> OrderedHashMap<K, V, RandomState> {
    pub fn new() -> Self {
        Self::default()
    }
}
impl<K: Eq + Hash + Clone, V, S: BuildHasher> OrderedHashMap<K, V, S> {
    pub fn iter(&self) -> OrderedHashMapIter<K, V, S> {
        OrderedHashMapIter {
            inner: &self.inner,
            key_iter: self.insertion_order.iter(),
        }
    }

    /// Inserts a value. Replacing the value of an existing key keeps its original position.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let previous = self.inner.insert(key.clone(), value);
        if previous.is_none() {
            self.insertion_order.push(key);
        }
        previous
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.get(key)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.get_mut(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.contains_key(key)
    }

    /// Returns the position at which `key` was first inserted.
    pub fn index_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if !self.inner.contains_key(key) {
            return None;
        }
        self.insertion_order.iter().position(|k| <K as Borrow<Q>>::borrow(k) == key)
    }

    pub fn keys(&self) -> slice::Iter<K> {
        self.insertion_order.iter()
    }

    pub fn len(&self) -> usize {
        self.insertion_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insertion_order.is_empty()
    }
}
impl<K, V, S: BuildHasher + Default> Default for OrderedHashMap<K, V, S> {
    fn default() -> Self {
        Self {
            inner: Default::default(),
            insertion_order: Default::default(),
        }
    }
}

pub struct OrderedHashMapIter<'k, K, V, S> {
    inner: &'k HashMap<K, V, S>,
    key_iter: slice::Iter<'k, K>,
}

impl<'k, K: Eq + Hash, V, S: BuildHasher> Iterator for OrderedHashMapIter<'k, K, V, S> {
    type Item = (&'k K, &'k V);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.key_iter.next()?;
        self.inner.get_key_value(key)
    }
}
