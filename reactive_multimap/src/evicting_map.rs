//! [`EvictingMap`], a bounded [`Multimap`].
use core::num::NonZeroUsize;
use std::collections::VecDeque;
use std::collections::vec_deque;

use crate::Multimap;

/// A mapping holding at most `capacity` keys, in insertion order.
///
/// Inserting a new key into a full map first evicts the eldest inserted key together with its
/// bucket. Looking up an existing key does not refresh its position. Lookups are linear in the
/// capacity, so this is meant for small bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictingMap<Key, Coll> {
    entries: VecDeque<(Key, Coll)>,
    capacity: NonZeroUsize,
}

impl<Key, Coll> EvictingMap<Key, Coll> {
    /// Creates an empty map holding at most `capacity` keys.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.get()),
            capacity,
        }
    }

    /// The maximum number of keys.
    pub fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }

    /// The number of keys currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// If no keys are held.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the bucket for `key`, if held.
    pub fn get(&self, key: &Key) -> Option<&Coll>
    where
        Key: PartialEq,
    {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, coll)| coll)
    }

    /// Iterates the keys and buckets from eldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Coll)> {
        self.entries.iter().map(|(key, coll)| (key, coll))
    }

    /// Iterates the keys from eldest to newest.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.iter().map(|(key, _)| key)
    }
}

impl<Key, Coll> Multimap<Key, Coll> for EvictingMap<Key, Coll>
where
    Key: PartialEq,
{
    fn bucket_or_try_insert_with<E>(
        &mut self,
        key: Key,
        create: impl FnOnce(&Key) -> Result<Coll, E>,
    ) -> Result<&mut Coll, E> {
        let index = match self.entries.iter().position(|(k, _)| *k == key) {
            Some(index) => index,
            None => {
                let bucket = create(&key)?;
                if self.entries.len() >= self.capacity.get() {
                    self.entries.pop_front();
                }
                self.entries.push_back((key, bucket));
                self.entries.len() - 1
            }
        };
        Ok(&mut self.entries[index].1)
    }
}

impl<Key, Coll> IntoIterator for EvictingMap<Key, Coll> {
    type Item = (Key, Coll);
    type IntoIter = vec_deque::IntoIter<(Key, Coll)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
