//! [`Multimap`] capability and its implementations for the std maps.
use core::hash::{BuildHasher, Hash};
use std::collections::{BTreeMap, HashMap, btree_map, hash_map};

/// An outer mapping from keys to buckets, as driven by the `to_multimap` operator.
///
/// The operator only ever looks up a bucket, creating it if missing. Key order and key retention
/// (e.g. eviction, see [`EvictingMap`](crate::EvictingMap)) are left entirely to the
/// implementation.
pub trait Multimap<Key, Coll> {
    /// Returns the bucket for `key`, inserting the result of `create` first if there is none.
    ///
    /// If `create` fails, the mapping is left unchanged.
    fn bucket_or_try_insert_with<E>(
        &mut self,
        key: Key,
        create: impl FnOnce(&Key) -> Result<Coll, E>,
    ) -> Result<&mut Coll, E>;
}

impl<Key, Coll, S> Multimap<Key, Coll> for HashMap<Key, Coll, S>
where
    Key: Eq + Hash,
    S: BuildHasher,
{
    fn bucket_or_try_insert_with<E>(
        &mut self,
        key: Key,
        create: impl FnOnce(&Key) -> Result<Coll, E>,
    ) -> Result<&mut Coll, E> {
        Ok(match self.entry(key) {
            hash_map::Entry::Occupied(entry) => entry.into_mut(),
            hash_map::Entry::Vacant(entry) => {
                let bucket = create(entry.key())?;
                entry.insert(bucket)
            }
        })
    }
}

impl<Key, Coll> Multimap<Key, Coll> for BTreeMap<Key, Coll>
where
    Key: Ord,
{
    fn bucket_or_try_insert_with<E>(
        &mut self,
        key: Key,
        create: impl FnOnce(&Key) -> Result<Coll, E>,
    ) -> Result<&mut Coll, E> {
        Ok(match self.entry(key) {
            btree_map::Entry::Occupied(entry) => entry.into_mut(),
            btree_map::Entry::Vacant(entry) => {
                let bucket = create(entry.key())?;
                entry.insert(bucket)
            }
        })
    }
}
