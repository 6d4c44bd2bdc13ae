//! [`MapFactory`], [`CollectionFactory`] and their defaults.
use core::hash::Hash;
use std::collections::HashMap;

use crate::error::BoxError;
use crate::selector::{Fallible, Pure};
use crate::{Bucket, Multimap};

/// Creates the outer mapping, once per subscription.
///
/// `Key` and `Coll` are the key and bucket types the mapping must store.
pub trait MapFactory<Key, Coll> {
    /// The mapping type, emitted downstream on completion.
    type Map: Multimap<Key, Coll>;

    /// Creates an empty mapping.
    fn create_map(&mut self) -> Result<Self::Map, BoxError>;
}

/// Creates the bucket for a key seen for the first time.
pub trait CollectionFactory<Key, Value> {
    /// The bucket type.
    type Collection: Bucket<Value>;

    /// Creates an empty bucket for `key`.
    fn create_collection(&mut self, key: &Key) -> Result<Self::Collection, BoxError>;
}

/// Creates an empty [`HashMap`]. The default [`MapFactory`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMap;

impl<Key, Coll> MapFactory<Key, Coll> for DefaultMap
where
    Key: Eq + Hash,
{
    type Map = HashMap<Key, Coll>;

    fn create_map(&mut self) -> Result<Self::Map, BoxError> {
        Ok(HashMap::new())
    }
}

/// Creates an empty [`Vec`] for every key. The default [`CollectionFactory`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCollection;

impl<Key, Value> CollectionFactory<Key, Value> for DefaultCollection {
    type Collection = Vec<Value>;

    fn create_collection(&mut self, _key: &Key) -> Result<Self::Collection, BoxError> {
        Ok(Vec::new())
    }
}

impl<Func, Key, Coll, Map> MapFactory<Key, Coll> for Pure<Func>
where
    Func: FnMut() -> Map,
    Map: Multimap<Key, Coll>,
{
    type Map = Map;

    fn create_map(&mut self) -> Result<Map, BoxError> {
        Ok((self.0)())
    }
}

impl<Func, Key, Coll, Map, E> MapFactory<Key, Coll> for Fallible<Func>
where
    Func: FnMut() -> Result<Map, E>,
    Map: Multimap<Key, Coll>,
    E: Into<BoxError>,
{
    type Map = Map;

    fn create_map(&mut self) -> Result<Map, BoxError> {
        (self.0)().map_err(Into::into)
    }
}

impl<Func, Key, Value, Coll> CollectionFactory<Key, Value> for Pure<Func>
where
    Func: FnMut(&Key) -> Coll,
    Coll: Bucket<Value>,
{
    type Collection = Coll;

    fn create_collection(&mut self, key: &Key) -> Result<Coll, BoxError> {
        Ok((self.0)(key))
    }
}

impl<Func, Key, Value, Coll, E> CollectionFactory<Key, Value> for Fallible<Func>
where
    Func: FnMut(&Key) -> Result<Coll, E>,
    Coll: Bucket<Value>,
    E: Into<BoxError>,
{
    type Collection = Coll;

    fn create_collection(&mut self, key: &Key) -> Result<Coll, BoxError> {
        (self.0)(key).map_err(Into::into)
    }
}
