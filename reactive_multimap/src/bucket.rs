//! [`Bucket`] capability and its implementations.
use core::hash::{BuildHasher, Hash};
use std::collections::{BTreeSet, HashSet, VecDeque};

/// A per-key collection the `to_multimap` operator appends values to, in arrival order.
///
/// What "append" means is up to the collection: sequences keep every value, sets drop
/// duplicates.
pub trait Bucket<Value> {
    /// Appends `value`.
    fn append(&mut self, value: Value);
}

impl<Value> Bucket<Value> for Vec<Value> {
    fn append(&mut self, value: Value) {
        self.push(value);
    }
}

impl<Value> Bucket<Value> for VecDeque<Value> {
    fn append(&mut self, value: Value) {
        self.push_back(value);
    }
}

impl<Value, S> Bucket<Value> for HashSet<Value, S>
where
    Value: Eq + Hash,
    S: BuildHasher,
{
    fn append(&mut self, value: Value) {
        self.insert(value);
    }
}

impl<Value> Bucket<Value> for BTreeSet<Value>
where
    Value: Ord,
{
    fn append(&mut self, value: Value) {
        self.insert(value);
    }
}

#[cfg(feature = "smallvec")]
#[cfg_attr(docsrs, doc(cfg(feature = "smallvec")))]
impl<A> Bucket<A::Item> for smallvec::SmallVec<A>
where
    A: smallvec::Array,
{
    fn append(&mut self, value: A::Item) {
        self.push(value);
    }
}
