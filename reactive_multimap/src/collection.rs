//! [`Collection`], a bucket whose kind is picked per key at runtime.
use core::hash::Hash;
use std::collections::HashSet;

use crate::Bucket;

/// A bucket that is either a sequence or a set.
///
/// Lets a single [`CollectionFactory`](crate::CollectionFactory) choose a different container
/// kind depending on the key:
///
/// ```rust
/// use reactive_multimap::Collection;
///
/// let factory = |len: &usize| {
///     if 2 == *len {
///         Collection::sequence()
///     } else {
///         Collection::set()
///     }
/// };
/// # let _: Collection<&str> = factory(&2);
/// ```
#[derive(Debug, Clone)]
pub enum Collection<Value> {
    /// Keeps every value in arrival order.
    Sequence(Vec<Value>),
    /// Keeps each distinct value once.
    Set(HashSet<Value>),
}

impl<Value> Collection<Value> {
    /// An empty [`Collection::Sequence`].
    pub fn sequence() -> Self {
        Self::Sequence(Vec::new())
    }

    /// An empty [`Collection::Set`].
    pub fn set() -> Self {
        Self::Set(HashSet::new())
    }

    /// The number of values held.
    pub fn len(&self) -> usize {
        match self {
            Self::Sequence(vec) => vec.len(),
            Self::Set(set) => set.len(),
        }
    }

    /// If no values are held.
    pub fn is_empty(&self) -> bool {
        0 == self.len()
    }

    /// Iterates the values. Sequence order is arrival order, set order is unspecified.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        match self {
            Self::Sequence(vec) => Box::new(vec.iter()),
            Self::Set(set) => Box::new(set.iter()),
        }
    }
}

impl<Value> Bucket<Value> for Collection<Value>
where
    Value: Eq + Hash,
{
    fn append(&mut self, value: Value) {
        match self {
            Self::Sequence(vec) => vec.push(value),
            Self::Set(set) => {
                set.insert(value);
            }
        }
    }
}

impl<Value> PartialEq for Collection<Value>
where
    Value: Eq + Hash,
{
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Sequence(a), Self::Sequence(b)) => a == b,
            (Self::Set(a), Self::Set(b)) => a == b,
            _ => false,
        }
    }
}
impl<Value> Eq for Collection<Value> where Value: Eq + Hash {}

impl<Value> From<Vec<Value>> for Collection<Value> {
    fn from(vec: Vec<Value>) -> Self {
        Self::Sequence(vec)
    }
}

impl<Value> From<HashSet<Value>> for Collection<Value> {
    fn from(set: HashSet<Value>) -> Self {
        Self::Set(set)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_per_kind_append() {
        let mut seq = Collection::sequence();
        let mut set = Collection::set();
        for s in ["eee", "eee"] {
            seq.append(s);
            set.append(s);
        }
        assert_eq!(Collection::from(vec!["eee", "eee"]), seq);
        assert_eq!(Collection::from(HashSet::from(["eee"])), set);
        assert_eq!(1, set.len());
        assert_eq!(vec![&"eee", &"eee"], seq.iter().collect::<Vec<_>>());
        assert_eq!(vec![&"eee"], set.iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_is_empty() {
        let mut set = Collection::set();
        assert!(set.is_empty());
        set.append(1);
        assert!(!set.is_empty());
        assert!(Collection::<u8>::sequence().is_empty());
    }

    #[test]
    fn test_kinds_never_equal() {
        assert_ne!(Collection::<u8>::sequence(), Collection::set());
    }
}
