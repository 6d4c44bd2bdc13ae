//! [`KeySelector`], [`ValueSelector`] and the closure wrappers implementing them.

use crate::error::BoxError;

/// Derives the grouping key of an element.
pub trait KeySelector<T> {
    /// The key type.
    type Key;

    /// Selects the key for `item`.
    fn select_key(&mut self, item: &T) -> Result<Self::Key, BoxError>;
}

/// Derives the value stored in a bucket from an element.
pub trait ValueSelector<T> {
    /// The stored value type.
    type Value;

    /// Selects the stored value for `item`.
    fn select_value(&mut self, item: T) -> Result<Self::Value, BoxError>;
}

/// Stores each element as-is. The default [`ValueSelector`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl<T> ValueSelector<T> for Identity {
    type Value = T;

    fn select_value(&mut self, item: T) -> Result<T, BoxError> {
        Ok(item)
    }
}

/// Wraps a closure which cannot fail, e.g. `|s: &&str| s.len()`.
///
/// Implements [`KeySelector`], [`ValueSelector`], [`MapFactory`](crate::MapFactory) and
/// [`CollectionFactory`](crate::CollectionFactory) depending on the closure's signature.
#[derive(Debug, Clone, Copy)]
pub struct Pure<Func>(pub Func);

/// Wraps a closure returning `Result<_, E>`, where `E` converts into a [`BoxError`].
///
/// Implements the same traits as [`Pure`].
#[derive(Debug, Clone, Copy)]
pub struct Fallible<Func>(pub Func);

impl<Func, T, Key> KeySelector<T> for Pure<Func>
where
    Func: FnMut(&T) -> Key,
{
    type Key = Key;

    fn select_key(&mut self, item: &T) -> Result<Key, BoxError> {
        Ok((self.0)(item))
    }
}

impl<Func, T, Key, E> KeySelector<T> for Fallible<Func>
where
    Func: FnMut(&T) -> Result<Key, E>,
    E: Into<BoxError>,
{
    type Key = Key;

    fn select_key(&mut self, item: &T) -> Result<Key, BoxError> {
        (self.0)(item).map_err(Into::into)
    }
}

impl<Func, T, Value> ValueSelector<T> for Pure<Func>
where
    Func: FnMut(T) -> Value,
{
    type Value = Value;

    fn select_value(&mut self, item: T) -> Result<Value, BoxError> {
        Ok((self.0)(item))
    }
}

impl<Func, T, Value, E> ValueSelector<T> for Fallible<Func>
where
    Func: FnMut(T) -> Result<Value, E>,
    E: Into<BoxError>,
{
    type Value = Value;

    fn select_value(&mut self, item: T) -> Result<Value, BoxError> {
        (self.0)(item).map_err(Into::into)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_pure_key() {
        let mut len = Pure(|s: &&str| s.len());
        assert_eq!(2, len.select_key(&"cc").unwrap());
    }

    #[test]
    fn test_fallible_value() {
        let mut dup = Fallible(|s: &str| {
            if "b" == s {
                Err("Forced failure")
            } else {
                Ok(format!("{s}{s}"))
            }
        });
        assert_eq!("aa", dup.select_value("a").unwrap());
        assert_eq!("Forced failure", dup.select_value("b").unwrap_err().to_string());
    }

    #[test]
    fn test_identity() {
        assert_eq!(7, Identity.select_value(7).unwrap());
    }
}
