#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub mod bucket;
pub mod collection;
pub mod error;
pub mod evicting_map;
pub mod factory;
pub mod immediate;
mod invoke;
pub mod iter;
pub mod multimap;
mod relay;
pub mod selector;
pub mod single;
pub mod to_multimap;

pub use bucket::Bucket;
pub use collection::Collection;
pub use error::{BoxError, Error, Panicked, Stage};
pub use evicting_map::EvictingMap;
pub use factory::{CollectionFactory, DefaultCollection, DefaultMap, MapFactory};
use immediate::{Empty, Fail};
use iter::Iter;
pub use multimap::Multimap;
pub use selector::{Fallible, Identity, KeySelector, Pure, ValueSelector};
use single::Single;
use to_multimap::ToMultimap;

/// Handle linking one [`Subscriber`] to the [`Publisher`] it subscribed to.
///
/// Both methods may be called from any thread, at any time, including from inside the
/// subscriber's own callbacks.
pub trait Subscription: Send + Sync {
    /// Signals demand for `n` more items. `n` must be positive.
    fn request(&self, n: u64);

    /// Asks the publisher to stop sending notifications and release its resources.
    ///
    /// Notifications already in flight may still arrive.
    fn cancel(&self);
}

/// Receives the notifications of one subscription.
///
/// Calls are sequential: `on_subscribe` first, then any number of `on_next`, then at most one of
/// `on_error` or `on_complete`.
pub trait Subscriber<T> {
    /// Receives the [`Subscription`] used to request items or cancel.
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>);

    /// Receives the next item.
    fn on_next(&mut self, item: T);

    /// Terminal failure.
    fn on_error(&mut self, error: Error);

    /// Terminal success.
    fn on_complete(&mut self);
}

/// A source of items, delivered to a single [`Subscriber`].
///
/// Subscribing consumes the publisher; clone it (where possible) to subscribe again. Every
/// subscription starts from fresh state.
pub trait Publisher {
    /// The item type.
    type Item;

    /// Starts delivering notifications to `subscriber`.
    fn subscribe<S>(self, subscriber: S)
    where
        S: Subscriber<Self::Item> + Send + 'static;
}

/// Adaptor methods for every [`Publisher`].
pub trait PublisherExt: Publisher + Sized {
    /// Groups all items into a single multimap, keyed by `key_selector`.
    ///
    /// By default values are the items themselves, the mapping is a
    /// [`HashMap`](std::collections::HashMap) and each bucket is a [`Vec`]. See [`ToMultimap`]
    /// to change those.
    fn to_multimap<Func, Key>(self, key_selector: Func) -> ToMultimap<Self, Pure<Func>>
    where
        Func: FnMut(&Self::Item) -> Key,
    {
        ToMultimap::new(self, Pure(key_selector))
    }

    /// Same as [`Self::to_multimap`] but `key_selector` may fail, failing the whole stream.
    fn try_to_multimap<Func, Key, E>(
        self,
        key_selector: Func,
    ) -> ToMultimap<Self, Fallible<Func>>
    where
        Func: FnMut(&Self::Item) -> Result<Key, E>,
        E: Into<BoxError>,
    {
        ToMultimap::new(self, Fallible(key_selector))
    }

    /// Subscribes and resolves to the first item, or the error.
    fn single(self) -> Single<Self::Item>
    where
        Self::Item: Send + 'static,
    {
        Single::new(self)
    }
}
impl<P> PublisherExt for P where P: Publisher {}

/// Creates a [`ToMultimap`] grouping the items of `source` by `key_selector`.
pub fn to_multimap<Source, Func, Key>(
    source: Source,
    key_selector: Func,
) -> ToMultimap<Source, Pure<Func>>
where
    Source: Publisher,
    Func: FnMut(&Source::Item) -> Key,
{
    source.to_multimap(key_selector)
}

/// Creates an [`Iter`] publisher emitting the items of `iter`.
pub fn iter<I>(iter: I) -> Iter<I::IntoIter>
where
    I: IntoIterator,
{
    Iter::new(iter.into_iter())
}

/// Creates an [`Empty`] publisher, which completes immediately.
pub fn empty<T>() -> Empty<T> {
    Empty::new()
}

/// Creates a [`Fail`] publisher, which fails immediately with `error`.
pub fn fail<T>(error: Error) -> Fail<T> {
    Fail::new(error)
}

/// Locks `mutex`, recovering from poisoning. The slots guarded in this crate are single
/// `Option`s which cannot be left half-written.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
