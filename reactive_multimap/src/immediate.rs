//! [`Empty`] and [`Fail`], publishers which terminate right after subscription.
use core::marker::PhantomData;
use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::{Error, Publisher, Subscriber, Subscription};

/// Subscription with nothing to deliver, only remembering cancellation.
#[derive(Debug, Default)]
struct Inert {
    cancelled: AtomicBool,
}
impl Subscription for Inert {
    fn request(&self, n: u64) {
        if 0 == n {
            tracing::warn!("Received a request for zero items.");
        }
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

/// Calls `on_subscribe`, returning `true` if the subscriber did not cancel during it.
fn start<T, S>(subscriber: &mut S) -> bool
where
    S: Subscriber<T>,
{
    let subscription = Arc::new(Inert::default());
    subscriber.on_subscribe(Arc::clone(&subscription) as Arc<dyn Subscription>);
    !subscription.cancelled.load(Ordering::Acquire)
}

/// [`Publisher`] which completes without emitting anything.
#[must_use = "publishers do nothing unless subscribed"]
pub struct Empty<T> {
    _phantom: PhantomData<fn() -> T>,
}
impl<T> Empty<T> {
    /// Create a new [`Empty`].
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}
impl<T> Default for Empty<T> {
    fn default() -> Self {
        Self::new()
    }
}
impl<T> Clone for Empty<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}
impl<T> Publisher for Empty<T> {
    type Item = T;

    fn subscribe<S>(self, mut subscriber: S)
    where
        S: Subscriber<T> + Send + 'static,
    {
        if start::<T, S>(&mut subscriber) {
            subscriber.on_complete();
        }
    }
}

/// [`Publisher`] which fails with the given error without emitting anything.
#[must_use = "publishers do nothing unless subscribed"]
pub struct Fail<T> {
    error: Error,
    _phantom: PhantomData<fn() -> T>,
}
impl<T> Fail<T> {
    /// Create with the `error` to fail with.
    pub fn new(error: Error) -> Self {
        Self {
            error,
            _phantom: PhantomData,
        }
    }
}
impl<T> Publisher for Fail<T> {
    type Item = T;

    fn subscribe<S>(self, mut subscriber: S)
    where
        S: Subscriber<T> + Send + 'static,
    {
        if start::<T, S>(&mut subscriber) {
            subscriber.on_error(self.error);
        }
    }
}
