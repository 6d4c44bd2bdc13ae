//! [`Iter`] and related items.
use core::iter::Peekable;
use core::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::{Error, Publisher, Subscriber, Subscription, lock};

/// [`Publisher`] emitting the items of an [`Iterator`], as requested.
///
/// Completes as soon as the iterator is exhausted, without waiting for more demand.
#[must_use = "publishers do nothing unless subscribed"]
#[derive(Debug, Clone)]
pub struct Iter<I> {
    iter: I,
}

impl<I> Iter<I> {
    /// Create from `iter`.
    pub fn new(iter: I) -> Self {
        Self { iter }
    }
}

impl<I> Publisher for Iter<I>
where
    I: Iterator + Send + 'static,
    I::Item: Send,
{
    type Item = I::Item;

    fn subscribe<S>(self, subscriber: S)
    where
        S: Subscriber<Self::Item> + Send + 'static,
    {
        let subscription = Arc::new(IterSubscription {
            requested: AtomicU64::new(0),
            // Held by this call until the first drain pass below.
            wip: AtomicUsize::new(1),
            cancelled: AtomicBool::new(false),
            invalid_request: AtomicBool::new(false),
            inner: Mutex::new(None),
        });

        let mut subscriber = subscriber;
        subscriber.on_subscribe(Arc::clone(&subscription) as Arc<dyn Subscription>);
        *lock(&subscription.inner) = Some(IterState {
            iter: self.iter.peekable(),
            subscriber,
        });
        subscription.drain(1);
    }
}

struct IterState<I, S>
where
    I: Iterator,
{
    iter: Peekable<I>,
    subscriber: S,
}

struct IterSubscription<I, S>
where
    I: Iterator,
{
    /// Outstanding demand, `u64::MAX` is unbounded.
    requested: AtomicU64,
    /// Number of drain requests not yet handled, the thread incrementing it from zero drains.
    wip: AtomicUsize,
    cancelled: AtomicBool,
    invalid_request: AtomicBool,
    /// `None` before `on_subscribe` returns and after the terminal signal.
    inner: Mutex<Option<IterState<I, S>>>,
}

impl<I, S> IterSubscription<I, S>
where
    I: Iterator,
    S: Subscriber<I::Item>,
{
    fn schedule(&self) {
        if 0 == self.wip.fetch_add(1, Ordering::AcqRel) {
            self.drain(1);
        }
    }

    fn drain(&self, mut missed: usize) {
        loop {
            self.drain_once();
            missed = self.wip.fetch_sub(missed, Ordering::AcqRel) - missed;
            if 0 == missed {
                return;
            }
        }
    }

    fn drain_once(&self) {
        let mut inner = lock(&self.inner);
        let Some(state) = inner.as_mut() else {
            return;
        };

        if self.invalid_request.load(Ordering::Acquire) {
            self.cancelled.store(true, Ordering::Release);
            state.subscriber.on_error(Error::InvalidRequest(0));
            *inner = None;
            return;
        }

        let requested = self.requested.load(Ordering::Acquire);
        let mut emitted = 0;
        let finished = loop {
            if self.cancelled.load(Ordering::Acquire) {
                break true;
            }
            if state.iter.peek().is_none() {
                state.subscriber.on_complete();
                break true;
            }
            if emitted == requested {
                break false;
            }
            if let Some(item) = state.iter.next() {
                state.subscriber.on_next(item);
                emitted += 1;
            }
        };

        if finished {
            *inner = None;
        } else if u64::MAX != requested {
            self.requested.fetch_sub(emitted, Ordering::AcqRel);
        }
    }
}

impl<I, S> Subscription for IterSubscription<I, S>
where
    I: Iterator + Send,
    I::Item: Send,
    S: Subscriber<I::Item> + Send,
{
    fn request(&self, n: u64) {
        if 0 == n {
            tracing::warn!("Received a request for zero items.");
            self.invalid_request.store(true, Ordering::Release);
        } else {
            let _ = self
                .requested
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |requested| {
                    Some(requested.saturating_add(n))
                });
        }
        self.schedule();
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.schedule();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Default)]
    struct Shared {
        items: Mutex<Vec<u32>>,
        terminal: Mutex<Option<String>>,
        subscription: Mutex<Option<Arc<dyn Subscription>>>,
    }

    /// Requests one more item from inside every `on_next` if `chained`.
    struct Collect {
        shared: Arc<Shared>,
        chained: bool,
    }

    impl Subscriber<u32> for Collect {
        fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
            if self.chained {
                subscription.request(1);
            }
            *self.shared.subscription.lock().unwrap() = Some(subscription);
        }

        fn on_next(&mut self, item: u32) {
            self.shared.items.lock().unwrap().push(item);
            if self.chained {
                let subscription = self.shared.subscription.lock().unwrap().clone();
                subscription.unwrap().request(1);
            }
        }

        fn on_error(&mut self, error: Error) {
            *self.shared.terminal.lock().unwrap() = Some(error.to_string());
        }

        fn on_complete(&mut self) {
            *self.shared.terminal.lock().unwrap() = Some("complete".to_owned());
        }
    }

    fn subscribe(items: core::ops::Range<u32>, chained: bool) -> Arc<Shared> {
        let shared = Arc::new(Shared::default());
        Iter::new(items).subscribe(Collect {
            shared: Arc::clone(&shared),
            chained,
        });
        shared
    }

    fn request(shared: &Shared, n: u64) {
        let subscription = shared.subscription.lock().unwrap().clone();
        subscription.unwrap().request(n);
    }

    #[test]
    fn test_bounded_demand() {
        let shared = subscribe(0..5, false);
        assert!(shared.items.lock().unwrap().is_empty());

        request(&shared, 2);
        assert_eq!(vec![0, 1], *shared.items.lock().unwrap());
        assert_eq!(None, *shared.terminal.lock().unwrap());

        request(&shared, 10);
        assert_eq!(vec![0, 1, 2, 3, 4], *shared.items.lock().unwrap());
        assert_eq!(Some("complete"), shared.terminal.lock().unwrap().as_deref());
    }

    #[test]
    fn test_exhausted_completes_without_demand() {
        let shared = subscribe(0..2, false);
        request(&shared, 2);
        assert_eq!(Some("complete"), shared.terminal.lock().unwrap().as_deref());

        let shared = subscribe(0..0, false);
        assert_eq!(Some("complete"), shared.terminal.lock().unwrap().as_deref());
    }

    #[test]
    fn test_reentrant_requests() {
        let shared = subscribe(0..10_000, true);
        assert_eq!(10_000, shared.items.lock().unwrap().len());
        assert_eq!(Some("complete"), shared.terminal.lock().unwrap().as_deref());
    }

    #[test]
    fn test_cancel() {
        let shared = subscribe(0..5, false);
        request(&shared, 1);
        shared.subscription.lock().unwrap().clone().unwrap().cancel();
        request(&shared, 10);
        assert_eq!(vec![0], *shared.items.lock().unwrap());
        assert_eq!(None, *shared.terminal.lock().unwrap());
    }

    #[test]
    fn test_zero_request() {
        let shared = subscribe(0..5, false);
        request(&shared, 0);
        assert!(shared.items.lock().unwrap().is_empty());
        assert_eq!(
            Some(Error::InvalidRequest(0).to_string()),
            *shared.terminal.lock().unwrap()
        );
    }
}
