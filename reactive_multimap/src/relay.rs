//! [`Relay`], the subscription handed downstream by `to_multimap`.
//!
//! All flags live in one atomic word. Setting [`TERMINATED`] with a compare-exchange is the only
//! way to gain the right to send a terminal signal, so at most one is ever sent and a concurrent
//! cancellation either prevents the emission or comes after it.
use core::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use crate::{Error, Subscriber, Subscription, lock};

/// Downstream has requested at least one item.
const REQUESTED: u8 = 0b0001;
/// The finished value is parked in `value`, waiting for a request.
const HAS_VALUE: u8 = 0b0010;
/// A terminal signal has been claimed.
const TERMINATED: u8 = 0b0100;
/// Downstream cancelled.
const CANCELLED: u8 = 0b1000;

/// A terminal signal, sent as a single unit.
enum Terminal<T> {
    /// `on_next` then `on_complete`.
    Value(T),
    Error(Error),
}
impl<T> Terminal<T> {
    fn deliver<S>(self, subscriber: &mut S)
    where
        S: Subscriber<T>,
    {
        match self {
            Self::Value(value) => {
                subscriber.on_next(value);
                subscriber.on_complete();
            }
            Self::Error(error) => subscriber.on_error(error),
        }
    }
}

pub(crate) struct Relay<T, S> {
    state: AtomicU8,
    value: Mutex<Option<T>>,
    upstream: Mutex<Option<Arc<dyn Subscription>>>,
    /// Empty before [`Self::start`], during `on_subscribe`, and after the terminal signal.
    downstream: Mutex<Option<S>>,
    /// Terminal signal raised while `downstream` was out of its slot.
    queued: Mutex<Option<Terminal<T>>>,
}

impl<T, S> Relay<T, S>
where
    S: Subscriber<T>,
{
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            state: AtomicU8::new(0),
            value: Mutex::new(None),
            upstream: Mutex::new(None),
            downstream: Mutex::new(None),
            queued: Mutex::new(None),
        })
    }

    /// Hands this relay to `downstream`, then parks `downstream` to receive the terminal signal.
    pub(crate) fn start(self: &Arc<Self>, mut downstream: S)
    where
        T: Send + 'static,
        S: Send + 'static,
    {
        downstream.on_subscribe(Arc::clone(self) as Arc<dyn Subscription>);

        let mut slot = lock(&self.downstream);
        let queued = lock(&self.queued).take();
        if let Some(signal) = queued {
            drop(slot);
            signal.deliver(&mut downstream);
        } else if 0 == self.state.load(Ordering::Acquire) & CANCELLED {
            *slot = Some(downstream);
        }
    }

    /// If downstream has cancelled or a terminal signal was claimed.
    pub(crate) fn is_done(&self) -> bool {
        0 != self.state.load(Ordering::Acquire) & (TERMINATED | CANCELLED)
    }

    /// Stores the upstream subscription, returns `false` (and cancels it) if it must not be used.
    pub(crate) fn set_upstream(&self, upstream: Arc<dyn Subscription>) -> bool {
        let mut slot = lock(&self.upstream);
        if slot.is_some() {
            drop(slot);
            tracing::warn!("Received a second upstream subscription, cancelling it.");
            upstream.cancel();
            false
        } else if self.is_done() {
            drop(slot);
            tracing::debug!("Received upstream subscription after termination, cancelling it.");
            upstream.cancel();
            false
        } else {
            *slot = Some(upstream);
            true
        }
    }

    /// Cancels upstream, used when failing fast.
    pub(crate) fn cancel_upstream(&self) {
        let upstream = lock(&self.upstream).take();
        if let Some(upstream) = upstream {
            upstream.cancel();
        }
    }

    /// Forgets upstream, used once it has terminated on its own.
    pub(crate) fn release_upstream(&self) {
        drop(lock(&self.upstream).take());
    }

    /// Emits `value` then completion, as soon as downstream has requested.
    pub(crate) fn complete(&self, value: T) {
        // Park first: a racing `request` that observes `HAS_VALUE` must find the value.
        *lock(&self.value) = Some(value);

        let mut state = self.state.load(Ordering::Acquire);
        loop {
            if 0 != state & (TERMINATED | CANCELLED) {
                tracing::debug!("Dropping finished value, downstream is done.");
                drop(lock(&self.value).take());
                return;
            }
            let next = if 0 != state & REQUESTED {
                state | TERMINATED
            } else {
                state | HAS_VALUE
            };
            match self.state.compare_exchange_weak(
                state,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    if 0 != next & TERMINATED {
                        self.emit_parked();
                    }
                    return;
                }
                Err(actual) => state = actual,
            }
        }
    }

    /// Sends the parked value, after `TERMINATED` was claimed alongside `REQUESTED`.
    fn emit_parked(&self) {
        let value = lock(&self.value).take();
        if let Some(value) = value {
            tracing::trace!("Emitting finished value.");
            self.deliver(Terminal::Value(value));
        }
    }

    /// Emits `error` unless a terminal signal was already sent or downstream cancelled.
    pub(crate) fn error(&self, error: Error) {
        if !self.try_terminate() {
            tracing::debug!(%error, "Dropping error, downstream is done.");
            return;
        }
        drop(lock(&self.value).take());
        self.deliver(Terminal::Error(error));
    }

    fn try_terminate(&self) -> bool {
        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| {
                (0 == state & (TERMINATED | CANCELLED)).then_some(state | TERMINATED)
            })
            .is_ok()
    }

    fn deliver(&self, signal: Terminal<T>) {
        let mut slot = lock(&self.downstream);
        if let Some(mut downstream) = slot.take() {
            drop(slot);
            signal.deliver(&mut downstream);
        } else {
            *lock(&self.queued) = Some(signal);
        }
    }
}

impl<T, S> Subscription for Relay<T, S>
where
    T: Send,
    S: Subscriber<T> + Send,
{
    fn request(&self, n: u64) {
        if 0 == n {
            tracing::warn!("Received a request for zero items.");
            if self.try_terminate() {
                self.cancel_upstream();
                drop(lock(&self.value).take());
                self.deliver(Terminal::Error(Error::InvalidRequest(n)));
            }
            return;
        }

        let mut state = self.state.load(Ordering::Acquire);
        loop {
            if 0 != state & (REQUESTED | TERMINATED | CANCELLED) {
                return;
            }
            let next = if 0 != state & HAS_VALUE {
                state | REQUESTED | TERMINATED
            } else {
                state | REQUESTED
            };
            match self.state.compare_exchange_weak(
                state,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    if 0 != next & TERMINATED {
                        self.emit_parked();
                    }
                    return;
                }
                Err(actual) => state = actual,
            }
        }
    }

    fn cancel(&self) {
        let prev = self.state.fetch_or(CANCELLED, Ordering::AcqRel);
        if 0 != prev & (TERMINATED | CANCELLED) {
            return;
        }
        tracing::trace!("Downstream cancelled.");
        self.cancel_upstream();
        drop(lock(&self.value).take());
        // Breaks the `downstream -> relay -> downstream` cycle.
        let downstream = lock(&self.downstream).take();
        drop(downstream);
    }
}
