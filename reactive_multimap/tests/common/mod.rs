//! Recording subscriber and hand-driven publisher shared by the integration tests.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use reactive_multimap::{Error, Publisher, Subscriber, Subscription};

/// Installs a log subscriber honoring `RUST_LOG`, once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// One received notification. Errors are kept as their display string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<T> {
    Next(T),
    Error(String),
    Complete,
}

/// Subscriber recording every notification, optionally requesting on subscribe.
pub struct Recorder<T> {
    initial_request: Option<u64>,
    cancel_on_subscribe: bool,
    shared: Arc<RecorderShared<T>>,
}

pub struct RecorderShared<T> {
    events: Mutex<Vec<Event<T>>>,
    subscription: Mutex<Option<Arc<dyn Subscription>>>,
    subscribed: AtomicBool,
}

/// Test-side handle to a [`Recorder`].
pub struct Recorded<T>(Arc<RecorderShared<T>>);

impl<T> Recorded<T> {
    pub fn take(&self) -> Vec<Event<T>> {
        std::mem::take(&mut *self.0.events.lock().unwrap())
    }

    pub fn subscribed(&self) -> bool {
        self.0.subscribed.load(Ordering::SeqCst)
    }

    pub fn request(&self, n: u64) {
        let subscription = self.0.subscription.lock().unwrap().clone().unwrap();
        subscription.request(n);
    }

    pub fn cancel(&self) {
        let subscription = self.0.subscription.lock().unwrap().clone().unwrap();
        subscription.cancel();
    }
}

/// Records everything, requesting `initial_request` items on subscribe if set.
pub fn recorder<T>(initial_request: Option<u64>) -> (Recorder<T>, Recorded<T>) {
    let shared = Arc::new(RecorderShared {
        events: Mutex::new(Vec::new()),
        subscription: Mutex::new(None),
        subscribed: AtomicBool::new(false),
    });
    (
        Recorder {
            initial_request,
            cancel_on_subscribe: false,
            shared: shared.clone(),
        },
        Recorded(shared),
    )
}

/// Records everything, cancelling from inside `on_subscribe`.
pub fn cancelling_recorder<T>() -> (Recorder<T>, Recorded<T>) {
    let (mut recorder, recorded) = recorder(None);
    recorder.cancel_on_subscribe = true;
    (recorder, recorded)
}

impl<T> Subscriber<T> for Recorder<T> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        self.shared.subscribed.store(true, Ordering::SeqCst);
        *self.shared.subscription.lock().unwrap() = Some(subscription.clone());
        if self.cancel_on_subscribe {
            subscription.cancel();
        } else if let Some(n) = self.initial_request {
            subscription.request(n);
        }
    }

    fn on_next(&mut self, item: T) {
        self.shared.events.lock().unwrap().push(Event::Next(item));
    }

    fn on_error(&mut self, error: Error) {
        self.shared
            .events
            .lock()
            .unwrap()
            .push(Event::Error(error.to_string()));
    }

    fn on_complete(&mut self) {
        self.shared.events.lock().unwrap().push(Event::Complete);
    }
}

/// Publisher driven by hand from the test, recording the demand and cancellation it receives.
pub struct Manual<T> {
    shared: Arc<ManualShared<T>>,
}

pub struct ManualShared<T> {
    subscriber: Mutex<Option<Box<dyn Subscriber<T> + Send>>>,
    requested: AtomicU64,
    cancelled: AtomicBool,
}

/// Test-side handle to a [`Manual`] publisher.
pub struct ManualHandle<T>(Arc<ManualShared<T>>);

pub fn manual<T>() -> (Manual<T>, ManualHandle<T>) {
    let shared = Arc::new(ManualShared {
        subscriber: Mutex::new(None),
        requested: AtomicU64::new(0),
        cancelled: AtomicBool::new(false),
    });
    (
        Manual {
            shared: shared.clone(),
        },
        ManualHandle(shared),
    )
}

struct ManualSubscription<T>(Arc<ManualShared<T>>);

impl<T> Subscription for ManualSubscription<T>
where
    T: 'static,
{
    fn request(&self, n: u64) {
        self.0.requested.fetch_add(n.min(u64::MAX / 2), Ordering::SeqCst);
    }

    fn cancel(&self) {
        self.0.cancelled.store(true, Ordering::SeqCst);
    }
}

impl<T> Publisher for Manual<T>
where
    T: 'static,
{
    type Item = T;

    fn subscribe<S>(self, mut subscriber: S)
    where
        S: Subscriber<T> + Send + 'static,
    {
        subscriber.on_subscribe(Arc::new(ManualSubscription(self.shared.clone())));
        *self.shared.subscriber.lock().unwrap() = Some(Box::new(subscriber));
    }
}

impl<T> ManualHandle<T> {
    pub fn subscribed(&self) -> bool {
        self.0.subscriber.lock().unwrap().is_some()
    }

    pub fn requested(&self) -> u64 {
        self.0.requested.load(Ordering::SeqCst)
    }

    pub fn cancelled(&self) -> bool {
        self.0.cancelled.load(Ordering::SeqCst)
    }

    pub fn next(&self, item: T) {
        self.0.subscriber.lock().unwrap().as_mut().unwrap().on_next(item);
    }

    pub fn error(&self, error: Error) {
        self.0
            .subscriber
            .lock()
            .unwrap()
            .as_mut()
            .unwrap()
            .on_error(error);
    }

    pub fn complete(&self) {
        self.0
            .subscriber
            .lock()
            .unwrap()
            .as_mut()
            .unwrap()
            .on_complete();
    }
}
