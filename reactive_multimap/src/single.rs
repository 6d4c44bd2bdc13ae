//! [`Single`] consuming future.
use core::pin::Pin;
use core::task::{Context, Poll, ready};
use std::sync::{Arc, Mutex};

use futures::channel::oneshot;
use pin_project_lite::pin_project;

use crate::{Error, Publisher, Subscriber, Subscription, lock};

type SharedSubscription = Arc<Mutex<Option<Arc<dyn Subscription>>>>;

pin_project! {
    /// [`Future`] resolving to the first item of a [`Publisher`], or its error.
    ///
    /// Requests a single item and cancels the subscription once it arrives. Resolves to
    /// [`Error::NoValue`] if the publisher completes empty. Dropping the future cancels the
    /// subscription.
    #[must_use = "futures do nothing unless polled"]
    pub struct Single<T> {
        #[pin]
        receiver: oneshot::Receiver<Result<T, Error>>,
        subscription: SharedSubscription,
    }

    impl<T> PinnedDrop for Single<T> {
        fn drop(this: Pin<&mut Self>) {
            cancel(this.project().subscription);
        }
    }
}

impl<T> Single<T>
where
    T: Send + 'static,
{
    /// Subscribes to `publisher`.
    pub fn new<P>(publisher: P) -> Self
    where
        P: Publisher<Item = T>,
    {
        let (sender, receiver) = oneshot::channel();
        let subscription = SharedSubscription::default();
        publisher.subscribe(SingleSubscriber {
            sender: Some(sender),
            subscription: Arc::clone(&subscription),
        });
        Self {
            receiver,
            subscription,
        }
    }
}

impl<T> Future for Single<T> {
    type Output = Result<T, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let result = ready!(self.project().receiver.poll(cx));
        Poll::Ready(result.unwrap_or(Err(Error::NoValue)))
    }
}

fn cancel(subscription: &Mutex<Option<Arc<dyn Subscription>>>) {
    let subscription = lock(subscription).take();
    if let Some(subscription) = subscription {
        subscription.cancel();
    }
}

struct SingleSubscriber<T> {
    sender: Option<oneshot::Sender<Result<T, Error>>>,
    subscription: SharedSubscription,
}

impl<T> SingleSubscriber<T> {
    fn resolve(&mut self, result: Result<T, Error>) {
        if let Some(sender) = self.sender.take() {
            // Receiver gone means nobody is waiting.
            let _ = sender.send(result);
        }
    }
}

impl<T> Subscriber<T> for SingleSubscriber<T> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        *lock(&self.subscription) = Some(Arc::clone(&subscription));
        subscription.request(1);
    }

    fn on_next(&mut self, item: T) {
        self.resolve(Ok(item));
        cancel(&self.subscription);
    }

    fn on_error(&mut self, error: Error) {
        self.resolve(Err(error));
        drop(lock(&self.subscription).take());
    }

    fn on_complete(&mut self) {
        self.resolve(Err(Error::NoValue));
        drop(lock(&self.subscription).take());
    }
}
