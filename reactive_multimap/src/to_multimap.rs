//! [`ToMultimap`] and related items.
use core::mem;
use std::sync::Arc;

use crate::error::{BoxError, Error, Stage};
use crate::factory::{CollectionFactory, DefaultCollection, DefaultMap, MapFactory};
use crate::invoke::invoke;
use crate::relay::Relay;
use crate::selector::{Fallible, Identity, KeySelector, Pure, ValueSelector};
use crate::{Bucket, Multimap, Publisher, Subscriber, Subscription};

/// Publisher which groups every item of `source` into one multimap, emitted once `source`
/// completes.
///
/// Each item is sent through, in order, the key selector, the collection factory (only for a key
/// without a bucket yet) and the value selector, and the value is appended to the key's bucket.
/// The first failure in any of them, or in `source`, is the stream's only notification: the
/// partially built mapping is never emitted.
///
/// Created with [`PublisherExt::to_multimap`](crate::PublisherExt::to_multimap) and configured
/// with the builder methods below.
#[must_use = "publishers do nothing unless subscribed"]
#[derive(Debug, Clone)]
pub struct ToMultimap<
    Source,
    KeySel,
    ValueSel = Identity,
    MapFac = DefaultMap,
    CollFac = DefaultCollection,
> {
    source: Source,
    key_selector: KeySel,
    value_selector: ValueSel,
    map_factory: MapFac,
    collection_factory: CollFac,
}

impl<Source, KeySel> ToMultimap<Source, KeySel> {
    /// Creates with `source` and `key_selector`, and defaults for everything else.
    pub fn new(source: Source, key_selector: KeySel) -> Self {
        Self {
            source,
            key_selector,
            value_selector: Identity,
            map_factory: DefaultMap,
            collection_factory: DefaultCollection,
        }
    }
}

impl<Source, KeySel, ValueSel, MapFac, CollFac>
    ToMultimap<Source, KeySel, ValueSel, MapFac, CollFac>
where
    Source: Publisher,
    KeySel: KeySelector<Source::Item>,
{
    /// Stores `func(item)` instead of the item itself.
    pub fn values<Func, Value>(
        self,
        func: Func,
    ) -> ToMultimap<Source, KeySel, Pure<Func>, MapFac, CollFac>
    where
        Func: FnMut(Source::Item) -> Value,
    {
        self.value_selector(Pure(func))
    }

    /// Same as [`Self::values`], but `func` may fail.
    pub fn try_values<Func, Value, E>(
        self,
        func: Func,
    ) -> ToMultimap<Source, KeySel, Fallible<Func>, MapFac, CollFac>
    where
        Func: FnMut(Source::Item) -> Result<Value, E>,
        E: Into<BoxError>,
    {
        self.value_selector(Fallible(func))
    }

    /// Replaces the [`ValueSelector`].
    pub fn value_selector<Sel>(
        self,
        value_selector: Sel,
    ) -> ToMultimap<Source, KeySel, Sel, MapFac, CollFac>
    where
        Sel: ValueSelector<Source::Item>,
    {
        ToMultimap {
            source: self.source,
            key_selector: self.key_selector,
            value_selector,
            map_factory: self.map_factory,
            collection_factory: self.collection_factory,
        }
    }

    /// Creates the outer mapping with `func`, once per subscription.
    pub fn map_factory<Func, Map>(
        self,
        func: Func,
    ) -> ToMultimap<Source, KeySel, ValueSel, Pure<Func>, CollFac>
    where
        Func: FnMut() -> Map,
    {
        self.with_map_factory(Pure(func))
    }

    /// Same as [`Self::map_factory`], but `func` may fail.
    pub fn try_map_factory<Func, Map, E>(
        self,
        func: Func,
    ) -> ToMultimap<Source, KeySel, ValueSel, Fallible<Func>, CollFac>
    where
        Func: FnMut() -> Result<Map, E>,
        E: Into<BoxError>,
    {
        self.with_map_factory(Fallible(func))
    }

    /// Replaces the [`MapFactory`].
    pub fn with_map_factory<Fac>(
        self,
        map_factory: Fac,
    ) -> ToMultimap<Source, KeySel, ValueSel, Fac, CollFac> {
        ToMultimap {
            source: self.source,
            key_selector: self.key_selector,
            value_selector: self.value_selector,
            map_factory,
            collection_factory: self.collection_factory,
        }
    }

    /// Creates the bucket of each new key with `func`.
    pub fn collection_factory<Func, Coll>(
        self,
        func: Func,
    ) -> ToMultimap<Source, KeySel, ValueSel, MapFac, Pure<Func>>
    where
        Func: FnMut(&KeySel::Key) -> Coll,
    {
        self.with_collection_factory(Pure(func))
    }

    /// Same as [`Self::collection_factory`], but `func` may fail.
    pub fn try_collection_factory<Func, Coll, E>(
        self,
        func: Func,
    ) -> ToMultimap<Source, KeySel, ValueSel, MapFac, Fallible<Func>>
    where
        Func: FnMut(&KeySel::Key) -> Result<Coll, E>,
        E: Into<BoxError>,
    {
        self.with_collection_factory(Fallible(func))
    }

    /// Replaces the [`CollectionFactory`].
    pub fn with_collection_factory<Fac>(
        self,
        collection_factory: Fac,
    ) -> ToMultimap<Source, KeySel, ValueSel, MapFac, Fac> {
        ToMultimap {
            source: self.source,
            key_selector: self.key_selector,
            value_selector: self.value_selector,
            map_factory: self.map_factory,
            collection_factory,
        }
    }
}

impl<Source, KeySel, ValueSel, MapFac, CollFac> Publisher
    for ToMultimap<Source, KeySel, ValueSel, MapFac, CollFac>
where
    Source: Publisher,
    KeySel: KeySelector<Source::Item> + Send + 'static,
    ValueSel: ValueSelector<Source::Item> + Send + 'static,
    CollFac: CollectionFactory<KeySel::Key, ValueSel::Value> + Send + 'static,
    MapFac: MapFactory<KeySel::Key, CollFac::Collection>,
    MapFac::Map: Send + 'static,
{
    type Item = MapFac::Map;

    fn subscribe<S>(self, subscriber: S)
    where
        S: Subscriber<Self::Item> + Send + 'static,
    {
        let Self {
            source,
            key_selector,
            value_selector,
            mut map_factory,
            collection_factory,
        } = self;

        let relay = Relay::<MapFac::Map, S>::new();
        relay.start(subscriber);

        let map = match invoke(Stage::MapFactory, || map_factory.create_map()) {
            Ok(map) => map,
            Err(error) => {
                tracing::debug!(%error, "Mapping factory failed, not subscribing upstream.");
                relay.error(error);
                return;
            }
        };
        if relay.is_done() {
            tracing::trace!("Cancelled before subscribing upstream.");
            return;
        }

        tracing::trace!("Subscribing upstream.");
        source.subscribe(ToMultimapSubscriber {
            relay,
            accumulator: Accumulator::Accumulating(map),
            key_selector,
            value_selector,
            collection_factory,
        });
    }
}

/// Per-subscription state.
enum Accumulator<Map> {
    /// Receiving items.
    Accumulating(Map),
    /// Upstream completed, the mapping was handed to the relay.
    Completed,
    /// Upstream failed.
    Errored,
    /// A selector or factory failed.
    Failed,
    /// Downstream cancelled.
    Cancelled,
}

impl<Map> Accumulator<Map> {
    /// If upstream itself has already sent a terminal signal.
    fn upstream_terminated(&self) -> bool {
        matches!(self, Self::Completed | Self::Errored)
    }
}

/// The [`Subscriber`] `to_multimap` subscribes upstream with.
struct ToMultimapSubscriber<Map, Down, KeySel, ValueSel, CollFac> {
    relay: Arc<Relay<Map, Down>>,
    accumulator: Accumulator<Map>,
    key_selector: KeySel,
    value_selector: ValueSel,
    collection_factory: CollFac,
}

impl<Map, Down, KeySel, ValueSel, CollFac>
    ToMultimapSubscriber<Map, Down, KeySel, ValueSel, CollFac>
{
    fn accumulate<Item>(
        map: &mut Map,
        item: Item,
        key_selector: &mut KeySel,
        value_selector: &mut ValueSel,
        collection_factory: &mut CollFac,
    ) -> Result<(), Error>
    where
        KeySel: KeySelector<Item>,
        ValueSel: ValueSelector<Item>,
        CollFac: CollectionFactory<KeySel::Key, ValueSel::Value>,
        Map: Multimap<KeySel::Key, CollFac::Collection>,
    {
        let key = invoke(Stage::KeySelector, || key_selector.select_key(&item))?;
        let bucket = map.bucket_or_try_insert_with(key, |key| {
            invoke(Stage::CollectionFactory, || {
                collection_factory.create_collection(key)
            })
        })?;
        let value = invoke(Stage::ValueSelector, || value_selector.select_value(item))?;
        bucket.append(value);
        Ok(())
    }

    /// Leaves `accumulator` unchanged if it was already terminated, logging the dropped signal.
    fn terminate(&mut self, next: Accumulator<Map>, signal: &str) -> Option<Map> {
        match mem::replace(&mut self.accumulator, next) {
            Accumulator::Accumulating(map) => Some(map),
            previous => {
                if previous.upstream_terminated() {
                    tracing::warn!(signal, "Upstream sent a second terminal signal, ignoring.");
                } else {
                    tracing::debug!(signal, "Dropping upstream signal after termination.");
                }
                self.accumulator = previous;
                None
            }
        }
    }
}

impl<Item, Map, Down, KeySel, ValueSel, CollFac> Subscriber<Item>
    for ToMultimapSubscriber<Map, Down, KeySel, ValueSel, CollFac>
where
    KeySel: KeySelector<Item>,
    ValueSel: ValueSelector<Item>,
    CollFac: CollectionFactory<KeySel::Key, ValueSel::Value>,
    Map: Multimap<KeySel::Key, CollFac::Collection>,
    Down: Subscriber<Map>,
{
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        if self.relay.set_upstream(Arc::clone(&subscription)) {
            subscription.request(u64::MAX);
        }
    }

    fn on_next(&mut self, item: Item) {
        if self.relay.is_done() && matches!(self.accumulator, Accumulator::Accumulating(_)) {
            tracing::debug!("Downstream is done, discarding the partial mapping.");
            self.accumulator = Accumulator::Cancelled;
        }
        let Accumulator::Accumulating(map) = &mut self.accumulator else {
            tracing::trace!("Dropping item after termination.");
            return;
        };

        let result = Self::accumulate(
            map,
            item,
            &mut self.key_selector,
            &mut self.value_selector,
            &mut self.collection_factory,
        );
        if let Err(error) = result {
            tracing::debug!(%error, "Failing fast, discarding the partial mapping.");
            self.accumulator = Accumulator::Failed;
            self.relay.cancel_upstream();
            self.relay.error(error);
        }
    }

    fn on_error(&mut self, error: Error) {
        if self.terminate(Accumulator::Errored, "on_error").is_some() {
            self.relay.release_upstream();
            self.relay.error(error);
        }
    }

    fn on_complete(&mut self) {
        if let Some(map) = self.terminate(Accumulator::Completed, "on_complete") {
            self.relay.release_upstream();
            self.relay.complete(map);
        }
    }
}
