//! Live full-snapshot feeds
//!
//! Each stream (markers, and one per definition kind) keeps its own
//! sequence number. Loading a snapshot, numbering it and delivering it all
//! happen under one publish lock, so sequence order always matches data
//! order even with concurrent writers.

use crate::error::Result;
use mapsync_core::{Definition, DefinitionKind, MarkerInstance, Snapshot, SnapshotSink, Subscription};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

type Registered<T> = Vec<(u64, SnapshotSink<T>)>;

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    markers: Registered<MarkerInstance>,
    definitions: HashMap<DefinitionKind, Registered<Definition>>,
}

impl Subscribers {
    fn remove(&mut self, id: u64) {
        self.markers.retain(|(sid, _)| *sid != id);
        for sinks in self.definitions.values_mut() {
            sinks.retain(|(sid, _)| *sid != id);
        }
    }
}

#[derive(Default)]
struct Sequences {
    markers: u64,
    definitions: HashMap<DefinitionKind, u64>,
}

#[derive(Default)]
pub(crate) struct Feeds {
    subscribers: Arc<Mutex<Subscribers>>,
    publish: Mutex<Sequences>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Feeds {
    /// Register a marker sink and hand it the current snapshot
    pub fn subscribe_markers(
        &self,
        sink: SnapshotSink<MarkerInstance>,
        load: impl FnOnce() -> Result<Vec<MarkerInstance>>,
    ) -> Result<Subscription> {
        let seqs = lock(&self.publish);
        let records = load()?;
        let id = {
            let mut subs = lock(&self.subscribers);
            subs.next_id += 1;
            let id = subs.next_id;
            subs.markers.push((id, Arc::clone(&sink)));
            id
        };
        sink(Ok(Snapshot::new(seqs.markers, records)));
        debug!(subscriber = id, "marker feed subscribed");
        Ok(self.cancel_handle(id))
    }

    /// Register a definition sink and hand it the current snapshot
    pub fn subscribe_definitions(
        &self,
        kind: DefinitionKind,
        sink: SnapshotSink<Definition>,
        load: impl FnOnce() -> Result<Vec<Definition>>,
    ) -> Result<Subscription> {
        let seqs = lock(&self.publish);
        let records = load()?;
        let id = {
            let mut subs = lock(&self.subscribers);
            subs.next_id += 1;
            let id = subs.next_id;
            subs.definitions
                .entry(kind)
                .or_default()
                .push((id, Arc::clone(&sink)));
            id
        };
        let seq = seqs.definitions.get(&kind).copied().unwrap_or(0);
        sink(Ok(Snapshot::new(seq, records)));
        debug!(subscriber = id, %kind, "definition feed subscribed");
        Ok(self.cancel_handle(id))
    }

    /// Deliver the next marker snapshot to every marker subscriber
    pub fn publish_markers(&self, load: impl FnOnce() -> Result<Vec<MarkerInstance>>) {
        let mut seqs = lock(&self.publish);
        let sinks: Vec<_> = lock(&self.subscribers)
            .markers
            .iter()
            .map(|(_, sink)| Arc::clone(sink))
            .collect();
        if sinks.is_empty() {
            return;
        }
        match load() {
            Ok(records) => {
                seqs.markers += 1;
                deliver(&sinks, Snapshot::new(seqs.markers, records));
                debug!(seq = seqs.markers, subscribers = sinks.len(), "marker snapshot published");
            }
            Err(err) => fail(&sinks, "markers", err),
        }
    }

    /// Deliver the next snapshot of one definition kind
    pub fn publish_definitions(
        &self,
        kind: DefinitionKind,
        load: impl FnOnce() -> Result<Vec<Definition>>,
    ) {
        let mut seqs = lock(&self.publish);
        let sinks: Vec<_> = lock(&self.subscribers)
            .definitions
            .get(&kind)
            .map(|sinks| sinks.iter().map(|(_, sink)| Arc::clone(sink)).collect())
            .unwrap_or_default();
        if sinks.is_empty() {
            return;
        }
        match load() {
            Ok(records) => {
                let seq = seqs.definitions.entry(kind).or_insert(0);
                *seq += 1;
                deliver(&sinks, Snapshot::new(*seq, records));
                debug!(%kind, seq = *seq, subscribers = sinks.len(), "definition snapshot published");
            }
            Err(err) => fail(&sinks, kind.as_str(), err),
        }
    }

    /// Number of live subscriptions across all streams
    pub fn subscriber_count(&self) -> usize {
        let subs = lock(&self.subscribers);
        subs.markers.len() + subs.definitions.values().map(Vec::len).sum::<usize>()
    }

    fn cancel_handle(&self, id: u64) -> Subscription {
        let subscribers = Arc::clone(&self.subscribers);
        Subscription::new(move || {
            lock(&subscribers).remove(id);
            debug!(subscriber = id, "feed unsubscribed");
        })
    }
}

fn deliver<T: Clone>(sinks: &[SnapshotSink<T>], snapshot: Snapshot<T>) {
    for sink in sinks {
        sink(Ok(snapshot.clone()));
    }
}

fn fail<T>(sinks: &[SnapshotSink<T>], stream: &str, err: crate::Error) {
    warn!(stream, error = %err, "snapshot load failed");
    let err = mapsync_core::Error::SubscriptionFailed(err.to_string());
    for sink in sinks {
        sink(Err(err.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapsync_core::{Coords, MarkerType, StreamResult};

    fn collecting<T: Send + 'static>() -> (SnapshotSink<T>, Arc<Mutex<Vec<StreamResult<T>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let out = Arc::clone(&seen);
        let sink: SnapshotSink<T> = Arc::new(move |result| out.lock().unwrap().push(result));
        (sink, seen)
    }

    fn gate() -> MarkerInstance {
        MarkerInstance::new("g", MarkerType::Door, Coords::new(0.0, 0.0), "Gate")
    }

    #[test]
    fn test_subscribe_delivers_current_snapshot() {
        let feeds = Feeds::default();
        let (sink, seen) = collecting();
        let _sub = feeds.subscribe_markers(sink, || Ok(vec![gate()])).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].as_ref().unwrap().records, vec![gate()]);
    }

    #[test]
    fn test_publish_numbers_snapshots_per_stream() {
        let feeds = Feeds::default();
        let (markers, seen_markers) = collecting();
        let (items, seen_items) = collecting::<Definition>();
        let _a = feeds.subscribe_markers(markers, || Ok(vec![])).unwrap();
        let _b = feeds
            .subscribe_definitions(DefinitionKind::Item, items, || Ok(vec![]))
            .unwrap();

        feeds.publish_markers(|| Ok(vec![gate()]));
        feeds.publish_markers(|| Ok(vec![]));
        feeds.publish_definitions(DefinitionKind::Item, || Ok(vec![]));
        feeds.publish_definitions(DefinitionKind::Npc, || Ok(vec![]));

        let seqs: Vec<u64> = seen_markers
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.as_ref().unwrap().seq)
            .collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        assert_eq!(seen_items.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_unsubscribed_sink_gets_nothing() {
        let feeds = Feeds::default();
        let (sink, seen) = collecting();
        let sub = feeds.subscribe_markers(sink, || Ok(vec![])).unwrap();
        assert_eq!(feeds.subscriber_count(), 1);

        sub.unsubscribe();
        feeds.publish_markers(|| Ok(vec![gate()]));
        assert_eq!(feeds.subscriber_count(), 0);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_failed_load_reaches_subscribers_as_error() {
        let feeds = Feeds::default();
        let (sink, seen) = collecting::<MarkerInstance>();
        let _sub = feeds.subscribe_markers(sink, || Ok(vec![])).unwrap();

        feeds.publish_markers(|| Err(crate::Error::Database("gone".into())));
        let seen = seen.lock().unwrap();
        assert!(matches!(
            &seen[1],
            Err(mapsync_core::Error::SubscriptionFailed(msg)) if msg.contains("gone")
        ));
    }
}
