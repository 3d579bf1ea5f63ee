// Change feed.
//
// Every mutation made by the workflows is published here as a `ChangeEvent`.
// Consumers either register a per-table callback (`subscribe`) and keep the
// returned `Subscription` alive, or take a broadcast receiver (`stream`) as
// the SSE endpoint does. Delivery is in-process and best effort: a slow
// stream receiver that lags past the channel capacity skips events.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::sync::broadcast;

use campus_shared::types::event::{ChangeEvent, Table};

pub type ChangeCallback = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: HashMap<u64, (Table, ChangeCallback)>,
}

#[derive(Clone)]
pub struct ChangeFeed {
    registry: Arc<Mutex<Registry>>,
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
            tx,
        }
    }

    /// Deliver `change` to matching callbacks and stream receivers. Returns
    /// the number of callbacks invoked.
    pub fn publish(&self, change: ChangeEvent) -> usize {
        let callbacks: Vec<ChangeCallback> = lock(&self.registry)
            .entries
            .values()
            .filter(|(table, _)| *table == change.table)
            .map(|(_, cb)| cb.clone())
            .collect();

        // Callbacks run outside the lock so they may (un)subscribe.
        for cb in &callbacks {
            cb(&change);
        }

        tracing::debug!(
            change_id = %change.id,
            table = %change.table,
            action = ?change.action,
            callbacks = callbacks.len(),
            "change published"
        );

        // No stream receivers is the normal idle state.
        let _ = self.tx.send(change);
        callbacks.len()
    }

    /// Register `callback` for changes to `table` until the returned handle
    /// is dropped or unsubscribed.
    pub fn subscribe<F>(&self, table: Table, callback: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.insert(id, (table, Arc::new(callback)));

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Receiver for every change published after this call.
    pub fn stream(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.registry).entries.len()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by [`ChangeFeed::subscribe`].
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).entries.remove(&self.id);
        }
    }
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    #[test]
    fn callbacks_only_see_their_table() {
        let feed = ChangeFeed::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        let _sub = feed.subscribe(Table::Certificates, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        feed.publish(ChangeEvent::update(Table::Participations, Uuid::new_v4()));
        feed.publish(ChangeEvent::insert(Table::Certificates, Uuid::new_v4()));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let feed = ChangeFeed::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        let sub = feed.subscribe(Table::Notifications, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(feed.subscriber_count(), 1);

        sub.unsubscribe();
        assert_eq!(feed.subscriber_count(), 0);
        assert_eq!(feed.publish(ChangeEvent::insert(Table::Notifications, Uuid::new_v4())), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn callback_may_unsubscribe_others_without_deadlock() {
        let feed = ChangeFeed::new();
        let inner = feed.clone();
        let _sub = feed.subscribe(Table::Events, move |_| {
            let s = inner.subscribe(Table::Events, |_| {});
            drop(s);
        });

        assert_eq!(feed.publish(ChangeEvent::insert(Table::Events, Uuid::new_v4())), 1);
        assert_eq!(feed.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn stream_receives_published_changes() {
        let feed = ChangeFeed::new();
        let mut rx = feed.stream();
        let id = Uuid::new_v4();

        feed.publish(ChangeEvent::delete(Table::Certificates, id));

        let change = rx.recv().await.unwrap();
        assert_eq!(change.record_id, id);
        assert_eq!(change.table, Table::Certificates);
    }
}
