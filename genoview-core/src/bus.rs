/*!
# Event bus

Topic-keyed publish/subscribe with synchronous, in-order fan-out.

Dispatch works on a snapshot of the topic's subscriber list taken when
`publish` starts. Each subscription carries an `active` flag that is checked
right before its handler runs, so a handler unsubscribed mid-dispatch is not
called for the event in flight and unsubscribing never invalidates the
iteration.

Handler errors and panics are logged and swallowed; the remaining
subscribers still see the event.
*/

use crate::events::Event;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

pub type Handler = Arc<dyn Fn(&Event) -> anyhow::Result<()> + Send + Sync>;

#[derive(Clone)]
struct Subscriber {
    id: u64,
    label: String,
    handler: Handler,
    active: Arc<AtomicBool>,
}

/// Identifies one subscription; pass it back to [`EventBus::unsubscribe`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    topic: String,
    id: u64,
}

impl SubscriptionHandle {
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[derive(Default)]
pub struct EventBus {
    topics: Mutex<HashMap<String, Vec<Subscriber>>>,
    next_id: AtomicU64,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let topics = self.topics.lock();
        let mut counts: Vec<(&String, usize)> = topics.iter().map(|(t, s)| (t, s.len())).collect();
        counts.sort();
        f.debug_struct("EventBus").field("subscribers", &counts).finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `topic`. Handlers of one topic run in
    /// subscription order.
    pub fn subscribe<F>(&self, topic: &str, label: impl Into<String>, handler: F) -> SubscriptionHandle
    where
        F: Fn(&Event) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let label = label.into();
        log::debug!("bus: subscribe #{id} '{label}' to {topic}");
        self.topics.lock().entry(topic.to_string()).or_default().push(Subscriber {
            id,
            label,
            handler: Arc::new(handler),
            active: Arc::new(AtomicBool::new(true)),
        });
        SubscriptionHandle {
            topic: topic.to_string(),
            id,
        }
    }

    /// Removes a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) -> bool {
        let mut topics = self.topics.lock();
        let Some(subscribers) = topics.get_mut(&handle.topic) else {
            return false;
        };
        let Some(index) = subscribers.iter().position(|s| s.id == handle.id) else {
            return false;
        };
        let removed = subscribers.remove(index);
        removed.active.store(false, Ordering::SeqCst);
        if subscribers.is_empty() {
            topics.remove(&handle.topic);
        }
        log::debug!("bus: unsubscribe #{} '{}' from {}", removed.id, removed.label, handle.topic);
        true
    }

    /// Delivers `event` to every current subscriber of its topic and returns
    /// how many handlers ran successfully.
    ///
    /// There is no re-entrancy guard: a handler that publishes to the topic
    /// it is handling recurses.
    pub fn publish(&self, event: &Event) -> usize {
        let topic = event.topic();
        let snapshot: Vec<Subscriber> = match self.topics.lock().get(topic) {
            Some(subscribers) => subscribers.clone(),
            None => return 0,
        };
        log::trace!("bus: {} -> {} subscribers", topic, snapshot.len());

        let mut delivered = 0;
        for subscriber in snapshot {
            if !subscriber.active.load(Ordering::SeqCst) {
                continue;
            }
            match catch_unwind(AssertUnwindSafe(|| (subscriber.handler)(event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(err)) => {
                    log::warn!("bus: handler '{}' on {} failed: {:#}", subscriber.label, topic, err)
                }
                Err(_) => log::error!("bus: handler '{}' on {} panicked", subscriber.label, topic),
            }
        }
        delivered
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics.lock().get(topic).map_or(0, Vec::len)
    }

    pub fn total_subscribers(&self) -> usize {
        self.topics.lock().values().map(Vec::len).sum()
    }
}

/// Handles owned by one view. Must be released explicitly on teardown.
#[derive(Debug, Default)]
pub struct Subscriptions {
    handles: Vec<SubscriptionHandle>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handle: SubscriptionHandle) {
        self.handles.push(handle);
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Unsubscribes everything; returns how many subscriptions were removed.
    pub fn release_all(&mut self, bus: &EventBus) -> usize {
        self.handles.drain(..).filter(|h| bus.unsubscribe(h)).count()
    }
}

impl Drop for Subscriptions {
    fn drop(&mut self) {
        if !self.handles.is_empty() {
            log::warn!("{} bus subscriptions dropped without teardown", self.handles.len());
        }
    }
}
