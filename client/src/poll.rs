/// Shared polling hub
///
/// One service owns every timer, keyed by resource. Views subscribe and
/// share a single fetch loop per resource instead of each running their
/// own; the loop lives until the last subscriber drops. Each fetch gets a
/// monotonic generation so a slow response can never overwrite data from
/// a request issued after it.
use crate::error::ClientError;
use crate::rest::ApiClient;
use crate::types::{Conversation, Thread};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, warn};

/// A pollable piece of backend state
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    /// The current user's conversation list
    Conversations,
    /// One peer's message thread, keyed by peer id
    Thread(String),
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resource::Conversations => write!(f, "conversations"),
            Resource::Thread(peer) => write!(f, "thread:{}", peer),
        }
    }
}

#[derive(Debug, Clone)]
pub enum FeedData {
    Conversations(Vec<Conversation>),
    Thread(Thread),
}

/// Latest known state of one resource. `data` survives failed fetches so
/// views keep rendering stale-but-real content.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub generation: u64,
    pub data: Option<FeedData>,
    pub error: Option<String>,
}

impl Snapshot {
    pub fn conversations(&self) -> Option<&[Conversation]> {
        match &self.data {
            Some(FeedData::Conversations(list)) => Some(list),
            _ => None,
        }
    }

    pub fn thread(&self) -> Option<&Thread> {
        match &self.data {
            Some(FeedData::Thread(thread)) => Some(thread),
            _ => None,
        }
    }
}

struct Entry {
    tx: Arc<watch::Sender<Snapshot>>,
    generations: Arc<AtomicU64>,
    subscribers: HashMap<u64, Duration>,
    task: JoinHandle<()>,
}

#[derive(Clone)]
pub struct PollHub {
    api: Arc<ApiClient>,
    entries: Arc<Mutex<HashMap<Resource, Entry>>>,
    next_subscriber: Arc<AtomicU64>,
}

impl PollHub {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            entries: Arc::new(Mutex::new(HashMap::new())),
            next_subscriber: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Subscribe to a resource at the given cadence. The first subscriber
    /// starts the fetch loop (with an immediate first fetch); later ones
    /// share it, and the effective cadence is the fastest one requested.
    pub fn subscribe(&self, resource: Resource, every: Duration) -> PollHandle {
        let id = self.next_subscriber.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.entries.lock().unwrap();

        if let Some(entry) = entries.get_mut(&resource) {
            entry.subscribers.insert(id, every);
            let rx = entry.tx.subscribe();
            return PollHandle {
                hub: self.clone(),
                resource,
                id,
                rx,
            };
        }

        debug!("Starting poll loop for {} every {:?}", resource, every);
        let (tx, rx) = watch::channel(Snapshot::default());
        let tx = Arc::new(tx);
        let generations = Arc::new(AtomicU64::new(0));
        let task = tokio::spawn(poll_loop(
            self.api.clone(),
            resource.clone(),
            tx.clone(),
            generations.clone(),
            self.entries.clone(),
            every,
        ));
        entries.insert(
            resource.clone(),
            Entry {
                tx,
                generations,
                subscribers: HashMap::from([(id, every)]),
                task,
            },
        );

        PollHandle {
            hub: self.clone(),
            resource,
            id,
            rx,
        }
    }

    /// Out-of-band fetch, ahead of the next scheduled tick. No-op when
    /// nothing is subscribed to the resource.
    pub fn refresh(&self, resource: &Resource) {
        let handles = {
            let entries = self.entries.lock().unwrap();
            entries
                .get(resource)
                .map(|entry| (entry.tx.clone(), entry.generations.clone()))
        };
        let Some((tx, generations)) = handles else {
            return;
        };
        let api = self.api.clone();
        let resource = resource.clone();
        tokio::spawn(async move {
            fetch_once(&api, &resource, &tx, &generations).await;
        });
    }

    /// Number of live subscriptions for a resource.
    pub fn subscriber_count(&self, resource: &Resource) -> usize {
        self.entries
            .lock()
            .unwrap()
            .get(resource)
            .map(|entry| entry.subscribers.len())
            .unwrap_or(0)
    }

    /// Whether a fetch loop is running for the resource.
    pub fn is_polling(&self, resource: &Resource) -> bool {
        self.entries.lock().unwrap().contains_key(resource)
    }

    fn unsubscribe(&self, resource: &Resource, id: u64) {
        let mut entries = self.entries.lock().unwrap();
        let Some(entry) = entries.get_mut(resource) else {
            return;
        };
        entry.subscribers.remove(&id);
        if entry.subscribers.is_empty() {
            debug!("Stopping poll loop for {}", resource);
            if let Some(entry) = entries.remove(resource) {
                entry.task.abort();
            }
        }
    }
}

/// Live subscription to one resource. Dropping the handle releases it;
/// the fetch loop stops once the last handle for the resource is gone.
pub struct PollHandle {
    hub: PollHub,
    resource: Resource,
    id: u64,
    rx: watch::Receiver<Snapshot>,
}

impl PollHandle {
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Latest snapshot, cloned out of the channel.
    pub fn snapshot(&self) -> Snapshot {
        self.rx.borrow().clone()
    }

    /// Wait for the next published snapshot.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Non-blocking check used by render loops; `snapshot()` still
    /// returns the newest value either way.
    pub fn has_changed(&mut self) -> bool {
        self.rx
            .has_changed()
            .map(|changed| {
                if changed {
                    self.rx.borrow_and_update();
                }
                changed
            })
            .unwrap_or(false)
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.hub.unsubscribe(&self.resource, self.id);
    }
}

async fn poll_loop(
    api: Arc<ApiClient>,
    resource: Resource,
    tx: Arc<watch::Sender<Snapshot>>,
    generations: Arc<AtomicU64>,
    entries: Arc<Mutex<HashMap<Resource, Entry>>>,
    initial_interval: Duration,
) {
    loop {
        fetch_once(&api, &resource, &tx, &generations).await;

        let every = entries
            .lock()
            .unwrap()
            .get(&resource)
            .and_then(|entry| entry.subscribers.values().min().copied())
            .unwrap_or(initial_interval);
        sleep(every).await;
    }
}

async fn fetch_once(
    api: &ApiClient,
    resource: &Resource,
    tx: &watch::Sender<Snapshot>,
    generations: &AtomicU64,
) {
    let generation = generations.fetch_add(1, Ordering::SeqCst) + 1;
    let outcome = match resource {
        Resource::Conversations => api.conversations().await.map(FeedData::Conversations),
        Resource::Thread(peer) => api.thread(peer).await.map(FeedData::Thread),
    };
    tx.send_if_modified(|snapshot| apply(snapshot, resource, generation, outcome));
}

/// Fold one fetch outcome into the snapshot. Returns false (nothing
/// published) when a response from an older request arrives after a newer
/// one was already applied.
fn apply(
    snapshot: &mut Snapshot,
    resource: &Resource,
    generation: u64,
    outcome: Result<FeedData, ClientError>,
) -> bool {
    if generation <= snapshot.generation {
        debug!(
            "Discarding stale response for {} (generation {} <= {})",
            resource, generation, snapshot.generation
        );
        return false;
    }
    snapshot.generation = generation;
    match outcome {
        Ok(data) => {
            snapshot.data = Some(data);
            snapshot.error = None;
        }
        Err(err) => {
            warn!("Fetch failed for {}: {}", resource, err);
            snapshot.error = Some(err.to_string());
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversations(n: usize) -> FeedData {
        FeedData::Conversations(
            (0..n)
                .map(|i| Conversation {
                    conversation_id: format!("c{}", i),
                    other_user: crate::types::PeerUser {
                        id: format!("u{}", i),
                        name: format!("User {}", i),
                    },
                    last_message: None,
                    last_message_time: "2024-03-01T10:00:00".to_string(),
                    unread_count: 0,
                    trip_id: None,
                })
                .collect(),
        )
    }

    #[test]
    fn newer_generation_is_applied() {
        let mut snapshot = Snapshot::default();
        let resource = Resource::Conversations;
        assert!(apply(&mut snapshot, &resource, 1, Ok(conversations(1))));
        assert!(apply(&mut snapshot, &resource, 2, Ok(conversations(2))));
        assert_eq!(snapshot.generation, 2);
        assert_eq!(snapshot.conversations().unwrap().len(), 2);
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut snapshot = Snapshot::default();
        let resource = Resource::Conversations;
        // Request 1 is issued first but its response arrives after
        // request 2's was applied.
        assert!(apply(&mut snapshot, &resource, 2, Ok(conversations(2))));
        assert!(!apply(&mut snapshot, &resource, 1, Ok(conversations(1))));
        assert_eq!(snapshot.generation, 2);
        assert_eq!(snapshot.conversations().unwrap().len(), 2);
    }

    #[test]
    fn failed_fetch_keeps_last_known_data() {
        let mut snapshot = Snapshot::default();
        let resource = Resource::Conversations;
        assert!(apply(&mut snapshot, &resource, 1, Ok(conversations(3))));
        assert!(apply(
            &mut snapshot,
            &resource,
            2,
            Err(ClientError::Http("connection refused".to_string()))
        ));
        assert_eq!(snapshot.conversations().unwrap().len(), 3);
        assert!(snapshot.error.is_some());

        // Recovery clears the error
        assert!(apply(&mut snapshot, &resource, 3, Ok(conversations(3))));
        assert!(snapshot.error.is_none());
    }
}
