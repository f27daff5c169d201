//! Turns watcher events into reflector store writes and handler notifications.

use std::collections::BTreeMap;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use kube::Resource;
use kube::runtime::reflector::{self, ObjectRef, store::Writer};
use kube::runtime::watcher;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::handler::{DeletedObject, Notification, ResourceEventHandler};
use super::store::{Store, object_key};

struct State<K: Resource<DynamicType = ()> + Clone + 'static> {
    writer: Writer<K>,
    senders: Vec<mpsc::UnboundedSender<Notification<K>>>,
    tasks: Vec<JoinHandle<()>>,
}

/// Feeds an informer's reflector store and fans changes out to its handlers.
pub(crate) struct Processor<K: Resource<DynamicType = ()> + Clone + 'static> {
    reader: reflector::Store<K>,
    state: Mutex<State<K>>,
}

impl<K> Processor<K>
where
    K: Resource<DynamicType = ()> + Clone + Send + Sync + 'static,
{
    pub(crate) fn new() -> Self {
        let (reader, writer) = reflector::store();
        Self {
            reader,
            state: Mutex::new(State {
                writer,
                senders: Vec::new(),
                tasks: Vec::new(),
            }),
        }
    }

    pub(crate) fn store(&self) -> Store<K> {
        Store::new(self.reader.clone())
    }

    /// True once the reflector has committed its first full list.
    pub(crate) fn has_synced(&self) -> bool {
        matches!(self.reader.wait_until_ready().now_or_never(), Some(Ok(())))
    }

    /// Resolves to `true` once the first full list has been applied, or to
    /// `false` if `stop` fires first.
    pub(crate) async fn wait_for_sync(&self, stop: &CancellationToken) -> bool {
        tokio::select! {
            biased;
            ready = self.reader.wait_until_ready() => ready.is_ok(),
            _ = stop.cancelled() => false,
        }
    }

    /// Register a handler. It is first replayed the current cache content.
    pub(crate) fn add_handler(&self, mut handler: impl ResourceEventHandler<K>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Notification<K>>();
        let mut state = self.lock();

        for obj in self.store().list() {
            // rx is alive, send cannot fail
            let _ = tx.send(Notification::Added { obj, initial: true });
        }

        state.tasks.push(tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                handler.handle(&notification);
            }
        }));
        state.senders.push(tx);
    }

    /// Apply one watcher event to the store and notify every handler.
    pub(crate) fn apply(&self, event: watcher::Event<K>) {
        let mut state = self.lock();

        let notifications = match &event {
            watcher::Event::Init | watcher::Event::InitApply(_) => {
                // the writer buffers the list until InitDone
                state.writer.apply_watcher_event(&event);
                return;
            }
            watcher::Event::InitDone => {
                let initial = !self.has_synced();
                let previous = self.snapshot();
                state.writer.apply_watcher_event(&event);
                debug!(objects = self.reader.len(), initial, "list done");
                relist_notifications(previous, self.snapshot(), initial)
            }
            watcher::Event::Apply(obj) => {
                let obj_ref = ObjectRef::from_obj(obj);
                let old = self.reader.get(&obj_ref);
                state.writer.apply_watcher_event(&event);
                let new = self
                    .reader
                    .get(&obj_ref)
                    .unwrap_or_else(|| Arc::new(obj.clone()));
                match old {
                    Some(old) => vec![Notification::Updated { old, new }],
                    None => vec![Notification::Added {
                        obj: new,
                        initial: false,
                    }],
                }
            }
            watcher::Event::Delete(obj) => {
                state.writer.apply_watcher_event(&event);
                vec![Notification::Deleted(DeletedObject::Known(Arc::new(obj.clone())))]
            }
        };

        state.dispatch(notifications);
    }

    /// Redeliver every cached object as an update. Does nothing before sync.
    pub(crate) fn resync(&self) -> usize {
        if !self.has_synced() {
            return 0;
        }
        let mut state = self.lock();
        let notifications: Vec<_> = self
            .store()
            .list()
            .into_iter()
            .map(|obj| Notification::Updated {
                old: obj.clone(),
                new: obj,
            })
            .collect();
        let count = notifications.len();
        state.dispatch(notifications);
        count
    }

    /// Stop delivering and wait for handlers to drain their queues.
    pub(crate) async fn close(&self) {
        let tasks = {
            let mut state = self.lock();
            state.senders.clear();
            mem::take(&mut state.tasks)
        };
        for task in tasks {
            if let Err(e) = task.await {
                warn!("event handler task failed: {e}");
            }
        }
    }

    fn snapshot(&self) -> BTreeMap<String, Arc<K>> {
        self.reader
            .state()
            .into_iter()
            .map(|obj| (object_key(obj.as_ref()), obj))
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, State<K>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K: Resource<DynamicType = ()> + Clone + 'static> State<K> {
    fn dispatch(&mut self, notifications: Vec<Notification<K>>) {
        if notifications.is_empty() {
            return;
        }
        self.senders.retain(|tx| {
            notifications
                .iter()
                .all(|notification| tx.send(notification.clone()).is_ok())
        });
    }
}

/// Compare the store before and after a full list.
///
/// Listed objects already cached become updates, the rest additions. Cached
/// objects missing from the list are deleted with their last known state.
fn relist_notifications<K>(
    mut previous: BTreeMap<String, Arc<K>>,
    listed: BTreeMap<String, Arc<K>>,
    initial: bool,
) -> Vec<Notification<K>> {
    let mut notifications = Vec::with_capacity(listed.len());

    for (key, obj) in listed {
        match previous.remove(&key) {
            Some(old) => notifications.push(Notification::Updated { old, new: obj }),
            None => notifications.push(Notification::Added { obj, initial }),
        }
    }
    for (key, last_known) in previous {
        notifications.push(Notification::Deleted(DeletedObject::FinalStateUnknown {
            key,
            last_known,
        }));
    }
    notifications
}
