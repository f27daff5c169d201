use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::serde::de::DeserializeOwned;
use kube::runtime::watcher;
use kube::{Api, Client, Resource};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use super::shared::{Runnable, SharedInformer};

/// Default interval at which cached objects are redelivered to handlers.
pub const DEFAULT_RESYNC: Duration = Duration::from_secs(30);

struct Registered {
    informer: Arc<dyn Any + Send + Sync>,
    runner: Arc<dyn Runnable>,
    started: bool,
}

/// Hands out one shared informer per resource type, all configured alike.
pub struct SharedInformerFactory {
    client: Client,
    resync: Duration,
    namespace: Option<String>,
    label_selector: Option<String>,
    field_selector: Option<String>,
    informers: Mutex<HashMap<TypeId, Registered>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SharedInformerFactory {
    pub fn new(client: Client, resync: Duration) -> Self {
        Self {
            client,
            resync,
            namespace: None,
            label_selector: None,
            field_selector: None,
            informers: Mutex::new(HashMap::new()),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Restrict every informer to one namespace. Defaults to all namespaces.
    pub fn namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn label_selector(mut self, selector: Option<String>) -> Self {
        self.label_selector = selector;
        self
    }

    pub fn field_selector(mut self, selector: Option<String>) -> Self {
        self.field_selector = selector;
        self
    }

    pub fn pods(&self) -> Arc<SharedInformer<Pod>> {
        self.informer_for()
    }

    /// The shared informer for `K`, created on first use.
    pub fn informer_for<K>(&self) -> Arc<SharedInformer<K>>
    where
        K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
            + Clone
            + DeserializeOwned
            + Debug
            + Send
            + Sync
            + 'static,
    {
        let mut informers = lock(&self.informers);
        if let Some(existing) = informers.get(&TypeId::of::<K>()) {
            if let Ok(informer) = existing.informer.clone().downcast::<SharedInformer<K>>() {
                return informer;
            }
        }

        let api: Api<K> = match &self.namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };
        let informer = Arc::new(SharedInformer::new(api, self.watch_config(), self.resync));
        debug!(kind = %SharedInformer::<K>::resource_kind(), "created informer");
        informers.insert(
            TypeId::of::<K>(),
            Registered {
                informer: informer.clone(),
                runner: informer.clone(),
                started: false,
            },
        );
        informer
    }

    /// Spawn every informer that is not running yet.
    pub fn start(&self, stop: &CancellationToken) {
        let mut informers = lock(&self.informers);
        let mut tasks = lock(&self.tasks);
        for registered in informers.values_mut().filter(|r| !r.started) {
            tasks.push(registered.runner.clone().spawn(stop.clone()));
            registered.started = true;
        }
    }

    /// Wait for the caches of all started informers, keyed by resource kind.
    pub async fn wait_for_cache_sync(&self, stop: &CancellationToken) -> BTreeMap<String, bool> {
        let runners: Vec<_> = lock(&self.informers)
            .values()
            .filter(|r| r.started)
            .map(|r| r.runner.clone())
            .collect();

        let mut synced = BTreeMap::new();
        for runner in runners {
            synced.insert(runner.kind(), runner.wait_for_cache_sync(stop).await);
        }
        synced
    }

    /// Wait for started informers to exit. Call after cancelling their stop token.
    pub async fn shutdown(&self) {
        let tasks = mem::take(&mut *lock(&self.tasks));
        for task in tasks {
            if let Err(e) = task.await {
                error!("informer task failed: {e}");
            }
        }
    }

    fn watch_config(&self) -> watcher::Config {
        let mut config = watcher::Config::default();
        if let Some(labels) = &self.label_selector {
            config = config.labels(labels);
        }
        if let Some(fields) = &self.field_selector {
            config = config.fields(fields);
        }
        config
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
