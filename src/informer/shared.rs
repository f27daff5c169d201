use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::{Stream, StreamExt};
use k8s_openapi::serde::de::DeserializeOwned;
use kube::runtime::{WatchStreamExt, watcher};
use kube::{Api, Resource};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::handler::ResourceEventHandler;
use super::processor::Processor;
use super::store::Store;

/// One watch and one local cache shared by any number of event handlers.
pub struct SharedInformer<K: Resource<DynamicType = ()> + Clone + 'static> {
    api: Api<K>,
    watch_config: watcher::Config,
    resync: Option<Duration>,
    processor: Processor<K>,
    started: AtomicBool,
}

impl<K> SharedInformer<K>
where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
{
    /// A zero `resync` period disables periodic redelivery.
    pub fn new(api: Api<K>, watch_config: watcher::Config, resync: Duration) -> Self {
        Self {
            api,
            watch_config,
            resync: (!resync.is_zero()).then_some(resync),
            processor: Processor::new(),
            started: AtomicBool::new(false),
        }
    }

    pub fn resource_kind() -> String {
        K::kind(&()).into_owned()
    }

    pub fn add_event_handler(&self, handler: impl ResourceEventHandler<K>) {
        self.processor.add_handler(handler);
    }

    /// Read access to the local cache.
    pub fn store(&self) -> Store<K> {
        self.processor.store()
    }

    pub fn has_synced(&self) -> bool {
        self.processor.has_synced()
    }

    /// Block until the initial list is cached. Returns `false` when `stop`
    /// fires first.
    pub async fn wait_for_cache_sync(&self, stop: &CancellationToken) -> bool {
        self.processor.wait_for_sync(stop).await
    }

    /// Watch the API server until `stop` fires, then drain the handlers.
    pub async fn run(self: Arc<Self>, stop: CancellationToken) {
        let events = watcher(self.api.clone(), self.watch_config.clone()).default_backoff();
        self.run_with(events, stop).await;
    }

    /// Drive the informer from `events` until `stop` fires.
    ///
    /// Stream errors are logged and skipped; only the end of the stream or
    /// `stop` ends the loop. A second call while running returns at once.
    #[tracing::instrument(skip_all, fields(kind = %Self::resource_kind()))]
    pub(crate) async fn run_with<S>(self: Arc<Self>, events: S, stop: CancellationToken)
    where
        S: Stream<Item = Result<watcher::Event<K>, watcher::Error>> + Send,
    {
        if self.started.swap(true, Ordering::SeqCst) {
            warn!("informer already running");
            return;
        }
        info!(resync = ?self.resync, "starting informer");

        let mut events = events.boxed();
        let mut resync = self.resync.map(|period| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => {
                    info!("informer shutdown requested");
                    break;
                }
                _ = tick(&mut resync) => {
                    let count = self.processor.resync();
                    debug!(objects = count, "resync");
                }
                event = events.next() => match event {
                    Some(Ok(event)) => self.processor.apply(event),
                    Some(Err(e)) => warn!("watch failed, retrying: {e}"),
                    None => {
                        warn!("watch stream ended unexpectedly");
                        break;
                    }
                },
            }
        }

        self.processor.close().await;
        info!("informer stopped");
    }
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Type-erased informer, so a factory can own informers of different kinds.
pub(crate) trait Runnable: Send + Sync {
    fn kind(&self) -> String;
    fn spawn(self: Arc<Self>, stop: CancellationToken) -> JoinHandle<()>;
    fn wait_for_cache_sync<'a>(&'a self, stop: &'a CancellationToken) -> BoxFuture<'a, bool>;
}

impl<K> Runnable for SharedInformer<K>
where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
{
    fn kind(&self) -> String {
        Self::resource_kind()
    }

    fn spawn(self: Arc<Self>, stop: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(stop))
    }

    fn wait_for_cache_sync<'a>(&'a self, stop: &'a CancellationToken) -> BoxFuture<'a, bool> {
        Box::pin(self.processor.wait_for_sync(stop))
    }
}

#[cfg(test)]
mod tests {
    use futures::stream;
    use k8s_openapi::api::core::v1::Pod;

    use super::*;
    use crate::informer::testing::{pod, recorder};
    use crate::k8s::offline_client;

    type WatchItem = Result<watcher::Event<Pod>, watcher::Error>;

    fn informer(resync: Duration) -> Arc<SharedInformer<Pod>> {
        Arc::new(SharedInformer::new(
            Api::all(offline_client()),
            watcher::Config::default(),
            resync,
        ))
    }

    /// Yields `items` and then stays open like a live watch.
    fn scripted(items: Vec<WatchItem>) -> impl Stream<Item = WatchItem> + Send {
        stream::iter(items).chain(stream::pending())
    }

    #[tokio::test(start_paused = true)]
    async fn run_applies_events_resyncs_and_drains_on_stop() {
        let informer = informer(Duration::from_secs(30));
        let (handler, seen) = recorder();
        informer.add_event_handler(handler);

        let events = scripted(vec![
            Ok(watcher::Event::Init),
            Ok(watcher::Event::InitApply(pod("default", "a", "1"))),
            Err(watcher::Error::NoResourceVersion),
            Ok(watcher::Event::InitDone),
        ]);
        let stop = CancellationToken::new();
        let task = tokio::spawn(informer.clone().run_with(events, stop.clone()));

        assert!(informer.wait_for_cache_sync(&stop).await);
        tokio::time::sleep(Duration::from_secs(65)).await;
        stop.cancel();
        task.await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "add default/a@1 initial=true",
                "update default/a@1 -> default/a@1",
                "update default/a@1 -> default/a@1",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn zero_resync_never_redelivers() {
        let informer = informer(Duration::ZERO);
        let (handler, seen) = recorder();
        informer.add_event_handler(handler);

        let events = scripted(vec![
            Ok(watcher::Event::Init),
            Ok(watcher::Event::InitApply(pod("default", "a", "1"))),
            Ok(watcher::Event::InitDone),
        ]);
        let stop = CancellationToken::new();
        let task = tokio::spawn(informer.clone().run_with(events, stop.clone()));

        assert!(informer.wait_for_cache_sync(&stop).await);
        tokio::time::sleep(Duration::from_secs(300)).await;
        stop.cancel();
        task.await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["add default/a@1 initial=true"]);
    }

    #[tokio::test(start_paused = true)]
    async fn second_run_returns_immediately() {
        let informer = informer(Duration::from_secs(30));
        let stop = CancellationToken::new();
        let first = tokio::spawn(informer.clone().run_with(scripted(vec![]), stop.clone()));
        tokio::task::yield_now().await;

        // stop is still live; only the started flag lets this return
        informer.clone().run_with(scripted(vec![]), stop.clone()).await;
        assert!(!first.is_finished());

        stop.cancel();
        first.await.unwrap();
    }

    #[tokio::test]
    async fn ended_stream_stops_the_informer() {
        let informer = informer(Duration::ZERO);
        let stop = CancellationToken::new();
        informer.clone().run_with(stream::empty::<WatchItem>(), stop.clone()).await;
        assert!(!informer.has_synced());
        assert!(!stop.is_cancelled());
    }
}
