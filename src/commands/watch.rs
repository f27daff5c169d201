use std::time::Duration;

use clap::Args;
use kube::Client;
use podwatch::informer::DEFAULT_RESYNC;
use podwatch::printer::{PodEventPrinter, PodFilter};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::Scope;
use crate::utils;

#[derive(Args, Clone, Debug)]
pub struct WatchArgs {
    /// Seconds between redeliveries of every cached pod as an update (0 disables)
    #[arg(long, env = "PODWATCH_RESYNC", default_value_t = DEFAULT_RESYNC.as_secs())]
    pub resync: u64,
    /// Give up if the initial list has not completed after this many seconds
    #[arg(long)]
    pub sync_timeout: Option<u64>,
    /// Only print pods whose "namespace/name" matches this regex
    #[arg(short, long)]
    pub filter: Option<String>,
    /// Hide pods whose "namespace/name" matches this regex (e.g. -e "^kube-system/")
    #[arg(short, long)]
    pub exclude: Option<String>,
}

impl Default for WatchArgs {
    fn default() -> Self {
        Self {
            resync: DEFAULT_RESYNC.as_secs(),
            sync_timeout: None,
            filter: None,
            exclude: None,
        }
    }
}

pub async fn run(client: Client, scope: Scope, args: WatchArgs, color: bool) -> anyhow::Result<()> {
    let filter = PodFilter::new(args.filter.as_deref(), args.exclude.as_deref())?;

    let factory = scope.factory(client, Duration::from_secs(args.resync));
    let pods = factory.pods();
    pods.add_event_handler(PodEventPrinter::stdout(filter, color));

    let stop = CancellationToken::new();
    utils::cancel_on_ctrl_c(stop.clone());
    factory.start(&stop);

    let timeout = args
        .sync_timeout
        .map(|secs| utils::cancel_after(stop.clone(), Duration::from_secs(secs)));
    if !pods.wait_for_cache_sync(&stop).await {
        error!("Failed to wait for caches to sync");
        stop.cancel();
        factory.shutdown().await;
        return Ok(());
    }
    if let Some(timeout) = timeout {
        timeout.abort();
    }
    info!(pods = pods.store().len(), "caches synced, watching for changes");

    stop.cancelled().await;
    factory.shutdown().await;
    Ok(())
}
