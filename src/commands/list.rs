use std::time::Duration;

use clap::Args;
use colored::*;
use comfy_table::Table;
use kube::Client;
use podwatch::models::PodSummary;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::Scope;
use crate::utils;

#[derive(Args, Clone, Debug, Default)]
pub struct ListArgs {
    /// Give up if the initial list has not completed after this many seconds
    #[arg(long)]
    pub sync_timeout: Option<u64>,
}

/// Fill the informer cache once and print it.
pub async fn run(client: Client, scope: Scope, args: ListArgs) -> anyhow::Result<()> {
    let factory = scope.factory(client, Duration::ZERO);
    let pods = factory.pods();

    let stop = CancellationToken::new();
    utils::cancel_on_ctrl_c(stop.clone());
    factory.start(&stop);
    if let Some(secs) = args.sync_timeout {
        utils::cancel_after(stop.clone(), Duration::from_secs(secs));
    }

    let pb = utils::create_spinner("Waiting for caches to sync...");
    let synced = factory.wait_for_cache_sync(&stop).await;
    pb.finish_and_clear();
    stop.cancel();
    factory.shutdown().await;

    debug!(?synced, "cache sync finished");
    if synced.values().any(|ok| !ok) {
        anyhow::bail!("Failed to wait for caches to sync");
    }

    let rows: Vec<PodSummary> = pods
        .store()
        .list()
        .iter()
        .map(|pod| PodSummary::from(pod.as_ref()))
        .collect();
    if rows.is_empty() {
        println!("   (No pods found)");
    } else {
        println!("{}", render_table(&rows));
    }
    Ok(())
}

fn render_table(rows: &[PodSummary]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Namespace", "Name", "Phase", "Node"]);
    for row in rows {
        let phase = if row.phase == "Running" || row.phase == "Succeeded" {
            row.phase.green()
        } else {
            row.phase.red()
        };
        table.add_row(vec![
            row.pod.namespace.clone(),
            row.pod.name.clone(),
            phase.to_string(),
            row.node.clone(),
        ]);
    }
    table
}
