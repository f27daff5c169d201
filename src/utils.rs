use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

// --- SHARED SPINNER ---
pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

// --- STOP SIGNAL ---
/// Cancel `stop` on Ctrl-C.
pub fn cancel_on_ctrl_c(stop: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            res = tokio::signal::ctrl_c() => match res {
                Ok(()) => {
                    info!("interrupt received, stopping");
                    stop.cancel();
                }
                Err(e) => warn!("unable to listen for Ctrl-C: {e}"),
            },
            _ = stop.cancelled() => {}
        }
    });
}

/// Cancel `stop` unless the returned task is aborted within `timeout`.
pub fn cancel_after(stop: CancellationToken, timeout: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(timeout) => {
                warn!(?timeout, "timed out waiting for caches to sync");
                stop.cancel();
            }
            _ = stop.cancelled() => {}
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn cancel_after_fires_on_timeout() {
        let stop = CancellationToken::new();
        let guard = cancel_after(stop.clone(), Duration::from_secs(5));
        guard.await.unwrap();
        assert!(stop.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn aborted_guard_leaves_stop_alone() {
        let stop = CancellationToken::new();
        let guard = cancel_after(stop.clone(), Duration::from_secs(5));
        guard.abort();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!stop.is_cancelled());
    }
}
