//! Configuration file watcher for hot-reload support
//!
//! notify callbacks only post a change notification. A single reload task
//! waits for a burst of notifications to go quiet, then loads the file once.

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::AppConfig;

/// Quiet period after the last change notification before reloading
const RELOAD_DEBOUNCE: Duration = Duration::from_millis(100);

/// Config watcher that monitors file changes and sends reloaded configs
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<AppConfig>,
}

impl ConfigWatcher {
    /// Start watching a config file that has already been loaded
    ///
    /// Must be called from within a Tokio runtime.
    pub fn watch(config_path: String) -> Result<Self> {
        let (change_tx, change_rx) = mpsc::unbounded_channel::<()>();
        let (config_tx, config_rx) = mpsc::channel(10);

        // Runs on notify's own thread; an unbounded send never blocks it
        let mut watcher =
            notify::recommended_watcher(move |res: Result<Event, notify::Error>| match res {
                Ok(event) if matches!(event.kind, EventKind::Modify(_)) => {
                    debug!("Config file modified: {:?}", event.paths);
                    let _ = change_tx.send(());
                }
                Ok(_) => {}
                Err(e) => error!("Watch error: {}", e),
            })?;

        watcher
            .watch(Path::new(&config_path), RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch config file: {}", config_path))?;

        tokio::spawn(reload_loop(config_path.clone(), change_rx, config_tx));

        info!("Config file watcher started for: {}", config_path);

        Ok(Self {
            _watcher: watcher,
            rx: config_rx,
        })
    }

    /// Wait for the next config update
    /// Returns None if the watcher has been closed
    pub async fn next_config(&mut self) -> Option<AppConfig> {
        self.rx.recv().await
    }
}

/// Load the config once per burst of change notifications
///
/// Ends when the notify watcher is dropped or nobody receives configs anymore.
async fn reload_loop(
    config_path: String,
    mut changes: mpsc::UnboundedReceiver<()>,
    tx: mpsc::Sender<AppConfig>,
) {
    while let Some(coalesced) = next_burst(&mut changes, RELOAD_DEBOUNCE).await {
        debug!("Reloading config after {} change notification(s)", coalesced);

        match AppConfig::load(&config_path).await {
            Ok(new_config) => {
                info!("Configuration reloaded successfully");
                if tx.send(new_config).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!("Failed to reload config (keeping old config): {:#}", e);
            }
        }
    }
}

/// Wait for a notification, then until none arrives for `quiet`
///
/// Returns how many notifications were coalesced, or `None` once the
/// sending side is gone with nothing pending.
async fn next_burst(changes: &mut mpsc::UnboundedReceiver<()>, quiet: Duration) -> Option<usize> {
    changes.recv().await?;
    let mut coalesced = 1;

    loop {
        match tokio::time::timeout(quiet, changes.recv()).await {
            Ok(Some(())) => coalesced += 1,
            Ok(None) | Err(_) => return Some(coalesced),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const BASE_CONFIG: &str = r#"
remote:
  address: 48
peer:
  address: 81
  host: "192.168.2.64"
"#;

    fn config_with_popup(channel: u16) -> String {
        format!("{}feedback:\n  volume_popup: {}\n", BASE_CONFIG, channel)
    }

    /// Collect every config delivered until `idle` passes with nothing new
    async fn drain_reloads(watcher: &mut ConfigWatcher, idle: Duration) -> Vec<AppConfig> {
        let mut reloads = Vec::new();
        while let Ok(Some(config)) = tokio::time::timeout(idle, watcher.next_config()).await {
            reloads.push(config);
        }
        reloads
    }

    #[tokio::test]
    async fn test_next_burst_coalesces_notifications() {
        let (tx, mut rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            for _ in 0..3 {
                let _ = tx.send(());
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        });

        assert_eq!(next_burst(&mut rx, Duration::from_millis(100)).await, Some(3));
        // Sender dropped after the burst
        assert_eq!(next_burst(&mut rx, Duration::from_millis(100)).await, None);
    }

    #[tokio::test]
    async fn test_config_watcher_reloads_once_per_burst() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("test-config.yaml");
        fs::write(&config_path, config_with_popup(7))?;

        let mut watcher = ConfigWatcher::watch(config_path.to_string_lossy().to_string())?;

        tokio::time::sleep(Duration::from_millis(100)).await;
        for channel in [8, 9, 10] {
            fs::write(&config_path, config_with_popup(channel))?;
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let reloads = drain_reloads(&mut watcher, Duration::from_millis(600)).await;

        assert_eq!(reloads.len(), 1);
        assert_eq!(reloads[0].feedback.volume_popup, Some(10));

        Ok(())
    }

    #[tokio::test]
    async fn test_config_watcher_skips_invalid_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("test-config.yaml");
        fs::write(&config_path, BASE_CONFIG)?;

        let mut watcher = ConfigWatcher::watch(config_path.to_string_lossy().to_string())?;

        tokio::time::sleep(Duration::from_millis(100)).await;
        fs::write(&config_path, "remote: [not, a, map]\n")?;

        let reloads = drain_reloads(&mut watcher, Duration::from_millis(600)).await;
        assert!(reloads.is_empty());

        Ok(())
    }
}
