//! Hot reload of the configuration file.
//!
//! The caller service uses this to refresh its registry view when the
//! `[[discovery.services]]` entries change on disk. Edits that fail to load
//! are logged and dropped; the running configuration stays in place.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::GatewayConfig;

const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Sends a freshly validated config each time the file changes.
pub struct ConfigWatcher {
    path: PathBuf,
    updates: mpsc::UnboundedSender<GatewayConfig>,
}

impl ConfigWatcher {
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<GatewayConfig>) {
        let (updates, rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            updates,
        };
        (watcher, rx)
    }

    /// Begin watching. Dropping the returned handle stops the watch.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, updates } = self;
        let watched = path.clone();

        let mut handle = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    on_event(&watched, &event.kind, &updates);
                }
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(POLL_INTERVAL),
        )?;
        handle.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %path.display(), "Watching config for changes");
        Ok(handle)
    }
}

/// Reload on writes and re-creates; returns whether an update was sent.
fn on_event(path: &Path, kind: &EventKind, updates: &mpsc::UnboundedSender<GatewayConfig>) -> bool {
    if !matches!(kind, EventKind::Modify(_) | EventKind::Create(_)) {
        return false;
    }

    match load_config(path) {
        Ok(config) => {
            tracing::info!(
                path = %path.display(),
                instances = config.discovery.services.len(),
                "Config reloaded"
            );
            updates.send(config).is_ok()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring config change");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, ModifyKind};

    #[test]
    fn test_only_valid_modifications_are_forwarded() {
        let path = std::env::temp_dir().join("resilient_gateway_watcher_test.toml");
        let (tx, mut rx) = mpsc::unbounded_channel();

        std::fs::write(
            &path,
            "[[discovery.services]]\nname = \"backend-service\"\naddress = \"127.0.0.1:8080\"\n",
        )
        .unwrap();
        assert!(!on_event(&path, &EventKind::Access(AccessKind::Any), &tx));
        assert!(on_event(&path, &EventKind::Modify(ModifyKind::Any), &tx));
        assert_eq!(rx.try_recv().unwrap().discovery.services.len(), 1);

        std::fs::write(&path, "[breaker]\nsliding_window_size = 0\n").unwrap();
        assert!(!on_event(&path, &EventKind::Modify(ModifyKind::Any), &tx));
        assert!(rx.try_recv().is_err());

        std::fs::remove_file(&path).unwrap();
    }
}
