use crate::schema::Config;
use arc_swap::ArcSwap;
use std::{path::PathBuf, sync::Arc};

/// Watches a configuration file for changes and hot-reloads on modification.
pub struct ConfigWatcher {
    /// Current configuration, atomically swappable.
    current: Arc<ArcSwap<Config>>,
    /// Path to the configuration file.
    path: PathBuf,
}

impl ConfigWatcher {
    /// Creates a new watcher from a file path, loading the initial configuration immediately.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the configuration file cannot be read or parsed.
    #[allow(clippy::result_large_err)]
    pub fn new(path: PathBuf) -> Result<Self, figment::Error> {
        let config = Config::from_file(&path)?;
        Ok(Self {
            current: Arc::new(ArcSwap::from_pointee(config)),
            path,
        })
    }

    /// Returns a snapshot of the current configuration.
    #[must_use]
    pub fn load(&self) -> arc_swap::Guard<Arc<Config>> {
        self.current.load()
    }

    /// Returns a shareable `ArcSwap` handle; the client reads it on every request.
    #[must_use]
    pub fn arc(&self) -> Arc<ArcSwap<Config>> {
        Arc::clone(&self.current)
    }

    /// Manually reloads the configuration from disk.
    ///
    /// On error the previous configuration stays in effect.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the configuration file cannot be read or parsed.
    #[allow(clippy::result_large_err)]
    pub fn reload(&self) -> Result<(), figment::Error> {
        let new_config = Config::from_file(&self.path)?;
        self.current.store(Arc::new(new_config));
        Ok(())
    }

    /// Starts background file watching (spawns a blocking tokio task) that
    /// automatically reloads the configuration when the file changes.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns a [`notify::Error`] if the OS file watcher cannot be created or
    /// the config file path cannot be registered for watching.
    pub fn watch(self: Arc<Self>) -> notify::Result<()> {
        use notify::{RecursiveMode, Watcher as _};

        let (tx, rx) = std::sync::mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            if res.is_ok() {
                let _ = tx.send(());
            }
        })?;
        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tokio::task::spawn_blocking(move || {
            // The watcher must outlive the receive loop.
            let _watcher = watcher;
            for () in rx {
                match self.reload() {
                    Ok(()) => tracing::info!(path = %self.path.display(), "config reloaded"),
                    Err(e) => tracing::warn!(error = %e, "config reload failed"),
                }
            }
        });
        Ok(())
    }
}
