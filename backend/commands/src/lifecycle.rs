//! Catalog lifecycle: host-ready builds, explicit syncs, drift resyncs and
//! lazy initialization for messages that arrive before host-ready.

use std::sync::Arc;

use tracing::{info, warn};

use cmdrouter_core::RouterError;

use crate::catalog::{Catalog, CatalogDiff};

pub struct SyncController {
    catalog: Arc<Catalog>,
}

impl SyncController {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Initial build once the host has loaded every plugin.
    pub async fn on_host_ready(&self) -> Result<CatalogDiff, RouterError> {
        let diff = self.catalog.rebuild().await?;
        info!("[Sync] Host ready, {} commands across {} plugins", diff.commands, diff.added.len());
        Ok(diff)
    }

    /// Rebuild requested by a user. The diff is reported back to them.
    pub async fn sync(&self) -> Result<CatalogDiff, RouterError> {
        let diff = self.catalog.rebuild().await?;
        info!(added = ?diff.added, removed = ?diff.removed, "[Sync] Manual sync finished");
        Ok(diff)
    }

    /// Rebuild after dispatch found the catalog disagreeing with the host.
    pub async fn resync_after_drift(&self, command: &str) -> Result<(), RouterError> {
        warn!("[Sync] Catalog drift detected at {}, resyncing", command);
        let diff = self.catalog.rebuild().await?;
        info!(added = ?diff.added, removed = ?diff.removed, "[Sync] Drift resync finished");
        Ok(())
    }

    /// Build the catalog on first use if host-ready never fired.
    pub async fn ensure_ready(&self) -> Result<(), RouterError> {
        if let Some(diff) = self.catalog.ensure_built().await? {
            info!("[Sync] Lazily initialized catalog with {} commands", diff.commands);
        }
        Ok(())
    }
}
