//! Shared catalog snapshot with build-then-swap reloads.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use super::{load_source, Catalog, CatalogLoadError, CatalogSource, LoadWarning};
use crate::models::CatalogFingerprint;

/// Summary of a successful reload.
#[derive(Debug, Clone, Serialize)]
pub struct ReloadOutcome {
    pub previous_fingerprint: CatalogFingerprint,
    pub fingerprint: CatalogFingerprint,
    pub changed: bool,
    pub activities: usize,
    pub drop_items: usize,
    pub warnings: Vec<LoadWarning>,
}

/// Holds the catalog currently served to estimations.
///
/// Readers take an `Arc` snapshot and compute without holding the lock. A
/// replacement is fully built before it is swapped in, so a failed reload
/// leaves the current catalog untouched. Reloads run one at a time, so the
/// last swap always reflects the newest read of the source.
pub struct CatalogStore {
    current: RwLock<Arc<Catalog>>,
    source: Option<CatalogSource>,
    reload_lock: Mutex<()>,
}

impl CatalogStore {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
            source: None,
            reload_lock: Mutex::new(()),
        }
    }

    pub fn with_source(catalog: Catalog, source: CatalogSource) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
            source: Some(source),
            reload_lock: Mutex::new(()),
        }
    }

    pub fn source(&self) -> Option<&CatalogSource> {
        self.source.as_ref()
    }

    /// The catalog as of now. Later swaps do not affect the returned value.
    pub async fn snapshot(&self) -> Arc<Catalog> {
        self.current.read().await.clone()
    }

    /// Swap in a new catalog, returning the previous one.
    pub async fn replace(&self, catalog: Catalog) -> Arc<Catalog> {
        let mut guard = self.current.write().await;
        std::mem::replace(&mut *guard, Arc::new(catalog))
    }

    /// Rebuild from the configured source and swap on success.
    pub async fn reload(&self) -> Result<ReloadOutcome, CatalogLoadError> {
        let source = self.source.clone().ok_or(CatalogLoadError::NoSource)?;
        let _reloading = self.reload_lock.lock().await;

        let report = tokio::task::spawn_blocking(move || load_source(&source))
            .await
            .map_err(|e| CatalogLoadError::Io(std::io::Error::other(e)))?
            .inspect_err(|e| warn!("Catalog reload failed, keeping current catalog: {}", e))?;

        let activities = report.catalog.len();
        let drop_items = report.catalog.item_count();
        let fingerprint = report.catalog.fingerprint().clone();

        let previous = self.replace(report.catalog).await;
        let previous_fingerprint = previous.fingerprint().clone();
        let changed = previous_fingerprint != fingerprint;

        info!(
            "Catalog reloaded: {} -> {} ({} activities, {} drop items{})",
            previous_fingerprint.short(),
            fingerprint.short(),
            activities,
            drop_items,
            if changed { "" } else { ", unchanged" }
        );

        Ok(ReloadOutcome {
            previous_fingerprint,
            fingerprint,
            changed,
            activities,
            drop_items,
            warnings: report.warnings,
        })
    }
}
