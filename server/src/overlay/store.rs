//! Shared overlay store
//!
//! `OverlayStore` is a cloneable handle to one [`OverlaySet`] behind a single
//! `RwLock`. Each operation takes the lock exactly once, so a route
//! replacement or a full remote update is never observed half-done.

use metrics::{counter, gauge};
use std::sync::{Arc, OnceLock};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::set::OverlaySet;
use super::types::{LocationOverlay, Overlay, OverlayCategory, OverlayError, RouteOverlay};
use crate::protocol::{OverlaysResponse, RemoteUpdate};

static GLOBAL_STORE: OnceLock<OverlayStore> = OnceLock::new();

/// Overlay store: the one source of truth for the active overlays
#[derive(Clone, Default)]
pub struct OverlayStore {
    inner: Arc<RwLock<OverlaySet>>,
}

impl OverlayStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide store, created on first access
    pub fn global() -> &'static OverlayStore {
        GLOBAL_STORE.get_or_init(|| {
            debug!("Creating process-wide overlay store");
            OverlayStore::new()
        })
    }

    pub async fn has_congestions(&self) -> bool {
        self.inner.read().await.has_congestions()
    }

    pub async fn set_has_congestions(&self, value: bool) {
        self.inner.write().await.set_has_congestions(value);
        debug!("Congestion flag set to {}", value);
    }

    /// Add a data overlay
    pub async fn add_overlay(&self, overlay: Overlay) {
        self.add_overlay_with(overlay, false).await;
    }

    /// Add an overlay to the data or the system collection
    pub async fn add_overlay_with(&self, overlay: Overlay, is_system: bool) {
        let mut set = self.inner.write().await;
        insert(&mut set, overlay, is_system);
    }

    /// Like [`Self::add_overlay_with`], but rejects an overlay whose id is
    /// already stored. Check and insertion happen under one write lock.
    pub async fn try_add_overlay_with(
        &self,
        overlay: Overlay,
        is_system: bool,
    ) -> Result<(), OverlayError> {
        let mut set = self.inner.write().await;
        set.check_insert(&overlay, is_system)?;
        insert(&mut set, overlay, is_system);
        Ok(())
    }

    /// Append overlays to the data collection, in order
    pub async fn add_overlays(&self, overlays: Vec<Overlay>) {
        let count = overlays.len();
        let mut set = self.inner.write().await;
        set.add_overlays(overlays);
        record_sizes(&set);

        counter!("trafficjam_overlays_added_total", "collection" => "data")
            .increment(count as u64);
        debug!("Added {} data overlays", count);
    }

    /// Remove the active route, returning it if there was one
    pub async fn delete_route_overlay(&self) -> Option<Overlay> {
        let mut set = self.inner.write().await;
        let removed = set.delete_route_overlay();
        record_sizes(&set);

        match &removed {
            Some(route) => info!("Removed route {}", route.id()),
            None => debug!("No route to remove"),
        }
        removed
    }

    /// Drop the data overlays, keeping system overlays
    pub async fn clear_overlays(&self) {
        let mut set = self.inner.write().await;
        set.clear_overlays();
        record_sizes(&set);
        debug!("Cleared data overlays");
    }

    pub async fn clear_all_overlays(&self) {
        let mut set = self.inner.write().await;
        set.clear_all_overlays();
        record_sizes(&set);
        debug!("Cleared all overlays");
    }

    /// Apply one server payload: set the flag and replace the data overlays
    pub async fn apply_remote_update(&self, update: RemoteUpdate) {
        let mut set = self.inner.write().await;
        apply_update(&mut set, update);
    }

    /// Like [`Self::apply_remote_update`], but rejects payloads with
    /// repeated ids or ids already used by a system overlay
    pub async fn try_apply_remote_update(&self, update: RemoteUpdate) -> Result<(), OverlayError> {
        let mut set = self.inner.write().await;
        set.check_remote_update(&update.overlays)?;
        apply_update(&mut set, update);
        Ok(())
    }

    /// Data overlays followed by system overlays
    pub async fn overlays(&self) -> Vec<Overlay> {
        self.inner.read().await.overlays()
    }

    pub async fn data_overlays(&self) -> Vec<Overlay> {
        self.inner.read().await.data_overlays().to_vec()
    }

    pub async fn system_overlays(&self) -> Vec<Overlay> {
        self.inner.read().await.system_overlays().to_vec()
    }

    pub async fn location_overlay(&self) -> Option<LocationOverlay> {
        self.inner.read().await.location_overlay().cloned()
    }

    pub async fn route_overlay(&self) -> Option<RouteOverlay> {
        self.inner.read().await.route_overlay().cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Flag and draw list read together
    pub async fn snapshot(&self) -> OverlaysResponse {
        let set = self.inner.read().await;
        OverlaysResponse {
            has_congestions: set.has_congestions(),
            overlays: set.overlays(),
            data_count: set.data_overlays().len(),
            system_count: set.system_overlays().len(),
        }
    }
}

fn insert(set: &mut OverlaySet, overlay: Overlay, is_system: bool) {
    let id = overlay.id();
    let category = overlay.category();
    let replaces_route = set.replaces_route(&overlay, is_system);

    set.add_overlay_with(overlay, is_system);
    record_sizes(set);

    let collection = if is_system { "system" } else { "data" };
    counter!("trafficjam_overlays_added_total", "collection" => collection).increment(1);
    if replaces_route {
        counter!("trafficjam_route_replacements_total").increment(1);
    }
    if is_system && category == OverlayCategory::Route {
        info!("Active route is now {}", id);
    }
    debug!(
        "Added {} overlay {} to {} overlays ({} data, {} system)",
        category.as_str(),
        id,
        collection,
        set.data_overlays().len(),
        set.system_overlays().len()
    );
}

fn apply_update(set: &mut OverlaySet, update: RemoteUpdate) {
    let count = update.overlays.len();
    set.apply_remote_update(update.has_congestions, update.overlays);
    record_sizes(set);

    counter!("trafficjam_remote_updates_total").increment(1);
    info!(
        "Applied remote update: {} data overlays, congestions={}",
        count, update.has_congestions
    );
}

fn record_sizes(set: &OverlaySet) {
    gauge!("trafficjam_overlays_data").set(set.data_overlays().len() as f64);
    gauge!("trafficjam_overlays_system").set(set.system_overlays().len() as f64);
}
