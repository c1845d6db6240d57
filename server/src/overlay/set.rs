//! The overlay collections and the rules that keep them consistent.
//!
//! `OverlaySet` is the single-owner core: it holds the overlays from the
//! latest server payload ("data overlays"), the application's own overlays
//! ("system overlays") and the congestion flag. Shared access goes through
//! [`super::store::OverlayStore`], which wraps one of these in a lock.

use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

use super::types::{LocationOverlay, Overlay, OverlayError, RouteOverlay};

/// Data and system overlays plus the congestion flag
#[derive(Debug, Clone, Default)]
pub struct OverlaySet {
    has_congestions: bool,
    data: Vec<Overlay>,
    system: Vec<Overlay>,
}

impl OverlaySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_congestions(&self) -> bool {
        self.has_congestions
    }

    pub fn set_has_congestions(&mut self, value: bool) {
        self.has_congestions = value;
    }

    /// Add a data overlay
    pub fn add_overlay(&mut self, overlay: Overlay) {
        self.add_overlay_with(overlay, false);
    }

    /// Add an overlay to the data or the system collection.
    ///
    /// A system route replaces any existing route and goes to the front of
    /// the system overlays; everything else is appended.
    pub fn add_overlay_with(&mut self, overlay: Overlay, is_system: bool) {
        if !is_system {
            self.data.push(overlay);
            return;
        }

        if overlay.is_route() {
            let before = self.system.len();
            self.system.retain(|o| !o.is_route());
            let removed = before - self.system.len();
            if removed > 0 {
                debug!("Replacing system route with {}", overlay.id());
            }
            self.system.insert(0, overlay);
        } else {
            self.system.push(overlay);
        }
    }

    /// Whether adding `overlay` would swap out an existing system route
    pub fn replaces_route(&self, overlay: &Overlay, is_system: bool) -> bool {
        is_system && overlay.is_route() && self.route_overlay().is_some()
    }

    /// Whether an overlay with this id is in either collection
    pub fn contains(&self, id: Uuid) -> bool {
        self.data.iter().chain(&self.system).any(|o| o.id() == id)
    }

    /// Check that `overlay` can be added without its id appearing twice.
    ///
    /// Re-setting the current system route with the same id is allowed, as
    /// the old copy is removed by the insertion.
    pub fn check_insert(&self, overlay: &Overlay, is_system: bool) -> Result<(), OverlayError> {
        let id = overlay.id();
        let replaces_itself = is_system
            && overlay.is_route()
            && self.route_overlay().is_some_and(|r| r.id == id)
            && !self.data.iter().any(|o| o.id() == id);

        if self.contains(id) && !replaces_itself {
            return Err(OverlayError::InvalidArgument(format!(
                "overlay {} is already stored",
                id
            )));
        }
        Ok(())
    }

    /// Check a server payload: ids must be unique and must not collide with
    /// system overlays. Current data overlays are replaced, so they don't count.
    pub fn check_remote_update(&self, overlays: &[Overlay]) -> Result<(), OverlayError> {
        let mut seen = HashSet::with_capacity(overlays.len());
        for overlay in overlays {
            let id = overlay.id();
            if !seen.insert(id) || self.system.iter().any(|o| o.id() == id) {
                return Err(OverlayError::InvalidArgument(format!(
                    "overlay {} appears more than once",
                    id
                )));
            }
        }
        Ok(())
    }

    /// Append each overlay to the data collection, in order
    pub fn add_overlays<I>(&mut self, overlays: I)
    where
        I: IntoIterator<Item = Overlay>,
    {
        self.data.extend(overlays);
    }

    /// Remove the system route, if any
    pub fn delete_route_overlay(&mut self) -> Option<Overlay> {
        let pos = self.system.iter().position(Overlay::is_route)?;
        Some(self.system.remove(pos))
    }

    /// Drop the data overlays, keeping system overlays
    pub fn clear_overlays(&mut self) {
        self.data.clear();
    }

    pub fn clear_all_overlays(&mut self) {
        self.data.clear();
        self.system.clear();
    }

    /// Replace the data overlays with a fresh server payload
    pub fn apply_remote_update(&mut self, has_congestions: bool, overlays: Vec<Overlay>) {
        self.has_congestions = has_congestions;
        self.data = overlays;
    }

    /// Data overlays followed by system overlays
    pub fn overlays(&self) -> Vec<Overlay> {
        let mut all = Vec::with_capacity(self.len());
        all.extend(self.data.iter().cloned());
        all.extend(self.system.iter().cloned());
        all
    }

    pub fn data_overlays(&self) -> &[Overlay] {
        &self.data
    }

    pub fn system_overlays(&self) -> &[Overlay] {
        &self.system
    }

    /// First location marker among the system overlays
    pub fn location_overlay(&self) -> Option<&LocationOverlay> {
        self.system.iter().find_map(Overlay::as_location)
    }

    pub fn route_overlay(&self) -> Option<&RouteOverlay> {
        self.system.iter().find_map(Overlay::as_route)
    }

    pub fn len(&self) -> usize {
        self.data.len() + self.system.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.system.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{congestion, ids, location, marker, route};

    #[test]
    fn test_data_overlays_keep_insertion_order() {
        let mut set = OverlaySet::new();
        let a = congestion();
        let b = marker("Accident");
        let expected = ids(&[a.clone(), b.clone()]);

        set.add_overlay(a);
        set.add_overlay_with(b, false);

        assert_eq!(ids(set.data_overlays()), expected);
        assert!(set.system_overlays().is_empty());
    }

    #[test]
    fn test_system_route_goes_to_front() {
        let mut set = OverlaySet::new();
        let loc = location();
        let cam = marker("Camera");
        let r = route();

        set.add_overlay_with(loc.clone(), true);
        set.add_overlay_with(cam.clone(), true);
        set.add_overlay_with(r.clone(), true);

        assert_eq!(ids(set.system_overlays()), ids(&[r, loc, cam]));
    }

    #[test]
    fn test_second_route_replaces_first() {
        let mut set = OverlaySet::new();
        let loc = location();
        let a = route();
        let b = route();

        set.add_overlay_with(loc.clone(), true);
        set.add_overlay_with(a, true);
        set.add_overlay_with(b.clone(), true);

        assert_eq!(ids(set.system_overlays()), ids(&[b.clone(), loc.clone()]));
        assert_eq!(set.route_overlay().map(|r| r.id), Some(b.id()));
        assert_eq!(set.location_overlay().map(|l| l.id), Some(loc.id()));

        let removed = set.delete_route_overlay();
        assert_eq!(removed.map(|o| o.id()), Some(b.id()));
        assert_eq!(ids(set.system_overlays()), ids(&[loc]));
    }

    #[test]
    fn test_data_route_is_not_deduplicated() {
        let mut set = OverlaySet::new();
        set.add_overlay_with(route(), true);
        set.add_overlay(route());
        set.add_overlay(route());

        assert_eq!(set.data_overlays().len(), 2);
        assert_eq!(set.system_overlays().len(), 1);
    }

    #[test]
    fn test_delete_route_without_route_is_noop() {
        let mut set = OverlaySet::new();
        assert!(set.delete_route_overlay().is_none());

        set.add_overlay_with(location(), true);
        set.add_overlay(route());
        assert!(set.delete_route_overlay().is_none());
        assert_eq!(set.system_overlays().len(), 1);
        assert_eq!(set.data_overlays().len(), 1);
    }

    #[test]
    fn test_add_overlays_appends_to_data() {
        let mut set = OverlaySet::new();
        let first = marker("first");
        set.add_overlay(first.clone());
        set.add_overlay_with(location(), true);

        let batch = vec![congestion(), congestion(), marker("last")];
        let mut expected = ids(&[first]);
        expected.extend(ids(&batch));

        set.add_overlays(batch);

        assert_eq!(ids(set.data_overlays()), expected);
        assert_eq!(set.system_overlays().len(), 1);
    }

    #[test]
    fn test_overlays_lists_data_before_system() {
        let mut set = OverlaySet::new();
        let loc = location();
        let d1 = congestion();
        let d2 = marker("Roadworks");

        set.add_overlay_with(loc.clone(), true);
        set.add_overlay(d1.clone());
        set.add_overlay(d2.clone());

        let all = set.overlays();
        assert_eq!(all.len(), set.len());
        assert_eq!(ids(&all), ids(&[d1, d2, loc]));
    }

    #[test]
    fn test_overlays_is_a_copy() {
        let mut set = OverlaySet::new();
        set.add_overlay(congestion());

        let mut snapshot = set.overlays();
        snapshot.clear();

        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_clear_overlays_keeps_system() {
        let mut set = OverlaySet::new();
        let loc = location();
        let r = route();
        set.add_overlay_with(loc.clone(), true);
        set.add_overlay_with(r.clone(), true);
        set.add_overlay(congestion());

        let system_before = ids(set.system_overlays());
        set.clear_overlays();

        assert!(set.data_overlays().is_empty());
        assert_eq!(ids(set.system_overlays()), system_before);
        assert_eq!(ids(&set.overlays()), ids(&[r, loc]));
    }

    #[test]
    fn test_clear_all_overlays() {
        let mut set = OverlaySet::new();
        set.add_overlay_with(location(), true);
        set.add_overlay(congestion());

        set.clear_all_overlays();

        assert!(set.is_empty());
        assert!(set.overlays().is_empty());
        assert!(set.location_overlay().is_none());
    }

    #[test]
    fn test_location_lookup_ignores_data_overlays() {
        let mut set = OverlaySet::new();
        set.add_overlay(location());
        assert!(set.location_overlay().is_none());

        let first = location();
        set.add_overlay_with(first.clone(), true);
        set.add_overlay_with(location(), true);
        assert_eq!(set.location_overlay().map(|l| l.id), Some(first.id()));
    }

    #[test]
    fn test_congestion_flag_is_independent() {
        let mut set = OverlaySet::new();
        assert!(!set.has_congestions());

        set.set_has_congestions(true);
        set.add_overlay(congestion());
        set.clear_all_overlays();
        assert!(set.has_congestions());

        set.set_has_congestions(false);
        set.add_overlay(congestion());
        assert!(!set.has_congestions());
    }

    #[test]
    fn test_replaces_route_only_with_existing_route() {
        let mut set = OverlaySet::new();
        let first = route();
        assert!(!set.replaces_route(&first, true));

        set.add_overlay_with(first, true);
        assert!(set.replaces_route(&route(), true));
        assert!(!set.replaces_route(&route(), false));
        assert!(!set.replaces_route(&marker("Camera"), true));

        set.delete_route_overlay();
        assert!(!set.replaces_route(&route(), true));
    }

    #[test]
    fn test_check_insert_rejects_stored_id() {
        let mut set = OverlaySet::new();
        let m = marker("dup");
        assert!(set.check_insert(&m, false).is_ok());
        set.add_overlay(m.clone());

        assert!(set.contains(m.id()));
        assert!(matches!(
            set.check_insert(&m, true),
            Err(OverlayError::InvalidArgument(_))
        ));
        assert!(set.check_insert(&m, false).is_err());
    }

    #[test]
    fn test_check_insert_allows_resetting_current_route() {
        let mut set = OverlaySet::new();
        let r = route();
        set.add_overlay_with(r.clone(), true);

        assert!(set.check_insert(&r, true).is_ok());
        assert!(set.check_insert(&r, false).is_err());
    }

    #[test]
    fn test_check_remote_update() {
        let mut set = OverlaySet::new();
        let loc = location();
        let stale = marker("stale");
        set.add_overlay_with(loc.clone(), true);
        set.add_overlay(stale.clone());

        // Current data overlays are replaced, so re-sending them is fine
        assert!(set.check_remote_update(&[stale.clone(), congestion()]).is_ok());

        let c = congestion();
        assert!(set.check_remote_update(&[c.clone(), c]).is_err());
        assert!(set.check_remote_update(&[loc]).is_err());
    }

    #[test]
    fn test_remote_update_replaces_data() {
        let mut set = OverlaySet::new();
        let loc = location();
        set.add_overlay_with(loc.clone(), true);
        set.add_overlay(marker("stale"));

        let fresh = vec![congestion(), congestion()];
        let expected = ids(&fresh);
        set.apply_remote_update(true, fresh);

        assert!(set.has_congestions());
        assert_eq!(ids(set.data_overlays()), expected);
        assert_eq!(ids(set.system_overlays()), ids(&[loc]));
    }
}
