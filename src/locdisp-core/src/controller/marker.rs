// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Invisible tap target kept on top of the live location.
//!
//! The visible location symbol is drawn by the location source itself. The
//! marker here only exists so that taps on the user's position can be
//! recognised, so its overlay is fully transparent.

use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::{info, warn};

use crate::geometry::Point;
use crate::overlay::{Graphic, GraphicsOverlay, MapOverlays, OverlayId, SharedOverlay};

/// Attribute key identifying the location marker graphic.
pub const LOCATION_ATTRIBUTE: &str = "my_location_attribute";

/// Overlay list change decided under the controller lock and applied after
/// it is released.
#[derive(Debug)]
pub enum OverlayChange {
    Attach(SharedOverlay),
    Detach(OverlayId),
}

impl OverlayChange {
    pub fn apply(self, overlays: &dyn MapOverlays) {
        match self {
            OverlayChange::Attach(overlay) => {
                overlays.add_overlay(overlay);
                info!("Location marker overlay attached");
            }
            OverlayChange::Detach(id) => {
                overlays.remove_overlay(id);
                info!("Location marker overlay detached");
            }
        }
    }
}

/// Owns the marker overlay and its attachment to the map.
///
/// Invariants: the overlay holds one marker graphic, and it is attached to
/// the map iff tap tracking is enabled. The overlay is shared with the map,
/// so a marker removed by the host is put back on the next update.
#[derive(Debug)]
pub struct MarkerSync {
    overlay: SharedOverlay,
    tracking_tap_enabled: bool,
}

impl MarkerSync {
    pub fn new(geometry: Option<Point>) -> Self {
        let overlay = GraphicsOverlay {
            opacity: 0.0,
            graphics: vec![marker_graphic(geometry)],
            ..GraphicsOverlay::new()
        };
        Self {
            overlay: Arc::new(RwLock::new(overlay)),
            tracking_tap_enabled: false,
        }
    }

    pub fn overlay(&self) -> SharedOverlay {
        Arc::clone(&self.overlay)
    }

    pub fn overlay_id(&self) -> OverlayId {
        self.overlay.read().expect("marker overlay lock poisoned").id
    }

    pub fn geometry(&self) -> Option<Point> {
        let overlay = self.overlay.read().expect("marker overlay lock poisoned");
        overlay
            .graphics
            .iter()
            .find(|graphic| Self::is_location_marker(graphic))
            .and_then(|graphic| graphic.geometry)
    }

    pub fn set_geometry(&self, geometry: Option<Point>) {
        let mut overlay = self.overlay.write().expect("marker overlay lock poisoned");
        match overlay
            .graphics
            .iter_mut()
            .find(|graphic| Self::is_location_marker(graphic))
        {
            Some(marker) => marker.geometry = geometry,
            None => {
                warn!("Location marker missing from its overlay; restoring it");
                overlay.graphics.push(marker_graphic(geometry));
            }
        }
    }

    pub fn tracking_tap_enabled(&self) -> bool {
        self.tracking_tap_enabled
    }

    /// Flip the tracking flag. Returns the overlay change to apply, or
    /// `None` when `enabled` is unchanged.
    pub fn set_tracking_tap_enabled(&mut self, enabled: bool) -> Option<OverlayChange> {
        if self.tracking_tap_enabled == enabled {
            return None;
        }
        self.tracking_tap_enabled = enabled;
        Some(if enabled {
            OverlayChange::Attach(self.overlay())
        } else {
            OverlayChange::Detach(self.overlay_id())
        })
    }

    pub fn is_location_marker(graphic: &Graphic) -> bool {
        graphic.has_attribute(LOCATION_ATTRIBUTE)
    }
}

fn marker_graphic(geometry: Option<Point>) -> Graphic {
    Graphic {
        geometry,
        ..Graphic::default()
    }
    .with_attribute(LOCATION_ATTRIBUTE, Value::Bool(true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeOverlays {
        attached: Mutex<Vec<OverlayId>>,
        add_calls: Mutex<usize>,
    }

    impl MapOverlays for FakeOverlays {
        fn add_overlay(&self, overlay: SharedOverlay) {
            *self.add_calls.lock().unwrap() += 1;
            self.attached.lock().unwrap().push(overlay.read().unwrap().id);
        }

        fn remove_overlay(&self, id: OverlayId) {
            self.attached.lock().unwrap().retain(|a| *a != id);
        }
    }

    #[test]
    fn test_overlay_holds_single_transparent_marker() {
        let sync = MarkerSync::new(Some(Point::wgs84(1.0, 2.0)));
        let overlay = sync.overlay();
        let overlay = overlay.read().unwrap();
        assert_eq!(overlay.opacity, 0.0);
        assert_eq!(overlay.graphics.len(), 1);
        assert!(MarkerSync::is_location_marker(&overlay.graphics[0]));
        assert_eq!(overlay.graphics[0].geometry, Some(Point::wgs84(1.0, 2.0)));
    }

    #[test]
    fn test_set_geometry_is_visible_through_shared_overlay() {
        let sync = MarkerSync::new(None);
        let shared = sync.overlay();
        sync.set_geometry(Some(Point::wgs84(3.0, 4.0)));
        let shared_geometry = shared.read().unwrap().graphics[0].geometry;
        assert_eq!(shared_geometry, sync.geometry());
        sync.set_geometry(None);
        assert_eq!(sync.geometry(), None);
    }

    fn toggle(sync: &mut MarkerSync, enabled: bool, overlays: &FakeOverlays) -> bool {
        match sync.set_tracking_tap_enabled(enabled) {
            Some(change) => {
                change.apply(overlays);
                true
            }
            None => false,
        }
    }

    #[test]
    fn test_tracking_toggle_is_idempotent() {
        let overlays = FakeOverlays::default();
        let mut sync = MarkerSync::new(None);

        assert!(!toggle(&mut sync, false, &overlays));
        assert!(toggle(&mut sync, true, &overlays));
        assert!(!toggle(&mut sync, true, &overlays));
        assert_eq!(*overlays.add_calls.lock().unwrap(), 1);
        assert_eq!(*overlays.attached.lock().unwrap(), vec![sync.overlay_id()]);

        assert!(toggle(&mut sync, false, &overlays));
        assert!(overlays.attached.lock().unwrap().is_empty());
        assert!(!sync.tracking_tap_enabled());
    }

    #[test]
    fn test_toggle_defers_overlay_calls_to_caller() {
        let mut sync = MarkerSync::new(None);
        match sync.set_tracking_tap_enabled(true) {
            Some(OverlayChange::Attach(overlay)) => {
                let id = overlay.read().unwrap().id;
                assert_eq!(id, sync.overlay_id());
            }
            other => panic!("expected attach, got {:?}", other),
        }
        assert!(sync.tracking_tap_enabled());
        assert!(matches!(
            sync.set_tracking_tap_enabled(false),
            Some(OverlayChange::Detach(id)) if id == sync.overlay_id()
        ));
    }

    #[test]
    fn test_cleared_overlay_gets_marker_back() {
        let sync = MarkerSync::new(Some(Point::wgs84(1.0, 2.0)));
        sync.overlay().write().unwrap().graphics.clear();
        assert_eq!(sync.geometry(), None);

        sync.set_geometry(Some(Point::wgs84(5.0, 6.0)));
        assert_eq!(sync.geometry(), Some(Point::wgs84(5.0, 6.0)));
        let overlay = sync.overlay();
        let overlay = overlay.read().unwrap();
        assert_eq!(overlay.graphics.len(), 1);
        assert!(MarkerSync::is_location_marker(&overlay.graphics[0]));
    }

    #[test]
    fn test_marker_found_behind_foreign_graphic() {
        let sync = MarkerSync::new(None);
        sync.overlay().write().unwrap().graphics.insert(0, Graphic::new());
        sync.set_geometry(Some(Point::wgs84(7.0, 8.0)));
        assert_eq!(sync.geometry(), Some(Point::wgs84(7.0, 8.0)));

        let overlay = sync.overlay();
        let overlay = overlay.read().unwrap();
        assert_eq!(overlay.graphics.len(), 2);
        assert_eq!(overlay.graphics[0].geometry, None);
    }

    #[test]
    fn test_is_location_marker() {
        assert!(!MarkerSync::is_location_marker(&Graphic::new()));
        let tagged = Graphic::new().with_attribute(LOCATION_ATTRIBUTE, Value::Bool(false));
        assert!(MarkerSync::is_location_marker(&tagged));
    }
}
