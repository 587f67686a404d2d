// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Map overlays, graphics and tap hit-testing contracts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde_json::{Map, Value};

use crate::geometry::Point;

/// Identifier of an overlay in the host map's overlay list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayId(u64);

impl OverlayId {
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for OverlayId {
    fn default() -> Self {
        Self::new()
    }
}

/// Graphic with an optional geometry and free-form attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graphic {
    pub geometry: Option<Point>,
    pub attributes: Map<String, Value>,
}

impl Graphic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }
}

/// Layer of graphics that can be attached to or detached from a map.
#[derive(Debug, Clone)]
pub struct GraphicsOverlay {
    pub id: OverlayId,
    pub opacity: f32,
    pub graphics: Vec<Graphic>,
}

impl Default for GraphicsOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsOverlay {
    pub fn new() -> Self {
        Self {
            id: OverlayId::new(),
            opacity: 1.0,
            graphics: Vec::new(),
        }
    }
}

/// Overlay shared between its owner and the map that draws and hit-tests it.
pub type SharedOverlay = Arc<RwLock<GraphicsOverlay>>;

/// The map's overlay list.
pub trait MapOverlays: Send + Sync {
    fn add_overlay(&self, overlay: SharedOverlay);
    fn remove_overlay(&self, id: OverlayId);
}

/// Participant in tap hit-testing.
///
/// On each tap the hit-tester asks every registered consumer whether it can
/// consume taps, then offers it the graphics under the tap in z-order until
/// one is handled.
pub trait TapConsumer: Send + Sync {
    fn can_consume_taps(&self) -> bool;
    fn did_handle_graphic(&self, graphic: &Graphic) -> bool;
}

/// Observer notified when the user taps their own location marker.
pub trait LocationDisplayDelegate: Send + Sync {
    fn on_user_location_tap(&self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_graphic_attributes() {
        let graphic = Graphic::new().with_attribute("kind", json!("pin"));
        assert!(graphic.has_attribute("kind"));
        assert!(!graphic.has_attribute("other"));
    }

    #[test]
    fn test_overlay_ids_are_unique() {
        assert_ne!(GraphicsOverlay::new().id, GraphicsOverlay::new().id);
    }
}
