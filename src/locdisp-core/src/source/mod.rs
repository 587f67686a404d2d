// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Location source capability interface.
//!
//! A location source is owned by the map engine. The controller only reads
//! from it, pushes settings into it and listens to its three event streams.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::geometry::Point;
use crate::location::{AutoPanMode, Location, SourceStatus};

pub mod simulated;

pub use simulated::{SimulatedSource, SourceSettings, StartBehavior};

/// Unique identifier for a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

pub trait StatusChangedListener: Send + Sync {
    fn on_status_changed(&self, status: &SourceStatus);
}

pub trait AutoPanModeChangedListener: Send + Sync {
    fn on_auto_pan_mode_changed(&self, mode: AutoPanMode);
}

pub trait LocationChangedListener: Send + Sync {
    fn on_location_changed(&self, location: &Location);
}

/// Live-location subsystem of a map engine.
///
/// Implementations must not hold internal locks while invoking listeners:
/// listeners read the source back from inside the callback.
pub trait LocationSource: Send + Sync {
    fn is_started(&self) -> bool;

    /// Latest raw fix, if any.
    fn location(&self) -> Option<Location>;

    /// Latest fix projected into the map's spatial reference.
    fn map_location(&self) -> Option<Point>;

    fn heading(&self) -> f64;

    fn auto_pan_mode(&self) -> AutoPanMode;

    fn set_auto_pan_mode(&self, mode: AutoPanMode);
    fn set_initial_zoom_scale(&self, scale: f64);
    fn set_navigation_point_height_factor(&self, factor: f64);
    fn set_wander_extent_factor(&self, factor: f64);
    fn set_opacity(&self, opacity: f64);
    fn set_show_accuracy(&self, show: bool);
    fn set_show_location(&self, show: bool);
    fn set_show_ping_animation(&self, show: bool);
    fn set_use_course_symbol_on_movement(&self, enabled: bool);

    /// Begin starting the source. The outcome is reported later through a
    /// status-changed notification, possibly before this call returns.
    fn start(&self);

    fn stop(&self);

    fn add_status_changed_listener(&self, listener: Arc<dyn StatusChangedListener>) -> ListenerId;

    fn add_auto_pan_mode_changed_listener(
        &self,
        listener: Arc<dyn AutoPanModeChangedListener>,
    ) -> ListenerId;

    fn add_location_changed_listener(
        &self,
        listener: Arc<dyn LocationChangedListener>,
    ) -> ListenerId;

    /// Remove a listener from whichever stream it was registered on.
    /// Unknown ids are ignored.
    fn remove_listener(&self, id: ListenerId);
}

/// Listener bookkeeping for source implementations.
pub struct ListenerRegistry {
    status: Vec<(ListenerId, Arc<dyn StatusChangedListener>)>,
    auto_pan: Vec<(ListenerId, Arc<dyn AutoPanModeChangedListener>)>,
    location: Vec<(ListenerId, Arc<dyn LocationChangedListener>)>,
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            status: Vec::new(),
            auto_pan: Vec::new(),
            location: Vec::new(),
        }
    }

    pub fn add_status(&mut self, listener: Arc<dyn StatusChangedListener>) -> ListenerId {
        let id = ListenerId::new();
        self.status.push((id, listener));
        id
    }

    pub fn add_auto_pan(&mut self, listener: Arc<dyn AutoPanModeChangedListener>) -> ListenerId {
        let id = ListenerId::new();
        self.auto_pan.push((id, listener));
        id
    }

    pub fn add_location(&mut self, listener: Arc<dyn LocationChangedListener>) -> ListenerId {
        let id = ListenerId::new();
        self.location.push((id, listener));
        id
    }

    pub fn remove(&mut self, id: ListenerId) {
        self.status.retain(|(lid, _)| *lid != id);
        self.auto_pan.retain(|(lid, _)| *lid != id);
        self.location.retain(|(lid, _)| *lid != id);
    }

    pub fn listener_count(&self) -> usize {
        self.status.len() + self.auto_pan.len() + self.location.len()
    }

    /// Snapshot of the status listeners, so they can be invoked unlocked.
    pub fn status_listeners(&self) -> Vec<Arc<dyn StatusChangedListener>> {
        self.status.iter().map(|(_, l)| Arc::clone(l)).collect()
    }

    pub fn auto_pan_listeners(&self) -> Vec<Arc<dyn AutoPanModeChangedListener>> {
        self.auto_pan.iter().map(|(_, l)| Arc::clone(l)).collect()
    }

    pub fn location_listeners(&self) -> Vec<Arc<dyn LocationChangedListener>> {
        self.location.iter().map(|(_, l)| Arc::clone(l)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    struct TestListener {
        status_seen: AtomicBool,
        location_seen: AtomicBool,
    }

    impl TestListener {
        fn new() -> Self {
            Self {
                status_seen: AtomicBool::new(false),
                location_seen: AtomicBool::new(false),
            }
        }
    }

    impl StatusChangedListener for TestListener {
        fn on_status_changed(&self, _status: &SourceStatus) {
            self.status_seen.store(true, Ordering::Relaxed);
        }
    }

    impl LocationChangedListener for TestListener {
        fn on_location_changed(&self, _location: &Location) {
            self.location_seen.store(true, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_register_and_remove() {
        let mut registry = ListenerRegistry::new();
        let listener = Arc::new(TestListener::new());
        let status_id = registry.add_status(listener.clone());
        let location_id = registry.add_location(listener.clone());
        assert_ne!(status_id, location_id);
        assert_eq!(registry.listener_count(), 2);

        for l in registry.status_listeners() {
            l.on_status_changed(&SourceStatus::started());
        }
        assert!(listener.status_seen.load(Ordering::Relaxed));
        assert!(!listener.location_seen.load(Ordering::Relaxed));

        registry.remove(status_id);
        assert_eq!(registry.listener_count(), 1);
        assert!(registry.status_listeners().is_empty());

        registry.remove(location_id);
        assert_eq!(registry.listener_count(), 0);
    }

    #[test]
    fn test_remove_unknown_id_is_ignored() {
        let mut registry = ListenerRegistry::new();
        registry.add_location(Arc::new(TestListener::new()));
        registry.remove(ListenerId::new());
        assert_eq!(registry.listener_count(), 1);
    }
}
