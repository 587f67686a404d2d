// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Simulated location source for development and testing.
//!
//! Holds settings and the latest fix in memory. No positioning hardware or
//! map engine required; fixes are injected with [`SimulatedSource::push_location`].

use std::sync::{Arc, Mutex};

use crate::geometry::Point;
use crate::location::{AutoPanMode, Location, SourceStatus};

use super::{
    AutoPanModeChangedListener, ListenerId, ListenerRegistry, LocationChangedListener,
    LocationSource, StatusChangedListener,
};

/// How [`SimulatedSource::start`] completes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StartBehavior {
    /// Report "started" before `start` returns.
    #[default]
    Succeed,
    /// Report a failed status with the given message before `start` returns.
    Fail(String),
    /// Report nothing until [`SimulatedSource::complete_start`] is called.
    Defer,
}

/// Display settings pushed into the source by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSettings {
    pub initial_zoom_scale: f64,
    pub navigation_point_height_factor: f64,
    pub wander_extent_factor: f64,
    pub opacity: f64,
    pub show_accuracy: bool,
    pub show_location: bool,
    pub show_ping_animation: bool,
    pub use_course_symbol_on_movement: bool,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            initial_zoom_scale: 10_000.0,
            navigation_point_height_factor: 0.125,
            wander_extent_factor: 0.5,
            opacity: 1.0,
            show_accuracy: true,
            show_location: true,
            show_ping_animation: true,
            use_course_symbol_on_movement: true,
        }
    }
}

#[derive(Default)]
struct SimState {
    started: bool,
    starting: bool,
    location: Option<Location>,
    heading: f64,
    auto_pan_mode: AutoPanMode,
    settings: SourceSettings,
    start_behavior: StartBehavior,
    start_calls: usize,
}

pub struct SimulatedSource {
    state: Mutex<SimState>,
    listeners: Mutex<ListenerRegistry>,
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedSource {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState::default()),
            listeners: Mutex::new(ListenerRegistry::new()),
        }
    }

    pub fn with_start_behavior(behavior: StartBehavior) -> Self {
        let source = Self::new();
        source.set_start_behavior(behavior);
        source
    }

    pub fn set_start_behavior(&self, behavior: StartBehavior) {
        self.lock_state().start_behavior = behavior;
    }

    /// Copy of the current display settings.
    pub fn settings(&self) -> SourceSettings {
        self.lock_state().settings.clone()
    }

    /// Number of times `start` has been invoked.
    pub fn start_calls(&self) -> usize {
        self.lock_state().start_calls
    }

    pub fn is_starting(&self) -> bool {
        self.lock_state().starting
    }

    pub fn listener_count(&self) -> usize {
        self.lock_listeners().listener_count()
    }

    pub fn set_heading(&self, heading: f64) {
        self.lock_state().heading = heading.rem_euclid(360.0);
    }

    /// Finish a deferred start with the given outcome.
    pub fn complete_start(&self, outcome: Result<(), String>) {
        let status = {
            let mut state = self.lock_state();
            state.starting = false;
            state.started = outcome.is_ok();
            match outcome {
                Ok(()) => SourceStatus::started(),
                Err(message) => SourceStatus::failed(message),
            }
        };
        self.emit_status(&status);
    }

    /// Emit an arbitrary status notification without touching the run state.
    pub fn emit_status(&self, status: &SourceStatus) {
        let listeners = self.lock_listeners().status_listeners();
        for listener in listeners {
            listener.on_status_changed(status);
        }
    }

    /// Store a new fix and notify location listeners.
    pub fn push_location(&self, location: Location) {
        {
            let mut state = self.lock_state();
            state.heading = location.course.rem_euclid(360.0);
            state.location = Some(location.clone());
        }
        let listeners = self.lock_listeners().location_listeners();
        for listener in listeners {
            listener.on_location_changed(&location);
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state.lock().expect("simulated source mutex poisoned")
    }

    fn lock_listeners(&self) -> std::sync::MutexGuard<'_, ListenerRegistry> {
        self.listeners
            .lock()
            .expect("simulated source listener mutex poisoned")
    }
}

impl LocationSource for SimulatedSource {
    fn is_started(&self) -> bool {
        self.lock_state().started
    }

    fn location(&self) -> Option<Location> {
        self.lock_state().location.clone()
    }

    fn map_location(&self) -> Option<Point> {
        self.lock_state()
            .location
            .as_ref()
            .map(|l| l.position.to_web_mercator())
    }

    fn heading(&self) -> f64 {
        self.lock_state().heading
    }

    fn auto_pan_mode(&self) -> AutoPanMode {
        self.lock_state().auto_pan_mode
    }

    fn set_auto_pan_mode(&self, mode: AutoPanMode) {
        let changed = {
            let mut state = self.lock_state();
            let changed = state.auto_pan_mode != mode;
            state.auto_pan_mode = mode;
            changed
        };
        if changed {
            let listeners = self.lock_listeners().auto_pan_listeners();
            for listener in listeners {
                listener.on_auto_pan_mode_changed(mode);
            }
        }
    }

    fn set_initial_zoom_scale(&self, scale: f64) {
        self.lock_state().settings.initial_zoom_scale = scale;
    }

    fn set_navigation_point_height_factor(&self, factor: f64) {
        self.lock_state().settings.navigation_point_height_factor = factor;
    }

    fn set_wander_extent_factor(&self, factor: f64) {
        self.lock_state().settings.wander_extent_factor = factor;
    }

    fn set_opacity(&self, opacity: f64) {
        self.lock_state().settings.opacity = opacity;
    }

    fn set_show_accuracy(&self, show: bool) {
        self.lock_state().settings.show_accuracy = show;
    }

    fn set_show_location(&self, show: bool) {
        self.lock_state().settings.show_location = show;
    }

    fn set_show_ping_animation(&self, show: bool) {
        self.lock_state().settings.show_ping_animation = show;
    }

    fn set_use_course_symbol_on_movement(&self, enabled: bool) {
        self.lock_state().settings.use_course_symbol_on_movement = enabled;
    }

    fn start(&self) {
        let behavior = {
            let mut state = self.lock_state();
            state.start_calls += 1;
            state.starting = true;
            state.start_behavior.clone()
        };
        match behavior {
            StartBehavior::Succeed => self.complete_start(Ok(())),
            StartBehavior::Fail(message) => self.complete_start(Err(message)),
            StartBehavior::Defer => {}
        }
    }

    fn stop(&self) {
        let was_running = {
            let mut state = self.lock_state();
            let was_running = state.started || state.starting;
            state.started = false;
            state.starting = false;
            was_running
        };
        if was_running {
            self.emit_status(&SourceStatus::stopped());
        }
    }

    fn add_status_changed_listener(&self, listener: Arc<dyn StatusChangedListener>) -> ListenerId {
        self.lock_listeners().add_status(listener)
    }

    fn add_auto_pan_mode_changed_listener(
        &self,
        listener: Arc<dyn AutoPanModeChangedListener>,
    ) -> ListenerId {
        self.lock_listeners().add_auto_pan(listener)
    }

    fn add_location_changed_listener(
        &self,
        listener: Arc<dyn LocationChangedListener>,
    ) -> ListenerId {
        self.lock_listeners().add_location(listener)
    }

    fn remove_listener(&self, id: ListenerId) {
        self.lock_listeners().remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct Recorder {
        statuses: StdMutex<Vec<SourceStatus>>,
        modes: StdMutex<Vec<AutoPanMode>>,
    }

    impl StatusChangedListener for Recorder {
        fn on_status_changed(&self, status: &SourceStatus) {
            self.statuses.lock().unwrap().push(status.clone());
        }
    }

    impl AutoPanModeChangedListener for Recorder {
        fn on_auto_pan_mode_changed(&self, mode: AutoPanMode) {
            self.modes.lock().unwrap().push(mode);
        }
    }

    #[test]
    fn test_start_succeeds_synchronously() {
        let source = SimulatedSource::new();
        let recorder = Arc::new(Recorder::default());
        source.add_status_changed_listener(recorder.clone());

        source.start();
        assert!(source.is_started());
        assert_eq!(*recorder.statuses.lock().unwrap(), vec![SourceStatus::started()]);
    }

    #[test]
    fn test_start_failure_reports_message() {
        let source = SimulatedSource::with_start_behavior(StartBehavior::Fail("GPS disabled".into()));
        let recorder = Arc::new(Recorder::default());
        source.add_status_changed_listener(recorder.clone());

        source.start();
        assert!(!source.is_started());
        assert_eq!(
            *recorder.statuses.lock().unwrap(),
            vec![SourceStatus::failed("GPS disabled")]
        );
    }

    #[test]
    fn test_deferred_start_waits_for_completion() {
        let source = SimulatedSource::with_start_behavior(StartBehavior::Defer);
        let recorder = Arc::new(Recorder::default());
        source.add_status_changed_listener(recorder.clone());

        source.start();
        assert!(source.is_starting());
        assert!(recorder.statuses.lock().unwrap().is_empty());

        source.complete_start(Ok(()));
        assert!(source.is_started());
        assert_eq!(recorder.statuses.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_stop_emits_only_when_running() {
        let source = SimulatedSource::new();
        let recorder = Arc::new(Recorder::default());
        source.add_status_changed_listener(recorder.clone());

        source.stop();
        assert!(recorder.statuses.lock().unwrap().is_empty());

        source.start();
        source.stop();
        assert_eq!(
            recorder.statuses.lock().unwrap().last(),
            Some(&SourceStatus::stopped())
        );
    }

    #[test]
    fn test_auto_pan_emits_on_change_only() {
        let source = SimulatedSource::new();
        let recorder = Arc::new(Recorder::default());
        source.add_auto_pan_mode_changed_listener(recorder.clone());

        source.set_auto_pan_mode(AutoPanMode::Off);
        source.set_auto_pan_mode(AutoPanMode::Navigation);
        source.set_auto_pan_mode(AutoPanMode::Navigation);
        assert_eq!(*recorder.modes.lock().unwrap(), vec![AutoPanMode::Navigation]);
    }

    #[test]
    fn test_map_location_is_projected() {
        let source = SimulatedSource::new();
        assert!(source.map_location().is_none());

        source.push_location(Location::new(Point::wgs84(0.0, 0.0)));
        let map = source.map_location().unwrap();
        assert_eq!(map.spatial_reference, crate::SpatialReference::WEB_MERCATOR);
    }

    #[test]
    fn test_settings_setters_update_snapshot() {
        let source = SimulatedSource::new();
        assert_eq!(source.settings(), crate::SourceSettings::default());

        source.set_opacity(0.25);
        source.set_show_accuracy(false);
        let settings: crate::SourceSettings = source.settings();
        assert_eq!(settings.opacity, 0.25);
        assert!(!settings.show_accuracy);
        assert_eq!(settings.initial_zoom_scale, 10_000.0);
    }
}
