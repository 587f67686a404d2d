// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Location display controller.
//!
//! One controller binds one host channel to one location source. Commands
//! and events may arrive from different threads; all mutable state sits
//! behind a single mutex. Calls that can re-enter the controller (source
//! start/stop, reply sinks, the delegate, outbound events, overlay list
//! changes) are made with the mutex released. Marker geometry is read from
//! the source and written while the mutex is held, so concurrent events
//! leave the marker on the latest map location.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::channel::{MethodCall, MethodCallHandler, MethodChannel, ResultSink};
use crate::geometry::Point;
use crate::location::{AutoPanMode, Location, SourceStatus};
use crate::overlay::{Graphic, LocationDisplayDelegate, MapOverlays, SharedOverlay, TapConsumer};
use crate::source::{
    AutoPanModeChangedListener, ListenerId, LocationChangedListener, LocationSource,
    StatusChangedListener,
};

use super::command::{CommandError, LocationCommand};
use super::marker::MarkerSync;
use super::pending::{
    PendingStart, DISPOSED_BEFORE_START, START_ALREADY_PENDING, START_FAILED_CODE,
    STOPPED_BEFORE_START,
};

pub const ON_AUTO_PAN_MODE_CHANGED: &str = "onAutoPanModeChanged";
pub const ON_LOCATION_CHANGED: &str = "onLocationChanged";
const INVALID_ARGUMENT_CODE: &str = "Invalid argument";

/// Listener registrations held until disposal.
#[derive(Debug)]
struct Subscriptions {
    status: ListenerId,
    auto_pan: ListenerId,
    location: ListenerId,
}

struct ControllerState {
    pending: PendingStart,
    marker: MarkerSync,
    delegate: Option<Arc<dyn LocationDisplayDelegate>>,
    /// `None` once disposed.
    subscriptions: Option<Subscriptions>,
}

struct ControllerCore {
    channel: Arc<dyn MethodChannel>,
    source: Arc<dyn LocationSource>,
    overlays: Arc<dyn MapOverlays>,
    state: Mutex<ControllerState>,
}

impl ControllerCore {
    fn lock_state(&self) -> MutexGuard<'_, ControllerState> {
        self.state
            .lock()
            .expect("location display controller mutex poisoned")
    }

    fn handle_method_call(&self, call: MethodCall, result: ResultSink) {
        let command = match LocationCommand::parse(&call) {
            Ok(command) => command,
            Err(CommandError::UnknownCommand(method)) => {
                debug!("Unhandled location display method {}", method);
                result.not_implemented();
                return;
            }
            Err(err) => {
                warn!("Rejected {}: {}", call.method, err);
                result.error(INVALID_ARGUMENT_CODE, Some(err.to_string()), None);
                return;
            }
        };
        debug!("Dispatching {:?}", command);
        self.execute(command, result);
    }

    fn execute(&self, command: LocationCommand, result: ResultSink) {
        let source = self.source.as_ref();
        match command {
            LocationCommand::GetStarted => result.success(Value::Bool(source.is_started())),
            LocationCommand::GetLocation => {
                result.success(source.location().map_or(Value::Null, |l| l.to_json()))
            }
            LocationCommand::GetMapLocation => {
                result.success(source.map_location().map_or(Value::Null, |p| p.to_json()))
            }
            LocationCommand::GetHeading => result.success(json!(source.heading())),
            LocationCommand::Start => self.start(result),
            LocationCommand::Stop => self.stop(result),
            // Setters reply by dropping the sink.
            LocationCommand::SetAutoPanMode(mode) => source.set_auto_pan_mode(mode),
            LocationCommand::SetInitialZoomScale(scale) => source.set_initial_zoom_scale(scale),
            LocationCommand::SetNavigationPointHeightFactor(factor) => {
                source.set_navigation_point_height_factor(factor)
            }
            LocationCommand::SetWanderExtentFactor(factor) => {
                source.set_wander_extent_factor(factor)
            }
            LocationCommand::SetUseCourseSymbolOnMovement(enabled) => {
                source.set_use_course_symbol_on_movement(enabled)
            }
            LocationCommand::SetOpacity(opacity) => source.set_opacity(opacity),
            LocationCommand::SetShowAccuracy(show) => source.set_show_accuracy(show),
            LocationCommand::SetShowLocation(show) => source.set_show_location(show),
            LocationCommand::SetShowPingAnimationSymbol(show) => {
                source.set_show_ping_animation(show)
            }
        }
    }

    fn start(&self, result: ResultSink) {
        let rejected = self.lock_state().pending.begin(result).err();
        if let Some(result) = rejected {
            warn!("start rejected: another start is still pending");
            result.error(
                START_FAILED_CODE,
                Some(START_ALREADY_PENDING.to_string()),
                None,
            );
            return;
        }
        info!("Starting location source");
        self.source.start();
    }

    fn stop(&self, result: ResultSink) {
        info!("Stopping location source");
        self.source.stop();
        // A source that stops without reporting status leaves the start
        // pending; fail it here instead.
        let cancelled = self.lock_state().pending.cancel(STOPPED_BEFORE_START);
        if let Some(resolution) = cancelled {
            warn!("Pending start cancelled by stop");
            resolution.resolve();
        }
        result.success(Value::Null);
    }

    fn handle_status_changed(&self, status: &SourceStatus) {
        let resolution = {
            let mut state = self.lock_state();
            state.marker.set_geometry(self.source.map_location());
            state.pending.on_status(status)
        };
        debug!(
            "Location source status: started={} error={:?}",
            status.started, status.error
        );
        if let Some(resolution) = resolution {
            if resolution.is_success() {
                info!("Location source started");
            } else {
                warn!(
                    "Location source failed to start: {}",
                    status.error.as_deref().unwrap_or("unknown error")
                );
            }
            resolution.resolve();
        }
    }

    fn handle_auto_pan_mode_changed(&self, mode: AutoPanMode) {
        debug!("Auto-pan mode changed to {}", mode);
        self.channel
            .invoke_method(ON_AUTO_PAN_MODE_CHANGED, json!(mode.ordinal()));
    }

    fn handle_location_changed(&self, location: &Location) {
        {
            let state = self.lock_state();
            state.marker.set_geometry(self.source.map_location());
        }
        self.channel
            .invoke_method(ON_LOCATION_CHANGED, location.to_json());
    }

    fn can_consume_taps(&self) -> bool {
        self.lock_state().marker.tracking_tap_enabled()
    }

    fn did_handle_graphic(&self, graphic: &Graphic) -> bool {
        if !MarkerSync::is_location_marker(graphic) {
            return false;
        }
        let delegate = self.lock_state().delegate.clone();
        if let Some(delegate) = delegate {
            debug!("User location tapped");
            delegate.on_user_location_tap();
        }
        true
    }
}

/// Forwards source events, host calls and taps to the controller without
/// keeping it alive.
struct Relay {
    core: Weak<ControllerCore>,
}

impl StatusChangedListener for Relay {
    fn on_status_changed(&self, status: &SourceStatus) {
        if let Some(core) = self.core.upgrade() {
            core.handle_status_changed(status);
        }
    }
}

impl AutoPanModeChangedListener for Relay {
    fn on_auto_pan_mode_changed(&self, mode: AutoPanMode) {
        if let Some(core) = self.core.upgrade() {
            core.handle_auto_pan_mode_changed(mode);
        }
    }
}

impl LocationChangedListener for Relay {
    fn on_location_changed(&self, location: &Location) {
        if let Some(core) = self.core.upgrade() {
            core.handle_location_changed(location);
        }
    }
}

impl MethodCallHandler for Relay {
    fn on_method_call(&self, call: MethodCall, result: ResultSink) {
        match self.core.upgrade() {
            Some(core) => core.handle_method_call(call, result),
            None => result.not_implemented(),
        }
    }
}

impl TapConsumer for Relay {
    fn can_consume_taps(&self) -> bool {
        self.core
            .upgrade()
            .is_some_and(|core| core.can_consume_taps())
    }

    fn did_handle_graphic(&self, graphic: &Graphic) -> bool {
        self.core
            .upgrade()
            .is_some_and(|core| core.did_handle_graphic(graphic))
    }
}

/// Bridges a host channel to a location source.
///
/// Subscriptions are acquired in [`LocationDisplayController::new`] and
/// released by [`LocationDisplayController::dispose`], which also runs on
/// drop.
pub struct LocationDisplayController {
    core: Arc<ControllerCore>,
    relay: Arc<Relay>,
}

impl LocationDisplayController {
    pub fn new(
        channel: Arc<dyn MethodChannel>,
        source: Arc<dyn LocationSource>,
        overlays: Arc<dyn MapOverlays>,
    ) -> Self {
        let marker = MarkerSync::new(source.map_location());
        let core = Arc::new(ControllerCore {
            channel: Arc::clone(&channel),
            source: Arc::clone(&source),
            overlays,
            state: Mutex::new(ControllerState {
                pending: PendingStart::Idle,
                marker,
                delegate: None,
                subscriptions: None,
            }),
        });
        let relay = Arc::new(Relay {
            core: Arc::downgrade(&core),
        });

        channel.set_method_call_handler(Some(relay.clone()));
        let subscriptions = Subscriptions {
            status: source.add_status_changed_listener(relay.clone()),
            auto_pan: source.add_auto_pan_mode_changed_listener(relay.clone()),
            location: source.add_location_changed_listener(relay.clone()),
        };
        debug!("Location display controller subscribed: {:?}", subscriptions);
        core.lock_state().subscriptions = Some(subscriptions);

        Self { core, relay }
    }

    /// Attach (true) or detach (false) the marker overlay. No-op when the
    /// value is unchanged or the controller has been disposed.
    pub fn set_tracking_tap_enabled(&self, enabled: bool) {
        let change = {
            let mut state = self.core.lock_state();
            if state.subscriptions.is_none() {
                debug!("Ignoring tap tracking change on disposed controller");
                return;
            }
            state.marker.set_tracking_tap_enabled(enabled)
        };
        if let Some(change) = change {
            change.apply(self.core.overlays.as_ref());
        }
    }

    pub fn tracking_tap_enabled(&self) -> bool {
        self.core.lock_state().marker.tracking_tap_enabled()
    }

    /// Register (or clear) the observer for user-location taps.
    /// Ignored once the controller has been disposed.
    pub fn set_delegate(&self, delegate: Option<Arc<dyn LocationDisplayDelegate>>) {
        let mut state = self.core.lock_state();
        if state.subscriptions.is_none() {
            debug!("Ignoring delegate change on disposed controller");
            return;
        }
        state.delegate = delegate;
    }

    /// Tap consumer to register with the map's hit-tester.
    pub fn tap_consumer(&self) -> Arc<dyn TapConsumer> {
        self.relay.clone()
    }

    /// The marker overlay, as attached to the map while tap tracking is on.
    pub fn marker_overlay(&self) -> SharedOverlay {
        self.core.lock_state().marker.overlay()
    }

    pub fn marker_geometry(&self) -> Option<Point> {
        self.core.lock_state().marker.geometry()
    }

    pub fn has_pending_start(&self) -> bool {
        self.core.lock_state().pending.is_pending()
    }

    pub fn is_disposed(&self) -> bool {
        self.core.lock_state().subscriptions.is_none()
    }

    /// Unsubscribe from the source, unbind the channel handler and detach
    /// the marker overlay. Safe to call more than once.
    pub fn dispose(&self) {
        let (subscriptions, detach, cancelled) = {
            let mut state = self.core.lock_state();
            let Some(subscriptions) = state.subscriptions.take() else {
                return;
            };
            let detach = state.marker.set_tracking_tap_enabled(false);
            state.delegate = None;
            (
                subscriptions,
                detach,
                state.pending.cancel(DISPOSED_BEFORE_START),
            )
        };

        let source = self.core.source.as_ref();
        source.remove_listener(subscriptions.status);
        source.remove_listener(subscriptions.auto_pan);
        source.remove_listener(subscriptions.location);
        self.core.channel.set_method_call_handler(None);
        if let Some(change) = detach {
            change.apply(self.core.overlays.as_ref());
        }

        if let Some(resolution) = cancelled {
            resolution.resolve();
        }
        info!("Location display controller disposed");
    }
}

impl MethodCallHandler for LocationDisplayController {
    fn on_method_call(&self, call: MethodCall, result: ResultSink) {
        self.core.handle_method_call(call, result);
    }
}

impl TapConsumer for LocationDisplayController {
    fn can_consume_taps(&self) -> bool {
        self.core.can_consume_taps()
    }

    fn did_handle_graphic(&self, graphic: &Graphic) -> bool {
        self.core.did_handle_graphic(graphic)
    }
}

impl Drop for LocationDisplayController {
    fn drop(&mut self) {
        self.dispose();
    }
}
