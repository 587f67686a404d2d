// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Host side of the simulator: a JSON-line method channel, the map's
//! overlay list with tap hit-testing, and the tap delegate.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use locdisp_core::source::{
    AutoPanModeChangedListener, LocationChangedListener, StatusChangedListener,
};
use locdisp_core::{
    AutoPanMode, ListenerId, Location, LocationDisplayDelegate, LocationSource, MapOverlays,
    MethodCall, MethodCallHandler, MethodChannel, MethodResponse, OverlayId, Point, ResultSink,
    SharedOverlay, SimulatedSource, TapConsumer,
};

pub const ON_USER_LOCATION_TAP: &str = "onUserLocationTap";

/// Distance in map units within which a tap hits a point graphic.
pub const TAP_TOLERANCE: f64 = 10.0;

/// One line written to stdout.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum HostLine {
    Reply {
        id: u64,
        method: String,
        /// `null` when the controller closed the call without answering.
        result: Option<MethodResponse>,
    },
    Event {
        event: String,
        arguments: Value,
    },
    Error {
        error: String,
    },
}

impl HostLine {
    pub fn to_line(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => json + "\n",
            Err(e) => format!("{{\"error\":\"serialization failed: {}\"}}\n", e),
        }
    }
}

/// Method channel whose outbound events become stdout lines.
pub struct HostChannel {
    out: mpsc::UnboundedSender<String>,
    handler: Mutex<Option<Arc<dyn MethodCallHandler>>>,
}

impl HostChannel {
    pub fn new(out: mpsc::UnboundedSender<String>) -> Self {
        Self {
            out,
            handler: Mutex::new(None),
        }
    }

    pub fn emit(&self, line: HostLine) {
        if self.out.send(line.to_line()).is_err() {
            debug!("Output closed; dropping line");
        }
    }

    /// Deliver a call to the bound handler. `None` when nothing is bound.
    pub fn dispatch(&self, call: MethodCall) -> Option<oneshot::Receiver<MethodResponse>> {
        let handler = self.lock_handler().clone()?;
        let (sink, rx) = ResultSink::channel();
        handler.on_method_call(call, sink);
        Some(rx)
    }

    fn lock_handler(&self) -> MutexGuard<'_, Option<Arc<dyn MethodCallHandler>>> {
        self.handler.lock().expect("host channel mutex poisoned")
    }
}

impl MethodChannel for HostChannel {
    fn invoke_method(&self, method: &str, arguments: Value) {
        self.emit(HostLine::Event {
            event: method.to_string(),
            arguments,
        });
    }

    fn set_method_call_handler(&self, handler: Option<Arc<dyn MethodCallHandler>>) {
        *self.lock_handler() = handler;
    }
}

/// The map's overlay list, bottom to top.
#[derive(Default)]
pub struct HostOverlays {
    overlays: Mutex<Vec<SharedOverlay>>,
}

impl HostOverlays {
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Offer the graphics under `point` to each consumer, topmost overlay
    /// first. Returns true once a consumer handles one.
    pub fn hit_test(&self, point: &Point, consumers: &[Arc<dyn TapConsumer>]) -> bool {
        let mut hits = Vec::new();
        for overlay in self.lock().iter().rev() {
            let overlay = overlay.read().expect("overlay lock poisoned");
            for graphic in overlay.graphics.iter().rev() {
                if graphic.geometry.is_some_and(|geom| is_hit(&geom, point)) {
                    hits.push(graphic.clone());
                }
            }
        }
        consumers
            .iter()
            .filter(|consumer| consumer.can_consume_taps())
            .any(|consumer| hits.iter().any(|graphic| consumer.did_handle_graphic(graphic)))
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SharedOverlay>> {
        self.overlays.lock().expect("host overlays mutex poisoned")
    }
}

fn is_hit(geometry: &Point, tap: &Point) -> bool {
    geometry.spatial_reference == tap.spatial_reference
        && (geometry.x - tap.x).hypot(geometry.y - tap.y) <= TAP_TOLERANCE
}

impl MapOverlays for HostOverlays {
    fn add_overlay(&self, overlay: SharedOverlay) {
        self.lock().push(overlay);
    }

    fn remove_overlay(&self, id: OverlayId) {
        self.lock()
            .retain(|o| o.read().expect("overlay lock poisoned").id != id);
    }
}

/// Reports user-location taps to the host as events.
pub struct TapNotifier {
    channel: Arc<HostChannel>,
}

impl TapNotifier {
    pub fn new(channel: Arc<HostChannel>) -> Self {
        Self { channel }
    }
}

impl LocationDisplayDelegate for TapNotifier {
    fn on_user_location_tap(&self) {
        self.channel.invoke_method(ON_USER_LOCATION_TAP, Value::Null);
    }
}

/// Simulated source whose start completes on a timer.
///
/// Every `start` and `stop` bumps the generation; a timer only completes the
/// start it was armed for.
pub struct HostSource {
    inner: Arc<SimulatedSource>,
    completion: Option<(Duration, Result<(), String>)>,
    generation: Arc<AtomicU64>,
    runtime: Handle,
}

impl HostSource {
    pub fn new(
        inner: Arc<SimulatedSource>,
        completion: Option<(Duration, Result<(), String>)>,
        runtime: Handle,
    ) -> Self {
        Self {
            inner,
            completion,
            generation: Arc::new(AtomicU64::new(0)),
            runtime,
        }
    }
}

impl LocationSource for HostSource {
    fn is_started(&self) -> bool {
        self.inner.is_started()
    }

    fn location(&self) -> Option<Location> {
        self.inner.location()
    }

    fn map_location(&self) -> Option<Point> {
        self.inner.map_location()
    }

    fn heading(&self) -> f64 {
        self.inner.heading()
    }

    fn auto_pan_mode(&self) -> AutoPanMode {
        self.inner.auto_pan_mode()
    }

    fn set_auto_pan_mode(&self, mode: AutoPanMode) {
        self.inner.set_auto_pan_mode(mode);
    }

    fn set_initial_zoom_scale(&self, scale: f64) {
        self.inner.set_initial_zoom_scale(scale);
    }

    fn set_navigation_point_height_factor(&self, factor: f64) {
        self.inner.set_navigation_point_height_factor(factor);
    }

    fn set_wander_extent_factor(&self, factor: f64) {
        self.inner.set_wander_extent_factor(factor);
    }

    fn set_opacity(&self, opacity: f64) {
        self.inner.set_opacity(opacity);
    }

    fn set_show_accuracy(&self, show: bool) {
        self.inner.set_show_accuracy(show);
    }

    fn set_show_location(&self, show: bool) {
        self.inner.set_show_location(show);
    }

    fn set_show_ping_animation(&self, show: bool) {
        self.inner.set_show_ping_animation(show);
    }

    fn set_use_course_symbol_on_movement(&self, enabled: bool) {
        self.inner.set_use_course_symbol_on_movement(enabled);
    }

    fn start(&self) {
        let armed = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.start();
        let Some((delay, outcome)) = self.completion.clone() else {
            return;
        };
        let inner = Arc::clone(&self.inner);
        let generation = Arc::clone(&self.generation);
        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if generation.load(Ordering::SeqCst) != armed {
                debug!("Delayed start completion skipped: superseded by a later start or stop");
            } else if inner.is_starting() {
                inner.complete_start(outcome);
            } else {
                warn!("Delayed start completion skipped: source no longer starting");
            }
        });
    }

    fn stop(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.stop();
    }

    fn add_status_changed_listener(&self, listener: Arc<dyn StatusChangedListener>) -> ListenerId {
        self.inner.add_status_changed_listener(listener)
    }

    fn add_auto_pan_mode_changed_listener(
        &self,
        listener: Arc<dyn AutoPanModeChangedListener>,
    ) -> ListenerId {
        self.inner.add_auto_pan_mode_changed_listener(listener)
    }

    fn add_location_changed_listener(
        &self,
        listener: Arc<dyn LocationChangedListener>,
    ) -> ListenerId {
        self.inner.add_location_changed_listener(listener)
    }

    fn remove_listener(&self, id: ListenerId) {
        self.inner.remove_listener(id);
    }
}
