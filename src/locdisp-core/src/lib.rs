// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod channel;
pub mod controller;
pub mod geometry;
pub mod location;
pub mod overlay;
pub mod source;

pub type DynResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub use channel::{MethodCall, MethodCallHandler, MethodChannel, MethodResponse, ResultSink};
pub use controller::{CommandError, LocationCommand, LocationDisplayController};
pub use geometry::{Point, SpatialReference};
pub use location::{AutoPanMode, Location, SourceStatus};
pub use overlay::{
    Graphic, GraphicsOverlay, LocationDisplayDelegate, MapOverlays, OverlayId, SharedOverlay,
    TapConsumer,
};
pub use source::{ListenerId, LocationSource, SimulatedSource, SourceSettings, StartBehavior};
