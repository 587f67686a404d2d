// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Location display controller components.
//!
//! This module bridges the host channel to a location source: it decodes
//! and dispatches commands, relays source events to the host, tracks the
//! pending `start` reply and keeps the tap-target marker in sync.

pub mod command;
pub mod display;
pub mod marker;
pub mod pending;

pub use command::{CommandError, LocationCommand};
pub use display::{LocationDisplayController, ON_AUTO_PAN_MODE_CHANGED, ON_LOCATION_CHANGED};
pub use marker::{MarkerSync, OverlayChange, LOCATION_ATTRIBUTE};
pub use pending::{PendingStart, StartResolution, START_FAILED_CODE, UNKNOWN_ERROR};
