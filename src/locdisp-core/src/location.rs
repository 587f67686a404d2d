// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::geometry::Point;

/// A single fix reported by a location source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub course: f64,
    pub horizontal_accuracy: f64,
    pub last_known: bool,
    pub position: Point,
    pub timestamp: DateTime<Utc>,
    pub velocity: f64,
    pub vertical_accuracy: f64,
}

impl Location {
    /// Fresh fix at `position` stamped with the current time.
    pub fn new(position: Point) -> Self {
        Self {
            course: 0.0,
            horizontal_accuracy: 0.0,
            last_known: false,
            position,
            timestamp: Utc::now(),
            velocity: 0.0,
            vertical_accuracy: 0.0,
        }
    }

    /// Location JSON as sent to the host.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Camera follow behaviour relative to the live location.
///
/// Ordinals are part of the host contract and must not be reordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutoPanMode {
    #[default]
    Off,
    Recenter,
    Navigation,
    CompassNavigation,
}

impl AutoPanMode {
    pub fn ordinal(self) -> i64 {
        match self {
            Self::Off => 0,
            Self::Recenter => 1,
            Self::Navigation => 2,
            Self::CompassNavigation => 3,
        }
    }

    pub fn from_ordinal(ordinal: i64) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Off),
            1 => Some(Self::Recenter),
            2 => Some(Self::Navigation),
            3 => Some(Self::CompassNavigation),
            _ => None,
        }
    }
}

impl fmt::Display for AutoPanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "Off"),
            Self::Recenter => write!(f, "Recenter"),
            Self::Navigation => write!(f, "Navigation"),
            Self::CompassNavigation => write!(f, "CompassNavigation"),
        }
    }
}

/// Payload of a status-changed notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceStatus {
    pub started: bool,
    pub error: Option<String>,
}

impl SourceStatus {
    pub fn started() -> Self {
        Self {
            started: true,
            error: None,
        }
    }

    pub fn stopped() -> Self {
        Self {
            started: false,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            started: false,
            error: Some(message.into()),
        }
    }
}
