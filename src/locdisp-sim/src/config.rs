// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Configuration file support for locdisp-sim.
//!
//! Config is loaded from the `[locdisp-sim]` section of `locdisp.toml`.
//! Default search order:
//! 1. Path specified via `--config` CLI argument
//! 2. `./locdisp.toml`
//! 3. `~/.config/locdisp/locdisp.toml`
//! 4. `/etc/locdisp/locdisp.toml`

use std::time::Duration;

use serde::{Deserialize, Serialize};

use locdisp_app::ConfigFile;
use locdisp_core::StartBehavior;

/// Top-level simulator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub general: GeneralConfig,
    pub source: SourceConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: Option<String>,
}

/// Outcome of `start` on the simulated source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartMode {
    #[default]
    Succeed,
    Fail,
    /// Stay pending until the host sends `completeStart`.
    Defer,
}

/// Simulated location source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub start: StartMode,
    /// Error reported when `start = "fail"`
    pub start_error: String,
    /// Delay before a succeeding or failing start reports its status
    pub start_delay_ms: u64,
    /// Interval between simulated fixes
    pub update_interval_ms: u64,
    /// Centre of the simulated walk (decimal degrees, WGS84)
    pub origin_latitude: f64,
    pub origin_longitude: f64,
    /// Radius of the simulated walk in metres
    pub radius_m: f64,
    pub speed_mps: f64,
    pub horizontal_accuracy_m: f64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            start: StartMode::Succeed,
            start_error: "Location permission denied".to_string(),
            start_delay_ms: 0,
            update_interval_ms: 1000,
            origin_latitude: 52.2297,
            origin_longitude: 21.0122,
            radius_m: 50.0,
            speed_mps: 1.4,
            horizontal_accuracy_m: 5.0,
        }
    }
}

/// How the simulated source starts, plus an optional delayed completion.
#[derive(Debug, Clone, PartialEq)]
pub struct StartPlan {
    pub behavior: StartBehavior,
    pub completion: Option<(Duration, Result<(), String>)>,
}

impl SourceConfig {
    pub fn start_plan(&self) -> StartPlan {
        let outcome = match self.start {
            StartMode::Succeed => Ok(()),
            StartMode::Fail => Err(self.start_error.clone()),
            StartMode::Defer => {
                return StartPlan {
                    behavior: StartBehavior::Defer,
                    completion: None,
                }
            }
        };
        if self.start_delay_ms > 0 {
            return StartPlan {
                behavior: StartBehavior::Defer,
                completion: Some((Duration::from_millis(self.start_delay_ms), outcome)),
            };
        }
        let behavior = match outcome {
            Ok(()) => StartBehavior::Succeed,
            Err(message) => StartBehavior::Fail(message),
        };
        StartPlan {
            behavior,
            completion: None,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_log_level(self.general.log_level.as_deref())?;

        let source = &self.source;
        if !(-90.0..=90.0).contains(&source.origin_latitude) {
            return Err("[source].origin_latitude must be in range -90..=90".to_string());
        }
        if !(-180.0..=180.0).contains(&source.origin_longitude) {
            return Err("[source].origin_longitude must be in range -180..=180".to_string());
        }
        if source.update_interval_ms == 0 {
            return Err("[source].update_interval_ms must be > 0".to_string());
        }
        if !source.radius_m.is_finite() || source.radius_m < 0.0 {
            return Err("[source].radius_m must be >= 0".to_string());
        }
        if !source.speed_mps.is_finite() || source.speed_mps < 0.0 {
            return Err("[source].speed_mps must be >= 0".to_string());
        }
        if !source.horizontal_accuracy_m.is_finite() || source.horizontal_accuracy_m < 0.0 {
            return Err("[source].horizontal_accuracy_m must be >= 0".to_string());
        }
        if source.start == StartMode::Fail && source.start_error.trim().is_empty() {
            return Err("[source].start_error must be set when start = \"fail\"".to_string());
        }
        Ok(())
    }

    /// Example configuration under the `[locdisp-sim]` header.
    pub fn example_combined_toml() -> String {
        #[derive(Serialize)]
        struct Wrapper {
            #[serde(rename = "locdisp-sim")]
            inner: SimConfig,
        }
        let example = SimConfig {
            general: GeneralConfig {
                log_level: Some("info".to_string()),
            },
            source: SourceConfig::default(),
        };
        toml::to_string_pretty(&Wrapper { inner: example }).unwrap_or_default()
    }
}

fn validate_log_level(level: Option<&str>) -> Result<(), String> {
    match level {
        None | Some("trace" | "debug" | "info" | "warn" | "error") => Ok(()),
        Some(level) => Err(format!(
            "[general].log_level '{}' is invalid (expected one of: trace, debug, info, warn, error)",
            level
        )),
    }
}

impl ConfigFile for SimConfig {
    fn section_key() -> &'static str {
        "locdisp-sim"
    }
}
