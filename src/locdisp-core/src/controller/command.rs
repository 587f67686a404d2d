// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Typed commands decoded from host method calls.

use serde_json::Value;
use thiserror::Error;

use crate::channel::MethodCall;
use crate::location::AutoPanMode;

/// Command understood by the location display controller.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationCommand {
    GetStarted,
    SetAutoPanMode(AutoPanMode),
    SetInitialZoomScale(f64),
    SetNavigationPointHeightFactor(f64),
    SetWanderExtentFactor(f64),
    GetLocation,
    GetMapLocation,
    GetHeading,
    SetUseCourseSymbolOnMovement(bool),
    SetOpacity(f64),
    SetShowAccuracy(bool),
    SetShowLocation(bool),
    SetShowPingAnimationSymbol(bool),
    Start,
    Stop,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("invalid argument for {command}: {reason}")]
    InvalidArgument {
        command: &'static str,
        reason: String,
    },

    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

impl LocationCommand {
    /// Method name on the host channel.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetStarted => "getStarted",
            Self::SetAutoPanMode(_) => "setAutoPanMode",
            Self::SetInitialZoomScale(_) => "setInitialZoomScale",
            Self::SetNavigationPointHeightFactor(_) => "setNavigationPointHeightFactor",
            Self::SetWanderExtentFactor(_) => "setWanderExtentFactor",
            Self::GetLocation => "getLocation",
            Self::GetMapLocation => "getMapLocation",
            Self::GetHeading => "getHeading",
            Self::SetUseCourseSymbolOnMovement(_) => "setUseCourseSymbolOnMovement",
            Self::SetOpacity(_) => "setOpacity",
            Self::SetShowAccuracy(_) => "setShowAccuracy",
            Self::SetShowLocation(_) => "setShowLocation",
            Self::SetShowPingAnimationSymbol(_) => "setShowPingAnimationSymbol",
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }

    /// Decode a method call. Arguments of argument-less commands are ignored.
    pub fn parse(call: &MethodCall) -> Result<Self, CommandError> {
        let args = &call.arguments;
        let cmd = match call.method.as_str() {
            "getStarted" => Self::GetStarted,
            "setAutoPanMode" => Self::SetAutoPanMode(auto_pan_arg("setAutoPanMode", args)?),
            "setInitialZoomScale" => {
                Self::SetInitialZoomScale(positive_arg("setInitialZoomScale", args)?)
            }
            "setNavigationPointHeightFactor" => Self::SetNavigationPointHeightFactor(
                unit_interval_arg("setNavigationPointHeightFactor", args)?,
            ),
            "setWanderExtentFactor" => {
                Self::SetWanderExtentFactor(unit_interval_arg("setWanderExtentFactor", args)?)
            }
            "getLocation" => Self::GetLocation,
            "getMapLocation" => Self::GetMapLocation,
            "getHeading" => Self::GetHeading,
            "setUseCourseSymbolOnMovement" => Self::SetUseCourseSymbolOnMovement(bool_arg(
                "setUseCourseSymbolOnMovement",
                args,
            )?),
            "setOpacity" => Self::SetOpacity(unit_interval_arg("setOpacity", args)?),
            "setShowAccuracy" => Self::SetShowAccuracy(bool_arg("setShowAccuracy", args)?),
            "setShowLocation" => Self::SetShowLocation(bool_arg("setShowLocation", args)?),
            "setShowPingAnimationSymbol" => {
                Self::SetShowPingAnimationSymbol(bool_arg("setShowPingAnimationSymbol", args)?)
            }
            "start" => Self::Start,
            "stop" => Self::Stop,
            other => return Err(CommandError::UnknownCommand(other.to_string())),
        };
        Ok(cmd)
    }
}

fn invalid(command: &'static str, reason: impl Into<String>) -> CommandError {
    CommandError::InvalidArgument {
        command,
        reason: reason.into(),
    }
}

fn number_arg(command: &'static str, value: &Value) -> Result<f64, CommandError> {
    let n = value
        .as_f64()
        .ok_or_else(|| invalid(command, format!("expected a number, got {}", value)))?;
    if !n.is_finite() {
        return Err(invalid(command, "number must be finite"));
    }
    Ok(n)
}

fn unit_interval_arg(command: &'static str, value: &Value) -> Result<f64, CommandError> {
    let n = number_arg(command, value)?;
    if !(0.0..=1.0).contains(&n) {
        return Err(invalid(command, format!("{} is outside [0, 1]", n)));
    }
    Ok(n)
}

fn positive_arg(command: &'static str, value: &Value) -> Result<f64, CommandError> {
    let n = number_arg(command, value)?;
    if n <= 0.0 {
        return Err(invalid(command, format!("{} must be greater than 0", n)));
    }
    Ok(n)
}

fn bool_arg(command: &'static str, value: &Value) -> Result<bool, CommandError> {
    value
        .as_bool()
        .ok_or_else(|| invalid(command, format!("expected a boolean, got {}", value)))
}

fn auto_pan_arg(command: &'static str, value: &Value) -> Result<AutoPanMode, CommandError> {
    let ordinal = value
        .as_i64()
        .ok_or_else(|| invalid(command, format!("expected an integer ordinal, got {}", value)))?;
    AutoPanMode::from_ordinal(ordinal)
        .ok_or_else(|| invalid(command, format!("unknown auto-pan mode ordinal {}", ordinal)))
}
