// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Tracker for the single outstanding `start` request.
//!
//! A `start` reply cannot be produced when the command is dispatched: the
//! source reports the outcome later through a status notification. The
//! tracker holds the reply sink until that notification arrives.

use std::fmt;

use serde_json::Value;

use crate::channel::ResultSink;
use crate::location::SourceStatus;

/// Error code for every failed `start`.
pub const START_FAILED_CODE: &str = "Failed to start locationDisplay";
/// Message used when the source reports failure without a reason.
pub const UNKNOWN_ERROR: &str = "Unknown error";
pub const START_ALREADY_PENDING: &str = "start already pending";
pub const STOPPED_BEFORE_START: &str = "stopped before start completed";
pub const DISPOSED_BEFORE_START: &str = "location display disposed";

/// State of the pending-start slot.
#[derive(Debug, Default)]
pub enum PendingStart {
    #[default]
    Idle,
    AwaitingStatus(ResultSink),
}

impl fmt::Display for PendingStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::AwaitingStatus(_) => write!(f, "AwaitingStatus"),
        }
    }
}

/// Taken sink plus the outcome to deliver.
///
/// Produced while the controller state is locked and resolved after the
/// lock is released.
#[derive(Debug)]
pub struct StartResolution {
    sink: ResultSink,
    outcome: Result<(), String>,
}

impl StartResolution {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn resolve(self) {
        match self.outcome {
            Ok(()) => self.sink.success(Value::Null),
            Err(message) => self.sink.error(START_FAILED_CODE, Some(message), None),
        }
    }
}

impl PendingStart {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::AwaitingStatus(_))
    }

    /// Claim the slot for a new `start`.
    ///
    /// When a start is already pending the slot is left untouched and the
    /// new sink is handed back so the caller can reject it.
    pub fn begin(&mut self, sink: ResultSink) -> Result<(), ResultSink> {
        match self {
            Self::Idle => {
                *self = Self::AwaitingStatus(sink);
                Ok(())
            }
            Self::AwaitingStatus(_) => Err(sink),
        }
    }

    /// Consume the slot on a status notification.
    ///
    /// Returns `None` while idle; status notifications then have no effect
    /// on the tracker.
    pub fn on_status(&mut self, status: &SourceStatus) -> Option<StartResolution> {
        let sink = self.take()?;
        let outcome = if status.started {
            Ok(())
        } else {
            Err(status
                .error
                .clone()
                .unwrap_or_else(|| UNKNOWN_ERROR.to_string()))
        };
        Some(StartResolution { sink, outcome })
    }

    /// Fail the pending start, if any, with `reason`.
    pub fn cancel(&mut self, reason: &str) -> Option<StartResolution> {
        let sink = self.take()?;
        Some(StartResolution {
            sink,
            outcome: Err(reason.to_string()),
        })
    }

    fn take(&mut self) -> Option<ResultSink> {
        match std::mem::take(self) {
            Self::Idle => None,
            Self::AwaitingStatus(sink) => Some(sink),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::MethodResponse;

    fn start_failed(message: &str) -> MethodResponse {
        MethodResponse::Error {
            code: START_FAILED_CODE.to_string(),
            message: Some(message.to_string()),
            details: None,
        }
    }

    #[test]
    fn test_initial_state() {
        let pending = PendingStart::default();
        assert!(!pending.is_pending());
        assert_eq!(pending.to_string(), "Idle");
    }

    #[test]
    fn test_started_status_resolves_success() {
        let mut pending = PendingStart::default();
        let (sink, mut rx) = ResultSink::channel();
        assert!(pending.begin(sink).is_ok());
        assert_eq!(pending.to_string(), "AwaitingStatus");

        let resolution = pending.on_status(&SourceStatus::started()).unwrap();
        assert!(resolution.is_success());
        assert!(!pending.is_pending());

        resolution.resolve();
        assert_eq!(
            rx.try_recv().unwrap(),
            MethodResponse::Success { value: Value::Null }
        );
    }

    #[test]
    fn test_failed_status_carries_message() {
        let mut pending = PendingStart::default();
        let (sink, mut rx) = ResultSink::channel();
        pending.begin(sink).unwrap();

        pending
            .on_status(&SourceStatus::failed("GPS disabled"))
            .unwrap()
            .resolve();
        assert_eq!(rx.try_recv().unwrap(), start_failed("GPS disabled"));
    }

    #[test]
    fn test_failed_status_without_message() {
        let mut pending = PendingStart::default();
        let (sink, mut rx) = ResultSink::channel();
        pending.begin(sink).unwrap();

        pending.on_status(&SourceStatus::stopped()).unwrap().resolve();
        assert_eq!(rx.try_recv().unwrap(), start_failed(UNKNOWN_ERROR));
    }

    #[test]
    fn test_status_while_idle_is_ignored() {
        let mut pending = PendingStart::default();
        assert!(pending.on_status(&SourceStatus::started()).is_none());
        assert!(!pending.is_pending());
    }

    #[test]
    fn test_only_first_status_resolves() {
        let mut pending = PendingStart::default();
        let (sink, _rx) = ResultSink::channel();
        pending.begin(sink).unwrap();

        assert!(pending.on_status(&SourceStatus::started()).is_some());
        assert!(pending.on_status(&SourceStatus::failed("late")).is_none());
    }

    #[test]
    fn test_second_begin_is_handed_back() {
        let mut pending = PendingStart::default();
        let (first, mut first_rx) = ResultSink::channel();
        let (second, _second_rx) = ResultSink::channel();
        pending.begin(first).unwrap();

        assert!(pending.begin(second).is_err());
        assert!(pending.is_pending());

        pending.on_status(&SourceStatus::started()).unwrap().resolve();
        assert!(first_rx.try_recv().unwrap().is_success());
    }

    #[test]
    fn test_cancel() {
        let mut pending = PendingStart::default();
        assert!(pending.cancel(STOPPED_BEFORE_START).is_none());

        let (sink, mut rx) = ResultSink::channel();
        pending.begin(sink).unwrap();
        pending.cancel(STOPPED_BEFORE_START).unwrap().resolve();
        assert_eq!(rx.try_recv().unwrap(), start_failed(STOPPED_BEFORE_START));
        assert!(!pending.is_pending());
    }
}
