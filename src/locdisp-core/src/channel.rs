// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Host channel binding.
//!
//! Inbound calls arrive as a [`MethodCall`] plus a [`ResultSink`]; outbound
//! notifications go through [`MethodChannel::invoke_method`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;

/// Named command from the host with an untyped argument payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }
}

/// Reply delivered to the host for one [`MethodCall`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MethodResponse {
    Success {
        value: Value,
    },
    Error {
        code: String,
        message: Option<String>,
        details: Option<Value>,
    },
    NotImplemented,
}

impl MethodResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// One-shot reply handle for a method call.
///
/// Dropping the sink without answering closes the reply channel; that is how
/// fire-and-forget commands reply.
#[derive(Debug)]
pub struct ResultSink {
    respond_to: oneshot::Sender<MethodResponse>,
}

impl ResultSink {
    pub fn new(respond_to: oneshot::Sender<MethodResponse>) -> Self {
        Self { respond_to }
    }

    /// Create a sink together with the receiver the host awaits.
    pub fn channel() -> (Self, oneshot::Receiver<MethodResponse>) {
        let (tx, rx) = oneshot::channel();
        (Self::new(tx), rx)
    }

    pub fn success(self, value: Value) {
        self.send(MethodResponse::Success { value });
    }

    pub fn error(self, code: impl Into<String>, message: Option<String>, details: Option<Value>) {
        self.send(MethodResponse::Error {
            code: code.into(),
            message,
            details,
        });
    }

    pub fn not_implemented(self) {
        self.send(MethodResponse::NotImplemented);
    }

    fn send(self, response: MethodResponse) {
        // The host may have given up on the call; nothing to do then.
        let _ = self.respond_to.send(response);
    }
}

/// Handler for inbound method calls.
pub trait MethodCallHandler: Send + Sync {
    fn on_method_call(&self, call: MethodCall, result: ResultSink);
}

/// Host side of the channel.
pub trait MethodChannel: Send + Sync {
    /// Send a notification to the host.
    fn invoke_method(&self, method: &str, arguments: Value);

    /// Bind (or with `None`, unbind) the handler for inbound calls.
    fn set_method_call_handler(&self, handler: Option<Arc<dyn MethodCallHandler>>);
}
