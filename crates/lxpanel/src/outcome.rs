//! Operation results and the reply shape handed back to the billing panel.

use std::fmt;

use lxpanel_common::{PanelResult, Protocol};
use serde::Serialize;
use serde_json::{Value, json};

/// Result of a successful mutation.
///
/// A dual-protocol NAT delete where only one protocol could be removed is
/// still a success. The failed half is kept in `partial_failures`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    /// Message for the account holder.
    pub message: String,
    /// Per-protocol failures of a partially applied mutation.
    pub partial_failures: Vec<ProtocolFailure>,
}

impl ActionOutcome {
    /// A fully applied mutation.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            partial_failures: Vec::new(),
        }
    }

    /// A partially applied mutation.
    pub fn partial(message: impl Into<String>, failures: Vec<ProtocolFailure>) -> Self {
        Self {
            message: message.into(),
            partial_failures: failures,
        }
    }

    /// Use the manager's message, or `fallback` when it sent none.
    pub fn from_remote(message: String, fallback: &str) -> Self {
        if message.trim().is_empty() {
            Self::new(fallback)
        } else {
            Self::new(message)
        }
    }

    /// Whether part of the mutation failed.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.partial_failures.is_empty()
    }
}

/// One protocol's failure within a multi-protocol mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtocolFailure {
    /// The protocol whose call failed.
    pub protocol: Protocol,
    /// Why it failed.
    pub reason: String,
}

impl fmt::Display for ProtocolFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.protocol, self.reason)
    }
}

/// Reply status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    /// The operation succeeded.
    Success,
    /// The operation failed.
    Error,
}

/// `{status, msg, data?}` reply consumed by the billing panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelReply {
    /// Outcome.
    pub status: ReplyStatus,
    /// Human-readable message.
    pub msg: String,
    /// Payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl PanelReply {
    /// A success reply.
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            status: ReplyStatus::Success,
            msg: msg.into(),
            data: None,
        }
    }

    /// An error reply.
    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            status: ReplyStatus::Error,
            msg: msg.into(),
            data: None,
        }
    }

    /// Attach a payload.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Whether the reply reports success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ReplyStatus::Success
    }

    /// Shape a query result; the payload is serialized into `data`.
    pub fn from_data<T: Serialize>(result: PanelResult<T>) -> Self {
        match result.and_then(|data| Ok(serde_json::to_value(data)?)) {
            Ok(data) => Self::success("").with_data(data),
            Err(e) => Self::error(e.to_string()),
        }
    }
}

impl From<PanelResult<ActionOutcome>> for PanelReply {
    fn from(result: PanelResult<ActionOutcome>) -> Self {
        match result {
            Ok(outcome) if outcome.is_partial() => Self::success(outcome.message).with_data(
                json!({ "partial_failures": outcome.partial_failures }),
            ),
            Ok(outcome) => Self::success(outcome.message),
            Err(e) => Self::error(e.to_string()),
        }
    }
}
