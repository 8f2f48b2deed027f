//! The manager's response envelope.

use lxpanel_common::{PanelError, PanelResult};
use serde::Deserialize;

/// Success code used by the manager.
pub const CODE_OK: i64 = 200;

/// `{code, msg, data}` wrapper around every manager response.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    /// Response code, `200` on success.
    #[serde(default, deserialize_with = "crate::de::code")]
    pub code: i64,
    /// Human-readable message, empty when the manager sent none.
    #[serde(default, deserialize_with = "crate::de::text")]
    pub msg: String,
    /// Payload.
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Whether the manager reported success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code == CODE_OK
    }

    /// Turn a non-success envelope into [`PanelError::Remote`].
    pub fn into_success(self) -> PanelResult<Self> {
        if self.is_success() {
            return Ok(self);
        }

        let message = if self.msg.is_empty() {
            format!("Manager returned code {}", self.code)
        } else {
            self.msg
        };
        Err(PanelError::Remote {
            code: self.code,
            message,
        })
    }
}
