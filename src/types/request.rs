//! Inbound request and caller identity.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use super::{Action, ActionPayload};
use crate::{GatewayError, Result};

/// Opaque caller identity used as the rate-limit key prefix.
///
/// Prefers an authenticated user id; otherwise the network origin.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    pub fn user(id: impl AsRef<str>) -> Self {
        Self(format!("user:{}", id.as_ref()))
    }

    pub fn address(addr: impl AsRef<str>) -> Self {
        Self(format!("ip:{}", addr.as_ref()))
    }

    pub fn anonymous() -> Self {
        Self("anonymous".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Limiter key for this client and action.
    pub fn rate_key(&self, action: Action) -> String {
        format!("{}|{}", self.0, action.as_str())
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw inbound body: `{action, payload}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawActionRequest {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub payload: Value,
}

/// A validated request. Created per inbound call and never mutated.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub action: Action,
    pub payload: ActionPayload,
    pub client: ClientIdentity,
}

impl ActionRequest {
    /// Validate the action name and its payload.
    pub fn parse(raw: RawActionRequest, client: ClientIdentity) -> Result<Self> {
        if raw.action.is_empty() {
            return Err(GatewayError::Validation("missing action".to_string()));
        }
        let action: Action = raw.action.parse()?;
        let payload = ActionPayload::parse(action, raw.payload)?;
        Ok(Self {
            action,
            payload,
            client,
        })
    }
}
