/// Wire protocol between the content script and the background service
use crate::prefs::LearningMode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A request from the content script, discriminated by its `action` tag
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action")]
pub enum Request {
    #[serde(rename = "setQuestion")]
    SetQuestion { question: String },
    #[serde(rename = "startSession")]
    StartSession,
}

impl Request {
    /// Parse an incoming message, distinguishing an unknown action tag
    /// from a known action with a bad payload.
    pub fn parse(value: &Value) -> Result<Request, ProtocolError> {
        let action = value
            .get("action")
            .and_then(Value::as_str)
            .ok_or(ProtocolError::MissingAction)?;

        match action {
            "setQuestion" | "startSession" => {
                serde_json::from_value(value.clone()).map_err(|e| ProtocolError::MalformedPayload {
                    action: action.to_string(),
                    reason: e.to_string(),
                })
            }
            other => Err(ProtocolError::UnrecognizedAction(other.to_string())),
        }
    }
}

/// Response sent back through `sendResponse`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    Success {
        #[serde(skip_serializing_if = "Option::is_none")]
        mode: Option<LearningMode>,
    },
    Error {
        reason: String,
    },
}

impl Response {
    pub fn ok() -> Response {
        Response::Success { mode: None }
    }

    pub fn session_started(mode: LearningMode) -> Response {
        Response::Success { mode: Some(mode) }
    }

    pub fn error(reason: impl Into<String>) -> Response {
        Response::Error { reason: reason.into() }
    }
}

/// Messages the router rejects instead of dropping silently
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    #[error("message has no action tag")]
    MissingAction,
    #[error("unrecognized action: {0}")]
    UnrecognizedAction(String),
    #[error("malformed payload for {action}: {reason}")]
    MalformedPayload { action: String, reason: String },
}

/// Why the host runtime fired the install event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallReason {
    Install,
    Update,
    BrowserUpdate,
    SharedModuleUpdate,
    Other,
}

impl InstallReason {
    pub fn from_tag(tag: &str) -> InstallReason {
        match tag {
            "install" => InstallReason::Install,
            "update" => InstallReason::Update,
            "chrome_update" => InstallReason::BrowserUpdate,
            "shared_module_update" => InstallReason::SharedModuleUpdate,
            _ => InstallReason::Other,
        }
    }
}
