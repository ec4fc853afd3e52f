// crates/shared/src/schemas/mod.rs
//
// JSON bodies exchanged between widgets, the operator CLI and the server.
use serde::{Deserialize, Serialize};

use crate::widget::{WidgetPresentation, WidgetPresentationUpdate};

/// Value shown in place of a stored credential.
pub const HIDDEN_API_KEY: &str = "***HIDDEN***";

// Chat endpoint
/// Every field may be absent or `null`; the server decides what is required.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_id: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub message: String,
    pub thread_id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

// Admin login
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LoginResponse {
    pub token: String,
}

/// Configuration as an operator sees it. `api_key` is never the real value.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RedactedConfig {
    pub api_key: String,
    pub has_api_key: bool,
    pub assistant_id: String,
    pub welcome_message: String,
    pub widget_config: WidgetPresentation,
}

/// Partial configuration update. Absent or blank fields are left alone.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub welcome_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget_config: Option<WidgetPresentationUpdate>,
}

impl ConfigUpdate {
    pub fn is_empty(&self) -> bool {
        self.api_key.is_none()
            && self.assistant_id.is_none()
            && self.welcome_message.is_none()
            && self.widget_config.as_ref().is_none_or(|w| w.is_empty())
    }
}

/// Unauthenticated view of the widget defaults.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicWidgetConfig {
    pub welcome_message: String,
    pub widget_config: WidgetPresentation,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}
