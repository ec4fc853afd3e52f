use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Query, State};
use axum::response::IntoResponse;
use chrono::{SecondsFormat, Utc};
use courier_shared::{
    ChatRequest, ChatResponse, ConfigUpdate, HealthResponse, LoginRequest, LoginResponse,
    MessageResponse, PublicWidgetConfig, RedactedConfig,
};
use http::HeaderMap;
use http::header::{CACHE_CONTROL, CONTENT_TYPE, EXPIRES, HOST, PRAGMA};

use super::middleware::AdminSession;
use super::types::WidgetQuery;
use crate::auth::AdminAuth;
use crate::bridge::ChatTurn;
use crate::config::ConfigStore;
use crate::error::{AuthError, ChatError};
use crate::state::AppState;
use crate::widget::WidgetScript;

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

pub async fn handle_chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ChatError> {
    let (assistant_id, outcome) = match payload {
        Ok(Json(req)) => {
            let turn = ChatTurn {
                message: req.message.unwrap_or_default(),
                thread_id: req.thread_id,
                assistant_id: req.assistant_id.unwrap_or_default(),
            };
            (turn.assistant_id.clone(), state.bridge.handle(turn).await)
        }
        // A server without a key answers with the configuration error first.
        Err(rejection) => match state.config.api_key().await {
            None => (String::new(), Err(ChatError::MissingApiKey)),
            Some(_) => (
                String::new(),
                Err(ChatError::MalformedRequest {
                    detail: rejection.body_text(),
                }),
            ),
        },
    };

    match outcome {
        Ok(reply) => Ok(Json(ChatResponse {
            message: reply.reply,
            thread_id: reply.thread_id,
        })),
        Err(e) => {
            if e.is_client_error() {
                tracing::warn!(%assistant_id, "Chat request rejected: {}", e);
            } else {
                tracing::error!(%assistant_id, "Chat request failed: {}", e);
            }
            Err(e)
        }
    }
}

pub async fn handle_login(
    State(auth): State<Arc<AdminAuth>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    match auth.login(&req.password).await {
        Ok(token) => {
            tracing::info!("Admin logged in");
            Ok(Json(LoginResponse { token }))
        }
        Err(e) => {
            match &e {
                AuthError::Internal(detail) => tracing::error!("Login error: {}", detail),
                _ => tracing::warn!("Admin login failed: {}", e),
            }
            Err(e)
        }
    }
}

pub async fn get_admin_config(
    _session: AdminSession,
    State(config): State<Arc<ConfigStore>>,
) -> Json<RedactedConfig> {
    Json(config.redacted().await)
}

pub async fn update_admin_config(
    _session: AdminSession,
    State(config): State<Arc<ConfigStore>>,
    Json(update): Json<ConfigUpdate>,
) -> Json<MessageResponse> {
    if update.is_empty() {
        tracing::debug!("Empty configuration update");
    } else {
        let key_changed = update.api_key.is_some();
        config.apply(update).await;
        tracing::info!(key_changed, "Configuration updated");
    }

    Json(MessageResponse {
        message: "Configuration saved successfully".to_string(),
    })
}

pub async fn widget_config(State(config): State<Arc<ConfigStore>>) -> Json<PublicWidgetConfig> {
    Json(config.public_defaults().await)
}

pub async fn widget_script(
    State(config): State<Arc<ConfigStore>>,
    Query(query): Query<WidgetQuery>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let defaults = config.public_defaults().await;

    let mut script = WidgetScript::new(api_endpoint(&headers))
        .presentation(&defaults.widget_config)
        .welcome_message(defaults.welcome_message);

    if let Some(position) = query.position() {
        script = script.position(position);
    }
    if let Some(assistant) = non_blank(query.assistant) {
        script = script.assistant_id(assistant);
    }
    if let Some(color) = non_blank(query.color) {
        script = script.primary_color(color);
    }
    if let Some(title) = non_blank(query.title) {
        script = script.title(title);
    }
    if let Some(welcome) = non_blank(query.welcome) {
        script = script.welcome_message(welcome);
    }

    (
        [
            (CONTENT_TYPE, "application/javascript"),
            (CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
            (PRAGMA, "no-cache"),
            (EXPIRES, "0"),
        ],
        script.render(),
    )
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// `/api` base of this server as seen by the browser that loaded the script.
fn api_endpoint(headers: &HeaderMap) -> String {
    let host = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or("localhost");

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(',').next())
        .map(str::trim)
        .filter(|s| matches!(*s, "http" | "https"))
        .unwrap_or("http");

    format!("{scheme}://{host}/api")
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn endpoint_follows_host_and_forwarded_proto() {
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("chat.example.com"));
        assert_eq!(api_endpoint(&headers), "http://chat.example.com/api");

        headers.insert("x-forwarded-proto", HeaderValue::from_static("https, http"));
        assert_eq!(api_endpoint(&headers), "https://chat.example.com/api");

        headers.insert("x-forwarded-proto", HeaderValue::from_static("gopher"));
        assert_eq!(api_endpoint(&headers), "http://chat.example.com/api");
    }

    #[test]
    fn endpoint_without_host_falls_back_to_localhost() {
        assert_eq!(api_endpoint(&HeaderMap::new()), "http://localhost/api");
    }
}
