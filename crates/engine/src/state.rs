use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::FromRef;

use crate::assistant::OpenAiConnector;
use crate::auth::AdminAuth;
use crate::bridge::ConversationBridge;
use crate::config::{ConfigStore, Settings};

pub type ChatBridge = ConversationBridge<OpenAiConnector>;

/// Everything a request handler can reach. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ConfigStore>,
    pub auth: Arc<AdminAuth>,
    pub bridge: Arc<ChatBridge>,
}

impl AppState {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let config = Arc::new(ConfigStore::new(settings.initial_configuration()));

        let secret = match &settings.token_secret {
            Some(secret) => secret.clone(),
            None => {
                tracing::warn!("JWT_SECRET is not set; admin tokens will not survive a restart");
                AdminAuth::random_secret()
            }
        };
        let auth = Arc::new(AdminAuth::new(
            settings.admin_password_hash.clone(),
            secret,
            settings.token_ttl,
        ));

        let connector = OpenAiConnector::new(&settings.openai_base_url, settings.request_timeout)
            .context("Failed to build assistant HTTP client")?;
        let bridge = Arc::new(ConversationBridge::new(connector, config.clone(), settings.poll));

        Ok(Self {
            config,
            auth,
            bridge,
        })
    }
}

impl FromRef<AppState> for Arc<AdminAuth> {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl FromRef<AppState> for Arc<ConfigStore> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
