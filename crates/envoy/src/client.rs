use anyhow::{Context, Result, anyhow};
use courier_shared::{
    ChatRequest, ChatResponse, ConfigUpdate, ErrorResponse, HealthResponse, LoginRequest,
    LoginResponse, MessageResponse, PublicWidgetConfig, RedactedConfig,
};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: String, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            token,
        }
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        self.send(self.client.get(self.url("/health"))).await
    }

    pub async fn login(&self, password: &str) -> Result<String> {
        let request = LoginRequest {
            password: password.to_string(),
        };
        let response: LoginResponse = self
            .send(self.client.post(self.url("/api/admin/login")).json(&request))
            .await?;
        Ok(response.token)
    }

    pub async fn admin_config(&self) -> Result<RedactedConfig> {
        self.send(self.authorized(self.client.get(self.url("/api/admin/config")))?)
            .await
    }

    pub async fn update_config(&self, update: &ConfigUpdate) -> Result<String> {
        let response: MessageResponse = self
            .send(self.authorized(self.client.post(self.url("/api/admin/config")))?.json(update))
            .await?;
        Ok(response.message)
    }

    pub async fn widget_defaults(&self) -> Result<PublicWidgetConfig> {
        self.send(self.client.get(self.url("/api/widget/config")))
            .await
    }

    pub async fn chat(
        &self,
        assistant_id: &str,
        thread_id: Option<String>,
        message: String,
    ) -> Result<ChatResponse> {
        let request = ChatRequest {
            message: Some(message),
            thread_id,
            assistant_id: Some(assistant_id.to_string()),
        };
        self.send(self.client.post(self.url("/api/chat")).json(&request))
            .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| anyhow!("Not logged in. Run `envoy login` first."))?;
        Ok(request.bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to reach courier at {}", self.base_url))?;
        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error)
        .unwrap_or(body);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(anyhow!(
            "{} ({}). Run `envoy login` to sign in again.",
            message,
            status
        )),
        _ => Err(anyhow!("{} ({})", message, status)),
    }
}
