use super::messages::{
    Ack, AuthResponse, ChatMessage, ChatMessageRequest, HistoryPage, LoginRequest,
    OpeningMessage, RegisterRequest, RemoteSettings, SettingsUpdate, VerifyOtpRequest,
};
use super::BackendApi;
use crate::config::BackendConfig;
use crate::error::ApiError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

const LOGIN_PATH: &str = "/api/auth/login/";
const REGISTER_PATH: &str = "/api/auth/register/";
const VERIFY_OTP_PATH: &str = "/api/auth/verify-otp/";
const SETTINGS_PATH: &str = "/api/user/settings/";
const HISTORY_PATH: &str = "/api/conversations/";
const CHAT_PATH: &str = "/api/chat/";
const OPENING_MESSAGE_PATH: &str = "/api/opening-message/";

/// HTTP client for the companion backend
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and decode a JSON body, mapping non-2xx to `ApiError`
    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            warn!("Backend rejected token");
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Backend returned {}: {}", status, body);
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl BackendApi for BackendClient {
    async fn login(&self, phone_number: &str) -> Result<Ack, ApiError> {
        info!("Requesting OTP");
        let body = LoginRequest {
            phone_number: phone_number.to_string(),
        };
        Self::send(self.client.post(self.url(LOGIN_PATH)).json(&body)).await
    }

    async fn register(&self, name: &str, phone_number: &str) -> Result<Ack, ApiError> {
        info!("Registering new account");
        let body = RegisterRequest {
            name: name.to_string(),
            phone_number: phone_number.to_string(),
        };
        Self::send(self.client.post(self.url(REGISTER_PATH)).json(&body)).await
    }

    async fn verify_otp(&self, phone_number: &str, otp: &str) -> Result<AuthResponse, ApiError> {
        info!("Verifying OTP");
        let body = VerifyOtpRequest {
            phone_number: phone_number.to_string(),
            otp: otp.to_string(),
        };
        let mut auth: AuthResponse =
            Self::send(self.client.post(self.url(VERIFY_OTP_PATH)).json(&body)).await?;
        auth.user.token = auth.token.clone();
        Ok(auth)
    }

    async fn get_settings(&self, token: &str) -> Result<RemoteSettings, ApiError> {
        debug!("GET {}", SETTINGS_PATH);
        Self::send(self.client.get(self.url(SETTINGS_PATH)).bearer_auth(token)).await
    }

    async fn update_settings(
        &self,
        token: &str,
        update: SettingsUpdate,
    ) -> Result<RemoteSettings, ApiError> {
        debug!("PATCH {}", SETTINGS_PATH);
        Self::send(
            self.client
                .patch(self.url(SETTINGS_PATH))
                .bearer_auth(token)
                .json(&update),
        )
        .await
    }

    async fn conversation_history(
        &self,
        token: &str,
        cursor: Option<String>,
    ) -> Result<HistoryPage, ApiError> {
        // The cursor is the absolute URL the backend handed back
        let url = cursor.unwrap_or_else(|| self.url(HISTORY_PATH));
        debug!("GET {}", url);
        Self::send(self.client.get(url).bearer_auth(token)).await
    }

    async fn post_chat_message(&self, token: &str, message: &str) -> Result<ChatMessage, ApiError> {
        let body = ChatMessageRequest {
            message: message.to_string(),
        };
        Self::send(
            self.client
                .post(self.url(CHAT_PATH))
                .bearer_auth(token)
                .json(&body),
        )
        .await
    }

    async fn opening_message(&self, token: &str) -> Result<OpeningMessage, ApiError> {
        debug!("GET {}", OPENING_MESSAGE_PATH);
        Self::send(
            self.client
                .get(self.url(OPENING_MESSAGE_PATH))
                .bearer_auth(token),
        )
        .await
    }
}
