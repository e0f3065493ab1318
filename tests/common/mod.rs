// Hand-written fakes shared by the integration tests

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use voice_companion::backend::{
    Ack, AuthResponse, BackendApi, ChatMessage, HistoryPage, OpeningMessage, RemoteSettings,
    Sender, SettingsUpdate, UserProfile,
};
use voice_companion::error::ApiError;
use voice_companion::session::DynamicVariables;
use voice_companion::vendor::{
    ClientToolRegistry, ConversationHandle, EventSink, StartSession, VendorEvent, VoiceVendor,
};

/// What the controller handed the vendor on start
#[derive(Clone)]
pub struct RecordedStart {
    pub signed_url: String,
    pub dynamic_variables: DynamicVariables,
    pub voice_id: Option<String>,
    pub tools: Arc<ClientToolRegistry>,
}

#[derive(Default)]
pub struct FakeVendor {
    pub fail_signed_url: bool,
    pub fail_start: bool,
    pub signed_url_delay: Option<Duration>,
    pub start_delay: Option<Duration>,
    pub signed_url_calls: AtomicUsize,
    pub start_calls: AtomicUsize,
    pub end_calls: AtomicUsize,
    pub last_start: Mutex<Option<RecordedStart>>,
    pub sink: Mutex<Option<EventSink>>,
}

impl FakeVendor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an event the way the vendor SDK would
    pub fn emit(&self, event: VendorEvent) {
        let sink = self.sink.lock().unwrap();
        sink.as_ref()
            .expect("no session started")
            .send(event)
            .expect("event pump gone");
    }

    pub fn has_sink(&self) -> bool {
        self.sink.lock().unwrap().is_some()
    }

    pub fn ends(&self) -> usize {
        self.end_calls.load(Ordering::SeqCst)
    }

    pub fn starts(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn recorded(&self) -> RecordedStart {
        self.last_start
            .lock()
            .unwrap()
            .clone()
            .expect("start_session was not called")
    }
}

#[async_trait]
impl VoiceVendor for FakeVendor {
    async fn get_signed_url(&self) -> Result<String> {
        self.signed_url_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.signed_url_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_signed_url {
            return Err(anyhow!("signed url rejected"));
        }
        Ok("wss://vendor.test/convai?token=signed".to_string())
    }

    async fn start_session(&self, request: StartSession) -> Result<ConversationHandle> {
        let n = self.start_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.start_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_start {
            return Err(anyhow!("handshake failed"));
        }

        *self.last_start.lock().unwrap() = Some(RecordedStart {
            signed_url: request.signed_url,
            dynamic_variables: request.dynamic_variables,
            voice_id: request.voice_id,
            tools: request.tools,
        });
        *self.sink.lock().unwrap() = Some(request.events);

        Ok(ConversationHandle {
            id: format!("conv-{}", n + 1),
        })
    }

    async fn end_session(&self) -> Result<()> {
        self.end_calls.fetch_add(1, Ordering::SeqCst);
        self.sink.lock().unwrap().take();
        Ok(())
    }
}

/// Backend fake with canned responses and call counters
pub struct FakeBackend {
    pub opening: Option<OpeningMessage>,
    pub settings: Option<RemoteSettings>,
    pub settings_calls: AtomicUsize,
    pub opening_calls: AtomicUsize,
    pub otp: String,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            opening: None,
            settings: None,
            settings_calls: AtomicUsize::new(0),
            opening_calls: AtomicUsize::new(0),
            otp: "123456".to_string(),
        }
    }
}

impl FakeBackend {
    pub fn settings_requests(&self) -> usize {
        self.settings_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendApi for FakeBackend {
    async fn login(&self, _phone_number: &str) -> Result<Ack, ApiError> {
        Ok(Ack {
            message: "OTP sent".into(),
        })
    }

    async fn register(&self, _name: &str, _phone_number: &str) -> Result<Ack, ApiError> {
        Ok(Ack {
            message: "OTP sent".into(),
        })
    }

    async fn verify_otp(&self, phone_number: &str, otp: &str) -> Result<AuthResponse, ApiError> {
        if otp != self.otp {
            return Err(ApiError::Status {
                status: 400,
                body: "invalid otp".into(),
            });
        }
        Ok(AuthResponse {
            token: "token-abc".into(),
            user: UserProfile {
                name: "Asha".into(),
                phone_number: phone_number.to_string(),
                token: String::new(),
            },
        })
    }

    async fn get_settings(&self, _token: &str) -> Result<RemoteSettings, ApiError> {
        self.settings_calls.fetch_add(1, Ordering::SeqCst);
        self.settings.clone().ok_or(ApiError::Status {
            status: 503,
            body: "unavailable".into(),
        })
    }

    async fn update_settings(
        &self,
        _token: &str,
        update: SettingsUpdate,
    ) -> Result<RemoteSettings, ApiError> {
        Ok(RemoteSettings {
            language: update.language,
            cultural_preference: update.cultural_preference,
            accent: update.accent,
        })
    }

    async fn conversation_history(
        &self,
        _token: &str,
        _cursor: Option<String>,
    ) -> Result<HistoryPage, ApiError> {
        Ok(HistoryPage::default())
    }

    async fn post_chat_message(&self, _token: &str, message: &str) -> Result<ChatMessage, ApiError> {
        Ok(ChatMessage {
            id: Some(1),
            sender: Sender::User,
            message: message.to_string(),
            created_at: None,
        })
    }

    async fn opening_message(&self, _token: &str) -> Result<OpeningMessage, ApiError> {
        self.opening_calls.fetch_add(1, Ordering::SeqCst);
        self.opening.clone().ok_or(ApiError::Status {
            status: 500,
            body: "no opening message".into(),
        })
    }
}

pub fn profile() -> UserProfile {
    UserProfile {
        name: "Asha".into(),
        phone_number: "+919800000000".into(),
        token: "token-abc".into(),
    }
}
