use super::config::SessionConfig;
use super::status::{SessionSnapshot, SessionStatus};
use super::variables::{system_prompt, DynamicVariables};
use crate::backend::{BackendApi, OpeningMessage, UserProfile};
use crate::error::SessionError;
use crate::settings::Preferences;
use crate::vendor::{
    ClientToolRegistry, ConversationHandle, EventStream, MessageSource, StartSession, VendorEvent,
    VoiceVendor,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Inputs for one session start
#[derive(Debug, Clone, Default)]
pub struct SessionRequest {
    pub profile: UserProfile,
    pub preferences: Preferences,
    /// Language code for the system prompt
    pub language: String,
}

/// Owns the session status and mediates between user intent, the vendor
/// session and whoever renders the status
pub struct SessionController {
    inner: Arc<Inner>,
}

struct Inner {
    config: SessionConfig,
    vendor: Arc<dyn VoiceVendor>,
    backend: Arc<dyn BackendApi>,
    tools: Arc<ClientToolRegistry>,

    /// Cleared on teardown; late events and timer callbacks check it
    alive: AtomicBool,

    state: Mutex<ControllerState>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

#[derive(Default)]
struct ControllerState {
    status: SessionStatus,
    conversation_id: Option<String>,
    error: Option<String>,

    /// Bumped whenever a session attempt is started or abandoned, so events
    /// and start continuations from an older attempt are dropped
    epoch: u64,

    /// Task forwarding vendor events for the current attempt
    pump: Option<JoinHandle<()>>,

    /// Speaking-decay countdown; at most one armed at a time
    decay: Option<JoinHandle<()>>,
    decay_generation: u64,
}

impl ControllerState {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            conversation_id: self.conversation_id.clone(),
            error: self.error.clone(),
        }
    }

    fn cancel_decay(&mut self) {
        if let Some(handle) = self.decay.take() {
            handle.abort();
        }
        self.decay_generation += 1;
    }

    fn abort_pump(&mut self) {
        if let Some(handle) = self.pump.take() {
            handle.abort();
        }
    }

    /// Back to idle with no session: the only way out of a live status
    fn reset(&mut self, error: Option<String>) {
        self.cancel_decay();
        self.epoch += 1;
        self.status = SessionStatus::Idle;
        self.conversation_id = None;
        if error.is_some() {
            self.error = error;
        }
    }
}

impl SessionController {
    pub fn new(
        config: SessionConfig,
        vendor: Arc<dyn VoiceVendor>,
        backend: Arc<dyn BackendApi>,
        tools: Arc<ClientToolRegistry>,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(SessionSnapshot::default());

        Self {
            inner: Arc::new(Inner {
                config,
                vendor,
                backend,
                tools,
                alive: AtomicBool::new(true),
                state: Mutex::new(ControllerState::default()),
                snapshot_tx,
            }),
        }
    }

    /// Latest published state
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.snapshot_tx.borrow().clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.snapshot_tx.borrow().status
    }

    /// Receive every published state change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    /// User tapped to talk
    ///
    /// Only accepted from `Idle`. Missing profile fields fail before any
    /// network call and leave the status at `Idle`. Any failure after
    /// `Connecting` resets to `Idle` with a user-visible error; there is no
    /// automatic retry.
    pub async fn start(&self, request: SessionRequest) -> Result<ConversationHandle, SessionError> {
        self.inner.start(request).await
    }

    /// Apply a vendor lifecycle event to the current attempt
    pub async fn handle_event(&self, event: VendorEvent) {
        let epoch = self.inner.state.lock().await.epoch;
        self.inner.apply_event(epoch, event).await;
    }

    /// Idle/listening -> mic-off, mic-off -> idle
    pub async fn toggle_mic(&self) -> Result<SessionStatus, SessionError> {
        self.inner.toggle_mic().await
    }

    /// End the session. Always calls the vendor's end, whatever the status.
    pub async fn stop(&self) {
        self.inner.stop().await
    }

    /// The screen is going away: stop and ignore anything that arrives later
    pub async fn teardown(&self) {
        info!("Tearing down session controller");
        self.inner.alive.store(false, Ordering::SeqCst);
        self.inner.stop().await;
    }

    pub fn is_alive(&self) -> bool {
        self.inner.alive.load(Ordering::SeqCst)
    }
}

impl Inner {
    fn publish(&self, state: &ControllerState) {
        self.snapshot_tx.send_replace(state.snapshot());
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    async fn start(
        self: &Arc<Self>,
        request: SessionRequest,
    ) -> Result<ConversationHandle, SessionError> {
        let epoch = {
            let mut state = self.state.lock().await;

            if !self.is_alive() {
                return Err(SessionError::Closed);
            }
            if state.status != SessionStatus::Idle {
                warn!("Start ignored, session is {}", state.status);
                return Err(SessionError::NotIdle(state.status));
            }
            if !request.profile.is_complete() {
                warn!("Start refused: profile incomplete");
                state.error = Some(SessionError::MissingProfile.to_string());
                self.publish(&state);
                return Err(SessionError::MissingProfile);
            }

            state.epoch += 1;
            state.status = SessionStatus::Connecting;
            state.error = None;
            self.publish(&state);
            info!("Session connecting (attempt {})", state.epoch);
            state.epoch
        };

        let opening = self.fetch_opening_message(&request.profile.token).await;
        self.ensure_current(epoch).await?;

        let signed_url = match self.vendor.get_signed_url().await {
            Ok(url) => url,
            Err(e) => {
                error!("Failed to get signed URL: {:#}", e);
                return Err(self.fail(epoch, SessionError::SignedUrl(e.to_string())).await);
            }
        };
        self.ensure_current(epoch).await?;

        let cultural_preference = self
            .config
            .cultural_preference_or_default(&request.preferences.cultural_preference)
            .to_string();
        let variables = DynamicVariables {
            user_name: request.profile.name.clone(),
            phone_number: request.profile.phone_number.clone(),
            bot_name: self.config.bot_name.clone(),
            system_prompt: system_prompt(
                &request.language,
                &cultural_preference,
                &self.config.bot_name,
            ),
            opening_message: opening.opening_message,
            summary: opening.summary,
            bearer_token: request.profile.token.clone(),
        };
        debug!("Dynamic variables: {:?}", variables);

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        {
            let mut state = self.state.lock().await;
            if state.epoch != epoch {
                return Err(SessionError::Cancelled);
            }
            state.abort_pump();
            state.pump = Some(self.spawn_pump(epoch, events_rx));
        }

        let start = StartSession {
            signed_url,
            dynamic_variables: variables,
            voice_id: self.config.voice_for(&request.preferences.accent),
            tools: Arc::clone(&self.tools),
            events: events_tx,
        };

        let handle = match self.vendor.start_session(start).await {
            Ok(handle) => handle,
            Err(e) => {
                error!("Failed to start vendor session: {:#}", e);
                return Err(self.fail(epoch, SessionError::Connect(e.to_string())).await);
            }
        };

        let mut state = self.state.lock().await;
        if state.epoch != epoch || state.status == SessionStatus::Idle {
            // Stopped or disconnected while the vendor was connecting; an
            // idle status must not keep a session open
            drop(state);
            warn!("Session {} finished starting after it was abandoned", handle.id);
            if let Err(e) = self.vendor.end_session().await {
                warn!("Failed to end abandoned session: {:#}", e);
            }
            return Err(SessionError::Cancelled);
        }

        info!("Session started: {}", handle.id);
        state.conversation_id = Some(handle.id.clone());
        self.publish(&state);
        Ok(handle)
    }

    /// Best effort: a missing opening message never blocks a session
    async fn fetch_opening_message(&self, token: &str) -> OpeningMessage {
        if token.is_empty() {
            debug!("No token, skipping opening message");
            return OpeningMessage::default();
        }
        match self.backend.opening_message(token).await {
            Ok(opening) => opening,
            Err(e) => {
                warn!("Opening message unavailable, continuing without it: {}", e);
                OpeningMessage::default()
            }
        }
    }

    async fn ensure_current(&self, epoch: u64) -> Result<(), SessionError> {
        let state = self.state.lock().await;
        if state.epoch == epoch && self.is_alive() {
            Ok(())
        } else {
            debug!("Start attempt {} overtaken", epoch);
            Err(SessionError::Cancelled)
        }
    }

    /// Reset to idle with a user-visible message, if `epoch` is still current.
    /// A failure of an attempt that was already abandoned is `Cancelled`.
    async fn fail(&self, epoch: u64, err: SessionError) -> SessionError {
        let mut state = self.state.lock().await;
        if state.epoch != epoch {
            debug!("Attempt {} failed after it was abandoned: {}", epoch, err);
            return SessionError::Cancelled;
        }
        state.abort_pump();
        state.reset(Some(err.to_string()));
        self.publish(&state);
        err
    }

    fn spawn_pump(self: &Arc<Self>, epoch: u64, mut events: EventStream) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                inner.apply_event(epoch, event).await;
            }
            debug!("Event pump for attempt {} finished", epoch);
        })
    }

    async fn apply_event(self: &Arc<Self>, epoch: u64, event: VendorEvent) {
        if !self.is_alive() {
            debug!("Dropping {:?} after teardown", event);
            return;
        }

        let mut state = self.state.lock().await;
        if state.epoch != epoch {
            debug!("Dropping stale {:?}", event);
            return;
        }

        let before = state.snapshot();

        match event {
            VendorEvent::Connected { conversation_id } => {
                if state.status == SessionStatus::Connecting {
                    info!("Vendor connected: {}", conversation_id);
                    state.status = SessionStatus::Listening;
                    if state.conversation_id.is_none() {
                        state.conversation_id = Some(conversation_id);
                    }
                } else {
                    debug!("Connect while {}, ignored", state.status);
                }
            }
            VendorEvent::Message {
                source: MessageSource::Ai,
                text,
            } => match state.status {
                SessionStatus::Listening | SessionStatus::Speaking => {
                    debug!("AI: {}", text);
                    state.status = SessionStatus::Speaking;
                    self.arm_decay(&mut state);
                }
                other => debug!("AI message while {}, ignored", other),
            },
            VendorEvent::Message {
                source: MessageSource::User,
                text,
            } => {
                debug!("User: {}", text);
                if state.status == SessionStatus::Speaking {
                    state.cancel_decay();
                    state.status = SessionStatus::Listening;
                }
            }
            VendorEvent::Disconnected { reason } => {
                info!("Vendor disconnected: {:?}", reason);
                state.reset(None);
            }
            VendorEvent::Error { message } => {
                error!("Vendor error: {}", message);
                state.reset(Some(message));
            }
        }

        if state.snapshot() != before {
            self.publish(&state);
        }
    }

    /// (Re)start the speaking countdown, cancelling any armed one first
    fn arm_decay(self: &Arc<Self>, state: &mut ControllerState) {
        state.cancel_decay();
        let generation = state.decay_generation;
        let delay = self.config.speaking_decay;
        let weak = Arc::downgrade(self);

        state.decay = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                inner.decay_elapsed(generation).await;
            }
        }));
    }

    async fn decay_elapsed(&self, generation: u64) {
        if !self.is_alive() {
            return;
        }

        let mut state = self.state.lock().await;
        // A newer arming or a cancellation got here first
        if state.decay_generation != generation {
            return;
        }
        state.decay = None;

        if state.status == SessionStatus::Speaking {
            debug!("No AI message for {:?}, back to listening", self.config.speaking_decay);
            state.status = SessionStatus::Listening;
            self.publish(&state);
        }
    }

    async fn toggle_mic(&self) -> Result<SessionStatus, SessionError> {
        let mut state = self.state.lock().await;

        match state.status {
            SessionStatus::Idle | SessionStatus::Listening => {
                state.cancel_decay();
                state.status = SessionStatus::MicOff;
                self.publish(&state);
                info!("Microphone off");
                Ok(SessionStatus::MicOff)
            }
            SessionStatus::MicOff => {
                let had_session = state.conversation_id.is_some();
                state.abort_pump();
                state.reset(None);
                self.publish(&state);
                drop(state);

                info!("Microphone on");
                if had_session {
                    if let Err(e) = self.vendor.end_session().await {
                        warn!("Failed to end session on mic toggle: {:#}", e);
                    }
                }
                Ok(SessionStatus::Idle)
            }
            other => Err(SessionError::MicToggleUnavailable(other)),
        }
    }

    async fn stop(&self) {
        {
            let mut state = self.state.lock().await;
            info!("Stopping session (was {})", state.status);
            state.abort_pump();
            state.reset(None);
            self.publish(&state);
        }

        if let Err(e) = self.vendor.end_session().await {
            warn!("Vendor end_session failed: {:#}", e);
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        state.abort_pump();
        if let Some(handle) = state.decay.take() {
            handle.abort();
        }
    }
}
