pub mod app;
pub mod backend;
pub mod config;
pub mod error;
pub mod history;
pub mod session;
pub mod settings;
pub mod storage;
pub mod vendor;

pub use app::{AppState, AuthFlow, AuthStatus, TextSize};
pub use backend::{BackendApi, BackendClient, ChatMessage, UserProfile};
pub use config::Config;
pub use error::{ApiError, SessionError};
pub use session::{SessionConfig, SessionController, SessionRequest, SessionSnapshot, SessionStatus};
pub use settings::{Preferences, SettingsCache, SettingsSnapshot};
pub use storage::{FileStore, MemoryStore, SecureStore};
pub use vendor::{ClientToolRegistry, ConvaiClient, VendorEvent, VoiceVendor};
