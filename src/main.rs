use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use voice_companion::backend::SettingsUpdate;
use voice_companion::history::collect_history;
use voice_companion::session::VoiceBubble;
use voice_companion::vendor::SimulatedDevice;
use voice_companion::{
    AppState, AuthFlow, BackendApi, BackendClient, ClientToolRegistry, Config, ConvaiClient,
    FileStore, SecureStore, SessionConfig, SessionController, SessionRequest, SettingsCache,
};

#[derive(Parser)]
#[command(name = "companion", version, about = "Voice companion client")]
struct Cli {
    /// Config file, extension optional
    #[arg(short, long, default_value = "config/companion")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Request an OTP for an existing account
    Login { phone: String },
    /// Create an account and request an OTP
    Register { name: String, phone: String },
    /// Verify the OTP that was sent
    Verify { phone: String, otp: String },
    /// Show settings, or update them when any option is given
    Settings {
        #[arg(long)]
        cultural_preference: Option<String>,
        #[arg(long)]
        accent: Option<String>,
        #[arg(long)]
        language: Option<String>,
    },
    /// Start a voice session and follow its status until Ctrl-C
    Talk,
    /// Print conversation history
    History {
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },
    Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Voice companion v{}", env!("CARGO_PKG_VERSION"));
    info!("Backend: {}", cfg.backend.base_url);
    info!("Store: {}", cfg.storage.path.display());

    let store: Arc<dyn SecureStore> = Arc::new(FileStore::open(&cfg.storage.path).await?);
    let backend: Arc<dyn BackendApi> = Arc::new(BackendClient::new(&cfg.backend)?);
    let state = Arc::new(AppState::initialize(Arc::clone(&store)).await?);
    let auth = AuthFlow::new(Arc::clone(&state), Arc::clone(&backend));

    match cli.command {
        Command::Login { phone } => {
            auth.request_login(&phone).await?;
            println!("OTP sent. Run `companion verify {} <otp>`.", phone);
        }
        Command::Register { name, phone } => {
            auth.register(&name, &phone).await?;
            println!("OTP sent. Run `companion verify {} <otp>`.", phone);
        }
        Command::Verify { phone, otp } => {
            let phone = voice_companion::app::normalize_phone(&phone)?;
            let profile = auth.verify_otp_for(&phone, &otp).await?;
            println!("Signed in as {}", profile.name);
            if !state.onboarding_complete() {
                state.complete_onboarding().await?;
                println!("Run `companion settings --cultural-preference <name>` to personalise.");
            }
        }
        Command::Settings {
            cultural_preference,
            accent,
            language,
        } => {
            require_login(&state)?;
            let cache = SettingsCache::new(
                Arc::clone(&store),
                Arc::clone(&backend),
                cfg.settings.recent_update_window_ms,
            );

            if cultural_preference.is_some() || accent.is_some() || language.is_some() {
                let remote = cache
                    .update_settings(SettingsUpdate {
                        language: language.clone(),
                        cultural_preference,
                        accent,
                    })
                    .await?;
                if let Some(language) = &remote.language {
                    state.set_language(language).await?;
                }
                println!("Updated: {:?}", remote);
            } else {
                let snapshot = cache.fetch_user_settings().await;
                let preferences = cache.refresh_on_focus().await;
                println!("loaded: {}", snapshot.loaded);
                println!("cultural preference: {}", preferences.cultural_preference);
                println!("accent: {}", preferences.accent);
                println!("language: {}", state.language());
            }
        }
        Command::Talk => {
            require_login(&state)?;
            talk(&cfg, &state, store, backend).await?;
        }
        Command::History { limit } => {
            require_login(&state)?;
            let profile = state.profile().await?;
            for message in collect_history(backend.as_ref(), &profile.token, limit).await? {
                println!("{:?}: {}", message.sender, message.message);
            }
        }
        Command::Logout => {
            state.logout().await?;
            println!("Signed out");
        }
    }

    Ok(())
}

fn require_login(state: &AppState) -> Result<()> {
    if state.auth().requires_login() {
        bail!("Not signed in. Run `companion login <phone>` first.");
    }
    Ok(())
}

async fn talk(
    cfg: &Config,
    state: &AppState,
    store: Arc<dyn SecureStore>,
    backend: Arc<dyn BackendApi>,
) -> Result<()> {
    let cache = SettingsCache::new(
        store,
        Arc::clone(&backend),
        cfg.settings.recent_update_window_ms,
    );
    cache.fetch_user_settings().await;
    let preferences = cache.refresh_on_focus().await;

    let tools = Arc::new(ClientToolRegistry::new(Box::new(SimulatedDevice::new(0.8))));
    let vendor = Arc::new(ConvaiClient::new(&cfg.vendor)?);
    let controller = SessionController::new(
        SessionConfig::from_config(cfg),
        vendor,
        backend,
        tools,
    );

    let mut updates = controller.subscribe();
    let request = SessionRequest {
        profile: state.profile().await?,
        preferences,
        language: state.language(),
    };

    if let Err(e) = controller.start(request).await {
        controller.teardown().await;
        bail!("{}", e);
    }

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                println!("[{}] {}", snapshot.status, VoiceBubble::for_status(snapshot.status).label);
                if let Some(error) = &snapshot.error {
                    println!("error: {}", error);
                }
                if snapshot.status == voice_companion::SessionStatus::Idle {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    controller.teardown().await;
    Ok(())
}
