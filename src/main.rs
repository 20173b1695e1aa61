use parley::application::{ControllerOptions, SessionController, SessionDependencies};
use parley::config::Config;
use parley::infrastructure::credentials::SupabaseTokenProvider;
use parley::infrastructure::http::build_client;
use parley::infrastructure::media::{capture_from_config, PlatformAudioSession};
use parley::infrastructure::realtime::RealtimeSdpClient;
use parley::infrastructure::webrtc::WebRtcConnector;
use parley::interface::ConsoleShell;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Parley");

    // Load configuration
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;
    config.validate()?;
    info!("Configuration loaded: {:?}", config);

    let http = build_client(&config.http)?;
    let deps = SessionDependencies {
        credentials: Arc::new(SupabaseTokenProvider::new(http.clone(), &config.token_service)),
        audio: Arc::new(PlatformAudioSession::new()),
        capture: capture_from_config(config.media.ogg_file.as_ref()),
        connector: Arc::new(WebRtcConnector::new(config.rtc.clone())),
        signaling: Arc::new(RealtimeSdpClient::new(http, &config.realtime)),
    };

    let controller = Arc::new(SessionController::new(
        ControllerOptions::from_config(&config),
        deps,
    ));

    let shell = ConsoleShell::new(controller);
    shell.run(BufReader::new(tokio::io::stdin())).await?;

    info!("Parley stopped");
    Ok(())
}
