use clap::Parser;
use dotenvy::dotenv;
use mp3_extractor::config::AppConfig;
use mp3_extractor::services::transcoder::{FfmpegTranscoder, SETTINGS_CAPTION};
use mp3_extractor::services::worker::SessionSweeper;
use mp3_extractor::{AppState, create_app};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind the HTTP server to
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port for the HTTP server
    #[arg(short, long, default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment & Logging
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mp3_extractor=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting MP4 → MP3 Converter...");

    let config = AppConfig::from_env();
    info!(
        "🛡️  Config: Max Size={}MB, Protected={}, Transcoder={}, Settings=\"{}\"",
        config.max_upload_size / 1024 / 1024,
        config.is_protected(),
        config.ffmpeg_bin,
        SETTINGS_CAPTION
    );

    // 2. Transcoder & State
    let transcoder = FfmpegTranscoder::from_config(&config);
    match transcoder.locate() {
        Some(path) => info!("🎬 Using transcoder at {}", path.display()),
        None => error!(
            "❌ {} is not installed in this environment. Uploads are disabled until it is.",
            config.ffmpeg_bin
        ),
    }

    let state = AppState::new(config.clone(), Arc::new(transcoder));
    if let Some(warning) = state.gate.warning() {
        warn!("⚠️  {}", warning);
    }

    // 3. Session Sweeper
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let sweeper = SessionSweeper::new(
        state.sessions.clone(),
        Duration::from_secs(config.session_sweep_secs),
        shutdown_rx,
    );
    let sweeper_handle = tokio::spawn(sweeper.run());

    // 4. HTTP Server
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &axum::http::Request<_>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        })
        .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
            info!("📥 {} {}", request.method(), request.uri());
        })
        .on_response(
            |response: &axum::http::Response<_>, latency: Duration, _span: &tracing::Span| {
                info!(
                    "📤 Finished in {:?} with status {}",
                    latency,
                    response.status()
                );
            },
        );

    let app = create_app(state).layer(trace_layer);
    let addr = SocketAddr::new(args.host, args.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("✅ Server listening on: http://{}", addr);
    info!("📖 Swagger UI documentation: http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        })
        .await?;

    let _ = sweeper_handle.await;
    info!("👋 Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, starting graceful shutdown...");
        },
    }
}
