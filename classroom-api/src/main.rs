use classroom_upstream::{
    client::{UpstreamClient, UpstreamError},
    config::{ApiKey, BaseUrl, DEFAULT_BASE_URL, InvalidBaseUrlError, UpstreamConfig},
};
use serde::Deserialize;
use server::{CookieSettings, ServerState};
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::Duration,
};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod server;

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error(transparent)]
    BaseUrl(#[from] InvalidBaseUrlError),
    #[error("Error creating upstream client: {0}")]
    Upstream(#[from] UpstreamError),
    #[error("Error binding tcp listener: {0}")]
    TcpBind(std::io::Error),
    #[error("Error serving server: {0}")]
    TcpServe(std::io::Error),
}

fn default_api_base() -> String {
    DEFAULT_BASE_URL.to_owned()
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct Env {
    server_address: IpAddr,
    server_port: u16,
    #[serde(default = "default_api_base")]
    classroom_api_base: String,
    classroom_api_key: Option<String>,
    #[serde(default)]
    secure_cookies: bool,
    upstream_timeout_secs: Option<u64>,
}

impl Env {
    fn upstream_config(&self) -> Result<UpstreamConfig, InitError> {
        let api_key = self.classroom_api_key.clone().and_then(ApiKey::new);
        if api_key.is_none() {
            warn!("CLASSROOM_API_KEY is not set, proxy endpoints will answer 500");
        }

        Ok(UpstreamConfig {
            base_url: BaseUrl::parse(&self.classroom_api_base)?,
            api_key,
            timeout: self.upstream_timeout_secs.map(Duration::from_secs),
        })
    }
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "classroom_api=debug,\
                classroom_upstream=debug,\
                classroom_common=debug,\
                tower_http=debug,axum::rejection=trace"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn get_env() -> Result<Env, InitError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .dotenv file found");
        } else {
            return Err(e.into());
        }
    }

    envy::from_env().map_err(InitError::from)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "Could not listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let env = get_env()?;

    let config = env.upstream_config()?;
    let upstream = UpstreamClient::new(&config)?;
    info!(base_url = %config.base_url, "Proxying classroom upstream");

    let state = ServerState {
        upstream: Arc::new(upstream),
        config: Arc::new(config),
        cookies: CookieSettings {
            secure: env.secure_cookies,
        },
    };

    let tracing_layer = TraceLayer::new_for_http();
    let app = server::routes().layer(tracing_layer).with_state(state);

    let server_address = SocketAddr::new(env.server_address, env.server_port);
    let listener = tokio::net::TcpListener::bind(server_address)
        .await
        .map_err(InitError::TcpBind)?;
    info!(%server_address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(InitError::TcpServe)?;

    Ok(())
}
