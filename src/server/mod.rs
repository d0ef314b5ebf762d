mod handler;

use std::net::SocketAddr;
use std::sync::Arc;

use hyper::body::Incoming;
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use tokio::net::TcpListener;

use crate::ai::{LlmGateway, OpenAiBackend};
use crate::auth::IdentityProvider;
use crate::config::Config;
use crate::db::Repository;
use crate::error::Result;

pub use handler::{handle, AppState, ANALYZE_PATH};

/// Builds the server state from configuration. Missing credentials fail here,
/// before the listener is bound.
pub async fn build_state(config: &Config) -> Result<AppState> {
    let identity = IdentityProvider::new(config.require_auth_secret()?, config.token_ttl_hours);
    let backend = OpenAiBackend::from_config(config)?;
    let repository = Repository::new(&config.db_path).await?;

    Ok(AppState {
        repository,
        gateway: LlmGateway::new(Arc::new(backend)),
        identity,
        require_classification: config.require_classification,
    })
}

pub async fn serve(config: &Config) -> Result<()> {
    let state = Arc::new(build_state(config).await?);

    let addr = bind_addr(config)?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        "Listening on http://{} (model {})",
        addr,
        state.gateway.model()
    );

    run(listener, state).await
}

fn bind_addr(config: &Config) -> Result<SocketAddr> {
    config
        .bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid bind_addr {:?}: {}", config.bind_addr, e).into())
}

/// Accepts connections until Ctrl-C, serving each one on its own task.
pub async fn run(listener: TcpListener, state: Arc<AppState>) -> Result<()> {
    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => accepted?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                return Ok(());
            }
        };

        let state = Arc::clone(&state);
        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let service = hyper::service::service_fn(move |req: Request<Incoming>| {
                let state = Arc::clone(&state);
                async move { handle(req, state).await }
            });
            if let Err(err) = Builder::new(TokioExecutor::new())
                .serve_connection(io, service)
                .await
            {
                // clients hanging up early are routine
                tracing::debug!("Connection error from {}: {}", peer, err);
            }
        });
    }
}
