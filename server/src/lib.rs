pub mod error;
pub mod headless;

use std::{net::SocketAddr, path::PathBuf};

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::error::ServeError;

/// Directory the map page, its scripts and the road network are served from.
#[derive(Clone, Debug)]
pub struct AppState {
    pub root: PathBuf,
}

impl AppState {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ServeError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(ServeError::NotADirectory(root));
        }
        Ok(Self { root })
    }
}

/// Static files only: every path maps to a file under `state.root`,
/// directories answer with their `index.html`.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let assets = ServeDir::new(state.root).append_index_html_on_directories(true);

    Router::new()
        .fallback_service(assets)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Binds `addr` and serves `state` until the process is stopped.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<(), ServeError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        "serving {} on http://{}",
        state.root.display(),
        listener.local_addr()?
    );
    axum::serve(listener, create_router(state)).await?;
    Ok(())
}
