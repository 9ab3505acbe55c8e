use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::{self, AppState};
use crate::config::AdminSeed;
use crate::seed::seed_admin;
use crate::store::{BoardDb, DbHandle};

/// Configuration for the board server.
pub struct ServerConfig {
    pub port: u16,
    pub db_path: PathBuf,
    /// Create the configured admin account before accepting requests.
    pub seed_admin: bool,
    pub dev_mode: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3030,
            db_path: PathBuf::from("data/project-board.db"),
            seed_admin: true,
            dev_mode: false,
        }
    }
}

/// Build the full application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    api::api_router().with_state(state)
}

/// Open the database at `path`, creating its parent directory if needed.
pub fn open_database(path: &std::path::Path) -> Result<BoardDb> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }
    BoardDb::new(path).with_context(|| format!("Failed to initialize database at {}", path.display()))
}

/// Start the board server and block until Ctrl+C.
pub async fn start_server(config: ServerConfig, admin: &AdminSeed) -> Result<()> {
    let db = DbHandle::new(open_database(&config.db_path)?);
    tracing::info!(path = %config.db_path.display(), "database ready");

    if config.seed_admin {
        seed_admin(&db, admin).await?;
    }

    let state = Arc::new(AppState::new(db));
    let mut app = build_router(state);

    if config.dev_mode {
        app = app.layer(CorsLayer::permissive());
    }

    let host = if config.dev_mode { "0.0.0.0" } else { "127.0.0.1" };
    let addr = format!("{}:{}", host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    tracing::info!(%local_addr, dev_mode = config.dev_mode, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_router() -> Router {
        let db = BoardDb::new_in_memory().unwrap();
        build_router(Arc::new(AppState::new(DbHandle::new(db))))
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 3030);
        assert_eq!(config.db_path, PathBuf::from("data/project-board.db"));
        assert!(config.seed_admin);
        assert!(!config.dev_mode);
    }

    #[tokio::test]
    async fn test_health_via_full_router() {
        let app = test_router();
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = test_router();
        let req = Request::builder()
            .uri("/v2/boards")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_open_database_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("board.db");
        open_database(&path).unwrap();
        assert!(path.exists());
    }
}
