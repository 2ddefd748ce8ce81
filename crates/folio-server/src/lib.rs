//! Folio REST server.
//!
//! Serves the block store over HTTP and stores uploaded images on disk.
//!
//! | Route                 | Method | |
//! |-----------------------|--------|------------------------------------|
//! | `/api/blocks`         | GET    | All blocks, ascending by position  |
//! | `/api/blocks`         | POST   | Create a block (201)               |
//! | `/api/blocks/{id}`    | PUT    | Partial update                     |
//! | `/api/upload`         | POST   | Multipart image upload             |
//! | `/uploads/{name}`     | GET    | Uploaded files                     |
//! | `/health`             | GET    | Liveness                           |

pub mod config;
pub mod constants;
pub mod error;
pub mod routes;
pub mod upload;

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use folio_store::{BlockEvent, SqliteBlockStore};
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

pub use config::{ConfigError, ConfigOverrides, ServerConfig};
pub use error::{ApiError, ApiResult};

/// Room for multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared handler state.
pub struct AppState {
    pub store: SqliteBlockStore,
    pub uploads_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(store: SqliteBlockStore, config: &ServerConfig) -> Self {
        Self {
            store,
            uploads_dir: config.uploads_dir.clone(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

/// Build the router over `state`.
pub fn router(state: Arc<AppState>) -> Router {
    let upload_limit = state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);
    Router::new()
        .route("/api/blocks", get(routes::list_blocks).post(routes::create_block))
        .route("/api/blocks/{id}", put(routes::update_block))
        .route(
            "/api/upload",
            post(upload::upload_image).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/uploads/{name}", get(upload::serve_upload))
        .route("/health", get(routes::health))
        .with_state(state)
}

/// Log store changes until the store is dropped.
fn spawn_event_logger(store: &SqliteBlockStore) {
    let mut rx = store.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(BlockEvent::Created { block }) => {
                    info!(id = %block.id, kind = %block.kind(), position = block.position, "block created");
                }
                Ok(BlockEvent::Updated { block }) => {
                    debug!(id = %block.id, position = block.position, "block updated");
                }
                Err(RecvError::Lagged(n)) => warn!(skipped = n, "event logger lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Open the database, prepare the uploads directory and serve until Ctrl-C.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let store = SqliteBlockStore::open(&config.database_path)?;
    if config.seed_sample_data {
        store.seed_if_empty()?;
    }
    tokio::fs::create_dir_all(&config.uploads_dir).await?;
    spawn_event_logger(&store);

    let app = router(Arc::new(AppState::new(store, &config)));
    let listener = TcpListener::bind(config.bind_address).await?;
    info!("folio server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("folio server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutting down...");
}
