//! Block endpoints.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use folio_store::BlockStore;
use folio_types::{Block, BlockDraft, BlockId, BlockPatch};
use tracing::{debug, instrument};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

fn bad_json(rejection: JsonRejection) -> ApiError {
    ApiError::BadRequest(rejection.body_text())
}

/// `GET /api/blocks`
#[instrument(name = "http.list_blocks", skip_all)]
pub async fn list_blocks(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Block>>> {
    let blocks = state.store.list().await?;
    debug!(count = blocks.len(), "listing blocks");
    Ok(Json(blocks))
}

/// `POST /api/blocks`
#[instrument(name = "http.create_block", skip_all)]
pub async fn create_block(
    State(state): State<Arc<AppState>>,
    body: Result<Json<BlockDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Block>)> {
    let Json(draft) = body.map_err(bad_json)?;
    let block = state.store.create(draft).await?;
    Ok((StatusCode::CREATED, Json(block)))
}

/// `PUT /api/blocks/{id}`
#[instrument(name = "http.update_block", skip_all)]
pub async fn update_block(
    State(state): State<Arc<AppState>>,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<BlockPatch>, JsonRejection>,
) -> ApiResult<Json<Block>> {
    let Path(raw) = id.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let id: BlockId = raw
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid block id: {raw}")))?;
    let Json(patch) = body.map_err(bad_json)?;
    let block = state.store.update(id, patch).await?;
    Ok(Json(block))
}

/// `GET /health`
pub async fn health() -> &'static str {
    "OK"
}
