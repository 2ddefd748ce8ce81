//! Block store over the folio REST API.

use std::time::Duration;

use async_trait::async_trait;
use folio_store::{BlockStore, StoreError, StoreResult};
use folio_types::{Block, BlockDraft, BlockId, BlockPatch};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::constants::DEFAULT_REQUEST_TIMEOUT;

/// Transport-level failures.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Status {
        status: StatusCode,
        code: Option<String>,
        message: String,
    },

    #[error("failed to read {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl HttpError {
    /// Fold into the store's error kinds. `id` is the block the request
    /// targeted, if any.
    pub fn into_store_error(self, id: Option<BlockId>) -> StoreError {
        match self {
            HttpError::Status {
                status,
                code,
                message,
            } => {
                let code = code.unwrap_or_else(|| match status {
                    StatusCode::NOT_FOUND => "not_found".into(),
                    StatusCode::BAD_REQUEST => "validation".into(),
                    _ => "unavailable".into(),
                });
                StoreError::from_code(&code, message, id)
            }
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    code: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    image_url: String,
}

/// [`BlockStore`] backed by a folio server.
#[derive(Clone, Debug)]
pub struct HttpBlockStore {
    client: Client,
    base_url: String,
}

impl HttpBlockStore {
    /// Client for the server at `base_url` (e.g. `http://127.0.0.1:3001`).
    pub fn new(base_url: impl Into<String>) -> Result<Self, HttpError> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(HttpError::Build)?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Upload an image file; returns the URL to store on an image block.
    #[instrument(name = "http.upload", skip(self))]
    pub async fn upload_image(&self, path: &std::path::Path) -> Result<String, HttpError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| HttpError::File {
            path: path.display().to_string(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".into());
        let mime = mime_for(&file_name);
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime)?;
        let form = reqwest::multipart::Form::new().part("image", part);
        let response = self
            .client
            .post(self.url("/api/upload"))
            .multipart(form)
            .send()
            .await?;
        let body: UploadResponse = check(response).await?.json().await?;
        Ok(self.resolve(&body.image_url))
    }

    /// Server-relative URLs (`/uploads/...`) become absolute.
    fn resolve(&self, url: &str) -> String {
        if url.starts_with('/') {
            self.url(url)
        } else {
            url.to_string()
        }
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Turn a non-success response into [`HttpError::Status`].
async fn check(response: Response) -> Result<Response, HttpError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let (code, message) = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => (body.code, body.error),
        Err(_) => (None, text),
    };
    Err(HttpError::Status {
        status,
        code,
        message,
    })
}

impl HttpBlockStore {
    async fn get_blocks(&self) -> Result<Vec<Block>, HttpError> {
        let response = self.client.get(self.url("/api/blocks")).send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn post_block(&self, draft: &BlockDraft) -> Result<Block, HttpError> {
        let response = self
            .client
            .post(self.url("/api/blocks"))
            .json(draft)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn put_block(&self, id: BlockId, patch: &BlockPatch) -> Result<Block, HttpError> {
        let response = self
            .client
            .put(self.url(&format!("/api/blocks/{id}")))
            .json(patch)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }
}

#[async_trait]
impl BlockStore for HttpBlockStore {
    #[instrument(name = "http.list", skip(self))]
    async fn list(&self) -> StoreResult<Vec<Block>> {
        let mut blocks = self
            .get_blocks()
            .await
            .map_err(|e| e.into_store_error(None))?;
        folio_types::sort_by_position(&mut blocks);
        debug!(count = blocks.len(), "listed blocks");
        Ok(blocks)
    }

    #[instrument(name = "http.create", skip(self, draft))]
    async fn create(&self, draft: BlockDraft) -> StoreResult<Block> {
        self.post_block(&draft)
            .await
            .map_err(|e| e.into_store_error(None))
    }

    #[instrument(name = "http.update", skip(self, patch), fields(id = %id))]
    async fn update(&self, id: BlockId, patch: BlockPatch) -> StoreResult<Block> {
        self.put_block(id, &patch)
            .await
            .map_err(|e| e.into_store_error(Some(id)))
    }
}
