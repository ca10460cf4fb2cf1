//! File-backed stand-in for the ranking API.
//!
//! Serves `GET /api/comics/{genre}?page=N` from `{data_dir}/{genre}/page_{N}.json`.

use std::{
    io,
    net::SocketAddr,
    path::{Path as FsPath, PathBuf},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{data::ErrorBody, genre::Genre};

type Result<T> = std::result::Result<T, ServerError>;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid page number. Page must be a positive integer.")]
    InvalidPage,

    #[error("Page {0} not found")]
    PageNotFound(u32),

    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::InvalidPage => StatusCode::BAD_REQUEST,
            ServerError::PageNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Internal(e) => {
                tracing::error!("failed to serve ranking page: {:#}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub struct MockServer {
    state: Arc<ServerState>,
}

struct ServerState {
    data_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<String>,
}

impl MockServer {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let state = Arc::new(ServerState {
            data_dir: data_dir.into(),
        });
        Self { state }
    }

    pub fn data_dir(&self) -> &FsPath {
        &self.state.data_dir
    }

    pub fn router(&self) -> axum::Router {
        axum::Router::new()
            .route("/health", get(Self::health))
            .route("/api/comics/{genre}", get(Self::get_page))
            .with_state(self.state.clone())
    }

    /// Bind `addr` and serve until the task is dropped
    pub async fn serve(&self, addr: SocketAddr) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(
            addr = %listener.local_addr()?,
            data_dir = %self.state.data_dir.display(),
            "serving rankings"
        );
        axum::serve(listener, self.router()).await?;
        Ok(())
    }

    async fn health() -> &'static str {
        "OK"
    }

    async fn get_page(
        State(state): State<Arc<ServerState>>,
        Path(genre): Path<String>,
        Query(query): Query<PageQuery>,
    ) -> Result<Json<Value>> {
        let page = parse_page_param(query.page.as_deref())?;
        let genre: Genre = genre.parse().map_err(|_| {
            tracing::debug!(%genre, page, "unknown genre");
            ServerError::PageNotFound(page)
        })?;
        tracing::info!(%genre, page, "serving ranking page");

        let path = state
            .data_dir
            .join(genre.as_str())
            .join(format!("page_{}.json", page));
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ServerError::PageNotFound(page))
            }
            Err(e) => return Err(ServerError::Internal(e.into())),
        };
        let value = serde_json::from_str(&content)
            .map_err(|e| ServerError::Internal(anyhow::Error::new(e).context(path.display().to_string())))?;

        Ok(Json(value))
    }
}

/// Missing means the first page; anything but a positive integer is rejected
fn parse_page_param(page: Option<&str>) -> Result<u32> {
    match page {
        None => Ok(1),
        Some(page) => match page.trim().parse::<u32>() {
            Ok(page) if page >= 1 => Ok(page),
            _ => Err(ServerError::InvalidPage),
        },
    }
}

/// Serve `data_dir` on an ephemeral local port
#[cfg(test)]
pub(crate) async fn spawn_for_test(data_dir: impl Into<PathBuf>) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = MockServer::new(data_dir).router();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

#[cfg(test)]
pub(crate) fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}
