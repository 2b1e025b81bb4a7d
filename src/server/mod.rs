use crate::core::harvest::{search_url, SearchQuery};
use crate::utils::error::Result;
use axum::extract::{Path as UrlPath, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

struct DatasetState {
    path: PathBuf,
}

/// Routes for serving a normalized dataset file. The file is re-read on
/// every request, so edits show up without a restart.
pub fn dataset_router(path: PathBuf) -> Router {
    let state = Arc::new(DatasetState { path });
    Router::new()
        .route("/", get(whole_document))
        .route("/:key", get(collection))
        .layer(cors())
        .with_state(state)
}

async fn read_document(state: &DatasetState) -> std::result::Result<Value, (StatusCode, String)> {
    let bytes = tokio::fs::read(&state.path).await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("cannot read {}: {}", state.path.display(), e),
        )
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{} is not valid JSON: {}", state.path.display(), e),
        )
    })
}

async fn whole_document(
    State(state): State<Arc<DatasetState>>,
) -> std::result::Result<Json<Value>, (StatusCode, String)> {
    Ok(Json(read_document(&state).await?))
}

async fn collection(
    State(state): State<Arc<DatasetState>>,
    UrlPath(key): UrlPath<String>,
) -> std::result::Result<Json<Value>, (StatusCode, String)> {
    let document = read_document(&state).await?;
    match document.get(&key) {
        Some(value) => Ok(Json(value.clone())),
        None => Err((
            StatusCode::NOT_FOUND,
            format!("no collection named '{}'", key),
        )),
    }
}

/// Serve a dataset file on a fixed local port.
pub async fn serve_dataset(path: PathBuf, port: u16) -> Result<()> {
    let listener = bind_local(port).await?;
    tracing::info!(
        "serving {} on http://{}",
        path.display(),
        listener.local_addr()?
    );
    serve_router(listener, dataset_router(path)).await
}

#[derive(Debug, Clone)]
pub struct ProxyOptions {
    pub base_url: String,
    pub limit: u32,
}

struct ProxyState {
    client: reqwest::Client,
    options: ProxyOptions,
}

#[derive(Debug, Deserialize)]
struct ProxyParams {
    #[serde(default)]
    keyword: String,
    #[serde(default)]
    portal: String,
}

/// Routes for the search proxy endpoint.
pub fn proxy_router(options: ProxyOptions) -> Router {
    let state = Arc::new(ProxyState {
        client: reqwest::Client::new(),
        options,
    });
    Router::new()
        .route("/proxy", get(proxy_search))
        .layer(cors())
        .with_state(state)
}

async fn proxy_search(
    State(state): State<Arc<ProxyState>>,
    Query(params): Query<ProxyParams>,
) -> Response {
    // Proxied searches widen the net: limited and private results included.
    let query = SearchQuery {
        keyword: params.keyword,
        portal: params.portal,
        limit: state.options.limit,
        include_limited: true,
        include_private: true,
        ..SearchQuery::default()
    };

    let target = match search_url(&state.options.base_url, &query) {
        Ok(url) => url,
        Err(err) => {
            tracing::error!("Error fetching data: {}", err);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error fetching data").into_response();
        }
    };

    match relay(&state.client, target).await {
        Ok(response) => response,
        Err(err) => {
            tracing::error!("Error fetching data: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error fetching data").into_response()
        }
    }
}

async fn relay(client: &reqwest::Client, target: url::Url) -> Result<Response> {
    let upstream = client.get(target).send().await?;

    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = upstream
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| HeaderValue::from_bytes(value.as_bytes()).ok());
    let body = upstream.bytes().await?;

    let mut response = (status, body).into_response();
    if let Some(content_type) = content_type {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, content_type);
    }
    Ok(response)
}

/// Proxy catalogue searches on a fixed local port.
pub async fn serve_proxy(options: ProxyOptions, port: u16) -> Result<()> {
    let listener = bind_local(port).await?;
    tracing::info!(
        "proxy listening on http://{}/proxy",
        listener.local_addr()?
    );
    serve_router(listener, proxy_router(options)).await
}

async fn bind_local(port: u16) -> Result<TcpListener> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    Ok(TcpListener::bind(addr).await?)
}

/// Run a router on an already-bound listener. Split out so tests can bind
/// port 0 and discover the address first.
pub async fn serve_router(listener: TcpListener, router: Router) -> Result<()> {
    axum::serve(listener, router).await?;
    Ok(())
}
