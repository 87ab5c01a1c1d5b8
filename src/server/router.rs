//! HTTP routes
//!
//! | Path                  | Response                                        |
//! |-----------------------|-------------------------------------------------|
//! | `/`                   | `301` to `/index.html`                          |
//! | `/index.html`         | generated index page                            |
//! | each registered path  | `multipart/x-mixed-replace` live stream         |
//! | anything else         | `404`                                           |
//!
//! Registered paths answer anything but `GET`/`HEAD` with `501`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use tokio::sync::{watch, Semaphore};
use tower_http::trace::TraceLayer;

use crate::protocol::constants::{INDEX_PATH, MULTIPART_CONTENT_TYPE, ROOT_PATH};
use crate::registry::{StreamEntry, StreamRegistry};
use crate::server::page::render_error;
use crate::server::shutdown::Shutdown;
use crate::session::{SessionContext, StreamSession};

/// State shared by every request handler
#[derive(Clone)]
pub struct AppState {
    registry: Arc<StreamRegistry>,
    /// Index page, rendered once since the registry never changes
    page: Bytes,
    connection_limit: Option<Arc<Semaphore>>,
    next_session_id: Arc<AtomicU64>,
    shutdown: watch::Receiver<bool>,
}

impl AppState {
    /// `max_viewers` of 0 means unlimited
    pub fn new(
        registry: Arc<StreamRegistry>,
        page: impl Into<Bytes>,
        max_viewers: usize,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let connection_limit = (max_viewers > 0).then(|| Arc::new(Semaphore::new(max_viewers)));

        Self {
            registry,
            page: page.into(),
            connection_limit,
            next_session_id: Arc::new(AtomicU64::new(1)),
            shutdown,
        }
    }
}

/// Build the router: fixed routes plus one route per registered stream
pub fn router(state: AppState) -> Router {
    let mut router = Router::new()
        .route(ROOT_PATH, get(redirect_to_index).fallback(not_implemented))
        .route(INDEX_PATH, get(index).fallback(not_implemented));

    for entry in state.registry.entries() {
        let stream_entry = Arc::clone(entry);
        let handler = move |State(state): State<AppState>,
                            ConnectInfo(peer): ConnectInfo<SocketAddr>| {
            let entry = Arc::clone(&stream_entry);
            async move { open_stream(state, entry, peer) }
        };
        router = router.route(&entry.path, get(handler).fallback(not_implemented));
    }

    router
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn redirect_to_index() -> impl IntoResponse {
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, INDEX_PATH)])
}

async fn index(State(state): State<AppState>) -> Html<Bytes> {
    Html(state.page.clone())
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND)
}

async fn not_implemented() -> Response {
    error_response(StatusCode::NOT_IMPLEMENTED)
}

fn error_response(status: StatusCode) -> Response {
    (status, Html(render_error(status))).into_response()
}

fn open_stream(state: AppState, entry: Arc<StreamEntry>, peer: SocketAddr) -> Response {
    let permit = match &state.connection_limit {
        Some(limit) => match Arc::clone(limit).try_acquire_owned() {
            Ok(permit) => Some(permit),
            Err(_) => {
                tracing::warn!(
                    peer = %peer,
                    stream = %entry.path,
                    "Viewer rejected: limit reached"
                );
                return error_response(StatusCode::SERVICE_UNAVAILABLE);
            }
        },
        None => None,
    };

    let session_id = state.next_session_id.fetch_add(1, Ordering::Relaxed);
    tracing::info!(
        session_id = session_id,
        peer = %peer,
        stream = %entry.path,
        "Added streaming client"
    );

    let ctx = SessionContext::new(session_id, peer, entry.path.clone());
    let session = StreamSession::new(ctx, entry.subscribe(), Shutdown::new(state.shutdown))
        .with_permit(permit);

    (
        StatusCode::OK,
        [
            (header::AGE, "0"),
            (header::CACHE_CONTROL, "no-cache, private"),
            (header::PRAGMA, "no-cache"),
            (header::CONTENT_TYPE, MULTIPART_CONTENT_TYPE),
        ],
        Body::from_stream(session.into_body_stream()),
    )
        .into_response()
}
