// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! JSON API over the gallery and photo registries
//!
//! Every response body is a [`JsonResult`]. Missing entities become 404s;
//! filesystem failures become 500s.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::{AppConfig, WebConfig};
use crate::envelope::JsonResult;
use crate::gallery::{Gallery, GalleryRegistry};
use crate::photo::{Photo, PhotoRegistry};
use crate::store::FsStore;
use crate::tagger::{NoopTagger, OllamaTagger, TagInference};
use crate::user::{User, UserDirectory};
use crate::GalleryError;

/// Shared application state
pub struct AppState {
    pub galleries: GalleryRegistry,
    pub photos: PhotoRegistry,
    pub users: UserDirectory,
    /// Largest accepted upload request body, in bytes
    pub upload_limit: usize,
}

impl AppState {
    /// Wire up store, registries and tagger from configuration
    pub fn from_config(config: &AppConfig) -> crate::Result<Self> {
        let store = Arc::new(FsStore::open(&config.storage.root)?);
        let tagger: Arc<dyn TagInference> = if config.ai_engine.enabled {
            Arc::new(OllamaTagger::new(&config.ai_engine)?)
        } else {
            Arc::new(NoopTagger)
        };
        Ok(Self::new(store, tagger, UserDirectory::from_config(config))
            .with_upload_limit(config.web.max_upload_bytes()))
    }

    pub fn new(store: Arc<FsStore>, tagger: Arc<dyn TagInference>, users: UserDirectory) -> Self {
        let galleries = GalleryRegistry::new(store);
        let photos = PhotoRegistry::new(galleries.clone(), tagger);
        Self {
            galleries,
            photos,
            users,
            upload_limit: WebConfig::default().max_upload_bytes(),
        }
    }

    pub fn with_upload_limit(mut self, bytes: usize) -> Self {
        self.upload_limit = bytes;
        self
    }
}

/// Create the web application router
pub fn create_router(state: Arc<AppState>) -> Router {
    // the storage root also holds bookkeeping files; serve photos only
    let files = Router::new()
        .nest_service("/files", ServeDir::new(state.galleries.store().root()))
        .layer(middleware::from_fn(reject_hidden_paths));

    Router::new()
        .route("/api/galleries", get(api_list_galleries).post(api_create_gallery))
        .route(
            "/api/galleries/:id",
            get(api_get_gallery).put(api_rename_gallery).delete(api_delete_gallery),
        )
        .route(
            "/api/galleries/:id/photos",
            get(api_list_photos)
                .post(api_upload_photos)
                .layer(DefaultBodyLimit::max(state.upload_limit)),
        )
        .route(
            "/api/galleries/:id/photos/:photo",
            get(api_get_photo).put(api_rename_photo).delete(api_delete_photo),
        )
        .route("/api/galleries/:id/photos/:photo/tags", get(api_tag_photo))
        .route("/api/login", post(api_login))
        .merge(files)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// 404 for any path segment naming a dotfile, percent-encoded or not
async fn reject_hidden_paths(request: Request, next: Next) -> Response {
    let hidden = request.uri().path().split('/').any(|segment| {
        segment.starts_with('.') || segment.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("%2e"))
    });
    if hidden {
        return ApiError::not_found("File").into_response();
    }
    next.run(request).await
}

// === Errors ===

struct ApiError {
    status: StatusCode,
    body: JsonResult,
}

impl ApiError {
    fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            body: JsonResult::failed(i32::from(status.as_u16()), msg),
        }
    }

    fn not_found(what: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{} not found", what))
    }
}

impl From<GalleryError> for ApiError {
    fn from(e: GalleryError) -> Self {
        match e {
            GalleryError::InvalidName(_) => Self::new(StatusCode::BAD_REQUEST, e.to_string()),
            GalleryError::GalleryNotFound(_) => Self::new(StatusCode::NOT_FOUND, e.to_string()),
            GalleryError::GalleryExists(_) => Self::new(StatusCode::CONFLICT, e.to_string()),
            other => {
                error!("Request failed: {}", other);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<JsonResult<T>>, ApiError>;

fn ok<T>(msg: &str, data: T) -> ApiResult<T> {
    Ok(Json(JsonResult::success(msg, data)))
}

// === Galleries ===

#[derive(Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

#[derive(Deserialize)]
struct NameBody {
    name: String,
}

async fn api_list_galleries(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Vec<Gallery>> {
    let galleries = match query.q.as_deref() {
        Some(q) => state.galleries.search(q)?,
        None => state.galleries.all()?,
    };
    ok("OK", galleries)
}

async fn api_create_gallery(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NameBody>,
) -> ApiResult<Gallery> {
    ok("Created", state.galleries.create(&body.name)?)
}

async fn api_get_gallery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Gallery> {
    let gallery = state.galleries.find(&id).ok_or_else(|| ApiError::not_found("Gallery"))?;
    ok("OK", gallery)
}

async fn api_rename_gallery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<NameBody>,
) -> ApiResult<Gallery> {
    let gallery = state
        .galleries
        .rename(&id, &body.name)?
        .ok_or_else(|| ApiError::not_found("Gallery"))?;
    ok("Renamed", gallery)
}

async fn api_delete_gallery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Gallery> {
    let gallery = state.galleries.find(&id).ok_or_else(|| ApiError::not_found("Gallery"))?;
    state.galleries.delete(&gallery)?;
    ok("Deleted", gallery)
}

// === Photos ===

async fn api_list_photos(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Vec<Photo>> {
    let gallery = state.galleries.find(&id).ok_or_else(|| ApiError::not_found("Gallery"))?;
    let photos = match query.q.as_deref() {
        Some(q) => state.photos.search(&gallery.id, q)?,
        None => state.photos.gallery_photos(&gallery.id)?,
    };
    ok("OK", photos)
}

async fn api_upload_photos(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<Vec<Photo>> {
    let gallery = state.galleries.find(&id).ok_or_else(|| ApiError::not_found("Gallery"))?;

    let mut uploaded = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(e.status(), e.body_text()))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::new(e.status(), e.body_text()))?;
        let photo = state
            .photos
            .upload_bytes(&gallery, &filename, &bytes)?
            .ok_or_else(|| ApiError::not_found("Gallery"))?;
        uploaded.push(photo);
    }

    if uploaded.is_empty() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "No files in upload"));
    }
    ok("Uploaded", uploaded)
}

async fn api_get_photo(
    State(state): State<Arc<AppState>>,
    Path((id, photo)): Path<(String, String)>,
) -> ApiResult<Photo> {
    let photo = state.photos.find(&id, &photo)?.ok_or_else(|| ApiError::not_found("Photo"))?;
    ok("OK", photo)
}

async fn api_rename_photo(
    State(state): State<Arc<AppState>>,
    Path((id, photo)): Path<(String, String)>,
    Json(body): Json<NameBody>,
) -> ApiResult<Photo> {
    let photo = state
        .photos
        .rename(&id, &photo, &body.name)?
        .ok_or_else(|| ApiError::not_found("Photo"))?;
    ok("Renamed", photo)
}

async fn api_delete_photo(
    State(state): State<Arc<AppState>>,
    Path((id, photo)): Path<(String, String)>,
) -> ApiResult<Photo> {
    let photo = state.photos.delete(&id, &photo)?.ok_or_else(|| ApiError::not_found("Photo"))?;
    ok("Deleted", photo)
}

async fn api_tag_photo(
    State(state): State<Arc<AppState>>,
    Path((id, photo)): Path<(String, String)>,
) -> ApiResult<Vec<String>> {
    if state.photos.find(&id, &photo)?.is_none() {
        return Err(ApiError::not_found("Photo"));
    }
    ok("OK", state.photos.tag(&id, &photo).await)
}

// === Users ===

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

async fn api_login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginBody>,
) -> ApiResult<User> {
    let user = state
        .users
        .login(&body.username, &body.password)
        .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "Invalid username or password"))?;
    ok("Logged in", user)
}

/// Start the web server
pub async fn start_server(config: AppConfig) -> crate::Result<()> {
    let state = Arc::new(AppState::from_config(&config)?);

    let addr = format!("{}:{}", config.web.host, config.web.port);
    let listener = TcpListener::bind(&addr).await?;

    info!("Gallery API available at http://{}", addr);
    info!("Storage root: {}", config.storage.root);

    serve(listener, create_router(state), shutdown_signal()).await
}

/// Serve until `shutdown` resolves, then drain in-flight requests
async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> crate::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| GalleryError::Server(e.to_string()))?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed never fires; the other one still can.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
