// Outfit Voting - Web Server
// REST API with Axum: uploads, votes, results, admin surface

use axum::{
    extract::{ConnectInfo, DefaultBodyLimit, Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post, put},
    Router,
};
use outfit_voting::{
    AdminController, BallotStore, DiskImageStore, EntryStore, IdentityResolver, ImageUpload,
    RequestIdentity, SettingsPatch, SnapshotStore, TokenOrAddrResolver, VoteError, VotingEngine,
    MAX_IMAGE_BYTES,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
struct AppState {
    engine: Arc<VotingEngine>,
    admin: Arc<AdminController>,
    snapshots: Arc<SnapshotStore>,
    resolver: Arc<dyn IdentityResolver>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn fail(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Map each error kind to its transport status code
fn error_status(err: &VoteError) -> StatusCode {
    match err {
        VoteError::Validation(_)
        | VoteError::MissingImage
        | VoteError::DuplicateOwner
        | VoteError::DuplicateName(_)
        | VoteError::DuplicateVote { .. }
        | VoteError::SelfVote
        | VoteError::UploadsDisabled
        | VoteError::VotingDisabled => StatusCode::BAD_REQUEST,
        VoteError::EntryNotFound(_) => StatusCode::NOT_FOUND,
        VoteError::Unauthorized => StatusCode::UNAUTHORIZED,
        VoteError::StorageWrite(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(err: VoteError) -> Response {
    (
        error_status(&err),
        Json(ApiResponse::fail(err.to_string())),
    )
        .into_response()
}

/// Resolve the stable participant key: client token if supplied, observed
/// peer address otherwise.
fn resolve_identity(
    state: &AppState,
    client_token: Option<String>,
    addr: SocketAddr,
) -> Option<String> {
    state.resolver.resolve(&RequestIdentity {
        client_token,
        remote_addr: Some(addr.ip().to_string()),
    })
}

/// Admin credentials arrive as either `Authorization: Bearer <secret>` or an
/// `X-Admin-Password` header; both are bindings of the same exact-match check.
fn admin_secret(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get("authorization") {
        if let Ok(text) = value.to_str() {
            if let Some(token) = text.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }
    headers
        .get("x-admin-password")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

/// Flush both collections to disk; a failed flush is logged, the in-memory
/// state stays authoritative for the running event.
fn persist(state: &AppState) {
    let (entries, ballots) = state.engine.snapshot();
    if let Err(e) = state.snapshots.save(&entries, &ballots) {
        eprintln!("Warning: failed to persist state: {:#}", e);
    }
}

// ============================================================================
// API Handlers
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    message: String,
    timestamp: String,
}

/// GET /api/health - Liveness probe
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        message: "Backend is running".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}

/// GET /api/outfits - All entries
async fn list_outfits(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.engine.entries()))
}

/// GET /api/results - Ranked leaderboard
async fn get_results(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.engine.compute_results()))
}

#[derive(Default)]
struct UploadForm {
    user_name: String,
    user_identifier: Option<String>,
    image: Option<ImageUpload>,
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, String> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Malformed upload form: {}", e))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "userName" => {
                form.user_name = field
                    .text()
                    .await
                    .map_err(|e| format!("Malformed userName field: {}", e))?;
            }
            "userIdentifier" => {
                form.user_identifier = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| format!("Malformed userIdentifier field: {}", e))?,
                );
            }
            "image" => {
                let original_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| format!("Failed to read image: {}", e))?;
                form.image = Some(ImageUpload {
                    original_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    Ok(form)
}

/// POST /api/outfits - Upload a new outfit (multipart form)
async fn upload_outfit(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    multipart: Multipart,
) -> Response {
    let form = match read_upload_form(multipart).await {
        Ok(form) => form,
        Err(message) => return reject(VoteError::Validation(vec![message])),
    };

    let Some(owner) = resolve_identity(&state, form.user_identifier, addr) else {
        return reject(VoteError::Validation(vec![
            "User identifier is required".to_string(),
        ]));
    };

    match state
        .engine
        .submit_upload(&form.user_name, &owner, form.image.as_ref())
    {
        Ok(entry) => {
            persist(&state);
            (StatusCode::OK, Json(ApiResponse::ok(entry))).into_response()
        }
        Err(e) => reject(e),
    }
}

#[derive(Deserialize)]
struct VoteRequest {
    #[serde(rename = "outfitId")]
    outfit_id: String,

    #[serde(rename = "userIdentifier")]
    user_identifier: Option<String>,
}

#[derive(Serialize)]
struct VoteResponse {
    message: String,
}

/// POST /api/vote - Cast the caller's single vote
async fn cast_vote(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(request): Json<VoteRequest>,
) -> Response {
    let Some(voter) = resolve_identity(&state, request.user_identifier, addr) else {
        return reject(VoteError::Validation(vec![
            "User identifier is required".to_string(),
        ]));
    };

    match state.engine.submit_vote(&request.outfit_id, &voter) {
        Ok(()) => {
            persist(&state);
            (
                StatusCode::OK,
                Json(ApiResponse::ok(VoteResponse {
                    message: "Vote recorded successfully".to_string(),
                })),
            )
                .into_response()
        }
        Err(e) => reject(e),
    }
}

#[derive(Deserialize)]
struct StatusQuery {
    #[serde(rename = "userIdentifier")]
    user_identifier: Option<String>,
}

/// GET /api/status - The caller's upload/vote eligibility
async fn get_status(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Query(query): Query<StatusQuery>,
) -> Response {
    let Some(identifier) = resolve_identity(&state, query.user_identifier, addr) else {
        return reject(VoteError::Validation(vec![
            "User identifier is required".to_string(),
        ]));
    };

    (
        StatusCode::OK,
        Json(ApiResponse::ok(state.engine.status(&identifier))),
    )
        .into_response()
}

#[derive(Serialize)]
struct DeleteResponse {
    message: String,

    #[serde(rename = "freedOwner")]
    freed_owner: String,

    #[serde(rename = "removedVotes")]
    removed_votes: u64,
}

/// DELETE /api/outfits/:id - Admin delete with cascading un-vote
async fn delete_outfit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(e) = state.admin.authorize(admin_secret(&headers).as_deref()) {
        return reject(e);
    }

    match state.engine.delete_entry(&id) {
        Ok(outcome) => {
            if !outcome.image_removed {
                eprintln!(
                    "Warning: could not remove stored image {}",
                    outcome.entry.file_name
                );
            }
            persist(&state);
            (
                StatusCode::OK,
                Json(ApiResponse::ok(DeleteResponse {
                    message: "Outfit deleted successfully".to_string(),
                    freed_owner: outcome.freed_owner,
                    removed_votes: outcome.cascaded_ballots,
                })),
            )
                .into_response()
        }
        Err(e) => reject(e),
    }
}

#[derive(Deserialize)]
struct VerifyRequest {
    password: String,
}

#[derive(Serialize)]
struct VerifyResponse {
    valid: bool,
}

/// POST /api/admin/verify - Boolean secret check, no side effects
async fn verify_admin(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> impl IntoResponse {
    Json(ApiResponse::ok(VerifyResponse {
        valid: state.admin.verify(&request.password),
    }))
}

/// PUT /api/admin/settings - Admin-gated event toggles
async fn update_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(patch): Json<SettingsPatch>,
) -> Response {
    if let Err(e) = state.admin.authorize(admin_secret(&headers).as_deref()) {
        return reject(e);
    }

    (
        StatusCode::OK,
        Json(ApiResponse::ok(state.engine.update_settings(patch))),
    )
        .into_response()
}

// ============================================================================
// Main Server
// ============================================================================

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("Outfit Voting - Web Server v{}", outfit_voting::VERSION);

    let port: u16 = env_or("PORT", "3000").parse().unwrap_or(3000);
    let upload_dir = env_or("UPLOAD_DIR", "uploads");
    let data_dir = env_or("DATA_DIR", "data");
    let admin_password = env_or("ADMIN_PASSWORD", "admin123");

    let images = DiskImageStore::new(&upload_dir, "/uploads")?;
    let snapshots = SnapshotStore::new(&data_dir)?;

    // Reload persisted state; tallies are rebuilt from the ballots
    let entries = snapshots.load_entries()?;
    let ballots = snapshots.load_ballots()?;
    println!(
        "Loaded {} entries and {} ballots from {:?}",
        entries.len(),
        ballots.len(),
        data_dir
    );

    let engine = if entries.is_empty() && ballots.is_empty() {
        VotingEngine::new(EntryStore::new(), BallotStore::new(), Box::new(images))
    } else {
        VotingEngine::restore(
            entries,
            ballots,
            outfit_voting::AdminSettings::default(),
            Box::new(images),
        )
    };

    let state = AppState {
        engine: Arc::new(engine),
        admin: Arc::new(AdminController::new(&admin_password)),
        snapshots: Arc::new(snapshots),
        resolver: Arc::new(TokenOrAddrResolver),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/outfits", get(list_outfits).post(upload_outfit))
        .route("/outfits/:id", delete(delete_outfit))
        .route("/vote", post(cast_vote))
        .route("/results", get(get_results))
        .route("/status", get(get_status))
        .route("/admin/verify", post(verify_admin))
        .route("/admin/settings", put(update_settings))
        .with_state(state);

    // Image uploads go up to 10 MiB; leave headroom for the form overhead
    let app = Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 64 * 1024))
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    println!("Server running on http://localhost:{}", port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
