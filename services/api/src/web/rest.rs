//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::auth::{AuthResponse, LoginRequest, SignupRequest};
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use postcraft_core::domain::{GeneratedPost, Language, StyleProfile};
use postcraft_core::ports::PortError;
use postcraft_core::workflow::WorkflowError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        dashboard_handler,
        upload_samples_handler,
        analyze_handler,
        generate_handler,
        list_posts_handler,
        get_post_handler,
    ),
    components(
        schemas(
            SignupRequest,
            LoginRequest,
            AuthResponse,
            DashboardResponse,
            UploadSamplesRequest,
            UploadSamplesResponse,
            StyleProfileResponse,
            GenerateRequest,
            GenerateResponse,
            PostResponse,
        )
    ),
    tags(
        (name = "PostCraft API", description = "API endpoints for style-profiled post generation.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct DashboardResponse {
    username: String,
    sample_count: i64,
    has_profile: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct UploadSamplesRequest {
    /// Pasted posts, separated by "---".
    posts_text: String,
}

#[derive(Serialize, ToSchema)]
pub struct UploadSamplesResponse {
    /// Number of blocks actually persisted (at most 15 per upload).
    uploaded_count: usize,
}

#[derive(Serialize, ToSchema)]
pub struct StyleProfileResponse {
    tone_summary: String,
    structure_summary: String,
    vocabulary_keywords: Vec<String>,
    typical_length: i32,
    analyzed_at: DateTime<Utc>,
}

impl From<StyleProfile> for StyleProfileResponse {
    fn from(profile: StyleProfile) -> Self {
        Self {
            tone_summary: profile.tone_summary,
            structure_summary: profile.structure_summary,
            vocabulary_keywords: profile.vocabulary_keywords,
            typical_length: profile.typical_length,
            analyzed_at: profile.analyzed_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct GenerateRequest {
    topic: String,
    /// One of "English" or "Hindi". Defaults to English.
    language: Option<String>,
    /// Optional explicit word count; falls back to the profile's typical
    /// length, then 250.
    length: Option<i32>,
}

#[derive(Serialize, ToSchema)]
pub struct GenerateResponse {
    post_id: Uuid,
}

#[derive(Serialize, ToSchema)]
pub struct PostResponse {
    id: Uuid,
    topic: String,
    language: String,
    target_length: i32,
    generated_text: String,
    created_at: DateTime<Utc>,
}

impl From<GeneratedPost> for PostResponse {
    fn from(post: GeneratedPost) -> Self {
        Self {
            id: post.id,
            topic: post.topic,
            language: post.language.to_string(),
            target_length: post.target_length,
            generated_text: post.generated_text,
            created_at: post.created_at,
        }
    }
}

//=========================================================================================
// Error Mapping
//=========================================================================================

/// Workflow rejections are user-facing messages; port failures are logged and
/// masked behind a generic 500.
fn workflow_error_response(err: WorkflowError) -> (StatusCode, String) {
    match &err {
        WorkflowError::EmptyUpload
        | WorkflowError::EmptyTopic
        | WorkflowError::TopicTooLong => (StatusCode::BAD_REQUEST, err.to_string()),
        WorkflowError::NoSamples | WorkflowError::NoProfile => {
            (StatusCode::CONFLICT, err.to_string())
        }
        WorkflowError::Port(e) => {
            error!("Workflow port error: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

fn port_error_response(err: PortError) -> (StatusCode, String) {
    match err {
        PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        PortError::Unexpected(e) => {
            error!("Port error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Account overview for the dashboard screen.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Dashboard data", body = DashboardResponse),
        (status = 401, description = "Not logged in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user = state
        .db
        .get_user_by_id(user_id)
        .await
        .map_err(port_error_response)?;
    let sample_count = state
        .db
        .count_raw_samples(user_id)
        .await
        .map_err(port_error_response)?;
    let has_profile = state
        .db
        .get_style_profile(user_id)
        .await
        .map_err(port_error_response)?
        .is_some();

    Ok(Json(DashboardResponse {
        username: user.username,
        sample_count,
        has_profile,
    }))
}

/// Upload sample posts, separated by "---".
///
/// Blocks are trimmed, empty blocks dropped, and at most 15 persisted.
#[utoipa::path(
    post,
    path = "/samples",
    request_body = UploadSamplesRequest,
    responses(
        (status = 201, description = "Samples persisted", body = UploadSamplesResponse),
        (status = 400, description = "No non-empty sample blocks in the upload"),
        (status = 401, description = "Not logged in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn upload_samples_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<UploadSamplesRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let uploaded_count = state
        .workflow
        .upload_samples(user_id, &req.posts_text)
        .await
        .map_err(workflow_error_response)?;
    Ok((
        StatusCode::CREATED,
        Json(UploadSamplesResponse { uploaded_count }),
    ))
}

/// Derive (or re-derive) the account's style profile from its stored samples.
///
/// Replaces any existing profile in full. Requires at least one uploaded
/// sample; a model failure still produces a profile via the fixed fallback.
#[utoipa::path(
    post,
    path = "/analyze",
    responses(
        (status = 200, description = "Style profile stored", body = StyleProfileResponse),
        (status = 401, description = "Not logged in"),
        (status = 409, description = "No samples uploaded yet"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let (profile, source) = state
        .workflow
        .analyze(user_id)
        .await
        .map_err(workflow_error_response)?;
    tracing::info!(?source, %user_id, "style profile stored");
    Ok(Json(StyleProfileResponse::from(profile)))
}

/// Generate a post on a topic in the account's stored style.
#[utoipa::path(
    post,
    path = "/generate",
    request_body = GenerateRequest,
    responses(
        (status = 201, description = "Post generated and stored", body = GenerateResponse),
        (status = 400, description = "Invalid topic or language"),
        (status = 401, description = "Not logged in"),
        (status = 409, description = "No style profile yet; analyze first"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<GenerateRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let language = match req.language.as_deref() {
        None => Language::default(),
        Some(tag) => tag
            .parse::<Language>()
            .map_err(|msg| (StatusCode::BAD_REQUEST, msg))?,
    };

    let post = state
        .workflow
        .generate(user_id, &req.topic, language, req.length)
        .await
        .map_err(workflow_error_response)?;

    Ok((StatusCode::CREATED, Json(GenerateResponse { post_id: post.id })))
}

/// List the account's generated posts, newest first.
#[utoipa::path(
    get,
    path = "/posts",
    responses(
        (status = 200, description = "Generated posts", body = [PostResponse]),
        (status = 401, description = "Not logged in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_posts_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let posts = state
        .db
        .list_generated_posts(user_id)
        .await
        .map_err(port_error_response)?;
    let body: Vec<PostResponse> = posts.into_iter().map(PostResponse::from).collect();
    Ok(Json(body))
}

/// Fetch one generated post by id. Other accounts' posts read as absent.
#[utoipa::path(
    get,
    path = "/posts/{id}",
    params(
        ("id" = Uuid, Path, description = "The generated post id")
    ),
    responses(
        (status = 200, description = "The generated post", body = PostResponse),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "No such post for this account"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_post_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let post = state
        .db
        .get_generated_post(user_id, id)
        .await
        .map_err(port_error_response)?;
    Ok(Json(PostResponse::from(post)))
}
