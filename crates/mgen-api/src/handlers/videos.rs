//! Video API handlers.

use axum::body::Body;
use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{info, warn};
use validator::Validate;

use mgen_models::{Page, VideoId, VideoRecord, VideoStatus, VideoUpdate};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Serialize)]
pub struct VideoListResponse {
    pub videos: Vec<VideoRecord>,
    pub total: usize,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PromptRequest {
    #[validate(length(min = 1, max = 4000, message = "must be 1 to 4000 characters"))]
    pub prompt: String,
}

/// Acknowledgement for a queued or finished generation.
#[derive(Serialize)]
pub struct GenerationResponse {
    pub message: String,
    pub video_id: String,
    pub status: VideoStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

#[derive(Serialize)]
pub struct CodeResponse {
    pub code: String,
}

fn file_url(id: &VideoId) -> String {
    format!("/api/videos/{}/file", id)
}

/// Fetch a record and check the caller owns it.
async fn owned_record(state: &AppState, user: &AuthUser, video_id: &str) -> ApiResult<VideoRecord> {
    let record = state
        .videos
        .find_by_id(&VideoId::from(video_id))
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    if !record.is_owned_by(&user.uid) {
        return Err(ApiError::forbidden("You don't have permission to access this video"));
    }
    Ok(record)
}

async fn require_account(state: &AppState, user: &AuthUser) -> ApiResult<()> {
    state
        .accounts
        .find_by_id(&user.uid)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// List the caller's videos, newest first.
pub async fn list_videos(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<VideoListResponse>> {
    let page = Page::new(query.page.unwrap_or(1), query.per_page.unwrap_or(10));
    let listing = state.videos.find_by_owner(&user.uid, page).await?;

    Ok(Json(VideoListResponse {
        videos: listing.items,
        total: listing.total,
        page: listing.page.page,
        per_page: listing.page.per_page,
    }))
}

/// Queue a generation and return immediately.
pub async fn create_video(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<PromptRequest>,
) -> ApiResult<(StatusCode, Json<GenerationResponse>)> {
    request.validate()?;
    require_account(&state, &user).await?;

    let record = state.processor.submit(&user.uid, &request.prompt).await?;
    info!(video_id = %record.id, user_id = %user.uid, "Queued video generation");

    Ok((
        StatusCode::ACCEPTED,
        Json(GenerationResponse {
            message: "Video generation request submitted".to_string(),
            video_id: record.id.to_string(),
            status: record.status,
            video_url: None,
        }),
    ))
}

/// Run a generation to completion within the request.
pub async fn generate_video(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<PromptRequest>,
) -> ApiResult<Json<GenerationResponse>> {
    request.validate()?;
    require_account(&state, &user).await?;

    let record = state.processor.generate_now(&user.uid, &request.prompt).await?;

    Ok(Json(GenerationResponse {
        message: "Video generated successfully".to_string(),
        video_url: Some(file_url(&record.id)),
        video_id: record.id.to_string(),
        status: record.status,
    }))
}

/// Get one video record.
pub async fn get_video(
    State(state): State<AppState>,
    user: AuthUser,
    Path(video_id): Path<String>,
) -> ApiResult<Json<VideoRecord>> {
    Ok(Json(owned_record(&state, &user, &video_id).await?))
}

/// Scene script that produced (or last attempted) the video.
pub async fn get_video_code(
    State(state): State<AppState>,
    user: AuthUser,
    Path(video_id): Path<String>,
) -> ApiResult<Json<CodeResponse>> {
    let record = owned_record(&state, &user, &video_id).await?;
    let code = record
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::not_found("Code not available for this video"))?;
    Ok(Json(CodeResponse { code }))
}

/// Deliver the rendered video.
///
/// Redirects to the blob URL when one is recorded. Otherwise the artifact is
/// located on disk, uploaded just in time, and served directly if the upload
/// is not possible.
pub async fn get_video_file(
    State(state): State<AppState>,
    user: AuthUser,
    Path(video_id): Path<String>,
    request: Request,
) -> ApiResult<Response> {
    let record = owned_record(&state, &user, &video_id).await?;

    if let Some(url) = record.blob_url.as_deref() {
        return Ok(Redirect::temporary(url).into_response());
    }

    let path = state
        .processor
        .locate_artifact(&record)
        .await
        .ok_or_else(|| ApiError::not_found("Video file not found"))?;

    let located = path.to_string_lossy().to_string();
    if record.video_path.as_deref() != Some(located.as_str()) {
        if let Err(e) = state
            .videos
            .update(&record.id, VideoUpdate::default().with_video_path(&located))
            .await
        {
            warn!(video_id = %record.id, "Failed to record located path: {}", e);
        }
    }

    if let Some(url) = state.processor.upload_artifact(&record, &path).await {
        return Ok(Redirect::temporary(&url).into_response());
    }

    info!(video_id = %record.id, path = %located, "Serving video from local disk");
    let response = ServeFile::new(&path)
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {});
    Ok(response.map(Body::new))
}
