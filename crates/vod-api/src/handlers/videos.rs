//! Video API handlers.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use vod_models::{ListFilter, ListPayload, Pagination, VideoId};

use crate::error::{ApiError, ApiResult};
use crate::service::VideoDto;
use crate::state::AppState;

/// `POST /api/video` — multipart upload. The first field carrying a filename
/// is taken as the video; everything else is ignored.
pub async fn upload_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<VideoDto>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(e.to_string()))?;
        if data.is_empty() {
            return Err(ApiError::bad_request("uploaded file is empty"));
        }

        let video = state.service.save_upload(&filename, &data).await?;
        return Ok((StatusCode::CREATED, Json(state.service.to_dto(video))));
    }

    Err(ApiError::bad_request("multipart body carries no file field"))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    pub status: Option<String>,
}

/// `GET /api/video` — reverse-chronological listing.
pub async fn list_videos(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ListPayload<VideoDto>>> {
    let filter = ListFilter::parse(query.status.as_deref().unwrap_or_default())
        .ok_or_else(|| ApiError::bad_request("status must be one of: all, active, archived"))?;
    let pagination = Pagination {
        limit: query.limit,
        offset: query.offset,
    };

    let page = state.service.list(pagination, filter).await?;
    Ok(Json(ListPayload {
        total_count: page.total_count,
        data: page
            .data
            .into_iter()
            .map(|v| state.service.to_dto(v))
            .collect(),
    }))
}

/// `GET /api/video/:id`
pub async fn get_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<VideoDto>> {
    let video = state.service.get(&VideoId::from(id)).await?;
    Ok(Json(state.service.to_dto(video)))
}

#[derive(Debug, Deserialize)]
pub struct RenamePayload {
    pub filename: String,
}

/// `PATCH /api/video/:id` — update the display filename.
pub async fn rename_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<RenamePayload>,
) -> ApiResult<Json<VideoDto>> {
    let video = state
        .service
        .rename(&VideoId::from(id), &payload.filename)
        .await?;
    Ok(Json(state.service.to_dto(video)))
}

/// `DELETE /api/video/:id` — archive. Terminal; repeated calls conflict.
pub async fn archive_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.service.archive(&VideoId::from(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
