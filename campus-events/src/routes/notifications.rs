use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use campus_shared::errors::AppResult;
use campus_shared::types::api::ApiResponse;
use campus_shared::types::auth::RequestContext;
use campus_shared::types::pagination::{Paginated, PaginationParams};

use crate::models::Notification;
use crate::services::notification_service;
use crate::AppState;

/// GET /notifications
/// List notifications for the caller, newest first.
pub async fn list_notifications(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<Notification>>>> {
    let page = notification_service::list_notifications(&state, ctx.user_id, &params)?;
    Ok(Json(ApiResponse::ok(page)))
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

/// GET /notifications/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> AppResult<Json<ApiResponse<UnreadCountResponse>>> {
    let count = notification_service::count_unread(&state, ctx.user_id)?;
    Ok(Json(ApiResponse::ok(UnreadCountResponse { count })))
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub updated: usize,
}

/// POST /notifications/mark-all-read
pub async fn mark_all_read(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> AppResult<Json<ApiResponse<MarkAllReadResponse>>> {
    let updated = notification_service::mark_all_read(&state, ctx.user_id)?;
    Ok(Json(ApiResponse::ok(MarkAllReadResponse { updated })))
}

/// POST /notifications/:id/read
pub async fn mark_read(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Notification>>> {
    let notification = notification_service::mark_read(&state, id, ctx.user_id)?;
    Ok(Json(ApiResponse::ok(notification)))
}
