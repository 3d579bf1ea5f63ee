use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use campus_shared::errors::AppResult;
use campus_shared::middleware::StaffContext;
use campus_shared::types::api::ApiResponse;
use campus_shared::types::pagination::{Paginated, PaginationParams};

use crate::models::{Activity, Event};
use crate::services::event_service::{self, CreateActivityRequest, CreateEventRequest, EventDetails};
use crate::AppState;

/// GET /events
pub async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<Event>>>> {
    Ok(Json(ApiResponse::ok(event_service::list_events(&state, &params)?)))
}

/// GET /events/:id
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<EventDetails>>> {
    Ok(Json(ApiResponse::ok(event_service::get_event(&state, id)?)))
}

/// POST /events
pub async fn create_event(
    State(state): State<AppState>,
    StaffContext(ctx): StaffContext,
    Json(req): Json<CreateEventRequest>,
) -> AppResult<Json<ApiResponse<Event>>> {
    let event = event_service::create_event(&state, &ctx, req)?;
    Ok(Json(ApiResponse::ok_with_message(event, "event created")))
}

/// POST /events/:id/activities
pub async fn create_activity(
    State(state): State<AppState>,
    StaffContext(ctx): StaffContext,
    Path(event_id): Path<Uuid>,
    Json(req): Json<CreateActivityRequest>,
) -> AppResult<Json<ApiResponse<Activity>>> {
    let activity = event_service::create_activity(&state, &ctx, event_id, req)?;
    Ok(Json(ApiResponse::ok_with_message(activity, "activity created")))
}
