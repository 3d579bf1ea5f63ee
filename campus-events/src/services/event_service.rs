use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use campus_shared::errors::{AppError, AppResult, ErrorCode};
use campus_shared::types::auth::RequestContext;
use campus_shared::types::event::{ChangeEvent, Table};
use campus_shared::types::pagination::{Paginated, PaginationParams};

use crate::models::{Activity, Event, NewActivity, NewEvent};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_event_window"))]
pub struct CreateEventRequest {
    #[validate(length(min = 3, max = 200, message = "title must be 3-200 characters"))]
    pub title: String,
    pub description: Option<String>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[validate(range(min = 0, max = 1000, message = "hours must be between 0 and 1000"))]
    pub hours: i32,
}

fn validate_event_window(req: &CreateEventRequest) -> Result<(), ValidationError> {
    ends_after_start(req.starts_at, req.ends_at)
}

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_activity_window"))]
pub struct CreateActivityRequest {
    #[validate(length(min = 3, max = 200, message = "title must be 3-200 characters"))]
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[validate(range(min = 0, max = 1000, message = "hours must be between 0 and 1000"))]
    pub hours: i32,
    /// Label printed on certificates, e.g. "speaker". Defaults to participation.
    #[validate(length(min = 1, max = 50))]
    pub certificate_type: Option<String>,
}

fn validate_activity_window(req: &CreateActivityRequest) -> Result<(), ValidationError> {
    ends_after_start(req.starts_at, req.ends_at)
}

fn ends_after_start(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Result<(), ValidationError> {
    if ends_at < starts_at {
        let mut err = ValidationError::new("time_window");
        err.message = Some("ends_at must not be before starts_at".into());
        return Err(err);
    }
    Ok(())
}

pub fn create_event(state: &AppState, ctx: &RequestContext, mut req: CreateEventRequest) -> AppResult<Event> {
    if !ctx.is_staff() {
        return Err(AppError::new(ErrorCode::Forbidden, "professor or admin access required"));
    }
    req.title = req.title.trim().to_string();
    req.validate()?;

    let event = state.store.insert_event(NewEvent {
        title: req.title,
        description: req.description,
        location: req.location,
        starts_at: req.starts_at,
        ends_at: req.ends_at,
        hours: req.hours,
        created_by: ctx.user_id,
    })?;

    state.feed.publish(ChangeEvent::insert(Table::Events, event.id).with_user(Some(ctx.user_id)));
    tracing::info!(event_id = %event.id, created_by = %ctx.user_id, "event created");

    Ok(event)
}

pub fn create_activity(
    state: &AppState,
    ctx: &RequestContext,
    event_id: Uuid,
    mut req: CreateActivityRequest,
) -> AppResult<Activity> {
    if !ctx.is_staff() {
        return Err(AppError::new(ErrorCode::Forbidden, "professor or admin access required"));
    }
    req.title = req.title.trim().to_string();
    req.validate()?;

    let event = state
        .store
        .find_event(event_id)?
        .ok_or_else(|| AppError::new(ErrorCode::EventNotFound, "event not found"))?;

    let activity = state.store.insert_activity(NewActivity {
        event_id: event.id,
        title: req.title,
        starts_at: req.starts_at,
        ends_at: req.ends_at,
        hours: req.hours,
        certificate_type: req.certificate_type,
    })?;

    state.feed.publish(ChangeEvent::insert(Table::Activities, activity.id));
    tracing::info!(event_id = %event.id, activity_id = %activity.id, "activity created");

    Ok(activity)
}

pub fn list_events(state: &AppState, params: &PaginationParams) -> AppResult<Paginated<Event>> {
    let (limit, offset) = params.sql_bounds();
    let (items, total) = state.store.list_events(limit, offset)?;
    Ok(Paginated::new(items, total as u64, params))
}

#[derive(Debug, Serialize)]
pub struct EventDetails {
    #[serde(flatten)]
    pub event: Event,
    pub activities: Vec<Activity>,
}

pub fn get_event(state: &AppState, event_id: Uuid) -> AppResult<EventDetails> {
    let event = state
        .store
        .find_event(event_id)?
        .ok_or_else(|| AppError::new(ErrorCode::EventNotFound, "event not found"))?;
    let activities = state.store.list_activities(event.id)?;

    Ok(EventDetails { event, activities })
}
