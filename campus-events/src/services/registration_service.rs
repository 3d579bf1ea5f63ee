use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use campus_shared::errors::{AppError, AppResult, ErrorCode};
use campus_shared::types::auth::RequestContext;
use campus_shared::types::event::{ChangeEvent, Table};

use crate::models::{
    Activity, Event, NewParticipation, NewPublicRegistration, NewRegistration, Participation,
    PublicRegistration, Registration,
};
use crate::services::{notification_service, Warnings};
use crate::AppState;

fn load_event(state: &AppState, event_id: Uuid) -> AppResult<Event> {
    state
        .store
        .find_event(event_id)?
        .ok_or_else(|| AppError::new(ErrorCode::EventNotFound, "event not found"))
}

fn load_activity(state: &AppState, activity_id: Uuid) -> AppResult<Activity> {
    state
        .store
        .find_activity(activity_id)?
        .ok_or_else(|| AppError::new(ErrorCode::ActivityNotFound, "activity not found"))
}

/// Register the caller for an event and send the confirmation.
pub async fn register_for_event(
    state: &AppState,
    ctx: &RequestContext,
    event_id: Uuid,
) -> AppResult<(Registration, Warnings)> {
    let event = load_event(state, event_id)?;

    if state.store.find_registration(event.id, ctx.user_id)?.is_some() {
        return Err(AppError::new(ErrorCode::AlreadyRegistered, "already registered for this event"));
    }

    let registration = state.store.insert_registration(NewRegistration {
        event_id: event.id,
        user_id: ctx.user_id,
    })?;
    state.feed.publish(
        ChangeEvent::insert(Table::Registrations, registration.id).with_user(Some(ctx.user_id)),
    );
    tracing::info!(event_id = %event.id, user_id = %ctx.user_id, "registered for event");

    let mut warnings = Warnings::new();
    match state.store.find_user(ctx.user_id) {
        Ok(Some(user)) => warnings.extend(notification_service::notify_registration(state, &user, &event).await),
        Ok(None) => tracing::debug!(user_id = %ctx.user_id, "no local profile, skipping confirmation"),
        Err(e) => {
            warnings.capture::<(), _>("notification", "could not send registration confirmation", Err(e));
        }
    }

    Ok((registration, warnings))
}

/// Enrol the caller in an activity with presence unset.
pub fn enroll_in_activity(state: &AppState, ctx: &RequestContext, activity_id: Uuid) -> AppResult<Participation> {
    let activity = load_activity(state, activity_id)?;

    if state.store.find_user_participation(activity.id, ctx.user_id)?.is_some() {
        return Err(AppError::new(ErrorCode::AlreadyEnrolled, "already enrolled in this activity"));
    }

    let participation = state.store.insert_participation(NewParticipation {
        activity_id: activity.id,
        user_id: Some(ctx.user_id),
        public_registration_id: None,
        present: false,
    })?;
    state.feed.publish(
        ChangeEvent::insert(Table::Participations, participation.id).with_user(Some(ctx.user_id)),
    );
    tracing::info!(activity_id = %activity.id, user_id = %ctx.user_id, "enrolled in activity");

    Ok(participation)
}

#[derive(Debug, Deserialize, Validate)]
pub struct PublicRegistrationRequest {
    #[validate(length(min = 2, max = 120, message = "full name must be 2-120 characters"))]
    pub full_name: String,
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    /// Walk-ins may sign up for a single activity on the spot.
    pub activity_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct PublicRegistrationResult {
    pub registration: PublicRegistration,
    pub participation: Option<Participation>,
}

/// Walk-in registration without an account. Counted in statistics, never
/// certified.
pub fn register_public(
    state: &AppState,
    event_id: Uuid,
    mut req: PublicRegistrationRequest,
) -> AppResult<PublicRegistrationResult> {
    req.full_name = req.full_name.trim().to_string();
    req.email = req.email.trim().to_lowercase();
    req.validate()?;
    let event = load_event(state, event_id)?;

    let activity = match req.activity_id {
        Some(id) => {
            let activity = load_activity(state, id)?;
            if activity.event_id != event.id {
                return Err(AppError::bad_request("activity does not belong to this event"));
            }
            Some(activity)
        }
        None => None,
    };

    let registration = state.store.insert_public_registration(NewPublicRegistration {
        event_id: event.id,
        full_name: req.full_name,
        email: req.email,
    })?;
    state.feed.publish(ChangeEvent::insert(Table::PublicRegistrations, registration.id));

    let participation = match activity {
        Some(activity) => {
            let participation = state.store.insert_participation(NewParticipation {
                activity_id: activity.id,
                user_id: None,
                public_registration_id: Some(registration.id),
                present: false,
            })?;
            state.feed.publish(ChangeEvent::insert(Table::Participations, participation.id));
            Some(participation)
        }
        None => None,
    };

    tracing::info!(event_id = %event.id, registration_id = %registration.id, "walk-in registered");

    Ok(PublicRegistrationResult {
        registration,
        participation,
    })
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct ActivityStats {
    pub enrolled: usize,
    pub present: usize,
    /// Present walk-ins, included in `present`.
    pub present_guests: usize,
    pub certificates_issued: i64,
}

pub fn activity_stats(state: &AppState, activity_id: Uuid) -> AppResult<ActivityStats> {
    let activity = load_activity(state, activity_id)?;
    let participations = state.store.list_participations(activity.id)?;

    let mut stats = ActivityStats {
        enrolled: participations.len(),
        certificates_issued: state.store.count_activity_certificates(activity.id)?,
        ..Default::default()
    };
    for p in participations.iter().filter(|p| p.present) {
        stats.present += 1;
        if p.user_id.is_none() {
            stats.present_guests += 1;
        }
    }

    Ok(stats)
}

#[derive(Debug, Deserialize, Validate)]
pub struct FeedbackRequest {
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: Option<i16>,
    #[validate(length(max = 2000, message = "feedback must be at most 2000 characters"))]
    pub feedback: Option<String>,
}

/// Rating and comment on the caller's own participation.
pub fn submit_feedback(
    state: &AppState,
    ctx: &RequestContext,
    participation_id: Uuid,
    mut req: FeedbackRequest,
) -> AppResult<Participation> {
    req.feedback = req.feedback.map(|f| f.trim().to_string()).filter(|f| !f.is_empty());
    req.validate()?;

    let participation = state
        .store
        .find_participation(participation_id)?
        .ok_or_else(|| AppError::new(ErrorCode::ParticipationNotFound, "participation not found"))?;

    if participation.user_id != Some(ctx.user_id) {
        return Err(AppError::new(
            ErrorCode::NotParticipationOwner,
            "feedback can only be given on your own participation",
        ));
    }

    let participation = state.store.set_feedback(participation.id, req.rating, req.feedback)?;
    state.feed.publish(
        ChangeEvent::update(Table::Participations, participation.id).with_user(Some(ctx.user_id)),
    );

    Ok(participation)
}
