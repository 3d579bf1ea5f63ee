use uuid::Uuid;

use campus_shared::errors::{AppError, AppResult, ErrorCode};
use campus_shared::types::event::{ChangeEvent, Table};
use campus_shared::types::pagination::{Paginated, PaginationParams};

use crate::models::{Activity, Certificate, Event, NewNotification, Notification, User};
use crate::services::Warnings;
use crate::AppState;

/// Insert an in-app notification and announce it on the change feed.
pub fn create_notification(
    state: &AppState,
    user_id: Uuid,
    title: &str,
    message: &str,
    link: Option<String>,
) -> AppResult<Notification> {
    let notification = state.store.insert_notification(NewNotification {
        user_id,
        title: title.to_string(),
        message: message.to_string(),
        link,
    })?;

    state.feed.publish(
        ChangeEvent::insert(Table::Notifications, notification.id).with_user(Some(user_id)),
    );

    tracing::debug!(
        notification_id = %notification.id,
        user_id = %user_id,
        "notification created"
    );

    Ok(notification)
}

/// List notifications for a user, newest first.
pub fn list_notifications(
    state: &AppState,
    user_id: Uuid,
    params: &PaginationParams,
) -> AppResult<Paginated<Notification>> {
    let (limit, offset) = params.sql_bounds();
    let (items, total) = state.store.list_notifications(user_id, limit, offset)?;
    Ok(Paginated::new(items, total as u64, params))
}

pub fn count_unread(state: &AppState, user_id: Uuid) -> AppResult<i64> {
    state.store.count_unread(user_id)
}

/// Mark a single notification as read (only if it belongs to the user).
pub fn mark_read(state: &AppState, notification_id: Uuid, user_id: Uuid) -> AppResult<Notification> {
    let notification = state
        .store
        .mark_read(notification_id, user_id)?
        .ok_or_else(|| AppError::new(ErrorCode::NotificationNotFound, "notification not found"))?;

    state.feed.publish(
        ChangeEvent::update(Table::Notifications, notification.id).with_user(Some(user_id)),
    );
    Ok(notification)
}

pub fn mark_all_read(state: &AppState, user_id: Uuid) -> AppResult<usize> {
    state.store.mark_all_read(user_id)
}

// --- Best-effort dispatch: in-app row + e-mail ---

pub async fn notify_certificate_issued(
    state: &AppState,
    user: &User,
    activity: &Activity,
    certificate: &Certificate,
) -> Warnings {
    let mut warnings = Warnings::new();
    let link = state.config.verification_url(&certificate.verification_code);

    warnings.capture(
        "notification",
        "could not create certificate notification",
        create_notification(
            state,
            user.id,
            "Certificate available",
            &format!("Your attendance at \"{}\" was confirmed. Your certificate is ready.", activity.title),
            Some(link.clone()),
        ),
    );

    if let Some(email) = user.email.as_deref() {
        warnings.capture(
            "email",
            "could not send certificate e-mail",
            state
                .mailer
                .send_certificate_issued(email, &user.full_name, &activity.title, &link)
                .await,
        );
    }

    warnings
}

/// In-app only; nothing is mailed when a certificate is withdrawn.
pub fn notify_certificate_withdrawn(state: &AppState, user_id: Uuid, activity: Option<&Activity>) -> Warnings {
    let mut warnings = Warnings::new();
    let message = match activity {
        Some(a) => format!("Your attendance at \"{}\" was removed and its certificate withdrawn.", a.title),
        None => "An attendance record was removed and its certificate withdrawn.".to_string(),
    };

    warnings.capture(
        "notification",
        "could not create withdrawal notification",
        create_notification(state, user_id, "Certificate withdrawn", &message, None),
    );
    warnings
}

pub async fn notify_registration(state: &AppState, user: &User, event: &Event) -> Warnings {
    let mut warnings = Warnings::new();

    warnings.capture(
        "notification",
        "could not create registration notification",
        create_notification(
            state,
            user.id,
            "Registration confirmed",
            &format!("You are registered for \"{}\".", event.title),
            Some(format!("{}/events/{}", state.config.public_base_url.trim_end_matches('/'), event.id)),
        ),
    );

    if let Some(email) = user.email.as_deref() {
        warnings.capture(
            "email",
            "could not send registration e-mail",
            state
                .mailer
                .send_registration_confirmation(email, &user.full_name, &event.title, event.starts_at)
                .await,
        );
    }

    warnings
}
