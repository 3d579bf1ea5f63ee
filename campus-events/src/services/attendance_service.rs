use serde::{Deserialize, Serialize};
use uuid::Uuid;

use campus_shared::errors::{AppError, AppResult, ErrorCode};
use campus_shared::types::auth::RequestContext;
use campus_shared::types::event::{ChangeEvent, Table};

use crate::models::{Certificate, Participation};
use crate::services::certificate_service::{self, IssueOutcome};
use crate::services::{notification_service, Warnings};
use crate::AppState;

/// Staff request to flip a participation's presence flag.
#[derive(Debug, Clone, Deserialize)]
pub struct PresenceToggle {
    pub participation_id: Uuid,
    /// Presence as the caller last saw it; the new value is its negation.
    pub current_presence: bool,
    /// Participant the caller believes the row belongs to.
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CertificateOutcome {
    Generated { count: usize, certificate: Certificate },
    AlreadyExisted,
    Revoked { count: usize },
    /// Walk-in participant with no linked account.
    NotApplicable,
    Failed,
}

#[derive(Debug)]
pub struct PresenceToggleOutcome {
    pub participation: Participation,
    pub certificate: CertificateOutcome,
    pub warnings: Warnings,
}

/// Flip presence and keep certificates in line with it.
///
/// Only the presence update can fail the call. Certificate issue/revocation
/// and notifications run afterwards and report failures as warnings.
pub async fn toggle_presence(
    state: &AppState,
    ctx: &RequestContext,
    input: PresenceToggle,
) -> AppResult<PresenceToggleOutcome> {
    if !ctx.is_staff() {
        return Err(AppError::new(ErrorCode::Forbidden, "professor or admin access required"));
    }

    let participation = state
        .store
        .find_participation(input.participation_id)?
        .ok_or_else(|| AppError::new(ErrorCode::ParticipationNotFound, "participation not found"))?;

    if let Some(requested) = input.user_id {
        if participation.user_id != Some(requested) {
            return Err(AppError::new(
                ErrorCode::ParticipantMismatch,
                "user does not match the participation's participant",
            ));
        }
    }

    let present = !input.current_presence;
    let participation = state.store.set_presence(participation.id, present)?;

    state.feed.publish(
        ChangeEvent::update(Table::Participations, participation.id).with_user(participation.user_id),
    );
    tracing::info!(
        participation_id = %participation.id,
        activity_id = %participation.activity_id,
        present,
        marked_by = %ctx.user_id,
        "presence updated"
    );

    let mut warnings = Warnings::new();

    let Some(user_id) = participation.user_id else {
        return Ok(PresenceToggleOutcome {
            participation,
            certificate: CertificateOutcome::NotApplicable,
            warnings,
        });
    };

    let certificate = if present {
        confirm(state, &participation, user_id, &mut warnings).await
    } else {
        revoke(state, &participation, user_id, &mut warnings)
    };

    Ok(PresenceToggleOutcome {
        participation,
        certificate,
        warnings,
    })
}

async fn confirm(
    state: &AppState,
    participation: &Participation,
    user_id: Uuid,
    warnings: &mut Warnings,
) -> CertificateOutcome {
    let issued = warnings.capture(
        "certificate_issue",
        "error generating certificate",
        state
            .store
            .find_activity(participation.activity_id)
            .and_then(|a| a.ok_or_else(|| AppError::new(ErrorCode::ActivityNotFound, "activity not found")))
            .and_then(|activity| {
                certificate_service::issue_for_participant(state, &activity, user_id).map(|o| (activity, o))
            }),
    );

    match issued {
        Some((activity, IssueOutcome::Issued(certificate))) => {
            let user = warnings
                .capture("notification", "could not load participant", state.store.find_user(user_id))
                .flatten();
            if let Some(user) = user {
                warnings.extend(
                    notification_service::notify_certificate_issued(state, &user, &activity, &certificate).await,
                );
            }
            CertificateOutcome::Generated { count: 1, certificate }
        }
        Some((_, IssueOutcome::AlreadyExisted(_))) => CertificateOutcome::AlreadyExisted,
        None => CertificateOutcome::Failed,
    }
}

fn revoke(
    state: &AppState,
    participation: &Participation,
    user_id: Uuid,
    warnings: &mut Warnings,
) -> CertificateOutcome {
    let removed = warnings.capture(
        "certificate_revoke",
        "error removing certificate",
        certificate_service::revoke_for_participant(state, user_id, participation.activity_id),
    );

    match removed {
        Some(ids) => {
            if !ids.is_empty() {
                let activity = match state.store.find_activity(participation.activity_id) {
                    Ok(activity) => activity,
                    Err(e) => {
                        tracing::warn!(
                            activity_id = %participation.activity_id,
                            error = %e,
                            "activity lookup failed; sending generic withdrawal notice"
                        );
                        None
                    }
                };
                warnings.extend(notification_service::notify_certificate_withdrawn(state, user_id, activity.as_ref()));
            }
            CertificateOutcome::Revoked { count: ids.len() }
        }
        None => CertificateOutcome::Failed,
    }
}
