use chrono::{Days, NaiveDate, NaiveTime};
use metrics::counter;
use serde::Serialize;

use campus_shared::errors::{AppError, AppResult};

use crate::models::{Event, User};
use crate::services::{notification_service, Warnings};
use crate::AppState;

#[derive(Debug, Clone, Copy)]
pub struct ReminderRule {
    pub days_before: u64,
    pub headline: &'static str,
}

pub const REMINDER_RULES: [ReminderRule; 4] = [
    ReminderRule { days_before: 7, headline: "starts in one week" },
    ReminderRule { days_before: 3, headline: "starts in 3 days" },
    ReminderRule { days_before: 1, headline: "starts tomorrow" },
    ReminderRule { days_before: 0, headline: "starts today" },
];

#[derive(Debug, Serialize)]
pub struct OffsetReport {
    pub days_before: u64,
    pub events: usize,
    pub reminders_sent: usize,
}

#[derive(Debug, Serialize)]
pub struct ReminderReport {
    pub reference_date: NaiveDate,
    pub offsets: Vec<OffsetReport>,
    pub failures: usize,
}

impl ReminderReport {
    pub fn total_sent(&self) -> usize {
        self.offsets.iter().map(|o| o.reminders_sent).sum()
    }
}

/// Remind every registered user of events starting `days_before` days after
/// `reference` (UTC calendar days), for each rule in [`REMINDER_RULES`].
pub async fn run_reminders(state: &AppState, reference: NaiveDate) -> AppResult<(ReminderReport, Warnings)> {
    let mut warnings = Warnings::new();
    let mut report = ReminderReport {
        reference_date: reference,
        offsets: Vec::with_capacity(REMINDER_RULES.len()),
        failures: 0,
    };

    for rule in REMINDER_RULES {
        let day = reference
            .checked_add_days(Days::new(rule.days_before))
            .ok_or_else(|| AppError::bad_request("reference date out of range"))?;
        let from = day.and_time(NaiveTime::MIN).and_utc();
        let to = from
            .checked_add_signed(chrono::Duration::days(1))
            .ok_or_else(|| AppError::bad_request("reference date out of range"))?;

        let events = state.store.events_starting_between(from, to)?;
        let mut sent = 0;

        for event in &events {
            for user in state.store.registered_users(event.id)? {
                let outcome = remind(state, &user, event, rule).await;
                if outcome.delivered {
                    sent += 1;
                }
                report.failures += outcome.failures;
                warnings.extend(outcome.warnings);
            }
        }

        counter!("reminders_sent_total", "days_before" => rule.days_before.to_string()).increment(sent as u64);
        report.offsets.push(OffsetReport {
            days_before: rule.days_before,
            events: events.len(),
            reminders_sent: sent,
        });
    }

    tracing::info!(
        reference = %reference,
        sent = report.total_sent(),
        failures = report.failures,
        "reminder run finished"
    );

    Ok((report, warnings))
}

struct ReminderOutcome {
    delivered: bool,
    failures: usize,
    warnings: Warnings,
}

async fn remind(state: &AppState, user: &User, event: &Event, rule: ReminderRule) -> ReminderOutcome {
    let mut warnings = Warnings::new();
    let mut failures = 0;

    let in_app = warnings.capture(
        "notification",
        "could not create reminder notification",
        notification_service::create_notification(
            state,
            user.id,
            &format!("Reminder: {}", event.title),
            &format!("\"{}\" {}.", event.title, rule.headline),
            Some(format!("{}/events/{}", state.config.public_base_url.trim_end_matches('/'), event.id)),
        ),
    );
    if in_app.is_none() {
        failures += 1;
    }

    let mut emailed = false;
    if let Some(email) = user.email.as_deref() {
        let result = state
            .mailer
            .send_event_reminder(
                email,
                &user.full_name,
                rule.headline,
                &event.title,
                event.starts_at,
                event.location.as_deref(),
            )
            .await;
        match warnings.capture("email", "could not send reminder e-mail", result) {
            Some(()) => emailed = true,
            None => failures += 1,
        }
    }

    ReminderOutcome {
        delivered: in_app.is_some() || emailed,
        failures,
        warnings,
    }
}
