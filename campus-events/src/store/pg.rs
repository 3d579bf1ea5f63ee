use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use campus_shared::clients::db::{checkout, DbPool};
use campus_shared::errors::AppResult;

use crate::models::{
    Activity, Certificate, Event, NewActivity, NewCertificate, NewEvent, NewNotification,
    NewParticipation, NewPublicRegistration, NewRegistration, Notification, Participation,
    PublicRegistration, Registration, User,
};
use crate::schema::{
    activities, certificates, events, notifications, participations, public_registrations,
    registrations, users,
};

use super::Store;

/// PostgreSQL-backed store over an r2d2 pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl Store for PgStore {
    fn ping(&self) -> AppResult<()> {
        let mut conn = checkout(&self.pool)?;
        diesel::sql_query("SELECT 1").execute(&mut conn)?;
        Ok(())
    }

    fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let mut conn = checkout(&self.pool)?;
        Ok(users::table
            .find(id)
            .select(User::as_select())
            .first(&mut conn)
            .optional()?)
    }

    fn insert_event(&self, new: NewEvent) -> AppResult<Event> {
        let mut conn = checkout(&self.pool)?;
        Ok(diesel::insert_into(events::table)
            .values(&new)
            .returning(Event::as_returning())
            .get_result(&mut conn)?)
    }

    fn find_event(&self, id: Uuid) -> AppResult<Option<Event>> {
        let mut conn = checkout(&self.pool)?;
        Ok(events::table
            .find(id)
            .select(Event::as_select())
            .first(&mut conn)
            .optional()?)
    }

    fn list_events(&self, limit: i64, offset: i64) -> AppResult<(Vec<Event>, i64)> {
        let mut conn = checkout(&self.pool)?;

        let total: i64 = events::table.count().get_result(&mut conn)?;
        let items = events::table
            .order(events::starts_at.asc())
            .limit(limit)
            .offset(offset)
            .select(Event::as_select())
            .load(&mut conn)?;

        Ok((items, total))
    }

    fn events_starting_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> AppResult<Vec<Event>> {
        let mut conn = checkout(&self.pool)?;
        Ok(events::table
            .filter(events::starts_at.ge(from))
            .filter(events::starts_at.lt(to))
            .order(events::starts_at.asc())
            .select(Event::as_select())
            .load(&mut conn)?)
    }

    fn insert_activity(&self, new: NewActivity) -> AppResult<Activity> {
        let mut conn = checkout(&self.pool)?;
        Ok(diesel::insert_into(activities::table)
            .values(&new)
            .returning(Activity::as_returning())
            .get_result(&mut conn)?)
    }

    fn find_activity(&self, id: Uuid) -> AppResult<Option<Activity>> {
        let mut conn = checkout(&self.pool)?;
        Ok(activities::table
            .find(id)
            .select(Activity::as_select())
            .first(&mut conn)
            .optional()?)
    }

    fn list_activities(&self, event_id: Uuid) -> AppResult<Vec<Activity>> {
        let mut conn = checkout(&self.pool)?;
        Ok(activities::table
            .filter(activities::event_id.eq(event_id))
            .order(activities::starts_at.asc())
            .select(Activity::as_select())
            .load(&mut conn)?)
    }

    fn find_registration(&self, event_id: Uuid, user_id: Uuid) -> AppResult<Option<Registration>> {
        let mut conn = checkout(&self.pool)?;
        Ok(registrations::table
            .filter(registrations::event_id.eq(event_id))
            .filter(registrations::user_id.eq(user_id))
            .select(Registration::as_select())
            .first(&mut conn)
            .optional()?)
    }

    fn insert_registration(&self, new: NewRegistration) -> AppResult<Registration> {
        let mut conn = checkout(&self.pool)?;
        Ok(diesel::insert_into(registrations::table)
            .values(&new)
            .returning(Registration::as_returning())
            .get_result(&mut conn)?)
    }

    fn registered_users(&self, event_id: Uuid) -> AppResult<Vec<User>> {
        let mut conn = checkout(&self.pool)?;
        Ok(registrations::table
            .inner_join(users::table)
            .filter(registrations::event_id.eq(event_id))
            .select(User::as_select())
            .load(&mut conn)?)
    }

    fn insert_public_registration(&self, new: NewPublicRegistration) -> AppResult<PublicRegistration> {
        let mut conn = checkout(&self.pool)?;
        Ok(diesel::insert_into(public_registrations::table)
            .values(&new)
            .returning(PublicRegistration::as_returning())
            .get_result(&mut conn)?)
    }

    fn find_participation(&self, id: Uuid) -> AppResult<Option<Participation>> {
        let mut conn = checkout(&self.pool)?;
        Ok(participations::table
            .find(id)
            .select(Participation::as_select())
            .first(&mut conn)
            .optional()?)
    }

    fn find_user_participation(&self, activity_id: Uuid, user_id: Uuid) -> AppResult<Option<Participation>> {
        let mut conn = checkout(&self.pool)?;
        Ok(participations::table
            .filter(participations::activity_id.eq(activity_id))
            .filter(participations::user_id.eq(user_id))
            .select(Participation::as_select())
            .first(&mut conn)
            .optional()?)
    }

    fn list_participations(&self, activity_id: Uuid) -> AppResult<Vec<Participation>> {
        let mut conn = checkout(&self.pool)?;
        Ok(participations::table
            .filter(participations::activity_id.eq(activity_id))
            .order(participations::created_at.asc())
            .select(Participation::as_select())
            .load(&mut conn)?)
    }

    fn insert_participation(&self, new: NewParticipation) -> AppResult<Participation> {
        let mut conn = checkout(&self.pool)?;
        Ok(diesel::insert_into(participations::table)
            .values(&new)
            .returning(Participation::as_returning())
            .get_result(&mut conn)?)
    }

    fn set_presence(&self, id: Uuid, present: bool) -> AppResult<Participation> {
        let mut conn = checkout(&self.pool)?;
        Ok(diesel::update(participations::table.find(id))
            .set((
                participations::present.eq(present),
                participations::updated_at.eq(Utc::now()),
            ))
            .returning(Participation::as_returning())
            .get_result(&mut conn)?)
    }

    fn set_feedback(&self, id: Uuid, rating: Option<i16>, feedback: Option<String>) -> AppResult<Participation> {
        let mut conn = checkout(&self.pool)?;
        Ok(diesel::update(participations::table.find(id))
            .set((
                participations::rating.eq(rating),
                participations::feedback.eq(feedback),
                participations::updated_at.eq(Utc::now()),
            ))
            .returning(Participation::as_returning())
            .get_result(&mut conn)?)
    }

    fn find_certificates(&self, user_id: Uuid, activity_id: Uuid) -> AppResult<Vec<Certificate>> {
        let mut conn = checkout(&self.pool)?;
        Ok(certificates::table
            .filter(certificates::user_id.eq(user_id))
            .filter(certificates::activity_id.eq(activity_id))
            .select(Certificate::as_select())
            .load(&mut conn)?)
    }

    fn insert_certificate(&self, new: NewCertificate) -> AppResult<Certificate> {
        let mut conn = checkout(&self.pool)?;
        Ok(diesel::insert_into(certificates::table)
            .values(&new)
            .returning(Certificate::as_returning())
            .get_result(&mut conn)?)
    }

    fn delete_certificates(&self, user_id: Uuid, activity_id: Uuid) -> AppResult<Vec<Uuid>> {
        let mut conn = checkout(&self.pool)?;
        Ok(diesel::delete(
            certificates::table
                .filter(certificates::user_id.eq(user_id))
                .filter(certificates::activity_id.eq(activity_id)),
        )
        .returning(certificates::id)
        .get_results(&mut conn)?)
    }

    fn find_certificate_by_code(&self, code: &str) -> AppResult<Option<Certificate>> {
        let mut conn = checkout(&self.pool)?;
        Ok(certificates::table
            .filter(certificates::verification_code.eq(code))
            .select(Certificate::as_select())
            .first(&mut conn)
            .optional()?)
    }

    fn list_user_certificates(&self, user_id: Uuid) -> AppResult<Vec<Certificate>> {
        let mut conn = checkout(&self.pool)?;
        Ok(certificates::table
            .filter(certificates::user_id.eq(user_id))
            .order(certificates::issued_at.desc())
            .select(Certificate::as_select())
            .load(&mut conn)?)
    }

    fn count_activity_certificates(&self, activity_id: Uuid) -> AppResult<i64> {
        let mut conn = checkout(&self.pool)?;
        Ok(certificates::table
            .filter(certificates::activity_id.eq(activity_id))
            .count()
            .get_result(&mut conn)?)
    }

    fn insert_notification(&self, new: NewNotification) -> AppResult<Notification> {
        let mut conn = checkout(&self.pool)?;
        Ok(diesel::insert_into(notifications::table)
            .values(&new)
            .returning(Notification::as_returning())
            .get_result(&mut conn)?)
    }

    fn list_notifications(&self, user_id: Uuid, limit: i64, offset: i64) -> AppResult<(Vec<Notification>, i64)> {
        let mut conn = checkout(&self.pool)?;

        let total: i64 = notifications::table
            .filter(notifications::user_id.eq(user_id))
            .count()
            .get_result(&mut conn)?;

        let items = notifications::table
            .filter(notifications::user_id.eq(user_id))
            .order(notifications::created_at.desc())
            .limit(limit)
            .offset(offset)
            .select(Notification::as_select())
            .load(&mut conn)?;

        Ok((items, total))
    }

    fn count_unread(&self, user_id: Uuid) -> AppResult<i64> {
        let mut conn = checkout(&self.pool)?;
        Ok(notifications::table
            .filter(notifications::user_id.eq(user_id))
            .filter(notifications::is_read.eq(false))
            .count()
            .get_result(&mut conn)?)
    }

    fn mark_read(&self, id: Uuid, user_id: Uuid) -> AppResult<Option<Notification>> {
        let mut conn = checkout(&self.pool)?;
        Ok(diesel::update(
            notifications::table
                .filter(notifications::id.eq(id))
                .filter(notifications::user_id.eq(user_id)),
        )
        .set(notifications::is_read.eq(true))
        .returning(Notification::as_returning())
        .get_result(&mut conn)
        .optional()?)
    }

    fn mark_all_read(&self, user_id: Uuid) -> AppResult<usize> {
        let mut conn = checkout(&self.pool)?;
        Ok(diesel::update(
            notifications::table
                .filter(notifications::user_id.eq(user_id))
                .filter(notifications::is_read.eq(false)),
        )
        .set(notifications::is_read.eq(true))
        .execute(&mut conn)?)
    }
}
