use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use campus_shared::errors::{AppError, AppResult};
use campus_shared::types::auth::UserRole;

use crate::models::{
    Activity, Certificate, Event, NewActivity, NewCertificate, NewEvent, NewNotification,
    NewParticipation, NewPublicRegistration, NewRegistration, Notification, Participation,
    PublicRegistration, Registration, User,
};

use super::Store;

/// Store operations that can be made to fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    FindUser,
    FindActivity,
    SetPresence,
    FindCertificates,
    InsertCertificate,
    DeleteCertificates,
    InsertNotification,
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    events: Vec<Event>,
    activities: Vec<Activity>,
    registrations: Vec<Registration>,
    public_registrations: Vec<PublicRegistration>,
    participations: HashMap<Uuid, Participation>,
    certificates: Vec<Certificate>,
    notifications: Vec<Notification>,
}

/// In-process store with the same observable behaviour as [`super::PgStore`].
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    failing: Mutex<HashSet<FailPoint>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Users live in the identity provider; this seeds one locally.
    pub fn insert_user(&self, full_name: &str, email: Option<&str>, role: UserRole) -> User {
        let user = User {
            id: Uuid::now_v7(),
            full_name: full_name.to_string(),
            email: email.map(str::to_string),
            role: role.to_string(),
            created_at: Utc::now(),
        };
        self.lock().users.push(user.clone());
        user
    }

    pub fn fail(&self, point: FailPoint) {
        self.failing.lock().unwrap_or_else(|e| e.into_inner()).insert(point);
    }

    pub fn recover(&self, point: FailPoint) {
        self.failing.lock().unwrap_or_else(|e| e.into_inner()).remove(&point);
    }

    pub fn certificate_count(&self) -> usize {
        self.lock().certificates.len()
    }

    fn check(&self, point: FailPoint) -> AppResult<()> {
        let failing = self.failing.lock().unwrap_or_else(|e| e.into_inner());
        if failing.contains(&point) {
            return Err(AppError::internal(format!("injected failure at {point:?}")));
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Store for MemoryStore {
    fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        self.check(FailPoint::FindUser)?;
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    fn insert_event(&self, new: NewEvent) -> AppResult<Event> {
        let event = Event {
            id: Uuid::now_v7(),
            title: new.title,
            description: new.description,
            location: new.location,
            starts_at: new.starts_at,
            ends_at: new.ends_at,
            hours: new.hours,
            created_by: new.created_by,
            created_at: Utc::now(),
        };
        self.lock().events.push(event.clone());
        Ok(event)
    }

    fn find_event(&self, id: Uuid) -> AppResult<Option<Event>> {
        Ok(self.lock().events.iter().find(|e| e.id == id).cloned())
    }

    fn list_events(&self, limit: i64, offset: i64) -> AppResult<(Vec<Event>, i64)> {
        let tables = self.lock();
        let mut all: Vec<Event> = tables.events.clone();
        all.sort_by_key(|e| e.starts_at);
        let total = all.len() as i64;
        let items = all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((items, total))
    }

    fn events_starting_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> AppResult<Vec<Event>> {
        let mut found: Vec<Event> = self
            .lock()
            .events
            .iter()
            .filter(|e| e.starts_at >= from && e.starts_at < to)
            .cloned()
            .collect();
        found.sort_by_key(|e| e.starts_at);
        Ok(found)
    }

    fn insert_activity(&self, new: NewActivity) -> AppResult<Activity> {
        let activity = Activity {
            id: Uuid::now_v7(),
            event_id: new.event_id,
            title: new.title,
            starts_at: new.starts_at,
            ends_at: new.ends_at,
            hours: new.hours,
            certificate_type: new.certificate_type,
            created_at: Utc::now(),
        };
        self.lock().activities.push(activity.clone());
        Ok(activity)
    }

    fn find_activity(&self, id: Uuid) -> AppResult<Option<Activity>> {
        self.check(FailPoint::FindActivity)?;
        Ok(self.lock().activities.iter().find(|a| a.id == id).cloned())
    }

    fn list_activities(&self, event_id: Uuid) -> AppResult<Vec<Activity>> {
        let mut found: Vec<Activity> = self
            .lock()
            .activities
            .iter()
            .filter(|a| a.event_id == event_id)
            .cloned()
            .collect();
        found.sort_by_key(|a| a.starts_at);
        Ok(found)
    }

    fn find_registration(&self, event_id: Uuid, user_id: Uuid) -> AppResult<Option<Registration>> {
        Ok(self
            .lock()
            .registrations
            .iter()
            .find(|r| r.event_id == event_id && r.user_id == user_id)
            .cloned())
    }

    fn insert_registration(&self, new: NewRegistration) -> AppResult<Registration> {
        let registration = Registration {
            id: Uuid::now_v7(),
            event_id: new.event_id,
            user_id: new.user_id,
            created_at: Utc::now(),
        };
        self.lock().registrations.push(registration.clone());
        Ok(registration)
    }

    fn registered_users(&self, event_id: Uuid) -> AppResult<Vec<User>> {
        let tables = self.lock();
        Ok(tables
            .registrations
            .iter()
            .filter(|r| r.event_id == event_id)
            .filter_map(|r| tables.users.iter().find(|u| u.id == r.user_id).cloned())
            .collect())
    }

    fn insert_public_registration(&self, new: NewPublicRegistration) -> AppResult<PublicRegistration> {
        let registration = PublicRegistration {
            id: Uuid::now_v7(),
            event_id: new.event_id,
            full_name: new.full_name,
            email: new.email,
            created_at: Utc::now(),
        };
        self.lock().public_registrations.push(registration.clone());
        Ok(registration)
    }

    fn find_participation(&self, id: Uuid) -> AppResult<Option<Participation>> {
        Ok(self.lock().participations.get(&id).cloned())
    }

    fn find_user_participation(&self, activity_id: Uuid, user_id: Uuid) -> AppResult<Option<Participation>> {
        Ok(self
            .lock()
            .participations
            .values()
            .find(|p| p.activity_id == activity_id && p.user_id == Some(user_id))
            .cloned())
    }

    fn list_participations(&self, activity_id: Uuid) -> AppResult<Vec<Participation>> {
        let mut found: Vec<Participation> = self
            .lock()
            .participations
            .values()
            .filter(|p| p.activity_id == activity_id)
            .cloned()
            .collect();
        found.sort_by_key(|p| p.created_at);
        Ok(found)
    }

    fn insert_participation(&self, new: NewParticipation) -> AppResult<Participation> {
        let now = Utc::now();
        let participation = Participation {
            id: Uuid::now_v7(),
            activity_id: new.activity_id,
            user_id: new.user_id,
            public_registration_id: new.public_registration_id,
            present: new.present,
            rating: None,
            feedback: None,
            created_at: now,
            updated_at: now,
        };
        self.lock().participations.insert(participation.id, participation.clone());
        Ok(participation)
    }

    fn set_presence(&self, id: Uuid, present: bool) -> AppResult<Participation> {
        self.check(FailPoint::SetPresence)?;
        let mut tables = self.lock();
        let participation = tables
            .participations
            .get_mut(&id)
            .ok_or(AppError::Database(diesel::result::Error::NotFound))?;
        participation.present = present;
        participation.updated_at = Utc::now();
        Ok(participation.clone())
    }

    fn set_feedback(&self, id: Uuid, rating: Option<i16>, feedback: Option<String>) -> AppResult<Participation> {
        let mut tables = self.lock();
        let participation = tables
            .participations
            .get_mut(&id)
            .ok_or(AppError::Database(diesel::result::Error::NotFound))?;
        participation.rating = rating;
        participation.feedback = feedback;
        participation.updated_at = Utc::now();
        Ok(participation.clone())
    }

    fn find_certificates(&self, user_id: Uuid, activity_id: Uuid) -> AppResult<Vec<Certificate>> {
        self.check(FailPoint::FindCertificates)?;
        Ok(self
            .lock()
            .certificates
            .iter()
            .filter(|c| c.user_id == user_id && c.activity_id == Some(activity_id))
            .cloned()
            .collect())
    }

    fn insert_certificate(&self, new: NewCertificate) -> AppResult<Certificate> {
        self.check(FailPoint::InsertCertificate)?;
        let certificate = Certificate {
            id: Uuid::now_v7(),
            user_id: new.user_id,
            event_id: new.event_id,
            activity_id: new.activity_id,
            verification_code: new.verification_code,
            certificate_type: new.certificate_type,
            hours: new.hours,
            issued_at: Utc::now(),
        };
        self.lock().certificates.push(certificate.clone());
        Ok(certificate)
    }

    fn delete_certificates(&self, user_id: Uuid, activity_id: Uuid) -> AppResult<Vec<Uuid>> {
        self.check(FailPoint::DeleteCertificates)?;
        let mut tables = self.lock();
        let mut removed = Vec::new();
        tables.certificates.retain(|c| {
            let matches = c.user_id == user_id && c.activity_id == Some(activity_id);
            if matches {
                removed.push(c.id);
            }
            !matches
        });
        Ok(removed)
    }

    fn find_certificate_by_code(&self, code: &str) -> AppResult<Option<Certificate>> {
        Ok(self
            .lock()
            .certificates
            .iter()
            .find(|c| c.verification_code == code)
            .cloned())
    }

    fn list_user_certificates(&self, user_id: Uuid) -> AppResult<Vec<Certificate>> {
        let mut found: Vec<Certificate> = self
            .lock()
            .certificates
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));
        Ok(found)
    }

    fn count_activity_certificates(&self, activity_id: Uuid) -> AppResult<i64> {
        Ok(self
            .lock()
            .certificates
            .iter()
            .filter(|c| c.activity_id == Some(activity_id))
            .count() as i64)
    }

    fn insert_notification(&self, new: NewNotification) -> AppResult<Notification> {
        self.check(FailPoint::InsertNotification)?;
        let notification = Notification {
            id: Uuid::now_v7(),
            user_id: new.user_id,
            title: new.title,
            message: new.message,
            link: new.link,
            is_read: false,
            created_at: Utc::now(),
        };
        self.lock().notifications.push(notification.clone());
        Ok(notification)
    }

    fn list_notifications(&self, user_id: Uuid, limit: i64, offset: i64) -> AppResult<(Vec<Notification>, i64)> {
        let tables = self.lock();
        let mut mine: Vec<Notification> = tables
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = mine.len() as i64;
        let items = mine
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((items, total))
    }

    fn count_unread(&self, user_id: Uuid) -> AppResult<i64> {
        Ok(self
            .lock()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as i64)
    }

    fn mark_read(&self, id: Uuid, user_id: Uuid) -> AppResult<Option<Notification>> {
        let mut tables = self.lock();
        Ok(tables
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
            .map(|n| {
                n.is_read = true;
                n.clone()
            }))
    }

    fn mark_all_read(&self, user_id: Uuid) -> AppResult<usize> {
        let mut tables = self.lock();
        let mut updated = 0;
        for n in tables.notifications.iter_mut().filter(|n| n.user_id == user_id && !n.is_read) {
            n.is_read = true;
            updated += 1;
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fail_points_can_be_armed_and_cleared() {
        let store = MemoryStore::new();
        store.fail(FailPoint::InsertNotification);

        let new = NewNotification {
            user_id: Uuid::new_v4(),
            title: "t".into(),
            message: "m".into(),
            link: None,
        };
        assert!(store.insert_notification(new.clone()).is_err());

        store.recover(FailPoint::InsertNotification);
        assert!(store.insert_notification(new).is_ok());
    }

    #[test]
    fn mark_read_ignores_other_users_notifications() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let n = store
            .insert_notification(NewNotification {
                user_id: owner,
                title: "t".into(),
                message: "m".into(),
                link: None,
            })
            .unwrap();

        assert!(store.mark_read(n.id, Uuid::new_v4()).unwrap().is_none());
        assert_eq!(store.count_unread(owner).unwrap(), 1);
        assert!(store.mark_read(n.id, owner).unwrap().unwrap().is_read);
        assert_eq!(store.count_unread(owner).unwrap(), 0);
    }
}
