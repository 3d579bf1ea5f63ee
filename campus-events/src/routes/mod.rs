pub mod attendance;
pub mod certificates;
pub mod changes;
pub mod events;
pub mod health;
pub mod notifications;
pub mod registrations;
pub mod reminders;
