//! Reminder dispatch: periodic due-reminder scan plus notification fan-out.

pub mod channel;
pub mod dispatcher;

pub use channel::{DeliveryOutcome, NotificationChannel, VoiceCallChannel, deliver_to_all};
pub use dispatcher::ReminderDispatcher;
