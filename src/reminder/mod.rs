//! Medical-appointment reminders

mod date;
mod model;
mod store;

pub use date::*;
pub use model::Reminder;
pub use store::{reminders_collection, ReminderStore};
