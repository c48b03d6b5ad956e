//! Per-user reminder list and its nearest-reminder slot

use chrono::Utc;
use log::{debug, info};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::watch;

use super::model::Reminder;
use crate::auth::IdentityProvider;
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::store::{encode, fields, CollectionPath, DocumentStore, Query, SortOrder};

/// Field the list is ordered by
pub const ORDER_FIELD: &str = "dateTimestamp";

/// Collection holding one user's reminders
pub fn reminders_collection(user_id: &str) -> CollectionPath {
    CollectionPath::root("users").sub(user_id, "reminders")
}

/// Reminders of the signed-in user, kept sorted by date
///
/// Every mutation writes to the document store first and only touches the
/// local list once the write succeeded. After each change the nearest
/// reminder (the earliest upcoming one that is not completed) is recomputed
/// and published to subscribers.
pub struct ReminderStore {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
    reminders: Vec<Reminder>,
    nearest: watch::Sender<Option<Reminder>>,
}

impl ReminderStore {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (nearest, _) = watch::channel(None);
        Self {
            store,
            identity,
            clock,
            reminders: Vec::new(),
            nearest,
        }
    }

    fn user_id(&self) -> Result<String> {
        self.identity
            .current_user_id()
            .ok_or(Error::Unauthenticated)
    }

    /// Fetch the user's reminders ordered by date
    ///
    /// Without a signed-in user the list is empty and no query is made.
    pub async fn load(&mut self) -> Result<&[Reminder]> {
        let user_id = match self.identity.current_user_id() {
            Some(user_id) => user_id,
            None => {
                debug!("no signed-in user, reminder list is empty");
                self.reminders.clear();
                self.recompute_nearest();
                return Ok(&self.reminders);
            }
        };

        let query = Query::new().order(ORDER_FIELD, SortOrder::Ascending);
        let docs = self
            .store
            .query(&reminders_collection(&user_id), &query)
            .await?;
        let mut reminders = docs
            .iter()
            .map(|doc| doc.decode::<Reminder>())
            .collect::<Result<Vec<_>>>()?;
        sort_by_date(&mut reminders);

        info!("loaded {} reminders", reminders.len());
        self.reminders = reminders;
        self.recompute_nearest();
        Ok(&self.reminders)
    }

    /// Create a reminder from the add-reminder form
    ///
    /// Blank fields and unparseable dates are rejected before anything is
    /// written.
    pub async fn add(&mut self, name: &str, date: &str, doctor: &str) -> Result<Reminder> {
        let (name, date, doctor) = (name.trim(), date.trim(), doctor.trim());
        if name.is_empty() || date.is_empty() || doctor.is_empty() {
            return Err(Error::validation("Please fill in all fields"));
        }

        let mut reminder = Reminder::new(name, date, doctor, self.clock.now().with_timezone(&Utc))?;
        let user_id = self.user_id()?;

        reminder.id = self
            .store
            .add(&reminders_collection(&user_id), encode(&reminder)?)
            .await?;
        info!("added reminder {} on {}", reminder.id, reminder.date);

        self.reminders.push(reminder.clone());
        sort_by_date(&mut self.reminders);
        self.recompute_nearest();
        Ok(reminder)
    }

    /// Delete a reminder
    pub async fn delete(&mut self, id: &str) -> Result<()> {
        let user_id = self.user_id()?;
        self.store
            .delete(&reminders_collection(&user_id), id)
            .await?;

        self.reminders.retain(|r| r.id != id);
        self.recompute_nearest();
        Ok(())
    }

    /// Mark a reminder completed
    pub async fn mark_completed(&mut self, id: &str) -> Result<()> {
        let index = self
            .reminders
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| Error::not_found(format!("reminder {}", id)))?;
        let user_id = self.user_id()?;

        self.store
            .update(
                &reminders_collection(&user_id),
                id,
                fields([("isCompleted", json!(true))]),
            )
            .await?;

        self.reminders[index].is_completed = true;
        self.recompute_nearest();
        Ok(())
    }

    /// All reminders, ascending by date
    pub fn reminders(&self) -> &[Reminder] {
        &self.reminders
    }

    /// Reminders dated today or later
    pub fn upcoming(&self) -> Vec<&Reminder> {
        let now = self.clock.now();
        self.reminders.iter().filter(|r| r.is_upcoming(&now)).collect()
    }

    /// Reminders that are not upcoming: dated before today, or without a
    /// usable timestamp
    pub fn passed(&self) -> Vec<&Reminder> {
        let now = self.clock.now();
        self.reminders.iter().filter(|r| !r.is_upcoming(&now)).collect()
    }

    /// The earliest upcoming reminder that is not completed
    pub fn nearest(&self) -> Option<Reminder> {
        self.nearest.borrow().clone()
    }

    /// Receive the nearest reminder every time it is recomputed
    pub fn subscribe_nearest(&self) -> watch::Receiver<Option<Reminder>> {
        self.nearest.subscribe()
    }

    fn recompute_nearest(&mut self) {
        let now = self.clock.now();
        let nearest = self
            .reminders
            .iter()
            .filter(|r| r.is_pending(&now))
            .min_by_key(|r| r.date_timestamp)
            .cloned();
        debug!(
            "nearest reminder: {}",
            nearest.as_ref().map(|r| r.id.as_str()).unwrap_or("none")
        );
        self.nearest.send_replace(nearest);
    }
}

/// Stable sort by timestamp; reminders without one go last
fn sort_by_date(reminders: &mut [Reminder]) {
    reminders.sort_by_key(|r| (r.date_timestamp.is_none(), r.date_timestamp));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticIdentity;
    use crate::clock::FixedClock;
    use crate::store::MemoryDocumentStore;
    use chrono::{Local, TimeZone};

    fn setup(identity: StaticIdentity) -> (Arc<MemoryDocumentStore>, ReminderStore) {
        let store = Arc::new(MemoryDocumentStore::new());
        let clock = FixedClock(Local.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap());
        let reminders = ReminderStore::new(store.clone(), Arc::new(identity), Arc::new(clock));
        (store, reminders)
    }

    #[tokio::test]
    async fn load_without_user_is_empty_and_silent() {
        let (store, mut reminders) = setup(StaticIdentity::signed_out());
        assert!(reminders.load().await.unwrap().is_empty());
        assert_eq!(store.queries_issued(), 0);
        assert!(reminders.nearest().is_none());
    }

    #[tokio::test]
    async fn add_requires_every_field() {
        let (store, mut reminders) = setup(StaticIdentity::signed_in("u1"));
        let err = reminders.add("Checkup", "  ", "Dr. Sarah").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(store.len(&reminders_collection("u1")).await, 0);
    }

    #[tokio::test]
    async fn invalid_date_is_rejected_before_writing() {
        let (store, mut reminders) = setup(StaticIdentity::signed_in("u1"));
        let err = reminders.add("Checkup", "17-01-2025", "Dr. Sarah").await.unwrap_err();
        assert!(matches!(err, Error::InvalidDate(_)));
        assert!(err.is_validation());
        assert!(reminders.reminders().is_empty());
        assert_eq!(store.len(&reminders_collection("u1")).await, 0);
    }

    #[tokio::test]
    async fn add_without_user_is_unauthenticated() {
        let (_, mut reminders) = setup(StaticIdentity::signed_out());
        let err = reminders.add("Checkup", "17/01/2025", "Dr. Sarah").await.unwrap_err();
        assert!(matches!(err, Error::Unauthenticated));
    }

    #[tokio::test]
    async fn list_stays_sorted_regardless_of_insert_order() {
        let (_, mut reminders) = setup(StaticIdentity::signed_in("u1"));
        for date in ["20/01/2025", "12/01/2025", "15/01/2025"] {
            reminders.add("Visit", date, "Dr. Lee").await.unwrap();
        }
        let dates: Vec<&str> = reminders.reminders().iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, ["12/01/2025", "15/01/2025", "20/01/2025"]);
    }

    #[tokio::test]
    async fn failed_write_leaves_local_state_unchanged() {
        let (store, mut reminders) = setup(StaticIdentity::signed_in("u1"));
        let kept = reminders.add("Checkup", "17/01/2025", "Dr. Sarah").await.unwrap();

        store.set_fail_writes(true);
        assert!(matches!(
            reminders.add("Scan", "12/01/2025", "Dr. Lee").await,
            Err(Error::Database(_))
        ));
        assert!(reminders.mark_completed(&kept.id).await.is_err());
        assert!(reminders.delete(&kept.id).await.is_err());

        assert_eq!(reminders.reminders().len(), 1);
        assert!(!reminders.reminders()[0].is_completed);
        assert_eq!(reminders.nearest().map(|r| r.id), Some(kept.id));
    }

    #[tokio::test]
    async fn delete_recomputes_nearest() {
        let (store, mut reminders) = setup(StaticIdentity::signed_in("u1"));
        let first = reminders.add("Scan", "12/01/2025", "Dr. Lee").await.unwrap();
        let second = reminders.add("Checkup", "17/01/2025", "Dr. Sarah").await.unwrap();
        assert_eq!(reminders.nearest().map(|r| r.id), Some(first.id.clone()));

        reminders.delete(&first.id).await.unwrap();
        assert_eq!(reminders.nearest().map(|r| r.id), Some(second.id.clone()));
        assert_eq!(store.len(&reminders_collection("u1")).await, 1);

        reminders.delete(&second.id).await.unwrap();
        assert!(reminders.nearest().is_none());
    }

    #[tokio::test]
    async fn passed_reminders_never_become_nearest() {
        let (_, mut reminders) = setup(StaticIdentity::signed_in("u1"));
        reminders.add("Old", "05/01/2025", "Dr. Lee").await.unwrap();
        assert!(reminders.nearest().is_none());
        assert_eq!(reminders.passed().len(), 1);
        assert!(reminders.upcoming().is_empty());

        let today = reminders.add("Today", "10/01/2025", "Dr. Lee").await.unwrap();
        assert_eq!(reminders.nearest().map(|r| r.id), Some(today.id));
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let (_, mut reminders) = setup(StaticIdentity::signed_in("u1"));
        assert!(matches!(
            reminders.mark_completed("nope").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn load_reads_back_in_date_order() {
        let (store, mut writer) = setup(StaticIdentity::signed_in("u1"));
        writer.add("B", "15/01/2025", "Dr. Lee").await.unwrap();
        writer.add("A", "11/01/2025", "Dr. Lee").await.unwrap();

        let clock = FixedClock(Local.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap());
        let mut reader = ReminderStore::new(
            store.clone(),
            Arc::new(StaticIdentity::signed_in("u1")),
            Arc::new(clock),
        );
        let names: Vec<String> = reader
            .load()
            .await
            .unwrap()
            .iter()
            .map(|r| r.name.clone())
            .collect();
        assert_eq!(names, ["A", "B"]);
        assert_eq!(reader.nearest().map(|r| r.name), Some("A".to_string()));
    }

    #[tokio::test]
    async fn completing_the_last_pending_reminder_clears_nearest() {
        let (_, mut reminders) = setup(StaticIdentity::signed_in("u1"));
        let only = reminders.add("A", "12/01/2025", "Dr. Lee").await.unwrap();
        let mut nearest = reminders.subscribe_nearest();
        assert_eq!(reminders.nearest().map(|r| r.id), Some(only.id.clone()));

        reminders.mark_completed(&only.id).await.unwrap();
        assert!(reminders.nearest().is_none());
        assert!(nearest.has_changed().unwrap());
        assert!(nearest.borrow_and_update().is_none());
        assert_eq!(reminders.upcoming().len(), 1);
    }

    #[tokio::test]
    async fn reminders_without_timestamp_are_listed_as_passed() {
        let (store, mut reminders) = setup(StaticIdentity::signed_in("u1"));
        store
            .add(
                &reminders_collection("u1"),
                fields([
                    ("name", json!("Legacy")),
                    ("date", json!("soon")),
                    ("dateTimestamp", json!(0)),
                    ("doctor", json!("Dr. Lee")),
                ]),
            )
            .await
            .unwrap();
        reminders.add("Checkup", "17/01/2025", "Dr. Sarah").await.unwrap();
        reminders.load().await.unwrap();

        let passed: Vec<&str> = reminders.passed().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(passed, ["Legacy"]);
        assert_eq!(reminders.upcoming().len(), 1);
        assert_eq!(reminders.reminders().last().map(|r| r.name.as_str()), Some("Legacy"));
        assert_eq!(reminders.nearest().map(|r| r.name), Some("Checkup".to_string()));
    }
}
