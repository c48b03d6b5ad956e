mod common;

use breastie::error::Error;
use breastie::reminder::{reminders_collection, DayOffset};
use chrono::{Local, TimeZone};

#[tokio::test]
async fn nearest_follows_adds_and_completions() {
    let env = common::offline();
    let mut reminders = env.breastie.reminders();
    let mut nearest = reminders.subscribe_nearest();
    let today = Local.with_ymd_and_hms(2025, 1, 10, 8, 30, 0).unwrap();

    let checkup = reminders.add("Checkup", "17/01/2025", "Dr. Sarah").await.unwrap();
    assert_eq!(checkup.days_until(&today), Some(DayOffset::Ahead(7)));
    assert_eq!(checkup.days_until_label(&today), "H-7");
    assert!(nearest.has_changed().unwrap());
    assert_eq!(nearest.borrow_and_update().as_ref().map(|r| r.id.clone()), Some(checkup.id.clone()));

    let bloodwork = reminders.add("Bloodwork", "12/01/2025", "Dr. Lee").await.unwrap();
    assert_eq!(bloodwork.days_until_label(&today), "H-2");
    assert_eq!(reminders.nearest().map(|r| r.id), Some(bloodwork.id.clone()));

    reminders.mark_completed(&bloodwork.id).await.unwrap();
    assert_eq!(reminders.nearest().map(|r| r.id), Some(checkup.id.clone()));
    assert_eq!(env.store.len(&reminders_collection("u1")).await, 2);
}

#[tokio::test]
async fn labels_for_today_and_passed() {
    let env = common::offline();
    let mut reminders = env.breastie.reminders();
    let today = Local.with_ymd_and_hms(2025, 1, 10, 23, 59, 0).unwrap();

    let scan = reminders.add("Scan", "10/01/2025", "Dr. Lee").await.unwrap();
    let old = reminders.add("Old", "08/01/2025", "Dr. Lee").await.unwrap();
    assert_eq!(scan.days_until_label(&today), "Today");
    assert_eq!(old.days_until_label(&today), "H+2 (Passed)");
    assert_eq!(reminders.upcoming().len(), 1);
    assert_eq!(reminders.passed().len(), 1);
}

#[tokio::test]
async fn signed_out_user_cannot_add() {
    let env = common::offline();
    env.breastie.identity().clear();
    let mut reminders = env.breastie.reminders();

    assert!(reminders.load().await.unwrap().is_empty());
    let err = reminders.add("Checkup", "17/01/2025", "Dr. Sarah").await.unwrap_err();
    assert!(matches!(err, Error::Unauthenticated));
    assert_eq!(err.user_message(), "Please sign in first");
    assert_eq!(env.store.queries_issued(), 0);
}

#[tokio::test]
async fn reload_restores_the_list() {
    let env = common::offline();
    let mut writer = env.breastie.reminders();
    writer.add("Checkup", "17/01/2025", "Dr. Sarah").await.unwrap();
    writer.add("Bloodwork", "12/01/2025", "Dr. Lee").await.unwrap();

    let mut reader = env.breastie.reminders();
    let names: Vec<String> = reader
        .load()
        .await
        .unwrap()
        .iter()
        .map(|r| r.name.clone())
        .collect();
    assert_eq!(names, ["Bloodwork", "Checkup"]);
    assert_eq!(reader.nearest().map(|r| r.name), Some("Bloodwork".to_string()));
}
