//! Integration tests for settings lookups keyed by identity.

mod common;

use chanroster::{IdentityKey, MemorySettings, SettingsStore, SqliteSettings};
use common::{roster_with, sender};
use serde_json::{Value, json};
use std::sync::Arc;

#[tokio::test]
async fn settings_follow_user_across_rename() {
    let store = Arc::new(SqliteSettings::open(":memory:").await.unwrap());
    store
        .store_setting(&IdentityKey::new("alice.users.example"), "lang", json!("nl"))
        .await
        .unwrap();

    let mut r = roster_with(store);
    r.join(&sender("alice"), "#rust");
    let before = r
        .get_user("alice")
        .unwrap()
        .get_setting("lang", json!("en"))
        .await
        .unwrap();

    r.renamed("alice", "bob");
    let bob = r.get_user("bob").unwrap();
    let after = bob.get_setting("lang", json!("en")).await.unwrap();

    assert_eq!(before, json!("nl"));
    assert_eq!(after, before);
    assert_eq!(
        bob.get_all_settings().await.unwrap(),
        r.get_user("bob").unwrap().get_all_settings().await.unwrap()
    );
}

#[tokio::test]
async fn writes_are_visible_under_new_nick() {
    let store = Arc::new(SqliteSettings::open(":memory:").await.unwrap());
    let mut r = roster_with(store);
    r.join(&sender("alice"), "#rust");

    r.get_user("alice")
        .unwrap()
        .set_setting("admin", json!(true))
        .await
        .unwrap();
    r.renamed("alice", "alice_away");

    let record = r.get_user("alice_away").unwrap();
    assert_eq!(
        record.get_setting("admin", json!(false)).await.unwrap(),
        json!(true)
    );
}

#[tokio::test]
async fn missing_document_and_field_fall_back() {
    let store = Arc::new(MemorySettings::new());
    let mut doc = serde_json::Map::new();
    doc.insert("lang".into(), json!("de"));
    store.insert_document(IdentityKey::new("carol.users.example"), doc);

    let mut r = roster_with(store);
    r.join(&sender("carol"), "#a");
    r.join(&sender("dan"), "#a");

    let carol = r.get_user("carol").unwrap();
    assert_eq!(carol.get_setting("tz", Value::Null).await.unwrap(), Value::Null);
    assert_eq!(carol.get_setting("lang", json!("en")).await.unwrap(), json!("de"));

    let dan = r.get_user("dan").unwrap();
    assert!(dan.get_all_settings().await.unwrap().is_none());
    assert_eq!(dan.get_setting("lang", json!("en")).await.unwrap(), json!("en"));
}

#[tokio::test]
async fn shared_host_shares_settings() {
    let store = Arc::new(MemorySettings::new());
    let mut r = roster_with(store);
    r.join(&chanroster::SenderInfo::new("laptop", "me", "home.example"), "#a");
    r.join(&chanroster::SenderInfo::new("phone", "me", "home.example"), "#a");

    r.get_user("laptop")
        .unwrap()
        .set_setting("greet", json!(false))
        .await
        .unwrap();

    let phone = r.get_user("phone").unwrap();
    assert_ne!(phone, r.get_user("laptop").unwrap());
    assert_eq!(phone.get_setting("greet", json!(true)).await.unwrap(), json!(false));
}
