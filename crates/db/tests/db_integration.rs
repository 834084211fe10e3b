//! Database integration tests.
//!
//! Run against an in-memory `SQLite` database with the full schema applied.

#![allow(clippy::unwrap_used)]

use chrono::Utc;
use reactions_db::entities::activity;
use reactions_db::repositories::{
    ActivityMetaRepository, ActivityRepository, NotificationRepository, REACTIONS_COMPONENT,
    SiteOptionRepository, UserMetaRepository, UserRepository,
};
use reactions_db::test_utils::TestDatabase;
use sea_orm::Set;

fn reaction_row(user_id: i64, parent: &activity::Model, kind: &str) -> activity::ActiveModel {
    activity::ActiveModel {
        user_id: Set(user_id),
        component: Set(REACTIONS_COMPONENT.to_string()),
        activity_type: Set(format!("bp_activity_reaction_{kind}")),
        action: Set(String::new()),
        content: Set(String::new()),
        primary_link: Set(String::new()),
        item_id: Set(parent.id),
        secondary_item_id: Set(parent.user_id),
        hide_sitewide: Set(parent.hide_sitewide),
        date_recorded: Set(Utc::now().into()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_reaction_rows_roundtrip() {
    let db = TestDatabase::new().await.unwrap();
    let repo = ActivityRepository::new(db.connection());
    let alice = db.create_user("alice", false).await.unwrap();
    let bob = db.create_user("bob", false).await.unwrap();
    let parent = db.create_activity(alice.id, "hello").await.unwrap();

    let conn = db.connection();
    repo.insert_reaction(
        conn.as_ref(),
        reaction_row(bob.id, &parent, "like"),
        parent.id,
        "bp_activity_reaction_like",
        bob.id,
    )
    .await
    .unwrap();
    repo.insert_reaction(
        conn.as_ref(),
        reaction_row(alice.id, &parent, "favorite"),
        parent.id,
        "bp_activity_reaction_favorite",
        alice.id,
    )
    .await
    .unwrap();

    assert_eq!(repo.count_reactions(conn.as_ref(), parent.id).await.unwrap(), 2);
    let found = repo
        .find_reaction(conn.as_ref(), parent.id, "bp_activity_reaction_like", bob.id)
        .await
        .unwrap();
    assert!(found.is_some());
    assert!(
        repo.find_reaction(conn.as_ref(), parent.id, "bp_activity_reaction_like", alice.id)
            .await
            .unwrap()
            .is_none()
    );

    let ids = repo.find_reacted_parent_ids(bob.id, None).await.unwrap();
    assert_eq!(ids, vec![parent.id]);
    let ids = repo
        .find_reacted_parent_ids(bob.id, Some("bp_activity_reaction_favorite"))
        .await
        .unwrap();
    assert!(ids.is_empty());

    assert_eq!(
        repo.delete_reactions_of(conn.as_ref(), parent.id)
            .await
            .unwrap(),
        2
    );
    assert_eq!(repo.count_reactions(conn.as_ref(), parent.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_rolled_back_transaction_leaves_no_rows() {
    let db = TestDatabase::new().await.unwrap();
    let repo = ActivityRepository::new(db.connection());
    let alice = db.create_user("alice", false).await.unwrap();
    let parent = db.create_activity(alice.id, "hello").await.unwrap();

    let txn = repo.begin().await.unwrap();
    assert!(repo.lock(&txn, parent.id).await.unwrap());
    repo.insert_reaction(
        &txn,
        reaction_row(alice.id, &parent, "like"),
        parent.id,
        "bp_activity_reaction_like",
        alice.id,
    )
    .await
    .unwrap();
    txn.rollback().await.unwrap();

    let conn = db.connection();
    assert_eq!(repo.count_reactions(conn.as_ref(), parent.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_duplicate_reaction_insert_keeps_first_row() {
    let db = TestDatabase::new().await.unwrap();
    let repo = ActivityRepository::new(db.connection());
    let alice = db.create_user("alice", false).await.unwrap();
    let bob = db.create_user("bob", false).await.unwrap();
    let parent = db.create_activity(alice.id, "hello").await.unwrap();
    let conn = db.connection();

    let (first, created) = repo
        .insert_reaction(
            conn.as_ref(),
            reaction_row(bob.id, &parent, "like"),
            parent.id,
            "bp_activity_reaction_like",
            bob.id,
        )
        .await
        .unwrap();
    assert!(created);

    let (second, created) = repo
        .insert_reaction(
            conn.as_ref(),
            reaction_row(bob.id, &parent, "like"),
            parent.id,
            "bp_activity_reaction_like",
            bob.id,
        )
        .await
        .unwrap();
    assert!(!created);
    assert_eq!(first.id, second.id);
    assert_eq!(repo.count_reactions(conn.as_ref(), parent.id).await.unwrap(), 1);

    // Plain activities share item_id 0 and stay outside the unique index
    db.create_activity(alice.id, "again").await.unwrap();
    db.create_activity(alice.id, "and again").await.unwrap();
}

#[tokio::test]
async fn test_lock_reports_missing_activity() {
    let db = TestDatabase::new().await.unwrap();
    let repo = ActivityRepository::new(db.connection());
    let alice = db.create_user("alice", false).await.unwrap();
    let parent = db.create_activity(alice.id, "hello").await.unwrap();

    let txn = repo.begin().await.unwrap();
    assert!(repo.lock(&txn, parent.id).await.unwrap());
    assert!(!repo.lock(&txn, parent.id + 1).await.unwrap());
    txn.commit().await.unwrap();

    let row = repo.find_by_id(parent.id).await.unwrap().unwrap();
    assert_eq!(row.content, "hello");
}

#[tokio::test]
async fn test_activity_meta_upsert_and_ranking() {
    let db = TestDatabase::new().await.unwrap();
    let repo = ActivityMetaRepository::new(db.connection());
    let conn = db.connection();

    repo.upsert(conn.as_ref(), 1, "bp_reactions_count", "2")
        .await
        .unwrap();
    repo.upsert(conn.as_ref(), 1, "bp_reactions_count", "10")
        .await
        .unwrap();
    repo.upsert(conn.as_ref(), 2, "bp_reactions_count", "9")
        .await
        .unwrap();
    repo.upsert(conn.as_ref(), 3, "other", "100").await.unwrap();

    assert_eq!(
        repo.get(1, "bp_reactions_count").await.unwrap().as_deref(),
        Some("10")
    );

    // Numeric, not lexicographic, ordering
    let ranked = repo
        .ranked_by_numeric_value("bp_reactions_count", 10, 0)
        .await
        .unwrap();
    assert_eq!(ranked, vec![(1, 10), (2, 9)]);

    repo.delete_key(conn.as_ref(), 1, "bp_reactions_count")
        .await
        .unwrap();
    assert!(repo.get(1, "bp_reactions_count").await.unwrap().is_none());
    assert_eq!(repo.delete_all(conn.as_ref(), 3).await.unwrap(), 1);
}

#[tokio::test]
async fn test_user_meta_paging_is_stable() {
    let db = TestDatabase::new().await.unwrap();
    let repo = UserMetaRepository::new(db.connection());

    for user_id in 1..=5 {
        db.set_legacy_favorites(user_id, &[user_id]).await.unwrap();
    }
    repo.set(9, "unrelated", "x").await.unwrap();

    assert_eq!(repo.count_by_key("bp_favorite_activities").await.unwrap(), 5);

    let first = repo
        .find_page_by_key("bp_favorite_activities", 0, 2)
        .await
        .unwrap();
    let second = repo
        .find_page_by_key("bp_favorite_activities", 2, 2)
        .await
        .unwrap();
    let last = repo
        .find_page_by_key("bp_favorite_activities", 4, 2)
        .await
        .unwrap();
    let past_end = repo
        .find_page_by_key("bp_favorite_activities", 6, 2)
        .await
        .unwrap();

    let users: Vec<i64> = first
        .iter()
        .chain(&second)
        .chain(&last)
        .map(|m| m.user_id)
        .collect();
    assert_eq!(users, vec![1, 2, 3, 4, 5]);
    assert!(past_end.is_empty());
}

#[tokio::test]
async fn test_site_options() {
    let db = TestDatabase::new().await.unwrap();
    let repo = SiteOptionRepository::new(db.connection());

    assert!(repo.get("_bp_reactions_use_unique_subnav").await.unwrap().is_none());
    repo.set("_bp_reactions_use_unique_subnav", "1").await.unwrap();
    repo.set("_bp_reactions_use_unique_subnav", "0").await.unwrap();
    assert_eq!(
        repo.get("_bp_reactions_use_unique_subnav")
            .await
            .unwrap()
            .as_deref(),
        Some("0")
    );
}

#[tokio::test]
async fn test_user_lookup_by_token() {
    let db = TestDatabase::new().await.unwrap();
    let repo = UserRepository::new(db.connection());
    let admin = db.create_user("admin", true).await.unwrap();

    let found = repo.find_by_token("token-admin").await.unwrap().unwrap();
    assert_eq!(found.id, admin.id);
    assert!(found.is_admin);
    assert!(repo.find_by_token("nope").await.unwrap().is_none());
    assert!(repo.get_by_id(999).await.is_err());
}

#[tokio::test]
async fn test_notifications_read_and_cleanup() {
    use reactions_db::entities::notification;

    let db = TestDatabase::new().await.unwrap();
    let repo = NotificationRepository::new(db.connection());

    for (item, reactor) in [(10, 2), (10, 3), (11, 2)] {
        repo.create(notification::ActiveModel {
            user_id: Set(1),
            item_id: Set(item),
            secondary_item_id: Set(reactor),
            component_name: Set("reactions".to_string()),
            component_action: Set("bp_activity_reaction_like".to_string()),
            date_notified: Set(Utc::now().into()),
            is_new: Set(true),
            ..Default::default()
        })
        .await
        .unwrap();
    }

    assert_eq!(repo.find_unread_by_user(1, "reactions").await.unwrap().len(), 3);
    assert_eq!(repo.mark_read_by_item(1, "reactions", 10).await.unwrap(), 2);
    assert_eq!(repo.find_unread_by_user(1, "reactions").await.unwrap().len(), 1);

    assert_eq!(
        repo.delete_for_reaction("reactions", 11, 2, "bp_activity_reaction_like")
            .await
            .unwrap(),
        1
    );
    assert_eq!(repo.delete_by_item("reactions", 10).await.unwrap(), 2);
    assert!(repo.find_unread_by_user(1, "reactions").await.unwrap().is_empty());
}
