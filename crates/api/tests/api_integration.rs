//! API integration tests.
//!
//! These tests drive the router end to end against an in-memory database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    middleware::from_fn_with_state,
};
use reactions_api::{AppState, auth_middleware, response, router as api_router};
use reactions_common::{NonceAction, NonceSigner};
use reactions_core::{
    AddOptions, EmojiCatalog, MigrationService, NotificationService, ReactionRegistry,
    ReactionService, RegistryOptions, SettingsService,
};
use reactions_db::entities::user;
use reactions_db::repositories::{
    ActivityMetaRepository, ActivityRepository, NotificationRepository, SiteOptionRepository,
    UserMetaRepository, UserRepository,
};
use reactions_db::test_utils::TestDatabase;
use serde_json::{Value, json};
use tower::ServiceExt;

const EMOJI_DATA: &str =
    r#"[{"unified": "1F602", "short_name": "joy", "has_img_twitter": true}]"#;

struct TestApp {
    app: Router,
    state: AppState,
    db: TestDatabase,
}

impl TestApp {
    async fn new() -> Self {
        let db = TestDatabase::new().await.unwrap();
        let conn = db.connection();
        let server_url = "https://example.com".to_string();

        let registry = Arc::new(ReactionRegistry::with_defaults(RegistryOptions::default()));
        let notification_service = Arc::new(NotificationService::new(
            NotificationRepository::new(conn.clone()),
            UserRepository::new(conn.clone()),
            registry.clone(),
            server_url.clone(),
        ));
        let mut reaction_service = ReactionService::new(
            registry,
            ActivityRepository::new(conn.clone()),
            ActivityMetaRepository::new(conn.clone()),
            UserRepository::new(conn.clone()),
            server_url.clone(),
        );
        reaction_service.add_observer(notification_service.clone());

        let migration_service = MigrationService::new(
            UserMetaRepository::new(conn.clone()),
            ActivityRepository::new(conn.clone()),
            reaction_service.clone(),
            20,
        );

        let state = AppState {
            reaction_service,
            notification_service,
            settings_service: SettingsService::new(SiteOptionRepository::new(conn.clone())),
            migration_service,
            user_repo: UserRepository::new(conn),
            nonces: NonceSigner::new("test-secret", 86_400),
            emojis: Arc::new(EmojiCatalog::from_json(EMOJI_DATA).unwrap()),
            server_url,
        };

        let app = Router::new()
            .nest("/api", api_router())
            .layer(from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state.clone());

        Self { app, state, db }
    }

    fn nonce(&self, action: NonceAction, user_id: i64) -> String {
        self.state.nonces.create(action, user_id)
    }

    async fn post(&self, uri: &str, user: Option<&user::Model>, body: Value) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(user) = user {
            let token = user.api_token.clone().unwrap();
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

#[tokio::test]
async fn test_fetch_reports_every_reaction() {
    let t = TestApp::new().await;
    let author = t.db.create_user("author", false).await.unwrap();
    let fan = t.db.create_user("fan", false).await.unwrap();
    let post = t.db.create_activity(author.id, "hello").await.unwrap();

    t.state
        .reaction_service
        .add(post.id, "like", fan.id, AddOptions::default())
        .await
        .unwrap();

    let (status, body) = t
        .post(
            "/api/reactions/fetch",
            Some(&fan),
            json!({ "nonce": t.nonce(NonceAction::Fetch, fan.id), "activity_id": post.id }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!({
            "favorite": { "reacted": false, "emoji": "0x2B50", "count": 0 },
            "like": { "reacted": true, "emoji": "0x2764", "count": 1 },
        })
    );

    // Anonymous viewers see counts but never a reacted flag
    let (status, body) = t
        .post(
            "/api/reactions/fetch",
            None,
            json!({ "nonce": t.nonce(NonceAction::Fetch, 0), "activity_id": post.id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["like"]["reacted"], false);
    assert_eq!(body["data"]["like"]["count"], 1);
}

#[tokio::test]
async fn test_fetch_rejects_bad_nonce() {
    let t = TestApp::new().await;
    let fan = t.db.create_user("fan", false).await.unwrap();

    // Nonce issued for another action
    let (status, body) = t
        .post(
            "/api/reactions/fetch",
            Some(&fan),
            json!({ "nonce": t.nonce(NonceAction::Save, fan.id), "activity_id": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["message"], response::NOT_ALLOWED);

    // Nonce issued for another user
    let (status, _) = t
        .post(
            "/api/reactions/fetch",
            Some(&fan),
            json!({ "nonce": t.nonce(NonceAction::Fetch, 0) }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t.post("/api/reactions/fetch", None, json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_wrong_verb_and_malformed_body() {
    let t = TestApp::new().await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/reactions/fetch")
        .body(Body::empty())
        .unwrap();
    let res = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["message"], response::NOT_SENT_CORRECTLY);

    let (status, body) = t
        .post("/api/reactions/popular", None, json!({ "limit": 1000 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], response::NOT_SENT_CORRECTLY);

    let (status, body) = t
        .post("/api/reactions/fetch", None, json!({ "activity_id": "x" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], response::NOT_SENT_CORRECTLY);
}

#[tokio::test]
async fn test_save_add_and_remove() {
    let t = TestApp::new().await;
    let author = t.db.create_user("author", false).await.unwrap();
    let fan = t.db.create_user("fan", false).await.unwrap();
    let post = t.db.create_activity(author.id, "hello").await.unwrap();
    let nonce = t.nonce(NonceAction::Save, fan.id);

    // Login required
    let (status, body) = t
        .post(
            "/api/reactions/save",
            None,
            json!({ "nonce": nonce, "activity_id": post.id, "reaction": "like" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["message"], response::NOT_ALLOWED);

    for reaction in ["", "wow"] {
        let (status, body) = t
            .post(
                "/api/reactions/save",
                Some(&fan),
                json!({ "nonce": nonce, "activity_id": post.id, "reaction": reaction }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], response::UNKNOWN_ACTION);
    }

    let (status, first) = t
        .post(
            "/api/reactions/save",
            Some(&fan),
            json!({ "nonce": nonce, "activity_id": post.id, "reaction": "like" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let reaction_id = first["data"].as_i64().unwrap();

    let (_, again) = t
        .post(
            "/api/reactions/save",
            Some(&fan),
            json!({ "nonce": nonce, "activity_id": post.id, "reaction": "like", "doaction": "add" }),
        )
        .await;
    assert_eq!(again["data"].as_i64(), Some(reaction_id));
    assert_eq!(
        t.state.reaction_service.stored_count(post.id).await.unwrap(),
        Some(1)
    );

    let (status, removed) = t
        .post(
            "/api/reactions/save",
            Some(&fan),
            json!({ "nonce": nonce, "activity_id": post.id, "reaction": "like", "doaction": "remove" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(removed["data"].as_i64(), Some(reaction_id));
    assert_eq!(
        t.state.reaction_service.stored_count(post.id).await.unwrap(),
        None
    );

    let (status, body) = t
        .post(
            "/api/reactions/save",
            Some(&fan),
            json!({ "nonce": nonce, "activity_id": post.id, "reaction": "like", "doaction": "remove" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], response::SAVE_FAILED);

    let (_, body) = t
        .post(
            "/api/reactions/save",
            Some(&fan),
            json!({ "nonce": nonce, "activity_id": 9999, "reaction": "like" }),
        )
        .await;
    assert_eq!(body["error"]["message"], response::SAVE_FAILED);
}

#[tokio::test]
async fn test_migrate_step() {
    let t = TestApp::new().await;
    let admin = t.db.create_user("admin", true).await.unwrap();
    let member = t.db.create_user("member", false).await.unwrap();
    let post = t.db.create_activity(member.id, "hello").await.unwrap();
    t.db.set_legacy_favorites(member.id, &[post.id]).await.unwrap();

    let step = |user: &user::Model, id: &str| {
        json!({
            "nonce": t.nonce(NonceAction::Migrate, user.id),
            "id": id,
            "count": 1,
            "done": 0,
            "step": 0,
            "number": 20,
        })
    };

    let (status, body) = t
        .post("/api/reactions/migrate", Some(&member), step(&member, "migrate_favorites"))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["message"], response::TASK_FAILED);
    assert_eq!(body["error"]["id"], "migrate_favorites");

    let (status, body) = t
        .post("/api/reactions/migrate", Some(&admin), step(&admin, "wp_delete_user"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["id"], "wp_delete_user");

    let (status, body) = t
        .post(
            "/api/reactions/migrate",
            Some(&admin),
            json!({ "nonce": t.nonce(NonceAction::Migrate, admin.id), "id": "migrate_favorites" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].get("id").is_none());

    let (status, body) = t
        .post("/api/reactions/migrate", Some(&admin), step(&admin, "migrate_favorites"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({ "done": 1, "callback": "migrate_favorites" }));
    assert_eq!(
        t.state
            .reaction_service
            .user_scope(member.id, "favorite")
            .await
            .unwrap(),
        vec![post.id]
    );

    let (status, body) = t
        .post("/api/reactions/migrate/tasks", Some(&admin), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"], "migrate_favorites");
    assert_eq!(body["data"][0]["count"], 1);
    assert_eq!(body["data"][0]["active"], true);

    let (status, _) = t
        .post("/api/reactions/migrate/tasks", Some(&member), json!({}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_config_depends_on_viewer() {
    let t = TestApp::new().await;
    let admin = t.db.create_user("admin", true).await.unwrap();

    let (status, body) = t.post("/api/reactions/config", None, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["logged_in"], false);
    assert!(data.get("save_nonce").is_none());
    assert!(data.get("migrate_nonce").is_none());
    assert_eq!(data["reactions"][0]["name"], "favorite");
    assert_eq!(data["reactions"][1]["label"], "Likes");
    assert_eq!(data["emojis"][0]["id"], "0x1F602");

    let fetch_nonce = data["fetch_nonce"].as_str().unwrap();
    assert!(t.state.nonces.verify(fetch_nonce, NonceAction::Fetch, 0));

    let (_, body) = t.post("/api/reactions/config", Some(&admin), json!({})).await;
    let save_nonce = body["data"]["save_nonce"].as_str().unwrap();
    assert!(t.state.nonces.verify(save_nonce, NonceAction::Save, admin.id));
    assert!(body["data"]["migrate_nonce"].is_string());
}

#[tokio::test]
async fn test_settings_drive_profile_nav() {
    let t = TestApp::new().await;
    let admin = t.db.create_user("admin", true).await.unwrap();
    let member = t.db.create_user("member", false).await.unwrap();

    let (_, body) = t
        .post("/api/reactions/nav", None, json!({ "user_id": member.id }))
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(
        body["data"][1]["link"],
        "https://example.com/members/member/activity/like/"
    );

    let (status, _) = t
        .post(
            "/api/reactions/settings/update",
            Some(&member),
            json!({ "unique_subnav": true }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = t
        .post(
            "/api/reactions/settings/update",
            Some(&admin),
            json!({ "unique_subnav": true }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["unique_subnav"], true);

    let (_, body) = t
        .post("/api/reactions/settings", Some(&admin), json!({}))
        .await;
    assert_eq!(body["data"]["disable_replace_favorites"], false);

    let (_, body) = t
        .post("/api/reactions/nav", None, json!({ "user_id": member.id }))
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["slug"], "reactions");

    let (status, _) = t
        .post("/api/reactions/nav", None, json!({ "user_id": 9999 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_listings_and_popular() {
    let t = TestApp::new().await;
    let author = t.db.create_user("author", false).await.unwrap();
    let fan = t.db.create_user("fan", false).await.unwrap();
    let quiet = t.db.create_activity(author.id, "quiet").await.unwrap();
    let loud = t.db.create_activity(author.id, "loud").await.unwrap();

    let svc = &t.state.reaction_service;
    svc.add(quiet.id, "favorite", fan.id, AddOptions::default())
        .await
        .unwrap();
    svc.add(loud.id, "like", fan.id, AddOptions::default())
        .await
        .unwrap();
    svc.add(loud.id, "like", author.id, AddOptions::default())
        .await
        .unwrap();

    let (_, body) = t
        .post(
            "/api/reactions/user",
            None,
            json!({ "user_id": fan.id, "scope": "reactions" }),
        )
        .await;
    assert_eq!(body["data"], json!([loud.id, quiet.id]));

    let (_, body) = t
        .post(
            "/api/reactions/user",
            None,
            json!({ "user_id": fan.id, "scope": "favorite" }),
        )
        .await;
    assert_eq!(body["data"], json!([quiet.id]));

    let (_, body) = t
        .post(
            "/api/reactions/user",
            None,
            json!({ "user_id": fan.id, "scope": "nope" }),
        )
        .await;
    assert_eq!(body["data"], json!([]));

    let (_, body) = t.post("/api/reactions/popular", None, json!({})).await;
    assert_eq!(
        body["data"],
        json!([
            { "activity_id": loud.id, "count": 2 },
            { "activity_id": quiet.id, "count": 1 },
        ])
    );
}

#[tokio::test]
async fn test_notifications_flow() {
    let t = TestApp::new().await;
    let author = t.db.create_user("author", false).await.unwrap();
    let fan = t.db.create_user("fan", false).await.unwrap();
    let post = t.db.create_activity(author.id, "hello").await.unwrap();

    let (status, _) = t
        .post(
            "/api/reactions/save",
            Some(&fan),
            json!({
                "nonce": t.nonce(NonceAction::Save, fan.id),
                "activity_id": post.id,
                "reaction": "like",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = t
        .post("/api/reactions/notifications", Some(&author), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["text"], "Fan reacted to one of your activities");
    assert_eq!(body["data"][0]["item_id"], post.id);

    let (_, body) = t
        .post(
            "/api/reactions/notifications/read",
            Some(&author),
            json!({ "activity_id": post.id }),
        )
        .await;
    assert_eq!(body["data"]["updated"], 1);

    let (_, body) = t
        .post("/api/reactions/notifications", Some(&author), json!({}))
        .await;
    assert_eq!(body["data"], json!([]));

    let (status, _) = t
        .post("/api/reactions/notifications", None, json!({}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
