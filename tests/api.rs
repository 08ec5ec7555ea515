use alumni_portal::{
    auth::{
        extractors::{ADMIN_REQUIRED, BLOCKED, PENDING_VERIFICATION, REJECTED_VERIFICATION},
        jwt::TOKEN_TTL,
        services::{seed_admin, INVALID_CREDENTIALS},
    },
    build_app,
    config::AdminSeed,
    AppConfig, AppState,
};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use time::{Duration, OffsetDateTime};
use tower::ServiceExt;
use uuid::Uuid;

const ADMIN_PASSWORD: &str = "12345678";

struct TestApp {
    app: Router,
    state: AppState,
}

async fn spawn_app() -> TestApp {
    let state = AppState::in_memory(AppConfig::for_tests("api-test-secret"));
    seed_admin(
        &state,
        &AdminSeed {
            email: "admin".into(),
            name: "Administrator".into(),
            password: ADMIN_PASSWORD.into(),
        },
    )
    .await
    .expect("seed admin");
    TestApp {
        app: build_app(state.clone()),
        state,
    }
}

impl TestApp {
    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();

        let resp = self.app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "name": name, "email": email, "password": password })),
        )
        .await
    }

    async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    async fn admin_token(&self) -> String {
        let (status, body) = self.login("admin", ADMIN_PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Registers a member and returns (id, token).
    async fn member(&self, email: &str) -> (String, String) {
        let (status, body) = self.register("Member", email, "pw123456").await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        (
            body["user"]["id"].as_str().unwrap().to_string(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    async fn verify(&self, admin: &str, user_id: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Method::PUT,
            &format!("/users/{user_id}/verify"),
            Some(admin),
            Some(body),
        )
        .await
    }
}

#[tokio::test]
async fn health_is_open() {
    let t = spawn_app().await;
    let resp = t
        .app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn register_creates_pending_member_with_token() {
    let t = spawn_app().await;
    let (status, body) = t.register("Alice", "Alice@Example.com", "pw123456").await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["token"].as_str().is_some_and(|s| !s.is_empty()));
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert_eq!(body["user"]["verification_status"], "pending");
    assert_eq!(body["user"]["is_admin"], false);
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
async fn register_rejects_duplicate_email_case_insensitively() {
    let t = spawn_app().await;
    t.member("bob@example.com").await;
    let (status, body) = t.register("Bob 2", "BOB@example.com", "pw123456").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn register_validates_input() {
    let t = spawn_app().await;
    let (status, _) = t.register("", "x@example.com", "pw123456").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = t.register("X", "not-an-email", "pw123456").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = t.register("X", "x@example.com", "short").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn seeded_admin_logs_in_approved() {
    let t = spawn_app().await;
    let (status, body) = t.login("admin", ADMIN_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["is_admin"], true);
    assert_eq!(body["user"]["verification_status"], "approved");
    assert!(body["user"]["last_login_at"].is_string());
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let t = spawn_app().await;
    t.member("carol@example.com").await;

    let (s1, b1) = t.login("carol@example.com", "wrong-password").await;
    let (s2, b2) = t.login("nobody@example.com", "wrong-password").await;

    assert_eq!(s1, StatusCode::UNAUTHORIZED);
    assert_eq!(s2, StatusCode::UNAUTHORIZED);
    assert_eq!(b1["message"], INVALID_CREDENTIALS);
    assert_eq!(b1, b2);
}

#[tokio::test]
async fn pending_member_cannot_post_until_approved() {
    let t = spawn_app().await;
    let (alice_id, alice) = t.member("alice@example.com").await;

    let (status, body) = t
        .send(
            Method::POST,
            "/posts",
            Some(&alice),
            Some(json!({ "content": "hello" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], PENDING_VERIFICATION);

    let (_, posts) = t.send(Method::GET, "/posts", Some(&alice), None).await;
    assert_eq!(posts.as_array().map(Vec::len), Some(0));

    let admin = t.admin_token().await;
    let (status, body) = t
        .verify(&admin, &alice_id, json!({ "status": "approved" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["verification_status"], "approved");

    let (status, body) = t
        .send(
            Method::POST,
            "/posts",
            Some(&alice),
            Some(json!({ "content": "hello" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["content"], "hello");

    let (_, posts) = t.send(Method::GET, "/posts", Some(&alice), None).await;
    assert_eq!(posts.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn rejected_member_sees_rejection_message() {
    let t = spawn_app().await;
    let (id, token) = t.member("dan@example.com").await;
    let admin = t.admin_token().await;

    let (status, body) = t
        .verify(
            &admin,
            &id,
            json!({ "status": "rejected", "remarks": "  not an alum  " }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rejection_remarks"], "not an alum");

    let (status, body) = t
        .send(
            Method::POST,
            "/jobs",
            Some(&token),
            Some(json!({ "title": "Dev", "company": "Acme", "description": "Rust" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], REJECTED_VERIFICATION);

    let (status, jobs) = t.send(Method::GET, "/jobs", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(jobs.as_array().map(Vec::len), Some(0));

    let (status, _) = t.verify(&admin, &id, json!({ "status": "approved" })).await;
    assert_eq!(status, StatusCode::OK);
    let (_, me) = t.send(Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(me["verification_status"], "approved");
    assert!(me["rejection_remarks"].is_null());
}

#[tokio::test]
async fn blocked_member_is_rejected_everywhere() {
    let t = spawn_app().await;
    let (id, token) = t.member("eve@example.com").await;
    let admin = t.admin_token().await;

    let (status, _) = t.verify(&admin, &id, json!({ "status": "blocked" })).await;
    assert_eq!(status, StatusCode::OK);

    for (method, uri) in [
        (Method::GET, "/auth/me"),
        (Method::GET, "/posts"),
        (Method::GET, "/jobs"),
        (Method::GET, "/auth/pending"),
    ] {
        let (status, body) = t.send(method, uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
        assert_eq!(body["message"], BLOCKED, "{uri}");
    }

    let (status, body) = t.login("eve@example.com", "pw123456").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], BLOCKED);
}

#[tokio::test]
async fn admin_routes_refuse_members() {
    let t = spawn_app().await;
    let (id, token) = t.member("frank@example.com").await;

    let (status, body) = t.send(Method::GET, "/auth/pending", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], ADMIN_REQUIRED);

    let (status, _) = t.send(Method::GET, "/users/stats", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t
        .verify(&token, &id, json!({ "status": "approved" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_cannot_be_blocked_or_rejected() {
    let t = spawn_app().await;
    let admin = t.admin_token().await;
    let (_, me) = t.send(Method::GET, "/auth/me", Some(&admin), None).await;
    let admin_id = me["id"].as_str().unwrap().to_string();

    for status in ["blocked", "rejected"] {
        let (code, _) = t
            .verify(&admin, &admin_id, json!({ "status": status }))
            .await;
        assert_eq!(code, StatusCode::FORBIDDEN, "{status}");
    }
}

#[tokio::test]
async fn verify_rejects_pending_target_and_unknown_user() {
    let t = spawn_app().await;
    let admin = t.admin_token().await;
    let (id, _) = t.member("gina@example.com").await;

    let (status, _) = t.verify(&admin, &id, json!({ "status": "pending" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = t
        .verify(
            &admin,
            &Uuid::new_v4().to_string(),
            json!({ "status": "approved" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn pending_queue_and_stats() {
    let t = spawn_app().await;
    let admin = t.admin_token().await;
    let (a, _) = t.member("h1@example.com").await;
    t.member("h2@example.com").await;
    let (c, _) = t.member("h3@example.com").await;

    t.verify(&admin, &a, json!({ "status": "approved" })).await;
    t.verify(&admin, &c, json!({ "status": "blocked" })).await;

    let (status, pending) = t.send(Method::GET, "/auth/pending", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let pending = pending.as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["email"], "h2@example.com");

    let (status, stats) = t.send(Method::GET, "/users/stats", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    // the seeded admin counts as approved
    assert_eq!(stats["approved"], 2);
    assert_eq!(stats["pending"], 1);
    assert_eq!(stats["rejected"], 0);
    assert_eq!(stats["blocked"], 1);
}

#[tokio::test]
async fn profile_update_returns_fresh_user() {
    let t = spawn_app().await;
    let (_, token) = t.member("ivy@example.com").await;

    let (status, body) = t
        .send(
            Method::PUT,
            "/auth/profile",
            Some(&token),
            Some(json!({ "name": " Ivy ", "graduation_year": 2012, "company": "Acme" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["name"], "Ivy");
    assert_eq!(body["graduation_year"], 2012);
    assert_eq!(body["company"], "Acme");
    assert_eq!(body["verification_status"], "pending");

    let (status, _) = t
        .send(
            Method::PUT,
            "/auth/profile",
            Some(&token),
            Some(json!({ "graduation_year": 12 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn password_change_requires_current_password() {
    let t = spawn_app().await;
    let (_, token) = t.member("jack@example.com").await;

    let (status, _) = t
        .send(
            Method::PUT,
            "/auth/password",
            Some(&token),
            Some(json!({ "current_password": "nope-nope", "new_password": "newpass123" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t
        .send(
            Method::PUT,
            "/auth/password",
            Some(&token),
            Some(json!({ "current_password": "pw123456", "new_password": "newpass123" })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = t.login("jack@example.com", "pw123456").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = t.login("jack@example.com", "newpass123").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn missing_or_bad_tokens_are_unauthenticated() {
    let t = spawn_app().await;

    let (status, body) = t.send(Method::GET, "/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");

    let (status, _) = t.send(Method::GET, "/posts", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (id, _) = t.member("kim@example.com").await;
    let id: Uuid = id.parse().unwrap();
    let stale = t
        .state
        .jwt
        .issue_at(id, OffsetDateTime::now_utc() - TOKEN_TTL - Duration::seconds(1))
        .unwrap();
    let (status, _) = t.send(Method::GET, "/auth/me", Some(&stale), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_for_unknown_subject_is_unauthenticated() {
    let t = spawn_app().await;
    let token = t.state.jwt.issue(Uuid::new_v4()).unwrap();
    let (status, _) = t.send(Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn comments_follow_the_same_gates() {
    let t = spawn_app().await;
    let admin = t.admin_token().await;
    let (_, post) = t
        .send(
            Method::POST,
            "/posts",
            Some(&admin),
            Some(json!({ "content": "welcome" })),
        )
        .await;
    let post_id = post["id"].as_str().unwrap().to_string();
    let (_, member) = t.member("lee@example.com").await;
    let uri = format!("/posts/{post_id}/comments");

    let (status, _) = t
        .send(Method::POST, &uri, Some(&member), Some(json!({ "content": "hi" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t
        .send(Method::POST, &uri, Some(&admin), Some(json!({ "content": "hi" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, comments) = t.send(Method::GET, &uri, Some(&member), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(comments.as_array().map(Vec::len), Some(1));

    let missing = format!("/posts/{}/comments", Uuid::new_v4());
    let (status, _) = t.send(Method::GET, &missing, Some(&member), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_input_gets_json_validation_errors() {
    let t = spawn_app().await;

    let (status, body) = t
        .send(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "name": "A", "email": "a@b.co" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"]
        .as_str()
        .is_some_and(|m| m.contains("password")));

    let req = Request::post("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("not json"))
        .unwrap();
    let resp = t.app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "validation_error");

    let admin = t.admin_token().await;
    let (status, body) = t
        .verify(&admin, "not-a-uuid", json!({ "status": "approved" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = t
        .verify(&admin, &Uuid::new_v4().to_string(), json!({ "status": "vip" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = t
        .send(Method::GET, "/posts?limit=lots", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}
