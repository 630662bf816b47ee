//! End-to-end through the HTTP router with an in-memory store.

mod common;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use songboard::api::{router, AppState};
use std::sync::Arc;

struct TestServer {
    base: String,
    client: Client,
}

impl TestServer {
    async fn start() -> Self {
        let h = common::harness();
        let app = router(Arc::new(AppState::new(h.repo)));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{}", address),
            client: Client::new(),
        }
    }

    async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .client
            .post(format!("{}/login", self.base))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = response.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    async fn post(&self, token: &str, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base, path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn get(&self, token: &str, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base, path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn member_suggests_and_votes() {
    let server = TestServer::start().await;
    let admin = server.login("admin", "admin").await;

    let response = server
        .post(
            &admin,
            "/admin/users",
            json!({ "username": "luis", "password": "pw", "display_name": "Luis", "role": "miembro" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let luis = server.login("luis", "pw").await;

    let response = server
        .post(
            &luis,
            "/songs",
            json!({
                "url": "https://youtu.be/dQw4w9WgXcQ",
                "title": "Never Gonna Give You Up",
                "artist": "Rick Astley",
                "genre": "Pop",
                "difficulty": "Intermedia"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let song: Value = response.json().await.unwrap();
    assert_eq!(song["youtube_id"], "dQw4w9WgXcQ");
    assert_eq!(song["sugerido_por"], "Luis");

    let response = server
        .post(
            &admin,
            "/songs",
            json!({ "url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ", "genre": "Rock", "difficulty": "easy" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = server
        .post(&admin, "/songs/dQw4w9WgXcQ/vote", json!({ "value": true }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let vote: Value = response.json().await.unwrap();
    assert_eq!(vote["vote_count"], 1);
    assert_eq!(vote["voted"], true);

    let listing: Value = server
        .get(&admin, "/songs?sort=most_voted&genre=Pop")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(listing["songs"][0]["votos_count"], 1);
    assert_eq!(listing["songs"][0]["voted"], true);

    let account: Value = server.get(&luis, "/me").await.json().await.unwrap();
    assert_eq!(account["user"]["username"], "luis");
    assert_eq!(account["suggestions"].as_array().unwrap().len(), 1);

    let stats: Value = server.get(&luis, "/stats").await.json().await.unwrap();
    assert_eq!(stats["total_songs"], 1);
}

#[tokio::test]
async fn requests_without_a_session_are_unauthorized() {
    let server = TestServer::start().await;

    let response = server.get("made-up", "/songs").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = server
        .client
        .post(format!("{}/login", server.base))
        .json(&json!({ "username": "admin", "password": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn members_get_forbidden_on_admin_routes() {
    let server = TestServer::start().await;
    let admin = server.login("admin", "admin").await;
    server
        .post(
            &admin,
            "/admin/users",
            json!({ "username": "marta", "password": "pw", "display_name": "Marta", "role": "miembro" }),
        )
        .await;

    let marta = server.login("marta", "pw").await;
    let response = server.get(&marta, "/admin/users").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = server.get(&admin, "/admin/users").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn logout_forgets_the_token() {
    let server = TestServer::start().await;
    let admin = server.login("admin", "admin").await;

    let response = server.post(&admin, "/logout", json!({})).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = server.get(&admin, "/stats").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bad_filters_are_rejected() {
    let server = TestServer::start().await;
    let admin = server.login("admin", "admin").await;

    let response = server.get(&admin, "/songs?difficulty=impossible").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
