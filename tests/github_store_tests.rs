//! GitHub contents API client against an in-process fake of the API.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use songboard::cache::{ManualClock, DEFAULT_TTL};
use songboard::codec::{FlatFile, USERS_PATH};
use songboard::config::GitHubConfig;
use songboard::remote::{FileStore, GitHubFileStore};
use songboard::user_models::UserTable;
use songboard::{Repository, StoreError, UserStorage};
use std::collections::HashMap;
use std::sync::Arc;

const TOKEN: &str = "test-token";

#[derive(Default)]
struct FakeGitHub {
    files: Mutex<HashMap<String, (String, String)>>,
    revision: Mutex<u64>,
    messages: Mutex<Vec<String>>,
}

#[derive(Deserialize)]
struct PutBody {
    message: String,
    content: String,
    branch: String,
    sha: Option<String>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", TOKEN))
}

async fn get_file(
    State(fake): State<Arc<FakeGitHub>>,
    Path((_owner, _repo, path)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Bad credentials" })));
    }

    let path = path.trim_start_matches('/').to_string();
    let files = fake.files.lock();
    let Some((content, sha)) = files.get(&path) else {
        return (StatusCode::NOT_FOUND, Json(json!({ "message": "Not Found" })));
    };

    // Real responses wrap the payload at 60 columns.
    let encoded = STANDARD.encode(content.as_bytes());
    let wrapped = encoded
        .as_bytes()
        .chunks(60)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join("\n");

    (
        StatusCode::OK,
        Json(json!({ "path": path, "encoding": "base64", "content": wrapped, "sha": sha })),
    )
}

async fn put_file(
    State(fake): State<Arc<FakeGitHub>>,
    Path((_owner, _repo, path)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(body): Json<PutBody>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Bad credentials" })));
    }
    assert_eq!(body.branch, "main");

    let path = path.trim_start_matches('/').to_string();
    let mut files = fake.files.lock();
    let current = files.get(&path).map(|(_, sha)| sha.clone());

    match (&current, &body.sha) {
        (Some(current), Some(given)) if current != given => {
            return (StatusCode::CONFLICT, Json(json!({ "message": "does not match" })));
        }
        (Some(_), None) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "message": "\"sha\" wasn't supplied." })),
            );
        }
        (None, Some(_)) => {
            return (StatusCode::CONFLICT, Json(json!({ "message": "no such file" })));
        }
        _ => {}
    }

    let content = String::from_utf8(STANDARD.decode(&body.content).unwrap()).unwrap();
    let mut revision = fake.revision.lock();
    *revision += 1;
    let sha = format!("sha-{}", revision);

    files.insert(path.clone(), (content, sha.clone()));
    fake.messages.lock().push(body.message);

    let status = if current.is_some() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    (
        status,
        Json(json!({ "content": { "path": path, "sha": sha }, "commit": { "sha": "c0ffee" } })),
    )
}

async fn spawn_fake() -> (String, Arc<FakeGitHub>) {
    let fake = Arc::new(FakeGitHub::default());
    let app = Router::new()
        .route(
            "/repos/:owner/:repo/contents/*path",
            get(get_file).put(put_file),
        )
        .with_state(fake.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", address), fake)
}

fn config(api_url: String, token: Option<&str>) -> GitHubConfig {
    GitHubConfig {
        api_url,
        owner: "band".to_string(),
        repo: "setlist".to_string(),
        branch: "main".to_string(),
        token: token.map(str::to_string),
        timeout_secs: 5,
    }
}

#[tokio::test]
async fn missing_file_is_none() {
    let (url, _fake) = spawn_fake().await;
    let store = GitHubFileStore::new(config(url, Some(TOKEN))).unwrap();

    assert!(store.get("votos.json").await.unwrap().is_none());
}

#[tokio::test]
async fn put_then_get_round_trips_content_and_token() {
    let (url, fake) = spawn_fake().await;
    let store = GitHubFileStore::new(config(url, Some(TOKEN))).unwrap();

    // long enough to be wrapped, with non-ASCII text
    let content = UserTable::bootstrap().encode().unwrap() + &"ñ".repeat(100);
    let token = store
        .put("usuarios.json", &content, None, "Create usuarios.json")
        .await
        .unwrap();

    let file = store.get("usuarios.json").await.unwrap().unwrap();
    assert_eq!(file.content, content);
    assert_eq!(file.token, token);
    assert_eq!(*fake.messages.lock(), vec!["Create usuarios.json".to_string()]);

    // without a token the client probes and updates in place
    let updated = store.put("usuarios.json", "{}", None, "Reset").await.unwrap();
    assert_ne!(updated, token);
    assert_eq!(store.get("usuarios.json").await.unwrap().unwrap().content, "{}");
}

#[tokio::test]
async fn stale_sha_is_a_conflict() {
    let (url, _fake) = spawn_fake().await;
    let store = GitHubFileStore::new(config(url, Some(TOKEN))).unwrap();

    let first = store.put("votos.json", "{}", None, "create").await.unwrap();
    store
        .put("votos.json", r#"{"a": {}}"#, Some(&first), "theirs")
        .await
        .unwrap();

    let err = store
        .put("votos.json", r#"{"b": {}}"#, Some(&first), "ours")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict { ref path } if path == "votos.json"));
}

#[tokio::test]
async fn bad_credentials_surface_as_api_error() {
    let (url, _fake) = spawn_fake().await;
    let store = GitHubFileStore::new(config(url, Some("wrong"))).unwrap();

    let err = store.get("votos.json").await.unwrap_err();
    assert!(matches!(err, StoreError::Api { status: 401, .. }));
}

#[tokio::test]
async fn unreachable_store_is_a_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let store = GitHubFileStore::new(config(format!("http://{}", address), Some(TOKEN))).unwrap();
    let err = store.get("votos.json").await.unwrap_err();
    assert!(matches!(err, StoreError::Network(_)));
}

#[tokio::test]
async fn repository_bootstraps_users_through_github() {
    let (url, fake) = spawn_fake().await;
    let store = Arc::new(GitHubFileStore::new(config(url, Some(TOKEN))).unwrap());
    let repo = Arc::new(Repository::new(
        store.clone(),
        DEFAULT_TTL,
        Arc::new(ManualClock::new(Utc::now())),
    ));

    let users = repo.load_users().await.unwrap();
    assert_eq!(users, UserTable::bootstrap());

    let stored = store.get(USERS_PATH).await.unwrap().unwrap();
    assert_eq!(UserTable::decode(&stored.content).unwrap(), users);

    let accounts = UserStorage::new(repo);
    accounts.change_password("admin", "changed").await.unwrap();
    assert!(accounts.authenticate("admin", "changed").await.unwrap());
    assert_eq!(fake.messages.lock().len(), 2);
}
