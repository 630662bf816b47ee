//! JSON HTTP surface over the account and song services.

use crate::error::{AppError, AppResult};
use crate::models::{
    AccountResponse, SongFilter, SongListResponse, SongQuery, SongSuggestion, SuggestionRequest,
    VoteRequest, VoteResponse,
};
use crate::session::{Session, SessionStore};
use crate::song_storage::SongStorage;
use crate::stats::Statistics;
use crate::storage::Repository;
use crate::user_models::{
    ChangePasswordRequest, CreateUserRequest, LoginRequest, LoginResponse, ResetPasswordRequest,
    UserListResponse, UserSummary,
};
use crate::user_storage::UserStorage;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub struct AppState {
    pub users: UserStorage,
    pub songs: SongStorage,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self {
            users: UserStorage::new(repo.clone()),
            songs: SongStorage::new(repo),
            sessions: SessionStore::new(),
        }
    }

    fn session(&self, headers: &HeaderMap) -> AppResult<Session> {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized)?;

        self.sessions.get(token.trim()).ok_or(AppError::Unauthorized)
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(account))
        .route("/me/password", post(change_password))
        .route("/songs", get(list_songs).post(create_song))
        .route("/songs/:video_id/vote", post(vote))
        .route("/stats", get(statistics))
        .route("/admin/users", get(list_users).post(create_user))
        .route("/admin/users/:username/password", post(reset_password))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let session = state
        .users
        .login(payload.username.trim(), &payload.password)
        .await?;

    let user = session.summary();
    let token = state.sessions.open(session);

    Ok(Json(LoginResponse { token, user }))
}

async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> StatusCode {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    {
        state.sessions.close(token.trim());
    }
    StatusCode::NO_CONTENT
}

async fn account(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Json<AccountResponse>> {
    let session = state.session(&headers)?;
    let suggestions = state.songs.songs_by(&session.display_name).await?;

    Ok(Json(AccountResponse {
        user: session.summary(),
        suggestions,
    }))
}

async fn change_password(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    let session = state.session(&headers)?;
    state.users.change_own_password(&session, &payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_songs(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<SongQuery>,
) -> AppResult<Json<SongListResponse>> {
    let session = state.session(&headers)?;
    let filter = SongFilter::from_query(&query).map_err(AppError::Validation)?;
    let songs = state.songs.list_songs(&filter, &session).await?;

    Ok(Json(SongListResponse { songs }))
}

async fn create_song(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<SuggestionRequest>,
) -> AppResult<(StatusCode, Json<SongSuggestion>)> {
    let session = state.session(&headers)?;
    let song = state.songs.submit_suggestion(&session, payload).await?;
    Ok((StatusCode::CREATED, Json(song)))
}

async fn vote(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(video_id): Path<String>,
    Json(payload): Json<VoteRequest>,
) -> AppResult<Json<VoteResponse>> {
    let session = state.session(&headers)?;
    let vote_count = state
        .songs
        .vote(&video_id, &session.username, payload.value)
        .await?;

    Ok(Json(VoteResponse {
        video_id,
        vote_count,
        voted: payload.value,
    }))
}

async fn statistics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Json<Statistics>> {
    state.session(&headers)?;
    Ok(Json(state.songs.statistics().await?))
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Json<UserListResponse>> {
    let session = state.session(&headers)?;
    let users = state.users.list_users(&session).await?;
    Ok(Json(UserListResponse { users }))
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserSummary>)> {
    let session = state.session(&headers)?;
    let user = state.users.create_user(&session, payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(username): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> AppResult<StatusCode> {
    let session = state.session(&headers)?;
    state
        .users
        .reset_password(&session, &username, &payload)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
