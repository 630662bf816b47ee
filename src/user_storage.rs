use crate::error::{AppError, AppResult};
use crate::session::Session;
use crate::storage::Repository;
use crate::user_models::{
    hash_password, ChangePasswordRequest, CreateUserRequest, ResetPasswordRequest, UserEntry,
    UserSummary,
};
use std::sync::Arc;
use tracing::info;

/// Accounts kept in `usuarios.json`.
pub struct UserStorage {
    repo: Arc<Repository>,
}

impl UserStorage {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<bool> {
        let users = self.repo.load_users().await?;
        Ok(users
            .get(username)
            .is_some_and(|user| user.password_hash == hash_password(password)))
    }

    pub async fn login(&self, username: &str, password: &str) -> AppResult<Session> {
        let users = self.repo.load_users().await?;
        let user = users
            .get(username)
            .filter(|user| user.password_hash == hash_password(password))
            .ok_or(AppError::InvalidCredentials)?;

        info!(username, "User logged in");
        Ok(Session {
            username: username.to_string(),
            display_name: user.display_name.clone(),
            role: user.role,
        })
    }

    pub async fn change_password(&self, username: &str, new_password: &str) -> AppResult<()> {
        let _writer = self.repo.write_lock().await;
        self.set_password(username, new_password).await
    }

    async fn set_password(&self, username: &str, new_password: &str) -> AppResult<()> {
        let mut users = self.repo.load_users().await?;
        let user = users
            .0
            .get_mut(username)
            .ok_or_else(|| AppError::UserNotFound(username.to_string()))?;

        user.password_hash = hash_password(new_password);
        self.repo.save_users(&users).await?;

        info!(username, "Password changed");
        Ok(())
    }

    pub async fn change_own_password(
        &self,
        session: &Session,
        request: &ChangePasswordRequest,
    ) -> AppResult<()> {
        let _writer = self.repo.write_lock().await;
        if !self
            .authenticate(&session.username, &request.current_password)
            .await?
        {
            return Err(AppError::validation("Current password is incorrect"));
        }
        check_new_password(&request.new_password, &request.confirm_password)?;

        self.set_password(&session.username, &request.new_password)
            .await
    }

    pub async fn reset_password(
        &self,
        admin: &Session,
        username: &str,
        request: &ResetPasswordRequest,
    ) -> AppResult<()> {
        admin.require_admin()?;
        check_new_password(&request.new_password, &request.confirm_password)?;

        let _writer = self.repo.write_lock().await;
        self.set_password(username, &request.new_password).await
    }

    pub async fn create_user(
        &self,
        admin: &Session,
        request: CreateUserRequest,
    ) -> AppResult<UserSummary> {
        admin.require_admin()?;

        let username = request.username.trim().to_string();
        let display_name = request.display_name.trim().to_string();
        if username.is_empty() || request.password.is_empty() || display_name.is_empty() {
            return Err(AppError::validation(
                "Username, password and display name are all required",
            ));
        }

        let _writer = self.repo.write_lock().await;
        let mut users = self.repo.load_users().await?;
        if users.0.contains_key(&username) {
            return Err(AppError::UserExists(username));
        }

        let entry = UserEntry::new(&request.password, display_name, request.role);
        let summary = summarize(&username, &entry);
        users.0.insert(username.clone(), entry);
        self.repo.save_users(&users).await?;

        info!(username = %username, role = request.role.as_str(), "User created");
        Ok(summary)
    }

    pub async fn list_users(&self, admin: &Session) -> AppResult<Vec<UserSummary>> {
        admin.require_admin()?;

        let users = self.repo.load_users().await?;
        Ok(users
            .0
            .iter()
            .map(|(username, user)| summarize(username, user))
            .collect())
    }
}

fn check_new_password(new_password: &str, confirm: &str) -> AppResult<()> {
    if new_password.is_empty() {
        return Err(AppError::validation("New password cannot be empty"));
    }
    if new_password != confirm {
        return Err(AppError::validation("Passwords do not match"));
    }
    Ok(())
}

fn summarize(username: &str, user: &UserEntry) -> UserSummary {
    UserSummary {
        username: username.to_string(),
        display_name: user.display_name.clone(),
        role: user.role,
    }
}
