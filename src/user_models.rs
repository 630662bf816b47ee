use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin";
pub const DEFAULT_ADMIN_NAME: &str = "Administrador";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "miembro")]
    Member,
    #[serde(rename = "admin")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "miembro",
            Role::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "miembro" | "member" => Ok(Role::Member),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role '{}'. Use 'miembro' or 'admin'", other)),
        }
    }
}

/// One entry of `usuarios.json`. The username is the map key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    #[serde(rename = "password")]
    pub password_hash: String,
    #[serde(rename = "nombre")]
    pub display_name: String,
    #[serde(rename = "rol")]
    pub role: Role,
}

impl UserEntry {
    pub fn new(password: &str, display_name: String, role: Role) -> Self {
        Self {
            password_hash: hash_password(password),
            display_name,
            role,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserTable(pub BTreeMap<String, UserEntry>);

impl UserTable {
    /// Contents written the first time `usuarios.json` is missing.
    pub fn bootstrap() -> Self {
        let mut users = BTreeMap::new();
        users.insert(
            DEFAULT_ADMIN_USERNAME.to_string(),
            UserEntry::new(
                DEFAULT_ADMIN_PASSWORD,
                DEFAULT_ADMIN_NAME.to_string(),
                Role::Admin,
            ),
        );
        Self(users)
    }

    pub fn get(&self, username: &str) -> Option<&UserEntry> {
        self.0.get(username)
    }
}

/// Unsalted SHA-256, hex encoded.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub role: Role,
}

/// What callers get to see of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub username: String,
    pub display_name: String,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserListResponse {
    pub users: Vec<UserSummary>,
}
