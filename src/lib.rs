//! Song suggestion board for a music group.
//!
//! Users, suggestions and votes live as flat files in a remote repository
//! and are read and written through a small cached repository layer.

pub mod api;
pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod models;
pub mod remote;
pub mod session;
pub mod song_storage;
pub mod stats;
pub mod storage;
pub mod user_models;
pub mod user_storage;
pub mod youtube;

pub use error::{AppError, AppResult, CodecError, StoreError};
pub use session::{Session, SessionStore};
pub use song_storage::SongStorage;
pub use storage::Repository;
pub use user_storage::UserStorage;
