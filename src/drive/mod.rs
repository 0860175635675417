pub mod auth;
pub mod client;
pub mod error;
pub mod walker;

pub use auth::{token_provider_from_config, ServiceAccountAuth, StaticToken, TokenProvider};
pub use client::{DriveApi, DriveClient, DriveFile, FilePage, ShortcutDetails};
pub use error::DriveError;
pub use walker::{FolderWalker, ROOT_ALIAS};
