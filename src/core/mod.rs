pub mod access;
pub mod config;

pub use access::{AccessControl, AllowList, PairingDirectory, UserId, UserIdentity};
pub use config::AppConfig;
