pub mod advisor;
pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod dev_mode;
pub mod gateway;
pub mod handshake;
pub mod hero_pool;
pub mod metrics;
pub mod platform;
pub mod roster;

pub use bootstrap::MiniApp;
pub use gateway::{Gateway, RemoteError};
