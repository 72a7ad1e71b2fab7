pub mod api;
pub mod comments;
pub mod config;
pub mod database;
pub mod engagement;
pub mod error;
pub mod fanout;
pub mod identity;
pub mod moderation;
pub mod telemetry;
pub mod utils;
