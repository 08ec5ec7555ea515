pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod jobs;
pub mod logging;
pub mod notify;
pub mod posts;
pub mod state;
pub mod users;

pub use app::{build_app, serve};
pub use config::AppConfig;
pub use error::AppError;
pub use state::AppState;
