pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;

pub use config::{AppConfig, ConfigError};
pub use routes::router;
pub use state::AppState;
