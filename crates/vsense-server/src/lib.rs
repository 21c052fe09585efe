//! VolatiSense risk dashboard server.
//!
//! Wires the stats store, the model pipeline and the session service into
//! the HTTP dashboard.

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
