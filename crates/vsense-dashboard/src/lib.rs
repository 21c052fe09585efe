//! vsense-dashboard - HTTP API and browser dashboard for VolatiSense.
//!
//! Serves the risk statistics, batch generation and pipeline endpoints, the
//! session endpoints, and two static pages:
//!
//! ```text
//!  GET  /                      dashboard page
//!  GET  /admin                 admin page (model update + live log)
//!  GET  /stats/{ticker}        stored or synthesized stats      (session)
//!  POST /stats/generate-all    create missing placeholder stats (session)
//!  GET  /tickers               configured tickers               (session)
//!  POST /pipeline/update       run fetch → train                (admin)
//!  GET  /pipeline/status       state + log tail from ?since=N   (admin)
//!  POST /auth/{signup,login,logout}, GET /auth/me
//!  GET  /health, /metrics
//! ```

mod auth;
mod config;
mod error;
mod server;
mod types;

pub use auth::{AdminSession, AuthService, CurrentSession, Role, Session, UserProfile};
pub use config::{AuthConfig, DashboardConfig, MAX_SESSION_TTL_SECS};
pub use error::{ApiError, ApiResult, AuthError, AuthResult};
pub use server::{create_router, run_server, AppState};
pub use types::{
    GenerateAllResponse, HealthResponse, LoginRequest, LoginResponse, SignupRequest,
    SignupResponse, StatusQuery, UpdateResponse,
};
