//! Dashboard configuration.

use serde::{Deserialize, Serialize};

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allow cross-origin requests from any origin.
    #[serde(default = "default_cors_permissive")]
    pub cors_permissive: bool,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_cors_permissive() -> bool {
    true
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            cors_permissive: default_cors_permissive(),
        }
    }
}

impl DashboardConfig {
    /// `bind:port` for the listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Longest session lifetime the server accepts: 30 days.
pub const MAX_SESSION_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Session and account configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// When false every request is treated as an admin session.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_admin_email")]
    pub admin_email: String,
    #[serde(default = "default_admin_name")]
    pub admin_name: String,
    #[serde(default = "default_admin_password")]
    pub admin_password: String,
    /// Session lifetime in seconds, at most `MAX_SESSION_TTL_SECS`.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_admin_email() -> String {
    "admin@volatisense.com".to_string()
}

fn default_admin_name() -> String {
    "Admin".to_string()
}

fn default_admin_password() -> String {
    "admin123".to_string()
}

fn default_session_ttl_secs() -> u64 {
    12 * 60 * 60
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            admin_email: default_admin_email(),
            admin_name: default_admin_name(),
            admin_password: default_admin_password(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}
