//! Request and response bodies.

use crate::auth::UserProfile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vsense_stats::BatchReport;

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupResponse {
    pub message: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserProfile,
}

/// `POST /stats/generate-all` body.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateAllResponse {
    pub message: String,
    #[serde(flatten)]
    pub report: BatchReport,
}

/// `POST /pipeline/update` success body.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateResponse {
    pub message: String,
    pub logs: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusQuery {
    #[serde(default)]
    pub since: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub records: usize,
}
