//! Accounts and server-side sessions.
//!
//! Passwords are kept as salted SHA-256 digests. Sessions are opaque UUIDv4
//! bearer tokens with a fixed lifetime, held in memory.

use crate::config::AuthConfig;
use crate::error::{ApiError, AuthError, AuthResult};
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header;
use axum::http::request::Parts;
use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use vsense_telemetry::Metrics;

const MIN_PASSWORD_LEN: usize = 6;

/// Unanchored, like the signup form's own check.
static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\S+@\S+\.\S+").expect("valid email regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

/// Public view of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

struct Account {
    profile: UserProfile,
    salt: String,
    digest: String,
}

impl Account {
    fn new(profile: UserProfile, password: &str) -> Self {
        let mut salt = [0u8; 16];
        rand::thread_rng().fill(&mut salt);
        let salt = hex::encode(salt);
        let digest = hash_password(&salt, password);
        Self {
            profile,
            salt,
            digest,
        }
    }

    fn verify(&self, password: &str) -> bool {
        let candidate = hash_password(&self.salt, password);
        constant_time_eq(candidate.as_bytes(), self.digest.as_bytes())
    }
}

/// An authenticated session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Account registry and session store.
pub struct AuthService {
    config: AuthConfig,
    accounts: DashMap<String, Account>,
    sessions: DashMap<String, Session>,
}

impl AuthService {
    /// Create the service with the configured admin account.
    pub fn new(config: AuthConfig) -> Self {
        let accounts = DashMap::new();
        let email = normalize_email(&config.admin_email);
        accounts.insert(
            email.clone(),
            Account::new(
                UserProfile {
                    name: config.admin_name.clone(),
                    email,
                    role: Role::Admin,
                },
                &config.admin_password,
            ),
        );
        Self {
            config,
            accounts,
            sessions: DashMap::new(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// Expiry for a session issued at `now`.
    ///
    /// A lifetime beyond what chrono can represent saturates instead of
    /// overflowing.
    fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        i64::try_from(self.config.session_ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Register a user account.
    pub fn signup(&self, name: &str, email: &str, password: &str) -> AuthResult<UserProfile> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::Invalid("Name is required".to_string()));
        }
        if !is_valid_email(email) {
            return Err(AuthError::Invalid("Invalid email address".to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Invalid(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let email = normalize_email(email);
        let profile = UserProfile {
            name: name.to_string(),
            email: email.clone(),
            role: Role::User,
        };

        match self.accounts.entry(email) {
            Entry::Occupied(_) => Err(AuthError::DuplicateEmail),
            Entry::Vacant(slot) => {
                slot.insert(Account::new(profile.clone(), password));
                info!(email = %profile.email, "Account created");
                Ok(profile)
            }
        }
    }

    /// Verify credentials and issue a session.
    pub fn login(&self, email: &str, password: &str) -> AuthResult<Session> {
        let email = normalize_email(email);
        let profile = match self.accounts.get(&email) {
            Some(account) if account.verify(password) => account.profile.clone(),
            _ => {
                warn!(email = %email, "Login failed");
                return Err(AuthError::InvalidCredentials);
            }
        };

        self.purge_expired();
        let session = Session {
            token: Uuid::new_v4().to_string(),
            user: profile,
            expires_at: self.expires_at(Utc::now()),
        };
        self.sessions.insert(session.token.clone(), session.clone());
        Metrics::active_sessions(self.sessions.len());
        info!(email = %session.user.email, role = ?session.user.role, "Session issued");
        Ok(session)
    }

    /// Revoke a session. Returns whether it existed.
    pub fn logout(&self, token: &str) -> bool {
        let removed = self.sessions.remove(token).is_some();
        Metrics::active_sessions(self.sessions.len());
        removed
    }

    /// Resolve a bearer token to its session.
    pub fn authenticate(&self, token: &str) -> AuthResult<Session> {
        let session = self
            .sessions
            .get(token)
            .map(|s| s.value().clone())
            .ok_or(AuthError::MissingToken)?;

        if session.is_expired(Utc::now()) {
            self.sessions.remove(token);
            Metrics::active_sessions(self.sessions.len());
            debug!(email = %session.user.email, "Session expired");
            return Err(AuthError::Expired);
        }
        Ok(session)
    }

    /// Resolve an `Authorization` header value.
    ///
    /// With sessions disabled every caller gets an admin session.
    pub fn authorize(&self, header_value: Option<&str>) -> AuthResult<Session> {
        if !self.enabled() {
            return Ok(self.anonymous_admin());
        }
        let token = header_value
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;
        self.authenticate(token)
    }

    fn anonymous_admin(&self) -> Session {
        Session {
            token: String::new(),
            user: UserProfile {
                name: self.config.admin_name.clone(),
                email: normalize_email(&self.config.admin_email),
                role: Role::Admin,
            },
            expires_at: self.expires_at(Utc::now()),
        }
    }

    /// Drop expired sessions.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, s| !s.is_expired(now));
        let purged = before.saturating_sub(self.sessions.len());
        if purged > 0 {
            Metrics::active_sessions(self.sessions.len());
        }
        purged
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_valid_email(email: &str) -> bool {
    EMAIL_SHAPE.is_match(email)
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Extractor for any valid session.
pub struct CurrentSession(pub Session);

impl<S> FromRequestParts<S> for CurrentSession
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = Arc::<AuthService>::from_ref(state);
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        Ok(CurrentSession(auth.authorize(header_value)?))
    }
}

/// Extractor for an admin session.
pub struct AdminSession(pub Session);

impl<S> FromRequestParts<S> for AdminSession
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentSession(session) = CurrentSession::from_request_parts(parts, state).await?;
        if !session.user.is_admin() {
            warn!(email = %session.user.email, "Admin endpoint refused");
            return Err(AuthError::AdminRequired.into());
        }
        Ok(AdminSession(session))
    }
}
