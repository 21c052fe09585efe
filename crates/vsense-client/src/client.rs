//! HTTP client for the dashboard API.

use crate::error::{ClientError, ClientResult};
use crate::view::{StatsView, TickerView};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default timeout for ordinary requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for `update_model`, which waits for both pipeline stages.
const UPDATE_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

const LOAD_FAILED: &str = "Failed to load model data";

/// Shown after missing data has been generated.
pub const RETRY_INSTRUCTION: &str = "Stats generated successfully! Click Analyze Risk again.";

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserInfo {
    pub name: String,
    pub email: String,
    pub role: String,
}

impl UserInfo {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginSession {
    pub token: String,
    pub expires_at: String,
    pub user: UserInfo,
}

/// A configured ticker from `GET /tickers`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerOption {
    pub ticker: String,
    pub label: String,
    pub trained: bool,
    pub has_stats: bool,
}

/// Summary of `POST /stats/generate-all`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateSummary {
    pub message: String,
    pub created: usize,
    pub exists: usize,
    #[serde(default)]
    pub failed: usize,
}

impl GenerateSummary {
    /// What to tell the user next.
    pub fn instruction(&self) -> &'static str {
        RETRY_INSTRUCTION
    }
}

/// Result of `POST /pipeline/update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Succeeded { message: String, logs: String },
    Failed { error: String, logs: String },
}

impl UpdateOutcome {
    pub fn logs(&self) -> &str {
        match self {
            UpdateOutcome::Succeeded { logs, .. } | UpdateOutcome::Failed { logs, .. } => logs,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UpdateBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    logs: String,
}

/// Pipeline progress from `GET /pipeline/status`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineProgress {
    pub run_id: Option<u64>,
    pub state: String,
    pub logs: String,
    pub offset: usize,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
}

impl PipelineProgress {
    pub fn is_running(&self) -> bool {
        matches!(self.state.as_str(), "fetching" | "training")
    }
}

/// Client for the dashboard API.
pub struct DashboardClient {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl DashboardClient {
    /// Create a client for the server at `base_url` (e.g. `http://localhost:5000`).
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let base = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Http(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base,
            token: None,
        })
    }

    /// Use an existing session token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> ClientResult<RequestBuilder> {
        let builder = self.client.request(method, self.url(segments)?);
        Ok(match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send(builder: RequestBuilder) -> ClientResult<Response> {
        builder
            .send()
            .await
            .map_err(|e| ClientError::Http(format!("HTTP request failed: {e}")))
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                message: error_message(response).await,
            });
        }
        response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }

    /// Log in and keep the session token for later calls.
    pub async fn login(&mut self, email: &str, password: &str) -> ClientResult<LoginSession> {
        let builder = self
            .request(Method::POST, &["auth", "login"])?
            .json(&Credentials { email, password });
        let session: LoginSession = Self::parse(Self::send(builder).await?).await?;
        info!(email = %session.user.email, role = %session.user.role, "Logged in");
        self.token = Some(session.token.clone());
        Ok(session)
    }

    /// Revoke the current session.
    pub async fn logout(&mut self) -> ClientResult<()> {
        if self.token.is_none() {
            return Ok(());
        }
        let response = Self::send(self.request(Method::POST, &["auth", "logout"])?).await?;
        let _: Value = Self::parse(response).await?;
        self.token = None;
        Ok(())
    }

    /// Load the risk statistics for `ticker`.
    ///
    /// Never fails: a missing record becomes `TickerView::Missing` and every
    /// other problem becomes `TickerView::Failed` with a displayable message.
    pub async fn load_ticker(&self, ticker: &str) -> TickerView {
        let response = match self.request(Method::GET, &["stats", ticker]) {
            Ok(builder) => Self::send(builder).await,
            Err(e) => Err(e),
        };
        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!(ticker, error = %e, "Stats request failed");
                return TickerView::Failed {
                    message: LOAD_FAILED.to_string(),
                };
            }
        };

        let status = response.status();
        debug!(ticker, status = status.as_u16(), "Stats response");

        if status == StatusCode::NOT_FOUND {
            return TickerView::Missing {
                ticker: ticker.to_string(),
                message: format!("No data available for {ticker}. Try generating stats first."),
            };
        }
        if !status.is_success() {
            return TickerView::Failed {
                message: error_message(response).await,
            };
        }

        match response.json::<Value>().await {
            Ok(body) if body.is_object() => {
                TickerView::Loaded(Box::new(StatsView::from_json(ticker, &body)))
            }
            Ok(_) => TickerView::Failed {
                message: "Empty response received".to_string(),
            },
            Err(e) => {
                warn!(ticker, error = %e, "Stats response is not JSON");
                TickerView::Failed {
                    message: LOAD_FAILED.to_string(),
                }
            }
        }
    }

    /// Create placeholder stats for every configured ticker that has none.
    pub async fn generate_missing_data(&self) -> ClientResult<GenerateSummary> {
        let builder = self.request(Method::POST, &["stats", "generate-all"])?;
        let summary: GenerateSummary = Self::parse(Self::send(builder).await?).await?;
        info!(
            created = summary.created,
            exists = summary.exists,
            failed = summary.failed,
            "Missing data generated"
        );
        Ok(summary)
    }

    /// Run the fetch → train pipeline and wait for it to finish.
    ///
    /// A stage failure is an `UpdateOutcome::Failed` carrying the logs; only
    /// transport problems and unexpected statuses are errors.
    pub async fn update_model(&self) -> ClientResult<UpdateOutcome> {
        let builder = self
            .request(Method::POST, &["pipeline", "update"])?
            .timeout(UPDATE_TIMEOUT);
        let response = Self::send(builder).await?;
        let status = response.status();

        if status.is_success() || status == StatusCode::INTERNAL_SERVER_ERROR {
            let body: UpdateBody = response
                .json()
                .await
                .map_err(|e| ClientError::Parse(e.to_string()))?;
            return Ok(if status.is_success() {
                UpdateOutcome::Succeeded {
                    message: body
                        .message
                        .unwrap_or_else(|| "Model updated successfully!".to_string()),
                    logs: body.logs,
                }
            } else {
                UpdateOutcome::Failed {
                    error: body.error.unwrap_or_else(|| "Server error".to_string()),
                    logs: body.logs,
                }
            });
        }

        Err(ClientError::Status {
            status: status.as_u16(),
            message: error_message(response).await,
        })
    }

    /// Pipeline state and log text from byte offset `since`.
    pub async fn pipeline_status(&self, since: usize) -> ClientResult<PipelineProgress> {
        let builder = self
            .request(Method::GET, &["pipeline", "status"])?
            .query(&[("since", since)]);
        Self::parse(Self::send(builder).await?).await
    }

    /// Configured tickers for the picker.
    pub async fn tickers(&self) -> ClientResult<Vec<TickerOption>> {
        Self::parse(Self::send(self.request(Method::GET, &["tickers"])?).await?).await
    }

    /// The user behind the current session.
    pub async fn me(&self) -> ClientResult<UserInfo> {
        Self::parse(Self::send(self.request(Method::GET, &["auth", "me"])?).await?).await
    }
}

/// The body's `error` or `message` field, or the generic load failure text.
async fn error_message(response: Response) -> String {
    match response.json::<Value>().await {
        Ok(body) => body
            .get("error")
            .or_else(|| body.get("message"))
            .and_then(Value::as_str)
            .unwrap_or(LOAD_FAILED)
            .to_string(),
        Err(_) => LOAD_FAILED.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_encodes_ticker_segment() {
        let client = DashboardClient::new("http://localhost:5000").unwrap();
        let url = client.url(&["stats", "M&M.NS"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/stats/M&M.NS");

        let url = client.url(&["stats", "a b"]).unwrap();
        assert_eq!(url.path(), "/stats/a%20b");

        let url = client.url(&["stats", "a/b"]).unwrap();
        assert_eq!(url.path(), "/stats/a%2Fb");
    }

    #[test]
    fn test_base_path_prefix_is_kept() {
        let client = DashboardClient::new("http://example.com/risk/").unwrap();
        let url = client.url(&["tickers"]).unwrap();
        assert_eq!(url.path(), "/risk/tickers");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            DashboardClient::new("not a url"),
            Err(ClientError::InvalidUrl(_))
        ));
        assert!(matches!(
            DashboardClient::new("mailto:ops@example.com"),
            Err(ClientError::InvalidUrl(_))
        ));
    }
}
