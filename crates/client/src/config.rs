use crate::error::ClientError;

/// Backend connection settings loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL all endpoint paths are appended to (default:
    /// `http://localhost:8000/api`).
    pub api_url: String,
    /// Bearer token, sent as `Authorization` and `X-Auth-Token`.
    pub api_token: Option<String>,
    /// Sent as `X-Workspace-Id` when set.
    pub workspace_id: Option<String>,
    /// Sent as `X-Client-Id` and `X-Company-Id` when set.
    pub client_id: Option<String>,
    /// Per-request timeout in seconds (default: `15`).
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000/api".into(),
            api_token: None,
            workspace_id: None,
            client_id: None,
            request_timeout_secs: 15,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                     |
    /// |------------------------------|-----------------------------|
    /// | `REACH_API_URL`              | `http://localhost:8000/api` |
    /// | `REACH_API_TOKEN`            | unset                       |
    /// | `REACH_WORKSPACE_ID`         | unset                       |
    /// | `REACH_CLIENT_ID`            | unset                       |
    /// | `REACH_REQUEST_TIMEOUT_SECS` | `15`                        |
    pub fn from_env() -> Result<Self, ClientError> {
        let defaults = Self::default();

        let api_url = std::env::var("REACH_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);

        let request_timeout_secs = match std::env::var("REACH_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse().map_err(|_| {
                ClientError::Config(format!(
                    "REACH_REQUEST_TIMEOUT_SECS must be a whole number of seconds, got '{raw}'"
                ))
            })?,
            Err(_) => defaults.request_timeout_secs,
        };

        Ok(Self {
            api_url,
            api_token: non_empty_var("REACH_API_TOKEN"),
            workspace_id: non_empty_var("REACH_WORKSPACE_ID"),
            client_id: non_empty_var("REACH_CLIENT_ID"),
            request_timeout_secs,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
