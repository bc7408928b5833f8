use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use exam_core::model::{TestId, UserId};
use url::Url;

use crate::error::ConfigError;

const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Where a finished session is scored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GradingMode {
    /// Score on the client with the answer key shipped in the generated test.
    Local,
    /// Send the answer record to the backend and wait for its result.
    #[default]
    Server,
}

impl GradingMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Server => "server",
        }
    }
}

impl fmt::Display for GradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GradingMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "client" => Ok(Self::Local),
            "server" | "remote" => Ok(Self::Server),
            _ => Err(()),
        }
    }
}

/// Connection settings for the HTTP exam backend.
#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub base_url: Url,
    pub api_token: Option<String>,
    pub request_timeout: Duration,
}

impl BackendConfig {
    /// # Errors
    ///
    /// Returns `ConfigError` if `raw` is not an absolute http(s) URL.
    pub fn new(raw: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("EXAM_API_BASE_URL", raw)?,
            api_token: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    #[must_use]
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.api_token = (!token.trim().is_empty()).then_some(token);
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Settings for exam sessions, read from `EXAM_*` environment variables.
#[derive(Clone, Debug, Default)]
pub struct ExamServiceConfig {
    /// `None` when no backend URL is configured.
    pub backend: Option<BackendConfig>,
    pub test_id: Option<TestId>,
    pub user_id: Option<UserId>,
    pub grading: GradingMode,
    pub shuffle_questions: bool,
}

impl ExamServiceConfig {
    /// # Errors
    ///
    /// Returns `ConfigError` when a set variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a set variable cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let backend = match get("EXAM_API_BASE_URL") {
            Some(raw) => {
                let mut backend = BackendConfig::new(&raw)?;
                if let Some(token) = get("EXAM_API_TOKEN") {
                    backend = backend.with_api_token(token);
                }
                if let Some(raw) = get("EXAM_REQUEST_TIMEOUT_SECS") {
                    let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                        var: "EXAM_REQUEST_TIMEOUT_SECS",
                        raw: raw.clone(),
                    })?;
                    backend = backend.with_request_timeout(Duration::from_secs(secs.max(1)));
                }
                Some(backend)
            }
            None => None,
        };

        let user_id = get("EXAM_USER_ID")
            .map(|raw| {
                raw.parse::<UserId>().map_err(|_| ConfigError::InvalidValue {
                    var: "EXAM_USER_ID",
                    raw,
                })
            })
            .transpose()?;

        let grading = get("EXAM_GRADING")
            .map(|raw| {
                raw.parse::<GradingMode>()
                    .map_err(|()| ConfigError::InvalidValue {
                        var: "EXAM_GRADING",
                        raw,
                    })
            })
            .transpose()?
            .unwrap_or_default();

        let shuffle_questions = get("EXAM_SHUFFLE_QUESTIONS")
            .map(|raw| parse_flag("EXAM_SHUFFLE_QUESTIONS", raw))
            .transpose()?
            .unwrap_or(false);

        Ok(Self {
            backend,
            test_id: get("EXAM_TEST_ID").map(|raw| TestId::new(raw.trim())),
            user_id,
            grading,
            shuffle_questions,
        })
    }
}

fn parse_flag(var: &'static str, raw: String) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue { var, raw }),
    }
}

fn parse_base_url(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl {
        var,
        raw: raw.to_string(),
        source,
    })?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedUrl {
            var,
            raw: raw.to_string(),
        });
    }
    Ok(url)
}
