use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use log::debug;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Environment variable holding the BoldChat account ID.
pub const ENV_ACCOUNT_ID: &str = "BCID";
/// Environment variable holding the API setting ID.
pub const ENV_SETTING_ID: &str = "BCSETTING";
/// Environment variable holding the API secret key.
pub const ENV_SECRET_KEY: &str = "BCKEY";
/// Environment variable selecting the region (`us` or `emea`).
pub const ENV_REGION: &str = "BCREGION";
/// Environment variable overriding the base URL.
pub const ENV_BASE_URL: &str = "BCBASEURL";

/// Regional API endpoint.
///
/// BoldChat hosts one API for North America and one for Europe, the Middle
/// East and Africa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    /// North America.
    #[default]
    Us,
    /// Europe, Middle East, or Africa.
    Emea,
}

impl Region {
    /// Host name of the regional API.
    #[must_use]
    pub const fn host(self) -> &'static str {
        match self {
            Self::Us => "api.boldchat.com",
            Self::Emea => "api-eu.boldchat.com",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Us => write!(f, "us"),
            Self::Emea => write!(f, "emea"),
        }
    }
}

impl FromStr for Region {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "us" => Ok(Self::Us),
            "emea" | "eu" => Ok(Self::Emea),
            _ => anyhow::bail!("Unknown BoldChat region: {s}"),
        }
    }
}

/// Configuration for exponential backoff retry behavior.
///
/// Applied by the HTTP transport to transient failures only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retry attempts before failing.
    pub max_retries: u32,
    /// Initial delay before the first retry attempt.
    #[serde(with = "duration_millis")]
    pub initial_delay: Duration,
    /// Maximum delay between retry attempts (caps exponential growth).
    #[serde(with = "duration_millis")]
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
        }
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// Client configuration for a single BoldChat account.
///
/// # Examples
///
/// ```
/// use boldchat_common::{Config, Region};
///
/// let config = Config::new("123456", "789", "secret")
///     .with_region(Region::Emea)
///     .with_timeout(30);
/// assert_eq!(config.region.host(), "api-eu.boldchat.com");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// BoldChat account ID (`aid`).
    pub account_id: String,
    /// API setting ID the secret key belongs to.
    pub setting_id: String,
    /// API secret key used to sign tokens.
    ///
    /// Will not be serialized to prevent accidental exposure.
    #[serde(skip_serializing)]
    pub secret_key: SecretString,
    /// Regional endpoint.
    #[serde(default)]
    pub region: Region,
    /// Optional base URL replacing `https://{region host}`.
    ///
    /// Useful for proxies and local test servers.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Request timeout in seconds.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    /// Retry behavior for transient transport failures.
    #[serde(default)]
    pub retry_config: RetryConfig,
}

impl Config {
    /// Creates a new configuration for the US region.
    ///
    /// # Arguments
    ///
    /// * `account_id` - The BoldChat account ID
    /// * `setting_id` - The API setting ID
    /// * `secret_key` - The API secret key
    pub fn new(
        account_id: impl Into<String>,
        setting_id: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            setting_id: setting_id.into(),
            secret_key: SecretString::new(secret_key.into().into()),
            region: Region::default(),
            base_url: None,
            timeout_seconds: None,
            retry_config: RetryConfig::default(),
        }
    }

    /// Sets the regional endpoint.
    #[must_use]
    pub const fn with_region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    /// Sets a custom base URL for API requests.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Scheme and authority, e.g. `http://127.0.0.1:8080`
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = Some(timeout_seconds);
        self
    }

    /// Sets the retry configuration.
    #[must_use]
    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    /// Base URL requests are sent to, without a trailing slash.
    #[must_use]
    pub fn endpoint(&self) -> String {
        self.base_url.as_deref().map_or_else(
            || format!("https://{}", self.region.host()),
            |url| url.trim_end_matches('/').to_string(),
        )
    }

    /// Parses a configuration from a TOML document.
    ///
    /// ```
    /// use boldchat_common::{Config, Region};
    ///
    /// let config = Config::from_toml_str(r#"
    ///     account_id = "123"
    ///     setting_id = "456"
    ///     secret_key = "s3cr3t"
    ///     region = "emea"
    /// "#)?;
    /// assert_eq!(config.region, Region::Emea);
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid TOML, is missing required
    /// fields, or fails validation.
    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(contents).context("Failed to parse BoldChat config")?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_toml_str(&contents)?;
        debug!("Loaded BoldChat config from {}", path.display());
        Ok(config)
    }

    /// Builds a configuration from the `BCID`, `BCSETTING`, `BCKEY`,
    /// `BCREGION` and `BCBASEURL` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is unset or the region is
    /// unknown.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| {
            lookup(key).with_context(|| format!("Environment variable {key} is not set"))
        };

        let mut config = Self::new(
            required(ENV_ACCOUNT_ID)?,
            required(ENV_SETTING_ID)?,
            required(ENV_SECRET_KEY)?,
        );
        if let Some(region) = lookup(ENV_REGION) {
            config.region = region.parse()?;
        }
        config.base_url = lookup(ENV_BASE_URL).filter(|url| !url.is_empty());
        config.validate()?;
        Ok(config)
    }

    /// Checks that the account identity is complete.
    ///
    /// # Errors
    ///
    /// Returns an error if the account ID, setting ID, or secret key is empty.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.account_id.trim().is_empty() {
            anyhow::bail!("account_id must not be empty");
        }
        if self.setting_id.trim().is_empty() {
            anyhow::bail!("setting_id must not be empty");
        }
        if self.secret_key.expose_secret().is_empty() {
            anyhow::bail!("secret_key must not be empty");
        }
        Ok(())
    }
}
