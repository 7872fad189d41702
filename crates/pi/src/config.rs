//! Pi platform configuration loaded from environment variables.

/// Settings for the Pi platform client.
///
/// | Env var               | Default                   |
/// |-----------------------|---------------------------|
/// | `PI_API_BASE_URL`     | `https://api.minepi.com`  |
/// | `PI_API_KEY`          | unset (development mode)  |
/// | `PI_DEFAULT_BALANCE`  | `5`                       |
/// | `PI_TIMEOUT_SECS`     | `15`                      |
#[derive(Debug, Clone)]
pub struct PiConfig {
    pub api_base_url: String,
    /// Server API key. `None` selects the development platform.
    pub api_key: Option<String>,
    /// The platform API has no wallet-balance endpoint; every user is
    /// reported with this balance.
    pub default_balance: f64,
    pub timeout_secs: u64,
}

impl Default for PiConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.minepi.com".to_string(),
            api_key: None,
            default_balance: 5.0,
            timeout_secs: 15,
        }
    }
}

impl PiConfig {
    /// Load from environment variables, falling back to defaults.
    ///
    /// # Panics
    ///
    /// Panics if a numeric variable is set but cannot be parsed.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_base_url = std::env::var("PI_API_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url);

        let api_key = std::env::var("PI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        let default_balance: f64 = std::env::var("PI_DEFAULT_BALANCE")
            .unwrap_or_else(|_| defaults.default_balance.to_string())
            .parse()
            .expect("PI_DEFAULT_BALANCE must be a valid number");

        let timeout_secs: u64 = std::env::var("PI_TIMEOUT_SECS")
            .unwrap_or_else(|_| defaults.timeout_secs.to_string())
            .parse()
            .expect("PI_TIMEOUT_SECS must be a valid u64");

        Self {
            api_base_url,
            api_key,
            default_balance,
            timeout_secs,
        }
    }
}
