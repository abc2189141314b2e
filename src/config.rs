use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote incident service
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Local incident cache
    #[serde(default)]
    pub store: StoreConfig,

    /// Stacked timeline geometry
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/incident-stack.toml".to_string());
        Self::load_from(&config_path)
    }

    /// Load configuration, layering `path` (optional) over the built-in defaults
    pub fn load_from(path: &str) -> Result<Self, config::ConfigError> {
        let config: Config = config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(path).required(false))
            // Override with environment variables (prefix: INCIDENT_STACK_)
            .add_source(
                config::Environment::with_prefix("INCIDENT_STACK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.gateway.base_url.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "gateway.base_url must not be empty".to_string(),
            ));
        }
        if !(self.layout.collapsed_scale > 0.0 && self.layout.collapsed_scale <= 1.0) {
            return Err(config::ConfigError::Message(format!(
                "layout.collapsed_scale must be in (0, 1], got {}",
                self.layout.collapsed_scale
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the incident service; `/incidents` is appended
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// How responses for the same incident are ordered when they overlap
    #[serde(default)]
    pub response_ordering: ResponseOrdering,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseOrdering {
    /// Whichever response settles last is applied
    #[default]
    LastSettled,
    /// Responses older than one already applied for the same id are dropped
    LastIssued,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Vertical step between collapsed cards
    #[serde(default = "default_unit_step")]
    pub unit_step: u32,

    /// Height each collapsed card contributes to the container
    #[serde(default = "default_peek_height")]
    pub peek_height: u32,

    /// Extra clickable space below the collapsed stack
    #[serde(default = "default_headroom")]
    pub headroom: u32,

    /// Uniform shrink applied to collapsed cards
    #[serde(default = "default_collapsed_scale")]
    pub collapsed_scale: f64,

    /// Spacing between expanded cards
    #[serde(default = "default_expanded_gap")]
    pub expanded_gap: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            unit_step: default_unit_step(),
            peek_height: default_peek_height(),
            headroom: default_headroom(),
            collapsed_scale: default_collapsed_scale(),
            expanded_gap: default_expanded_gap(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

// Default value functions
fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("incident-stack/{}", env!("CARGO_PKG_VERSION"))
}

fn default_unit_step() -> u32 {
    32
}

fn default_peek_height() -> u32 {
    48
}

fn default_headroom() -> u32 {
    200
}

fn default_collapsed_scale() -> f64 {
    0.98
}

fn default_expanded_gap() -> u32 {
    16
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();
        assert_eq!(config.layout.unit_step, 32);
        assert_eq!(config.layout.peek_height, 48);
        assert_eq!(config.layout.headroom, 200);
        assert_eq!(config.gateway.timeout_secs, 10);
        assert_eq!(config.store.response_ordering, ResponseOrdering::LastSettled);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_builtin_defaults_match_code_defaults() {
        let config = Config::load_from("does/not/exist").unwrap();
        assert_eq!(config.layout, LayoutConfig::default());
        assert_eq!(config.gateway.base_url, default_base_url());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[gateway]\nbase_url = \"https://incidents.example.com\"\n\n[store]\nresponse_ordering = \"last_issued\"\n\n[layout]\nunit_step = 24"
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.gateway.base_url, "https://incidents.example.com");
        assert_eq!(config.store.response_ordering, ResponseOrdering::LastIssued);
        assert_eq!(config.layout.unit_step, 24);
        assert_eq!(config.layout.peek_height, 48);
    }

    #[test]
    fn test_invalid_scale_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[layout]\ncollapsed_scale = 1.5").unwrap();

        let path = file.path().to_str().unwrap().to_string();
        assert!(Config::load_from(&path).is_err());
    }
}
