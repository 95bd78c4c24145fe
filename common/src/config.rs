use crate::sql::ExecutionPolicy;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-pro";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_DATABASE_PATH: &str = "temp_database.db";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_UPLOAD_LIMIT_MB: usize = 50;

/// settings for the generative-text client, resolved once at startup
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub timeout: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl GeneratorConfig {
    /// url of the generateContent endpoint for the configured model
    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// fixed path every submission writes its upload to
    pub database_path: PathBuf,
    pub upload_limit_bytes: usize,
    pub policy: ExecutionPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            upload_limit_bytes: DEFAULT_UPLOAD_LIMIT_MB * 1024 * 1024,
            policy: ExecutionPolicy::ReadOnly,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_config_default() {
        let config = GeneratorConfig::default();
        assert_eq!(config.model, "gemini-pro");
        assert!(config.api_key.is_none());
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let config = GeneratorConfig {
            api_base: "http://localhost:9000/v1beta/".to_string(),
            model: "gemini-1.5-flash".to_string(),
            ..GeneratorConfig::default()
        };
        assert_eq!(
            config.endpoint(),
            "http://localhost:9000/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_server_config_defaults_to_read_only() {
        let config = ServerConfig::default();
        assert_eq!(config.policy, ExecutionPolicy::ReadOnly);
        assert_eq!(config.database_path, PathBuf::from("temp_database.db"));
    }
}
