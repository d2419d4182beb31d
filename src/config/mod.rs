use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Flat directory generated images are written to. Created at startup.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// OpenAI API key for the DALL-E provider. Provider calls fail per item when unset.
    #[serde(default)]
    pub openai_api_key: Option<String>,

    /// Stability AI API key. Provider calls fail per item when unset.
    #[serde(default)]
    pub stability_api_key: Option<String>,

    #[serde(default = "default_openai_api_base")]
    pub openai_api_base: String,

    #[serde(default = "default_stability_api_base")]
    pub stability_api_base: String,

    /// Hard per-item budget for a DALL-E call, in seconds.
    #[serde(default = "default_dalle_timeout_secs")]
    pub dalle_timeout_secs: u64,

    /// Hard per-item budget for a Stability AI call, in seconds.
    #[serde(default = "default_stability_timeout_secs")]
    pub stability_timeout_secs: u64,

    /// Completed jobs kept in memory before the oldest are evicted.
    #[serde(default = "default_max_retained_jobs")]
    pub max_retained_jobs: usize,

    /// Age after which a completed job is evicted, in seconds.
    #[serde(default = "default_job_retention_secs")]
    pub job_retention_secs: u64,

    #[serde(default = "default_reap_interval_secs")]
    pub reap_interval_secs: u64,

    /// Prometheus scrape listener (e.g. "127.0.0.1:9464"). Disabled when unset.
    #[serde(default)]
    pub metrics_bind_addr: Option<String>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./generated_images")
}

fn default_openai_api_base() -> String {
    "https://api.openai.com".to_string()
}

fn default_stability_api_base() -> String {
    "https://api.stability.ai".to_string()
}

fn default_dalle_timeout_secs() -> u64 {
    120
}

fn default_stability_timeout_secs() -> u64 {
    90
}

fn default_max_retained_jobs() -> usize {
    100
}

fn default_job_retention_secs() -> u64 {
    3600
}

fn default_reap_interval_secs() -> u64 {
    60
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn dalle_timeout(&self) -> Duration {
        Duration::from_secs(self.dalle_timeout_secs)
    }

    pub fn stability_timeout(&self) -> Duration {
        Duration::from_secs(self.stability_timeout_secs)
    }

    pub fn job_retention(&self) -> Duration {
        Duration::from_secs(self.job_retention_secs)
    }

    pub fn reap_interval(&self) -> Duration {
        Duration::from_secs(self.reap_interval_secs.max(1))
    }

    /// Key is present and not blank.
    pub fn has_credential(key: &Option<String>) -> bool {
        key.as_deref().map(str::trim).is_some_and(|k| !k.is_empty())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            openai_api_key: None,
            stability_api_key: None,
            openai_api_base: default_openai_api_base(),
            stability_api_base: default_stability_api_base(),
            dalle_timeout_secs: default_dalle_timeout_secs(),
            stability_timeout_secs: default_stability_timeout_secs(),
            max_retained_jobs: default_max_retained_jobs(),
            job_retention_secs: default_job_retention_secs(),
            reap_interval_secs: default_reap_interval_secs(),
            metrics_bind_addr: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_env() {
        let config: AppConfig = envy::from_iter(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("./generated_images"));
        assert_eq!(config.dalle_timeout(), Duration::from_secs(120));
        assert_eq!(config.stability_timeout(), Duration::from_secs(90));
        assert!(config.openai_api_key.is_none());
        assert!(config.metrics_bind_addr.is_none());
    }

    #[test]
    fn test_overrides_from_env() {
        let vars = vec![
            ("OUTPUT_DIR".to_string(), "/tmp/words".to_string()),
            ("STABILITY_API_KEY".to_string(), "sk-test".to_string()),
            ("MAX_RETAINED_JOBS".to_string(), "5".to_string()),
            ("REAP_INTERVAL_SECS".to_string(), "0".to_string()),
        ];
        let config: AppConfig = envy::from_iter(vars).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/tmp/words"));
        assert_eq!(config.stability_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.max_retained_jobs, 5);
        assert_eq!(config.reap_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_blank_credential_is_missing() {
        assert!(!AppConfig::has_credential(&None));
        assert!(!AppConfig::has_credential(&Some("  ".to_string())));
        assert!(AppConfig::has_credential(&Some("sk-abc".to_string())));
    }
}
