//! Configuration loading for nutrigated.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.nutrigate/config.toml` (user)
//! 3. `/etc/nutrigate/config.toml` (system)
//!
//! When no file exists the built-in defaults are used.
//!
//! Secrets come from the environment only: `GEMINI_API_KEY`, `SUPABASE_URL`,
//! `SUPABASE_SERVICE_ROLE_KEY`. `ALLOWED_ORIGIN` overrides
//! `server.allowed_origin`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cache::{DEFAULT_HASH_PREFIX_BYTES, DEFAULT_TABLE, MemoryCacheConfig};
use crate::limiter::{MAX_WINDOW, RateLimitConfig, default_action_limits};
use crate::providers::gemini::DEFAULT_BASE_URL;
use crate::types::{
    Action, DEFAULT_LITE_MODEL, DEFAULT_LOGIC_MODEL, DEFAULT_VISION_FALLBACK_MODEL,
    DEFAULT_VISION_PRIMARY_MODEL, ModelTier, ModelTiers,
};
use crate::{GatewayError, Result};

/// Daemon configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:8787).
    #[serde(default = "default_address")]
    pub address: String,
    /// Comma-separated CORS origins, or `*` (default: any origin).
    #[serde(default)]
    pub allowed_origin: Option<String>,
    /// Maximum accepted request body (default: 16 MiB, enough for a
    /// base64-encoded 10 MiB photo).
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            allowed_origin: None,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_address() -> String {
    "127.0.0.1:8787".to_string()
}

fn default_max_body_bytes() -> usize {
    16 * 1024 * 1024
}

/// Model tier configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Gemini REST base URL used to derive tier endpoints.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub vision_primary: TierConfig,
    #[serde(default)]
    pub vision_fallback: TierConfig,
    #[serde(default)]
    pub logic: TierConfig,
    #[serde(default)]
    pub lite: TierConfig,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            vision_primary: TierConfig::default(),
            vision_fallback: TierConfig::default(),
            logic: TierConfig::default(),
            lite: TierConfig::default(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// One tier: model id plus an optional full endpoint override.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TierConfig {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl TierConfig {
    fn resolve(&self, base_url: &str, default_model: &str) -> ModelTier {
        let model = self.model.as_deref().unwrap_or(default_model);
        match &self.endpoint {
            Some(endpoint) => ModelTier::new(model, endpoint.clone()),
            None => ModelTier::gemini(base_url, model),
        }
    }
}

impl ModelsConfig {
    /// Resolve the four tiers, filling in default models.
    pub fn tiers(&self) -> ModelTiers {
        let base = self.base_url.as_str();
        ModelTiers {
            vision_primary: self
                .vision_primary
                .resolve(base, DEFAULT_VISION_PRIMARY_MODEL),
            vision_fallback: self
                .vision_fallback
                .resolve(base, DEFAULT_VISION_FALLBACK_MODEL),
            logic: self.logic.resolve(base, DEFAULT_LOGIC_MODEL),
            lite: self.lite.resolve(base, DEFAULT_LITE_MODEL),
        }
    }
}

/// Rate limit configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Window length in seconds (default: 3600).
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    /// Ceiling for actions without an explicit entry (default: 30).
    #[serde(default = "default_limit")]
    pub default_limit: u32,
    /// Per-action ceilings, keyed by wire name. A `[limits.actions]` table
    /// replaces the built-in one; actions it leaves out use `default_limit`.
    #[serde(default = "default_action_limits")]
    pub actions: HashMap<Action, u32>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            default_limit: default_limit(),
            actions: default_action_limits(),
        }
    }
}

fn default_window_secs() -> u64 {
    3600
}

fn default_limit() -> u32 {
    30
}

impl LimitsConfig {
    pub fn rate_limits(&self) -> Result<RateLimitConfig> {
        let window = Duration::from_secs(self.window_secs);
        if window.is_zero() || window > MAX_WINDOW {
            return Err(GatewayError::Configuration(format!(
                "limits.window_secs must be between 1 and {}",
                MAX_WINDOW.as_secs()
            )));
        }
        Ok(RateLimitConfig::new()
            .window(window)
            .default_limit(self.default_limit)
            .action_limits(self.actions.clone()))
    }
}

/// Analysis cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Leading image bytes hashed for the cache key (default: 65536).
    #[serde(default = "default_hash_prefix_bytes")]
    pub hash_prefix_bytes: usize,
    /// PostgREST table name.
    #[serde(default = "default_table")]
    pub table: String,
    /// In-memory store capacity when no persistent store is configured.
    #[serde(default = "default_memory_max_entries")]
    pub memory_max_entries: u64,
    /// In-memory store TTL in seconds (default: 7 days).
    #[serde(default = "default_memory_ttl_secs")]
    pub memory_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            hash_prefix_bytes: default_hash_prefix_bytes(),
            table: default_table(),
            memory_max_entries: default_memory_max_entries(),
            memory_ttl_secs: default_memory_ttl_secs(),
        }
    }
}

fn default_hash_prefix_bytes() -> usize {
    DEFAULT_HASH_PREFIX_BYTES
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

fn default_memory_max_entries() -> u64 {
    10_000
}

fn default_memory_ttl_secs() -> u64 {
    7 * 24 * 3600
}

impl CacheConfig {
    pub fn memory(&self) -> MemoryCacheConfig {
        MemoryCacheConfig::new()
            .max_entries(self.memory_max_entries)
            .ttl(Duration::from_secs(self.memory_ttl_secs))
    }
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided; must exist)
    /// 2. `~/.nutrigate/config.toml`
    /// 3. `/etc/nutrigate/config.toml`
    /// 4. Built-in defaults
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            GatewayError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            GatewayError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(GatewayError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".nutrigate").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        let system_config = PathBuf::from("/etc/nutrigate/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// Apply environment overrides (currently `ALLOWED_ORIGIN`).
    pub fn with_secrets(mut self, secrets: &Secrets) -> Self {
        if let Some(origin) = &secrets.allowed_origin {
            self.server.allowed_origin = Some(origin.clone());
        }
        self
    }
}

/// Secrets and deployment overrides read from the environment.
#[derive(Clone, Default)]
pub struct Secrets {
    pub gemini_api_key: Option<String>,
    pub supabase_url: Option<String>,
    pub supabase_service_role_key: Option<String>,
    pub allowed_origin: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<redacted>"))
            .field("supabase_url", &self.supabase_url)
            .field(
                "supabase_service_role_key",
                &self.supabase_service_role_key.as_ref().map(|_| "<redacted>"),
            )
            .field("allowed_origin", &self.allowed_origin)
            .finish()
    }
}

impl Secrets {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            gemini_api_key: get("GEMINI_API_KEY"),
            supabase_url: get("SUPABASE_URL"),
            supabase_service_role_key: get("SUPABASE_SERVICE_ROLE_KEY"),
            allowed_origin: get("ALLOWED_ORIGIN"),
        }
    }

    /// PostgREST credentials, when both are present.
    pub fn supabase(&self) -> Option<(&str, &str)> {
        match (&self.supabase_url, &self.supabase_service_role_key) {
            (Some(url), Some(key)) => Some((url.as_str(), key.as_str())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.server.address, "127.0.0.1:8787");
        assert_eq!(config.server.allowed_origin, None);
        assert_eq!(config.limits.window_secs, 3600);
        assert_eq!(config.cache.hash_prefix_bytes, 65536);
        assert_eq!(config.cache.table, "food_analysis_cache");
    }

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
            [server]
            address = "0.0.0.0:8787"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.address, "0.0.0.0:8787");
        assert_eq!(config.server.max_body_bytes, 16 * 1024 * 1024);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
            [server]
            allowed_origin = "https://app.example.com"

            [models]
            base_url = "https://llm.internal/v1beta"

            [models.lite]
            model = "gemini-2.0-flash-lite"

            [models.logic]
            endpoint = "https://proxy.internal/logic"

            [limits]
            window_secs = 60
            default_limit = 5

            [limits.actions]
            chat = 100
            analyze-food = 3

            [cache]
            hash_prefix_bytes = 1024
            table = "photo_cache"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.server.allowed_origin.as_deref(),
            Some("https://app.example.com")
        );

        let tiers = config.models.tiers();
        assert_eq!(tiers.lite.identifier, "gemini-2.0-flash-lite");
        assert_eq!(
            tiers.lite.endpoint,
            "https://llm.internal/v1beta/models/gemini-2.0-flash-lite:generateContent"
        );
        assert_eq!(tiers.logic.identifier, DEFAULT_LOGIC_MODEL);
        assert_eq!(tiers.logic.endpoint, "https://proxy.internal/logic");

        let limits = config.limits.rate_limits().unwrap();
        assert_eq!(limits.window, Duration::from_secs(60));
        assert_eq!(limits.limit_for(Action::Chat), 100);
        assert_eq!(limits.limit_for(Action::AnalyzeFood), 3);
        // A configured table replaces the built-in one
        assert_eq!(limits.limit_for(Action::GenerateMealPlan), 5);

        assert_eq!(config.cache.hash_prefix_bytes, 1024);
        assert_eq!(config.cache.table, "photo_cache");
    }

    #[test]
    fn unknown_action_in_limits_is_rejected() {
        let toml = r#"
            [limits.actions]
            summarize-everything = 5
        "#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn zero_window_is_rejected() {
        let limits = LimitsConfig {
            window_secs: 0,
            ..Default::default()
        };
        assert!(matches!(
            limits.rate_limits(),
            Err(GatewayError::Configuration(_))
        ));
    }

    #[test]
    fn default_limit_applies_without_action_table() {
        let config: Config = toml::from_str("[limits]\ndefault_limit = 5").unwrap();
        let limits = config.limits.rate_limits().unwrap();
        // Built-in table still applies when none is configured
        assert_eq!(limits.limit_for(Action::Chat), 60);

        let config: Config =
            toml::from_str("[limits]\ndefault_limit = 5\n[limits.actions]\nchat = 9").unwrap();
        let limits = config.limits.rate_limits().unwrap();
        assert_eq!(limits.limit_for(Action::Chat), 9);
        for action in Action::ALL.into_iter().filter(|a| *a != Action::Chat) {
            assert_eq!(limits.limit_for(action), 5, "{action}");
        }
    }

    #[test]
    fn oversized_window_is_rejected() {
        let config: Config = toml::from_str("[limits]\nwindow_secs = 9223372036854775807").unwrap();
        assert!(matches!(
            config.limits.rate_limits(),
            Err(GatewayError::Configuration(_))
        ));
    }

    #[test]
    fn config_not_found_returns_error() {
        let result = Config::load(Some(Path::new("/nonexistent/config.toml")));
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Config file not found"));
    }

    #[test]
    fn secrets_ignore_blank_values() {
        let secrets = Secrets::from_lookup(|name| match name {
            "GEMINI_API_KEY" => Some("  ".to_string()),
            "SUPABASE_URL" => Some("https://db.example.com".to_string()),
            _ => None,
        });
        assert!(secrets.gemini_api_key.is_none());
        // Both halves are needed for the persistent store
        assert!(secrets.supabase().is_none());
    }

    #[test]
    fn allowed_origin_env_overrides_file() {
        let secrets = Secrets::from_lookup(|name| {
            (name == "ALLOWED_ORIGIN").then(|| "https://override.example".to_string())
        });
        let config = Config::default().with_secrets(&secrets);
        assert_eq!(
            config.server.allowed_origin.as_deref(),
            Some("https://override.example")
        );
    }

    #[test]
    fn secrets_debug_redacts_keys() {
        let secrets = Secrets::from_lookup(|name| match name {
            "GEMINI_API_KEY" => Some("AIza-secret".to_string()),
            "SUPABASE_SERVICE_ROLE_KEY" => Some("service-secret".to_string()),
            _ => None,
        });
        let debug = format!("{secrets:?}");
        assert!(!debug.contains("AIza-secret"));
        assert!(!debug.contains("service-secret"));
    }
}
