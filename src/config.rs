use crate::environment::{EnvironmentName, ENVIRONMENTS};
use dotenvy::dotenv;
use std::{collections::HashMap, env, net::SocketAddr, path::PathBuf};

/// Environment selected when the binary was compiled, if any.
const BUILD_ENVIRONMENT: Option<&str> = option_env!("POMELOX_ENVIRONMENT");

#[derive(Clone, Debug)]
pub struct Settings {
    /// Build-time environment choice; consulted only when nothing is persisted
    pub build_environment: Option<String>,
    /// Replaces the compiled-in API base URL of an environment (local backends, tests)
    pub api_url_overrides: HashMap<EnvironmentName, String>,
    pub state_dir: PathBuf,
    pub http_timeout_ms: u64,
    pub bearer_token: Option<String>,
    pub language: Option<String>,
    pub listen_addr: SocketAddr,
    pub app_version: String,
    pub build_date: Option<String>,
    /// Refuse to start on an unrecognized persisted environment instead of falling back
    pub strict_environment: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            build_environment: None,
            api_url_overrides: HashMap::new(),
            state_dir: default_state_dir(),
            http_timeout_ms: 10_000,
            bearer_token: None,
            language: None,
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            build_date: None,
            strict_environment: false,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let _ = dotenv();
        let defaults = Self::default();

        let build_environment = non_empty("POMELOX_ENVIRONMENT")
            .or_else(|| BUILD_ENVIRONMENT.map(str::to_string));
        let api_url_overrides = ENVIRONMENTS
            .iter()
            .filter_map(|cfg| {
                let key = format!("POMELOX_{}_API_URL", cfg.name.as_str().to_ascii_uppercase());
                non_empty(&key).map(|url| (cfg.name, url))
            })
            .collect();
        let state_dir = non_empty("POMELOX_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.state_dir);
        let http_timeout_ms = env::var("POMELOX_HTTP_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.http_timeout_ms);
        let listen_addr = env::var("POMELOX_LISTEN_ADDR")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.listen_addr);
        let strict_environment = env::var("POMELOX_STRICT_ENVIRONMENT")
            .ok()
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            build_environment,
            api_url_overrides,
            state_dir,
            http_timeout_ms,
            bearer_token: non_empty("POMELOX_BEARER_TOKEN"),
            language: non_empty("POMELOX_LANGUAGE"),
            listen_addr,
            app_version: non_empty("POMELOX_APP_VERSION").unwrap_or(defaults.app_version),
            build_date: non_empty("POMELOX_BUILD_DATE"),
            strict_environment,
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn default_state_dir() -> PathBuf {
    dirs::config_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pomelox")
}
