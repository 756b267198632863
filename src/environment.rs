//! Known backend environments and their static connection table.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentName {
    Development,
    Production,
}

/// Name that matches none of [`ENVIRONMENTS`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown environment `{0}` (expected `development` or `production`)")]
pub struct UnknownEnvironment(pub String);

impl EnvironmentName {
    pub const DEFAULT: EnvironmentName = EnvironmentName::Production;

    pub fn as_str(self) -> &'static str {
        match self {
            EnvironmentName::Development => "development",
            EnvironmentName::Production => "production",
        }
    }

    pub fn config(self) -> &'static EnvironmentConfig {
        match self {
            EnvironmentName::Development => &ENVIRONMENTS[0],
            EnvironmentName::Production => &ENVIRONMENTS[1],
        }
    }
}

impl fmt::Display for EnvironmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvironmentName {
    type Err = UnknownEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("development") {
            Ok(EnvironmentName::Development)
        } else if s.eq_ignore_ascii_case("production") {
            Ok(EnvironmentName::Production)
        } else {
            Err(UnknownEnvironment(s.to_string()))
        }
    }
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct EnvironmentConfig {
    pub name: EnvironmentName,
    /// Label shown in the dev switcher
    pub display_name: &'static str,
    pub api_base_url: &'static str,
    pub ws_base_url: &'static str,
    pub images_cdn_url: &'static str,
}

impl EnvironmentConfig {
    pub fn is_debug(&self) -> bool {
        self.name == EnvironmentName::Development
    }

    pub fn show_dev_menu(&self) -> bool {
        self.is_debug()
    }

    pub fn test_mode(&self) -> bool {
        self.is_debug()
    }

    pub fn analytics_enabled(&self) -> bool {
        self.name == EnvironmentName::Production
    }
}

/// One entry per [`EnvironmentName`], in declaration order.
pub static ENVIRONMENTS: [EnvironmentConfig; 2] = [
    EnvironmentConfig {
        name: EnvironmentName::Development,
        display_name: "测试环境",
        api_base_url: "http://106.14.165.234:8085",
        ws_base_url: "ws://106.14.165.234:8085/ws",
        images_cdn_url: "https://test-pub-578670e517644aad94f4f68695b605b9.r2.dev",
    },
    EnvironmentConfig {
        name: EnvironmentName::Production,
        display_name: "正式环境",
        api_base_url: "https://www.vitaglobal.icu",
        ws_base_url: "wss://www.vitaglobal.icu/ws",
        images_cdn_url: "https://pub-578670e517644aad94f4f68695b605b9.r2.dev",
    },
];
