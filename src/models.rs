use crate::{
    environment::{EnvironmentConfig, EnvironmentName},
    resolver::EnvironmentInfo,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub environment: EnvironmentName,
    pub api_base_url: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EnvironmentInfoResponse {
    pub environment: EnvironmentName,
    /// Display name, e.g. 正式环境
    pub current: String,
    pub api_url: String,
    pub ws_url: String,
    pub images_cdn_url: String,
    pub debug: bool,
    pub analytics: bool,
    pub can_switch: bool,
    pub platform: String,
    pub version: String,
    pub build_date: Option<String>,
}

impl EnvironmentInfoResponse {
    pub fn new(info: EnvironmentInfo, can_switch: bool) -> Self {
        let cfg = info.environment.config();
        Self {
            environment: info.environment,
            current: info.current.to_string(),
            api_url: info.api_url,
            ws_url: info.ws_url.to_string(),
            images_cdn_url: cfg.images_cdn_url.to_string(),
            debug: info.debug,
            analytics: cfg.analytics_enabled(),
            can_switch,
            platform: info.platform.to_string(),
            version: info.version,
            build_date: info.build_date,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EnvironmentOption {
    pub value: EnvironmentName,
    pub label: String,
    pub current: bool,
}

impl EnvironmentOption {
    pub fn new(cfg: &EnvironmentConfig, active: EnvironmentName) -> Self {
        Self {
            value: cfg.name,
            label: cfg.display_name.to_string(),
            current: cfg.name == active,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SwitchRequest {
    /// `development` or `production`
    pub environment: String,
}
