//! Which backend are we talking to.
//!
//! [`EnvironmentResolver`] owns the active environment. It is a cheap handle
//! (clones share state) passed explicitly to whatever issues requests. The
//! startup value comes from, in order: the persisted override, the build-time
//! variable, then [`EnvironmentName::DEFAULT`].

use crate::{
    config::Settings,
    environment::{EnvironmentConfig, EnvironmentName, UnknownEnvironment, ENVIRONMENTS},
    store::{EnvironmentStore, StoreError},
};
use serde::Serialize;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Error)]
pub enum EnvError {
    #[error(transparent)]
    InvalidEnvironment(#[from] UnknownEnvironment),
    #[error("persisting environment failed: {0}")]
    Persist(#[from] StoreError),
}

/// Unusable startup configuration. Recovered with a warning unless
/// [`Settings::strict_environment`] is set.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("persisted environment is not recognized: {0}")]
    UnknownPersisted(UnknownEnvironment),
    #[error("persisted environment could not be read: {0}")]
    Unreadable(StoreError),
    #[error("build-time environment is not recognized: {0}")]
    UnknownBuild(UnknownEnvironment),
}

#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentInfo {
    pub environment: EnvironmentName,
    pub current: &'static str,
    pub api_url: String,
    pub ws_url: &'static str,
    pub debug: bool,
    pub platform: &'static str,
    pub version: String,
    pub build_date: Option<String>,
}

#[derive(Clone)]
pub struct EnvironmentResolver {
    inner: Arc<Inner>,
}

struct Inner {
    active: watch::Sender<EnvironmentName>,
    /// Held across save + publish so the persisted and active values agree
    switch_lock: Mutex<()>,
    store: Box<dyn EnvironmentStore>,
    api_url_overrides: HashMap<EnvironmentName, String>,
    app_version: String,
    build_date: Option<String>,
}

impl EnvironmentResolver {
    pub fn load(
        store: impl EnvironmentStore + 'static,
        settings: &Settings,
    ) -> Result<Self, ConfigError> {
        let initial = initial_environment(&store, settings)?;
        let (active, _) = watch::channel(initial);
        let resolver = Self {
            inner: Arc::new(Inner {
                active,
                switch_lock: Mutex::new(()),
                store: Box::new(store),
                api_url_overrides: settings.api_url_overrides.clone(),
                app_version: settings.app_version.clone(),
                build_date: settings.build_date.clone(),
            }),
        };
        tracing::info!(
            environment = %initial,
            api_base_url = %resolver.api_base_url(),
            "environment resolved"
        );
        Ok(resolver)
    }

    pub fn active(&self) -> EnvironmentName {
        *self.inner.active.borrow()
    }

    pub fn get_active_config(&self) -> &'static EnvironmentConfig {
        self.active().config()
    }

    /// Base URL requests should target right now.
    pub fn api_base_url(&self) -> String {
        let cfg = self.get_active_config();
        self.inner
            .api_url_overrides
            .get(&cfg.name)
            .cloned()
            .unwrap_or_else(|| cfg.api_base_url.to_string())
    }

    /// Persist first, then switch. On any error the active environment is untouched.
    /// Requests already issued keep the base URL they captured.
    pub fn set_environment(&self, name: &str) -> Result<&'static EnvironmentConfig, EnvError> {
        let next: EnvironmentName = name.parse()?;
        let _guard = self.inner.switch_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.inner.store.save(next.as_str())?;
        let previous = self.inner.active.send_replace(next);
        if previous != next {
            tracing::info!(from = %previous, to = %next, "environment switched");
        }
        Ok(next.config())
    }

    pub fn reset_to_default(&self) -> Result<&'static EnvironmentConfig, EnvError> {
        self.set_environment(EnvironmentName::DEFAULT.as_str())
    }

    pub fn available_environments(&self) -> Vec<&'static EnvironmentConfig> {
        ENVIRONMENTS.iter().collect()
    }

    pub fn can_switch_environment(&self) -> bool {
        cfg!(debug_assertions) || self.get_active_config().is_debug()
    }

    pub fn environment_info(&self) -> EnvironmentInfo {
        let cfg = self.get_active_config();
        EnvironmentInfo {
            environment: cfg.name,
            current: cfg.display_name,
            api_url: self.api_base_url(),
            ws_url: cfg.ws_base_url,
            debug: cfg.is_debug(),
            platform: std::env::consts::OS,
            version: self.inner.app_version.clone(),
            build_date: self.inner.build_date.clone(),
        }
    }

    /// Observe switches; the receiver starts at the current value.
    pub fn subscribe(&self) -> watch::Receiver<EnvironmentName> {
        self.inner.active.subscribe()
    }
}

fn initial_environment(
    store: &dyn EnvironmentStore,
    settings: &Settings,
) -> Result<EnvironmentName, ConfigError> {
    let persisted = match store.load() {
        Ok(Some(raw)) => raw
            .parse::<EnvironmentName>()
            .map(Some)
            .map_err(ConfigError::UnknownPersisted),
        Ok(None) => Ok(None),
        Err(e) => Err(ConfigError::Unreadable(e)),
    };
    if let Some(name) = recover(persisted, settings.strict_environment)? {
        return Ok(name);
    }

    let build = settings
        .build_environment
        .as_deref()
        .map(|raw| raw.parse::<EnvironmentName>().map_err(ConfigError::UnknownBuild))
        .transpose();
    if let Some(name) = recover(build, settings.strict_environment)? {
        return Ok(name);
    }

    Ok(EnvironmentName::DEFAULT)
}

fn recover(
    layer: Result<Option<EnvironmentName>, ConfigError>,
    strict: bool,
) -> Result<Option<EnvironmentName>, ConfigError> {
    match layer {
        Err(e) if !strict => {
            tracing::warn!(error = %e, "ignoring environment layer");
            Ok(None)
        }
        other => other,
    }
}
