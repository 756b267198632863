//! Backend environment resolution and JSON request dispatch for the PomeloX
//! client.
//!
//! An [`EnvironmentResolver`] decides which backend is active (persisted
//! override, then build-time variable, then production) and an [`ApiClient`]
//! built from it issues JSON requests with a bounded timeout.

pub mod client;
pub mod config;
pub mod environment;
pub mod models;
pub mod resolver;
pub mod routes;
pub mod store;

pub use client::{ApiClient, ApiError, Method, RequestOptions};
pub use config::Settings;
pub use environment::{EnvironmentConfig, EnvironmentName, ENVIRONMENTS};
pub use resolver::{ConfigError, EnvError, EnvironmentResolver};
pub use store::{EnvironmentStore, FileStore, MemoryStore, StoreError};
