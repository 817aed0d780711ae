//! idgate — bearer-token identity service with simulated VM provisioning.
//!
//! The binary in `main.rs` wires these modules together; integration tests in
//! `tests/` drive the same router.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod errors;
mod jobs;
pub mod models;
pub mod provisioning;
pub mod store;

use auth::TokenManager;
use provisioning::ProvisioningPipeline;
use store::users::UserStore;

/// Shared application state passed to handlers and middleware.
pub struct AppState {
    pub tokens: TokenManager,
    pub users: UserStore,
    pub provisioning: ProvisioningPipeline,
}

impl AppState {
    /// Build every service from configuration. Must run inside a tokio
    /// runtime: the provisioning workers are spawned here.
    pub fn new(cfg: &config::Config) -> Self {
        Self {
            tokens: TokenManager::new(cfg.jwt_secret.as_bytes(), cfg.token_ttl_secs),
            users: UserStore::seeded(),
            provisioning: ProvisioningPipeline::start(&cfg.provisioning),
        }
    }
}
