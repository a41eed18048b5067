// crates/core/src/config.rs
//! Loading and saving the proofreading configuration.
//!
//! Precedence: environment overrides > stored config > defaults.

use proofread_types::ProofreadingConfig;

use crate::error::StoreError;
use crate::store::{self, KeyValueStore, CONFIG_KEY};

pub const ENV_API_URL: &str = "PROOFREAD_API_URL";
pub const ENV_API_KEY: &str = "PROOFREAD_API_KEY";
pub const ENV_MODEL: &str = "PROOFREAD_MODEL";

/// Apply environment overrides through `lookup`. Blank values are ignored.
pub fn apply_env_overrides<F>(config: &mut ProofreadingConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let fields: [(&str, &mut String); 3] = [
        (ENV_API_URL, &mut config.api_url),
        (ENV_API_KEY, &mut config.api_key),
        (ENV_MODEL, &mut config.model),
    ];
    for (var, field) in fields {
        if let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) {
            tracing::debug!(var, "config: environment override applied");
            *field = value.trim().to_string();
        }
    }
}

/// Stored config (or defaults), without environment overrides.
pub async fn load_stored(store: &dyn KeyValueStore) -> Result<ProofreadingConfig, StoreError> {
    Ok(store::load(store, CONFIG_KEY).await?.unwrap_or_default())
}

/// Effective config: stored values with process environment overrides.
///
/// A corrupt stored config is logged and replaced by defaults rather than
/// blocking every check.
pub async fn load(store: &dyn KeyValueStore) -> ProofreadingConfig {
    let mut config = match load_stored(store).await {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "config: failed to load, using defaults");
            ProofreadingConfig::default()
        }
    };
    apply_env_overrides(&mut config, |var| std::env::var(var).ok());
    config
}

pub async fn save(store: &dyn KeyValueStore, config: &ProofreadingConfig) -> Result<(), StoreError> {
    store::save(store, CONFIG_KEY, config).await
}

/// Restore the defaults and persist them.
pub async fn reset(store: &dyn KeyValueStore) -> Result<ProofreadingConfig, StoreError> {
    let config = ProofreadingConfig::default();
    save(store, &config).await?;
    Ok(config)
}
