use thiserror::Error;

use crate::gateway::GatewayError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum MigratorError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
