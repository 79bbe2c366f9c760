pub mod client;
pub mod error;
pub mod types;

use std::future::Future;

pub use client::HttpGateway;
pub use error::GatewayError;
pub use types::{GatewayConfig, GatewayResult, MigrationRequest, SkipReason};

/// Announces a migration to the new product.
///
/// Implementations make at most one outbound call per invocation and never
/// touch local state.
pub trait MigrationGateway {
    fn migrate(&self, request: &MigrationRequest) -> impl Future<Output = GatewayResult> + Send;
}
