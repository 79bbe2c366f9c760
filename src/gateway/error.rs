//! Erros de construção do gateway.
//!
//! Falhas das chamadas em si não são erros: viram
//! [`GatewayResult::Rejected`](super::GatewayResult::Rejected).

use thiserror::Error;

/// Erros que podem ocorrer ao montar o [`HttpGateway`](super::HttpGateway).
#[derive(Debug, Error)]
pub enum GatewayError {
    /// O cliente HTTP não pôde ser construído (ex.: backend TLS indisponível).
    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}
