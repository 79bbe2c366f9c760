//! Tipos de dados trocados com a API do novo produto.
//!
//! O [`MigrationRequest`] é serializado como JSON no corpo do POST de saída.
//! O [`GatewayResult`] classifica o resultado de uma única chamada.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuração imutável do gateway, fornecida na construção.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// URL de destino das chamadas de migração. Vazia significa não configurada.
    pub api_url: String,
    /// Interruptor administrativo da migração externa.
    pub enabled: bool,
    /// Limite aplicado tanto à conexão quanto à leitura da resposta.
    pub timeout: Duration,
}

/// Corpo da requisição enviada ao novo produto.
///
/// É um retrato de `{id, name}` tirado do cliente no início da tentativa.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRequest {
    pub id: i64,
    pub name: String,
}

/// Motivo pelo qual nenhuma chamada de rede foi feita.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A migração externa está desabilitada na configuração.
    Disabled,
    /// Nenhuma URL de destino foi configurada.
    Unconfigured,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Disabled => write!(f, "disabled"),
            SkipReason::Unconfigured => write!(f, "unconfigured"),
        }
    }
}

/// Resultado de uma chamada ao gateway.
///
/// - [`Skipped`](GatewayResult::Skipped): nenhuma chamada feita, não é erro
/// - [`Confirmed`](GatewayResult::Confirmed): o destino respondeu 2xx
/// - [`Rejected`](GatewayResult::Rejected): status não-2xx ou falha de transporte
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum GatewayResult {
    Skipped(SkipReason),
    Confirmed,
    Rejected(String),
}

impl GatewayResult {
    /// `Skipped` e `Confirmed` autorizam a gravação local.
    pub fn permits_commit(&self) -> bool {
        self.rejection().is_none()
    }

    /// Motivo da recusa, quando o novo produto recusou a migração.
    pub fn rejection(&self) -> Option<&str> {
        match self {
            GatewayResult::Rejected(detail) => Some(detail),
            _ => None,
        }
    }
}
