//! Configuração do migrador carregada a partir de `client-migrator.toml`.
//!
//! A struct [`MigratorConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! As variáveis de ambiente `MIGRATION_*` têm precedência sobre o arquivo.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::MigratorError;
use crate::gateway::GatewayConfig;

/// Nome do arquivo procurado no diretório atual.
pub const CONFIG_FILE: &str = "client-migrator.toml";

const ENV_API_URL: &str = "MIGRATION_NEW_PRODUCT_API_URL";
const ENV_ENABLE: &str = "MIGRATION_ENABLE_EXTERNAL_MIGRATION";
const ENV_TIMEOUT: &str = "MIGRATION_TIMEOUT_SECONDS";

/// Configuração de nível superior carregada de `client-migrator.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct MigratorConfig {
    /// URL da API do novo produto. Vazia desativa a chamada externa.
    #[serde(default)]
    pub new_product_api_url: String,

    /// Habilita a chamada externa de migração.
    #[serde(default = "default_enable_external_migration")]
    pub enable_external_migration: bool,

    /// Limite em segundos para conexão e leitura da chamada externa.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Endereço em que o servidor HTTP escuta.
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,

    /// Caminho do banco SQLite. Ausente usa um banco em memória.
    #[serde(default)]
    pub database: Option<PathBuf>,

    /// Insere os clientes de exemplo quando o banco está vazio.
    #[serde(default = "default_seed_sample_clients")]
    pub seed_sample_clients: bool,
}

// Valor padrão para a migração externa: habilitada.
fn default_enable_external_migration() -> bool {
    true
}

// Valor padrão para o timeout: 30 segundos.
fn default_timeout_seconds() -> u64 {
    30
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_seed_sample_clients() -> bool {
    true
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            new_product_api_url: String::new(),
            enable_external_migration: default_enable_external_migration(),
            timeout_seconds: default_timeout_seconds(),
            bind: default_bind(),
            database: None,
            seed_sample_clients: default_seed_sample_clients(),
        }
    }
}

impl MigratorConfig {
    /// Carrega a configuração de `client-migrator.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self, MigratorError> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Carrega a configuração de um caminho explícito, aplicando o ambiente.
    pub fn load_from(path: &Path) -> Result<Self, MigratorError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<MigratorConfig>(&contents)?
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Sobrescreve campos com as variáveis `MIGRATION_*` encontradas por `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), MigratorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            self.new_product_api_url = url;
        }

        if let Some(raw) = lookup(ENV_ENABLE) {
            self.enable_external_migration =
                raw.trim().to_ascii_lowercase().parse::<bool>().map_err(|_| {
                    MigratorError::Config(format!("{ENV_ENABLE} must be true or false, got {raw:?}"))
                })?;
        }

        if let Some(raw) = lookup(ENV_TIMEOUT) {
            self.timeout_seconds = raw.trim().parse::<u64>().map_err(|_| {
                MigratorError::Config(format!(
                    "{ENV_TIMEOUT} must be a whole number of seconds, got {raw:?}"
                ))
            })?;
        }

        Ok(())
    }

    /// Rejeita um timeout zero: a chamada externa precisa de espera limitada.
    pub fn validate(&self) -> Result<(), MigratorError> {
        if self.timeout_seconds == 0 {
            return Err(MigratorError::Config(
                "timeout_seconds must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Configuração imutável entregue ao gateway.
    pub fn gateway(&self) -> GatewayConfig {
        GatewayConfig {
            api_url: self.new_product_api_url.clone(),
            enabled: self.enable_external_migration,
            timeout: Duration::from_secs(self.timeout_seconds),
        }
    }
}
