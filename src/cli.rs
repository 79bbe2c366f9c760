//! Interface de linha de comando do migrador baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (serve, legacy,
//! migrated, migrate) e flags globais (--config, --database, --verbose).

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// client-migrator — Migra clientes legados para o novo produto, um de cada vez.
#[derive(Debug, Parser)]
#[command(name = "client-migrator", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Arquivo de configuração (padrão: ./client-migrator.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Banco SQLite a usar, sobrescrevendo o da configuração.
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sobe o servidor HTTP.
    Serve {
        /// Endereço de escuta, sobrescrevendo `bind` da configuração.
        #[arg(long)]
        bind: Option<SocketAddr>,
    },

    /// Lista os clientes ainda não migrados.
    Legacy,

    /// Lista os clientes já migrados.
    Migrated,

    /// Migra um único cliente e mostra o registro de auditoria.
    Migrate {
        /// Identificador do cliente.
        id: i64,
    },
}
