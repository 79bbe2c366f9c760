//! Interface de terminal do migrador — spinner e saída colorida.
//!
//! Usa as crates `indicatif` para o spinner de progresso e `console` para
//! estilização com cores. O [`MigrationProgress`] acompanha visualmente
//! uma tentativa de migração no terminal.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::migration::{AttemptRecord, MigrationOutcome};
use crate::store::Client;

/// Indicador visual de progresso para uma tentativa de migração.
///
/// Exibe um spinner enquanto o gateway é consultado e mensagens
/// coloridas para sucesso (verde), falha (vermelho) e no-op (amarelo).
pub struct MigrationProgress {
    // Spinner do indicatif.
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl MigrationProgress {
    /// Inicia o spinner para o cliente informado.
    pub fn start(client_id: i64) -> Self {
        let pb = ProgressBar::new_spinner();
        // Template fixo; se falhar, o estilo padrão do spinner é mantido.
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("Migrating client {client_id}..."));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Finaliza o spinner e exibe o resultado da tentativa.
    pub fn complete(&self, record: &AttemptRecord) {
        self.pb.finish_and_clear();
        let id = record.client_id;
        match &record.outcome {
            MigrationOutcome::Succeeded => {
                println!("  {} Client {id} migrated", self.green.apply_to("✓"));
            }
            MigrationOutcome::AlreadyMigrated => {
                println!(
                    "  {} Client {id} is already migrated",
                    self.yellow.apply_to("•")
                );
            }
            MigrationOutcome::NotFound => {
                println!("  {} Client {id} not found", self.red.apply_to("✗"));
            }
            MigrationOutcome::GatewayFailed(detail) => {
                println!(
                    "  {} Migration of client {id} failed: {detail}",
                    self.red.apply_to("✗")
                );
            }
        }
    }

    /// Imprime o registro de auditoria formatado em JSON.
    pub fn print_audit(&self, record: &AttemptRecord) {
        let style = if record.outcome.is_success() {
            &self.green
        } else {
            &self.yellow
        };
        println!();
        println!("{}", style.apply_to("─── Attempt Record ───"));
        println!(
            "{}",
            serde_json::to_string_pretty(record).unwrap_or_default()
        );
    }
}

/// Imprime uma listagem de clientes como JSON.
pub fn print_clients(clients: &[Client]) {
    println!(
        "{}",
        serde_json::to_string_pretty(clients).unwrap_or_default()
    );
}
