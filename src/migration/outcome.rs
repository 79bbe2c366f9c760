use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::gateway::GatewayResult;

/// The result of one migration attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum MigrationOutcome {
    /// The client is now marked migrated.
    Succeeded,
    /// The client was migrated before this attempt; nothing changed.
    AlreadyMigrated,
    NotFound,
    /// The new product rejected the migration or was unreachable.
    /// The local record is unchanged.
    GatewayFailed(String),
}

impl MigrationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, MigrationOutcome::Succeeded)
    }
}

impl std::fmt::Display for MigrationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationOutcome::Succeeded => write!(f, "succeeded"),
            MigrationOutcome::AlreadyMigrated => write!(f, "already migrated"),
            MigrationOutcome::NotFound => write!(f, "not found"),
            MigrationOutcome::GatewayFailed(detail) => write!(f, "gateway failed: {detail}"),
        }
    }
}

/// Structured audit record produced at the end of an attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub attempt_id: Uuid,
    pub client_id: i64,
    pub outcome: MigrationOutcome,
    /// What the gateway answered, when it was consulted at all.
    pub gateway: Option<GatewayResult>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: i64,
}

impl AttemptRecord {
    pub fn new(
        attempt_id: Uuid,
        client_id: i64,
        started_at: DateTime<Utc>,
        outcome: MigrationOutcome,
        gateway: Option<GatewayResult>,
    ) -> Self {
        let completed_at = Utc::now();
        Self {
            attempt_id,
            client_id,
            outcome,
            gateway,
            started_at,
            completed_at,
            duration_ms: (completed_at - started_at).num_milliseconds(),
        }
    }
}
