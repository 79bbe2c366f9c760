mod orchestrator;
mod outcome;

pub use orchestrator::{MigrationError, Orchestrator};
pub use outcome::{AttemptRecord, MigrationOutcome};
