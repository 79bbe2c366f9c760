use serde::{Deserialize, Serialize};

/// A client record tracked by the migrator.
///
/// `id` is assigned by the store on first save and never changes afterwards.
/// `migrated` only ever moves from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub migrated: bool,
}

impl Client {
    /// A new legacy client, not yet persisted.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            migrated: false,
        }
    }

    pub fn mark_migrated(&mut self) {
        self.migrated = true;
    }
}
