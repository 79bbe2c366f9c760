mod error;
mod model;
mod sqlite;

pub use error::StoreError;
pub use model::Client;
pub use sqlite::SqliteClientStore;

/// Persistence contract for client records.
///
/// Implementations do not enforce business rules; they only persist and
/// retrieve. Listings are ordered by ascending id.
pub trait ClientStore {
    fn find_by_id(&self, id: i64) -> Result<Option<Client>, StoreError>;

    fn list_unmigrated(&self) -> Result<Vec<Client>, StoreError>;

    fn list_migrated(&self) -> Result<Vec<Client>, StoreError>;

    /// Inserts a client without an id, or overwrites the row of one with an id.
    fn save(&self, client: Client) -> Result<Client, StoreError>;

    /// Sets the stored `migrated` flag to `client.migrated` only if it still
    /// equals `expected_migrated`, leaving other columns as stored, and returns
    /// the row as written. Returns [`StoreError::Conflict`] otherwise.
    fn save_guarded(&self, client: Client, expected_migrated: bool) -> Result<Client, StoreError>;
}
