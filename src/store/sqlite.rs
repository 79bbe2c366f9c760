use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};

use super::{Client, ClientStore, StoreError};

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS clients (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL CHECK (length(name) > 0),
  migrated INTEGER NOT NULL DEFAULT 0 CHECK (migrated IN (0, 1))
);

CREATE INDEX IF NOT EXISTS idx_clients_migrated ON clients(migrated, id);
";

const SAMPLE_CLIENTS: &[&str] = &["Client A", "Client B"];

/// SQLite-backed [`ClientStore`].
///
/// The connection sits behind a mutex; every operation locks, runs and
/// releases before returning, so callers never hold the lock across an await.
pub struct SqliteClientStore {
    conn: Mutex<Connection>,
}

impl SqliteClientStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|err| {
            StoreError::Unavailable(format!(
                "failed to open sqlite database at {}: {err}",
                path.display()
            ))
        })?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Self::bootstrap(conn)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|err| StoreError::Unavailable(format!("failed to open sqlite: {err}")))?;
        Self::bootstrap(conn)
    }

    fn bootstrap(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".into()))
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM clients", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Inserts the sample legacy clients when the table is empty.
    /// Returns how many rows were inserted.
    pub fn seed_sample_clients(&self) -> Result<usize, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let existing: i64 = tx.query_row("SELECT COUNT(*) FROM clients", [], |row| row.get(0))?;
        if existing > 0 {
            debug!(existing, "store already populated, skipping sample clients");
            return Ok(0);
        }

        for name in SAMPLE_CLIENTS {
            insert(&tx, &Client::new(*name))?;
        }
        tx.commit()?;

        info!(count = SAMPLE_CLIENTS.len(), "initialized database with sample clients");
        Ok(SAMPLE_CLIENTS.len())
    }

    fn list_by_flag(&self, migrated: bool) -> Result<Vec<Client>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, migrated FROM clients WHERE migrated = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![migrated], map_row)?;
        let clients = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(clients)
    }
}

impl ClientStore for SqliteClientStore {
    fn find_by_id(&self, id: i64) -> Result<Option<Client>, StoreError> {
        let conn = self.lock()?;
        let client = conn
            .query_row(
                "SELECT id, name, migrated FROM clients WHERE id = ?1",
                params![id],
                map_row,
            )
            .optional()?;
        Ok(client)
    }

    fn list_unmigrated(&self) -> Result<Vec<Client>, StoreError> {
        self.list_by_flag(false)
    }

    fn list_migrated(&self) -> Result<Vec<Client>, StoreError> {
        self.list_by_flag(true)
    }

    fn save(&self, client: Client) -> Result<Client, StoreError> {
        let conn = self.lock()?;
        match client.id {
            None => {
                let id = insert(&conn, &client)?;
                Ok(Client {
                    id: Some(id),
                    ..client
                })
            }
            Some(id) => {
                let updated = conn.execute(
                    "UPDATE clients SET name = ?2, migrated = ?3 WHERE id = ?1",
                    params![id, client.name, client.migrated],
                )?;
                if updated == 0 {
                    return Err(StoreError::NotFound { id });
                }
                Ok(client)
            }
        }
    }

    fn save_guarded(&self, client: Client, expected_migrated: bool) -> Result<Client, StoreError> {
        let id = client.id.ok_or(StoreError::MissingId)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        // Only the flag changes hands here; the name stays whatever is stored now.
        let updated = tx.execute(
            "UPDATE clients SET migrated = ?2 WHERE id = ?1 AND migrated = ?3",
            params![id, client.migrated, expected_migrated],
        )?;
        if updated == 0 {
            let exists = tx
                .query_row("SELECT 1 FROM clients WHERE id = ?1", params![id], |_| Ok(()))
                .optional()?
                .is_some();
            return Err(if exists {
                StoreError::Conflict { id }
            } else {
                StoreError::NotFound { id }
            });
        }

        let saved = tx.query_row(
            "SELECT id, name, migrated FROM clients WHERE id = ?1",
            params![id],
            map_row,
        )?;
        tx.commit()?;
        Ok(saved)
    }
}

fn insert(conn: &Connection, client: &Client) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO clients(name, migrated) VALUES (?1, ?2)",
        params![client.name, client.migrated],
    )?;
    Ok(conn.last_insert_rowid())
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<Client> {
    Ok(Client {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        migrated: row.get(2)?,
    })
}
