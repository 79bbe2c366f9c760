use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use super::outcome::{AttemptRecord, MigrationOutcome};
use crate::gateway::{GatewayResult, MigrationGateway, MigrationRequest};
use crate::store::{Client, ClientStore, StoreError};

/// Failures that are not business outcomes.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

/// Drives one client at a time from legacy to migrated.
///
/// The gateway is called before the local write, and the write is guarded by
/// the flag value read at the start of the attempt. A rejected gateway call
/// leaves the record exactly as it was read.
///
/// Store calls made during an attempt run on the blocking pool.
pub struct Orchestrator<S, G> {
    store: Arc<S>,
    gateway: G,
}

impl<S, G> Orchestrator<S, G>
where
    S: ClientStore + Send + Sync + 'static,
    G: MigrationGateway,
{
    pub fn new(store: S, gateway: G) -> Self {
        Self {
            store: Arc::new(store),
            gateway,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Clients still waiting for migration.
    pub fn legacy_clients(&self) -> Result<Vec<Client>, MigrationError> {
        Ok(self.store.list_unmigrated()?)
    }

    /// Clients already moved to the new product.
    pub fn new_clients(&self) -> Result<Vec<Client>, MigrationError> {
        Ok(self.store.list_migrated()?)
    }

    /// Run one migration attempt for `id`.
    pub async fn migrate(&self, id: i64) -> Result<MigrationOutcome, MigrationError> {
        Ok(self.migrate_with_record(id).await?.outcome)
    }

    /// Run one migration attempt for `id`, returning its audit record.
    pub async fn migrate_with_record(&self, id: i64) -> Result<AttemptRecord, MigrationError> {
        let attempt_id = Uuid::new_v4();
        let started_at = Utc::now();
        let span = info_span!("migration_attempt", client_id = id, %attempt_id);

        let (outcome, gateway) = self.attempt(id).instrument(span.clone()).await?;

        let record = AttemptRecord::new(attempt_id, id, started_at, outcome, gateway);
        span.in_scope(|| {
            info!(
                outcome = %record.outcome,
                duration_ms = record.duration_ms,
                "migration attempt finished"
            );
        });
        Ok(record)
    }

    async fn attempt(
        &self,
        id: i64,
    ) -> Result<(MigrationOutcome, Option<GatewayResult>), MigrationError> {
        // LOAD
        let Some(mut client) = self.on_store(move |store| store.find_by_id(id)).await? else {
            warn!("client not found");
            return Ok((MigrationOutcome::NotFound, None));
        };

        // VALIDATE
        if client.migrated {
            warn!("client is already migrated");
            return Ok((MigrationOutcome::AlreadyMigrated, None));
        }

        // ANNOUNCE
        let request = MigrationRequest {
            id,
            name: client.name.clone(),
        };
        let result = self.gateway.migrate(&request).await;
        if !result.permits_commit() {
            let detail = result.rejection().unwrap_or_default().to_string();
            error!(%detail, "failed to migrate client to new product");
            return Ok((MigrationOutcome::GatewayFailed(detail), Some(result)));
        }

        // COMMIT
        client.mark_migrated();
        match self
            .on_store(move |store| store.save_guarded(client, false))
            .await
        {
            Ok(saved) => {
                info!(name = %saved.name, "successfully migrated client to new product");
                Ok((MigrationOutcome::Succeeded, Some(result)))
            }
            Err(StoreError::Conflict { .. }) => {
                warn!("client was migrated by a concurrent attempt");
                Ok((MigrationOutcome::AlreadyMigrated, Some(result)))
            }
            Err(err) => {
                error!(error = %err, "failed to persist migrated client");
                Err(err.into())
            }
        }
    }

    async fn on_store<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&S) -> Result<T, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(store.as_ref()))
            .await
            .map_err(|err| StoreError::Unavailable(format!("store task failed: {err}")))?
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::gateway::SkipReason;
    use crate::store::SqliteClientStore;

    struct MockGateway {
        result: GatewayResult,
        delay: Option<Duration>,
        calls: AtomicUsize,
        requests: Mutex<Vec<MigrationRequest>>,
    }

    impl MockGateway {
        fn returning(result: GatewayResult) -> Self {
            Self {
                result,
                delay: None,
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn confirmed() -> Self {
            Self::returning(GatewayResult::Confirmed)
        }

        fn rejected(detail: &str) -> Self {
            Self::returning(GatewayResult::Rejected(detail.to_string()))
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl MigrationGateway for MockGateway {
        async fn migrate(&self, request: &MigrationRequest) -> GatewayResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.result.clone()
        }
    }

    /// Store wrapper that can be told to fail reads or writes.
    struct FlakyStore {
        inner: SqliteClientStore,
        fail_reads: bool,
        fail_writes: bool,
    }

    impl ClientStore for FlakyStore {
        fn find_by_id(&self, id: i64) -> Result<Option<Client>, StoreError> {
            if self.fail_reads {
                return Err(StoreError::Unavailable("disk gone".into()));
            }
            self.inner.find_by_id(id)
        }

        fn list_unmigrated(&self) -> Result<Vec<Client>, StoreError> {
            self.inner.list_unmigrated()
        }

        fn list_migrated(&self) -> Result<Vec<Client>, StoreError> {
            self.inner.list_migrated()
        }

        fn save(&self, client: Client) -> Result<Client, StoreError> {
            self.inner.save(client)
        }

        fn save_guarded(&self, client: Client, expected: bool) -> Result<Client, StoreError> {
            if self.fail_writes {
                return Err(StoreError::Unavailable("disk full".into()));
            }
            self.inner.save_guarded(client, expected)
        }
    }

    /// Store wrapper whose calls hold the calling thread, like a busy database lock.
    struct StallingStore {
        inner: SqliteClientStore,
        stall: Duration,
    }

    impl ClientStore for StallingStore {
        fn find_by_id(&self, id: i64) -> Result<Option<Client>, StoreError> {
            std::thread::sleep(self.stall);
            self.inner.find_by_id(id)
        }

        fn list_unmigrated(&self) -> Result<Vec<Client>, StoreError> {
            self.inner.list_unmigrated()
        }

        fn list_migrated(&self) -> Result<Vec<Client>, StoreError> {
            self.inner.list_migrated()
        }

        fn save(&self, client: Client) -> Result<Client, StoreError> {
            self.inner.save(client)
        }

        fn save_guarded(&self, client: Client, expected: bool) -> Result<Client, StoreError> {
            std::thread::sleep(self.stall);
            self.inner.save_guarded(client, expected)
        }
    }

    fn seeded_store(clients: &[(&str, bool)]) -> SqliteClientStore {
        let store = SqliteClientStore::in_memory().unwrap();
        for (name, migrated) in clients {
            let mut client = Client::new(*name);
            client.migrated = *migrated;
            store.save(client).unwrap();
        }
        store
    }

    #[tokio::test]
    async fn confirmed_gateway_migrates_client() {
        let orch = Orchestrator::new(seeded_store(&[("Client A", false)]), MockGateway::confirmed());

        let outcome = orch.migrate(1).await.unwrap();

        assert_eq!(outcome, MigrationOutcome::Succeeded);
        assert!(orch.store().find_by_id(1).unwrap().unwrap().migrated);
        assert_eq!(orch.gateway().calls(), 1);
    }

    #[tokio::test]
    async fn gateway_receives_id_and_current_name() {
        let store = seeded_store(&[("Client A", false)]);
        let mut renamed = store.find_by_id(1).unwrap().unwrap();
        renamed.name = "Client A Renamed".into();
        store.save(renamed).unwrap();

        let orch = Orchestrator::new(store, MockGateway::confirmed());
        orch.migrate(1).await.unwrap();

        let requests = orch.gateway().requests.lock().unwrap().clone();
        assert_eq!(
            requests,
            vec![MigrationRequest {
                id: 1,
                name: "Client A Renamed".into()
            }]
        );
    }

    #[tokio::test]
    async fn already_migrated_skips_gateway_and_store() {
        let orch = Orchestrator::new(seeded_store(&[("Client A", true)]), MockGateway::confirmed());
        let before = orch.store().find_by_id(1).unwrap();

        let outcome = orch.migrate(1).await.unwrap();

        assert_eq!(outcome, MigrationOutcome::AlreadyMigrated);
        assert_eq!(orch.gateway().calls(), 0);
        assert_eq!(orch.store().find_by_id(1).unwrap(), before);
    }

    #[tokio::test]
    async fn second_attempt_reports_already_migrated() {
        let orch = Orchestrator::new(seeded_store(&[("Client A", false)]), MockGateway::confirmed());

        assert_eq!(orch.migrate(1).await.unwrap(), MigrationOutcome::Succeeded);
        assert_eq!(orch.migrate(1).await.unwrap(), MigrationOutcome::AlreadyMigrated);
        assert_eq!(orch.gateway().calls(), 1);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let orch = Orchestrator::new(
            SqliteClientStore::in_memory().unwrap(),
            MockGateway::confirmed(),
        );

        assert_eq!(orch.migrate(999).await.unwrap(), MigrationOutcome::NotFound);
        assert_eq!(orch.gateway().calls(), 0);
        assert_eq!(orch.store().count().unwrap(), 0);
    }

    #[tokio::test]
    async fn rejected_gateway_leaves_record_untouched() {
        let orch = Orchestrator::new(
            seeded_store(&[("Client A", false), ("Client B", false)]),
            MockGateway::rejected("Failed to migrate client to new product. Status: 500"),
        );

        let outcome = orch.migrate(2).await.unwrap();

        assert_eq!(
            outcome,
            MigrationOutcome::GatewayFailed(
                "Failed to migrate client to new product. Status: 500".into()
            )
        );
        let legacy = orch.legacy_clients().unwrap();
        assert!(legacy.contains(&Client {
            id: Some(2),
            name: "Client B".into(),
            migrated: false,
        }));
        assert!(orch.new_clients().unwrap().is_empty());
    }

    #[tokio::test]
    async fn skipped_gateway_counts_as_success() {
        for reason in [SkipReason::Disabled, SkipReason::Unconfigured] {
            let orch = Orchestrator::new(
                seeded_store(&[("Client A", false)]),
                MockGateway::returning(GatewayResult::Skipped(reason)),
            );
            assert_eq!(orch.migrate(1).await.unwrap(), MigrationOutcome::Succeeded);
            assert_eq!(orch.new_clients().unwrap().len(), 1);
        }
    }

    #[tokio::test]
    async fn store_read_failure_is_not_a_gateway_failure() {
        let store = FlakyStore {
            inner: seeded_store(&[("Client A", false)]),
            fail_reads: true,
            fail_writes: false,
        };
        let orch = Orchestrator::new(store, MockGateway::confirmed());

        let err = orch.migrate(1).await.unwrap_err();

        assert!(matches!(err, MigrationError::Store(StoreError::Unavailable(_))));
        assert_eq!(orch.gateway().calls(), 0);
    }

    #[tokio::test]
    async fn store_write_failure_surfaces_and_keeps_record() {
        let store = FlakyStore {
            inner: seeded_store(&[("Client A", false)]),
            fail_reads: false,
            fail_writes: true,
        };
        let orch = Orchestrator::new(store, MockGateway::confirmed());

        let err = orch.migrate(1).await.unwrap_err();

        assert!(matches!(err, MigrationError::Store(_)));
        assert!(!orch.store().inner.find_by_id(1).unwrap().unwrap().migrated);
    }

    #[tokio::test]
    async fn concurrent_attempts_for_same_client_succeed_once() {
        let mut gateway = MockGateway::confirmed();
        gateway.delay = Some(Duration::from_millis(50));
        let orch = Orchestrator::new(seeded_store(&[("Client A", false)]), gateway);

        let (first, second) = tokio::join!(orch.migrate(1), orch.migrate(1));
        let outcomes = [first.unwrap(), second.unwrap()];

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        assert_eq!(succeeded, 1);
        assert!(outcomes.contains(&MigrationOutcome::AlreadyMigrated));
        assert_eq!(orch.new_clients().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn attempts_for_different_clients_are_independent() {
        let mut gateway = MockGateway::confirmed();
        gateway.delay = Some(Duration::from_millis(20));
        let orch = Orchestrator::new(
            seeded_store(&[("Client A", false), ("Client B", false)]),
            gateway,
        );

        let (a, b) = tokio::join!(orch.migrate(1), orch.migrate(2));

        assert_eq!(a.unwrap(), MigrationOutcome::Succeeded);
        assert_eq!(b.unwrap(), MigrationOutcome::Succeeded);
        assert!(orch.legacy_clients().unwrap().is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn stalled_store_does_not_block_the_runtime() {
        let store = StallingStore {
            inner: seeded_store(&[("Client A", false)]),
            stall: Duration::from_millis(200),
        };
        let orch = Orchestrator::new(store, MockGateway::confirmed());

        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = tokio::spawn({
            let ticks = ticks.clone();
            async move {
                loop {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    ticks.fetch_add(1, Ordering::SeqCst);
                }
            }
        });

        let outcome = orch.migrate(1).await.unwrap();
        ticker.abort();

        assert_eq!(outcome, MigrationOutcome::Succeeded);
        assert!(
            ticks.load(Ordering::SeqCst) >= 10,
            "runtime made no progress while the store was busy"
        );
    }

    #[tokio::test]
    async fn record_captures_gateway_answer() {
        let orch = Orchestrator::new(
            seeded_store(&[("Client A", false)]),
            MockGateway::returning(GatewayResult::Skipped(SkipReason::Disabled)),
        );

        let record = orch.migrate_with_record(1).await.unwrap();

        assert_eq!(record.client_id, 1);
        assert_eq!(record.outcome, MigrationOutcome::Succeeded);
        assert_eq!(
            record.gateway,
            Some(GatewayResult::Skipped(SkipReason::Disabled))
        );
    }

    #[tokio::test]
    async fn record_has_no_gateway_answer_when_not_found() {
        let orch = Orchestrator::new(
            SqliteClientStore::in_memory().unwrap(),
            MockGateway::confirmed(),
        );
        let record = orch.migrate_with_record(7).await.unwrap();
        assert_eq!(record.outcome, MigrationOutcome::NotFound);
        assert!(record.gateway.is_none());
    }
}
