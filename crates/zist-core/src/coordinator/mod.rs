//! Optimistic mutation coordinator.
//!
//! Each mutation moves through Idle, Pending and Settled:
//!
//! - **Pending**: in-flight reads for the collection and entity keys are
//!   cancelled, both entries are snapshotted and the optimistic value is
//!   written.
//! - **Settled-Success**: the server record is merged over the cached one,
//!   the collection key and the file namespace are invalidated.
//! - **Settled-Failure**: the snapshot is restored.
//!
//! Remote failures are returned to the caller after the cache has been put
//! back; they never leave the cache half-written.

mod effects;

pub use effects::{ChannelEffects, NoopEffects, UiEffect, UiEffects};

use crate::cache::{CacheKey, GistCache, Namespace};
use crate::config::Route;
use crate::models::{GistCreatePayload, GistDraft, GistPatch, GistRecord};
use crate::network::{GistRemote, Session};
use crate::sidecar::{sidecar_config, update_description, SidecarConfig};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

/// Phase key used for creates, whose id is unknown until the server answers.
pub const NEW_GIST_KEY: &str = "<new>";

const CREATE_FAILED_MESSAGE: &str = "Failed to create gist";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationPhase {
    Idle,
    Pending,
    SettledSuccess,
    SettledFailure,
}

#[derive(Default)]
struct PhaseTable {
    pending: HashMap<String, usize>,
    settled: HashMap<String, MutationPhase>,
}

/// Marks a key Pending for as long as it lives.
struct PendingGuard<'a> {
    phases: &'a Mutex<PhaseTable>,
    key: String,
}

impl<'a> PendingGuard<'a> {
    fn enter(phases: &'a Mutex<PhaseTable>, key: &str) -> Self {
        *lock(phases).pending.entry(key.to_string()).or_default() += 1;
        Self {
            phases,
            key: key.to_string(),
        }
    }

    fn settle(&self, phase: MutationPhase) {
        lock(self.phases).settled.insert(self.key.clone(), phase);
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut table = lock(self.phases);
        if let Some(count) = table.pending.get_mut(&self.key) {
            *count -= 1;
            if *count == 0 {
                table.pending.remove(&self.key);
            }
        }
    }
}

/// Runs create, update and delete against the remote with optimistic cache
/// writes and rollback.
pub struct MutationCoordinator {
    cache: Arc<GistCache>,
    remote: Arc<dyn GistRemote>,
    session: Session,
    effects: Arc<dyn UiEffects>,
    phases: Mutex<PhaseTable>,
}

impl MutationCoordinator {
    pub fn new(
        cache: Arc<GistCache>,
        remote: Arc<dyn GistRemote>,
        session: Session,
        effects: Arc<dyn UiEffects>,
    ) -> Self {
        Self {
            cache,
            remote,
            session,
            effects,
            phases: Mutex::new(PhaseTable::default()),
        }
    }

    pub fn cache(&self) -> &Arc<GistCache> {
        &self.cache
    }

    /// Current phase of mutations on `key`. Settled phases read as Idle.
    pub fn phase(&self, key: &str) -> MutationPhase {
        if lock(&self.phases).pending.contains_key(key) {
            MutationPhase::Pending
        } else {
            MutationPhase::Idle
        }
    }

    /// How the most recent mutation on `key` settled.
    pub fn last_settled(&self, key: &str) -> Option<MutationPhase> {
        lock(&self.phases).settled.get(key).copied()
    }

    /// Apply a partial update optimistically, then reconcile with the server.
    ///
    /// Navigates to the dashboard on success. Failure restores the cache and
    /// emits no notification.
    pub async fn update(&self, patch: GistPatch) -> Result<GistRecord> {
        let owner = self.session.owner_key()?.to_string();
        let collection_key = CacheKey::gists(&owner);
        let entity_key = CacheKey::gist(&patch.id);
        let pending = PendingGuard::enter(&self.phases, &patch.id);

        self.cache.cancel_reads(&collection_key);
        self.cache.cancel_reads(&entity_key);
        let snapshot = self.cache.snapshot(&owner, Some(&patch.id));

        if let Some(current) = snapshot.gist() {
            self.cache
                .set_gist(current.overlay(&patch.to_overlay(current)));
        }
        self.cache.update_collection(&owner, |pages| {
            pages.update_record(&patch.id, |record| record.overlay(&patch.to_overlay(record)));
        });

        match self.remote.update_gist(&self.session, &patch).await {
            Ok(server) => {
                let merged = match self.cache.gist(&server.id) {
                    Some(cached) => cached.reconcile(&server),
                    None => server.clone(),
                };
                self.cache.set_gist(merged.clone());
                self.cache.update_collection(&owner, |pages| {
                    pages.update_record(&server.id, |record| record.reconcile(&server));
                });
                self.cache.invalidate(&collection_key);
                self.cache.invalidate_namespace(Namespace::GistFile);

                pending.settle(MutationPhase::SettledSuccess);
                info!("Updated gist {}", merged.id);
                self.effects.navigate(Route::DASHBOARD);
                Ok(merged)
            }
            Err(e) => {
                self.cache.restore(snapshot);
                pending.settle(MutationPhase::SettledFailure);
                warn!("Update of gist {} failed, rolled back: {}", patch.id, e);
                Err(e)
            }
        }
    }

    /// Create a gist. Nothing is written until the server confirms.
    ///
    /// Success prepends the new gist to the cached collection and navigates
    /// to the dashboard. Failure emits a notification.
    pub async fn create(&self, payload: GistCreatePayload) -> Result<GistRecord> {
        let owner = self.session.owner_key()?.to_string();
        let collection_key = CacheKey::gists(&owner);
        let pending = PendingGuard::enter(&self.phases, NEW_GIST_KEY);

        self.cache.cancel_reads(&collection_key);

        match self.remote.create_gist(&self.session, &payload).await {
            Ok(created) => {
                self.cache.update_collection(&owner, |pages| pages.prepend(created.clone()));
                self.cache.set_gist(created.clone());
                self.cache.invalidate(&collection_key);
                self.cache.invalidate_namespace(Namespace::GistFile);

                pending.settle(MutationPhase::SettledSuccess);
                info!("Created gist {}", created.id);
                self.effects.navigate(Route::DASHBOARD);
                Ok(created)
            }
            Err(e) => {
                pending.settle(MutationPhase::SettledFailure);
                warn!("Creating gist failed: {}", e);
                self.effects.notify_failure(CREATE_FAILED_MESSAGE);
                Err(e)
            }
        }
    }

    pub async fn create_draft(&self, draft: GistDraft) -> Result<GistRecord> {
        self.create(draft.into_payload()).await
    }

    /// Remove a gist from the cached collection at once, restoring it if the
    /// server refuses.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let owner = self.session.owner_key()?.to_string();
        let collection_key = CacheKey::gists(&owner);
        let pending = PendingGuard::enter(&self.phases, id);

        self.cache.cancel_reads(&collection_key);
        self.cache.cancel_reads(&CacheKey::gist(id));
        let snapshot = self.cache.snapshot(&owner, Some(id));

        self.cache.update_collection(&owner, |pages| {
            pages.remove_record(id);
        });

        match self.remote.delete_gist(&self.session, id).await {
            Ok(()) => {
                pending.settle(MutationPhase::SettledSuccess);
                info!("Deleted gist {}", id);
                Ok(())
            }
            Err(e) => {
                self.cache.restore(snapshot);
                pending.settle(MutationPhase::SettledFailure);
                warn!("Delete of gist {} failed, rolled back: {}", id, e);
                Err(e)
            }
        }
    }

    pub async fn set_category(&self, id: &str, category: &str) -> Result<GistRecord> {
        self.update_sidecar(id, |config| config.with_category(category))
            .await
    }

    pub async fn delete_category(&self, id: &str) -> Result<GistRecord> {
        self.update_sidecar(id, SidecarConfig::without_category).await
    }

    pub async fn set_tags(&self, id: &str, tags: Vec<String>) -> Result<GistRecord> {
        self.update_sidecar(id, |config| config.with_tags(tags)).await
    }

    pub async fn update_category_and_tags(
        &self,
        id: &str,
        category: Option<String>,
        tags: Option<Vec<String>>,
    ) -> Result<GistRecord> {
        self.update_sidecar(id, |config| config.merged(category, tags))
            .await
    }

    /// Rewrite the config part of a gist's description, keeping its text.
    async fn update_sidecar(
        &self,
        id: &str,
        edit: impl FnOnce(SidecarConfig) -> SidecarConfig,
    ) -> Result<GistRecord> {
        let description = self.current_description(id).await?;
        let config = edit(sidecar_config(&description));
        let patch =
            GistPatch::new(id).with_description(update_description(&description, &config));
        self.update(patch).await
    }

    async fn current_description(&self, id: &str) -> Result<String> {
        if let Some(record) = self.cache.gist(id) {
            return Ok(record.description);
        }
        if let Ok(owner) = self.session.owner_key() {
            if let Some(record) = self
                .cache
                .collection(owner)
                .and_then(|pages| pages.find(id).cloned())
            {
                return Ok(record.description);
            }
        }
        let record = self.remote.get_gist(&self.session, id).await?;
        Ok(record.description)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::GistPages;
    use crate::models::{DraftFile, FilePatch};
    use crate::network::GistScope;
    use crate::reader::GistReader;
    use crate::testing::{gist, MemoryRemote};
    use crate::ZistError;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Fixture {
        remote: Arc<MemoryRemote>,
        cache: Arc<GistCache>,
        coordinator: Arc<MutationCoordinator>,
        effects: UnboundedReceiver<UiEffect>,
    }

    impl Fixture {
        fn new() -> Self {
            let remote = Arc::new(MemoryRemote::new(
                vec![
                    gist("a", "alpha", "2024-01-03T00:00:00Z"),
                    gist("b", "beta", "2024-01-02T00:00:00Z"),
                    gist("c", "gamma", "2024-01-01T00:00:00Z"),
                ],
                2,
            ));
            let cache = Arc::new(GistCache::new());
            let (effects, rx) = ChannelEffects::new();
            let coordinator = Arc::new(MutationCoordinator::new(
                cache.clone(),
                remote.clone(),
                session(),
                Arc::new(effects),
            ));
            Self {
                remote,
                cache,
                coordinator,
                effects: rx,
            }
        }

        fn reader(&self) -> GistReader {
            GistReader::new(self.cache.clone(), self.remote.clone(), session())
        }

        /// Populate both the collection and the single-gist entries.
        async fn load(&self) {
            let reader = self.reader();
            reader.load_all(&GistScope::Authenticated).await.unwrap();
            for id in ["a", "b", "c"] {
                reader.get_gist(id).await.unwrap();
            }
        }

        fn collection(&self) -> GistPages {
            self.cache.collection("me").unwrap()
        }

        fn ids(&self) -> Vec<String> {
            self.collection().flatten().into_iter().map(|g| g.id).collect()
        }
    }

    fn session() -> Session {
        Session::authenticated("t", "me")
    }

    async fn wait_for_call(remote: &MemoryRemote, call: &str) {
        while remote.count(call) == 0 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_update_is_visible_while_pending() {
        let mut f = Fixture::new();
        f.load().await;
        let gate = f.remote.gate_writes();

        let task = tokio::spawn({
            let coordinator = f.coordinator.clone();
            async move {
                coordinator
                    .update(GistPatch::new("a").with_description("alpha v2"))
                    .await
            }
        });
        wait_for_call(&f.remote, "update a").await;

        assert_eq!(f.coordinator.phase("a"), MutationPhase::Pending);
        assert_eq!(f.cache.gist("a").unwrap().description, "alpha v2");
        assert_eq!(f.collection().find("a").unwrap().description, "alpha v2");

        gate.release();
        let updated = task.await.unwrap().unwrap();

        assert_eq!(updated.description, "alpha v2");
        assert!(updated.extra.contains_key("history"));
        assert_eq!(f.cache.gist("a").unwrap(), updated);
        assert_eq!(f.collection().find("a").unwrap().updated_at, "2030-01-01T00:00:00Z");
        assert!(f.cache.is_stale(&CacheKey::gists("me")));
        assert_eq!(f.coordinator.phase("a"), MutationPhase::Idle);
        assert_eq!(
            f.coordinator.last_settled("a"),
            Some(MutationPhase::SettledSuccess)
        );
        assert_eq!(
            f.effects.try_recv().unwrap(),
            UiEffect::Navigate(Route::DASHBOARD.into())
        );
    }

    #[tokio::test]
    async fn test_update_failure_restores_snapshot() {
        let mut f = Fixture::new();
        f.load().await;
        let before_collection = f.collection();
        let before_gist = f.cache.gist("b").unwrap();
        f.remote.fail_writes();

        let result = f
            .coordinator
            .update(
                GistPatch::new("b")
                    .with_description("beta v2")
                    .with_file(
                        "b.rs",
                        FilePatch {
                            filename: Some("b.py".into()),
                            content: Some("print()".into()),
                        },
                    ),
            )
            .await;

        assert!(result.unwrap_err().is_network_failure());
        assert_eq!(f.collection(), before_collection);
        assert_eq!(f.cache.gist("b").unwrap(), before_gist);
        assert!(!f.cache.is_stale(&CacheKey::gists("me")));
        assert_eq!(
            f.coordinator.last_settled("b"),
            Some(MutationPhase::SettledFailure)
        );
        // Update failures are silent.
        assert!(f.effects.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_update_invalidates_file_contents() {
        let f = Fixture::new();
        f.load().await;
        let reader = f.reader();
        let record = f.cache.gist("a").unwrap();
        reader.get_all_files(&record.files).await.unwrap();
        assert!(f.cache.file("https://raw.test/a/a.rs").is_some());

        f.coordinator
            .update(GistPatch::new("a").with_public(false))
            .await
            .unwrap();
        assert!(f.cache.file("https://raw.test/a/a.rs").is_none());
    }

    #[tokio::test]
    async fn test_update_discards_in_flight_read() {
        let f = Fixture::new();
        f.load().await;
        f.cache.invalidate(&CacheKey::gist("a"));
        let read_gate = f.remote.gate_reads();
        let write_gate = f.remote.gate_writes();

        let read = tokio::spawn({
            let reader = f.reader();
            async move { reader.get_gist("a").await }
        });
        wait_for_call(&f.remote, "get a").await;
        while f.cache.in_flight_reads(&CacheKey::gist("a")) == 0 {
            tokio::task::yield_now().await;
        }

        let update = tokio::spawn({
            let coordinator = f.coordinator.clone();
            async move {
                coordinator
                    .update(GistPatch::new("a").with_description("optimistic"))
                    .await
            }
        });
        wait_for_call(&f.remote, "update a").await;
        assert_eq!(f.cache.in_flight_reads(&CacheKey::gist("a")), 0);

        // The read now resolves with the pre-update server value.
        read_gate.release();
        let seen = read.await.unwrap().unwrap();
        assert_eq!(seen.description, "optimistic");
        assert_eq!(f.cache.gist("a").unwrap().description, "optimistic");

        write_gate.release();
        update.await.unwrap().unwrap();
        assert_eq!(f.cache.gist("a").unwrap().description, "optimistic");
    }

    #[tokio::test]
    async fn test_update_without_cache_writes_server_record() {
        let f = Fixture::new();
        let updated = f
            .coordinator
            .update(GistPatch::new("c").with_description("gamma v2"))
            .await
            .unwrap();

        assert_eq!(f.cache.gist("c").unwrap(), updated);
        assert!(f.cache.collection("me").is_none());
    }

    #[tokio::test]
    async fn test_overlapping_updates_roll_back_to_own_snapshot() {
        let f = Fixture::new();
        f.load().await;
        let gate = f.remote.gate_writes();
        f.remote.fail_next_writes(1);

        let first = tokio::spawn({
            let coordinator = f.coordinator.clone();
            async move {
                coordinator
                    .update(GistPatch::new("a").with_description("v1"))
                    .await
            }
        });
        wait_for_call(&f.remote, "update a").await;
        assert_eq!(f.cache.gist("a").unwrap().description, "v1");

        let second = tokio::spawn({
            let coordinator = f.coordinator.clone();
            async move {
                coordinator
                    .update(GistPatch::new("a").with_description("v2"))
                    .await
            }
        });
        while f.remote.count("update a") < 2 {
            tokio::task::yield_now().await;
        }
        assert_eq!(f.cache.gist("a").unwrap().description, "v2");
        assert_eq!(f.collection().find("a").unwrap().description, "v2");

        // The first write fails and puts back what it saw: the original.
        gate.release();
        assert!(first.await.unwrap().is_err());
        assert_eq!(f.cache.gist("a").unwrap().description, "alpha");
        assert_eq!(f.collection().find("a").unwrap().description, "alpha");
        assert_eq!(f.coordinator.phase("a"), MutationPhase::Pending);
        assert_eq!(
            f.coordinator.last_settled("a"),
            Some(MutationPhase::SettledFailure)
        );

        gate.release();
        let updated = second.await.unwrap().unwrap();
        assert_eq!(updated.description, "v2");
        assert_eq!(f.cache.gist("a").unwrap().description, "v2");
        assert_eq!(f.collection().find("a").unwrap().description, "v2");
        assert_eq!(f.coordinator.phase("a"), MutationPhase::Idle);
        assert_eq!(
            f.coordinator.last_settled("a"),
            Some(MutationPhase::SettledSuccess)
        );
    }

    #[tokio::test]
    async fn test_create_prepends_after_success() {
        let mut f = Fixture::new();
        f.load().await;
        let gate = f.remote.gate_writes();

        let task = tokio::spawn({
            let coordinator = f.coordinator.clone();
            async move {
                coordinator
                    .create_draft(GistDraft {
                        description: "fresh".into(),
                        public: true,
                        files: vec![DraftFile {
                            filename: String::new(),
                            content: "hi".into(),
                        }],
                    })
                    .await
            }
        });
        wait_for_call(&f.remote, "create").await;

        // No optimistic write for creates.
        assert_eq!(f.coordinator.phase(NEW_GIST_KEY), MutationPhase::Pending);
        assert_eq!(f.ids(), vec!["a", "b", "c"]);

        gate.release();
        let created = task.await.unwrap().unwrap();

        assert!(created.files.contains_key("file1"));
        assert_eq!(f.ids(), vec![created.id.clone(), "a".into(), "b".into(), "c".into()]);
        assert_eq!(f.collection().pages.len(), 2);
        assert_eq!(f.cache.gist(&created.id).unwrap(), created);
        assert!(f.cache.is_stale(&CacheKey::gists("me")));
        assert_eq!(
            f.effects.try_recv().unwrap(),
            UiEffect::Navigate(Route::DASHBOARD.into())
        );
    }

    fn fresh_payload() -> GistCreatePayload {
        GistCreatePayload {
            description: "fresh".into(),
            public: true,
            files: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_create_discards_listing_started_before_it() {
        let f = Fixture::new();
        f.load().await;
        f.cache.invalidate(&CacheKey::gists("me"));
        let read_gate = f.remote.gate_reads();

        let listing = tokio::spawn({
            let reader = f.reader();
            async move { reader.fetch_next_page(&GistScope::Authenticated).await }
        });
        while f.cache.in_flight_reads(&CacheKey::gists("me")) == 0 {
            tokio::task::yield_now().await;
        }

        let created = f.coordinator.create(fresh_payload()).await.unwrap();
        assert_eq!(f.cache.in_flight_reads(&CacheKey::gists("me")), 0);

        read_gate.release();
        let seen = listing.await.unwrap().unwrap();
        assert_eq!(seen.flatten()[0].id, created.id);
        assert_eq!(f.ids()[0], created.id);
        assert!(f.cache.is_stale(&CacheKey::gists("me")));
    }

    #[tokio::test]
    async fn test_listing_started_during_create_keeps_collection_stale() {
        let f = Fixture::new();
        f.load().await;
        f.cache.invalidate(&CacheKey::gists("me"));
        let write_gate = f.remote.gate_writes();
        let read_gate = f.remote.gate_reads();

        let create = tokio::spawn({
            let coordinator = f.coordinator.clone();
            async move { coordinator.create(fresh_payload()).await }
        });
        wait_for_call(&f.remote, "create").await;

        // Issued while the create is pending, so not cancelled by it.
        let listing = tokio::spawn({
            let reader = f.reader();
            async move { reader.fetch_next_page(&GistScope::Authenticated).await }
        });
        while f.cache.in_flight_reads(&CacheKey::gists("me")) == 0 {
            tokio::task::yield_now().await;
        }

        write_gate.release();
        let created = create.await.unwrap().unwrap();
        read_gate.release();
        listing.await.unwrap().unwrap();

        assert!(f.cache.is_stale(&CacheKey::gists("me")));
        for _ in 0..3 {
            read_gate.release();
        }
        let refreshed = f.reader().load_all(&GistScope::Authenticated).await.unwrap();
        assert_eq!(refreshed[0].id, created.id);
    }

    #[tokio::test]
    async fn test_create_without_collection_leaves_it_absent() {
        let f = Fixture::new();
        f.coordinator
            .create(GistCreatePayload {
                description: "fresh".into(),
                public: false,
                files: Default::default(),
            })
            .await
            .unwrap();
        assert!(f.cache.collection("me").is_none());
    }

    #[tokio::test]
    async fn test_create_failure_notifies() {
        let mut f = Fixture::new();
        f.load().await;
        let before = f.collection();
        f.remote.fail_writes();

        let result = f
            .coordinator
            .create(GistCreatePayload {
                description: "doomed".into(),
                public: true,
                files: Default::default(),
            })
            .await;

        assert!(result.is_err());
        assert_eq!(f.collection(), before);
        assert_eq!(
            f.effects.try_recv().unwrap(),
            UiEffect::Failure("Failed to create gist".into())
        );
        assert_eq!(
            f.coordinator.last_settled(NEW_GIST_KEY),
            Some(MutationPhase::SettledFailure)
        );
    }

    #[tokio::test]
    async fn test_delete_removes_exactly_one_while_pending() {
        let mut f = Fixture::new();
        f.load().await;
        let gate = f.remote.gate_writes();

        let task = tokio::spawn({
            let coordinator = f.coordinator.clone();
            async move { coordinator.delete("b").await }
        });
        wait_for_call(&f.remote, "delete b").await;

        assert_eq!(f.ids(), vec!["a", "c"]);
        assert_eq!(f.collection().pages.len(), 2);

        gate.release();
        task.await.unwrap().unwrap();
        assert_eq!(f.ids(), vec!["a", "c"]);
        assert!(f.remote.stored("b").is_none());
        // Deletes do not navigate.
        assert!(f.effects.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_delete_failure_restores_record() {
        let mut f = Fixture::new();
        f.load().await;
        let before = f.collection();
        f.remote.fail_writes();

        assert!(f.coordinator.delete("c").await.is_err());
        assert_eq!(f.collection(), before);
        assert!(f.effects.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_sidecar_helpers_rewrite_description() {
        let f = Fixture::new();
        f.load().await;

        let record = f.coordinator.set_category("a", "demo").await.unwrap();
        assert_eq!(record.description, r#"alpha<-ZIST-CONFIG->{"category":"demo"}"#);

        let record = f
            .coordinator
            .set_tags("a", vec!["x".into(), "y".into()])
            .await
            .unwrap();
        assert_eq!(
            record.description,
            r#"alpha<-ZIST-CONFIG->{"category":"demo","tags":["x","y"]}"#
        );

        let record = f.coordinator.delete_category("a").await.unwrap();
        assert_eq!(record.description, r#"alpha<-ZIST-CONFIG->{"tags":["x","y"]}"#);

        let record = f
            .coordinator
            .update_category_and_tags("a", Some(String::new()), Some(vec![]))
            .await
            .unwrap();
        assert_eq!(record.description, r#"alpha<-ZIST-CONFIG->{"tags":[]}"#);
    }

    #[tokio::test]
    async fn test_sidecar_helper_fetches_uncached_description() {
        let f = Fixture::new();
        let record = f.coordinator.set_category("b", "notes").await.unwrap();
        assert_eq!(record.description, r#"beta<-ZIST-CONFIG->{"category":"notes"}"#);
        assert_eq!(f.remote.count("get b"), 1);
    }

    #[tokio::test]
    async fn test_mutations_need_identity() {
        let remote = Arc::new(MemoryRemote::new(vec![], 10));
        let coordinator = MutationCoordinator::new(
            Arc::new(GistCache::new()),
            remote.clone(),
            Session::anonymous(),
            Arc::new(NoopEffects),
        );

        let result = coordinator.delete("a").await;
        assert!(matches!(result, Err(ZistError::Unauthenticated { .. })));
        assert!(remote.calls().is_empty());
        assert_eq!(coordinator.phase("a"), MutationPhase::Idle);
    }
}
