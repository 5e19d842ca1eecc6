//! In-memory [`GistRemote`] used by unit tests.

use crate::models::{GistCreatePayload, GistPatch, GistRecord, GitHubUser};
use crate::network::{GistRemote, GistScope, Session};
use crate::{Result, ZistError};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Record with one file named after its id.
pub(crate) fn gist(id: &str, description: &str, updated_at: &str) -> GistRecord {
    serde_json::from_value(json!({
        "id": id,
        "description": description,
        "public": true,
        "created_at": updated_at,
        "updated_at": updated_at,
        "files": {
            format!("{}.rs", id): {
                "filename": format!("{}.rs", id),
                "size": 4,
                "raw_url": format!("https://raw.test/{}/{}.rs", id, id),
                "language": "Rust",
                "type": "text/plain"
            }
        }
    }))
    .unwrap()
}

/// Blocks a call until the test adds a permit.
#[derive(Clone)]
pub(crate) struct Gate(Arc<Semaphore>);

impl Default for Gate {
    fn default() -> Self {
        Gate(Arc::new(Semaphore::new(0)))
    }
}

impl Gate {
    pub fn release(&self) {
        self.0.add_permits(1);
    }

    async fn pass(&self) {
        self.0.acquire().await.unwrap().forget();
    }
}

pub(crate) struct MemoryRemote {
    gists: Mutex<Vec<GistRecord>>,
    files: Mutex<HashMap<String, String>>,
    page_size: usize,
    fail_writes: AtomicBool,
    failing_writes: AtomicUsize,
    read_gate: Mutex<Option<Gate>>,
    write_gate: Mutex<Option<Gate>>,
    next_id: AtomicUsize,
    pub calls: Mutex<Vec<String>>,
}

impl MemoryRemote {
    pub fn new(gists: Vec<GistRecord>, page_size: usize) -> Self {
        let files = gists
            .iter()
            .flat_map(|g| g.files.values())
            .map(|f| (f.raw_url.clone(), format!("content of {}", f.filename)))
            .collect();
        Self {
            gists: Mutex::new(gists),
            files: Mutex::new(files),
            page_size,
            fail_writes: AtomicBool::new(false),
            failing_writes: AtomicUsize::new(0),
            read_gate: Mutex::new(None),
            write_gate: Mutex::new(None),
            next_id: AtomicUsize::new(1),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Fail only the next `count` writes that get past the write gate.
    pub fn fail_next_writes(&self, count: usize) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    pub fn gate_reads(&self) -> Gate {
        let gate = Gate::default();
        *self.read_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn gate_writes(&self) -> Gate {
        let gate = Gate::default();
        *self.write_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn stored(&self, id: &str) -> Option<GistRecord> {
        self.gists.lock().unwrap().iter().find(|g| g.id == id).cloned()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    async fn before_read(&self) {
        let gate = self.read_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }
    }

    async fn before_write(&self) -> Result<()> {
        let gate = self.write_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        let failing_once = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing_once || self.fail_writes.load(Ordering::SeqCst) {
            return Err(ZistError::Network {
                message: "connection reset".into(),
                cause: None,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl GistRemote for MemoryRemote {
    async fn list_page(
        &self,
        _session: &Session,
        scope: &GistScope,
        page: u32,
    ) -> Result<Vec<GistRecord>> {
        self.record(format!("list {} {}", scope, page));
        self.before_read().await;
        let gists = self.gists.lock().unwrap();
        let start = (page as usize - 1) * self.page_size;
        Ok(gists
            .iter()
            .skip(start)
            .take(self.page_size)
            .cloned()
            .collect())
    }

    async fn get_gist(&self, _session: &Session, id: &str) -> Result<GistRecord> {
        self.record(format!("get {}", id));
        self.before_read().await;
        self.stored(id).ok_or_else(|| ZistError::NotFound {
            resource: format!("gist {}", id),
        })
    }

    async fn create_gist(
        &self,
        _session: &Session,
        payload: &GistCreatePayload,
    ) -> Result<GistRecord> {
        self.record("create".to_string());
        self.before_write().await?;
        let id = format!("new{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let files: serde_json::Map<String, serde_json::Value> = payload
            .files
            .iter()
            .map(|(name, file)| {
                let raw_url = format!("https://raw.test/{}/{}", id, name);
                self.files
                    .lock()
                    .unwrap()
                    .insert(raw_url.clone(), file.content.clone());
                (
                    name.clone(),
                    json!({
                        "filename": name,
                        "size": file.content.len(),
                        "raw_url": raw_url,
                        "language": file.language,
                    }),
                )
            })
            .collect();
        let created: GistRecord = serde_json::from_value(json!({
            "id": id,
            "description": payload.description,
            "public": payload.public,
            "created_at": "2030-01-01T00:00:00Z",
            "updated_at": "2030-01-01T00:00:00Z",
            "files": files,
            "html_url": format!("https://gist.test/{}", id),
        }))
        .unwrap();
        self.gists.lock().unwrap().insert(0, created.clone());
        Ok(created)
    }

    async fn update_gist(&self, _session: &Session, patch: &GistPatch) -> Result<GistRecord> {
        self.record(format!("update {}", patch.id));
        self.before_write().await?;
        let mut gists = self.gists.lock().unwrap();
        let stored = gists
            .iter_mut()
            .find(|g| g.id == patch.id)
            .ok_or_else(|| ZistError::NotFound {
                resource: format!("gist {}", patch.id),
            })?;
        let mut updated = stored.overlay(&patch.to_overlay(stored));
        updated.updated_at = "2030-01-01T00:00:00Z".to_string();
        updated
            .extra
            .insert("history".into(), json!([{"version": "v2"}]));
        *stored = updated.clone();
        Ok(updated)
    }

    async fn delete_gist(&self, _session: &Session, id: &str) -> Result<()> {
        self.record(format!("delete {}", id));
        self.before_write().await?;
        let mut gists = self.gists.lock().unwrap();
        let before = gists.len();
        gists.retain(|g| g.id != id);
        if gists.len() == before {
            return Err(ZistError::NotFound {
                resource: format!("gist {}", id),
            });
        }
        Ok(())
    }

    async fn fetch_raw(&self, raw_url: &str) -> Result<String> {
        self.record(format!("raw {}", raw_url));
        self.files
            .lock()
            .unwrap()
            .get(raw_url)
            .cloned()
            .ok_or_else(|| ZistError::NotFound {
                resource: raw_url.to_string(),
            })
    }

    async fn get_user(&self, _session: &Session, username: &str) -> Result<GitHubUser> {
        self.record(format!("user {}", username));
        Ok(serde_json::from_value(json!({"login": username, "id": 7})).unwrap())
    }
}
