//! Session-wide key-value store for gist data.
//!
//! The store is the only shared mutable state. Reads register a
//! [`ReadTicket`] before going to the network; a mutation cancels the tickets
//! for the keys it touches so a late read cannot overwrite its optimistic
//! value.

use super::key::{CacheKey, Namespace};
use super::pages::GistPages;
use crate::cancel::CancellationToken;
use crate::config::NetworkConfig;
use crate::models::GistRecord;
use crate::{Result, ZistError};
use mini_moka::sync::Cache;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
struct Entry<T> {
    value: T,
    stale: bool,
    /// Generation of the last invalidation, 0 if never invalidated.
    invalidated: u64,
}

impl<T> Entry<T> {
    fn fresh(value: T) -> Self {
        Self {
            value,
            stale: false,
            invalidated: 0,
        }
    }

    fn invalidate(&mut self, generation: u64) {
        self.stale = true;
        self.invalidated = generation;
    }

    /// Entry for a read result issued at generation `issued`.
    ///
    /// An invalidation that happened after the read was issued stays in
    /// force, so the next read still refetches.
    fn committed(value: T, previous: Option<&Entry<T>>, issued: u64) -> Self {
        match previous {
            Some(prev) if prev.stale && prev.invalidated > issued => Self {
                value,
                stale: true,
                invalidated: prev.invalidated,
            },
            _ => Self::fresh(value),
        }
    }
}

/// Copy of the collection and entity entries taken before an optimistic write.
///
/// A side is `None` when nothing was cached for it; restoring leaves that
/// side alone.
#[derive(Debug, Clone)]
pub struct CacheSnapshot {
    owner: String,
    id: Option<String>,
    collection: Option<Entry<GistPages>>,
    gist: Option<Entry<GistRecord>>,
}

impl CacheSnapshot {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn collection(&self) -> Option<&GistPages> {
        self.collection.as_ref().map(|e| &e.value)
    }

    pub fn gist(&self) -> Option<&GistRecord> {
        self.gist.as_ref().map(|e| &e.value)
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_none() && self.gist.is_none()
    }
}

/// Handle for one in-flight read.
#[derive(Debug)]
pub struct ReadTicket {
    key: CacheKey,
    token: CancellationToken,
    issued: u64,
}

impl ReadTicket {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Key-value store for gist collections, single gists and raw file contents.
pub struct GistCache {
    collections: RwLock<HashMap<String, Entry<GistPages>>>,
    gists: RwLock<HashMap<String, Entry<GistRecord>>>,
    /// Raw contents by URL. Invalidation evicts.
    files: Cache<String, String>,
    in_flight: Mutex<HashMap<CacheKey, Vec<CancellationToken>>>,
    generation: AtomicU64,
}

impl Default for GistCache {
    fn default() -> Self {
        Self::new()
    }
}

impl GistCache {
    pub fn new() -> Self {
        Self::with_file_ttl(NetworkConfig::RAW_FILE_TTL)
    }

    pub fn with_file_ttl(ttl: Duration) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            gists: RwLock::new(HashMap::new()),
            files: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(NetworkConfig::RAW_FILE_CACHE_CAPACITY)
                .build(),
            in_flight: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    // Collections

    pub fn collection(&self, owner: &str) -> Option<GistPages> {
        read(&self.collections).get(owner).map(|e| e.value.clone())
    }

    pub fn set_collection(&self, owner: &str, pages: GistPages) {
        write(&self.collections).insert(owner.to_string(), Entry::fresh(pages));
    }

    /// Update the cached collection in place, if there is one.
    ///
    /// Returns whether a collection was cached.
    pub fn update_collection(&self, owner: &str, f: impl FnOnce(&mut GistPages)) -> bool {
        let mut collections = write(&self.collections);
        match collections.get_mut(owner) {
            Some(entry) => {
                f(&mut entry.value);
                true
            }
            None => false,
        }
    }

    pub fn remove_collection(&self, owner: &str) -> Option<GistPages> {
        write(&self.collections).remove(owner).map(|e| e.value)
    }

    // Single gists

    pub fn gist(&self, id: &str) -> Option<GistRecord> {
        read(&self.gists).get(id).map(|e| e.value.clone())
    }

    pub fn set_gist(&self, record: GistRecord) {
        write(&self.gists).insert(record.id.clone(), Entry::fresh(record));
    }

    pub fn remove_gist(&self, id: &str) -> Option<GistRecord> {
        write(&self.gists).remove(id).map(|e| e.value)
    }

    // Raw files

    pub fn file(&self, raw_url: &str) -> Option<String> {
        self.files.get(&raw_url.to_string())
    }

    pub fn set_file(&self, raw_url: &str, content: String) {
        self.files.insert(raw_url.to_string(), content);
    }

    // Staleness

    /// Whether `key` has no entry or its entry was invalidated.
    pub fn is_stale(&self, key: &CacheKey) -> bool {
        match key {
            CacheKey::Gists { owner } => read(&self.collections).get(owner).map_or(true, |e| e.stale),
            CacheKey::Gist { id } => read(&self.gists).get(id).map_or(true, |e| e.stale),
            CacheKey::GistFile { raw_url } => self.file(raw_url).is_none(),
        }
    }

    /// Mark one entry stale so the next read refetches it.
    pub fn invalidate(&self, key: &CacheKey) {
        debug!("Invalidating {}", key);
        let generation = self.next_generation();
        match key {
            CacheKey::Gists { owner } => {
                if let Some(entry) = write(&self.collections).get_mut(owner) {
                    entry.invalidate(generation);
                }
            }
            CacheKey::Gist { id } => {
                if let Some(entry) = write(&self.gists).get_mut(id) {
                    entry.invalidate(generation);
                }
            }
            CacheKey::GistFile { raw_url } => self.files.invalidate(raw_url),
        }
    }

    /// Mark every entry in `namespace` stale.
    pub fn invalidate_namespace(&self, namespace: Namespace) {
        debug!("Invalidating namespace {}", namespace);
        let generation = self.next_generation();
        match namespace {
            Namespace::Gists => write(&self.collections)
                .values_mut()
                .for_each(|e| e.invalidate(generation)),
            Namespace::Gist => write(&self.gists)
                .values_mut()
                .for_each(|e| e.invalidate(generation)),
            Namespace::GistFile => self.files.invalidate_all(),
        }
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    // Snapshots

    /// Capture the collection of `owner` and, when given, the gist `id`.
    pub fn snapshot(&self, owner: &str, id: Option<&str>) -> CacheSnapshot {
        CacheSnapshot {
            owner: owner.to_string(),
            id: id.map(str::to_string),
            collection: read(&self.collections).get(owner).cloned(),
            gist: id.and_then(|id| read(&self.gists).get(id).cloned()),
        }
    }

    /// Overwrite the captured entries with their snapshot values.
    pub fn restore(&self, snapshot: CacheSnapshot) {
        if let Some(collection) = snapshot.collection {
            write(&self.collections).insert(snapshot.owner.clone(), collection);
        }
        if let (Some(id), Some(gist)) = (snapshot.id, snapshot.gist) {
            write(&self.gists).insert(id, gist);
        }
        debug!("Restored snapshot for collection {}", snapshot.owner);
    }

    // In-flight reads

    /// Register a read for `key`.
    pub fn begin_read(&self, key: CacheKey) -> ReadTicket {
        let token = CancellationToken::new();
        lock(&self.in_flight)
            .entry(key.clone())
            .or_default()
            .push(token.clone());
        ReadTicket {
            key,
            token,
            issued: self.generation.load(Ordering::SeqCst),
        }
    }

    /// Cancel every in-flight read for `key`. Returns how many were cancelled.
    pub fn cancel_reads(&self, key: &CacheKey) -> usize {
        let tokens = lock(&self.in_flight).remove(key).unwrap_or_default();
        for token in &tokens {
            token.cancel();
        }
        if !tokens.is_empty() {
            debug!("Cancelled {} in-flight reads for {}", tokens.len(), key);
        }
        tokens.len()
    }

    pub fn in_flight_reads(&self, key: &CacheKey) -> usize {
        lock(&self.in_flight).get(key).map_or(0, Vec::len)
    }

    /// Unregister a read without writing anything.
    pub fn finish_read(&self, ticket: &ReadTicket) {
        let mut in_flight = lock(&self.in_flight);
        if let Some(tokens) = in_flight.get_mut(&ticket.key) {
            tokens.retain(|t| !t.same_as(&ticket.token));
            if tokens.is_empty() {
                in_flight.remove(&ticket.key);
            }
        }
    }

    /// Apply a read result to the collection of `owner` unless the read was
    /// cancelled.
    pub fn commit_collection(
        &self,
        ticket: ReadTicket,
        f: impl FnOnce(GistPages) -> GistPages,
    ) -> Result<GistPages> {
        let owner = match &ticket.key {
            CacheKey::Gists { owner } => owner.clone(),
            other => {
                let err = mismatched_ticket(other, Namespace::Gists);
                self.finish_read(&ticket);
                return Err(err);
            }
        };
        self.commit(&ticket, || {
            let mut collections = write(&self.collections);
            let previous = collections.get(&owner);
            let updated = f(previous.map(|e| e.value.clone()).unwrap_or_default());
            let entry = Entry::committed(updated.clone(), previous, ticket.issued);
            collections.insert(owner, entry);
            updated
        })
    }

    pub fn commit_gist(&self, ticket: ReadTicket, record: GistRecord) -> Result<GistRecord> {
        if !matches!(&ticket.key, CacheKey::Gist { id } if *id == record.id) {
            self.finish_read(&ticket);
            return Err(mismatched_ticket(&ticket.key, Namespace::Gist));
        }
        self.commit(&ticket, || {
            let mut gists = write(&self.gists);
            let entry = Entry::committed(record.clone(), gists.get(&record.id), ticket.issued);
            gists.insert(record.id.clone(), entry);
            record
        })
    }

    pub fn commit_file(&self, ticket: ReadTicket, content: String) -> Result<String> {
        let raw_url = match &ticket.key {
            CacheKey::GistFile { raw_url } => raw_url.clone(),
            other => {
                let err = mismatched_ticket(other, Namespace::GistFile);
                self.finish_read(&ticket);
                return Err(err);
            }
        };
        self.commit(&ticket, || {
            self.set_file(&raw_url, content.clone());
            content
        })
    }

    fn commit<T>(&self, ticket: &ReadTicket, write_value: impl FnOnce() -> T) -> Result<T> {
        // Hold the registry lock so a cancel cannot slip in between the check
        // and the write.
        let mut in_flight = lock(&self.in_flight);
        if ticket.token.is_cancelled() {
            debug!("Discarding cancelled read for {}", ticket.key);
            return Err(ZistError::Cancelled);
        }
        let value = write_value();
        if let Some(tokens) = in_flight.get_mut(&ticket.key) {
            tokens.retain(|t| !t.same_as(&ticket.token));
            if tokens.is_empty() {
                in_flight.remove(&ticket.key);
            }
        }
        Ok(value)
    }
}

fn mismatched_ticket(key: &CacheKey, expected: Namespace) -> ZistError {
    ZistError::Validation {
        field: "ticket".to_string(),
        message: format!("{} is not a {} key", key, expected),
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
