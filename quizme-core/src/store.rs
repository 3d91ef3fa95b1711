//! Quiz stores backing the access gate
//!
//! The gate never keeps quiz state of its own. Every read goes to the store,
//! and domain registration is a read-modify-write performed by the store
//! under a per-quiz lock, so concurrent registrations are applied against
//! the committed list at the time each one runs.

use crate::error::{QuizMeError, Result};
use crate::types::{Quiz, QuizCatalog};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Outcome of a domain registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainUpdate {
    /// Domain was appended to the list
    Added,
    /// Domain was already present; nothing changed
    AlreadyPresent,
}

impl DomainUpdate {
    /// Label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainUpdate::Added => "added",
            DomainUpdate::AlreadyPresent => "already_present",
        }
    }
}

/// Storage collaborator for quizzes
pub trait QuizStore: Send + Sync {
    /// Look up a quiz by id
    fn find(&self, id: &str) -> Result<Option<Quiz>>;

    /// Append `domain` to the quiz's allowed list unless already present
    fn append_allowed_domain(&self, id: &str, domain: &str) -> Result<DomainUpdate>;

    /// Number of quizzes held
    fn len(&self) -> usize;

    /// Whether the store holds no quizzes
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory store keyed by quiz id
#[derive(Default)]
pub struct MemoryStore {
    quizzes: DashMap<String, Quiz>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding every quiz of the catalog
    pub fn from_catalog(catalog: QuizCatalog) -> Self {
        let store = Self::new();
        for quiz in catalog.quizzes {
            store.insert(quiz);
        }
        store
    }

    /// Insert or replace a quiz
    pub fn insert(&self, quiz: Quiz) {
        self.quizzes.insert(quiz.id.clone(), quiz);
    }

    /// Remove `domain` from the quiz's allowed list, if present
    pub(crate) fn remove_allowed_domain(&self, id: &str, domain: &str) {
        if let Some(mut entry) = self.quizzes.get_mut(id) {
            entry.allowed_embed_domains.retain(|d| d != domain);
        }
    }

    /// Snapshot of all quizzes ordered by id
    pub fn catalog(&self) -> QuizCatalog {
        let mut quizzes: Vec<Quiz> = self.quizzes.iter().map(|e| e.value().clone()).collect();
        quizzes.sort_by(|a, b| a.id.cmp(&b.id));
        QuizCatalog { quizzes }
    }
}

impl QuizStore for MemoryStore {
    fn find(&self, id: &str) -> Result<Option<Quiz>> {
        Ok(self.quizzes.get(id).map(|entry| entry.value().clone()))
    }

    fn append_allowed_domain(&self, id: &str, domain: &str) -> Result<DomainUpdate> {
        // The entry guard holds the shard lock for the whole read-modify-write.
        let mut entry = self
            .quizzes
            .get_mut(id)
            .ok_or_else(|| QuizMeError::NotFound(id.to_string()))?;

        if entry.allowed_embed_domains.iter().any(|d| d == domain) {
            return Ok(DomainUpdate::AlreadyPresent);
        }

        entry.allowed_embed_domains.push(domain.to_string());
        Ok(DomainUpdate::Added)
    }

    fn len(&self) -> usize {
        self.quizzes.len()
    }
}

/// Store loaded from a JSON catalog file and written back on every change
pub struct JsonFileStore {
    inner: MemoryStore,
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Load and validate the catalog at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let contents = fs::read_to_string(&path)?;
        let catalog = QuizCatalog::from_json(&contents)?;
        catalog.validate()?;

        info!(
            "Loaded {} quizzes from {}",
            catalog.quizzes.len(),
            path.display()
        );

        Ok(JsonFileStore {
            inner: MemoryStore::from_catalog(catalog),
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the catalog back; the caller holds `write_lock`
    fn persist(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.inner.catalog())?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            QuizMeError::Storage(format!("failed to replace {}: {}", self.path.display(), e))
        })?;

        debug!("Persisted quiz catalog to {}", self.path.display());
        Ok(())
    }
}

impl QuizStore for JsonFileStore {
    fn find(&self, id: &str) -> Result<Option<Quiz>> {
        self.inner.find(id)
    }

    fn append_allowed_domain(&self, id: &str, domain: &str) -> Result<DomainUpdate> {
        let _guard = self.write_lock.lock();

        let update = self.inner.append_allowed_domain(id, domain)?;
        if update == DomainUpdate::Added {
            if let Err(e) = self.persist() {
                // Keep memory in line with the file so a retry persists again.
                self.inner.remove_allowed_domain(id, domain);
                warn!("Rolled back domain '{}' for quiz '{}': {}", domain, id, e);
                return Err(e);
            }
        }
        Ok(update)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}
