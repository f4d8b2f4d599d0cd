use std::{fmt, sync::Arc, time::Duration};

use serde::{de::DeserializeOwned, Serialize};
use shared::{domain::AccessRole, protocol::WizardStep, task::DebouncedTask};
use tracing::{debug, error, warn};

use crate::kv::{KeyValueStore, StorageError};

pub const STORAGE_PREFIX: &str = "draft_";
pub const DEFAULT_DRAFT_DEBOUNCE: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DraftKey {
    pub role: AccessRole,
    pub step: WizardStep,
}

impl DraftKey {
    pub fn new(role: AccessRole, step: WizardStep) -> Self {
        Self { role, step }
    }

    /// Full key in the backing store, e.g. `draft_admin_step1`.
    pub fn storage_key(&self) -> String {
        format!("{STORAGE_PREFIX}{self}")
    }
}

impl fmt::Display for DraftKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.role, self.step)
    }
}

#[derive(Clone)]
pub struct DraftStore {
    kv: Arc<dyn KeyValueStore>,
}

impl DraftStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Reads a draft. Missing, unreadable and corrupt drafts all come back
    /// as `None`.
    pub async fn restore<T: DeserializeOwned>(&self, key: DraftKey) -> Option<T> {
        let full_key = key.storage_key();
        let raw = match self.kv.get(&full_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                error!(key = %full_key, error = %err, "error restoring draft");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(values) => Some(values),
            Err(err) => {
                warn!(key = %full_key, error = %err, "discarding corrupt draft");
                None
            }
        }
    }

    /// Writes a draft. Failures are logged and dropped.
    pub async fn save<T: Serialize>(&self, key: DraftKey, values: &T) {
        let full_key = key.storage_key();
        match self.try_save(&full_key, values).await {
            Ok(()) => debug!(key = %full_key, "draft saved"),
            Err(err) if err.is_quota_exceeded() => {
                warn!(key = %full_key, "storage quota exceeded, draft not saved");
            }
            Err(err) => error!(key = %full_key, error = %err, "error saving draft"),
        }
    }

    async fn try_save<T: Serialize>(&self, full_key: &str, values: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(values)?;
        self.kv.set(full_key, &raw).await
    }

    pub async fn clear(&self, key: DraftKey) {
        let full_key = key.storage_key();
        if let Err(err) = self.kv.remove(&full_key).await {
            error!(key = %full_key, error = %err, "error clearing draft");
        }
    }

    /// Removes both step drafts of `role`.
    pub async fn clear_all(&self, role: AccessRole) {
        for step in [WizardStep::BasicInfo, WizardStep::Details] {
            self.clear(DraftKey::new(role, step)).await;
        }
    }

    pub fn observe<T>(&self, key: DraftKey, debounce: Duration) -> DraftObserver<T>
    where
        T: Serialize + Clone + Send + Sync + 'static,
    {
        DraftObserver {
            store: self.clone(),
            key,
            debounce,
            initialized: false,
            latest: None,
            task: DebouncedTask::new(),
        }
    }
}

/// Debounced write-through from a step's form values to its draft.
///
/// The first observed snapshot is the value the step was mounted with and is
/// never written back. Every later snapshot restarts the timer; only the
/// last one is persisted. Dropping the observer cancels a pending write.
pub struct DraftObserver<T> {
    store: DraftStore,
    key: DraftKey,
    debounce: Duration,
    initialized: bool,
    latest: Option<T>,
    task: DebouncedTask,
}

impl<T> DraftObserver<T>
where
    T: Serialize + Clone + Send + Sync + 'static,
{
    pub fn key(&self) -> DraftKey {
        self.key
    }

    pub fn observe(&mut self, snapshot: T) {
        if !self.initialized {
            self.initialized = true;
            return;
        }

        self.latest = Some(snapshot.clone());
        let store = self.store.clone();
        let key = self.key;
        self.task.schedule(self.debounce, move |_| async move {
            store.save(key, &snapshot).await;
        });
    }

    pub fn is_pending(&self) -> bool {
        self.task.is_pending()
    }

    /// Writes the pending snapshot now instead of waiting for the timer.
    pub async fn flush(&mut self) {
        if !self.task.is_pending() {
            return;
        }
        self.task.cancel();
        if let Some(snapshot) = self.latest.take() {
            self.store.save(self.key, &snapshot).await;
        }
    }

    /// Drops the pending write, if any.
    pub fn cancel(&mut self) {
        self.task.cancel();
        self.latest = None;
    }
}
