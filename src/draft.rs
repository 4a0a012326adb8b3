//! Draft autosave and restore.
//!
//! A draft is the non-empty subset of the form's values, stored as one JSON
//! object in a single key-value slot. Exactly one draft exists at a time.

use crate::{
    errors::Result,
    form::{FormSnapshot, FormSurface},
    notifier::{Notifier, Severity},
    scheduler::{Clock, Debouncer, Scheduler, TimerId},
    storage::KeyValueStore,
};

pub const DRAFT_SAVED_MESSAGE: &str = "Draft saved automatically";
pub const DRAFT_LOADED_MESSAGE: &str = "Draft loaded successfully";
pub const DRAFT_SAVE_FAILED_MESSAGE: &str = "Draft could not be saved";

/// Snapshot without empty entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    snapshot: FormSnapshot,
}

impl Draft {
    pub fn from_snapshot(snapshot: &FormSnapshot) -> Self {
        Self {
            snapshot: snapshot.without_empty(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: FormSnapshot = serde_json::from_str(json)?;
        Ok(Self::from_snapshot(&snapshot))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.snapshot)?)
    }

    pub fn snapshot(&self) -> &FormSnapshot {
        &self.snapshot
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.snapshot.get(name)
    }

    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }
}

pub struct DraftStore<S: KeyValueStore> {
    storage: S,
    key: String,
    autosave: Debouncer,
}

impl<S: KeyValueStore> DraftStore<S> {
    pub fn new(storage: S, key: impl Into<String>, autosave: Debouncer) -> Self {
        Self {
            storage,
            key: key.into(),
            autosave,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Persists the non-empty values of `snapshot`, replacing any previous
    /// draft, and announces it. Validation is never consulted.
    pub fn save<C: Clock>(
        &mut self,
        snapshot: &FormSnapshot,
        notifier: &mut Notifier<C>,
    ) -> Result<Draft> {
        let draft = Draft::from_snapshot(snapshot);
        let json = draft.to_json()?;
        if let Err(err) = self.storage.set(&self.key, &json) {
            tracing::error!(key = %self.key, error = %err, "failed to save draft");
            notifier.notify(DRAFT_SAVE_FAILED_MESSAGE, Severity::Error);
            return Err(err);
        }
        tracing::debug!(key = %self.key, fields = draft.len(), "draft saved");
        notifier.notify(DRAFT_SAVED_MESSAGE, Severity::Success);
        Ok(draft)
    }

    /// Reads the stored draft without applying it. Unreadable drafts are
    /// logged and treated as absent.
    pub fn read(&self) -> Option<Draft> {
        let raw = match self.storage.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::error!(key = %self.key, error = %err, "error reading draft");
                return None;
            }
        };
        match Draft::from_json(&raw) {
            Ok(draft) => Some(draft),
            Err(err) => {
                tracing::error!(key = %self.key, error = %err, "error loading draft");
                None
            }
        }
    }

    /// Restores the stored draft onto `surface`. Fields missing from the
    /// draft keep their current value; names the form does not know are
    /// skipped. Never fails: a broken draft is logged and ignored.
    pub fn load<F: FormSurface + ?Sized, C: Clock>(
        &self,
        surface: &mut F,
        notifier: &mut Notifier<C>,
    ) -> Option<Draft> {
        let draft = self.read()?;
        for entry in draft.snapshot().iter() {
            if !surface.set_field_value(&entry.name, &entry.value) {
                tracing::debug!(field = %entry.name, "draft field not present in form");
            }
        }
        notifier.notify(DRAFT_LOADED_MESSAGE, Severity::Info);
        Some(draft)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.storage.remove(&self.key)
    }

    /// Re-arms the autosave timer; only the last trigger of a burst fires.
    pub fn schedule_autosave<T, Q: Scheduler<T> + ?Sized>(
        &mut self,
        scheduler: &mut Q,
        task: T,
    ) -> TimerId {
        self.autosave.trigger(scheduler, task)
    }

    pub fn cancel_autosave<T, Q: Scheduler<T> + ?Sized>(&mut self, scheduler: &mut Q) -> bool {
        self.autosave.cancel::<T, Q>(scheduler)
    }

    /// Returns `true` if `id` is the pending autosave timer, consuming it.
    pub fn autosave_fired(&mut self, id: TimerId) -> bool {
        self.autosave.fired(id)
    }

    pub fn autosave_pending(&self) -> bool {
        self.autosave.is_pending()
    }
}
