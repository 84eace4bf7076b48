//! Saved contact-form submissions.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::bus::{
    AppEvent, EventBus, EventKind, FormData, FormSubmitPayload, SplitViewPage, SplitViewPayload,
    Subscription,
};
use crate::error::Result;

/// One submitted form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSubmission {
    pub id: String,
    pub form_data: FormData,
    pub form_type: String,
    pub timestamp: DateTime<Utc>,
}

impl FormSubmission {
    pub fn new(form_data: FormData, form_type: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            form_data,
            form_type: form_type.into(),
            timestamp: Utc::now(),
        }
    }
}

pub trait SubmissionStore: Send + Sync {
    /// All submissions, oldest first.
    fn list(&self) -> Result<Vec<FormSubmission>>;
    fn append(&self, submission: FormSubmission) -> Result<()>;
    /// Returns whether a submission with `id` existed.
    fn delete(&self, id: &str) -> Result<bool>;
    fn clear(&self) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemorySubmissionStore {
    entries: Mutex<Vec<FormSubmission>>,
}

impl MemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SubmissionStore for MemorySubmissionStore {
    fn list(&self) -> Result<Vec<FormSubmission>> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn append(&self, submission: FormSubmission) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(submission);
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        Ok(entries.len() != before)
    }

    fn clear(&self) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }
}

/// Submissions kept as a JSON array in a single file.
///
/// A missing, unreadable or non-array file reads as no submissions.
#[derive(Debug)]
pub struct FileSubmissionStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSubmissionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// `form_submissions.json` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join("form_submissions.json"))
    }

    pub fn new_default() -> Self {
        Self::in_dir(super::default_data_dir())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Vec<FormSubmission> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %self.path.display(), error = %err, "failed to read submissions");
                }
                return Vec::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(path = %self.path.display(), error = %err, "ignoring malformed submissions file");
            Vec::new()
        })
    }

    fn store(&self, entries: &[FormSubmission]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}

impl SubmissionStore for FileSubmissionStore {
    fn list(&self) -> Result<Vec<FormSubmission>> {
        Ok(self.load())
    }

    fn append(&self, submission: FormSubmission) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load();
        entries.push(submission);
        self.store(&entries)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        if entries.len() == before {
            return Ok(false);
        }
        self.store(&entries)?;
        Ok(true)
    }

    fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.store(&[])
    }
}

/// Save every `FORM_SUBMIT` to `store`, then ask the host to show the form
/// in split view.
pub fn record_submissions(bus: &EventBus, store: Arc<dyn SubmissionStore>) -> Subscription {
    let publisher = bus.clone();
    bus.on(EventKind::FormSubmit, move |payload: FormSubmitPayload| {
        let store = store.clone();
        let publisher = publisher.clone();
        async move {
            let submission = FormSubmission::new(payload.form_data, payload.form_type);
            debug!(id = %submission.id, form_type = %submission.form_type, "recording form submission");
            store.append(submission)?;
            publisher.publish(AppEvent::SplitViewToggle(SplitViewPayload {
                page: SplitViewPage::Form,
                is_open: true,
            }));
            Ok(())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample(name: &str) -> FormSubmission {
        FormSubmission::new(
            FormData {
                name: name.to_string(),
                email: format!("{name}@example.com"),
                message: "hello".to_string(),
            },
            "contact",
        )
    }

    #[test]
    fn file_store_appends_and_deletes() {
        let dir = TempDir::new().unwrap();
        let store = FileSubmissionStore::in_dir(dir.path());
        let first = sample("ada");
        let first_id = first.id.clone();
        store.append(first).unwrap();
        store.append(sample("grace")).unwrap();

        assert!(store.delete(&first_id).unwrap());
        assert!(!store.delete(&first_id).unwrap());

        let remaining = store.list().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].form_data.name, "grace");
    }

    #[test]
    fn non_array_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileSubmissionStore::in_dir(dir.path());
        fs::write(store.path(), r#"{"not":"an array"}"#).unwrap();

        assert!(store.list().unwrap().is_empty());
        store.append(sample("ada")).unwrap();
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn serialized_shape_is_camel_case() {
        let value = serde_json::to_value(sample("ada")).unwrap();
        assert!(value.get("formData").is_some());
        assert_eq!(value["formType"], "contact");
    }

    #[test]
    fn memory_store_clear_empties_everything() {
        let store = MemorySubmissionStore::new();
        store.append(sample("ada")).unwrap();
        store.clear().unwrap();
        assert!(store.list().unwrap().is_empty());
    }
}
