//! Persistence collaborators: preferences/credential and form submissions.

pub mod kv;
pub mod submissions;

use std::path::PathBuf;

pub use kv::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, API_KEY_KEY, THEME_KEY};
pub use submissions::{
    record_submissions, FileSubmissionStore, FormSubmission, MemorySubmissionStore,
    SubmissionStore,
};

/// `~/.switchboard`, or `./.switchboard` when no home directory is known.
pub fn default_data_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".switchboard"))
        .unwrap_or_else(|| PathBuf::from(".switchboard"))
}
