//! Events published by the demonstration scenario.

use chrono::{DateTime, Utc};
use herald_events::{Event, EventType};

/// A user signed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserLogin {
    pub username: String,
    pub at: DateTime<Utc>,
}

impl UserLogin {
    /// A login happening now.
    #[must_use]
    pub fn now(username: impl Into<String>) -> Self {
        Self { username: username.into(), at: Utc::now() }
    }
}

impl Event for UserLogin {
    const EVENT_TYPE: EventType = EventType::from_static("UserLogin");
}

/// A file was uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub filename: String,
    /// Size in bytes.
    pub size: u64,
}

impl FileUpload {
    #[must_use]
    pub fn new(filename: impl Into<String>, size: u64) -> Self {
        Self { filename: filename.into(), size }
    }
}

impl Event for FileUpload {
    const EVENT_TYPE: EventType = EventType::from_static("FileUpload");
}
