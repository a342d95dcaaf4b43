//! Persisted note record model.
//!
//! # Responsibility
//! - Define the named, timestamped record stored per user and collection.
//! - Own naming rules for collections, storage paths and document names.
//!
//! # Invariants
//! - `name` is unique per `(user, collection)`; saving the same name again
//!   overwrites the previous record.
//! - `format`, `theme` and `topic` are only populated for AI notes.
//! - Serialized records use the external field name `date` (RFC 3339).
//!
//! # See also
//! - `store::NoteStore` for the gateway contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const MAX_DOCUMENT_NAME_CHARS: usize = 120;

/// Identity of the signed-in user that owns note collections.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wraps a user id; blank ids are rejected.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persistence partition separating the two note surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collection {
    /// Notes written by the user.
    #[serde(rename = "usermade")]
    UserMade,
    /// Notes produced by the generation adapter.
    #[serde(rename = "ainotes")]
    AiNotes,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserMade => "usermade",
            Self::AiNotes => "ainotes",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "usermade" => Some(Self::UserMade),
            "ainotes" => Some(Self::AiNotes),
            _ => None,
        }
    }
}

/// Layout requested from the generator for AI notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteFormat {
    Structured,
    Bullet,
    Outline,
    Flashcard,
}

impl NoteFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Structured => "structured",
            Self::Bullet => "bullet",
            Self::Outline => "outline",
            Self::Flashcard => "flashcard",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "structured" => Some(Self::Structured),
            "bullet" => Some(Self::Bullet),
            "outline" => Some(Self::Outline),
            "flashcard" => Some(Self::Flashcard),
            _ => None,
        }
    }
}

/// Visual theme tag remembered with AI notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteTheme {
    Classic,
    Modern,
    Minimal,
}

impl NoteTheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Modern => "modern",
            Self::Minimal => "minimal",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "classic" => Some(Self::Classic),
            "modern" => Some(Self::Modern),
            "minimal" => Some(Self::Minimal),
            _ => None,
        }
    }
}

/// Optional tags stored next to the content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<NoteFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<NoteTheme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

impl NoteMetadata {
    pub fn is_empty(&self) -> bool {
        self.format.is_none() && self.theme.is_none() && self.topic.is_none()
    }
}

/// Named, timestamped note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedDocument {
    /// Unique key inside one user collection.
    pub name: String,
    /// Serialized document markup.
    pub content: String,
    #[serde(flatten)]
    pub metadata: NoteMetadata,
    /// Serialized as `date` to match the external record shape.
    #[serde(rename = "date")]
    pub saved_at: DateTime<Utc>,
}

impl SavedDocument {
    /// Creates a record stamped with the current time.
    pub fn new(name: impl Into<String>, content: impl Into<String>, metadata: NoteMetadata) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            metadata,
            saved_at: Utc::now(),
        }
    }
}

/// Document name validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    Empty,
    TooLong(usize),
    ContainsSlash,
}

impl Display for NameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "document name cannot be empty"),
            Self::TooLong(len) => write!(
                f,
                "document name has {len} characters; maximum is {MAX_DOCUMENT_NAME_CHARS}"
            ),
            Self::ContainsSlash => write!(f, "document name cannot contain `/`"),
        }
    }
}

impl Error for NameError {}

/// Trims and validates a document name used as a storage key.
pub fn normalize_document_name(name: &str) -> Result<String, NameError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(NameError::Empty);
    }
    let len = trimmed.chars().count();
    if len > MAX_DOCUMENT_NAME_CHARS {
        return Err(NameError::TooLong(len));
    }
    if trimmed.contains('/') {
        return Err(NameError::ContainsSlash);
    }
    Ok(trimmed.to_string())
}

/// Key path of one record in the remote store layout.
pub fn storage_path(user: &UserId, collection: Collection, name: &str) -> String {
    format!(
        "users/{}/notes/{}/{}",
        user.as_str(),
        collection.as_str(),
        name
    )
}
