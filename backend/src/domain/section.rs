//! Page sections managed through the content editor.
//!
//! A section is a named block of copy with a display position (`order`) and
//! a visibility flag. The set of sections is kept densely ordered: after every
//! successful write the orders are exactly `0..N-1`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation failures for section fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SectionValidationError {
    #[error("section id must be a valid UUID")]
    InvalidId,
    #[error("section name must not be empty")]
    EmptyName,
}

/// Stable section identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(Uuid);

impl SectionId {
    /// Parse an identifier from its textual UUID form.
    pub fn new(id: impl AsRef<str>) -> Result<Self, SectionValidationError> {
        Uuid::parse_str(id.as_ref().trim())
            .map(Self)
            .map_err(|_| SectionValidationError::InvalidId)
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Internal label such as `Hero Section`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionName(String);

impl SectionName {
    pub fn new(name: impl AsRef<str>) -> Result<Self, SectionValidationError> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(SectionValidationError::EmptyName);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for SectionName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for SectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A persisted section.
///
/// ## Invariants
/// - `revision` starts at 1 and increases by one on every write.
/// - `order` is unique across the store once a write commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub id: SectionId,
    pub name: SectionName,
    pub title: String,
    pub content: String,
    pub order: u32,
    pub is_visible: bool,
    pub revision: u32,
    pub updated_at: DateTime<Utc>,
}

impl Section {
    /// Copy of `self` stamped as the next revision.
    #[must_use]
    pub fn next_revision(&self, updated_at: DateTime<Utc>) -> Self {
        Self {
            revision: self.revision.saturating_add(1),
            updated_at,
            ..self.clone()
        }
    }
}

/// Fields for a section being created.
///
/// `order` of `None` appends to the end; `is_visible` of `None` means visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSection {
    pub name: SectionName,
    pub title: String,
    pub content: String,
    pub order: Option<u32>,
    pub is_visible: Option<bool>,
}

/// Partial update of one section. `None` leaves the field untouched; a
/// supplied `false` or `0` is written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionPatch {
    pub name: Option<SectionName>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub order: Option<u32>,
    pub is_visible: Option<bool>,
    pub expected_revision: Option<u32>,
}

impl SectionPatch {
    /// Whether applying the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.title.is_none()
            && self.content.is_none()
            && self.order.is_none()
            && self.is_visible.is_none()
    }
}

/// One entry of a bulk save from the editor.
///
/// Absent fields keep their stored value; `revision`, when present, must
/// match the stored revision or the whole batch is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionReplacement {
    pub id: SectionId,
    pub title: Option<String>,
    pub content: Option<String>,
    pub order: Option<u32>,
    pub is_visible: Option<bool>,
    pub revision: Option<u32>,
}

/// A write to an existing record, guarded by the revision it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionWrite {
    pub section: Section,
    pub expected_revision: u32,
}

/// Removal of an existing record, guarded by the revision it was read at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionRemoval {
    pub id: SectionId,
    pub expected_revision: u32,
}

/// Batch of changes a repository commits atomically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionChangeSet {
    pub inserts: Vec<Section>,
    pub updates: Vec<SectionWrite>,
    pub deletes: Vec<SectionRemoval>,
}

impl SectionChangeSet {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }
}
