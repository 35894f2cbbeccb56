//! Parsed document records and the report rows derived from them.

use serde::{Deserialize, Serialize};

/// Fields extracted from one XML document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Identifier, expected to be unique across a run
    pub id: String,
    /// Integer-valued level, kept verbatim as written in the document
    pub level: String,
    /// Object names in document order
    pub objects: Vec<String>,
}

/// Row of the `levels` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LevelRow<'a> {
    /// Document identifier
    pub id: &'a str,
    /// Document level, verbatim
    pub level: &'a str,
}

/// Row of the `objects` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRow<'a> {
    /// Identifier of the owning document
    pub id: &'a str,
    /// Object name
    pub object: &'a str,
}

impl DocumentRecord {
    /// Create a record from its three fields
    pub fn new(
        id: impl Into<String>,
        level: impl Into<String>,
        objects: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: id.into(),
            level: level.into(),
            objects: objects.into_iter().map(Into::into).collect(),
        }
    }

    /// The single `levels` row for this document
    #[must_use]
    pub fn level_row(&self) -> LevelRow<'_> {
        LevelRow {
            id: &self.id,
            level: &self.level,
        }
    }

    /// One `objects` row per object, in document order
    pub fn object_rows(&self) -> impl Iterator<Item = ObjectRow<'_>> + '_ {
        self.objects.iter().map(move |object| ObjectRow {
            id: self.id.as_str(),
            object: object.as_str(),
        })
    }
}
