//! Archive document structures
//!
//! The wire layer of the MRNotes/MRBook formats. Field names are
//! camelCase on disk and archives never carry store ids; identity is
//! reassigned on import.

use crate::database::DocNode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Full-store backup document (`.mrnote`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullArchive {
    /// Discriminator, always [`crate::config::ARCHIVE_FORMAT_FULL`]
    pub file_format: String,
    pub version: String,
    /// Creation time of the oldest exported notebook
    pub created_at: DateTime<Utc>,
    pub exported_at: DateTime<Utc>,
    pub notebooks: Vec<ArchiveNotebook>,
    pub tags: Vec<ArchiveTag>,
    /// Flat application settings; sorted map keeps output deterministic
    pub settings: BTreeMap<String, String>,
}

/// Single-notebook transfer document (`.mrbook`).
///
/// Unlike the full backup there is no global tag table or settings
/// block; pages carry their tag names inline and sections sit at the
/// top level beside the notebook metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotebookArchive {
    /// Discriminator, always [`crate::config::ARCHIVE_FORMAT_NOTEBOOK`]
    pub file_format: String,
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub notebook: ArchiveNotebookMeta,
    pub sections: Vec<ArchiveSection>,
}

/// Notebook descriptor inside a [`NotebookArchive`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveNotebookMeta {
    pub title: String,
    pub description: String,
    pub color: String,
    pub icon: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveNotebook {
    pub title: String,
    pub description: String,
    pub color: String,
    pub icon: String,
    pub order_index: i64,
    pub created_at: DateTime<Utc>,
    pub sections: Vec<ArchiveSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveSection {
    pub title: String,
    pub color: String,
    pub order_index: i64,
    pub created_at: DateTime<Utc>,
    /// Top-level pages only; nested pages hang off `subpages`
    pub pages: Vec<ArchivePage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivePage {
    pub title: String,
    pub content: DocNode,
    pub order_index: i64,
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Tag names; resolved against the archive's tag table on import
    pub tags: Vec<String>,
    pub attachments: Vec<ArchiveAttachment>,
    pub subpages: Vec<ArchivePage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveAttachment {
    pub filename: String,
    pub mime_type: String,
    pub file_size: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Base64 (standard alphabet, padded) payload
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveTag {
    pub name: String,
    pub color: String,
}
