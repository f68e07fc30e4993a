//! Database models
//!
//! Rust structs representing database entities, plus the typed element
//! content union and the rich-text document tree.
//! All models use serde for serialization to the UI shell.

use crate::config;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Top-level container holding sections
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notebook {
    pub id: String,
    pub title: String,
    pub description: String,
    pub color: String,
    pub icon: String,
    pub order_index: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Mid-level container within a notebook, holding pages
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Section {
    pub id: String,
    pub notebook_id: String,
    pub title: String,
    pub order_index: i64,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

/// A document with a rich-text body and a freeform canvas of elements
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Page {
    pub id: String,
    pub section_id: String,
    /// Self-reference enabling nested sub-pages
    pub parent_page_id: Option<String>,
    pub title: String,
    /// JSON-encoded [`DocNode`] tree
    pub content_json: String,
    pub order_index: i64,
    /// Stored as 0/1 for index compatibility
    pub is_favorite: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Page {
    pub fn favorite(&self) -> bool {
        self.is_favorite != 0
    }

    /// Decode the rich-text document tree
    pub fn content(&self) -> Result<DocNode> {
        Ok(serde_json::from_str(&self.content_json)?)
    }
}

/// One positioned object on a page's canvas
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PageElement {
    pub id: String,
    pub page_id: String,
    /// Discriminant column, mirrors the tag inside `content_json`
    pub kind: String,
    pub position_x: f64,
    pub position_y: f64,
    pub width: f64,
    pub height: f64,
    /// Paint/interaction order, highest wins; not required to be contiguous
    pub z_index: i64,
    /// JSON-encoded [`ElementContent`]
    pub content_json: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PageElement {
    /// Decode the typed content payload
    pub fn content(&self) -> Result<ElementContent> {
        Ok(serde_json::from_str(&self.content_json)?)
    }

    pub fn element_kind(&self) -> Option<ElementKind> {
        ElementKind::parse(&self.kind)
    }
}

/// A named label attachable to pages; names are unique
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

/// File attachment linked to a page; payload lives in the blob store
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Attachment {
    pub id: String,
    pub page_id: String,
    /// SHA-256 hash of the file content
    pub blob_hash: String,
    pub filename: String,
    pub mime_type: String,
    pub file_size: i64,
    pub created_at: DateTime<Utc>,
}

/// Application setting (flat key-value)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

// ===== Request types =====

/// Create notebook request
#[derive(Debug, Default, Deserialize)]
pub struct CreateNotebookRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// Update notebook request (partial patch)
#[derive(Debug, Default, Deserialize)]
pub struct UpdateNotebookRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub order_index: Option<i64>,
}

/// Create section request
#[derive(Debug, Deserialize)]
pub struct CreateSectionRequest {
    pub notebook_id: String,
    pub title: String,
    pub order_index: i64,
    pub color: String,
}

/// Update section request (partial patch)
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSectionRequest {
    pub title: Option<String>,
    pub color: Option<String>,
    pub order_index: Option<i64>,
}

/// Create page request
#[derive(Debug, Deserialize)]
pub struct CreatePageRequest {
    pub section_id: String,
    pub parent_page_id: Option<String>,
    pub title: Option<String>,
    pub content: Option<DocNode>,
    pub order_index: Option<i64>,
}

/// Update page request (partial patch)
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePageRequest {
    pub title: Option<String>,
    pub content: Option<DocNode>,
    pub order_index: Option<i64>,
}

// ===== Element content =====

/// Variant payload of a canvas element, discriminated by `type`.
///
/// Text carries editor HTML, images a data URI, files a name plus
/// MIME type descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementContent {
    Text {
        html: String,
    },
    Image {
        #[serde(rename = "dataUri")]
        data_uri: String,
    },
    File {
        name: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

impl ElementContent {
    pub fn kind(&self) -> ElementKind {
        match self {
            ElementContent::Text { .. } => ElementKind::Text,
            ElementContent::Image { .. } => ElementKind::Image,
            ElementContent::File { .. } => ElementKind::File,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Canvas element discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Text,
    Image,
    File,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Text => "text",
            ElementKind::Image => "image",
            ElementKind::File => "file",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(ElementKind::Text),
            "image" => Some(ElementKind::Image),
            "file" => Some(ElementKind::File),
            _ => None,
        }
    }

    /// Minimum (width, height) the element type may be resized to.
    /// File cards have a fixed layout and are not resizable.
    pub fn min_size(&self) -> Option<(f64, f64)> {
        match self {
            ElementKind::Text => Some((config::TEXT_MIN_WIDTH, config::TEXT_MIN_HEIGHT)),
            ElementKind::Image => Some((config::IMAGE_MIN_WIDTH, config::IMAGE_MIN_HEIGHT)),
            ElementKind::File => None,
        }
    }
}

// ===== Rich-text document tree =====

/// One node of a page's structured rich-text document.
///
/// The tree is self-describing: `type` names the node kind, `content`
/// holds children, `attrs` carries node attributes (e.g. heading level)
/// and `text` the literal text of leaf nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocNode {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<DocNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl DocNode {
    /// Empty document root
    pub fn doc() -> Self {
        Self::container("doc", Vec::new())
    }

    pub fn container(node_type: &str, content: Vec<DocNode>) -> Self {
        Self {
            node_type: node_type.to_string(),
            content,
            attrs: None,
            text: None,
        }
    }

    /// A paragraph holding a single text leaf
    pub fn paragraph(text: &str) -> Self {
        Self::container("paragraph", vec![Self::text(text)])
    }

    pub fn text(text: &str) -> Self {
        Self {
            node_type: "text".to_string(),
            content: Vec::new(),
            attrs: None,
            text: Some(text.to_string()),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
