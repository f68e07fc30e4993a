//! Repository layer for database operations
//!
//! This module provides CRUD operations and indexed range queries for
//! every record kind. Each committed write publishes a change event so
//! live queries can re-run. Single-record operations are atomic;
//! multi-record flows (cascade delete, import) are composed above this
//! layer and are only eventually consistent.

use super::models::*;
use super::watch::{ChangeHub, RecordKind, StoreEvent};
use crate::config;
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
    changes: ChangeHub,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            changes: ChangeHub::default(),
        }
    }

    /// Subscribe to change events for live-query re-runs
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.changes.subscribe()
    }

    // ===== Notebooks =====

    /// Create a new notebook with defaults filled in
    pub async fn create_notebook(&self, req: CreateNotebookRequest) -> Result<Notebook> {
        let now = Utc::now();
        self.insert_notebook(
            req.title.as_deref().unwrap_or("Untitled Notebook"),
            req.description.as_deref().unwrap_or(""),
            req.color.as_deref().unwrap_or(config::NOTEBOOK_DEFAULT_COLOR),
            req.icon.as_deref().unwrap_or(config::NOTEBOOK_DEFAULT_ICON),
            0,
            now,
            now,
        )
        .await
    }

    /// Insert a notebook with explicit fields (used by archive import)
    pub async fn insert_notebook(
        &self,
        title: &str,
        description: &str,
        color: &str,
        icon: &str,
        order_index: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Notebook> {
        let id = Uuid::new_v4().to_string();

        let notebook = sqlx::query_as::<_, Notebook>(
            r#"
            INSERT INTO notebooks (id, title, description, color, icon, order_index, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(title)
        .bind(description)
        .bind(color)
        .bind(icon)
        .bind(order_index)
        .bind(created_at)
        .bind(updated_at)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created notebook: {}", id);
        self.changes.publish(RecordKind::Notebook);
        Ok(notebook)
    }

    /// Get a notebook by ID.
    ///
    /// Soft-deleted notebooks remain gettable by id; only listing paths
    /// exclude them.
    pub async fn get_notebook(&self, id: &str) -> Result<Notebook> {
        sqlx::query_as::<_, Notebook>("SELECT * FROM notebooks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotebookNotFound(id.to_string()))
    }

    /// List all live (non-deleted) notebooks
    pub async fn list_notebooks(&self) -> Result<Vec<Notebook>> {
        let notebooks = sqlx::query_as::<_, Notebook>(
            r#"
            SELECT * FROM notebooks
            WHERE deleted_at IS NULL
            ORDER BY order_index, created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(notebooks)
    }

    /// Patch notebook fields, refreshing `updated_at`
    pub async fn update_notebook(&self, id: &str, req: UpdateNotebookRequest) -> Result<Notebook> {
        let now = Utc::now();

        let rows = sqlx::query(
            r#"
            UPDATE notebooks SET
                title = COALESCE(?, title),
                description = COALESCE(?, description),
                color = COALESCE(?, color),
                icon = COALESCE(?, icon),
                order_index = COALESCE(?, order_index),
                updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(req.title)
        .bind(req.description)
        .bind(req.color)
        .bind(req.icon)
        .bind(req.order_index)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AppError::NotebookNotFound(id.to_string()));
        }

        self.changes.publish(RecordKind::Notebook);
        self.get_notebook(id).await
    }

    /// Soft delete a notebook (sets `deleted_at`, row remains)
    pub async fn soft_delete_notebook(&self, id: &str) -> Result<()> {
        let now = Utc::now();

        let rows = sqlx::query(
            "UPDATE notebooks SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AppError::NotebookNotFound(id.to_string()));
        }

        tracing::debug!("Soft deleted notebook: {}", id);
        self.changes.publish(RecordKind::Notebook);
        Ok(())
    }

    /// Permanently delete a notebook row (idempotent)
    pub async fn hard_delete_notebook(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM notebooks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Hard deleted notebook: {}", id);
        self.changes.publish(RecordKind::Notebook);
        Ok(())
    }

    // ===== Sections =====

    pub async fn create_section(&self, req: CreateSectionRequest) -> Result<Section> {
        self.insert_section(
            &req.notebook_id,
            &req.title,
            req.order_index,
            &req.color,
            Utc::now(),
        )
        .await
    }

    /// Insert a section with an explicit creation time (used by import)
    pub async fn insert_section(
        &self,
        notebook_id: &str,
        title: &str,
        order_index: i64,
        color: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Section> {
        let id = Uuid::new_v4().to_string();

        let section = sqlx::query_as::<_, Section>(
            r#"
            INSERT INTO sections (id, notebook_id, title, order_index, color, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(notebook_id)
        .bind(title)
        .bind(order_index)
        .bind(color)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created section: {} in notebook: {}", id, notebook_id);
        self.changes.publish(RecordKind::Section);
        Ok(section)
    }

    pub async fn get_section(&self, id: &str) -> Result<Section> {
        sqlx::query_as::<_, Section>("SELECT * FROM sections WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::SectionNotFound(id.to_string()))
    }

    /// List sections of a notebook in display order
    pub async fn list_sections(&self, notebook_id: &str) -> Result<Vec<Section>> {
        let sections = sqlx::query_as::<_, Section>(
            "SELECT * FROM sections WHERE notebook_id = ? ORDER BY order_index, created_at",
        )
        .bind(notebook_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sections)
    }

    pub async fn update_section(&self, id: &str, req: UpdateSectionRequest) -> Result<Section> {
        let rows = sqlx::query(
            r#"
            UPDATE sections SET
                title = COALESCE(?, title),
                color = COALESCE(?, color),
                order_index = COALESCE(?, order_index)
            WHERE id = ?
            "#,
        )
        .bind(req.title)
        .bind(req.color)
        .bind(req.order_index)
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AppError::SectionNotFound(id.to_string()));
        }

        self.changes.publish(RecordKind::Section);
        self.get_section(id).await
    }

    /// Delete a section row (idempotent)
    pub async fn delete_section(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM sections WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Deleted section: {}", id);
        self.changes.publish(RecordKind::Section);
        Ok(())
    }

    // ===== Pages =====

    pub async fn create_page(&self, req: CreatePageRequest) -> Result<Page> {
        let now = Utc::now();
        let content = req.content.unwrap_or_else(DocNode::doc);

        self.insert_page(
            &req.section_id,
            req.parent_page_id.as_deref(),
            req.title.as_deref().unwrap_or("Untitled Page"),
            &content.to_json()?,
            req.order_index.unwrap_or(0),
            0,
            now,
            now,
        )
        .await
    }

    /// Insert a page with explicit fields (used by archive import)
    #[allow(clippy::too_many_arguments)]
    pub async fn insert_page(
        &self,
        section_id: &str,
        parent_page_id: Option<&str>,
        title: &str,
        content_json: &str,
        order_index: i64,
        is_favorite: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Page> {
        let id = Uuid::new_v4().to_string();

        let page = sqlx::query_as::<_, Page>(
            r#"
            INSERT INTO pages
                (id, section_id, parent_page_id, title, content_json, order_index, is_favorite, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(section_id)
        .bind(parent_page_id)
        .bind(title)
        .bind(content_json)
        .bind(order_index)
        .bind(is_favorite)
        .bind(created_at)
        .bind(updated_at)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created page: {} in section: {}", id, section_id);
        self.changes.publish(RecordKind::Page);
        Ok(page)
    }

    pub async fn get_page(&self, id: &str) -> Result<Page> {
        sqlx::query_as::<_, Page>("SELECT * FROM pages WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::PageNotFound(id.to_string()))
    }

    /// List top-level pages of a section in display order
    pub async fn list_pages(&self, section_id: &str) -> Result<Vec<Page>> {
        let pages = sqlx::query_as::<_, Page>(
            "SELECT * FROM pages WHERE section_id = ? ORDER BY order_index, created_at",
        )
        .bind(section_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(pages)
    }

    /// List direct sub-pages of a page
    pub async fn list_subpages(&self, parent_page_id: &str) -> Result<Vec<Page>> {
        let pages = sqlx::query_as::<_, Page>(
            "SELECT * FROM pages WHERE parent_page_id = ? ORDER BY order_index, created_at",
        )
        .bind(parent_page_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(pages)
    }

    /// List every page (used by search)
    pub async fn list_all_pages(&self) -> Result<Vec<Page>> {
        let pages = sqlx::query_as::<_, Page>("SELECT * FROM pages ORDER BY updated_at DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(pages)
    }

    /// List pages flagged as favorites
    pub async fn list_favorite_pages(&self) -> Result<Vec<Page>> {
        let pages = sqlx::query_as::<_, Page>(
            "SELECT * FROM pages WHERE is_favorite = 1 ORDER BY updated_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(pages)
    }

    /// Patch page fields, refreshing `updated_at`
    /// Case-insensitive substring search over titles and body text
    pub async fn search_pages(&self, query: &str) -> Result<Vec<Page>> {
        let pattern = format!("%{}%", query);

        let pages = sqlx::query_as::<_, Page>(
            r#"
            SELECT * FROM pages
            WHERE title LIKE ? OR content_json LIKE ?
            ORDER BY updated_at DESC
            "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(pages)
    }

    pub async fn update_page(&self, id: &str, req: UpdatePageRequest) -> Result<Page> {
        let now = Utc::now();
        let content_json = match &req.content {
            Some(content) => Some(content.to_json()?),
            None => None,
        };

        let rows = sqlx::query(
            r#"
            UPDATE pages SET
                title = COALESCE(?, title),
                content_json = COALESCE(?, content_json),
                order_index = COALESCE(?, order_index),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(req.title)
        .bind(content_json)
        .bind(req.order_index)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AppError::PageNotFound(id.to_string()));
        }

        self.changes.publish(RecordKind::Page);
        self.get_page(id).await
    }

    /// Set the favorite flag (0/1), refreshing `updated_at`
    pub async fn set_page_favorite(&self, id: &str, is_favorite: i64) -> Result<()> {
        let rows = sqlx::query("UPDATE pages SET is_favorite = ?, updated_at = ? WHERE id = ?")
            .bind(is_favorite)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::PageNotFound(id.to_string()));
        }

        self.changes.publish(RecordKind::Page);
        Ok(())
    }

    /// Delete a page row (idempotent); cascades live in the service layer
    pub async fn delete_page(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM pages WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Deleted page: {}", id);
        self.changes.publish(RecordKind::Page);
        Ok(())
    }

    // ===== Page elements =====

    /// Create a canvas element; origin coordinates are clamped to >= 0
    #[allow(clippy::too_many_arguments)]
    pub async fn create_element(
        &self,
        page_id: &str,
        content: &ElementContent,
        position_x: f64,
        position_y: f64,
        width: f64,
        height: f64,
        z_index: i64,
    ) -> Result<PageElement> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let element = sqlx::query_as::<_, PageElement>(
            r#"
            INSERT INTO page_elements
                (id, page_id, kind, position_x, position_y, width, height, z_index, content_json, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(page_id)
        .bind(content.kind().as_str())
        .bind(position_x.max(0.0))
        .bind(position_y.max(0.0))
        .bind(width)
        .bind(height)
        .bind(z_index)
        .bind(content.to_json()?)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created {} element: {} on page: {}", element.kind, id, page_id);
        self.changes.publish(RecordKind::PageElement);
        Ok(element)
    }

    pub async fn get_element(&self, id: &str) -> Result<PageElement> {
        sqlx::query_as::<_, PageElement>("SELECT * FROM page_elements WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::ElementNotFound(id.to_string()))
    }

    /// List a page's elements in insertion order.
    ///
    /// The engine stable-sorts by z-index for painting, so ties keep
    /// this insertion order.
    pub async fn list_elements(&self, page_id: &str) -> Result<Vec<PageElement>> {
        let elements = sqlx::query_as::<_, PageElement>(
            "SELECT * FROM page_elements WHERE page_id = ? ORDER BY rowid",
        )
        .bind(page_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(elements)
    }

    /// Move an element; coordinates are clamped to >= 0
    pub async fn update_element_position(&self, id: &str, x: f64, y: f64) -> Result<()> {
        let rows = sqlx::query(
            "UPDATE page_elements SET position_x = ?, position_y = ?, updated_at = ? WHERE id = ?",
        )
        .bind(x.max(0.0))
        .bind(y.max(0.0))
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AppError::ElementNotFound(id.to_string()));
        }

        self.changes.publish(RecordKind::PageElement);
        Ok(())
    }

    pub async fn update_element_size(&self, id: &str, width: f64, height: f64) -> Result<()> {
        let rows = sqlx::query(
            "UPDATE page_elements SET width = ?, height = ?, updated_at = ? WHERE id = ?",
        )
        .bind(width)
        .bind(height)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AppError::ElementNotFound(id.to_string()));
        }

        self.changes.publish(RecordKind::PageElement);
        Ok(())
    }

    pub async fn update_element_content(&self, id: &str, content: &ElementContent) -> Result<()> {
        let rows = sqlx::query(
            "UPDATE page_elements SET kind = ?, content_json = ?, updated_at = ? WHERE id = ?",
        )
        .bind(content.kind().as_str())
        .bind(content.to_json()?)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AppError::ElementNotFound(id.to_string()));
        }

        self.changes.publish(RecordKind::PageElement);
        Ok(())
    }

    pub async fn update_element_z(&self, id: &str, z_index: i64) -> Result<()> {
        let rows = sqlx::query("UPDATE page_elements SET z_index = ? WHERE id = ?")
            .bind(z_index)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::ElementNotFound(id.to_string()));
        }

        self.changes.publish(RecordKind::PageElement);
        Ok(())
    }

    /// Highest z-index on a page, 0 when the page has no elements
    pub async fn max_z_index(&self, page_id: &str) -> Result<i64> {
        let max: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(z_index), 0) FROM page_elements WHERE page_id = ?",
        )
        .bind(page_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(max)
    }

    /// Delete an element row (idempotent)
    pub async fn delete_element(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM page_elements WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Deleted element: {}", id);
        self.changes.publish(RecordKind::PageElement);
        Ok(())
    }

    /// Delete every element on a page
    pub async fn delete_page_elements(&self, page_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM page_elements WHERE page_id = ?")
            .bind(page_id)
            .execute(&self.pool)
            .await?;

        self.changes.publish(RecordKind::PageElement);
        Ok(())
    }

    // ===== Tags =====

    pub async fn create_tag(&self, name: &str, color: &str) -> Result<Tag> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let tag = sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (id, name, color, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(name)
        .bind(color)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created tag: {} ({})", name, id);
        self.changes.publish(RecordKind::Tag);
        Ok(tag)
    }

    /// Look up a tag by its unique name
    pub async fn get_tag_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tag)
    }

    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>("SELECT * FROM tags ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(tags)
    }

    /// Link a tag to a page; linking twice is a no-op
    pub async fn link_page_tag(&self, page_id: &str, tag_id: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO page_tags (page_id, tag_id) VALUES (?, ?)")
            .bind(page_id)
            .bind(tag_id)
            .execute(&self.pool)
            .await?;

        self.changes.publish(RecordKind::PageTag);
        Ok(())
    }

    pub async fn unlink_page_tag(&self, page_id: &str, tag_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM page_tags WHERE page_id = ? AND tag_id = ?")
            .bind(page_id)
            .bind(tag_id)
            .execute(&self.pool)
            .await?;

        self.changes.publish(RecordKind::PageTag);
        Ok(())
    }

    /// Resolve the tags linked to a page
    pub async fn list_tags_for_page(&self, page_id: &str) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.* FROM tags t
            JOIN page_tags pt ON pt.tag_id = t.id
            WHERE pt.page_id = ?
            ORDER BY t.name
            "#,
        )
        .bind(page_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    /// Remove every tag link of a page
    pub async fn delete_page_tags(&self, page_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM page_tags WHERE page_id = ?")
            .bind(page_id)
            .execute(&self.pool)
            .await?;

        self.changes.publish(RecordKind::PageTag);
        Ok(())
    }

    // ===== Attachments =====

    pub async fn create_attachment(
        &self,
        page_id: &str,
        blob_hash: &str,
        filename: &str,
        mime_type: &str,
        file_size: i64,
        created_at: DateTime<Utc>,
    ) -> Result<Attachment> {
        let id = Uuid::new_v4().to_string();

        let attachment = sqlx::query_as::<_, Attachment>(
            r#"
            INSERT INTO attachments (id, page_id, blob_hash, filename, mime_type, file_size, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(page_id)
        .bind(blob_hash)
        .bind(filename)
        .bind(mime_type)
        .bind(file_size)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created attachment: {} for page: {}", id, page_id);
        self.changes.publish(RecordKind::Attachment);
        Ok(attachment)
    }

    pub async fn list_attachments(&self, page_id: &str) -> Result<Vec<Attachment>> {
        let attachments = sqlx::query_as::<_, Attachment>(
            "SELECT * FROM attachments WHERE page_id = ? ORDER BY rowid",
        )
        .bind(page_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attachments)
    }

    /// Delete an attachment, returning its blob hash for store cleanup
    pub async fn delete_attachment(&self, id: &str) -> Result<String> {
        let blob_hash: String =
            sqlx::query_scalar("SELECT blob_hash FROM attachments WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| AppError::Generic("Attachment not found".to_string()))?;

        sqlx::query("DELETE FROM attachments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Deleted attachment: {}", id);
        self.changes.publish(RecordKind::Attachment);
        Ok(blob_hash)
    }

    /// Delete every attachment of a page, returning their blob hashes
    pub async fn delete_page_attachments(&self, page_id: &str) -> Result<Vec<String>> {
        let hashes: Vec<String> =
            sqlx::query_scalar("SELECT blob_hash FROM attachments WHERE page_id = ?")
                .bind(page_id)
                .fetch_all(&self.pool)
                .await?;

        sqlx::query("DELETE FROM attachments WHERE page_id = ?")
            .bind(page_id)
            .execute(&self.pool)
            .await?;

        self.changes.publish(RecordKind::Attachment);
        Ok(hashes)
    }

    /// Number of attachment rows still pointing at a blob.
    /// The blob store payload may only be removed when this reaches 0.
    pub async fn count_blob_references(&self, blob_hash: &str) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM attachments WHERE blob_hash = ?")
                .bind(blob_hash)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    // ===== Settings =====

    pub async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    pub async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Set setting: {} = {}", key, value);
        self.changes.publish(RecordKind::Setting);
        Ok(())
    }

    pub async fn list_settings(&self) -> Result<Vec<Setting>> {
        let settings = sqlx::query_as::<_, Setting>("SELECT * FROM settings ORDER BY key")
            .fetch_all(&self.pool)
            .await?;

        Ok(settings)
    }
}
