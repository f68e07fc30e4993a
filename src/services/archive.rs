//! Archive service
//!
//! Builds and restores MRNotes/MRBook documents. Exports walk the live
//! hierarchy and inline every attachment payload; imports validate the
//! whole document before the first write, so a malformed archive never
//! leaves a partial restore behind.

use crate::archive::codec;
use crate::archive::format::{
    ArchiveAttachment, ArchiveNotebook, ArchiveNotebookMeta, ArchivePage, ArchiveSection,
    ArchiveTag, FullArchive, NotebookArchive,
};
use crate::archive::markdown;
use crate::config;
use crate::database::{Notebook, Page, Repository, Section, Tag};
use crate::error::{AppError, Result};
use crate::storage::BlobStore;
use chrono::Utc;
use std::collections::BTreeMap;

/// What an archive import produced
#[derive(Debug)]
pub enum ImportOutcome {
    /// Full-store restore; carries the number of notebooks imported
    FullRestore { notebooks: usize },
    /// Single notebook added alongside existing data
    Notebook(Notebook),
    /// One page created from a Markdown file
    Page(Page),
}

#[derive(Clone)]
pub struct ArchiveService {
    repo: Repository,
    blob_store: BlobStore,
}

impl ArchiveService {
    pub fn new(repo: Repository, blob_store: BlobStore) -> Self {
        Self { repo, blob_store }
    }

    // ===== Export =====

    /// Export every live notebook, all tags and all settings
    pub async fn export_all(&self) -> Result<FullArchive> {
        let notebooks = self.repo.list_notebooks().await?;

        let created_at = notebooks
            .iter()
            .map(|n| n.created_at)
            .min()
            .unwrap_or_else(Utc::now);

        let mut archived_notebooks = Vec::with_capacity(notebooks.len());
        for notebook in &notebooks {
            archived_notebooks.push(self.export_notebook_tree(notebook).await?);
        }

        let tags = self
            .repo
            .list_tags()
            .await?
            .into_iter()
            .map(archive_tag)
            .collect();

        let settings: BTreeMap<String, String> = self
            .repo
            .list_settings()
            .await?
            .into_iter()
            .map(|s| (s.key, s.value))
            .collect();

        tracing::info!("Exported full archive: {} notebooks", archived_notebooks.len());

        Ok(FullArchive {
            file_format: config::ARCHIVE_FORMAT_FULL.to_string(),
            version: config::ARCHIVE_VERSION.to_string(),
            created_at,
            exported_at: Utc::now(),
            notebooks: archived_notebooks,
            tags,
            settings,
        })
    }

    /// Export one notebook. No global tag table or settings travel
    /// along; pages carry their tag names inline.
    pub async fn export_notebook(&self, notebook_id: &str) -> Result<NotebookArchive> {
        let notebook = self.repo.get_notebook(notebook_id).await?;

        let mut sections = Vec::new();
        for section in self.repo.list_sections(&notebook.id).await? {
            sections.push(self.export_section(&section).await?);
        }

        Ok(NotebookArchive {
            file_format: config::ARCHIVE_FORMAT_NOTEBOOK.to_string(),
            version: config::ARCHIVE_VERSION.to_string(),
            exported_at: Utc::now(),
            notebook: ArchiveNotebookMeta {
                title: notebook.title,
                description: notebook.description,
                color: notebook.color,
                icon: notebook.icon,
                created_at: notebook.created_at,
                updated_at: notebook.updated_at,
            },
            sections,
        })
    }

    /// Render a page as Markdown. A missing page yields `Ok(None)` so
    /// the shell can skip pages deleted mid-export.
    pub async fn export_page_markdown(&self, page_id: &str) -> Result<Option<String>> {
        let page = match self.repo.get_page(page_id).await {
            Ok(page) => page,
            Err(AppError::PageNotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        Ok(Some(markdown::page_to_markdown(&page.title, &page.content()?)))
    }

    async fn export_notebook_tree(&self, notebook: &Notebook) -> Result<ArchiveNotebook> {
        let mut sections = Vec::new();

        for section in self.repo.list_sections(&notebook.id).await? {
            sections.push(self.export_section(&section).await?);
        }

        Ok(ArchiveNotebook {
            title: notebook.title.clone(),
            description: notebook.description.clone(),
            color: notebook.color.clone(),
            icon: notebook.icon.clone(),
            order_index: notebook.order_index,
            created_at: notebook.created_at,
            sections,
        })
    }

    async fn export_section(&self, section: &Section) -> Result<ArchiveSection> {
        let mut pages = Vec::new();

        for page in self.repo.list_pages(&section.id).await? {
            // Sub-pages appear under their parent, not at section level
            if page.parent_page_id.is_some() {
                continue;
            }

            let mut archived = self.export_page(&page).await?;
            for subpage in self.repo.list_subpages(&page.id).await? {
                archived.subpages.push(self.export_page(&subpage).await?);
            }
            pages.push(archived);
        }

        Ok(ArchiveSection {
            title: section.title.clone(),
            color: section.color.clone(),
            order_index: section.order_index,
            created_at: section.created_at,
            pages,
        })
    }

    async fn export_page(&self, page: &Page) -> Result<ArchivePage> {
        let tags = self
            .repo
            .list_tags_for_page(&page.id)
            .await?
            .into_iter()
            .map(|t| t.name)
            .collect();

        let mut attachments = Vec::new();
        for attachment in self.repo.list_attachments(&page.id).await? {
            let data = self.blob_store.read(&attachment.blob_hash).await?;
            attachments.push(ArchiveAttachment {
                filename: attachment.filename,
                mime_type: attachment.mime_type,
                file_size: attachment.file_size,
                created_at: Some(attachment.created_at),
                data: codec::encode_bytes(&data),
            });
        }

        Ok(ArchivePage {
            title: page.title.clone(),
            content: page.content()?,
            order_index: page.order_index,
            is_favorite: page.favorite(),
            created_at: page.created_at,
            updated_at: page.updated_at,
            tags,
            attachments,
            subpages: Vec::new(),
        })
    }

    // ===== Import =====

    /// Import an archive document, dispatching on its `fileFormat`.
    ///
    /// The document is fully parsed and validated before any write;
    /// an unknown or malformed format fails with zero side effects.
    pub async fn import_archive(&self, contents: &str) -> Result<ImportOutcome> {
        let (file_format, value) = sniff_format(contents)?;
        match file_format.as_str() {
            config::ARCHIVE_FORMAT_FULL => self.import_full_value(value).await,
            config::ARCHIVE_FORMAT_NOTEBOOK => self.import_notebook_value(value).await,
            other => Err(AppError::InvalidArchive(format!(
                "unsupported fileFormat: {}",
                other
            ))),
        }
    }

    /// Import a file by extension: `.mrnote` full backup, `.mrbook`
    /// notebook, `.md` page into `target_section`. The extension and
    /// the document's `fileFormat` must agree; a mismatch is rejected
    /// before anything is written.
    pub async fn import_file(
        &self,
        filename: &str,
        contents: &str,
        target_section: Option<&str>,
    ) -> Result<ImportOutcome> {
        let (stem, extension) = split_filename(filename);

        match extension.to_ascii_lowercase().as_str() {
            config::EXT_FULL_BACKUP => {
                let (file_format, value) = sniff_format(contents)?;
                if file_format != config::ARCHIVE_FORMAT_FULL {
                    return Err(AppError::InvalidArchive(format!(
                        "expected a {} document, found {}",
                        config::ARCHIVE_FORMAT_FULL,
                        file_format
                    )));
                }
                self.import_full_value(value).await
            }
            config::EXT_NOTEBOOK => {
                let (file_format, value) = sniff_format(contents)?;
                if file_format != config::ARCHIVE_FORMAT_NOTEBOOK {
                    return Err(AppError::InvalidArchive(format!(
                        "expected a {} document, found {}",
                        config::ARCHIVE_FORMAT_NOTEBOOK,
                        file_format
                    )));
                }
                self.import_notebook_value(value).await
            }
            config::EXT_MARKDOWN => {
                let section_id = target_section.ok_or_else(|| {
                    AppError::Generic("a target section is required for Markdown import".to_string())
                })?;
                let page = self.import_markdown(section_id, stem, contents).await?;
                Ok(ImportOutcome::Page(page))
            }
            other => Err(AppError::InvalidArchive(format!(
                "unsupported file type: .{}",
                other
            ))),
        }
    }

    async fn import_full_value(&self, value: serde_json::Value) -> Result<ImportOutcome> {
        let archive: FullArchive = serde_json::from_value(value)
            .map_err(|e| AppError::InvalidArchive(format!("malformed archive: {}", e)))?;
        let notebooks = self.import_full(archive).await?;
        Ok(ImportOutcome::FullRestore { notebooks })
    }

    async fn import_notebook_value(&self, value: serde_json::Value) -> Result<ImportOutcome> {
        let archive: NotebookArchive = serde_json::from_value(value)
            .map_err(|e| AppError::InvalidArchive(format!("malformed archive: {}", e)))?;
        let notebook = self.import_notebook(archive).await?;
        Ok(ImportOutcome::Notebook(notebook))
    }

    /// Restore a full archive, preserving archived timestamps
    async fn import_full(&self, archive: FullArchive) -> Result<usize> {
        let tag_colors = self.import_tags(&archive.tags).await?;

        let count = archive.notebooks.len();
        for notebook in archive.notebooks {
            let created = self
                .repo
                .insert_notebook(
                    &notebook.title,
                    &notebook.description,
                    &notebook.color,
                    &notebook.icon,
                    notebook.order_index,
                    notebook.created_at,
                    notebook.created_at,
                )
                .await?;

            self.import_sections(&created.id, notebook.sections, &tag_colors, true)
                .await?;
        }

        for (key, value) in &archive.settings {
            self.repo.set_setting(key, value).await?;
        }

        tracing::info!("Imported full archive: {} notebooks", count);
        Ok(count)
    }

    /// Import a single notebook alongside existing data.
    ///
    /// Gets fresh timestamps and lands at the end of the notebook
    /// list, since it joins a store with its own history. Tags are
    /// resolved by the names pages carry inline.
    async fn import_notebook(&self, archive: NotebookArchive) -> Result<Notebook> {
        let order_index = self.repo.list_notebooks().await?.len() as i64;
        let now = Utc::now();

        let meta = archive.notebook;
        let created = self
            .repo
            .insert_notebook(
                &meta.title,
                &meta.description,
                &meta.color,
                &meta.icon,
                order_index,
                now,
                now,
            )
            .await?;

        self.import_sections(&created.id, archive.sections, &BTreeMap::new(), false)
            .await?;

        tracing::info!("Imported notebook: {}", created.id);
        Ok(created)
    }

    /// Create a page from Markdown text in the given section.
    ///
    /// A leading `# ` heading names the page; otherwise `fallback_title`
    /// (typically the file stem) is used.
    pub async fn import_markdown(
        &self,
        section_id: &str,
        fallback_title: &str,
        text: &str,
    ) -> Result<Page> {
        let (title, content) = markdown::markdown_to_page(text, fallback_title);
        let order_index = self.repo.list_pages(section_id).await?.len() as i64;
        let now = Utc::now();

        self.repo
            .insert_page(
                section_id,
                None,
                &title,
                &content.to_json()?,
                order_index,
                0,
                now,
                now,
            )
            .await
    }

    /// Ensure the archive's tags exist, deduplicated by name.
    /// Returns name to color for resolving page tag references.
    async fn import_tags(&self, tags: &[ArchiveTag]) -> Result<BTreeMap<String, String>> {
        let mut colors = BTreeMap::new();

        for tag in tags {
            let existing = self.repo.get_tag_by_name(&tag.name).await?;
            let tag = match existing {
                Some(tag) => tag,
                None => self.repo.create_tag(&tag.name, &tag.color).await?,
            };
            colors.insert(tag.name, tag.color);
        }

        Ok(colors)
    }

    async fn import_sections(
        &self,
        notebook_id: &str,
        sections: Vec<ArchiveSection>,
        tag_colors: &BTreeMap<String, String>,
        preserve_timestamps: bool,
    ) -> Result<()> {
        for section in sections {
            let created_at = if preserve_timestamps {
                section.created_at
            } else {
                Utc::now()
            };

            let created = self
                .repo
                .insert_section(
                    notebook_id,
                    &section.title,
                    section.order_index,
                    &section.color,
                    created_at,
                )
                .await?;

            for page in section.pages {
                self.import_page(&created.id, None, page, tag_colors, preserve_timestamps)
                    .await?;
            }
        }

        Ok(())
    }

    fn import_page<'a>(
        &'a self,
        section_id: &'a str,
        parent_page_id: Option<&'a str>,
        page: ArchivePage,
        tag_colors: &'a BTreeMap<String, String>,
        preserve_timestamps: bool,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let (created_at, updated_at) = if preserve_timestamps {
                (page.created_at, page.updated_at)
            } else {
                let now = Utc::now();
                (now, now)
            };

            let created = self
                .repo
                .insert_page(
                    section_id,
                    parent_page_id,
                    &page.title,
                    &page.content.to_json()?,
                    page.order_index,
                    page.is_favorite as i64,
                    created_at,
                    updated_at,
                )
                .await?;

            for name in &page.tags {
                let tag = match self.repo.get_tag_by_name(name).await? {
                    Some(tag) => tag,
                    None => {
                        // Page references a tag missing from the tag table
                        let color = tag_colors
                            .get(name)
                            .map(String::as_str)
                            .unwrap_or(config::TAG_DEFAULT_COLOR);
                        self.repo.create_tag(name, color).await?
                    }
                };
                self.repo.link_page_tag(&created.id, &tag.id).await?;
            }

            for attachment in page.attachments {
                let data = codec::decode_bytes(&attachment.data)?;
                let hash = self.blob_store.write(&data).await?;
                let created_at = if preserve_timestamps {
                    attachment.created_at.unwrap_or_else(Utc::now)
                } else {
                    Utc::now()
                };

                self.repo
                    .create_attachment(
                        &created.id,
                        &hash,
                        &attachment.filename,
                        &attachment.mime_type,
                        attachment.file_size,
                        created_at,
                    )
                    .await?;
            }

            for subpage in page.subpages {
                self.import_page(section_id, Some(&created.id), subpage, tag_colors, preserve_timestamps)
                    .await?;
            }

            Ok(())
        })
    }
}

/// Suggested filename for a full backup, e.g. `backup-2024-05-01.mrnote`
pub fn full_backup_filename(exported_at: chrono::DateTime<Utc>) -> String {
    format!(
        "backup-{}.{}",
        exported_at.format("%Y-%m-%d"),
        config::EXT_FULL_BACKUP
    )
}

/// Suggested filename for a notebook export
pub fn notebook_filename(title: &str) -> String {
    format!(
        "{}.{}",
        crate::services::attachments::sanitize_filename(title),
        config::EXT_NOTEBOOK
    )
}

/// Suggested filename for a Markdown page export
pub fn markdown_filename(title: &str) -> String {
    format!(
        "{}.{}",
        crate::services::attachments::sanitize_filename(title),
        config::EXT_MARKDOWN
    )
}

fn archive_tag(tag: Tag) -> ArchiveTag {
    ArchiveTag {
        name: tag.name,
        color: tag.color,
    }
}

/// Parse archive JSON far enough to read its `fileFormat` tag
fn sniff_format(contents: &str) -> Result<(String, serde_json::Value)> {
    let value: serde_json::Value = serde_json::from_str(contents)
        .map_err(|e| AppError::InvalidArchive(format!("not a JSON document: {}", e)))?;

    let file_format = value
        .get("fileFormat")
        .and_then(|f| f.as_str())
        .ok_or_else(|| AppError::InvalidArchive("missing fileFormat field".to_string()))?
        .to_string();

    Ok((file_format, value))
}

/// Split "notes.md" into ("notes", "md"); no dot yields an empty
/// extension
fn split_filename(filename: &str) -> (&str, &str) {
    match filename.rsplit_once('.') {
        Some((stem, ext)) => (stem, ext),
        None => (filename, ""),
    }
}
