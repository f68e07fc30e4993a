//! Notebook service
//!
//! Notebook and section lifecycle. Deleting a notebook soft-deletes
//! the row while hard-deleting everything beneath it, blobs included;
//! purging removes the row itself.

use crate::database::{
    CreateNotebookRequest, CreateSectionRequest, Notebook, Repository, Section,
    UpdateNotebookRequest, UpdateSectionRequest,
};
use crate::error::Result;
use crate::services::pages::PageService;
use crate::storage::BlobStore;

#[derive(Clone)]
pub struct NotebookService {
    repo: Repository,
    pages: PageService,
}

impl NotebookService {
    pub fn new(repo: Repository, blob_store: BlobStore) -> Self {
        let pages = PageService::new(repo.clone(), blob_store);
        Self { repo, pages }
    }

    // ===== Notebooks =====

    pub async fn create_notebook(&self, req: CreateNotebookRequest) -> Result<Notebook> {
        self.repo.create_notebook(req).await
    }

    pub async fn get_notebook(&self, id: &str) -> Result<Notebook> {
        self.repo.get_notebook(id).await
    }

    pub async fn list_notebooks(&self) -> Result<Vec<Notebook>> {
        self.repo.list_notebooks().await
    }

    pub async fn update_notebook(&self, id: &str, req: UpdateNotebookRequest) -> Result<Notebook> {
        self.repo.update_notebook(id, req).await
    }

    /// Delete a notebook: the row is soft-deleted (it stays gettable
    /// by id, listings skip it) while its sections and pages are
    /// hard-deleted before the call returns, blobs included.
    pub async fn delete_notebook(&self, id: &str) -> Result<()> {
        self.repo.soft_delete_notebook(id).await?;

        for section in self.repo.list_sections(id).await? {
            self.delete_section(&section.id).await?;
        }

        tracing::info!("Deleted notebook: {}", id);
        Ok(())
    }

    /// Remove a notebook row for good.
    ///
    /// Works on live and soft-deleted notebooks alike; any sections
    /// still present are cascaded first.
    pub async fn purge_notebook(&self, id: &str) -> Result<()> {
        for section in self.repo.list_sections(id).await? {
            self.delete_section(&section.id).await?;
        }

        self.repo.hard_delete_notebook(id).await?;
        tracing::info!("Purged notebook: {}", id);
        Ok(())
    }

    // ===== Sections =====

    pub async fn create_section(&self, req: CreateSectionRequest) -> Result<Section> {
        self.repo.create_section(req).await
    }

    pub async fn list_sections(&self, notebook_id: &str) -> Result<Vec<Section>> {
        self.repo.list_sections(notebook_id).await
    }

    pub async fn update_section(&self, id: &str, req: UpdateSectionRequest) -> Result<Section> {
        self.repo.update_section(id, req).await
    }

    /// Delete a section and all of its pages (with their cascades)
    pub async fn delete_section(&self, id: &str) -> Result<()> {
        // Top-level pages only; delete_page recurses into sub-pages
        for page in self.repo.list_pages(id).await? {
            if page.parent_page_id.is_none() {
                self.pages.delete_page(&page.id).await?;
            }
        }

        self.repo.delete_section(id).await
    }
}
