//! Page service
//!
//! Page-level orchestration: tag management, favorites, search and the
//! recursive delete cascade that keeps attachments, blobs, tag links
//! and canvas elements consistent with the page tree.

use crate::database::{Page, Repository, Tag, UpdatePageRequest};
use crate::error::Result;
use crate::storage::BlobStore;
use serde::Serialize;

/// A page joined with its tags, the shape the UI lists
#[derive(Debug, Clone, Serialize)]
pub struct PageWithTags {
    #[serde(flatten)]
    pub page: Page,
    pub tags: Vec<Tag>,
}

#[derive(Clone)]
pub struct PageService {
    repo: Repository,
    blob_store: BlobStore,
}

impl PageService {
    pub fn new(repo: Repository, blob_store: BlobStore) -> Self {
        Self { repo, blob_store }
    }

    pub async fn get_page_with_tags(&self, id: &str) -> Result<PageWithTags> {
        let page = self.repo.get_page(id).await?;
        let tags = self.repo.list_tags_for_page(id).await?;
        Ok(PageWithTags { page, tags })
    }

    /// Flip a page's favorite flag, returning the new state
    pub async fn toggle_favorite(&self, id: &str) -> Result<bool> {
        let page = self.repo.get_page(id).await?;
        let next = if page.favorite() { 0 } else { 1 };
        self.repo.set_page_favorite(id, next).await?;
        Ok(next != 0)
    }

    pub async fn update_page(&self, id: &str, req: UpdatePageRequest) -> Result<Page> {
        self.repo.update_page(id, req).await
    }

    /// Search pages by title or body substring, case-insensitive.
    /// An empty or whitespace query matches nothing.
    pub async fn search(&self, query: &str) -> Result<Vec<Page>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.repo.search_pages(query).await
    }

    /// Attach a tag by name, creating the tag if it does not exist.
    /// Tags are deduplicated by name; `color` only applies on creation.
    pub async fn add_tag(&self, page_id: &str, name: &str, color: &str) -> Result<Tag> {
        let tag = match self.repo.get_tag_by_name(name).await? {
            Some(tag) => tag,
            None => self.repo.create_tag(name, color).await?,
        };

        self.repo.link_page_tag(page_id, &tag.id).await?;
        Ok(tag)
    }

    pub async fn remove_tag(&self, page_id: &str, tag_id: &str) -> Result<()> {
        self.repo.unlink_page_tag(page_id, tag_id).await
    }

    /// Delete a page and everything hanging off it: sub-pages
    /// (recursively), attachments with their now-unreferenced blobs,
    /// tag links and canvas elements.
    pub async fn delete_page(&self, id: &str) -> Result<()> {
        self.delete_page_inner(id.to_string()).await
    }

    fn delete_page_inner(
        &self,
        id: String,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            for subpage in self.repo.list_subpages(&id).await? {
                self.delete_page_inner(subpage.id).await?;
            }

            let hashes = self.repo.delete_page_attachments(&id).await?;
            for hash in hashes {
                if self.repo.count_blob_references(&hash).await? == 0 {
                    self.blob_store.delete(&hash).await?;
                }
            }

            self.repo.delete_page_tags(&id).await?;
            self.repo.delete_page_elements(&id).await?;
            self.repo.delete_page(&id).await?;

            Ok(())
        })
    }
}
