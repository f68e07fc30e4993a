//! Attachment service
//!
//! Binds attachment metadata rows to blob store payloads. Payloads are
//! content-addressed, so identical files attached to several pages
//! share one blob; removal only reclaims a blob once the last
//! referencing row is gone.

use crate::database::{Attachment, Repository};
use crate::error::Result;
use crate::storage::BlobStore;
use chrono::Utc;

#[derive(Clone)]
pub struct AttachmentService {
    repo: Repository,
    blob_store: BlobStore,
}

impl AttachmentService {
    pub fn new(repo: Repository, blob_store: BlobStore) -> Self {
        Self { repo, blob_store }
    }

    /// Attach raw bytes to a page
    pub async fn attach(
        &self,
        page_id: &str,
        filename: &str,
        mime_type: &str,
        data: &[u8],
    ) -> Result<Attachment> {
        let hash = self.blob_store.write(data).await?;
        let filename = sanitize_filename(filename);

        self.repo
            .create_attachment(
                page_id,
                &hash,
                &filename,
                mime_type,
                data.len() as i64,
                Utc::now(),
            )
            .await
    }

    pub async fn list(&self, page_id: &str) -> Result<Vec<Attachment>> {
        self.repo.list_attachments(page_id).await
    }

    /// Read an attachment's payload from the blob store
    pub async fn read(&self, attachment: &Attachment) -> Result<Vec<u8>> {
        self.blob_store.read(&attachment.blob_hash).await
    }

    /// Remove an attachment, reclaiming its blob when unreferenced
    pub async fn remove(&self, id: &str) -> Result<()> {
        let hash = self.repo.delete_attachment(id).await?;

        if self.repo.count_blob_references(&hash).await? == 0 {
            self.blob_store.delete(&hash).await?;
        }

        Ok(())
    }
}

/// Strip path separators and control characters from a user-supplied
/// filename; an empty result falls back to "file"
pub fn sanitize_filename(filename: &str) -> String {
    let cleaned: String = filename
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .filter(|c| !c.is_control())
        .collect();

    let cleaned = cleaned.trim().trim_matches('.').trim();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}
