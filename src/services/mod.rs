//! Service layer
//!
//! Orchestration above the repository: multi-table cascades, blob
//! store coordination and archive assembly. Repositories stay
//! single-table; anything touching more than one table or the
//! filesystem lives here.

pub mod archive;
pub mod attachments;
pub mod notebooks;
pub mod pages;

pub use archive::{ArchiveService, ImportOutcome};
pub use attachments::AttachmentService;
pub use notebooks::NotebookService;
pub use pages::{PageService, PageWithTags};
