//! Archive formats
//!
//! Self-contained JSON archive documents for backup and transfer:
//! MRNotes files carry the full store, MRBook files a single notebook.
//! Attachment payloads travel inline as Base64 so an archive restores
//! on a machine with an empty blob store.

pub mod codec;
pub mod format;
pub mod markdown;

pub use format::{
    ArchiveAttachment, ArchiveNotebook, ArchiveNotebookMeta, ArchivePage, ArchiveSection,
    ArchiveTag, FullArchive, NotebookArchive,
};
