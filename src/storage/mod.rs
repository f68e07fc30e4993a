//! Storage module
//!
//! Content-addressed binary storage for attachment payloads.

pub mod blob_store;

pub use blob_store::BlobStore;
