/// Filesystem adapters for working files and the directory-backed object store
pub mod document_files;
mod local_object_store;

pub use local_object_store::LocalObjectStore;
