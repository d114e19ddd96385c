pub mod catalog_loader;
pub mod document_loader;

pub use catalog_loader::{load_catalog, parse_catalog};
pub use document_loader::{load_uploaded_document, load_uploaded_documents, parse_document_arg};
