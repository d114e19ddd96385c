pub mod catalog;
pub mod document;
pub mod finding;
pub mod loaders;

pub use catalog::{KindRule, RuleCatalog};
pub use document::{ApprovalMode, ContainerFormat, DocumentKind, UploadedDocument};
pub use finding::{Artifact, BatchResult, Finding, Severity};
pub use loaders::{
    load_catalog, load_uploaded_document, load_uploaded_documents, parse_document_arg,
};
