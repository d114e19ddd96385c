pub mod document_ctx;
pub mod document_flow;

pub use document_ctx::{DocumentCtx, DocumentState};
pub use document_flow::{processing_error, DocumentFlow, DocumentOutcome};
