//! 業務能力層（Services）
//!
//! 「書類 1 件に対して何ができるか」を表す。バッチや順序は扱わない。

pub mod appendix_check;
pub mod entity_check;
pub mod finding_writer;
pub mod output_policy;
pub mod reporter;
pub mod validator;

pub use entity_check::{cross_check, EntityExtractor, EntityInfo};
pub use finding_writer::FindingWriter;
pub use output_policy::{ExtractedPayload, OutputPolicyKind, PolicyOutcome, SanitizeRules};
pub use reporter::Report;
pub use validator::Validator;
