//! 基盤層（Infrastructure）
//!
//! 外部形式・外部プロセスとのやりとりだけを受け持つ。書類種別や検証ルールは知らない。

pub mod archive_packer;
pub mod docx_sanitizer;
pub mod page_renderer;
pub mod text_extractor;

pub use archive_packer::{ArchiveEntry, ArchivePacker, ZipArchivePacker};
pub use docx_sanitizer::{sanitize_docx, DocxEdits, SanitizedDocx, TextReplacement};
pub use page_renderer::{BrowserSource, ChromiumPageRenderer, DisabledRenderer, PageRenderer};
pub use text_extractor::{OoxmlTextExtractor, TextExtractor};
