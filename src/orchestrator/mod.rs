//! 編成層（Orchestration Layer）
//!
//! ## 職責
//!
//! 提出 1 回分の処理とアーカイブ作成を受け持つ、システムの「司令塔」。
//!
//! ## モジュール構成
//!
//! ### `batch_processor` - バッチ処理器
//! - 前提条件の確認
//! - 書類を順番に DocumentFlow へ渡す
//! - 書類単位の失敗を指摘に変換して集計する
//! - 書類間の法人情報を突合する
//! - アーカイブ作成を依頼する
//!
//! ### `archive_layout` - アーカイブ内配置
//! - 成果物 / バックアップのパス決定
//! - 同名エントリの番号付け
//! - アーカイブ名の生成
//!
//! ## 層の関係
//!
//! ```text
//! batch_processor (Vec<UploadedDocument> を処理)
//!     ↓
//! workflow::DocumentFlow (書類 1 件を処理)
//!     ↓
//! services (能力層：validator / entity_check / output_policy)
//!     ↓
//! infrastructure (基盤：TextExtractor / ArchivePacker / PageRenderer)
//! ```
//!
//! ## 設計原則
//!
//! 1. **単一責任**：batch_processor はバッチ、DocumentFlow は 1 件
//! 2. **下向きの依存**：編成層 → workflow → services → infrastructure
//! 3. **業務判断を持たない**：順序制御と集計のみ

pub mod archive_layout;
pub mod batch_processor;

pub use archive_layout::{archive_name, ArchiveLayout};
pub use batch_processor::{check_preconditions, Archive, BatchOptions, BatchOrchestrator, BatchOutcome};
