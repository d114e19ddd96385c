//! # Contract Batch
//!
//! 契約関係書類（契約書・見積書・誓約書・チェックシート・確認書）を一括で検証し、
//! 成果物とバックアップを 1 つのアーカイブにまとめる
//!
//! ## アーキテクチャ
//!
//! 本システムは 4 層構成：
//!
//! ### ① 基盤層（Infrastructure）
//! - `infrastructure/` - 外部形式・外部プロセスとのやりとり
//! - `TextExtractor` - Word / Excel からのテキスト抽出
//! - `ArchivePacker` - ZIP 作成
//! - `PageRenderer` - HTML を A4 PDF に印刷（`browser/` のヘッドレス Chromium を使用）
//! - `sanitize_docx` - Word の注釈・強調書式・コメントの除去と段落編集
//!
//! ### ② 業務能力層（Services）
//! - `services/` - 書類 1 件に対して「何ができるか」
//! - `Validator` - 種別ごとの検証ルール
//! - `EntityExtractor` / `cross_check` - 書類間の法人情報突合
//! - `OutputPolicyKind` - 成果物の出し方
//! - `FindingWriter` - 監査ログ
//! - `Report` - 結果の整形
//!
//! ### ③ フロー層（Workflow）
//! - `workflow/` - 書類 1 件の処理手順
//! - `DocumentCtx` - コンテキストと処理段階
//! - `DocumentFlow` - 形式判定 → 抽出 → 検証 → 出力方針
//!
//! ### ④ 編成層（Orchestration）
//! - `orchestrator/batch_processor` - 提出 1 回分のバッチ処理
//! - `orchestrator/archive_layout` - アーカイブ内の配置
//!
//! ## モジュール構成

pub mod app;
pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// よく使う型の再エクスポート
pub use app::{App, RunSummary, Submission};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{ApprovalMode, BatchResult, DocumentKind, Finding, RuleCatalog, Severity, UploadedDocument};
pub use orchestrator::{BatchOptions, BatchOrchestrator, BatchOutcome};
pub use services::{OutputPolicyKind, Report, Validator};
pub use workflow::{DocumentCtx, DocumentFlow};
