//! バッチ処理器 - 編成層
//!
//! ## 職責
//!
//! 1 回の提出（書類一式・会社名・決裁種別）を最初から最後まで処理する。
//!
//! ## 主な機能
//!
//! 1. **前提条件チェック**：会社名・書類数・種別の重複をバッチ開始前に確認
//! 2. **バックアップ**：検証より先に、元ファイルを必ずバックアップグループへ入れる
//! 3. **逐次処理**：書類を渡された順に 1 件ずつ DocumentFlow へ委譲する
//! 4. **障害の隔離**：1 件の失敗を処理エラーの指摘 1 件に変換し、残りの処理を続ける
//! 5. **書類間突合**：法人名・住所・代表者名の食い違いを検出
//! 6. **アーカイブ作成**：成果物が 1 件以上あるときだけ固める（失敗はバッチ全体の失敗）
//!
//! ## 設計上の特徴
//!
//! - 書類単位の詳細は持たない（DocumentFlow に委譲）
//! - 提出ごとに結果を持つので、同時に複数の提出を受けても状態を共有しない

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::{AppResult, PreconditionError};
use crate::infrastructure::{ArchiveEntry, ArchivePacker, PageRenderer, TextExtractor};
use crate::models::{ApprovalMode, BatchResult, DocumentKind, Finding, RuleCatalog, UploadedDocument};
use crate::orchestrator::archive_layout::{archive_name, ArchiveLayout};
use crate::services::{cross_check, EntityInfo, FindingWriter, OutputPolicyKind};
use crate::utils::logging;
use crate::workflow::{processing_error, DocumentCtx, DocumentFlow, DocumentState};

/// バッチの挙動を切り替える設定
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    pub policy: OutputPolicyKind,
    /// 書類間の法人情報突合
    pub cross_check_entities: bool,
    /// 未提出の書類種別ごとに警告を出す
    pub warn_missing_kinds: bool,
    pub verbose_logging: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            policy: OutputPolicyKind::default(),
            cross_check_entities: true,
            warn_missing_kinds: false,
            verbose_logging: false,
        }
    }
}

/// 作成したアーカイブ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// バッチ全体の結果
#[derive(Debug)]
pub struct BatchOutcome {
    pub result: BatchResult,
    /// 成果物が 1 件もなければ None
    pub archive: Option<Archive>,
}

/// バッチ処理器
pub struct BatchOrchestrator<X, A, R> {
    catalog: Arc<RuleCatalog>,
    flow: DocumentFlow<X, R>,
    packer: A,
    options: BatchOptions,
    finding_writer: Option<FindingWriter>,
}

impl<X, A, R> BatchOrchestrator<X, A, R>
where
    X: TextExtractor,
    A: ArchivePacker,
    R: PageRenderer,
{
    pub fn new(
        catalog: Arc<RuleCatalog>,
        extractor: X,
        packer: A,
        renderer: R,
        options: BatchOptions,
    ) -> AppResult<Self> {
        let flow = DocumentFlow::new(
            Arc::clone(&catalog),
            extractor,
            renderer,
            options.policy,
            options.cross_check_entities,
        )?
        .with_verbose_logging(options.verbose_logging);

        Ok(Self {
            catalog,
            flow,
            packer,
            options,
            finding_writer: None,
        })
    }

    /// 指摘を監査ログにも書き出す
    pub fn with_finding_writer(mut self, writer: FindingWriter) -> Self {
        self.finding_writer = Some(writer);
        self
    }

    /// 提出 1 回分を処理する
    ///
    /// 前提条件エラーとアーカイブ作成エラーのみ `Err` で返す。
    /// 書類単位の失敗はすべて結果の指摘になる。
    pub async fn process_batch(
        &self,
        documents: &[UploadedDocument],
        company_name: &str,
        approval_mode: ApprovalMode,
    ) -> AppResult<BatchOutcome> {
        check_preconditions(documents, company_name, &self.catalog)?;
        let company_name = company_name.trim();

        logging::log_documents_loaded(documents.len(), company_name);

        let mut result = BatchResult::default();
        let mut layout = ArchiveLayout::new(&self.catalog);
        let mut deliverables = Vec::new();
        let mut backups = Vec::new();
        let mut entities: Vec<(DocumentKind, EntityInfo)> = Vec::new();

        if self.options.warn_missing_kinds {
            for kind in missing_kinds(documents) {
                self.record(
                    &mut result,
                    Finding::warning(format!(
                        "{} がスキップされました（未アップロード）。",
                        self.catalog.label(kind)
                    )),
                );
            }
        }

        for (i, document) in documents.iter().enumerate() {
            let mut ctx = DocumentCtx::new(i + 1, document.kind, &document.original_filename);
            logging::log_document_start(&ctx);

            // 検証より先に元ファイルを確保
            backups.push(ArchiveEntry::new(
                layout.backup_path(&document.original_filename),
                document.content.clone(),
            ));

            match self
                .flow
                .run(document, &mut ctx, company_name, approval_mode)
                .await
            {
                Ok(outcome) => {
                    for finding in outcome.findings {
                        self.record(&mut result, finding);
                    }
                    if let Some(artifact) = outcome.artifact {
                        let (path, file_name) = layout.deliverable_path(&artifact.file_name);
                        info!("{} ✓ 成果物: {}", ctx, file_name);
                        result.record_artifact(file_name);
                        deliverables.push(ArchiveEntry::new(path, artifact.bytes));
                    }
                    if let Some(entity) = outcome.entity {
                        entities.push((document.kind, entity));
                    }
                }
                Err(e) => {
                    ctx.transition(DocumentState::ExtractionFailed);
                    error!("{} ❌ 処理中にエラーが発生: {}", ctx, e);
                    self.record(&mut result, processing_error(&ctx, &e));
                }
            }
        }

        if self.options.cross_check_entities {
            for finding in cross_check(&entities) {
                self.record(&mut result, finding);
            }
        }

        if result.produced.is_empty() {
            warn!("⚠️ 成果物がないためアーカイブは作成しません");
            return Ok(BatchOutcome {
                result,
                archive: None,
            });
        }

        let file_name = archive_name(
            &self.catalog.archive_prefix,
            company_name,
            &chrono::Local::now(),
        );
        let entries: Vec<ArchiveEntry> = deliverables.into_iter().chain(backups).collect();
        let bytes = self.packer.pack(&entries)?;
        info!("📦 アーカイブ作成: {} ({} エントリ, {} bytes)", file_name, entries.len(), bytes.len());

        Ok(BatchOutcome {
            result,
            archive: Some(Archive { file_name, bytes }),
        })
    }

    fn record(&self, result: &mut BatchResult, finding: Finding) {
        if let Some(writer) = &self.finding_writer {
            writer.write_quietly(&finding);
        }
        result.push(finding);
    }
}

/// バッチ開始前の確認
pub fn check_preconditions(
    documents: &[UploadedDocument],
    company_name: &str,
    catalog: &RuleCatalog,
) -> Result<(), PreconditionError> {
    if company_name.trim().is_empty() {
        return Err(PreconditionError::EmptyCompanyName);
    }
    if documents.is_empty() {
        return Err(PreconditionError::NoDocuments);
    }

    // 入力は種別ごとに 1 ファイル。--doc の繰り返しなどで同じ種別が重なった場合は受け付けない
    let mut seen = HashSet::new();
    for document in documents {
        if !seen.insert(document.kind) {
            return Err(PreconditionError::DuplicateKind {
                label: catalog.label(document.kind).to_string(),
            });
        }
    }
    Ok(())
}

fn missing_kinds(documents: &[UploadedDocument]) -> Vec<DocumentKind> {
    DocumentKind::ALL
        .into_iter()
        .filter(|kind| documents.iter().all(|d| d.kind != *kind))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(kind: DocumentKind) -> UploadedDocument {
        UploadedDocument::new(kind, Vec::new(), "x.docx")
    }

    #[test]
    fn test_blank_company_name() {
        let catalog = RuleCatalog::builtin();
        assert_eq!(
            check_preconditions(&[doc(DocumentKind::Contract)], "  \u{3000} ", &catalog),
            Err(PreconditionError::EmptyCompanyName)
        );
    }

    #[test]
    fn test_no_documents() {
        let catalog = RuleCatalog::builtin();
        assert_eq!(
            check_preconditions(&[], "株式会社テスト", &catalog),
            Err(PreconditionError::NoDocuments)
        );
    }

    #[test]
    fn test_duplicate_kind() {
        let catalog = RuleCatalog::builtin();
        let docs = [doc(DocumentKind::Oath), doc(DocumentKind::Oath)];
        assert_eq!(
            check_preconditions(&docs, "株式会社テスト", &catalog),
            Err(PreconditionError::DuplicateKind {
                label: "③ 誓約書".to_string()
            })
        );
    }

    #[test]
    fn test_missing_kinds_in_catalog_order() {
        let docs = [doc(DocumentKind::Checklist), doc(DocumentKind::Contract)];
        assert_eq!(
            missing_kinds(&docs),
            vec![
                DocumentKind::Estimate,
                DocumentKind::Oath,
                DocumentKind::Confirmation
            ]
        );
    }
}
