//! 書類処理フロー - フロー層
//!
//! 中核の職責：「書類 1 件」の処理手順を定義する
//!
//! 処理順序：
//! 1. 元ファイル名から形式を判定（PDF はそのまま成果物へ）
//! 2. テキスト抽出
//! 3. 検証
//! 4. 出力方針の適用

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::{AppError, AppResult};
use crate::infrastructure::{PageRenderer, TextExtractor};
use crate::models::{ApprovalMode, Artifact, ContainerFormat, Finding, RuleCatalog, UploadedDocument};
use crate::services::{
    EntityExtractor, EntityInfo, ExtractedPayload, OutputPolicyKind, SanitizeRules, Validator,
};
use crate::utils::logging::truncate_text;
use crate::workflow::document_ctx::{DocumentCtx, DocumentState};

/// 書類 1 件の処理結果
#[derive(Debug, Default)]
pub struct DocumentOutcome {
    pub artifact: Option<Artifact>,
    /// 検証結果と方針適用時の指摘（発生順）
    pub findings: Vec<Finding>,
    /// 書類間突合用の法人情報（Word のみ）
    pub entity: Option<EntityInfo>,
}

/// 書類処理フロー
///
/// - 抽出・検証・出力方針をこの順で呼ぶ
/// - アーカイブやバッチ全体の集計は持たない
/// - 能力（extractor / renderer / services）にのみ依存する
pub struct DocumentFlow<X, R> {
    catalog: Arc<RuleCatalog>,
    extractor: X,
    renderer: R,
    validator: Validator,
    entity_extractor: Option<EntityExtractor>,
    policy: OutputPolicyKind,
    sanitize_rules: SanitizeRules,
    verbose_logging: bool,
}

impl<X: TextExtractor, R: PageRenderer> DocumentFlow<X, R> {
    /// `cross_check_entities` が false なら法人情報は抽出しない
    pub fn new(
        catalog: Arc<RuleCatalog>,
        extractor: X,
        renderer: R,
        policy: OutputPolicyKind,
        cross_check_entities: bool,
    ) -> AppResult<Self> {
        let validator = Validator::new(Arc::clone(&catalog))?;
        let sanitize_rules = SanitizeRules::new(&catalog)?;
        let entity_extractor = if cross_check_entities {
            Some(EntityExtractor::new(&catalog.entity)?)
        } else {
            None
        };

        Ok(Self {
            catalog,
            extractor,
            renderer,
            validator,
            entity_extractor,
            policy,
            sanitize_rules,
            verbose_logging: false,
        })
    }

    pub fn with_verbose_logging(mut self, verbose: bool) -> Self {
        self.verbose_logging = verbose;
        self
    }

    /// 書類 1 件を処理する
    ///
    /// 形式判定と抽出の失敗は `Err` で返す。呼び出し側で処理エラーの指摘に変換する。
    pub async fn run(
        &self,
        document: &UploadedDocument,
        ctx: &mut DocumentCtx,
        company_name: &str,
        approval_mode: ApprovalMode,
    ) -> AppResult<DocumentOutcome> {
        ctx.transition(DocumentState::Extracting);

        let format = document.format()?;
        let output_stem = self.catalog.output_stem(document.kind, company_name);

        let expected = document.kind.expected_format();
        if format != ContainerFormat::Pdf && format != expected {
            // 検証は種別に従って続行する
            warn!(
                "{} 想定外の形式です（.{} を想定、.{} を受領）",
                ctx,
                expected.extension(),
                format.extension()
            );
        }

        // ========== PDF: 整形せず同梱 ==========
        if format == ContainerFormat::Pdf {
            warn!("{} PDF形式のため整形処理をスキップ", ctx);
            ctx.transition(DocumentState::ArtifactReady);
            return Ok(DocumentOutcome {
                artifact: Some(Artifact {
                    file_name: format!("{}.{}", output_stem, format.extension()),
                    bytes: document.content.clone(),
                }),
                findings: vec![Finding::warning(format!(
                    "【{}】PDF形式のため整形処理はスキップされました。",
                    document.kind.tag()
                ))],
                entity: None,
            });
        }

        // ========== 抽出 ==========
        let text = self.extractor.extract_text(&document.content, format)?;
        info!("{} ✓ テキスト抽出完了 ({} 文字)", ctx, text.chars().count());
        if self.verbose_logging {
            debug!("{} 先頭: {}", ctx, truncate_text(&text, 80));
        }

        // ========== 検証 ==========
        ctx.transition(DocumentState::Validating);
        let mut findings =
            self.validator
                .validate(document.kind, &text, approval_mode, company_name);
        info!(
            "{} ✓ 検証完了: エラー {} 件 / 警告 {} 件",
            ctx,
            findings.iter().filter(|f| f.is_error()).count(),
            findings.iter().filter(|f| !f.is_error()).count()
        );

        let entity = match (&self.entity_extractor, format) {
            (Some(extractor), ContainerFormat::WordDocument) => Some(extractor.extract(&text)),
            _ => None,
        };

        // ========== 出力方針 ==========
        let payload = ExtractedPayload {
            kind: document.kind,
            format,
            original: &document.content,
            text: &text,
            output_stem: &output_stem,
            edits: self.sanitize_rules.edits_for(document.kind, approval_mode),
        };

        let artifact = match self.policy.produce(&payload, &self.renderer).await {
            Ok(outcome) => {
                findings.extend(outcome.notes);
                ctx.transition(DocumentState::ArtifactReady);
                outcome.artifact
            }
            Err(e) => {
                // 検証結果は残し、成果物だけを諦める
                error!("{} ❌ 出力処理に失敗: {}", ctx, e);
                findings.push(processing_error(ctx, &e));
                ctx.transition(DocumentState::ExtractionFailed);
                None
            }
        };

        Ok(DocumentOutcome {
            artifact,
            findings,
            entity,
        })
    }
}

/// 書類単位の処理エラーを指摘 1 件に変換する
pub fn processing_error(ctx: &DocumentCtx, err: &AppError) -> Finding {
    Finding::error(format!("【{}】処理エラー: {}", ctx.kind.tag(), err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionError;
    use crate::infrastructure::DisabledRenderer;
    use crate::models::DocumentKind;

    /// バイト列をそのまま UTF-8 テキストとして返す
    struct PlainExtractor;

    impl TextExtractor for PlainExtractor {
        fn extract_text(&self, bytes: &[u8], _format: ContainerFormat) -> AppResult<String> {
            String::from_utf8(bytes.to_vec()).map_err(|e| AppError::malformed_xml("plain", e))
        }
    }

    fn flow(policy: OutputPolicyKind) -> DocumentFlow<PlainExtractor, DisabledRenderer> {
        DocumentFlow::new(
            Arc::new(RuleCatalog::builtin()),
            PlainExtractor,
            DisabledRenderer,
            policy,
            true,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_pdf_is_bundled_with_warning() {
        let doc = UploadedDocument::new(DocumentKind::Oath, b"%PDF-1.7".to_vec(), "誓約書.PDF");
        let mut ctx = DocumentCtx::new(1, doc.kind, &doc.original_filename);

        let outcome = flow(OutputPolicyKind::Passthrough)
            .run(&doc, &mut ctx, "株式会社テスト", ApprovalMode::Paper)
            .await
            .unwrap();

        let artifact = outcome.artifact.unwrap();
        assert_eq!(artifact.file_name, "誓約書_株式会社テスト.pdf");
        assert_eq!(artifact.bytes, b"%PDF-1.7");
        assert_eq!(outcome.findings.len(), 1);
        assert!(outcome.findings[0].message.contains("PDF形式"));
        assert_eq!(ctx.state(), DocumentState::ArtifactReady);
    }

    #[tokio::test]
    async fn test_unsupported_extension_is_error() {
        let doc = UploadedDocument::new(DocumentKind::Contract, b"x".to_vec(), "契約書.doc");
        let mut ctx = DocumentCtx::new(1, doc.kind, &doc.original_filename);

        let err = flow(OutputPolicyKind::Passthrough)
            .run(&doc, &mut ctx, "株式会社テスト", ApprovalMode::Paper)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Extraction(ExtractionError::UnsupportedFormat { .. })
        ));
        assert_eq!(
            processing_error(&ctx, &err).message,
            "【契約書】処理エラー: 抽出エラー: 未対応のファイル形式です (.doc)"
        );
    }

    #[tokio::test]
    async fn test_word_document_yields_findings_and_entity() {
        let text = "本契約の成立を証するため\n乙：株式会社テスト\n別紙2\n旧ホテル一覧\n";
        let doc = UploadedDocument::new(DocumentKind::Contract, text.as_bytes().to_vec(), "c.docx");
        let mut ctx = DocumentCtx::new(1, doc.kind, &doc.original_filename);

        let outcome = flow(OutputPolicyKind::Passthrough)
            .run(&doc, &mut ctx, "株式会社テスト", ApprovalMode::Paper)
            .await
            .unwrap();

        assert_eq!(outcome.artifact.unwrap().file_name, "基本契約書_株式会社テスト.docx");
        assert_eq!(outcome.findings.len(), 1);
        assert!(outcome.findings[0].message.starts_with("【別紙2確認】"));
        assert_eq!(
            outcome.entity.unwrap().company.as_deref(),
            Some("株式会社テスト")
        );
    }

    #[tokio::test]
    async fn test_validate_only_keeps_findings_without_artifact() {
        let doc = UploadedDocument::new(DocumentKind::Checklist, "項目".as_bytes().to_vec(), "cs.xlsx");
        let mut ctx = DocumentCtx::new(1, doc.kind, &doc.original_filename);

        let outcome = flow(OutputPolicyKind::ValidateOnly)
            .run(&doc, &mut ctx, "株式会社テスト", ApprovalMode::Paper)
            .await
            .unwrap();

        assert!(outcome.artifact.is_none());
        assert_eq!(outcome.findings.len(), 1);
        assert!(outcome.entity.is_none());
    }

    #[tokio::test]
    async fn test_sanitize_failure_keeps_validation_findings() {
        // zip ではないので注釈除去に失敗する
        let doc = UploadedDocument::new(DocumentKind::Oath, "第20回アジア競技大会".as_bytes().to_vec(), "o.docx");
        let mut ctx = DocumentCtx::new(1, doc.kind, &doc.original_filename);

        let outcome = flow(OutputPolicyKind::Sanitize)
            .run(&doc, &mut ctx, "株式会社テスト", ApprovalMode::Paper)
            .await
            .unwrap();

        assert!(outcome.artifact.is_none());
        assert_eq!(outcome.findings.len(), 2);
        assert!(outcome.findings[0].message.starts_with("【誓約書エラー】"));
        assert!(outcome.findings[1].message.starts_with("【誓約書】処理エラー"));
        assert_eq!(ctx.state(), DocumentState::ExtractionFailed);
    }
}
