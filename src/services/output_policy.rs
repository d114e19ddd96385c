//! 出力方針
//!
//! Word / Excel の書類について、検証後に何を成果物として出すかを切り替える。
//! 検証エンジンとオーケストレーターはどの方針が選ばれているかを知らない。

use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::infrastructure::{sanitize_docx, DocxEdits, PageRenderer, SanitizedDocx, TextReplacement};
use crate::models::{ApprovalMode, Artifact, ContainerFormat, DocumentKind, Finding, RuleCatalog};
use crate::services::validator::compile;

/// 件名修正の通知に載せる置換前テキストの文字数
const TITLE_PREVIEW_CHARS: usize = 30;

/// 出力方針の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputPolicyKind {
    /// 元ファイルをそのまま出力
    #[default]
    Passthrough,
    /// 注釈・強調書式・コメントを除去し、種別ごとの段落編集をして出力（Word のみ、Excel はそのまま）
    Sanitize,
    /// A4 の PDF に変換して出力
    FixedPage,
    /// 検証のみ（成果物なし）
    ValidateOnly,
}

impl OutputPolicyKind {
    pub fn key(self) -> &'static str {
        match self {
            OutputPolicyKind::Passthrough => "passthrough",
            OutputPolicyKind::Sanitize => "sanitize",
            OutputPolicyKind::FixedPage => "fixed-page",
            OutputPolicyKind::ValidateOnly => "validate-only",
        }
    }
}

impl FromStr for OutputPolicyKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "passthrough" => Ok(OutputPolicyKind::Passthrough),
            "sanitize" => Ok(OutputPolicyKind::Sanitize),
            "fixed-page" | "pdf" => Ok(OutputPolicyKind::FixedPage),
            "validate-only" => Ok(OutputPolicyKind::ValidateOnly),
            other => Err(AppError::invalid_value(
                "output_policy",
                other,
                "passthrough|sanitize|fixed-page|validate-only",
            )),
        }
    }
}

impl fmt::Display for OutputPolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Sanitize 方針の段落編集ルール
///
/// - 電子決裁の契約書: 署名捺印条項の段落を空にする
/// - 誓約書: 旧件名を正式名称に置き換える
#[derive(Debug, Clone)]
pub struct SanitizeRules {
    seal_clause: String,
    oath_title: Option<TextReplacement>,
}

impl SanitizeRules {
    /// 旧件名パターンをコンパイルして作成
    pub fn new(catalog: &RuleCatalog) -> AppResult<Self> {
        let patterns = catalog
            .oath_title_patterns
            .iter()
            .map(|p| compile(p))
            .collect::<AppResult<Vec<_>>>()?;

        let oath_title = if patterns.is_empty() {
            None
        } else {
            Some(TextReplacement {
                patterns,
                replacement: catalog.oath_correct_title.clone(),
            })
        };

        Ok(Self {
            seal_clause: catalog.seal_clause.clone(),
            oath_title,
        })
    }

    pub fn edits_for(&self, kind: DocumentKind, approval_mode: ApprovalMode) -> DocxEdits {
        match kind {
            DocumentKind::Contract if approval_mode == ApprovalMode::Electronic => DocxEdits {
                clear_paragraphs_containing: Some(self.seal_clause.clone()),
                ..DocxEdits::default()
            },
            DocumentKind::Oath => DocxEdits {
                replace_first: self.oath_title.clone(),
                ..DocxEdits::default()
            },
            _ => DocxEdits::default(),
        }
    }
}

/// 抽出・検証を終えた書類
pub struct ExtractedPayload<'a> {
    pub kind: DocumentKind,
    pub format: ContainerFormat,
    pub original: &'a [u8],
    pub text: &'a str,
    /// 会社名を埋め込んだ出力ファイル名（拡張子なし）
    pub output_stem: &'a str,
    /// Sanitize 方針で適用する段落編集
    pub edits: DocxEdits,
}

impl ExtractedPayload<'_> {
    fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.output_stem, extension)
    }

    fn original_artifact(&self) -> Artifact {
        Artifact {
            file_name: self.file_name(self.format.extension()),
            bytes: self.original.to_vec(),
        }
    }
}

/// 方針適用の結果
#[derive(Debug, Default)]
pub struct PolicyOutcome {
    pub artifact: Option<Artifact>,
    /// 方針適用中に生じた指摘（変換失敗時のフォールバックなど）
    pub notes: Vec<Finding>,
}

impl PolicyOutcome {
    fn produced(artifact: Artifact) -> Self {
        Self {
            artifact: Some(artifact),
            notes: Vec::new(),
        }
    }
}

impl OutputPolicyKind {
    /// 成果物を決める
    pub async fn produce<R: PageRenderer>(
        &self,
        payload: &ExtractedPayload<'_>,
        renderer: &R,
    ) -> AppResult<PolicyOutcome> {
        match self {
            OutputPolicyKind::Passthrough => Ok(PolicyOutcome::produced(payload.original_artifact())),
            OutputPolicyKind::Sanitize => match payload.format {
                ContainerFormat::WordDocument => {
                    let sanitized = sanitize_docx(payload.original, &payload.edits)?;
                    let notes = sanitize_notes(payload.kind, &sanitized);
                    Ok(PolicyOutcome {
                        artifact: Some(Artifact {
                            file_name: payload.file_name(payload.format.extension()),
                            bytes: sanitized.bytes,
                        }),
                        notes,
                    })
                }
                _ => Ok(PolicyOutcome::produced(payload.original_artifact())),
            },
            OutputPolicyKind::FixedPage => {
                let html = fixed_page_html(payload.output_stem, payload.text);
                match renderer.render_to_fixed_page(&html).await {
                    Ok(pdf) => {
                        info!("✓ PDF変換完了: {}", payload.file_name("pdf"));
                        Ok(PolicyOutcome::produced(Artifact {
                            file_name: payload.file_name("pdf"),
                            bytes: pdf,
                        }))
                    }
                    Err(e) => {
                        warn!("PDF変換に失敗、元ファイルを同梱します: {}", e);
                        let artifact = payload.original_artifact();
                        let note = Finding::warning(format!(
                            "【{}】{} のPDF変換に失敗しました: {}。元ファイルを同梱します。",
                            payload.kind.tag(),
                            artifact.file_name,
                            e
                        ));
                        Ok(PolicyOutcome {
                            artifact: Some(artifact),
                            notes: vec![note],
                        })
                    }
                }
            }
            OutputPolicyKind::ValidateOnly => Ok(PolicyOutcome::default()),
        }
    }
}

/// 整形内容のうち確認が必要なものを指摘にする
fn sanitize_notes(kind: DocumentKind, sanitized: &SanitizedDocx) -> Vec<Finding> {
    if sanitized.cleared_paragraphs > 0 {
        info!("署名捺印条項の段落を {} 件削除", sanitized.cleared_paragraphs);
    }
    if !sanitized.removed_parts.is_empty() {
        info!("コメントパーツを削除: {}", sanitized.removed_parts.join(", "));
    }

    match &sanitized.replaced_paragraph {
        Some(old) => {
            let preview: String = old.chars().take(TITLE_PREVIEW_CHARS).collect();
            vec![Finding::warning(format!(
                "【{}】件名を修正しました: 「{}...」→ 正式名称",
                kind.tag(),
                preview
            ))]
        }
        None => Vec::new(),
    }
}

/// 抽出テキストを A4 1 段組の HTML にする
pub fn fixed_page_html(title: &str, text: &str) -> String {
    let mut body = String::new();
    for line in text.split('\n') {
        if line.trim().is_empty() {
            body.push_str("<p>&nbsp;</p>\n");
        } else {
            body.push_str("<p>");
            body.push_str(&escape_html(line));
            body.push_str("</p>\n");
        }
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="ja">
<head>
<meta charset="utf-8">
<title>{}</title>
<style>
@page {{ size: A4; }}
body {{ font-family: "Noto Sans CJK JP", "Noto Sans JP", "Yu Gothic", sans-serif; font-size: 10.5pt; line-height: 1.6; color: #000; }}
p {{ margin: 0; white-space: pre-wrap; }}
</style>
</head>
<body>
{}</body>
</html>
"#,
        escape_html(title),
        body
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
