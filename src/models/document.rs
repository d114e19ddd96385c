use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, ExtractionError};

/// 書類種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// 契約書（基本契約書）
    Contract,
    /// 見積書（別紙１）
    Estimate,
    /// 誓約書
    Oath,
    /// チェックシート
    Checklist,
    /// 確認書
    Confirmation,
}

/// kind キー → DocumentKind
static KIND_KEYS: phf::Map<&'static str, DocumentKind> = phf::phf_map! {
    "contract" => DocumentKind::Contract,
    "estimate" => DocumentKind::Estimate,
    "oath" => DocumentKind::Oath,
    "checklist" => DocumentKind::Checklist,
    "confirmation" => DocumentKind::Confirmation,
};

impl DocumentKind {
    /// 処理順
    pub const ALL: [DocumentKind; 5] = [
        DocumentKind::Contract,
        DocumentKind::Estimate,
        DocumentKind::Oath,
        DocumentKind::Checklist,
        DocumentKind::Confirmation,
    ];

    /// 設定ファイル・CLI で使うキー
    pub fn key(self) -> &'static str {
        match self {
            DocumentKind::Contract => "contract",
            DocumentKind::Estimate => "estimate",
            DocumentKind::Oath => "oath",
            DocumentKind::Checklist => "checklist",
            DocumentKind::Confirmation => "confirmation",
        }
    }

    /// 指摘メッセージの【】内に入る短い名称
    pub fn tag(self) -> &'static str {
        match self {
            DocumentKind::Contract => "契約書",
            DocumentKind::Estimate => "見積書",
            DocumentKind::Oath => "誓約書",
            DocumentKind::Checklist => "チェックシート",
            DocumentKind::Confirmation => "確認書",
        }
    }

    /// 想定されるコンテナ形式
    pub fn expected_format(self) -> ContainerFormat {
        match self {
            DocumentKind::Estimate | DocumentKind::Checklist => ContainerFormat::Spreadsheet,
            _ => ContainerFormat::WordDocument,
        }
    }

    /// キーから種別を解決
    pub fn from_key(key: &str) -> Option<Self> {
        KIND_KEYS.get(key.trim().to_lowercase().as_str()).copied()
    }
}

impl FromStr for DocumentKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| {
            let keys: Vec<&str> = Self::ALL.iter().map(|k| k.key()).collect();
            AppError::invalid_value("document_kind", s, keys.join("|"))
        })
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// コンテナ形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerFormat {
    /// Word 文書 (.docx)
    WordDocument,
    /// Excel ブック (.xlsx)
    Spreadsheet,
    /// 変換済み PDF
    Pdf,
}

impl ContainerFormat {
    /// 元ファイル名の拡張子から判定する
    pub fn detect(file_name: &str) -> Result<Self, ExtractionError> {
        let extension = std::path::Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "docx" => Ok(ContainerFormat::WordDocument),
            "xlsx" => Ok(ContainerFormat::Spreadsheet),
            "pdf" => Ok(ContainerFormat::Pdf),
            _ => Err(ExtractionError::UnsupportedFormat {
                extension: if extension.is_empty() {
                    "拡張子なし".to_string()
                } else {
                    format!(".{}", extension)
                },
            }),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ContainerFormat::WordDocument => "docx",
            ContainerFormat::Spreadsheet => "xlsx",
            ContainerFormat::Pdf => "pdf",
        }
    }
}

/// 決裁種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalMode {
    /// 紙決裁（署名捺印条項が必要）
    #[default]
    Paper,
    /// 電子決裁
    Electronic,
}

impl FromStr for ApprovalMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "paper" | "紙" => Ok(ApprovalMode::Paper),
            "electronic" | "電子" => Ok(ApprovalMode::Electronic),
            other => Err(AppError::invalid_value(
                "approval_mode",
                other,
                "paper|electronic",
            )),
        }
    }
}

/// アップロードされた書類
///
/// 呼び出し側が作成し、オーケストレーターに渡した後は変更しない。
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub kind: DocumentKind,
    pub content: Vec<u8>,
    pub original_filename: String,
}

impl UploadedDocument {
    pub fn new(kind: DocumentKind, content: Vec<u8>, original_filename: impl Into<String>) -> Self {
        Self {
            kind,
            content,
            original_filename: original_filename.into(),
        }
    }

    /// 元ファイル名から判定したコンテナ形式
    pub fn format(&self) -> Result<ContainerFormat, ExtractionError> {
        ContainerFormat::detect(&self.original_filename)
    }
}
