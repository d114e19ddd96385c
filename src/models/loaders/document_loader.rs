use crate::error::{AppError, AppResult};
use crate::models::document::{DocumentKind, UploadedDocument};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// `<kind>=<path>` 形式の入力指定を解釈する（例: `oath=./誓約書.docx`）
pub fn parse_document_arg(arg: &str) -> AppResult<(DocumentKind, PathBuf)> {
    let (key, path) = arg
        .split_once('=')
        .ok_or_else(|| AppError::invalid_value("doc", arg, "<kind>=<path>"))?;
    if path.trim().is_empty() {
        return Err(AppError::invalid_value("doc", arg, "<kind>=<path>"));
    }
    Ok((key.parse()?, PathBuf::from(path)))
}

/// ファイルを読み込み UploadedDocument に変換する
pub async fn load_uploaded_document(kind: DocumentKind, path: &Path) -> Result<UploadedDocument> {
    let content = fs::read(path)
        .await
        .with_context(|| format!("ファイルを読み込めません: {}", path.display()))?;

    let original_filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .with_context(|| format!("ファイル名を取得できません: {}", path.display()))?;

    tracing::info!(
        "読み込み: {} ← {} ({} bytes)",
        kind.tag(),
        original_filename,
        content.len()
    );

    Ok(UploadedDocument::new(kind, content, original_filename))
}

/// 指定された (種別, パス) をすべて読み込む
///
/// 読み込みに失敗したファイルがあれば即座にエラーを返す。
pub async fn load_uploaded_documents(
    inputs: &[(DocumentKind, PathBuf)],
) -> Result<Vec<UploadedDocument>> {
    let mut documents = Vec::with_capacity(inputs.len());
    for (kind, path) in inputs {
        documents.push(load_uploaded_document(*kind, path).await?);
    }
    Ok(documents)
}
