use crate::error::{AppError, AppResult, ConfigError};
use crate::models::catalog::RuleCatalog;
use std::path::Path;
use tokio::fs;

/// TOML 文字列からルール定義を読み込む
///
/// 省略したテーブル・キーは組み込み値のまま残る。
pub fn parse_catalog(content: &str, origin: &str) -> AppResult<RuleCatalog> {
    toml::from_str(content).map_err(|source| {
        AppError::Config(ConfigError::CatalogParse {
            path: origin.to_string(),
            source,
        })
    })
}

/// ルール定義ファイルを読み込む
///
/// パスが指定されていなければ組み込みのルールを返す。
pub async fn load_catalog(path: Option<&Path>) -> AppResult<RuleCatalog> {
    let Some(path) = path else {
        tracing::debug!("ルール定義ファイル未指定、組み込みルールを使用");
        return Ok(RuleCatalog::builtin());
    };

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

    let catalog = parse_catalog(&content, &path.display().to_string())?;
    tracing::info!("ルール定義を読み込みました: {}", path.display());
    Ok(catalog)
}
