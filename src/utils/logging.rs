/// ログ用ユーティリティ
///
/// ログの初期化と、定型の出力をまとめた補助関数
use std::fs;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::BatchResult;
use crate::workflow::DocumentCtx;

/// tracing を初期化する
///
/// `RUST_LOG` があればそれを優先する。二重初期化は無視する。
pub fn init(verbose: bool) {
    let default_filter = if verbose {
        "contract_batch=debug"
    } else {
        "contract_batch=info"
    };

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();
}

/// 監査ログファイルを作り直し、見出しを書く
///
/// # 引数
/// - `log_file_path`: ログファイルのパス
pub fn init_log_file(log_file_path: &Path) -> AppResult<()> {
    let log_header = format!(
        "{}\n契約書類チェックログ - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .map_err(|e| AppError::file_write_failed(log_file_path.display().to_string(), e))?;
    Ok(())
}

/// 起動情報を記録
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 契約書類一括チェック 起動");
    info!("📄 出力方針: {}", config.output_policy);
    info!("📁 出力先: {}", config.output_dir.display());
    if let Some(path) = &config.rule_catalog_path {
        info!("📋 ルール定義: {}", path.display());
    }
    info!("{}", "=".repeat(60));
}

/// 受け付けた書類数を記録
///
/// # 引数
/// - `total`: 書類数
/// - `company`: 会社名
pub fn log_documents_loaded(total: usize, company: &str) {
    info!("✓ {} 件の書類を受け付けました（{}）", total, company);
}

/// 書類 1 件の処理開始を記録
pub fn log_document_start(ctx: &DocumentCtx) {
    info!("\n{}", "─".repeat(60));
    info!("{} 📄 処理開始: {}", ctx, ctx.original_filename);
}

/// 最終集計を表示
///
/// # 引数
/// - `result`: バッチ結果
/// - `archive_name`: 作成したアーカイブ名（なければ None）
/// - `log_file_path`: 監査ログのパス
pub fn print_final_stats(result: &BatchResult, archive_name: Option<&str>, log_file_path: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📊 処理完了");
    info!(
        "完了時刻: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成果物: {} 件", result.produced.len());
    info!("❌ エラー: {} 件", result.errors.len());
    info!("⚠️ 警告: {} 件", result.warnings.len());
    match archive_name {
        Some(name) => info!("📦 アーカイブ: {}", name),
        None => info!("📦 アーカイブ: 作成なし"),
    }
    info!("{}", "=".repeat(60));
    info!("\nログ保存先: {}", log_file_path.display());
}

/// ログ表示用に長い文字列を切り詰める
///
/// # 引数
/// - `text`: 元の文字列
/// - `max_len`: 最大文字数
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
