//! 指摘ログ書き込みサービス - 業務能力層
//!
//! 指摘 1 件を監査ログに追記する能力だけを持ち、処理の流れには関与しない。

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::models::Finding;

/// 指摘ログ書き込みサービス
///
/// 職責：
/// - 指摘を 1 行ずつ監査ログに追記する
/// - 書き込みの失敗はバッチの結果に影響させない
pub struct FindingWriter {
    log_file_path: PathBuf,
}

impl FindingWriter {
    /// 出力先を指定して作成
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            log_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.log_file_path
    }

    /// 指摘を追記する
    pub fn write(&self, finding: &Finding) -> AppResult<()> {
        debug!("指摘ログ追記: {} {}", finding.severity, finding.message);

        let path_display = self.log_file_path.display().to_string();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file_path)
            .map_err(|e| AppError::file_write_failed(path_display.clone(), e))?;

        let line = format!(
            "{} | {} | {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            finding.severity,
            finding.message
        );

        file.write_all(line.as_bytes())
            .map_err(|e| AppError::file_write_failed(path_display, e))?;

        Ok(())
    }

    /// 失敗してもログに残すだけで続行する
    pub fn write_quietly(&self, finding: &Finding) {
        if let Err(e) = self.write(finding) {
            warn!("⚠️ 指摘ログの書き込みに失敗: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let writer = FindingWriter::with_path(dir.path().join("audit.log"));

        writer.write(&Finding::error("【契約書エラー】A")).unwrap();
        writer.write(&Finding::warning("【別紙2確認】B")).unwrap();

        let content = std::fs::read_to_string(writer.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("| ERROR | 【契約書エラー】A"));
        assert!(lines[1].ends_with("| WARN | 【別紙2確認】B"));
    }

    #[test]
    fn test_write_quietly_survives_bad_path() {
        let writer = FindingWriter::with_path("/nonexistent-dir/audit.log");
        writer.write_quietly(&Finding::warning("x"));
        assert!(writer.write(&Finding::warning("x")).is_err());
    }
}
