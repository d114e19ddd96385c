//! アプリケーション
//!
//! 設定とルール定義を一度だけ読み込み、提出ごとにバッチ処理器を組み立てて実行する。

use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{
    BrowserSource, ChromiumPageRenderer, DisabledRenderer, OoxmlTextExtractor, PageRenderer,
    ZipArchivePacker,
};
use crate::models::{load_catalog, ApprovalMode, RuleCatalog, UploadedDocument};
use crate::orchestrator::{BatchOptions, BatchOrchestrator};
use crate::services::{FindingWriter, Report};
use crate::utils::logging;

/// 提出 1 回分の入力
#[derive(Debug, Clone)]
pub struct Submission {
    pub company_name: String,
    pub approval_mode: ApprovalMode,
    pub documents: Vec<UploadedDocument>,
}

/// 実行結果
#[derive(Debug)]
pub struct RunSummary {
    pub report: Report,
    /// 書き出したアーカイブのパス
    pub archive_path: Option<PathBuf>,
}

/// アプリケーション本体
pub struct App {
    config: Config,
    catalog: Arc<RuleCatalog>,
}

impl App {
    /// 初期化
    pub async fn initialize(config: Config) -> AppResult<Self> {
        logging::init_log_file(&config.output_log_file)?;
        logging::log_startup(&config);

        let catalog = load_catalog(config.rule_catalog_path.as_deref()).await?;

        Ok(Self {
            config,
            catalog: Arc::new(catalog),
        })
    }

    /// 提出を処理し、アーカイブを出力先に書き出す
    pub async fn run(&self, submission: Submission) -> AppResult<RunSummary> {
        let options = BatchOptions {
            policy: self.config.output_policy,
            cross_check_entities: self.config.cross_check_entities,
            warn_missing_kinds: self.config.warn_missing_kinds,
            verbose_logging: self.config.verbose_logging,
        };

        let orchestrator = BatchOrchestrator::new(
            Arc::clone(&self.catalog),
            OoxmlTextExtractor::new(),
            ZipArchivePacker::new(),
            self.renderer(),
            options,
        )?
        .with_finding_writer(FindingWriter::with_path(self.config.output_log_file.clone()));

        let outcome = orchestrator
            .process_batch(
                &submission.documents,
                &submission.company_name,
                submission.approval_mode,
            )
            .await?;

        let archive_path = match &outcome.archive {
            Some(archive) => {
                tokio::fs::create_dir_all(&self.config.output_dir)
                    .await
                    .map_err(|e| {
                        AppError::file_write_failed(self.config.output_dir.display().to_string(), e)
                    })?;
                let path = self.config.output_dir.join(&archive.file_name);
                tokio::fs::write(&path, &archive.bytes)
                    .await
                    .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;
                info!("💾 保存: {}", path.display());
                Some(path)
            }
            None => None,
        };

        let archive_name = outcome.archive.as_ref().map(|a| a.file_name.as_str());
        logging::print_final_stats(&outcome.result, archive_name, &self.config.output_log_file);

        Ok(RunSummary {
            report: Report::new(&outcome.result, archive_name),
            archive_path,
        })
    }

    fn renderer(&self) -> ConfiguredRenderer {
        if !self.config.needs_browser() {
            return ConfiguredRenderer::Disabled(DisabledRenderer);
        }
        let source = match self.config.browser_debug_port {
            Some(port) => BrowserSource::Connect { port },
            None => BrowserSource::Launch {
                executable: self.config.browser_executable.clone(),
            },
        };
        ConfiguredRenderer::Chromium(ChromiumPageRenderer::new(source))
    }
}

/// 設定で選ばれた変換器
enum ConfiguredRenderer {
    Chromium(ChromiumPageRenderer),
    Disabled(DisabledRenderer),
}

impl PageRenderer for ConfiguredRenderer {
    async fn render_to_fixed_page(&self, html: &str) -> AppResult<Vec<u8>> {
        match self {
            ConfiguredRenderer::Chromium(renderer) => renderer.render_to_fixed_page(html).await,
            ConfiguredRenderer::Disabled(renderer) => renderer.render_to_fixed_page(html).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentKind;

    fn config_in(dir: &std::path::Path) -> Config {
        Config {
            output_dir: dir.join("out"),
            output_log_file: dir.join("output.txt"),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_pdf_only_submission_writes_archive() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::initialize(config_in(dir.path())).await.unwrap();

        let summary = app
            .run(Submission {
                company_name: "株式会社テスト".to_string(),
                approval_mode: ApprovalMode::Paper,
                documents: vec![UploadedDocument::new(
                    DocumentKind::Confirmation,
                    b"%PDF-1.7".to_vec(),
                    "確認書.pdf",
                )],
            })
            .await
            .unwrap();

        let path = summary.archive_path.unwrap();
        assert!(path.exists());
        assert_eq!(
            summary.report.produced,
            vec!["電子契約サービス利用確認書_株式会社テスト.pdf".to_string()]
        );

        let log = std::fs::read_to_string(dir.path().join("output.txt")).unwrap();
        assert!(log.contains("| WARN | 【確認書】PDF形式"));
    }

    #[tokio::test]
    async fn test_blank_company_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::initialize(config_in(dir.path())).await.unwrap();

        let err = app
            .run(Submission {
                company_name: " ".to_string(),
                approval_mode: ApprovalMode::Paper,
                documents: Vec::new(),
            })
            .await
            .unwrap_err();

        assert!(err.is_fatal());
        assert!(!dir.path().join("out").exists());
    }
}
