//! 固定ページ変換 - 基盤層
//!
//! HTML を A4 の PDF に印刷する能力。ブラウザは最初の変換時に一度だけ用意する。

use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::{Browser, Page};
use std::future::Future;
use std::path::PathBuf;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::browser;
use crate::error::{AppError, AppResult, RenderError};

/// 固定ページ変換能力
#[allow(async_fn_in_trait)]
pub trait PageRenderer {
    async fn render_to_fixed_page(&self, html: &str) -> AppResult<Vec<u8>>;
}

/// ブラウザの調達方法
#[derive(Debug, Clone)]
pub enum BrowserSource {
    /// ヘッドレスで新規起動
    Launch { executable: Option<PathBuf> },
    /// 起動済みブラウザのデバッグポートへ接続
    Connect { port: u16 },
}

/// chromiumoxide による PDF 印刷
pub struct ChromiumPageRenderer {
    source: BrowserSource,
    browser: OnceCell<Browser>,
}

impl ChromiumPageRenderer {
    pub fn new(source: BrowserSource) -> Self {
        Self {
            source,
            browser: OnceCell::new(),
        }
    }

    async fn browser(&self) -> AppResult<&Browser> {
        self.browser
            .get_or_try_init(|| async {
                match &self.source {
                    BrowserSource::Launch { executable } => {
                        browser::launch_headless_browser(executable.as_deref()).await
                    }
                    BrowserSource::Connect { port } => browser::connect_to_browser(*port).await,
                }
            })
            .await
    }
}

/// A4 縦・背景色あり
fn a4_params() -> PrintToPdfParams {
    PrintToPdfParams {
        print_background: Some(true),
        paper_width: Some(8.27),
        paper_height: Some(11.69),
        margin_top: Some(0.6),
        margin_bottom: Some(0.6),
        margin_left: Some(0.6),
        margin_right: Some(0.6),
        ..Default::default()
    }
}

async fn print_page(page: &Page, html: &str) -> AppResult<Vec<u8>> {
    page.set_content(html).await?;
    let pdf = page.pdf(a4_params()).await?;
    debug!("PDF生成: {} bytes", pdf.len());
    Ok(pdf)
}

/// 結果にかかわらず後始末を実行する。後始末の失敗は警告のみ。
async fn finish_with<T, C>(result: AppResult<T>, cleanup: C) -> AppResult<T>
where
    C: Future<Output = AppResult<()>>,
{
    if let Err(e) = cleanup.await {
        warn!("ページのクローズに失敗: {}", e);
    }
    result
}

impl PageRenderer for ChromiumPageRenderer {
    async fn render_to_fixed_page(&self, html: &str) -> AppResult<Vec<u8>> {
        let browser = self.browser().await?;
        let page = browser.new_page("about:blank").await?;

        let printed = print_page(&page, html).await;
        finish_with(printed, async move { page.close().await.map_err(AppError::from) }).await
    }
}

/// 固定ページ変換を使わない構成用
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledRenderer;

impl PageRenderer for DisabledRenderer {
    async fn render_to_fixed_page(&self, _html: &str) -> AppResult<Vec<u8>> {
        Err(RenderError::LaunchFailed("PDF変換は無効化されています".to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_renderer_always_fails() {
        let result = tokio_test::block_on(DisabledRenderer.render_to_fixed_page("<p>x</p>"));
        assert!(result.is_err());
    }

    #[test]
    fn test_cleanup_runs_when_printing_fails() {
        let closed = std::cell::Cell::new(false);
        let printed: AppResult<Vec<u8>> =
            Err(RenderError::LaunchFailed("set_content".to_string()).into());

        let result = tokio_test::block_on(finish_with(printed, async {
            closed.set(true);
            Ok(())
        }));

        assert!(closed.get());
        assert!(matches!(result, Err(AppError::Render(_))));
    }

    #[test]
    fn test_cleanup_failure_keeps_printed_pdf() {
        let result = tokio_test::block_on(finish_with(Ok(b"%PDF".to_vec()), async {
            Err(RenderError::LaunchFailed("close".to_string()).into())
        }));

        assert_eq!(result.unwrap(), b"%PDF");
    }

    #[test]
    fn test_a4_params() {
        let params = a4_params();
        assert_eq!(params.paper_width, Some(8.27));
        assert_eq!(params.print_background, Some(true));
    }
}
