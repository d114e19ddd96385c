use std::path::Path;

use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::{AppResult, RenderError};

/// PDF 変換用のヘッドレスブラウザを起動する
///
/// `executable` が None の場合は chromiumoxide に実行ファイルを探させる。
pub async fn launch_headless_browser(executable: Option<&Path>) -> AppResult<Browser> {
    info!("🚀 PDF変換用のヘッドレスブラウザを起動します...");

    let mut builder = BrowserConfig::builder().new_headless_mode().args(vec![
        "--disable-gpu",
        "--no-sandbox",
        "--disable-dev-shm-usage",
        "--font-render-hinting=none",
    ]);
    if let Some(path) = executable {
        debug!("ブラウザ実行ファイル: {}", path.display());
        builder = builder.chrome_executable(path);
    }

    let config = builder.build().map_err(|e| {
        error!("ヘッドレスブラウザの設定に失敗: {}", e);
        RenderError::LaunchFailed(e)
    })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("ヘッドレスブラウザの起動に失敗: {}", e);
        RenderError::LaunchFailed(e.to_string())
    })?;

    // バックグラウンドでブラウザイベントを処理
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // ブラウザ状態の同期待ち
    sleep(tokio::time::Duration::from_millis(300)).await;

    info!("✅ ヘッドレスブラウザ起動完了");
    Ok(browser)
}
