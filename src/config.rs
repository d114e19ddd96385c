use std::path::PathBuf;

use crate::services::OutputPolicyKind;

/// プログラム設定
#[derive(Clone, Debug)]
pub struct Config {
    /// アーカイブの出力先ディレクトリ
    pub output_dir: PathBuf,
    /// Word / Excel の成果物の出し方
    pub output_policy: OutputPolicyKind,
    /// ルール定義の上書きファイル（TOML）
    pub rule_catalog_path: Option<PathBuf>,
    /// 詳細ログを表示するか
    pub verbose_logging: bool,
    /// 監査ログファイル
    pub output_log_file: PathBuf,
    // --- PDF 変換用ブラウザ ---
    /// Chromium の実行ファイル（未指定なら自動検出）
    pub browser_executable: Option<PathBuf>,
    /// 起動済みブラウザのデバッグポート（指定時は起動せずに接続）
    pub browser_debug_port: Option<u16>,
    // --- 追加チェック ---
    pub cross_check_entities: bool,
    pub warn_missing_kinds: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            output_policy: OutputPolicyKind::Passthrough,
            rule_catalog_path: None,
            verbose_logging: false,
            output_log_file: PathBuf::from("output.txt"),
            browser_executable: None,
            browser_debug_port: None,
            cross_check_entities: true,
            warn_missing_kinds: false,
        }
    }
}

impl Config {
    /// 環境変数で既定値を上書きする（解釈できない値は既定値のまま）
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            output_dir: std::env::var("OUTPUT_DIR").map(PathBuf::from).unwrap_or(default.output_dir),
            output_policy: std::env::var("OUTPUT_POLICY").ok().and_then(|v| v.parse().ok()).unwrap_or(default.output_policy),
            rule_catalog_path: std::env::var("RULE_CATALOG_PATH").ok().map(PathBuf::from).or(default.rule_catalog_path),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").map(PathBuf::from).unwrap_or(default.output_log_file),
            browser_executable: std::env::var("BROWSER_EXECUTABLE").ok().map(PathBuf::from).or(default.browser_executable),
            browser_debug_port: std::env::var("BROWSER_DEBUG_PORT").ok().and_then(|v| v.parse().ok()).or(default.browser_debug_port),
            cross_check_entities: std::env::var("CROSS_CHECK_ENTITIES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.cross_check_entities),
            warn_missing_kinds: std::env::var("WARN_MISSING_KINDS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.warn_missing_kinds),
        }
    }

    /// 固定ページ変換にブラウザが要るか
    pub fn needs_browser(&self) -> bool {
        self.output_policy == OutputPolicyKind::FixedPage
    }
}
