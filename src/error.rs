use thiserror::Error;

/// アプリケーションエラー型
#[derive(Debug, Error)]
pub enum AppError {
    /// 入力前提条件エラー（バッチ開始前に検出）
    #[error("入力エラー: {0}")]
    Precondition(#[from] PreconditionError),
    /// テキスト抽出エラー
    #[error("抽出エラー: {0}")]
    Extraction(#[from] ExtractionError),
    /// アーカイブ作成エラー
    #[error("アーカイブエラー: {0}")]
    Archive(#[from] ArchiveError),
    /// 固定ページ変換エラー
    #[error("PDF変換エラー: {0}")]
    Render(#[from] RenderError),
    /// 設定エラー
    #[error("設定エラー: {0}")]
    Config(#[from] ConfigError),
    /// ファイル操作エラー
    #[error("ファイルエラー: {0}")]
    File(#[from] FileError),
}

/// 入力前提条件エラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("会社名を入力してください。")]
    EmptyCompanyName,
    #[error("少なくとも1つのファイルをアップロードしてください。")]
    NoDocuments,
    #[error("{label} が複数指定されています。")]
    DuplicateKind { label: String },
}

/// テキスト抽出エラー
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// コンテナ（zip）として読み込めない
    #[error("ファイルを開けません: {source}")]
    UnreadableContainer {
        #[source]
        source: zip::result::ZipError,
    },
    /// 必須パーツが存在しない
    #[error("必須パーツ {part} が見つかりません")]
    MissingPart { part: String },
    /// XML 解析失敗
    #[error("{part} の解析に失敗しました: {message}")]
    MalformedXml { part: String, message: String },
    /// 展開後のサイズが上限を超える
    #[error("{part} が大きすぎます（上限 {limit} バイト）")]
    PartTooLarge { part: String, limit: u64 },
    /// 未対応のファイル形式
    #[error("未対応のファイル形式です ({extension})")]
    UnsupportedFormat { extension: String },
}

/// アーカイブ作成エラー
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("エントリ {path} の書き込みに失敗しました: {message}")]
    EntryWriteFailed { path: String, message: String },
    #[error("ZIPの確定に失敗しました: {source}")]
    FinishFailed {
        #[source]
        source: zip::result::ZipError,
    },
    #[error("成果物がないためアーカイブを作成できません")]
    NothingToPack,
}

/// 固定ページ変換エラー
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("ブラウザの起動に失敗しました: {0}")]
    LaunchFailed(String),
    #[error("ブラウザ (ポート {port}) に接続できません: {message}")]
    ConnectionFailed { port: u16, message: String },
    #[error("CDP 呼び出しに失敗しました: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
}

/// 設定エラー
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} の値 '{value}' は不正です（期待値: {expected}）")]
    InvalidValue {
        key: String,
        value: String,
        expected: String,
    },
    #[error("正規表現 '{pattern}' が不正です: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("ルール定義 {path} の解析に失敗しました: {source}")]
    CatalogParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// ファイル操作エラー
#[derive(Debug, Error)]
pub enum FileError {
    #[error("読み込みに失敗しました ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("書き込みに失敗しました ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ========== 便利コンストラクタ ==========

impl AppError {
    /// 不正な設定値エラーを作成
    pub fn invalid_value(
        key: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        AppError::Config(ConfigError::InvalidValue {
            key: key.into(),
            value: value.into(),
            expected: expected.into(),
        })
    }

    /// XML 解析エラーを作成
    pub fn malformed_xml(part: impl Into<String>, err: impl std::fmt::Display) -> Self {
        AppError::Extraction(ExtractionError::MalformedXml {
            part: part.into(),
            message: err.to_string(),
        })
    }

    /// ファイル読み込みエラーを作成
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// ファイル書き込みエラーを作成
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// バッチ全体を中断すべきエラーか
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Precondition(_) | AppError::Archive(_))
    }
}

impl From<zip::result::ZipError> for ExtractionError {
    fn from(source: zip::result::ZipError) -> Self {
        ExtractionError::UnreadableContainer { source }
    }
}

impl From<zip::result::ZipError> for AppError {
    fn from(err: zip::result::ZipError) -> Self {
        AppError::Extraction(err.into())
    }
}

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Render(RenderError::Cdp(err))
    }
}

// ========== Result 型エイリアス ==========

/// アプリケーション結果型
pub type AppResult<T> = Result<T, AppError>;
