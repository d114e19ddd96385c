use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{AppResult, ArchiveError};

/// アーカイブ内の 1 エントリ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// `成果物/xxx.docx` のようなグループ付きパス
    pub path: String,
    pub bytes: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(path: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            bytes,
        }
    }
}

/// アーカイブ作成能力
pub trait ArchivePacker {
    /// 与えられた順序のままエントリを格納する
    fn pack(&self, entries: &[ArchiveEntry]) -> AppResult<Vec<u8>>;
}

/// ZIP (Deflate) で固める
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchivePacker;

impl ZipArchivePacker {
    pub fn new() -> Self {
        Self
    }
}

impl ArchivePacker for ZipArchivePacker {
    fn pack(&self, entries: &[ArchiveEntry]) -> AppResult<Vec<u8>> {
        if entries.is_empty() {
            return Err(ArchiveError::NothingToPack.into());
        }

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        for entry in entries {
            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            writer
                .start_file(entry.path.as_str(), options)
                .map_err(|e| ArchiveError::EntryWriteFailed {
                    path: entry.path.clone(),
                    message: e.to_string(),
                })?;
            writer
                .write_all(&entry.bytes)
                .map_err(|e| ArchiveError::EntryWriteFailed {
                    path: entry.path.clone(),
                    message: e.to_string(),
                })?;
            debug!("格納: {} ({} bytes)", entry.path, entry.bytes.len());
        }

        let cursor = writer
            .finish()
            .map_err(|source| ArchiveError::FinishFailed { source })?;
        Ok(cursor.into_inner())
    }
}
