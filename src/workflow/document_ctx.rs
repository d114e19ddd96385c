//! 書類処理コンテキスト
//!
//! 「いまどの書類を、どの段階まで処理しているか」をまとめる

use std::fmt::Display;
use tracing::debug;

use crate::models::DocumentKind;

/// 書類 1 件の処理段階
///
/// `Pending → Extracting → Validating → {ArtifactReady | ExtractionFailed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    Pending,
    Extracting,
    Validating,
    /// 処理を終えた（成果物の有無は出力方針による）
    ArtifactReady,
    /// 抽出または処理中に失敗した
    ExtractionFailed,
}

impl DocumentState {
    pub fn is_terminal(self) -> bool {
        matches!(self, DocumentState::ArtifactReady | DocumentState::ExtractionFailed)
    }
}

/// 書類処理コンテキスト
#[derive(Debug, Clone)]
pub struct DocumentCtx {
    /// バッチ内の順番（1 始まり、ログ表示用）
    pub index: usize,

    pub kind: DocumentKind,

    pub original_filename: String,

    state: DocumentState,
}

impl DocumentCtx {
    pub fn new(index: usize, kind: DocumentKind, original_filename: impl Into<String>) -> Self {
        Self {
            index,
            kind,
            original_filename: original_filename.into(),
            state: DocumentState::Pending,
        }
    }

    pub fn state(&self) -> DocumentState {
        self.state
    }

    /// 状態を進める
    ///
    /// 終端状態からは動かない。
    pub fn transition(&mut self, next: DocumentState) {
        if self.state.is_terminal() {
            debug!("{} 終端状態 {:?} のため {:?} への遷移を無視", self, self.state, next);
            return;
        }
        debug!("{} {:?} → {:?}", self, self.state, next);
        self.state = next;
    }
}

impl Display for DocumentCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[書類 #{} {}]", self.index, self.kind.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let ctx = DocumentCtx::new(2, DocumentKind::Estimate, "見積.xlsx");
        assert_eq!(ctx.to_string(), "[書類 #2 見積書]");
    }

    #[test]
    fn test_terminal_state_is_sticky() {
        let mut ctx = DocumentCtx::new(1, DocumentKind::Contract, "c.docx");
        assert_eq!(ctx.state(), DocumentState::Pending);

        ctx.transition(DocumentState::Extracting);
        ctx.transition(DocumentState::ExtractionFailed);
        ctx.transition(DocumentState::Validating);

        assert_eq!(ctx.state(), DocumentState::ExtractionFailed);
    }
}
