//! 検証エンジン - 業務能力層
//!
//! 抽出済みテキスト・書類種別・決裁種別・会社名から指摘一覧を作る。
//! 入出力を持たない純粋な処理で、同じ入力には常に同じ順序の結果を返す。

use regex::Regex;
use std::sync::Arc;
use tracing::debug;

use crate::error::{AppError, AppResult, ConfigError};
use crate::models::{ApprovalMode, DocumentKind, Finding, RuleCatalog};
use crate::services::appendix_check::{check_appendix_version, contains_any};

/// 会社名チェックを行う最小文字数（これより長い場合のみ）
const MIN_COMPANY_NAME_CHARS: usize = 2;

/// 検証エンジン
pub struct Validator {
    catalog: Arc<RuleCatalog>,
    date_entry: Regex,
}

impl Validator {
    /// ルール定義の正規表現をコンパイルして作成
    pub fn new(catalog: Arc<RuleCatalog>) -> AppResult<Self> {
        let date_entry = compile(&catalog.date_entry_pattern)?;
        Ok(Self {
            catalog,
            date_entry,
        })
    }

    /// 書類 1 件を検証する
    pub fn validate(
        &self,
        kind: DocumentKind,
        full_text: &str,
        approval_mode: ApprovalMode,
        company_name: &str,
    ) -> Vec<Finding> {
        let mut findings = Vec::new();

        match kind {
            DocumentKind::Contract => self.check_contract(full_text, approval_mode, &mut findings),
            DocumentKind::Oath => self.check_oath(full_text, &mut findings),
            DocumentKind::Estimate => self.check_estimate(full_text, company_name, &mut findings),
            DocumentKind::Checklist => self.check_checklist(full_text, &mut findings),
            DocumentKind::Confirmation => {
                // 確認書には検証ルールが定義されていない
                debug!("確認書: 検証ルールなし（抽出成功のみ確認）");
            }
        }

        findings
    }

    fn check_contract(&self, text: &str, mode: ApprovalMode, findings: &mut Vec<Finding>) {
        if mode == ApprovalMode::Paper {
            if self.date_entry.is_match(text) {
                findings.push(Finding::error(
                    "【契約書エラー】日付欄に具体的な月日が記入されている可能性があります。確認してください。",
                ));
            }
            if !text.contains(self.catalog.seal_clause.as_str()) {
                findings.push(Finding::error(format!(
                    "【契約書エラー】署名捺印条項「{}〜」が見つかりません。",
                    self.catalog.seal_clause
                )));
            }
        }

        if let Some(finding) = check_appendix_version(text, &self.catalog.appendix) {
            findings.push(finding);
        }

        if contains_any(text, &self.catalog.partner_keywords).is_some() {
            findings.push(Finding::warning(
                "【契約書注意】「カテゴリー及びパートナー」のセクションが含まれています。手動で削除してください。",
            ));
        }
    }

    fn check_oath(&self, text: &str, findings: &mut Vec<Finding>) {
        if let Some(title) = contains_any(text, &self.catalog.oath_obsolete_titles) {
            findings.push(Finding::error(format!(
                "【誓約書エラー】旧件名「{}」が含まれています。最新の件名に修正してください。",
                title
            )));
        }
    }

    fn check_estimate(&self, text: &str, company_name: &str, findings: &mut Vec<Finding>) {
        let company = company_name.trim();
        if company.chars().count() > MIN_COMPANY_NAME_CHARS && !text.contains(company) {
            findings.push(Finding::warning(
                "【見積書確認】会社名が見積書内で確認できませんでした。",
            ));
        }
    }

    fn check_checklist(&self, text: &str, findings: &mut Vec<Finding>) {
        if !text.contains(self.catalog.checklist_sentinel.as_str()) {
            findings.push(Finding::warning(
                "【チェックシート確認】チェック項目が見つかりませんでした。正しいファイルか確認してください。",
            ));
        }
    }
}

pub(crate) fn compile(pattern: &str) -> AppResult<Regex> {
    Regex::new(pattern).map_err(|source| {
        AppError::Config(ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
    })
}
