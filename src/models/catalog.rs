//! ルール定義（書類種別ごとの命名規則と検証キーワード）
//!
//! 起動時に一度だけ読み込み、以降は `Arc<RuleCatalog>` で共有する読み取り専用データ。
//! 大会名などの組織固有の文言はここに集約し、ロジック側には埋め込まない。

use serde::Deserialize;

use crate::models::document::DocumentKind;

/// 書類種別ごとの表示名と出力ファイル名テンプレート
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KindRule {
    /// 画面・ログ用の表示名
    pub label: String,
    /// `{company}` を含む出力ファイル名（拡張子なし）
    pub naming: String,
}

impl KindRule {
    fn new(label: &str, naming: &str) -> Self {
        Self {
            label: label.to_string(),
            naming: naming.to_string(),
        }
    }
}

/// 種別ごとのルール表
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KindRules {
    pub contract: KindRule,
    pub estimate: KindRule,
    pub oath: KindRule,
    pub checklist: KindRule,
    pub confirmation: KindRule,
}

impl Default for KindRules {
    fn default() -> Self {
        Self {
            contract: KindRule::new("① 契約書", "基本契約書_{company}"),
            estimate: KindRule::new("② 見積書", "別紙１_{company}"),
            oath: KindRule::new("③ 誓約書", "誓約書_{company}"),
            checklist: KindRule::new(
                "④ チェックシート",
                "持続可能性の確保に向けた取組状況について（チェックシート）_{company}",
            ),
            confirmation: KindRule::new("⑤ 確認書", "電子契約サービス利用確認書_{company}"),
        }
    }
}

/// 別紙2 版数チェック用キーワード
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppendixKeywords {
    /// 別紙2 セクション開始（全角・半角数字）
    pub marker_keywords: Vec<String>,
    /// 最新様式に含まれる文言
    pub latest_keywords: Vec<String>,
    /// 旧様式を示す文言
    pub obsolete_keywords: Vec<String>,
    /// 別紙3 到達でセクション終了
    pub end_keywords: Vec<String>,
}

impl Default for AppendixKeywords {
    fn default() -> Self {
        Self {
            marker_keywords: strings(&["別紙2", "別紙２"]),
            latest_keywords: strings(&["愛知・名古屋2026", "2026アジア・アジアパラ競技大会"]),
            obsolete_keywords: strings(&["第20回アジア競技大会", "2026年アジア競技大会"]),
            end_keywords: strings(&["別紙3", "別紙３"]),
        }
    }
}

/// 書類間の法人情報突合に使う抽出パターン
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EntityPatterns {
    pub company: String,
    pub address: String,
    pub representative: String,
}

impl Default for EntityPatterns {
    fn default() -> Self {
        Self {
            company: r"乙\s*[：:]\s*(.+)".to_string(),
            address: r"(?:住所|所在地)\s*[：:]\s*(.+)".to_string(),
            representative: r"代表(?:取締役|者)\s*(.+)".to_string(),
        }
    }
}

/// ルール定義
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuleCatalog {
    pub kinds: KindRules,
    /// 紙決裁の契約書に必須の署名捺印条項
    pub seal_clause: String,
    /// 手動削除が必要な「カテゴリー及びパートナー」セクション
    pub partner_keywords: Vec<String>,
    pub appendix: AppendixKeywords,
    /// 誓約書の旧件名
    pub oath_obsolete_titles: Vec<String>,
    /// 整形時に正式名称へ置き換える旧件名（正規表現）
    pub oath_title_patterns: Vec<String>,
    pub oath_correct_title: String,
    /// チェックシートに必ず含まれる語
    pub checklist_sentinel: String,
    /// 紙決裁で日付欄に具体的な月日が入っていないかを見るパターン
    pub date_entry_pattern: String,
    pub entity: EntityPatterns,
    /// アーカイブ名の先頭
    pub archive_prefix: String,
    /// 成果物グループ
    pub deliverables_dir: String,
    /// バックアップグループ
    pub backup_dir: String,
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuleCatalog {
    /// 組み込みのルール定義
    pub fn builtin() -> Self {
        Self {
            kinds: KindRules::default(),
            seal_clause: "本契約の成立を証するため".to_string(),
            partner_keywords: strings(&["カテゴリー及びパートナー", "カテゴリー・パートナー"]),
            appendix: AppendixKeywords::default(),
            oath_obsolete_titles: strings(&["第20回アジア競技大会"]),
            oath_title_patterns: strings(&[
                r"第20回アジア競技大会.*?基本契約書",
                r"第\d+回アジア競技大会.*?基本契約書",
            ]),
            oath_correct_title:
                "愛知・名古屋2026大会における大会関係者の宿泊施設等の利用に関する基本契約書"
                    .to_string(),
            checklist_sentinel: "チェック".to_string(),
            date_entry_pattern: r"\d{1,2}\s*月\s*\d{1,2}\s*日".to_string(),
            entity: EntityPatterns::default(),
            archive_prefix: "契約書".to_string(),
            deliverables_dir: "成果物".to_string(),
            backup_dir: "バックアップ".to_string(),
        }
    }

    pub fn rule(&self, kind: DocumentKind) -> &KindRule {
        match kind {
            DocumentKind::Contract => &self.kinds.contract,
            DocumentKind::Estimate => &self.kinds.estimate,
            DocumentKind::Oath => &self.kinds.oath,
            DocumentKind::Checklist => &self.kinds.checklist,
            DocumentKind::Confirmation => &self.kinds.confirmation,
        }
    }

    pub fn label(&self, kind: DocumentKind) -> &str {
        &self.rule(kind).label
    }

    /// テンプレートに会社名をそのまま埋め込む（エスケープしない）
    pub fn output_stem(&self, kind: DocumentKind, company: &str) -> String {
        self.rule(kind).naming.replace("{company}", company)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_stem_inserts_company_verbatim() {
        let catalog = RuleCatalog::builtin();
        assert_eq!(
            catalog.output_stem(DocumentKind::Contract, "株式会社A/B"),
            "基本契約書_株式会社A/B"
        );
        assert_eq!(
            catalog.output_stem(DocumentKind::Estimate, "テスト"),
            "別紙１_テスト"
        );
    }

    #[test]
    fn test_builtin_appendix_keywords_cover_both_digit_widths() {
        let catalog = RuleCatalog::builtin();
        assert!(catalog.appendix.marker_keywords.contains(&"別紙2".to_string()));
        assert!(catalog.appendix.marker_keywords.contains(&"別紙２".to_string()));
        assert!(catalog.appendix.end_keywords.contains(&"別紙３".to_string()));
    }
}
