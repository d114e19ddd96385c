//! 結果表示
//!
//! BatchResult を「処理完了 / エラー / 警告・確認事項」の順にまとめる。空のグループは出さない。

use serde::Serialize;

use crate::models::BatchResult;

/// 表示用にまとめた結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub produced: Vec<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// 作成したアーカイブ名（作成しなかった場合は None）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<String>,
}

impl Report {
    pub fn new(result: &BatchResult, archive: Option<&str>) -> Self {
        Self {
            produced: result.produced.clone(),
            errors: result.errors.iter().map(|f| f.message.clone()).collect(),
            warnings: result.warnings.iter().map(|f| f.message.clone()).collect(),
            archive: archive.map(str::to_string),
        }
    }

    /// 人が読むためのテキスト
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        push_group(&mut out, "処理完了:", &self.produced);
        push_group(&mut out, "エラー:", &self.errors);
        push_group(&mut out, "警告・確認事項:", &self.warnings);

        if let Some(archive) = &self.archive {
            out.push_str(&format!("出力: {}\n", archive));
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn push_group(out: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(heading);
    out.push('\n');
    for item in items {
        out.push_str("  - ");
        out.push_str(item);
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Finding;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_groups_in_order() {
        let mut result = BatchResult::default();
        result.record_artifact("基本契約書_A.docx");
        result.push(Finding::warning("【別紙2確認】W"));
        result.push(Finding::error("【契約書エラー】E"));

        let text = Report::new(&result, Some("契約書_A_20260401093000.zip")).render_text();

        assert_eq!(
            text,
            "処理完了:\n  - 基本契約書_A.docx\n\nエラー:\n  - 【契約書エラー】E\n\n警告・確認事項:\n  - 【別紙2確認】W\n出力: 契約書_A_20260401093000.zip\n"
        );
    }

    #[test]
    fn test_empty_groups_are_omitted() {
        let mut result = BatchResult::default();
        result.push(Finding::warning("【見積書確認】W"));

        let text = Report::new(&result, None).render_text();
        assert_eq!(text, "警告・確認事項:\n  - 【見積書確認】W\n");
    }

    #[test]
    fn test_json_shape() {
        let mut result = BatchResult::default();
        result.push(Finding::error("E"));

        let json: serde_json::Value =
            serde_json::from_str(&Report::new(&result, None).to_json().unwrap()).unwrap();

        assert_eq!(json["errors"][0], "E");
        assert!(json["produced"].as_array().unwrap().is_empty());
        assert!(json.get("archive").is_none());
    }
}
