//! 別紙2 版数チェック
//!
//! 抽出テキストを行単位で走査し、別紙2 見出しの次の行から別紙3 見出しの手前までを集める。
//! 集めた本文に旧様式の文言があればエラー、最新様式の文言が無ければ警告を 1 件だけ返す。

use crate::models::catalog::AppendixKeywords;
use crate::models::Finding;

/// 別紙2 セクション本文（各行の末尾に改行を付けたもの）
///
/// 別紙2 見出しが無ければ空文字列。別紙3 見出しに到達した時点で走査を打ち切る。
pub fn appendix_section(text: &str, keywords: &AppendixKeywords) -> String {
    let mut inside = false;
    let mut section = String::new();

    for line in text.split('\n') {
        if contains_any(line, &keywords.marker_keywords).is_some() {
            inside = true;
            continue;
        }
        if contains_any(line, &keywords.end_keywords).is_some() {
            break;
        }
        if inside {
            section.push_str(line);
            section.push('\n');
        }
    }

    section
}

/// 別紙2 が最新様式かを判定する
pub fn check_appendix_version(text: &str, keywords: &AppendixKeywords) -> Option<Finding> {
    let section = appendix_section(text, keywords);
    if section.is_empty() {
        return None;
    }

    if let Some(obsolete) = contains_any(&section, &keywords.obsolete_keywords) {
        return Some(Finding::error(format!(
            "【別紙2エラー】旧様式の可能性があります。「{}」が検出されました。最新の別紙2に差し替えてください。",
            obsolete
        )));
    }

    if contains_any(&section, &keywords.latest_keywords).is_none() {
        return Some(Finding::warning(
            "【別紙2確認】最新様式のキーワードが見つかりませんでした。別紙2が最新版であることを確認してください。",
        ));
    }

    None
}

/// 最初に見つかったキーワード
pub(crate) fn contains_any<'a>(haystack: &str, keywords: &'a [String]) -> Option<&'a str> {
    keywords
        .iter()
        .map(String::as_str)
        .find(|kw| !kw.is_empty() && haystack.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    fn keywords() -> AppendixKeywords {
        AppendixKeywords::default()
    }

    #[test]
    fn test_no_marker_means_no_finding() {
        let text = "第1条 目的\n第20回アジア競技大会\n別紙3\n";
        assert_eq!(check_appendix_version(text, &keywords()), None);
    }

    #[test]
    fn test_obsolete_keyword_is_single_error() {
        let text = "本文\n別紙2\n第20回アジア競技大会 開催要項\n2026年アジア競技大会\n";
        let finding = check_appendix_version(text, &keywords()).unwrap();

        assert_eq!(finding.severity, Severity::Error);
        assert!(finding.message.contains("第20回アジア競技大会"));
    }

    #[test]
    fn test_obsolete_wins_over_latest() {
        let text = "別紙２\n愛知・名古屋2026\n第20回アジア競技大会\n";
        let finding = check_appendix_version(text, &keywords()).unwrap();
        assert_eq!(finding.severity, Severity::Error);
    }

    #[test]
    fn test_missing_latest_keyword_is_warning() {
        let text = "別紙2 宿泊施設一覧\nホテルA\nホテルB\n";
        let finding = check_appendix_version(text, &keywords()).unwrap();

        assert_eq!(finding.severity, Severity::Warning);
        assert!(finding.message.starts_with("【別紙2確認】"));
    }

    #[test]
    fn test_latest_keyword_passes() {
        let text = "別紙2\n愛知・名古屋2026大会 宿泊要項\n";
        assert_eq!(check_appendix_version(text, &keywords()), None);
    }

    #[test]
    fn test_marker_line_itself_is_not_collected() {
        // 見出し行に旧様式の文言があっても本文ではないので対象外
        let text = "別紙2（第20回アジア競技大会）\n愛知・名古屋2026\n";
        assert_eq!(check_appendix_version(text, &keywords()), None);
    }

    #[test]
    fn test_scan_stops_at_appendix3() {
        let text = "別紙2\n愛知・名古屋2026\n別紙３\n第20回アジア競技大会\n";
        assert_eq!(appendix_section(text, &keywords()), "愛知・名古屋2026\n");
        assert_eq!(check_appendix_version(text, &keywords()), None);
    }

    #[test]
    fn test_appendix3_before_marker_ends_scan() {
        let text = "別紙3\n別紙2\n第20回アジア競技大会\n";
        assert_eq!(check_appendix_version(text, &keywords()), None);
    }

    #[test]
    fn test_blank_line_after_marker_still_counts_as_section() {
        let text = "別紙2\n";
        assert_eq!(appendix_section(text, &keywords()), "\n");
        let finding = check_appendix_version(text, &keywords()).unwrap();
        assert_eq!(finding.severity, Severity::Warning);
    }
}
