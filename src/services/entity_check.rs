//! 書類間の法人情報突合
//!
//! 各書類のテキストから法人名・住所・代表者名を拾い、書類間で食い違いがないかを確認する。

use regex::Regex;

use crate::error::{AppError, AppResult, ConfigError};
use crate::models::catalog::EntityPatterns;
use crate::models::{DocumentKind, Finding};

/// 1 書類から拾った法人情報
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityInfo {
    pub company: Option<String>,
    pub address: Option<String>,
    pub representative: Option<String>,
}

impl EntityInfo {
    fn fields(&self) -> [(&'static str, Option<&str>); 3] {
        [
            ("法人名", self.company.as_deref()),
            ("住所", self.address.as_deref()),
            ("代表者名", self.representative.as_deref()),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|(_, v)| v.is_none())
    }
}

/// 法人情報の抽出器
pub struct EntityExtractor {
    company: Regex,
    address: Regex,
    representative: Regex,
}

impl EntityExtractor {
    pub fn new(patterns: &EntityPatterns) -> AppResult<Self> {
        Ok(Self {
            company: compile(&patterns.company)?,
            address: compile(&patterns.address)?,
            representative: compile(&patterns.representative)?,
        })
    }

    pub fn extract(&self, text: &str) -> EntityInfo {
        EntityInfo {
            company: first_capture(&self.company, text),
            address: first_capture(&self.address, text),
            representative: first_capture(&self.representative, text),
        }
    }
}

fn compile(pattern: &str) -> AppResult<Regex> {
    Regex::new(pattern).map_err(|source| {
        AppError::Config(ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
    })
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// 項目ごとに、最初に値を持つ書類を基準として後続の書類と比べる
pub fn cross_check(infos: &[(DocumentKind, EntityInfo)]) -> Vec<Finding> {
    let mut findings = Vec::new();
    if infos.len() < 2 {
        return findings;
    }

    for field_index in 0..3 {
        let mut base: Option<(DocumentKind, &str)> = None;

        for (kind, info) in infos {
            let (label, value) = info.fields()[field_index];
            let Some(value) = value else { continue };

            match base {
                None => base = Some((*kind, value)),
                Some((base_kind, base_value)) if base_value != value => {
                    findings.push(Finding::error(format!(
                        "【整合性エラー】{}が不一致: {}「{}」≠ {}「{}」",
                        label,
                        base_kind.tag(),
                        base_value,
                        kind.tag(),
                        value
                    )));
                }
                Some(_) => {}
            }
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> EntityExtractor {
        EntityExtractor::new(&EntityPatterns::default()).unwrap()
    }

    #[test]
    fn test_extract_fields() {
        let text = "甲：公益財団法人 組織委員会\n乙：株式会社サンプル\n住所：愛知県名古屋市中区1-1\n代表取締役　山田 太郎\n";
        let info = extractor().extract(text);

        assert_eq!(info.company.as_deref(), Some("株式会社サンプル"));
        assert_eq!(info.address.as_deref(), Some("愛知県名古屋市中区1-1"));
        assert_eq!(info.representative.as_deref(), Some("山田 太郎"));
    }

    #[test]
    fn test_extract_nothing() {
        assert!(extractor().extract("第1条 目的").is_empty());
    }

    #[test]
    fn test_cross_check_reports_mismatch() {
        let ex = extractor();
        let infos = vec![
            (DocumentKind::Contract, ex.extract("乙：株式会社サンプル\n所在地：名古屋市")),
            (DocumentKind::Oath, ex.extract("乙: 株式会社サンプル")),
            (DocumentKind::Confirmation, ex.extract("乙：株式会社サンプル商事\n住所：名古屋市")),
        ];

        let findings = cross_check(&infos);

        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].message,
            "【整合性エラー】法人名が不一致: 契約書「株式会社サンプル」≠ 確認書「株式会社サンプル商事」"
        );
    }

    #[test]
    fn test_cross_check_base_is_first_document_with_value() {
        let ex = extractor();
        let infos = vec![
            (DocumentKind::Contract, ex.extract("本文のみ")),
            (DocumentKind::Oath, ex.extract("代表取締役 山田")),
            (DocumentKind::Confirmation, ex.extract("代表者 佐藤")),
        ];

        let findings = cross_check(&infos);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("誓約書「山田」"));
    }

    #[test]
    fn test_single_document_never_conflicts() {
        let infos = vec![(DocumentKind::Contract, extractor().extract("乙：A社"))];
        assert!(cross_check(&infos).is_empty());
    }
}
