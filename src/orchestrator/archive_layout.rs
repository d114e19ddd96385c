//! アーカイブ内の配置
//!
//! 成果物グループとバックアップグループのパスを決め、同名のエントリには ` (n)` を付けて区別する。

use chrono::{DateTime, TimeZone};
use std::collections::HashSet;

use crate::models::RuleCatalog;

/// アーカイブ内パスの割り当て
#[derive(Debug)]
pub struct ArchiveLayout {
    deliverables_dir: String,
    backup_dir: String,
    used: HashSet<String>,
}

impl ArchiveLayout {
    pub fn new(catalog: &RuleCatalog) -> Self {
        Self {
            deliverables_dir: catalog.deliverables_dir.clone(),
            backup_dir: catalog.backup_dir.clone(),
            used: HashSet::new(),
        }
    }

    /// 成果物のパスを確保し、(パス, 実際のファイル名) を返す
    pub fn deliverable_path(&mut self, file_name: &str) -> (String, String) {
        let dir = self.deliverables_dir.clone();
        self.claim(&dir, file_name)
    }

    /// バックアップのパスを確保する
    pub fn backup_path(&mut self, original_filename: &str) -> String {
        let dir = self.backup_dir.clone();
        self.claim(&dir, &sanitize_backup_name(original_filename)).0
    }

    fn claim(&mut self, dir: &str, file_name: &str) -> (String, String) {
        let mut candidate = file_name.to_string();
        let mut n = 2;
        while self.used.contains(&format!("{}/{}", dir, candidate)) {
            candidate = numbered_name(file_name, n);
            n += 1;
        }

        let path = format!("{}/{}", dir, candidate);
        self.used.insert(path.clone());
        (path, candidate)
    }
}

/// パス区切り文字を `_` に置き換える
pub fn sanitize_backup_name(name: &str) -> String {
    let sanitized = name.replace(['/', '\\'], "_");
    if sanitized.trim().is_empty() {
        "無題".to_string()
    } else {
        sanitized
    }
}

/// `見積.xlsx` → `見積 (2).xlsx`
pub fn numbered_name(file_name: &str, n: usize) -> String {
    match file_name.rfind('.') {
        Some(dot) if dot > 0 => format!("{} ({}){}", &file_name[..dot], n, &file_name[dot..]),
        _ => format!("{} ({})", file_name, n),
    }
}

/// `<prefix>_<会社名>_<YYYYMMDDHHMMSS>.zip`
pub fn archive_name<Tz: TimeZone>(prefix: &str, company: &str, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}_{}_{}.zip", prefix, company, now.format("%Y%m%d%H%M%S"))
}
