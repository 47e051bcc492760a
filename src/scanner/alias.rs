//! 载荷 → 显示名称 映射表

use std::collections::HashMap;
use std::path::Path;

use log::{debug, warn};
use serde::Deserialize;

/// 默认映射文件名（相对运行目录）
pub const ALIAS_FILE: &str = "mappings.json";

/// 启动时加载一次，进程生命周期内不变
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct AliasTable {
    entries: HashMap<String, String>,
}

impl AliasTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// 从 JSON 文件加载；文件缺失或格式错误时返回空表，不报错
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => {
                debug!("no alias table at {}", path.display());
                return Self::default();
            }
        };
        match serde_json::from_str(&text) {
            Ok(table) => table,
            Err(e) => {
                warn!("alias table {} unreadable: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn lookup(&self, payload: &str) -> Option<&str> {
        self.entries.get(payload).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for AliasTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let table = AliasTable::load(&dir.path().join("absent.json"));
        assert!(table.is_empty());
    }

    #[test]
    fn test_malformed_file_yields_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mappings.json");
        std::fs::write(&path, "{ not json").unwrap();

        let table = AliasTable::load(&path);
        assert!(table.is_empty());
    }

    #[test]
    fn test_load_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mappings.json");
        std::fs::write(&path, r#"{"3009P": "21008고진우", "1234A": "홍길동"}"#).unwrap();

        let table = AliasTable::load(&path);
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup("3009P"), Some("21008고진우"));
        assert_eq!(table.lookup("9999Z"), None);
    }
}
