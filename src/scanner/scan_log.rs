//! 扫描记录：固定四列、只追加的 CSV

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::core::error::ScanError;

/// 默认记录文件名（相对运行目录）
pub const SCAN_LOG_FILE: &str = "scans.csv";
/// 固定表头
pub const HEADER: [&str; 4] = ["timestamp", "type", "payload", "label"];

/// 文件状态只在 absent → 表头 → 表头+数据行 之间迁移；
/// reset 回到仅表头，任何状态都不会没有表头。
pub struct ScanLog {
    path: PathBuf,
}

impl ScanLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 幂等初始化：文件缺失时写入表头，已存在则不动
    pub fn ensure_initialized(&self) -> Result<(), ScanError> {
        if self.path.exists() {
            return Ok(());
        }
        self.write_header()
    }

    /// 追加一行。出错时整个调用失败，已有行不受影响。
    pub fn append(
        &self,
        timestamp: &str,
        kind: &str,
        payload: &str,
        label: &str,
    ) -> Result<(), ScanError> {
        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record([timestamp, kind, payload, label])?;
        writer.flush()?;
        Ok(())
    }

    /// 重建：丢弃全部数据行，仅保留表头
    pub fn reset(&self) -> Result<(), ScanError> {
        self.write_header()
    }

    fn write_header(&self) -> Result<(), ScanError> {
        let mut writer = csv::Writer::from_path(&self.path)?;
        writer.write_record(HEADER)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_rows(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
        let mut reader = csv::Reader::from_path(path).unwrap();
        let header = reader
            .headers()
            .unwrap()
            .iter()
            .map(str::to_string)
            .collect();
        let rows = reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect();
        (header, rows)
    }

    #[test]
    fn test_initialize_creates_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let log = ScanLog::new(dir.path().join("scans.csv"));

        log.ensure_initialized().unwrap();

        let (header, rows) = read_rows(log.path());
        assert_eq!(header, HEADER);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let log = ScanLog::new(dir.path().join("scans.csv"));

        log.ensure_initialized().unwrap();
        log.append("2026-08-07 10:00:00", "CODE128", "3009P", "21008고진우")
            .unwrap();
        log.ensure_initialized().unwrap();

        let (_, rows) = read_rows(log.path());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], ["2026-08-07 10:00:00", "CODE128", "3009P", "21008고진우"]);
    }

    #[test]
    fn test_reset_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let log = ScanLog::new(dir.path().join("scans.csv"));

        log.ensure_initialized().unwrap();
        for i in 0..3 {
            log.append("2026-08-07 10:00:00", "CODE128", &format!("000{}A", i), "label")
                .unwrap();
        }
        log.reset().unwrap();

        let (header, rows) = read_rows(log.path());
        assert_eq!(header, HEADER);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_append_after_reset() {
        let dir = tempfile::tempdir().unwrap();
        let log = ScanLog::new(dir.path().join("scans.csv"));

        log.ensure_initialized().unwrap();
        log.append("t1", "CODE128", "3009P", "a").unwrap();
        log.reset().unwrap();
        log.append("t2", "CODE128", "1234B", "b").unwrap();

        let (_, rows) = read_rows(log.path());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][1], "CODE128");
        assert_eq!(rows[0][2], "1234B");
    }

    #[test]
    fn test_append_to_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let log = ScanLog::new(dir.path().join("scans.csv"));

        assert!(log.append("t", "CODE128", "3009P", "a").is_err());
    }
}
