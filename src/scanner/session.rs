//! 采集会话：读帧 → 解码/标注 → 新颖性判定 → 记录与提示音 → 渲染 → 控制命令
//!
//! 单线程同步管线：一帧完整处理完毕才读下一帧，Seen 集合与扫描记录
//! 因此不需要加锁。仅读帧与渲染可能阻塞。

use chrono::Local;
use log::{debug, error, warn};

use crate::core::error::ScanError;
use crate::core::frame::Frame;

use super::pipeline::FrameScanner;
use super::scan_log::ScanLog;
use super::tracker::SessionTracker;

/// 控制命令；具体按键/输入绑定由帧接收端决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Reset,
    Quit,
}

/// 帧来源
pub trait FrameSource {
    /// 读取下一帧；Ok(None) 表示流结束（正常终止）。
    /// Err 表示该帧无法使用，调用方跳过后继续。
    fn read(&mut self) -> Result<Option<Frame>, ScanError>;
}

/// 帧接收端：显示 + 控制输入
pub trait FrameSink {
    fn show(&mut self, window: &str, frame: &Frame) -> Result<(), ScanError>;
    /// 每帧轮询一次；没有命令时返回 None
    fn poll_command(&mut self) -> Option<Command>;
}

/// 提示音能力；实现必须自行吞掉全部错误
pub trait Alert {
    fn beep(&self, frequency_hz: u32, duration_ms: u64);
}

impl<T: Alert + ?Sized> Alert for Box<T> {
    fn beep(&self, frequency_hz: u32, duration_ms: u64) {
        (**self).beep(frequency_hz, duration_ms)
    }
}

/// 新颖检测的提示音参数
const BEEP_FREQUENCY_HZ: u32 = 1000;
const BEEP_DURATION_MS: u64 = 120;

/// 控制台与扫描记录共用的时间戳格式
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub window_name: String,
    /// 每帧输出一行调试信息，不影响控制流
    pub debug: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            window_name: "Barcode Scanner".to_string(),
            debug: false,
        }
    }
}

/// 会话统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames: u64,
    pub detections: u64,
    pub novel: u64,
    pub appended: u64,
}

pub struct ScanSession<A: Alert> {
    scanner: FrameScanner,
    tracker: SessionTracker,
    journal: ScanLog,
    alert: A,
    config: SessionConfig,
}

impl<A: Alert> ScanSession<A> {
    pub fn new(scanner: FrameScanner, journal: ScanLog, alert: A, config: SessionConfig) -> Self {
        Self {
            scanner,
            tracker: SessionTracker::new(),
            journal,
            alert,
            config,
        }
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    pub fn alert(&self) -> &A {
        &self.alert
    }

    /// 运行到流结束或收到退出命令。
    /// 只有帧来源不可用才会让整个会话失败；其余错误就地降级。
    pub fn run<S, K>(&mut self, source: &mut S, sink: &mut K) -> Result<SessionStats, ScanError>
    where
        S: FrameSource,
        K: FrameSink,
    {
        if let Err(e) = self.journal.ensure_initialized() {
            error!("scan log init failed: {}", e);
        }

        let mut stats = SessionStats::default();
        loop {
            let mut frame = match source.read() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    warn!("frame skipped: {}", e);
                    continue;
                }
            };
            stats.frames += 1;

            let detections = match self.scanner.process_frame(&mut frame) {
                Ok(detections) => detections,
                Err(e) => {
                    warn!("frame {} skipped: {}", frame.frame_number, e);
                    Vec::new()
                }
            };
            if self.config.debug {
                debug!("frame={} decoded={}", stats.frames, detections.len());
            }
            stats.detections += detections.len() as u64;

            for detection in &detections {
                if !self.tracker.is_novel(&detection.label) {
                    continue;
                }
                stats.novel += 1;
                let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
                println!("[{}] {}", timestamp, detection.label);

                if detection.is_aliased {
                    match self.journal.append(
                        &timestamp,
                        detection.kind.name(),
                        &detection.payload,
                        &detection.label,
                    ) {
                        Ok(()) => stats.appended += 1,
                        Err(e) => error!("scan log append failed: {}", e),
                    }
                }
                self.alert.beep(BEEP_FREQUENCY_HZ, BEEP_DURATION_MS);
            }

            if let Err(e) = sink.show(&self.config.window_name, &frame) {
                warn!("render failed: {}", e);
            }

            match sink.poll_command() {
                Some(Command::Reset) => self.handle_reset(),
                Some(Command::Quit) => break,
                None => {}
            }
        }
        Ok(stats)
    }

    fn handle_reset(&mut self) {
        self.tracker.reset();
        if let Err(e) = self.journal.reset() {
            error!("scan log reset failed: {}", e);
        }
        println!("scan history cleared");
    }
}

/// 预置帧序列的帧来源（测试/回放用）
pub struct MemorySource {
    frames: std::collections::VecDeque<Frame>,
}

impl MemorySource {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames: frames.into(),
        }
    }
}

impl FrameSource for MemorySource {
    fn read(&mut self) -> Result<Option<Frame>, ScanError> {
        Ok(self.frames.pop_front())
    }
}

/// 丢弃帧、按脚本回放命令的接收端（测试/无显示环境用）
pub struct NullSink {
    commands: std::collections::VecDeque<Option<Command>>,
}

impl NullSink {
    pub fn new() -> Self {
        Self {
            commands: Default::default(),
        }
    }

    /// 每帧依序回放一个命令；脚本耗尽后一直返回 None
    pub fn with_script(commands: Vec<Option<Command>>) -> Self {
        Self {
            commands: commands.into(),
        }
    }
}

impl Default for NullSink {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSink for NullSink {
    fn show(&mut self, _window: &str, _frame: &Frame) -> Result<(), ScanError> {
        Ok(())
    }

    fn poll_command(&mut self) -> Option<Command> {
        self.commands.pop_front().flatten()
    }
}

/// 只计数的提示音（测试用）
#[derive(Default)]
pub struct CountingAlert {
    count: std::cell::Cell<u64>,
}

impl CountingAlert {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.count.get()
    }
}

impl Alert for CountingAlert {
    fn beep(&self, _frequency_hz: u32, _duration_ms: u64) {
        self.count.set(self.count.get() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::alias::AliasTable;
    use crate::scanner::decoder::{MockDecoder, SymbolDecoder};
    use crate::scanner::scan_log::HEADER;
    use crate::scanner::symbol::{BoundingBox, Symbol, SymbolKind};
    use std::path::Path;

    fn blank_frame(frame_number: u64) -> Frame {
        Frame::new(64, 64, vec![0u8; 64 * 64 * 4], frame_number * 33, frame_number)
    }

    fn frames(count: u64) -> Vec<Frame> {
        (1..=count).map(blank_frame).collect()
    }

    fn code128(payload: &str) -> Symbol {
        Symbol::new(SymbolKind::Code128, payload, BoundingBox::new(4, 30, 40, 12))
    }

    fn aliases() -> AliasTable {
        [("3009P".to_string(), "21008고진우".to_string())]
            .into_iter()
            .collect()
    }

    fn data_rows(path: &Path) -> Vec<Vec<String>> {
        let mut reader = csv::Reader::from_path(path).unwrap();
        assert_eq!(
            reader.headers().unwrap().iter().collect::<Vec<_>>(),
            HEADER
        );
        reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    fn session(
        decoder: Box<dyn SymbolDecoder>,
        aliases: AliasTable,
        log_path: &Path,
    ) -> ScanSession<CountingAlert> {
        ScanSession::new(
            FrameScanner::new(decoder, aliases),
            ScanLog::new(log_path),
            CountingAlert::new(),
            SessionConfig::default(),
        )
    }

    #[test]
    fn test_scenario_aliased_detection_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("scans.csv");
        let decoder = MockDecoder::with_symbols(vec![code128("3009P")]);
        let mut session = session(Box::new(decoder), aliases(), &log_path);

        let stats = session
            .run(&mut MemorySource::new(frames(1)), &mut NullSink::new())
            .unwrap();

        assert_eq!(stats.frames, 1);
        assert_eq!(stats.novel, 1);
        assert_eq!(stats.appended, 1);
        assert_eq!(session.alert().count(), 1);

        let rows = data_rows(&log_path);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][1], "CODE128");
        assert_eq!(rows[0][2], "3009P");
        assert_eq!(rows[0][3], "21008고진우");
    }

    #[test]
    fn test_scenario_unmapped_detection_is_shown_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("scans.csv");
        let decoder = MockDecoder::with_symbols(vec![code128("9999Z")]);
        let mut session = session(Box::new(decoder), AliasTable::empty(), &log_path);

        let stats = session
            .run(&mut MemorySource::new(frames(1)), &mut NullSink::new())
            .unwrap();

        assert_eq!(stats.novel, 1);
        assert_eq!(stats.appended, 0);
        assert_eq!(session.alert().count(), 1);
        assert!(data_rows(&log_path).is_empty());
    }

    #[test]
    fn test_scenario_duplicate_label_reported_once() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("scans.csv");
        let decoder = MockDecoder::with_symbols(vec![code128("3009P")]);
        let mut session = session(Box::new(decoder), aliases(), &log_path);

        let stats = session
            .run(&mut MemorySource::new(frames(2)), &mut NullSink::new())
            .unwrap();

        assert_eq!(stats.frames, 2);
        assert_eq!(stats.detections, 2);
        assert_eq!(stats.novel, 1);
        assert_eq!(stats.appended, 1);
        assert_eq!(data_rows(&log_path).len(), 1);
    }

    #[test]
    fn test_scenario_reset_restores_novelty_and_truncates_log() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("scans.csv");
        let decoder = MockDecoder::with_symbols(vec![code128("3009P")]);
        let mut session = session(Box::new(decoder), aliases(), &log_path);

        // 第二帧之后重置：第三帧的同一标签重新视为新颖
        let mut sink = NullSink::with_script(vec![None, Some(Command::Reset), None]);
        let stats = session
            .run(&mut MemorySource::new(frames(3)), &mut sink)
            .unwrap();

        assert_eq!(stats.novel, 2);
        assert_eq!(stats.appended, 2);
        // 重置清空了之前的行，只剩第三帧的一行
        assert_eq!(data_rows(&log_path).len(), 1);
    }

    #[test]
    fn test_quit_command_ends_run() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("scans.csv");
        let mut session = session(Box::new(MockDecoder::new()), AliasTable::empty(), &log_path);

        let mut sink = NullSink::with_script(vec![Some(Command::Quit)]);
        let stats = session
            .run(&mut MemorySource::new(frames(5)), &mut sink)
            .unwrap();

        assert_eq!(stats.frames, 1);
    }

    #[test]
    fn test_persistence_selectivity_with_mixed_detections() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("scans.csv");
        let decoder = MockDecoder::with_symbols(vec![
            code128("3009P"),
            code128("9999Z"),
            Symbol::new(SymbolKind::QrCode, "hello", BoundingBox::new(2, 2, 10, 10)),
        ]);
        let mut session = session(Box::new(decoder), aliases(), &log_path);

        let stats = session
            .run(&mut MemorySource::new(frames(2)), &mut NullSink::new())
            .unwrap();

        // 三个标签各新颖一次，只有映射命中的那个落盘
        assert_eq!(stats.novel, 3);
        assert_eq!(stats.appended, 1);
        assert_eq!(session.alert().count(), 3);
        assert_eq!(data_rows(&log_path).len(), 1);
    }

    #[test]
    fn test_decode_error_skips_frame_and_continues() {
        struct FlakyDecoder;
        impl SymbolDecoder for FlakyDecoder {
            fn decode(&self, frame: &Frame) -> Result<Vec<Symbol>, ScanError> {
                if frame.frame_number == 1 {
                    Err(ScanError::Decode("bad frame".to_string()))
                } else {
                    Ok(vec![Symbol::new(
                        SymbolKind::Code128,
                        "9999Z",
                        BoundingBox::new(4, 30, 40, 12),
                    )])
                }
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("scans.csv");
        let mut session = session(Box::new(FlakyDecoder), AliasTable::empty(), &log_path);

        let stats = session
            .run(&mut MemorySource::new(frames(2)), &mut NullSink::new())
            .unwrap();

        assert_eq!(stats.frames, 2);
        assert_eq!(stats.novel, 1);
    }

    #[test]
    fn test_label_collision_dedups_across_payloads() {
        // 两个不同载荷解析到同一标签时按同一检测处理
        let aliases: AliasTable = [
            ("3009P".to_string(), "같은이름".to_string()),
            ("4001Q".to_string(), "같은이름".to_string()),
        ]
        .into_iter()
        .collect();

        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("scans.csv");
        let decoder = MockDecoder::with_symbols(vec![code128("3009P"), code128("4001Q")]);
        let mut session = session(Box::new(decoder), aliases, &log_path);

        let stats = session
            .run(&mut MemorySource::new(frames(1)), &mut NullSink::new())
            .unwrap();

        assert_eq!(stats.novel, 1);
        assert_eq!(stats.appended, 1);
    }
}
