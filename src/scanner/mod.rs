//! 条码扫描核心 - 解码、标注、会话去重与持久化
//!
//! 处理流程：
//! 1. 帧来源逐帧供帧
//! 2. 解码器给出符号列表，标注器就地绘制
//! 3. 标签解析决定显示名称与是否持久化
//! 4. 会话内按标签去重，新颖检测写入扫描记录

pub mod alias;
pub mod annotator;
pub mod code128;
pub mod decoder;
pub mod pipeline;
pub mod resolver;
pub mod scan_log;
pub mod session;
pub mod symbol;
pub mod tracker;

pub use alias::{AliasTable, ALIAS_FILE};
pub use code128::Code128Decoder;
pub use decoder::{MockDecoder, SymbolDecoder};
pub use pipeline::{Detection, FrameScanner};
pub use resolver::{mappable_payload, resolve, ResolvedLabel};
pub use scan_log::{ScanLog, SCAN_LOG_FILE};
pub use session::{
    Alert, Command, FrameSink, FrameSource, MemorySource, NullSink, ScanSession, SessionConfig,
    SessionStats,
};
pub use symbol::{BoundingBox, Point, Symbol, SymbolKind};
pub use tracker::SessionTracker;
