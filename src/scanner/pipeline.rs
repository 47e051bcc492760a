//! 单帧处理管线：解码 → 标签解析 → 标注

use crate::core::error::ScanError;
use crate::core::frame::Frame;

use super::alias::AliasTable;
use super::annotator;
use super::decoder::SymbolDecoder;
use super::resolver;
use super::symbol::SymbolKind;

/// 一次检测的完整结果，单帧内瞬态
#[derive(Debug, Clone)]
pub struct Detection {
    pub kind: SymbolKind,
    pub payload: String,
    pub label: String,
    pub is_aliased: bool,
}

pub struct FrameScanner {
    decoder: Box<dyn SymbolDecoder>,
    aliases: AliasTable,
}

impl FrameScanner {
    pub fn new(decoder: Box<dyn SymbolDecoder>, aliases: AliasTable) -> Self {
        Self { decoder, aliases }
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// 处理一帧：就地绘制标注并返回检测列表
    pub fn process_frame(&self, frame: &mut Frame) -> Result<Vec<Detection>, ScanError> {
        let symbols = self.decoder.decode(frame)?;
        let mut detections = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let resolved = resolver::resolve(symbol.kind, &symbol.payload, &self.aliases);
            annotator::annotate(frame, &symbol, &resolved.label);
            detections.push(Detection {
                kind: symbol.kind,
                payload: symbol.payload,
                label: resolved.label,
                is_aliased: resolved.is_aliased,
            });
        }
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::decoder::MockDecoder;
    use crate::scanner::symbol::{BoundingBox, Symbol};

    fn blank_frame() -> Frame {
        Frame::new(96, 96, vec![0u8; 96 * 96 * 4], 0, 1)
    }

    fn aliases() -> AliasTable {
        [("3009P".to_string(), "21008고진우".to_string())]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_process_frame_resolves_and_annotates() {
        let decoder = MockDecoder::with_symbols(vec![
            Symbol::new(SymbolKind::Code128, "3009P", BoundingBox::new(8, 40, 40, 16)),
            Symbol::new(SymbolKind::QrCode, "hello", BoundingBox::new(60, 60, 20, 20)),
        ]);
        let scanner = FrameScanner::new(Box::new(decoder), aliases());

        let mut frame = blank_frame();
        let before = frame.data.clone();
        let detections = scanner.process_frame(&mut frame).unwrap();

        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].label, "21008고진우");
        assert!(detections[0].is_aliased);
        assert_eq!(detections[1].label, "QRCODE: hello");
        assert!(!detections[1].is_aliased);
        // 帧被就地标注
        assert_ne!(frame.data, before);
    }

    #[test]
    fn test_process_frame_without_symbols() {
        let scanner = FrameScanner::new(Box::new(MockDecoder::new()), AliasTable::empty());
        let mut frame = blank_frame();
        let before = frame.data.clone();

        let detections = scanner.process_frame(&mut frame).unwrap();
        assert!(detections.is_empty());
        assert_eq!(frame.data, before);
    }
}
