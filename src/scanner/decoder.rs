use crate::core::error::ScanError;
use crate::core::frame::Frame;

use super::symbol::Symbol;

/// 解码能力：一帧进，符号列表出。不得跨帧保留状态。
pub trait SymbolDecoder: Send + Sync {
    /// 零个符号是合法结果；坏帧返回 Decode 错误，由调用方跳过该帧
    fn decode(&self, frame: &Frame) -> Result<Vec<Symbol>, ScanError>;
}

/// 按帧编号回放符号的模拟解码器，供测试和无摄像头场景使用
pub struct MockDecoder {
    symbol_pattern: Option<Box<dyn Fn(u64) -> Vec<Symbol> + Send + Sync>>,
}

impl MockDecoder {
    pub fn new() -> Self {
        Self {
            symbol_pattern: None,
        }
    }

    pub fn with_pattern<F>(pattern: F) -> Self
    where
        F: Fn(u64) -> Vec<Symbol> + Send + Sync + 'static,
    {
        Self {
            symbol_pattern: Some(Box::new(pattern)),
        }
    }

    /// 每一帧都返回同一组符号
    pub fn with_symbols(symbols: Vec<Symbol>) -> Self {
        Self::with_pattern(move |_| symbols.clone())
    }
}

impl Default for MockDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolDecoder for MockDecoder {
    fn decode(&self, frame: &Frame) -> Result<Vec<Symbol>, ScanError> {
        Ok(self
            .symbol_pattern
            .as_ref()
            .map(|p| p(frame.frame_number))
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::symbol::{BoundingBox, SymbolKind};

    fn blank_frame(frame_number: u64) -> Frame {
        Frame::new(16, 16, vec![0u8; 16 * 16 * 4], 0, frame_number)
    }

    #[test]
    fn test_mock_decoder_empty_by_default() {
        let decoder = MockDecoder::new();
        assert!(decoder.decode(&blank_frame(1)).unwrap().is_empty());
    }

    #[test]
    fn test_mock_decoder_with_pattern() {
        let decoder = MockDecoder::with_pattern(|n| {
            if n % 2 == 0 {
                vec![Symbol::new(
                    SymbolKind::Code128,
                    "3009P",
                    BoundingBox::new(0, 0, 8, 8),
                )]
            } else {
                Vec::new()
            }
        });

        assert_eq!(decoder.decode(&blank_frame(2)).unwrap().len(), 1);
        assert!(decoder.decode(&blank_frame(3)).unwrap().is_empty());
    }
}
