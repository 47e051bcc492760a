use std::fmt;

/// 符号制式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Code128,
    Ean13,
    QrCode,
}

impl SymbolKind {
    /// 显示名称，即默认标签 `{TYPE}: {payload}` 中的 TYPE
    pub fn name(&self) -> &'static str {
        match self {
            SymbolKind::Code128 => "CODE128",
            SymbolKind::Ean13 => "EAN13",
            SymbolKind::QrCode => "QRCODE",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// 轴对齐包围盒
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// 四角，顺时针，从左上开始
    pub fn corners(&self) -> [Point; 4] {
        let right = self.x + self.width as i32;
        let bottom = self.y + self.height as i32;
        [
            Point::new(self.x, self.y),
            Point::new(right, self.y),
            Point::new(right, bottom),
            Point::new(self.x, bottom),
        ]
    }
}

/// 单帧中解码出的一个条码实例；逐帧新建，不跨帧保留
#[derive(Debug, Clone)]
pub struct Symbol {
    pub kind: SymbolKind,
    /// 解码文本；无法解码的字节以替换字符表示
    pub payload: String,
    pub rect: BoundingBox,
    /// 轮廓点序列，可以为空
    pub polygon: Vec<Point>,
}

impl Symbol {
    /// 以包围盒四角作为默认轮廓
    pub fn new(kind: SymbolKind, payload: impl Into<String>, rect: BoundingBox) -> Self {
        Self {
            kind,
            payload: payload.into(),
            rect,
            polygon: rect.corners().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(SymbolKind::Code128.name(), "CODE128");
        assert_eq!(SymbolKind::QrCode.to_string(), "QRCODE");
    }

    #[test]
    fn test_corners_order() {
        let rect = BoundingBox::new(2, 3, 10, 4);
        let corners = rect.corners();
        assert_eq!(corners[0], Point::new(2, 3));
        assert_eq!(corners[1], Point::new(12, 3));
        assert_eq!(corners[2], Point::new(12, 7));
        assert_eq!(corners[3], Point::new(2, 7));
    }

    #[test]
    fn test_symbol_default_polygon() {
        let symbol = Symbol::new(SymbolKind::Code128, "3009P", BoundingBox::new(0, 0, 8, 8));
        assert_eq!(symbol.polygon.len(), 4);
        assert_eq!(symbol.payload, "3009P");
    }
}
