//! 帧标注：包围盒、轮廓线、标签文本，直接写 RGBA 缓冲

use crate::core::frame::Frame;

use super::symbol::{BoundingBox, Point, Symbol};

pub type Color = [u8; 3];

/// 包围盒颜色（绿）
pub const BOX_COLOR: Color = [0, 255, 0];
/// 轮廓颜色（蓝）
pub const POLYGON_COLOR: Color = [0, 0, 255];
/// 标签颜色（红）
pub const LABEL_COLOR: Color = [255, 0, 0];

const LINE_THICKNESS: i32 = 2;
/// 标签底边相对包围盒上沿的偏移
const LABEL_OFFSET: i32 = 10;
const GLYPH_SCALE: i32 = 2;
const GLYPH_WIDTH: i32 = 5;
const GLYPH_HEIGHT: i32 = 7;

/// 为一个符号绘制全部标注。轮廓为空时只画包围盒和标签。
pub fn annotate(frame: &mut Frame, symbol: &Symbol, label: &str) {
    draw_rect(frame, &symbol.rect, BOX_COLOR);
    draw_polygon(frame, &symbol.polygon, POLYGON_COLOR);

    let text_top = symbol.rect.y - LABEL_OFFSET - GLYPH_HEIGHT * GLYPH_SCALE;
    draw_label(frame, label, symbol.rect.x, text_top, LABEL_COLOR);
}

/// 越界坐标直接丢弃，标注可以画在帧边缘
fn put_pixel(frame: &mut Frame, x: i32, y: i32, color: Color) {
    if x < 0 || y < 0 || x >= frame.width as i32 || y >= frame.height as i32 {
        return;
    }
    let idx = (y as usize * frame.width as usize + x as usize) * 4;
    frame.data[idx] = color[0];
    frame.data[idx + 1] = color[1];
    frame.data[idx + 2] = color[2];
    frame.data[idx + 3] = 255;
}

fn put_block(frame: &mut Frame, x: i32, y: i32, color: Color) {
    for dy in 0..LINE_THICKNESS {
        for dx in 0..LINE_THICKNESS {
            put_pixel(frame, x + dx, y + dy, color);
        }
    }
}

pub fn draw_rect(frame: &mut Frame, rect: &BoundingBox, color: Color) {
    let right = rect.x + rect.width as i32;
    let bottom = rect.y + rect.height as i32;
    for t in 0..LINE_THICKNESS {
        for x in rect.x..=right {
            put_pixel(frame, x, rect.y + t, color);
            put_pixel(frame, x, bottom - t, color);
        }
        for y in rect.y..=bottom {
            put_pixel(frame, rect.x + t, y, color);
            put_pixel(frame, right - t, y, color);
        }
    }
}

/// 依次连线并首尾闭合；空轮廓直接跳过
pub fn draw_polygon(frame: &mut Frame, polygon: &[Point], color: Color) {
    if polygon.is_empty() {
        return;
    }
    for i in 0..polygon.len() {
        let from = polygon[i];
        let to = polygon[(i + 1) % polygon.len()];
        draw_line(frame, from, to, color);
    }
}

fn draw_line(frame: &mut Frame, from: Point, to: Point, color: Color) {
    // Bresenham
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx + dy;
    let mut x = from.x;
    let mut y = from.y;
    loop {
        put_block(frame, x, y, color);
        if x == to.x && y == to.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// 内置 5x7 点阵绘制标签；非 ASCII 字符画替换框
pub fn draw_label(frame: &mut Frame, text: &str, x: i32, y: i32, color: Color) {
    let mut cx = x;
    for ch in text.chars() {
        let columns = glyph(ch);
        for (col, &bits) in columns.iter().enumerate() {
            for row in 0..GLYPH_HEIGHT {
                if bits & (1 << row) == 0 {
                    continue;
                }
                for dy in 0..GLYPH_SCALE {
                    for dx in 0..GLYPH_SCALE {
                        put_pixel(
                            frame,
                            cx + col as i32 * GLYPH_SCALE + dx,
                            y + row * GLYPH_SCALE + dy,
                            color,
                        );
                    }
                }
            }
        }
        cx += (GLYPH_WIDTH + 1) * GLYPH_SCALE;
    }
}

/// 替换框（非 ASCII 或控制字符）
const REPLACEMENT_GLYPH: [u8; 5] = [0x7F, 0x41, 0x41, 0x41, 0x7F];

fn glyph(ch: char) -> [u8; 5] {
    let code = ch as usize;
    if (0x20..=0x7E).contains(&code) {
        FONT_5X7[code - 0x20]
    } else {
        REPLACEMENT_GLYPH
    }
}

/// ASCII 0x20..=0x7E 的 5x7 字形，按列存储，低位在上
const FONT_5X7: [[u8; 5]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x00, 0x00, 0x5F, 0x00, 0x00], // '!'
    [0x00, 0x07, 0x00, 0x07, 0x00], // '"'
    [0x14, 0x7F, 0x14, 0x7F, 0x14], // '#'
    [0x24, 0x2A, 0x7F, 0x2A, 0x12], // '$'
    [0x23, 0x13, 0x08, 0x64, 0x62], // '%'
    [0x36, 0x49, 0x55, 0x22, 0x50], // '&'
    [0x00, 0x05, 0x03, 0x00, 0x00], // '\''
    [0x00, 0x1C, 0x22, 0x41, 0x00], // '('
    [0x00, 0x41, 0x22, 0x1C, 0x00], // ')'
    [0x14, 0x08, 0x3E, 0x08, 0x14], // '*'
    [0x08, 0x08, 0x3E, 0x08, 0x08], // '+'
    [0x00, 0x50, 0x30, 0x00, 0x00], // ','
    [0x08, 0x08, 0x08, 0x08, 0x08], // '-'
    [0x00, 0x60, 0x60, 0x00, 0x00], // '.'
    [0x20, 0x10, 0x08, 0x04, 0x02], // '/'
    [0x3E, 0x51, 0x49, 0x45, 0x3E], // '0'
    [0x00, 0x42, 0x7F, 0x40, 0x00], // '1'
    [0x42, 0x61, 0x51, 0x49, 0x46], // '2'
    [0x21, 0x41, 0x45, 0x4B, 0x31], // '3'
    [0x18, 0x14, 0x12, 0x7F, 0x10], // '4'
    [0x27, 0x45, 0x45, 0x45, 0x39], // '5'
    [0x3C, 0x4A, 0x49, 0x49, 0x30], // '6'
    [0x01, 0x71, 0x09, 0x05, 0x03], // '7'
    [0x36, 0x49, 0x49, 0x49, 0x36], // '8'
    [0x06, 0x49, 0x49, 0x29, 0x1E], // '9'
    [0x00, 0x36, 0x36, 0x00, 0x00], // ':'
    [0x00, 0x56, 0x36, 0x00, 0x00], // ';'
    [0x08, 0x14, 0x22, 0x41, 0x00], // '<'
    [0x14, 0x14, 0x14, 0x14, 0x14], // '='
    [0x00, 0x41, 0x22, 0x14, 0x08], // '>'
    [0x02, 0x01, 0x51, 0x09, 0x06], // '?'
    [0x32, 0x49, 0x79, 0x41, 0x3E], // '@'
    [0x7E, 0x11, 0x11, 0x11, 0x7E], // 'A'
    [0x7F, 0x49, 0x49, 0x49, 0x36], // 'B'
    [0x3E, 0x41, 0x41, 0x41, 0x22], // 'C'
    [0x7F, 0x41, 0x41, 0x22, 0x1C], // 'D'
    [0x7F, 0x49, 0x49, 0x49, 0x41], // 'E'
    [0x7F, 0x09, 0x09, 0x09, 0x01], // 'F'
    [0x3E, 0x41, 0x49, 0x49, 0x7A], // 'G'
    [0x7F, 0x08, 0x08, 0x08, 0x7F], // 'H'
    [0x00, 0x41, 0x7F, 0x41, 0x00], // 'I'
    [0x20, 0x40, 0x41, 0x3F, 0x01], // 'J'
    [0x7F, 0x08, 0x14, 0x22, 0x41], // 'K'
    [0x7F, 0x40, 0x40, 0x40, 0x40], // 'L'
    [0x7F, 0x02, 0x0C, 0x02, 0x7F], // 'M'
    [0x7F, 0x04, 0x08, 0x10, 0x7F], // 'N'
    [0x3E, 0x41, 0x41, 0x41, 0x3E], // 'O'
    [0x7F, 0x09, 0x09, 0x09, 0x06], // 'P'
    [0x3E, 0x41, 0x51, 0x21, 0x5E], // 'Q'
    [0x7F, 0x09, 0x19, 0x29, 0x46], // 'R'
    [0x46, 0x49, 0x49, 0x49, 0x31], // 'S'
    [0x01, 0x01, 0x7F, 0x01, 0x01], // 'T'
    [0x3F, 0x40, 0x40, 0x40, 0x3F], // 'U'
    [0x1F, 0x20, 0x40, 0x20, 0x1F], // 'V'
    [0x3F, 0x40, 0x38, 0x40, 0x3F], // 'W'
    [0x63, 0x14, 0x08, 0x14, 0x63], // 'X'
    [0x07, 0x08, 0x70, 0x08, 0x07], // 'Y'
    [0x61, 0x51, 0x49, 0x45, 0x43], // 'Z'
    [0x00, 0x7F, 0x41, 0x41, 0x00], // '['
    [0x02, 0x04, 0x08, 0x10, 0x20], // '\\'
    [0x00, 0x41, 0x41, 0x7F, 0x00], // ']'
    [0x04, 0x02, 0x01, 0x02, 0x04], // '^'
    [0x40, 0x40, 0x40, 0x40, 0x40], // '_'
    [0x00, 0x01, 0x02, 0x04, 0x00], // '`'
    [0x20, 0x54, 0x54, 0x54, 0x78], // 'a'
    [0x7F, 0x48, 0x44, 0x44, 0x38], // 'b'
    [0x38, 0x44, 0x44, 0x44, 0x20], // 'c'
    [0x38, 0x44, 0x44, 0x48, 0x7F], // 'd'
    [0x38, 0x54, 0x54, 0x54, 0x18], // 'e'
    [0x08, 0x7E, 0x09, 0x01, 0x02], // 'f'
    [0x0C, 0x52, 0x52, 0x52, 0x3E], // 'g'
    [0x7F, 0x08, 0x04, 0x04, 0x78], // 'h'
    [0x00, 0x44, 0x7D, 0x40, 0x00], // 'i'
    [0x20, 0x40, 0x44, 0x3D, 0x00], // 'j'
    [0x00, 0x7F, 0x10, 0x28, 0x44], // 'k'
    [0x00, 0x41, 0x7F, 0x40, 0x00], // 'l'
    [0x7C, 0x04, 0x18, 0x04, 0x78], // 'm'
    [0x7C, 0x08, 0x04, 0x04, 0x78], // 'n'
    [0x38, 0x44, 0x44, 0x44, 0x38], // 'o'
    [0x7C, 0x14, 0x14, 0x14, 0x08], // 'p'
    [0x08, 0x14, 0x14, 0x18, 0x7C], // 'q'
    [0x7C, 0x08, 0x04, 0x04, 0x08], // 'r'
    [0x48, 0x54, 0x54, 0x54, 0x20], // 's'
    [0x04, 0x3F, 0x44, 0x40, 0x20], // 't'
    [0x3C, 0x40, 0x40, 0x20, 0x7C], // 'u'
    [0x1C, 0x20, 0x40, 0x20, 0x1C], // 'v'
    [0x3C, 0x40, 0x30, 0x40, 0x3C], // 'w'
    [0x44, 0x28, 0x10, 0x28, 0x44], // 'x'
    [0x0C, 0x50, 0x50, 0x50, 0x3C], // 'y'
    [0x44, 0x64, 0x54, 0x4C, 0x44], // 'z'
    [0x00, 0x08, 0x36, 0x41, 0x00], // '{'
    [0x00, 0x00, 0x7F, 0x00, 0x00], // '|'
    [0x00, 0x41, 0x36, 0x08, 0x00], // '}'
    [0x08, 0x04, 0x08, 0x10, 0x08], // '~'
];
