//! Code 128 一维解码
//!
//! 按行采样灰度图：二值化 → 游程编码 → 11 模块符号匹配 → 校验和。
//! 多行命中同一载荷时合并为一个符号并给出包围盒。

use crate::core::error::ScanError;
use crate::core::frame::Frame;

use super::decoder::SymbolDecoder;
use super::symbol::{BoundingBox, Symbol, SymbolKind};

/// 代码值 0..=106 的模块宽度表（3 条 3 空，共 11 模块）
const PATTERNS: [[u8; 6]; 107] = [
    [2, 1, 2, 2, 2, 2],
    [2, 2, 2, 1, 2, 2],
    [2, 2, 2, 2, 2, 1],
    [1, 2, 1, 2, 2, 3],
    [1, 2, 1, 3, 2, 2],
    [1, 3, 1, 2, 2, 2],
    [1, 2, 2, 2, 1, 3],
    [1, 2, 2, 3, 1, 2],
    [1, 3, 2, 2, 1, 2],
    [2, 2, 1, 2, 1, 3],
    [2, 2, 1, 3, 1, 2],
    [2, 3, 1, 2, 1, 2],
    [1, 1, 2, 2, 3, 2],
    [1, 2, 2, 1, 3, 2],
    [1, 2, 2, 2, 3, 1],
    [1, 1, 3, 2, 2, 2],
    [1, 2, 3, 1, 2, 2],
    [1, 2, 3, 2, 2, 1],
    [2, 2, 3, 2, 1, 1],
    [2, 2, 1, 1, 3, 2],
    [2, 2, 1, 2, 3, 1],
    [2, 1, 3, 2, 1, 2],
    [2, 2, 3, 1, 1, 2],
    [3, 1, 2, 1, 3, 1],
    [3, 1, 1, 2, 2, 2],
    [3, 2, 1, 1, 2, 2],
    [3, 2, 1, 2, 2, 1],
    [3, 1, 2, 2, 1, 2],
    [3, 2, 2, 1, 1, 2],
    [3, 2, 2, 2, 1, 1],
    [2, 1, 2, 1, 2, 3],
    [2, 1, 2, 3, 2, 1],
    [2, 3, 2, 1, 2, 1],
    [1, 1, 1, 3, 2, 3],
    [1, 3, 1, 1, 2, 3],
    [1, 3, 1, 3, 2, 1],
    [1, 1, 2, 3, 1, 3],
    [1, 3, 2, 1, 1, 3],
    [1, 3, 2, 3, 1, 1],
    [2, 1, 1, 3, 1, 3],
    [2, 3, 1, 1, 1, 3],
    [2, 3, 1, 3, 1, 1],
    [1, 1, 2, 1, 3, 3],
    [1, 1, 2, 3, 3, 1],
    [1, 3, 2, 1, 3, 1],
    [1, 1, 3, 1, 2, 3],
    [1, 1, 3, 3, 2, 1],
    [1, 3, 3, 1, 2, 1],
    [3, 1, 3, 1, 2, 1],
    [2, 1, 1, 3, 3, 1],
    [2, 3, 1, 1, 3, 1],
    [2, 1, 3, 1, 1, 3],
    [2, 1, 3, 3, 1, 1],
    [2, 1, 3, 1, 3, 1],
    [3, 1, 1, 1, 2, 3],
    [3, 1, 1, 3, 2, 1],
    [3, 3, 1, 1, 2, 1],
    [3, 1, 2, 1, 1, 3],
    [3, 1, 2, 3, 1, 1],
    [3, 3, 2, 1, 1, 1],
    [3, 1, 4, 1, 1, 1],
    [2, 2, 1, 4, 1, 1],
    [4, 3, 1, 1, 1, 1],
    [1, 1, 1, 2, 2, 4],
    [1, 1, 1, 4, 2, 2],
    [1, 2, 1, 1, 2, 4],
    [1, 2, 1, 4, 2, 1],
    [1, 4, 1, 1, 2, 2],
    [1, 4, 1, 2, 2, 1],
    [1, 1, 2, 2, 1, 4],
    [1, 1, 2, 4, 1, 2],
    [1, 2, 2, 1, 1, 4],
    [1, 2, 2, 4, 1, 1],
    [1, 4, 2, 1, 1, 2],
    [1, 4, 2, 2, 1, 1],
    [2, 4, 1, 2, 1, 1],
    [2, 2, 1, 1, 1, 4],
    [4, 1, 3, 1, 1, 1],
    [2, 4, 1, 1, 1, 2],
    [1, 3, 4, 1, 1, 1],
    [1, 1, 1, 2, 4, 2],
    [1, 2, 1, 1, 4, 2],
    [1, 2, 1, 2, 4, 1],
    [1, 1, 4, 2, 1, 2],
    [1, 2, 4, 1, 1, 2],
    [1, 2, 4, 2, 1, 1],
    [4, 1, 1, 2, 1, 2],
    [4, 2, 1, 1, 1, 2],
    [4, 2, 1, 2, 1, 1],
    [2, 1, 2, 1, 4, 1],
    [2, 1, 4, 1, 2, 1],
    [4, 1, 2, 1, 2, 1],
    [1, 1, 1, 1, 4, 3],
    [1, 1, 1, 3, 4, 1],
    [1, 3, 1, 1, 4, 1],
    [1, 1, 4, 1, 1, 3],
    [1, 1, 4, 3, 1, 1],
    [4, 1, 1, 1, 1, 3],
    [4, 1, 1, 3, 1, 1],
    [1, 1, 3, 1, 4, 1],
    [1, 1, 4, 1, 3, 1],
    [3, 1, 1, 1, 4, 1],
    [4, 1, 1, 1, 3, 1],
    [2, 1, 1, 4, 1, 2],
    [2, 1, 1, 2, 1, 4],
    [2, 1, 1, 2, 3, 2],
    [2, 3, 3, 1, 1, 1],
];

const START_A: usize = 103;
const START_B: usize = 104;
const START_C: usize = 105;

/// 终止图案：4 条 3 空共 13 模块（含 2 模块终止条）
const STOP_PATTERN: [u8; 7] = [2, 3, 3, 1, 1, 1, 2];

/// 行内符号数量上限，超出视为噪声
const MAX_SYMBOLS_PER_ROW: usize = 64;

#[derive(Debug, Clone, Copy)]
struct Run {
    dark: bool,
    start: usize,
    len: usize,
}

#[derive(Debug, Clone)]
struct RowHit {
    payload: String,
    x_start: usize,
    x_end: usize,
    y: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeSet {
    A,
    B,
    C,
}

pub struct Code128Decoder {
    /// 采样行间隔（像素）
    row_step: u32,
    /// 行内最小明暗差，低于该值认为无条码
    min_contrast: u8,
}

impl Code128Decoder {
    pub fn new() -> Self {
        Self {
            row_step: 8,
            min_contrast: 48,
        }
    }

    pub fn with_row_step(row_step: u32) -> Self {
        Self {
            row_step: row_step.max(1),
            min_contrast: 48,
        }
    }

    fn decode_row(&self, row: &[u8], y: usize) -> Option<RowHit> {
        let mut min = u8::MAX;
        let mut max = u8::MIN;
        for &v in row {
            min = min.min(v);
            max = max.max(v);
        }
        if max.saturating_sub(min) < self.min_contrast {
            return None;
        }
        let threshold = min + (max - min) / 2;
        let runs = runs_of(row, threshold);

        let mut i = 0;
        while i + 7 <= runs.len() {
            if runs[i].dark {
                if let Some((payload, x_start, x_end)) = try_decode_at(&runs, i) {
                    return Some(RowHit {
                        payload,
                        x_start,
                        x_end,
                        y,
                    });
                }
            }
            i += 1;
        }
        None
    }
}

impl Default for Code128Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolDecoder for Code128Decoder {
    fn decode(&self, frame: &Frame) -> Result<Vec<Symbol>, ScanError> {
        let width = frame.width as usize;
        let height = frame.height as usize;
        if frame.data.len() != width * height * 4 {
            return Err(ScanError::Decode("frame buffer size mismatch".to_string()));
        }

        let luma = frame.to_luma();
        let mut hits = Vec::new();
        let mut y = 0usize;
        while y < height {
            let row = &luma[y * width..(y + 1) * width];
            if let Some(hit) = self.decode_row(row, y) {
                hits.push(hit);
            }
            y += self.row_step as usize;
        }
        Ok(merge_hits(hits))
    }
}

fn runs_of(row: &[u8], threshold: u8) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for (x, &v) in row.iter().enumerate() {
        let dark = v < threshold;
        match runs.last_mut() {
            Some(run) if run.dark == dark => run.len += 1,
            _ => runs.push(Run {
                dark,
                start: x,
                len: 1,
            }),
        }
    }
    runs
}

/// 6 游程归一化到 11 模块并查表
fn classify(runs: &[Run]) -> Option<usize> {
    debug_assert_eq!(runs.len(), 6);
    let total: usize = runs.iter().map(|r| r.len).sum();
    if total < 11 {
        return None;
    }
    let mut widths = [0u8; 6];
    let mut sum = 0u32;
    for (i, run) in runs.iter().enumerate() {
        let w = (run.len * 11 + total / 2) / total;
        if !(1..=4).contains(&w) {
            return None;
        }
        widths[i] = w as u8;
        sum += w as u32;
    }
    if sum != 11 {
        return None;
    }
    PATTERNS.iter().position(|p| *p == widths)
}

/// 7 游程归一化到 13 模块并比对终止图案
fn is_stop(runs: &[Run]) -> bool {
    debug_assert_eq!(runs.len(), 7);
    if !runs[0].dark {
        return false;
    }
    let total: usize = runs.iter().map(|r| r.len).sum();
    if total < 13 {
        return false;
    }
    for (i, run) in runs.iter().enumerate() {
        let w = (run.len * 13 + total / 2) / total;
        if w != STOP_PATTERN[i] as usize {
            return false;
        }
    }
    true
}

fn try_decode_at(runs: &[Run], start_idx: usize) -> Option<(String, usize, usize)> {
    let start_code = classify(&runs[start_idx..start_idx + 6])?;
    if !matches!(start_code, START_A | START_B | START_C) {
        return None;
    }

    // 起始符左侧需要静区
    let symbol_width: usize = runs[start_idx..start_idx + 6].iter().map(|r| r.len).sum();
    if start_idx > 0 && runs[start_idx - 1].len * 2 < symbol_width {
        return None;
    }

    let mut codes = vec![start_code];
    let mut idx = start_idx + 6;
    loop {
        if idx + 7 <= runs.len() && is_stop(&runs[idx..idx + 7]) {
            // 倒数第一个符号是校验和
            if codes.len() < 3 {
                return None;
            }
            let check = codes[codes.len() - 1];
            let data = &codes[..codes.len() - 1];
            let mut sum = data[0];
            for (i, &code) in data.iter().enumerate().skip(1) {
                sum += i * code;
            }
            if sum % 103 != check {
                return None;
            }
            let payload = translate(data)?;
            if payload.is_empty() {
                return None;
            }
            let last = &runs[idx + 6];
            return Some((payload, runs[start_idx].start, last.start + last.len));
        }
        if idx + 6 > runs.len() || codes.len() > MAX_SYMBOLS_PER_ROW {
            return None;
        }
        codes.push(classify(&runs[idx..idx + 6])?);
        idx += 6;
    }
}

/// 代码值序列（含起始符，不含校验和）转文本。
/// FNC 等非字符代码以替换字符表示。
fn translate(data: &[usize]) -> Option<String> {
    let mut set = match data[0] {
        START_A => CodeSet::A,
        START_B => CodeSet::B,
        START_C => CodeSet::C,
        _ => return None,
    };
    let mut shift: Option<CodeSet> = None;
    let mut out = String::new();

    for &code in &data[1..] {
        let active = shift.take().unwrap_or(set);
        match active {
            CodeSet::C => match code {
                0..=99 => {
                    out.push((b'0' + (code / 10) as u8) as char);
                    out.push((b'0' + (code % 10) as u8) as char);
                }
                100 => set = CodeSet::B,
                101 => set = CodeSet::A,
                102 => out.push('\u{FFFD}'), // FNC1
                _ => return None,
            },
            CodeSet::B => match code {
                0..=95 => out.push((32 + code as u8) as char),
                98 => shift = Some(CodeSet::A),
                99 => set = CodeSet::C,
                101 => set = CodeSet::A,
                96 | 97 | 100 | 102 => out.push('\u{FFFD}'), // FNC3/FNC2/FNC4/FNC1
                _ => return None,
            },
            CodeSet::A => match code {
                0..=63 => out.push((32 + code as u8) as char),
                64..=95 => out.push((code as u8 - 64) as char),
                98 => shift = Some(CodeSet::B),
                99 => set = CodeSet::C,
                100 => set = CodeSet::B,
                96 | 97 | 101 | 102 => out.push('\u{FFFD}'),
                _ => return None,
            },
        }
    }
    Some(out)
}

/// 相邻行的同载荷命中合并为一个符号
fn merge_hits(hits: Vec<RowHit>) -> Vec<Symbol> {
    struct Group {
        payload: String,
        min_x: usize,
        max_x: usize,
        min_y: usize,
        max_y: usize,
    }

    let mut groups: Vec<Group> = Vec::new();
    for hit in hits {
        match groups.iter_mut().find(|g| g.payload == hit.payload) {
            Some(group) => {
                group.min_x = group.min_x.min(hit.x_start);
                group.max_x = group.max_x.max(hit.x_end);
                group.min_y = group.min_y.min(hit.y);
                group.max_y = group.max_y.max(hit.y);
            }
            None => groups.push(Group {
                payload: hit.payload,
                min_x: hit.x_start,
                max_x: hit.x_end,
                min_y: hit.y,
                max_y: hit.y,
            }),
        }
    }

    groups
        .into_iter()
        .map(|g| {
            let rect = BoundingBox::new(
                g.min_x as i32,
                g.min_y as i32,
                (g.max_x - g.min_x) as u32,
                (g.max_y - g.min_y + 1) as u32,
            );
            Symbol::new(SymbolKind::Code128, g.payload, rect)
        })
        .collect()
}
