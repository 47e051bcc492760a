use std::io::Cursor;
use std::time::Duration;

use image::ImageOutputFormat;

use crate::core::error::ScanError;

/// 帧数据结构
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>, // RGBA 格式
    pub timestamp: Duration,
    pub frame_number: u64,
}

impl Frame {
    pub fn new(
        width: u32,
        height: u32,
        data: Vec<u8>,
        timestamp_ms: u64,
        frame_number: u64,
    ) -> Self {
        Self {
            width,
            height,
            data,
            timestamp: Duration::from_millis(timestamp_ms),
            frame_number,
        }
    }

    pub fn pixel_count(&self) -> usize {
        (self.width * self.height) as usize
    }

    /// 灰度转换，供一维解码器按行扫描
    pub fn to_luma(&self) -> Vec<u8> {
        self.data
            .chunks_exact(4)
            .map(|rgba| {
                let r = rgba[0] as u32;
                let g = rgba[1] as u32;
                let b = rgba[2] as u32;
                ((r * 299 + g * 587 + b * 114) / 1000) as u8
            })
            .collect()
    }

    pub fn to_rgb(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.pixel_count() * 3);
        for chunk in self.data.chunks_exact(4) {
            rgb.push(chunk[0]); // R
            rgb.push(chunk[1]); // G
            rgb.push(chunk[2]); // B
        }
        rgb
    }

    /// JPEG 压缩（预览输出用）
    pub fn to_jpeg(&self, quality: u8) -> Result<Vec<u8>, ScanError> {
        let rgb = image::RgbImage::from_raw(self.width, self.height, self.to_rgb())
            .ok_or_else(|| ScanError::Decode("frame buffer size mismatch".to_string()))?;
        let mut cursor = Cursor::new(Vec::new());
        rgb.write_to(&mut cursor, ImageOutputFormat::Jpeg(quality))?;
        Ok(cursor.into_inner())
    }
}
