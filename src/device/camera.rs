//! V4L2 摄像头帧来源

use std::time::Instant;

use log::warn;
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;

use crate::core::error::ScanError;
use crate::core::frame::Frame;
use crate::scanner::session::FrameSource;

/// 打开摄像头设备；失败即整个会话不可启动
pub fn open_device(index: usize) -> Result<Device, ScanError> {
    Device::new(index)
        .map_err(|e| ScanError::SourceUnavailable(format!("camera {}: {}", index, e)))
}

/// 基于 mmap 采集流的帧来源。
/// 流借用设备，设备由调用方持有到会话结束。
pub struct CameraSource<'a> {
    stream: v4l::io::mmap::Stream<'a>,
    started: Instant,
    frame_number: u64,
}

impl<'a> CameraSource<'a> {
    pub fn new(device: &'a Device) -> Result<Self, ScanError> {
        let stream = v4l::io::mmap::Stream::new(device, Type::VideoCapture)
            .map_err(|e| ScanError::SourceUnavailable(format!("capture stream: {}", e)))?;
        Ok(Self {
            stream,
            started: Instant::now(),
            frame_number: 0,
        })
    }
}

impl FrameSource for CameraSource<'_> {
    fn read(&mut self) -> Result<Option<Frame>, ScanError> {
        let (data, _meta) = match self.stream.next() {
            Ok(buffer) => buffer,
            Err(e) => {
                // 采集流中断按流结束处理
                warn!("camera read failed: {}", e);
                return Ok(None);
            }
        };

        // 采集缓冲按压缩帧（MJPG）解码；坏帧报 Decode 由会话跳过
        let image = image::load_from_memory(data)?;
        let rgba = image.to_rgba8();

        self.frame_number += 1;
        Ok(Some(Frame::new(
            rgba.width(),
            rgba.height(),
            rgba.into_raw(),
            self.started.elapsed().as_millis() as u64,
            self.frame_number,
        )))
    }
}
