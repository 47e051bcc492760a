//! 提示音：默认音频输出上的正弦音；没有输出设备时静默降级

use std::time::Duration;

use log::debug;
use rodio::{OutputStream, OutputStreamHandle, Source};

use crate::scanner::session::Alert;

/// 定长单声道正弦音源
struct BeepTone {
    frequency_hz: f32,
    sample_rate: u32,
    total_samples: usize,
    num_sample: usize,
}

impl BeepTone {
    fn new(frequency_hz: u32, duration_ms: u64) -> Self {
        let sample_rate = 44_100u32;
        Self {
            frequency_hz: frequency_hz as f32,
            sample_rate,
            total_samples: (sample_rate as u64 * duration_ms / 1000) as usize,
            num_sample: 0,
        }
    }
}

impl Iterator for BeepTone {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.num_sample >= self.total_samples {
            return None;
        }
        self.num_sample += 1;
        let t = self.num_sample as f32 / self.sample_rate as f32;
        // 低幅度防削波
        Some((2.0 * std::f32::consts::PI * self.frequency_hz * t).sin() * 0.15)
    }
}

impl Source for BeepTone {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_millis(
            self.total_samples as u64 * 1000 / self.sample_rate as u64,
        ))
    }
}

/// 默认音频输出上的提示音
pub struct Beeper {
    // 输出流一旦丢弃播放即停止，必须持有
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl Beeper {
    /// 没有可用输出设备时返回 None
    pub fn try_new() -> Option<Self> {
        let (stream, handle) = OutputStream::try_default().ok()?;
        Some(Self {
            _stream: stream,
            handle,
        })
    }
}

impl Alert for Beeper {
    fn beep(&self, frequency_hz: u32, duration_ms: u64) {
        if let Err(e) = self.handle.play_raw(BeepTone::new(frequency_hz, duration_ms)) {
            debug!("beep failed: {}", e);
        }
    }
}

/// 无提示音
pub struct SilentAlert;

impl Alert for SilentAlert {
    fn beep(&self, _frequency_hz: u32, _duration_ms: u64) {}
}

/// 按开关与主机能力选择实现；缺失音频能力时静默降级
pub fn create_alert(enabled: bool) -> Box<dyn Alert> {
    if !enabled {
        return Box::new(SilentAlert);
    }
    match Beeper::try_new() {
        Some(beeper) => Box::new(beeper),
        None => {
            debug!("no audio output available, beep disabled");
            Box::new(SilentAlert)
        }
    }
}
