//! 预览输出与终端控制输入
//!
//! 标注帧以 JPEG 写到固定路径，随便哪个图片查看器都能盯着看。
//! 控制命令从标准输入按行读取（`r`/`reset` 重置，`q`/`quit` 退出），
//! 由后台线程经通道转发，主循环每帧轮询一次。

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use log::{debug, warn};

use crate::core::error::ScanError;
use crate::core::frame::Frame;
use crate::scanner::session::{Command, FrameSink};

/// 预览 JPEG 质量
const PREVIEW_QUALITY: u8 = 80;
/// 默认预览文件名（相对运行目录）
pub const PREVIEW_FILE: &str = "preview.jpg";

pub struct PreviewSink {
    path: PathBuf,
    commands: Receiver<Command>,
    announced: bool,
}

impl PreviewSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("preview-input".to_string())
            .spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    let Ok(line) = line else { break };
                    let command = match line.trim().to_lowercase().as_str() {
                        "r" | "reset" => Command::Reset,
                        "q" | "quit" | "exit" => Command::Quit,
                        "" => continue,
                        other => {
                            debug!("ignoring input {:?}", other);
                            continue;
                        }
                    };
                    if tx.send(command).is_err() {
                        break;
                    }
                }
            });
        if let Err(e) = spawned {
            warn!("stdin reader unavailable: {}", e);
        }

        Self {
            path: path.into(),
            commands: rx,
            announced: false,
        }
    }
}

impl FrameSink for PreviewSink {
    fn show(&mut self, window: &str, frame: &Frame) -> Result<(), ScanError> {
        if !self.announced {
            self.announced = true;
            println!(
                "{}: preview at {} (r = reset, q = quit)",
                window,
                self.path.display()
            );
        }
        let jpeg = frame.to_jpeg(PREVIEW_QUALITY)?;
        std::fs::write(&self.path, jpeg)?;
        Ok(())
    }

    fn poll_command(&mut self) -> Option<Command> {
        self.commands.try_recv().ok()
    }
}
