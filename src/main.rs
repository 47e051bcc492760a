use std::path::Path;

use clap::Parser;
use log::info;

use codescan::device::alert::create_alert;
use codescan::device::camera::{self, CameraSource};
use codescan::device::preview::{PreviewSink, PREVIEW_FILE};
use codescan::scanner::alias::{AliasTable, ALIAS_FILE};
use codescan::scanner::code128::Code128Decoder;
use codescan::scanner::pipeline::FrameScanner;
use codescan::scanner::scan_log::{ScanLog, SCAN_LOG_FILE};
use codescan::scanner::session::{ScanSession, SessionConfig};

/// 条码扫描器：摄像头取帧 → 解码/标注 → 会话去重 → 记录
#[derive(Parser)]
#[clap(name = "codescan")]
struct Args {
    /// 摄像头索引
    #[clap(default_value_t = 0)]
    camera: usize,

    /// 提示音开关：0 / false / no 关闭，其余取值或缺省开启
    beep: Option<String>,

    /// 每帧输出调试信息
    #[clap(short, long)]
    debug: bool,
}

fn beep_enabled(flag: Option<&str>) -> bool {
    match flag {
        Some(value) => !matches!(value.to_lowercase().as_str(), "0" | "false" | "no"),
        None => true,
    }
}

fn main() {
    let args = Args::parse();
    codescan::init_logging(args.debug);

    let aliases = AliasTable::load(Path::new(ALIAS_FILE));
    if !aliases.is_empty() {
        info!("loaded {} alias entries from {}", aliases.len(), ALIAS_FILE);
    }

    let device = match camera::open_device(args.camera) {
        Ok(device) => device,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };
    let mut source = match CameraSource::new(&device) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };
    let mut sink = PreviewSink::new(PREVIEW_FILE);

    let scanner = FrameScanner::new(Box::new(Code128Decoder::new()), aliases);
    let journal = ScanLog::new(SCAN_LOG_FILE);
    let alert = create_alert(beep_enabled(args.beep.as_deref()));
    let mut session = ScanSession::new(
        scanner,
        journal,
        alert,
        SessionConfig {
            debug: args.debug,
            ..Default::default()
        },
    );

    match session.run(&mut source, &mut sink) {
        Ok(stats) => info!(
            "session ended: {} frames, {} detections, {} novel",
            stats.frames, stats.detections, stats.novel
        ),
        Err(e) => eprintln!("scanner stopped: {}", e),
    }
}
