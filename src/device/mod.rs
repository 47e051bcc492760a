//! 外部设备实现：摄像头、预览输出、提示音

pub mod alert;
pub mod camera;
pub mod preview;

pub use alert::{create_alert, Beeper, SilentAlert};
pub use camera::{open_device, CameraSource};
pub use preview::{PreviewSink, PREVIEW_FILE};
