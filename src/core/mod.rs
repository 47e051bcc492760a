pub mod error;
pub mod frame;

pub use error::ScanError;
pub use frame::Frame;
