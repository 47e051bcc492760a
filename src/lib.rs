pub mod core;
pub mod device;
pub mod scanner;

/// 初始化日志；debug 模式把默认过滤级别放开到 Debug
pub fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .try_init()
        .ok();
}
