//! 日志初始化
//!
//! 默认级别 info（详细模式为 debug），可通过 `RUST_LOG` 覆盖
//! 日志输出到 stderr，stdout 只留给 JSON 结果

use tracing_subscriber::EnvFilter;

/// 初始化全局日志订阅器，重复调用无副作用
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
