//! 批处理程序依赖的通用组件.

use std::io::Write;

pub mod loader;

const SEP: &str = "--------------------------------------------------------";

/// 日志级别环境变量.
pub const LOG_ENV: &str = "PROSTATE_LOG";

/// 简单分隔线.
#[inline]
pub fn sep() {
    println!("{SEP}");
}

/// 简单分隔线.
#[inline]
pub fn sep_to<W: Write>(mut w: W) -> std::io::Result<()> {
    writeln!(&mut w, "{SEP}")
}

/// 获得可并行核心数.
pub fn cpus() -> usize {
    std::thread::available_parallelism().map_or_else(|_| num_cpus::get(), usize::from)
}

/// 解析日志级别. 无法识别时返回 `Info`.
pub fn parse_level(s: &str) -> log::LevelFilter {
    s.parse().unwrap_or(log::LevelFilter::Info)
}

/// 初始化日志.
///
/// 默认级别为 `Info`, 可由环境变量 `$PROSTATE_LOG` 覆盖 (如 `debug`, `warn`).
pub fn init_logger() {
    let level = std::env::var(LOG_ENV).map_or(log::LevelFilter::Info, |s| parse_level(&s));
    // 重复初始化时忽略错误.
    let _ = simple_logger::SimpleLogger::new().with_level(level).init();
}
