/// 日志模块
///
/// 基于 env_logger 的统一初始化入口，日志级别取自配置，
/// RUST_LOG 环境变量仍可覆盖
use std::io::Write;

use crate::utils::config::LoggingConfig;

/// 按配置初始化全局日志
///
/// 重复调用是安全的，后续调用仅返回错误日志而不会panic
pub fn init_logging(config: &LoggingConfig) {
    let level = match config.log_level.as_str() {
        "debug" => log::LevelFilter::Debug,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info,
    };

    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(level.to_string()),
    );

    builder.format(|buf, record| {
        writeln!(
            buf,
            "[{}] [{}] [{}] - {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        )
    });

    if !config.console_output {
        builder.filter_level(log::LevelFilter::Off);
    }

    if let Err(e) = builder.try_init() {
        log::debug!("日志系统已初始化，忽略重复初始化: {}", e);
    }
}
