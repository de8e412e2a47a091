/// 工具模块，包含错误处理、配置管理等通用功能

/// 统一错误处理模块
pub mod error;

/// 配置管理模块
pub mod config;

/// 时间工具模块（UTC ↔ 北京时间转换、时间戳解析）
pub mod time_utils;

// 重新导出常用类型，方便使用
pub use config::{
    get_global_config, init_global_config, AppConfig, AppSettings, ConfigManager, ImportConfig,
    LoggingConfig, PersistenceConfig, SimulationConfig,
};
pub use error::{AppError, AppResult};
