use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::utils::error::{AppError, AppResult};

/// 应用程序主配置结构
/// 包含应用程序运行所需的所有配置信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 应用程序基本设置
    pub app_settings: AppSettings,
    /// 数据导入配置
    pub import_config: ImportConfig,
    /// 仿真配置
    pub simulation_config: SimulationConfig,
    /// 日志配置
    pub logging_config: LoggingConfig,
    /// 数据存储配置
    pub persistence_config: PersistenceConfig,
}

/// 应用程序基本设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// 应用程序名称
    pub app_name: String,
    /// 应用程序版本
    pub app_version: String,
    /// 运行环境 (development, testing, production)
    pub environment: String,
    /// 是否启用调试模式
    pub debug_mode: bool,
    /// 工作目录
    pub work_directory: Option<PathBuf>,
}

/// 数据导入配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// 允许的上传文件扩展名
    pub accepted_extensions: Vec<String>,
    /// 单个文件最大行数（超出仅告警，不截断）
    pub max_rows_warning: usize,
    /// 默认操作员名称（命令行未指定时使用）
    pub default_operator: Option<String>,
}

/// 仿真配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// 仿真总时长（秒）
    pub duration_s: f64,
    /// 仿真步长（秒）
    pub step_s: f64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别 (debug, info, warn, error)
    pub log_level: String,
    /// 是否启用控制台输出
    pub console_output: bool,
}

/// 数据持久化配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// SQLite数据库文件路径
    pub database_path: PathBuf,
    /// 导出文件输出目录
    pub export_directory: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_settings: AppSettings::default(),
            import_config: ImportConfig::default(),
            simulation_config: SimulationConfig::default(),
            logging_config: LoggingConfig::default(),
            persistence_config: PersistenceConfig::default(),
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            app_name: "PvTestSystem".to_string(),
            app_version: "1.0.0".to_string(),
            environment: "development".to_string(),
            debug_mode: true,
            work_directory: None,
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            accepted_extensions: vec![
                "xlsx".to_string(),
                "xls".to_string(),
                "csv".to_string(),
            ],
            max_rows_warning: 50_000,
            default_operator: None,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            duration_s: 10.0,
            step_s: 0.1,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            console_output: true,
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("pv_test_data.sqlite"),
            export_directory: PathBuf::from("exports"),
        }
    }
}

/// 配置管理器
/// 负责加载、保存和管理应用程序配置
pub struct ConfigManager {
    config: AppConfig,
    config_file_path: PathBuf,
}

impl ConfigManager {
    /// 创建新的配置管理器
    pub fn new(config_file_path: PathBuf) -> Self {
        Self {
            config: AppConfig::default(),
            config_file_path,
        }
    }

    /// 从文件加载配置
    pub async fn load_from_file(&mut self) -> AppResult<()> {
        if !self.config_file_path.exists() {
            // 如果配置文件不存在，创建默认配置文件
            self.save_to_file().await?;
            return Ok(());
        }

        let content = tokio::fs::read_to_string(&self.config_file_path)
            .await
            .map_err(|e| {
                AppError::io_error(format!("读取配置文件失败: {}", e), e.kind().to_string())
            })?;

        self.config = serde_json::from_str(&content)
            .map_err(|e| AppError::configuration_error(format!("解析配置文件失败: {}", e)))?;

        Ok(())
    }

    /// 将配置保存到文件
    pub async fn save_to_file(&self) -> AppResult<()> {
        // 确保目录存在
        if let Some(parent) = self.config_file_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    AppError::io_error(format!("创建配置目录失败: {}", e), e.kind().to_string())
                })?;
            }
        }

        let content = serde_json::to_string_pretty(&self.config)
            .map_err(|e| AppError::serialization_error(format!("序列化配置失败: {}", e)))?;

        tokio::fs::write(&self.config_file_path, content)
            .await
            .map_err(|e| {
                AppError::io_error(format!("写入配置文件失败: {}", e), e.kind().to_string())
            })?;

        Ok(())
    }

    /// 从环境变量覆盖配置
    pub fn override_from_env(&mut self) {
        // 应用程序设置
        if let Ok(env) = std::env::var("APP_ENVIRONMENT") {
            self.config.app_settings.environment = env;
        }
        if let Ok(debug) = std::env::var("DEBUG_MODE") {
            self.config.app_settings.debug_mode = debug.to_lowercase() == "true";
        }
        if let Ok(log_level) = std::env::var("LOG_LEVEL") {
            self.config.logging_config.log_level = log_level;
        }

        // 数据路径
        if let Ok(db_path) = std::env::var("DATABASE_PATH") {
            self.config.persistence_config.database_path = PathBuf::from(db_path);
        }
        if let Ok(export_dir) = std::env::var("EXPORT_DIRECTORY") {
            self.config.persistence_config.export_directory = PathBuf::from(export_dir);
        }

        // 导入设置
        if let Ok(operator) = std::env::var("DEFAULT_OPERATOR") {
            self.config.import_config.default_operator = Some(operator);
        }
    }

    /// 获取配置的只读引用
    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    /// 获取配置的可变引用
    pub fn get_config_mut(&mut self) -> &mut AppConfig {
        &mut self.config
    }

    /// 验证配置的有效性
    pub fn validate_config(&self) -> AppResult<()> {
        // 验证环境配置
        let valid_environments = ["development", "testing", "production"];
        if !valid_environments.contains(&self.config.app_settings.environment.as_str()) {
            return Err(AppError::configuration_error(format!(
                "无效的环境配置: {}，有效值: {:?}",
                self.config.app_settings.environment, valid_environments
            )));
        }

        // 验证日志级别
        let valid_log_levels = ["debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.config.logging_config.log_level.as_str()) {
            return Err(AppError::configuration_error(format!(
                "无效的日志级别: {}，有效值: {:?}",
                self.config.logging_config.log_level, valid_log_levels
            )));
        }

        // 验证仿真配置
        if self.config.simulation_config.step_s <= 0.0
            || self.config.simulation_config.duration_s <= 0.0
        {
            return Err(AppError::configuration_error(
                "仿真时长和步长必须大于0",
            ));
        }

        Ok(())
    }

    /// 重置为默认配置
    pub fn reset_to_default(&mut self) {
        self.config = AppConfig::default();
    }
}

/// 全局配置管理器实例
use std::sync::Mutex;
use std::sync::OnceLock;

static GLOBAL_CONFIG: OnceLock<Mutex<ConfigManager>> = OnceLock::new();

/// 初始化全局配置管理器
pub async fn init_global_config(config_path: Option<PathBuf>) -> AppResult<()> {
    let config_path = config_path.unwrap_or_else(|| PathBuf::from("config/app_config.json"));
    let mut config_manager = ConfigManager::new(config_path);

    // 从文件加载配置
    config_manager.load_from_file().await?;

    // 从环境变量覆盖配置
    config_manager.override_from_env();

    // 验证配置
    config_manager.validate_config()?;

    // 设置全局配置
    GLOBAL_CONFIG
        .set(Mutex::new(config_manager))
        .map_err(|_| AppError::configuration_error("全局配置已经初始化"))?;

    Ok(())
}

/// 获取全局配置的只读访问
pub fn get_global_config() -> AppResult<AppConfig> {
    let config_manager = GLOBAL_CONFIG
        .get()
        .ok_or_else(|| AppError::configuration_error("全局配置未初始化"))?
        .lock()
        .map_err(|_| AppError::concurrency_error("获取全局配置锁失败"))?;

    Ok(config_manager.get_config().clone())
}
