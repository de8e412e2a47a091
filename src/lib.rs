/// 光伏快速关断器测试数据后端核心库
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod utils;

// 重新导出常用类型，方便使用
pub use models::*;
pub use services::{
    BaseService, CircuitSimulator, DataImportService, ExcelExportService, ImportResult,
    PersistenceService, SheetReader, SqliteOrmPersistenceService,
};
pub use utils::{AppConfig, AppError, AppResult};
