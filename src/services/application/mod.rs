/// 应用服务层：数据导入与导出编排

pub mod data_import_service;
pub mod excel_export_service;

pub use data_import_service::{DataImportService, ImportResult};
pub use excel_export_service::ExcelExportService;
