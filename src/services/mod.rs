/// 服务层模块
///
/// 分为三层：
/// - application: 导入/导出等用例编排
/// - domain: 图表、仿真、分析等领域逻辑
/// - infrastructure: 表格文件处理与持久化实现

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod traits;

pub use application::{DataImportService, ExcelExportService, ImportResult};
pub use domain::{CircuitSimulator, MeasurementSummary};
pub use infrastructure::excel::SheetReader;
pub use infrastructure::persistence::SqliteOrmPersistenceService;
pub use traits::{BaseService, PersistenceService};
