/// 数据导入服务
///
/// 负责把上传的表格文件导入数据库：
/// 解析 → 字段归一化 → 创建一条实验父记录 + N条测量子记录
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use log::{info, warn};
use serde_json::json;

use crate::models::enums::{ExperimentStatus, ExperimentType};
use crate::models::structs::{ExperimentInfo, ParsedSheet};
use crate::services::infrastructure::excel::{field_mapper, SheetReader};
use crate::services::traits::PersistenceService;
use crate::utils::error::{AppError, AppResult};
use crate::utils::time_utils;

/// 数据导入结果
#[derive(Debug, Clone, serde::Serialize)]
pub struct ImportResult {
    pub experiment_id: String,
    pub total_rows: usize,
    pub successful_imports: usize,
    pub failed_imports: usize,
    pub errors: Vec<String>,
}

impl ImportResult {
    pub fn is_successful(&self) -> bool {
        self.failed_imports == 0 && self.successful_imports > 0
    }

    pub fn success_rate(&self) -> f32 {
        if self.total_rows == 0 {
            0.0
        } else {
            (self.successful_imports as f32 / self.total_rows as f32) * 100.0
        }
    }
}

/// 数据导入服务
pub struct DataImportService {
    persistence: Arc<dyn PersistenceService>,
}

impl DataImportService {
    /// 创建新的数据导入服务实例
    pub fn new(persistence: Arc<dyn PersistenceService>) -> Self {
        Self { persistence }
    }

    /// 从磁盘文件导入
    pub async fn import_from_file(
        &self,
        file_path: &Path,
        operator: Option<String>,
    ) -> AppResult<ImportResult> {
        if !file_path.exists() {
            return Err(AppError::validation_error(format!(
                "文件不存在: {}",
                file_path.display()
            )));
        }

        let bytes = tokio::fs::read(file_path).await.map_err(|e| {
            AppError::io_error(
                format!("读取文件失败: {}", file_path.display()),
                e.kind().to_string(),
            )
        })?;

        let source_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.display().to_string());
        self.import_bytes(&bytes, &source_name, operator).await
    }

    /// 从内存字节导入（上传场景）
    pub async fn import_bytes(
        &self,
        bytes: &[u8],
        source_name: &str,
        operator: Option<String>,
    ) -> AppResult<ImportResult> {
        info!("开始导入表格数据: {}", source_name);

        // 1. 解析表格
        let sheet = SheetReader::parse_bytes(bytes)?;

        // 2. 字段归一化
        let measurements = field_mapper::to_canonical_measurements(&sheet);

        if let Some(metadata) = &sheet.metadata {
            if let Some(declared) = metadata.data_points {
                if declared as usize != measurements.len() {
                    warn!(
                        "元信息声明{}个数据点，实际解析出{}个",
                        declared,
                        measurements.len()
                    );
                }
            }
        }

        // 3. 创建实验父记录
        let experiment = Self::build_experiment(&sheet, source_name, operator);
        self.persistence.save_experiment(&experiment).await?;

        // 4. 批量写入测量子记录
        self.persistence
            .save_measurements(&experiment.experiment_id, &measurements)
            .await?;

        let result = ImportResult {
            experiment_id: experiment.experiment_id.clone(),
            total_rows: sheet.row_count(),
            successful_imports: measurements.len(),
            failed_imports: sheet.row_count().saturating_sub(measurements.len()),
            errors: Vec::new(),
        };

        info!(
            "数据导入完成: 实验 {}，总计{}行，成功{}行，成功率{:.1}%",
            result.experiment_id,
            result.total_rows,
            result.successful_imports,
            result.success_rate()
        );
        Ok(result)
    }

    /// 由解析结果构造实验父记录
    ///
    /// 实验类型固定为正常工况（导入即已完成的历史数据），
    /// 开始时间优先取元信息里的记录时间
    fn build_experiment(
        sheet: &ParsedSheet,
        source_name: &str,
        operator: Option<String>,
    ) -> ExperimentInfo {
        let now = Utc::now();
        let mut experiment = ExperimentInfo::new(
            ExperimentType::NormalOperation,
            Some(format!(
                "导入数据 - {}",
                time_utils::format_bj(now, "%Y-%m-%d")
            )),
        );
        experiment.status = ExperimentStatus::Completed;
        experiment.operator_name = operator;
        experiment.end_time = Some(now);
        experiment.notes = Some(format!("导入自 {}", source_name));

        if let Some(metadata) = &sheet.metadata {
            experiment.test_parameters = serde_json::to_value(metadata).ok();
            if let Some(record_time) = metadata
                .record_time
                .as_deref()
                .and_then(time_utils::parse_timestamp_str)
            {
                experiment.start_time = record_time;
            }
        } else {
            experiment.test_parameters = Some(json!({}));
        }

        experiment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::infrastructure::persistence::SqliteOrmPersistenceService;

    async fn service() -> DataImportService {
        let persistence = SqliteOrmPersistenceService::new(None).await.expect("建库失败");
        DataImportService::new(Arc::new(persistence))
    }

    fn csv_with_metadata() -> &'static str {
        // 第二行带元信息标记，表头在第四行
        "实验数据导出\n\
         记录时间: 2025-06-01 10:00:00,设备地址: 3,设备类型: RSD-1000,数据点数: 2\n\
         \n\
         序号,电流 (A),电压 (V),功率 (W)\n\
         1,0.52,20.1,10.45\n\
         2,0.55,20.3,11.17\n"
    }

    #[tokio::test]
    async fn test_import_creates_parent_and_children() {
        let import_service = service().await;
        let persistence = Arc::clone(&import_service.persistence);

        let result = import_service
            .import_bytes(csv_with_metadata().as_bytes(), "export.csv", Some("张三".into()))
            .await
            .expect("导入失败");

        assert_eq!(result.total_rows, 2);
        assert_eq!(result.successful_imports, 2);
        assert!(result.is_successful());

        let experiment = persistence
            .load_experiment(&result.experiment_id)
            .await
            .unwrap()
            .expect("父记录应存在");
        assert_eq!(experiment.status, ExperimentStatus::Completed);
        assert_eq!(experiment.operator_name.as_deref(), Some("张三"));
        // 开始时间来自元信息记录时间
        assert_eq!(
            experiment.start_time.to_rfc3339(),
            "2025-06-01T10:00:00+00:00"
        );

        let measurements = persistence
            .load_measurements_by_experiment(&result.experiment_id)
            .await
            .unwrap();
        assert_eq!(measurements.len(), 2);
        assert_eq!(measurements[0].sequence_number, 1);
        assert_eq!(measurements[0].current_a, 0.52);
        assert_eq!(measurements[1].voltage_v, 20.3);
    }

    #[tokio::test]
    async fn test_import_rejects_undecodable_bytes() {
        let import_service = service().await;
        let err = import_service
            .import_bytes(&[0x00, 0xFF, 0xFE, 0x80], "broken.bin", None)
            .await
            .unwrap_err();
        assert!(err.is_parse_failure());
    }

    #[tokio::test]
    async fn test_import_header_only_sheet_creates_empty_experiment() {
        let import_service = service().await;
        let persistence = Arc::clone(&import_service.persistence);

        let result = import_service
            .import_bytes("序号,电压 (V)\n".as_bytes(), "empty.csv", None)
            .await
            .expect("表头存在时不应报错");

        assert_eq!(result.total_rows, 0);
        assert_eq!(
            persistence
                .count_measurements(&result.experiment_id)
                .await
                .unwrap(),
            0
        );
    }
}
