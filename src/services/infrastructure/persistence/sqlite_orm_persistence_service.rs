// 使用SeaORM和SQLite实现数据持久化服务

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Schema,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::models::entities;
use crate::models::structs::{CanonicalMeasurement, ExperimentInfo};
use crate::services::traits::{BaseService, PersistenceService};
use crate::utils::error::{AppError, AppResult};

/// 数据库URL前缀
const SQLITE_URL_PREFIX: &str = "sqlite://";
/// 内存数据库URL（测试用）
const SQLITE_MEMORY_URL: &str = "sqlite::memory:";
/// 批量插入的分批大小，受SQLite绑定变量数上限约束
const INSERT_BATCH_SIZE: usize = 500;

/// 基于SeaORM和SQLite的持久化服务实现
pub struct SqliteOrmPersistenceService {
    db_conn: Arc<DatabaseConnection>, // 使用Arc以便在多处共享连接
    db_file_path: Option<PathBuf>,
}

impl SqliteOrmPersistenceService {
    /// 创建新的 SqliteOrmPersistenceService 实例
    ///
    /// # Arguments
    ///
    /// * `db_path_opt` - SQLite数据库文件路径。为None时使用内存数据库
    pub async fn new(db_path_opt: Option<&Path>) -> AppResult<Self> {
        let (db_url, db_file_path) = match db_path_opt {
            Some(path) => {
                // 确保数据库文件的父目录存在
                if let Some(parent_dir) = path.parent() {
                    if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
                        tokio::fs::create_dir_all(parent_dir).await.map_err(|e| {
                            AppError::io_error(
                                format!("创建数据库目录失败: {:?}", parent_dir),
                                e.kind().to_string(),
                            )
                        })?;
                    }
                }
                (
                    format!("{}{}?mode=rwc", SQLITE_URL_PREFIX, path.to_string_lossy()),
                    Some(path.to_path_buf()),
                )
            }
            None => (SQLITE_MEMORY_URL.to_string(), None),
        };

        let conn = Database::connect(&db_url)
            .await
            .map_err(|db_err| AppError::persistence_error(db_err.to_string()))?;

        // 初始化表结构 (如果需要)
        Self::setup_schema(&conn).await?;

        Ok(Self {
            db_conn: Arc::new(conn),
            db_file_path,
        })
    }

    /// 初始化数据库表结构，创建所有必要的表（如果不存在）
    async fn setup_schema(db: &DatabaseConnection) -> AppResult<()> {
        let backend = db.get_database_backend();
        let schema = Schema::new(backend);

        let stmt_experiments = schema
            .create_table_from_entity(entities::experiment::Entity)
            .if_not_exists()
            .to_owned();
        db.execute(backend.build(&stmt_experiments))
            .await
            .map_err(|e| AppError::persistence_error(format!("创建 experiments 表失败: {}", e)))?;

        let stmt_measurements = schema
            .create_table_from_entity(entities::measurement::Entity)
            .if_not_exists()
            .to_owned();
        db.execute(backend.build(&stmt_measurements))
            .await
            .map_err(|e| {
                AppError::persistence_error(format!("创建 measurements 表失败: {}", e))
            })?;

        log::info!("数据库表结构设置完成或已存在。");
        Ok(())
    }

    /// 数据库文件路径（内存库时为None）
    pub fn db_file_path(&self) -> Option<&Path> {
        self.db_file_path.as_deref()
    }
}

#[async_trait]
impl BaseService for SqliteOrmPersistenceService {
    fn service_name(&self) -> &'static str {
        "SqliteOrmPersistenceService"
    }

    async fn initialize(&mut self) -> AppResult<()> {
        // 在 new 方法中已经处理了初始化逻辑
        log::info!("{} 已初始化。", self.service_name());
        Ok(())
    }

    async fn shutdown(&mut self) -> AppResult<()> {
        // SeaORM 的 DatabaseConnection 在 Drop 时会自动关闭
        log::info!("{} 已关闭。", self.service_name());
        Ok(())
    }

    async fn health_check(&self) -> AppResult<()> {
        self.db_conn.ping().await.map_err(|db_err| {
            AppError::persistence_error(format!("数据库健康检查失败: {}", db_err))
        })?;
        log::debug!("数据库连接健康。");
        Ok(())
    }
}

#[async_trait]
impl PersistenceService for SqliteOrmPersistenceService {
    // --- ExperimentInfo ---
    async fn save_experiment(&self, experiment: &ExperimentInfo) -> AppResult<()> {
        let existing = entities::experiment::Entity::find_by_id(experiment.experiment_id.clone())
            .one(self.db_conn.as_ref())
            .await
            .map_err(|e| AppError::persistence_error(format!("查询实验记录失败: {}", e)))?;

        let active_model: entities::experiment::ActiveModel = experiment.into();
        if existing.is_some() {
            active_model
                .update(self.db_conn.as_ref())
                .await
                .map_err(|e| AppError::persistence_error(format!("更新实验记录失败: {}", e)))?;
        } else {
            active_model
                .insert(self.db_conn.as_ref())
                .await
                .map_err(|e| AppError::persistence_error(format!("保存实验记录失败: {}", e)))?;
        }
        Ok(())
    }

    async fn load_experiment(&self, experiment_id: &str) -> AppResult<Option<ExperimentInfo>> {
        let model = entities::experiment::Entity::find_by_id(experiment_id.to_string())
            .one(self.db_conn.as_ref())
            .await
            .map_err(|e| AppError::persistence_error(format!("加载实验记录失败: {}", e)))?;
        Ok(model.map(|m| (&m).into()))
    }

    async fn load_all_experiments(&self) -> AppResult<Vec<ExperimentInfo>> {
        let models = entities::experiment::Entity::find()
            .order_by_desc(entities::experiment::Column::CreatedTime)
            .all(self.db_conn.as_ref())
            .await
            .map_err(|e| AppError::persistence_error(format!("加载所有实验记录失败: {}", e)))?;
        Ok(models.iter().map(|m| m.into()).collect())
    }

    async fn delete_experiment(&self, experiment_id: &str) -> AppResult<()> {
        // 先删子记录再删父记录
        entities::measurement::Entity::delete_many()
            .filter(entities::measurement::Column::ExperimentId.eq(experiment_id))
            .exec(self.db_conn.as_ref())
            .await
            .map_err(|e| AppError::persistence_error(format!("删除测量记录失败: {}", e)))?;

        let delete_result = entities::experiment::Entity::delete_by_id(experiment_id.to_string())
            .exec(self.db_conn.as_ref())
            .await
            .map_err(|e| AppError::persistence_error(format!("删除实验记录失败: {}", e)))?;
        if delete_result.rows_affected == 0 {
            Err(AppError::not_found_error(
                "ExperimentInfo",
                format!("未找到ID为 {} 的实验记录进行删除", experiment_id),
            ))
        } else {
            Ok(())
        }
    }

    // --- CanonicalMeasurement ---
    async fn save_measurements(
        &self,
        experiment_id: &str,
        measurements: &[CanonicalMeasurement],
    ) -> AppResult<()> {
        if measurements.is_empty() {
            return Ok(());
        }

        for chunk in measurements.chunks(INSERT_BATCH_SIZE) {
            let active_models: Vec<entities::measurement::ActiveModel> = chunk
                .iter()
                .map(|m| entities::measurement::ActiveModel::from_measurement(m, experiment_id))
                .collect();

            entities::measurement::Entity::insert_many(active_models)
                .exec(self.db_conn.as_ref())
                .await
                .map_err(|e| {
                    AppError::persistence_error(format!("批量保存测量记录失败: {}", e))
                })?;
        }

        log::info!(
            "已保存{}条测量记录到实验 {}",
            measurements.len(),
            experiment_id
        );
        Ok(())
    }

    async fn load_measurements_by_experiment(
        &self,
        experiment_id: &str,
    ) -> AppResult<Vec<CanonicalMeasurement>> {
        let models = entities::measurement::Entity::find()
            .filter(entities::measurement::Column::ExperimentId.eq(experiment_id))
            .order_by_asc(entities::measurement::Column::SequenceNumber)
            .all(self.db_conn.as_ref())
            .await
            .map_err(|e| AppError::persistence_error(format!("加载测量记录失败: {}", e)))?;
        Ok(models.iter().map(|m| m.into()).collect())
    }

    async fn count_measurements(&self, experiment_id: &str) -> AppResult<u64> {
        entities::measurement::Entity::find()
            .filter(entities::measurement::Column::ExperimentId.eq(experiment_id))
            .count(self.db_conn.as_ref())
            .await
            .map_err(|e| AppError::persistence_error(format!("统计测量记录失败: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{ExperimentStatus, ExperimentType};
    use chrono::Utc;

    fn sample_measurement(seq: u32) -> CanonicalMeasurement {
        CanonicalMeasurement {
            sequence_number: seq,
            current_a: 0.5 + seq as f64 * 0.01,
            voltage_v: 20.0 + seq as f64 * 0.1,
            power_w: 10.0,
            timestamp: Utc::now(),
            device_address: Some("3".to_string()),
            device_type: Some("RSD-1000".to_string()),
        }
    }

    #[tokio::test]
    async fn test_experiment_save_and_load_round_trip() {
        let service = SqliteOrmPersistenceService::new(None).await.expect("建库失败");

        let mut experiment =
            ExperimentInfo::new(ExperimentType::NormalOperation, Some("导入数据".to_string()));
        experiment.operator_name = Some("张三".to_string());
        service.save_experiment(&experiment).await.expect("保存失败");

        let loaded = service
            .load_experiment(&experiment.experiment_id)
            .await
            .expect("加载失败")
            .expect("记录应存在");
        assert_eq!(loaded.experiment_name.as_deref(), Some("导入数据"));
        assert_eq!(loaded.operator_name.as_deref(), Some("张三"));
        assert_eq!(loaded.status, ExperimentStatus::Pending);

        // 再次保存走更新分支
        experiment.finish();
        service.save_experiment(&experiment).await.expect("更新失败");
        let reloaded = service
            .load_experiment(&experiment.experiment_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.status, ExperimentStatus::Completed);
    }

    #[tokio::test]
    async fn test_measurements_bulk_insert_and_ordered_load() {
        let service = SqliteOrmPersistenceService::new(None).await.expect("建库失败");

        let experiment = ExperimentInfo::new(ExperimentType::NormalOperation, None);
        service.save_experiment(&experiment).await.unwrap();

        // 乱序插入，读取时按序号升序
        let measurements = vec![
            sample_measurement(3),
            sample_measurement(1),
            sample_measurement(2),
        ];
        service
            .save_measurements(&experiment.experiment_id, &measurements)
            .await
            .expect("批量保存失败");

        let loaded = service
            .load_measurements_by_experiment(&experiment.experiment_id)
            .await
            .expect("加载失败");
        let sequences: Vec<u32> = loaded.iter().map(|m| m.sequence_number).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
        assert_eq!(
            service
                .count_measurements(&experiment.experiment_id)
                .await
                .unwrap(),
            3
        );
    }

    #[tokio::test]
    async fn test_delete_experiment_cascades_measurements() {
        let service = SqliteOrmPersistenceService::new(None).await.expect("建库失败");

        let experiment = ExperimentInfo::new(ExperimentType::Leakage, None);
        service.save_experiment(&experiment).await.unwrap();
        service
            .save_measurements(&experiment.experiment_id, &[sample_measurement(1)])
            .await
            .unwrap();

        service
            .delete_experiment(&experiment.experiment_id)
            .await
            .expect("删除失败");

        assert!(service
            .load_experiment(&experiment.experiment_id)
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            service
                .count_measurements(&experiment.experiment_id)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_delete_missing_experiment_is_not_found() {
        let service = SqliteOrmPersistenceService::new(None).await.expect("建库失败");
        let err = service.delete_experiment("不存在的ID").await.unwrap_err();
        assert!(matches!(err, AppError::NotFoundError { .. }));
    }

    #[tokio::test]
    async fn test_bulk_insert_spans_multiple_batches() {
        let service = SqliteOrmPersistenceService::new(None).await.expect("建库失败");

        let experiment = ExperimentInfo::new(ExperimentType::NormalOperation, None);
        service.save_experiment(&experiment).await.unwrap();

        let measurements: Vec<CanonicalMeasurement> =
            (1..=1050).map(sample_measurement).collect();
        service
            .save_measurements(&experiment.experiment_id, &measurements)
            .await
            .expect("跨批次插入失败");

        assert_eq!(
            service
                .count_measurements(&experiment.experiment_id)
                .await
                .unwrap(),
            1050
        );
    }

    #[tokio::test]
    async fn test_save_empty_measurements_is_noop() {
        let service = SqliteOrmPersistenceService::new(None).await.expect("建库失败");
        service.save_measurements("任意实验", &[]).await.expect("空集应直接成功");
    }
}
