/// 服务层基础trait定义
/// 提供各层服务的接口规范，支持依赖注入和测试

use async_trait::async_trait;

use crate::models::structs::{CanonicalMeasurement, ExperimentInfo};
use crate::utils::error::AppResult;

/// 基础服务trait，所有服务都应实现
#[async_trait]
pub trait BaseService: Send + Sync {
    /// 服务名称
    fn service_name(&self) -> &'static str;

    /// 初始化服务
    async fn initialize(&mut self) -> AppResult<()>;

    /// 关闭服务
    async fn shutdown(&mut self) -> AppResult<()>;

    /// 健康检查
    async fn health_check(&self) -> AppResult<()>;
}

/// 数据持久化服务trait
///
/// 实验记录为父、测量记录为子的两级存储
#[async_trait]
pub trait PersistenceService: BaseService {
    /// 保存实验记录（存在则更新）
    async fn save_experiment(&self, experiment: &ExperimentInfo) -> AppResult<()>;

    /// 加载实验记录
    async fn load_experiment(&self, experiment_id: &str) -> AppResult<Option<ExperimentInfo>>;

    /// 加载所有实验记录
    async fn load_all_experiments(&self) -> AppResult<Vec<ExperimentInfo>>;

    /// 删除实验记录（连同其全部测量记录）
    async fn delete_experiment(&self, experiment_id: &str) -> AppResult<()>;

    /// 批量保存一次实验的测量记录
    async fn save_measurements(
        &self,
        experiment_id: &str,
        measurements: &[CanonicalMeasurement],
    ) -> AppResult<()>;

    /// 按实验加载测量记录，按序号升序
    async fn load_measurements_by_experiment(
        &self,
        experiment_id: &str,
    ) -> AppResult<Vec<CanonicalMeasurement>>;

    /// 统计一次实验的测量点数
    async fn count_measurements(&self, experiment_id: &str) -> AppResult<u64>;
}
