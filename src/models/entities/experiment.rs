// 实验记录实体的SeaORM定义
// 一条实验记录关联N条测量记录

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};

use crate::models::enums::{ExperimentStatus, ExperimentType};
use crate::models::structs::{default_id, ExperimentInfo};

/// 实验记录实体
///
/// 管理一次试验/一次导入的基本信息，是测量数据的父记录
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "experiments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    #[serde(default = "default_id")]
    pub experiment_id: String,

    // 基本信息
    #[sea_orm(column_type = "Text")]
    pub experiment_type: String,
    #[sea_orm(nullable)]
    pub experiment_name: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub status: String,
    #[sea_orm(nullable)]
    pub operator_name: Option<String>,

    // 时间信息
    pub start_time: DateTime<Utc>,
    #[sea_orm(nullable)]
    pub end_time: Option<DateTime<Utc>>,
    pub created_time: DateTime<Utc>,
    pub updated_time: DateTime<Utc>,

    // 试验参数与结论
    #[sea_orm(column_type = "Text", nullable)]
    pub test_parameters_json: Option<String>,
    #[sea_orm(nullable)]
    pub pass_fail: Option<bool>,
    #[sea_orm(nullable)]
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            experiment_id: Set(default_id()),
            created_time: Set(Utc::now()),
            updated_time: Set(Utc::now()),
            ..ActiveModelTrait::default()
        }
    }

    fn before_save<'life0, 'async_trait, C>(
        mut self,
        _db: &'life0 C,
        _insert: bool,
    ) -> core::pin::Pin<Box<dyn core::future::Future<Output = Result<Self, DbErr>> + core::marker::Send + 'async_trait>>
    where
        'life0: 'async_trait,
        C: 'async_trait + ConnectionTrait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            self.updated_time = Set(Utc::now());
            Ok(self)
        })
    }
}

impl From<&ExperimentInfo> for ActiveModel {
    fn from(original: &ExperimentInfo) -> Self {
        let test_parameters_json = original
            .test_parameters
            .as_ref()
            .and_then(|v| serde_json::to_string(v).ok());

        Self {
            experiment_id: Set(original.experiment_id.clone()),
            experiment_type: Set(original.experiment_type.to_string()),
            experiment_name: Set(original.experiment_name.clone()),
            status: Set(original.status.to_string()),
            operator_name: Set(original.operator_name.clone()),
            start_time: Set(original.start_time),
            end_time: Set(original.end_time),
            created_time: Set(original.creation_time),
            updated_time: Set(original.last_updated_time),
            test_parameters_json: Set(test_parameters_json),
            pass_fail: Set(original.pass_fail),
            notes: Set(original.notes.clone()),
        }
    }
}

impl From<&Model> for ExperimentInfo {
    fn from(model: &Model) -> Self {
        let test_parameters = model
            .test_parameters_json
            .as_ref()
            .and_then(|json| serde_json::from_str(json).ok());

        ExperimentInfo {
            experiment_id: model.experiment_id.clone(),
            experiment_type: model.experiment_type.parse().unwrap_or_default(),
            experiment_name: model.experiment_name.clone(),
            status: model.status.parse().unwrap_or_default(),
            operator_name: model.operator_name.clone(),
            start_time: model.start_time,
            end_time: model.end_time,
            test_parameters,
            pass_fail: model.pass_fail,
            notes: model.notes.clone(),
            creation_time: model.created_time,
            last_updated_time: model.updated_time,
        }
    }
}

impl Model {
    /// 获取实验类型枚举
    pub fn get_experiment_type(&self) -> Result<ExperimentType, String> {
        self.experiment_type.parse()
    }

    /// 获取实验状态枚举
    pub fn get_status(&self) -> Result<ExperimentStatus, String> {
        self.status.parse()
    }

    /// 判断实验是否已结束（完成/失败/取消）
    pub fn is_finished(&self) -> bool {
        matches!(
            self.get_status(),
            Ok(ExperimentStatus::Completed)
                | Ok(ExperimentStatus::Failed)
                | Ok(ExperimentStatus::Cancelled)
        )
    }
}
