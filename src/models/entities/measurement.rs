// 测量记录实体的SeaORM定义
// 通过 experiment_id 关联到 experiments 表

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};

use crate::models::structs::{default_id, CanonicalMeasurement};

/// 测量记录实体
///
/// 一行对应导入表格里的一个测量点，字段已做表头归一化
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "measurements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    #[serde(default = "default_id")]
    pub measurement_id: String,

    /// 关联到 experiments 表的ID
    pub experiment_id: String,
    /// 序号（来自表格或按位置补齐）
    pub sequence_number: u32,
    /// 采样时间戳
    pub timestamp: DateTime<Utc>,

    // 测量值
    #[sea_orm(column_type = "Double")]
    pub current_a: f64,
    #[sea_orm(column_type = "Double")]
    pub voltage_v: f64,
    #[sea_orm(column_type = "Double")]
    pub power_w: f64,

    // 附加数据（随行透传的设备信息）
    #[sea_orm(nullable)]
    pub device_address: Option<String>,
    #[sea_orm(nullable)]
    pub device_type: Option<String>,

    pub created_time: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            measurement_id: Set(default_id()),
            created_time: Set(Utc::now()),
            ..ActiveModelTrait::default()
        }
    }
}

impl ActiveModel {
    /// 由归一化测量点构造待插入的记录
    pub fn from_measurement(measurement: &CanonicalMeasurement, experiment_id: &str) -> Self {
        Self {
            measurement_id: Set(default_id()),
            experiment_id: Set(experiment_id.to_string()),
            sequence_number: Set(measurement.sequence_number),
            timestamp: Set(measurement.timestamp),
            current_a: Set(measurement.current_a),
            voltage_v: Set(measurement.voltage_v),
            power_w: Set(measurement.power_w),
            device_address: Set(measurement.device_address.clone()),
            device_type: Set(measurement.device_type.clone()),
            created_time: Set(Utc::now()),
        }
    }
}

impl From<&Model> for CanonicalMeasurement {
    fn from(model: &Model) -> Self {
        CanonicalMeasurement {
            sequence_number: model.sequence_number,
            current_a: model.current_a,
            voltage_v: model.voltage_v,
            power_w: model.power_w,
            timestamp: model.timestamp,
            device_address: model.device_address.clone(),
            device_type: model.device_type.clone(),
        }
    }
}
