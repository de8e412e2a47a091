//! # 模型枚举类型模块
//!
//! 定义实验、设备与仿真相关的枚举类型：
//! - **实验类型/状态**: 与数据库中experiments表保持一致的取值
//! - **设备状态**: 设备台账的运行状态
//! - **仿真枚举**: 负载类型与故障注入类型
//!
//! 所有枚举都支持JSON序列化，并提供与字符串的双向转换能力

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// 实验类型枚举
///
/// 对应快速关断器测试的四类实验项目
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperimentType {
    /// 介电强度实验
    Dielectric,
    /// 泄漏电流实验
    Leakage,
    /// 正常工况运行实验
    NormalOperation,
    /// 异常工况实验
    AbnormalCondition,
}

impl Default for ExperimentType {
    fn default() -> Self {
        Self::NormalOperation
    }
}

impl Display for ExperimentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExperimentType::Dielectric => "dielectric",
            ExperimentType::Leakage => "leakage",
            ExperimentType::NormalOperation => "normal_operation",
            ExperimentType::AbnormalCondition => "abnormal_condition",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ExperimentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dielectric" => Ok(ExperimentType::Dielectric),
            "leakage" => Ok(ExperimentType::Leakage),
            "normal_operation" => Ok(ExperimentType::NormalOperation),
            "abnormal_condition" => Ok(ExperimentType::AbnormalCondition),
            _ => Err(format!("Invalid ExperimentType: {}", s)),
        }
    }
}

/// 实验状态枚举
/// 表示一次实验记录的整体状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperimentStatus {
    /// 待执行
    Pending,
    /// 执行中
    Running,
    /// 已完成
    Completed,
    /// 已失败
    Failed,
    /// 已取消
    Cancelled,
}

impl Default for ExperimentStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl Display for ExperimentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExperimentStatus::Pending => "pending",
            ExperimentStatus::Running => "running",
            ExperimentStatus::Completed => "completed",
            ExperimentStatus::Failed => "failed",
            ExperimentStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ExperimentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ExperimentStatus::Pending),
            "running" => Ok(ExperimentStatus::Running),
            "completed" => Ok(ExperimentStatus::Completed),
            "failed" => Ok(ExperimentStatus::Failed),
            "cancelled" => Ok(ExperimentStatus::Cancelled),
            _ => Err(format!("Invalid ExperimentStatus: {}", s)),
        }
    }
}

/// 设备状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceStatus {
    /// 在用
    Active,
    /// 停用
    Inactive,
    /// 维护中
    Maintenance,
}

impl Default for DeviceStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl Display for DeviceStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeviceStatus::Active => "active",
            DeviceStatus::Inactive => "inactive",
            DeviceStatus::Maintenance => "maintenance",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for DeviceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(DeviceStatus::Active),
            "inactive" => Ok(DeviceStatus::Inactive),
            "maintenance" => Ok(DeviceStatus::Maintenance),
            _ => Err(format!("Invalid DeviceStatus: {}", s)),
        }
    }
}

/// 仿真负载类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadType {
    /// 阻性负载
    Resistive,
    /// 感性负载
    Inductive,
    /// 容性负载
    Capacitive,
}

impl Default for LoadType {
    fn default() -> Self {
        Self::Resistive
    }
}

/// 仿真故障注入类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultType {
    /// 无故障
    None,
    /// 过压故障
    Overvoltage,
    /// 过流故障
    Overcurrent,
    /// 接地故障
    GroundFault,
    /// 电弧故障
    ArcFault,
}

impl Default for FaultType {
    fn default() -> Self {
        Self::None
    }
}
