use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::enums::{ExperimentStatus, ExperimentType, FaultType, LoadType};

/// 生成默认UUID字符串的辅助函数
pub fn default_id() -> String {
    Uuid::new_v4().to_string()
}

/// 表格记录：以表头名为键的一行原始数据
///
/// 键集合与 [`ParsedSheet::headers`] 完全一致，缺失位补 `Value::Null`
pub type SheetRecord = HashMap<String, Value>;

/// 从上传表格第二行提取出的厂商元信息块
///
/// 四个字段分别来自固定标签 `记录时间:`、`设备地址:`、`设备类型:`、`数据点数:`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetMetadata {
    /// 记录时间（原始字符串，保持厂商导出格式）
    pub record_time: Option<String>,
    /// 设备地址
    pub device_address: Option<String>,
    /// 设备类型
    pub device_type: Option<String>,
    /// 声明的数据点数，无法解析时记0
    pub data_points: Option<u32>,
}

impl SheetMetadata {
    /// 四个字段均未提取到时视为空
    pub fn is_empty(&self) -> bool {
        self.record_time.is_none()
            && self.device_address.is_none()
            && self.device_type.is_none()
            && self.data_points.is_none()
    }
}

/// 一次表格解析的完整结果
///
/// 每次上传生成一个新实例，整个查看/编辑/导出会话期间持有在内存里，
/// 解析完成后除字段归一化外不再原地修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSheet {
    /// 表头行单元格，按原始从左到右顺序
    pub headers: Vec<String>,
    /// 表头行之后的数据行，全空行已剔除
    pub records: Vec<SheetRecord>,
    /// 元信息块（仅当第二行携带 `记录时间` 标记时存在）
    pub metadata: Option<SheetMetadata>,
}

impl ParsedSheet {
    /// 数据行数
    pub fn row_count(&self) -> usize {
        self.records.len()
    }

    /// 列数
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }
}

/// 归一化后的测量点记录
///
/// 字段归一化消除了历史表头拼写差异（如 "电流 (A)" 与 "电流(A)"），
/// 是写入数据库measurements表的标准形态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalMeasurement {
    /// 序号（表格缺失时按记录在输入中的1基位置补齐）
    pub sequence_number: u32,
    /// 电流 (A)
    pub current_a: f64,
    /// 电压 (V)
    pub voltage_v: f64,
    /// 功率 (W)
    pub power_w: f64,
    /// 采样时间戳（表格缺失时取解析参考时间）
    pub timestamp: DateTime<Utc>,
    /// 设备地址（随行透传，存入附加数据）
    pub device_address: Option<String>,
    /// 设备类型（随行透传，存入附加数据）
    pub device_type: Option<String>,
}

/// 实验记录信息
///
/// 一次导入/一次试验对应一条父记录，关联N条测量子记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentInfo {
    /// 实验ID
    #[serde(default = "default_id")]
    pub experiment_id: String,
    /// 实验类型
    pub experiment_type: ExperimentType,
    /// 实验名称
    pub experiment_name: Option<String>,
    /// 实验状态
    pub status: ExperimentStatus,
    /// 操作员名称
    pub operator_name: Option<String>,
    /// 开始时间
    pub start_time: DateTime<Utc>,
    /// 结束时间
    pub end_time: Option<DateTime<Utc>>,
    /// 试验参数（JSON，导入时存放表格元信息）
    pub test_parameters: Option<Value>,
    /// 是否通过
    pub pass_fail: Option<bool>,
    /// 备注
    pub notes: Option<String>,
    /// 创建时间
    pub creation_time: DateTime<Utc>,
    /// 最后更新时间
    pub last_updated_time: DateTime<Utc>,
}

impl ExperimentInfo {
    /// 创建新的实验记录
    pub fn new(experiment_type: ExperimentType, experiment_name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            experiment_id: default_id(),
            experiment_type,
            experiment_name,
            status: ExperimentStatus::Pending,
            operator_name: None,
            start_time: now,
            end_time: None,
            test_parameters: None,
            pass_fail: None,
            notes: None,
            creation_time: now,
            last_updated_time: now,
        }
    }

    /// 标记实验完成
    pub fn finish(&mut self) {
        self.status = ExperimentStatus::Completed;
        self.end_time = Some(Utc::now());
        self.last_updated_time = Utc::now();
    }
}

/// 仿真参数集
///
/// 默认值即标准测试条件（STC）下一块典型400W组件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    /// 组件开路电压 Voc (V)
    pub module_voc: f64,
    /// 组件短路电流 Isc (A)
    pub module_isc: f64,
    /// 组件最大功率 Pmax (W)
    pub module_pmax: f64,
    /// 最大功率点电压 Vmp (V)
    pub module_vmp: f64,
    /// 最大功率点电流 Imp (A)
    pub module_imp: f64,
    /// 辐照度 (W/m²)
    pub irradiance: f64,
    /// 组件温度 (°C)
    pub temperature: f64,
    /// 关断器动作电压阈值 (V)
    pub rsd_voltage_threshold: f64,
    /// 关断器响应时间 (ms)
    pub rsd_response_time_ms: f64,
    /// 关断器泄漏电流 (mA)
    pub rsd_leakage_current_ma: f64,
    /// 负载类型
    pub load_type: LoadType,
    /// 负载阻值/阻抗 (Ω)
    pub load_value: f64,
    /// 故障注入类型
    pub fault_type: FaultType,
    /// 故障幅度（百分比）
    pub fault_magnitude: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            module_voc: 48.5,
            module_isc: 11.2,
            module_pmax: 400.0,
            module_vmp: 40.5,
            module_imp: 9.87,
            irradiance: 1000.0,
            temperature: 25.0,
            rsd_voltage_threshold: 30.0,
            rsd_response_time_ms: 30.0,
            rsd_leakage_current_ma: 0.5,
            load_type: LoadType::Resistive,
            load_value: 50.0,
            fault_type: FaultType::None,
            fault_magnitude: 0.0,
        }
    }
}
