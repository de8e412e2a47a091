/// 测量字段归一化服务
///
/// 把 [`ParsedSheet`] 的原始记录映射为 [`CanonicalMeasurement`]。
/// 历史导出文件的表头拼写不完全一致（如 "电流 (A)" 与 "电流(A)"），
/// 这里按每个归一化字段维护一份有序候选表头列表，依次尝试，
/// 第一个存在的值生效，避免零散的字符串匹配分支
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::models::structs::{CanonicalMeasurement, ParsedSheet, SheetRecord};
use crate::utils::time_utils;

/// 序号列候选表头
const SEQUENCE_ALIASES: &[&str] = &["序号"];
/// 电流列候选表头，按优先级排列
const CURRENT_ALIASES: &[&str] = &["电流 (A)", "电流(A)"];
/// 电压列候选表头
const VOLTAGE_ALIASES: &[&str] = &["电压 (V)", "电压(V)"];
/// 功率列候选表头
const POWER_ALIASES: &[&str] = &["功率 (W)", "功率(W)"];
/// 时间戳列候选表头
const TIMESTAMP_ALIASES: &[&str] = &["时间戳"];
/// 设备地址列候选表头
const DEVICE_ADDRESS_ALIASES: &[&str] = &["设备地址"];
/// 设备类型列候选表头
const DEVICE_TYPE_ALIASES: &[&str] = &["设备类型"];

/// 把解析结果归一化为测量点序列，以当前时间作为解析参考时间
pub fn to_canonical_measurements(sheet: &ParsedSheet) -> Vec<CanonicalMeasurement> {
    canonical_measurements_at(sheet, Utc::now())
}

/// 以指定参考时间做归一化
///
/// 参考时间在一次调用内只取一次；给定相同输入与参考时间，
/// 输出完全一致（纯函数）。数值字段缺失或无法解析时宽松地记0.0，
/// 匹配厂商导出文件质量参差的现实
pub fn canonical_measurements_at(
    sheet: &ParsedSheet,
    reference_time: DateTime<Utc>,
) -> Vec<CanonicalMeasurement> {
    sheet
        .records
        .iter()
        .enumerate()
        .map(|(index, record)| CanonicalMeasurement {
            sequence_number: lookup(record, SEQUENCE_ALIASES)
                .and_then(coerce_u32)
                .unwrap_or((index + 1) as u32),
            current_a: lookup(record, CURRENT_ALIASES)
                .and_then(coerce_f64)
                .unwrap_or(0.0),
            voltage_v: lookup(record, VOLTAGE_ALIASES)
                .and_then(coerce_f64)
                .unwrap_or(0.0),
            power_w: lookup(record, POWER_ALIASES)
                .and_then(coerce_f64)
                .unwrap_or(0.0),
            timestamp: lookup(record, TIMESTAMP_ALIASES)
                .map(|v| time_utils::cell_to_timestamp(v, reference_time))
                .unwrap_or(reference_time),
            device_address: lookup(record, DEVICE_ADDRESS_ALIASES).and_then(coerce_text),
            device_type: lookup(record, DEVICE_TYPE_ALIASES).and_then(coerce_text),
        })
        .collect()
}

/// 依次尝试候选表头，第一个存在且非Null的值生效
fn lookup<'a>(record: &'a SheetRecord, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .find_map(|key| record.get(*key).filter(|v| !v.is_null()))
}

/// 宽松的浮点转换：数值直接取用，字符串去空白后完整解析
fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// 序号转换：浮点/整数/数字字符串都接受，负数丢弃
fn coerce_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u32),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| *f >= 0.0)
            .map(|f| f as u32),
        _ => None,
    }
}

/// 文本转换：空字符串视为缺失
fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
