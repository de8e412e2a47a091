/// 表格序列化服务
///
/// 把扁平的键值记录写回单工作表的xlsx字节流，供再导出使用。
/// 列顺序由调用方给定的表头列表决定，不重新输出元信息块
use rust_xlsxwriter::Workbook;
use serde_json::Value;

use crate::models::structs::{CanonicalMeasurement, SheetRecord};
use crate::utils::error::AppResult;

/// 归一化测量点导出时的固定列顺序
const MEASUREMENT_HEADERS: &[&str] = &["序号", "电流 (A)", "电压 (V)", "功率 (W)", "时间戳"];

/// 把原始记录序列化为单工作表xlsx字节
///
/// `headers` 决定列顺序；记录里没有的键不会出现在输出中
pub fn records_to_worksheet_bytes(
    headers: &[String],
    records: &[SheetRecord],
) -> AppResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, header)?;
    }

    for (row_idx, record) in records.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        for (col, header) in headers.iter().enumerate() {
            let col = col as u16;
            match record.get(header) {
                Some(Value::Number(n)) => {
                    if let Some(f) = n.as_f64() {
                        sheet.write_number(row, col, f)?;
                    }
                }
                Some(Value::String(s)) => {
                    sheet.write_string(row, col, s)?;
                }
                Some(Value::Bool(b)) => {
                    sheet.write_boolean(row, col, *b)?;
                }
                // Null或缺失的键留空
                _ => {}
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// 把归一化测量点序列化为单工作表xlsx字节，列按归一化字段顺序
pub fn measurements_to_worksheet_bytes(
    measurements: &[CanonicalMeasurement],
) -> AppResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    let with_device = measurements
        .iter()
        .any(|m| m.device_address.is_some() || m.device_type.is_some());

    let mut headers: Vec<&str> = MEASUREMENT_HEADERS.to_vec();
    if with_device {
        headers.push("设备地址");
        headers.push("设备类型");
    }
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header)?;
    }

    for (row_idx, m) in measurements.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        sheet.write_number(row, 0, m.sequence_number as f64)?;
        sheet.write_number(row, 1, m.current_a)?;
        sheet.write_number(row, 2, m.voltage_v)?;
        sheet.write_number(row, 3, m.power_w)?;
        sheet.write_string(row, 4, m.timestamp.to_rfc3339())?;
        if with_device {
            if let Some(addr) = &m.device_address {
                sheet.write_string(row, 5, addr)?;
            }
            if let Some(ty) = &m.device_type {
                sheet.write_string(row, 6, ty)?;
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}
