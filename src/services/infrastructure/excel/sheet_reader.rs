/// 表格文件解析服务
///
/// 把上传的 xlsx/xls/csv 字节流解析为 [`ParsedSheet`]：
/// 仅取第一个工作表，识别并剥离可选的厂商元信息块，
/// 定位表头行，把其余数据行转换为按表头取值的记录
use std::io::Cursor;

use calamine::{DataType, Reader, Xls, Xlsx};
use log::{info, warn};
use serde_json::Value;

use crate::models::structs::{ParsedSheet, SheetMetadata, SheetRecord};
use crate::utils::error::{AppError, AppResult};

/// 元信息行识别标记（出现在第二行第一个单元格里）
const METADATA_MARKER: &str = "记录时间";

/// 元信息字段标签
const LABEL_RECORD_TIME: &str = "记录时间:";
const LABEL_DEVICE_ADDRESS: &str = "设备地址:";
const LABEL_DEVICE_TYPE: &str = "设备类型:";
const LABEL_DATA_POINTS: &str = "数据点数:";

/// 带元信息块时表头所在的行号（前两行是固定宽度的元信息块）
const HEADER_ROW_WITH_METADATA: usize = 3;

/// ZIP本地文件头，xlsx实为zip包
const XLSX_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
/// OLE2复合文档头，对应旧版xls
const XLS_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// 表格解析器
pub struct SheetReader;

impl SheetReader {
    /// 解析上传文件的原始字节
    ///
    /// 按魔数识别格式：zip头视为xlsx，OLE2头视为xls，其余按CSV文本处理。
    /// 解码失败返回 [`AppError::DecodeError`]，不产生部分结果
    pub fn parse_bytes(bytes: &[u8]) -> AppResult<ParsedSheet> {
        let grid = Self::decode_grid(bytes)?;
        let sheet = Self::parse_grid(grid)?;
        info!(
            "表格解析完成: {}列 x {}行数据, 元信息块: {}",
            sheet.column_count(),
            sheet.row_count(),
            if sheet.metadata.is_some() { "有" } else { "无" }
        );
        Ok(sheet)
    }

    /// 把字节流解码为矩形单元格网格（行优先，未分离表头）
    fn decode_grid(bytes: &[u8]) -> AppResult<Vec<Vec<Value>>> {
        if bytes.starts_with(&XLSX_MAGIC) {
            let workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
                .map_err(|e| AppError::decode_error(format!("无法打开xlsx工作簿: {}", e)))?;
            Self::first_sheet_grid(workbook)
        } else if bytes.starts_with(&XLS_MAGIC) {
            let workbook: Xls<_> = Xls::new(Cursor::new(bytes))
                .map_err(|e| AppError::decode_error(format!("无法打开xls工作簿: {}", e)))?;
            Self::first_sheet_grid(workbook)
        } else {
            Self::decode_csv(bytes)
        }
    }

    /// 读取工作簿第一个工作表并展开为网格
    fn first_sheet_grid<RS, R>(mut workbook: R) -> AppResult<Vec<Vec<Value>>>
    where
        RS: std::io::Read + std::io::Seek,
        R: Reader<RS>,
        R::Error: std::fmt::Display,
    {
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| AppError::decode_error("工作簿中没有工作表"))?;

        let range = match workbook.worksheet_range(&sheet_name) {
            Some(Ok(range)) => range,
            Some(Err(e)) => {
                return Err(AppError::decode_error(format!("无法读取工作表: {}", e)))
            }
            None => {
                return Err(AppError::decode_error(format!(
                    "工作表不存在: {}",
                    sheet_name
                )))
            }
        };

        // Range只覆盖已使用区域，这里按起始偏移补齐，
        // 保证网格行列号与工作表中的绝对位置一致
        let (start_row, start_col) = match range.start() {
            Some((r, c)) => (r as usize, c as usize),
            None => (0, 0),
        };

        let mut grid: Vec<Vec<Value>> = vec![Vec::new(); start_row];
        for row in range.rows() {
            let mut values: Vec<Value> = Vec::with_capacity(start_col + row.len());
            values.extend(std::iter::repeat(Value::Null).take(start_col));
            values.extend(row.iter().map(Self::cell_to_value));
            Self::trim_trailing_empty(&mut values);
            grid.push(values);
        }
        Ok(grid)
    }

    /// 把CSV文本解码为网格，数字样式的单元格转为数值
    ///
    /// 逐行送入csv解析器：csv库会跳过空行，而固定行号的
    /// 元信息块依赖空行占位，这里必须保留它们
    fn decode_csv(bytes: &[u8]) -> AppResult<Vec<Vec<Value>>> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| AppError::decode_error(format!("文件不是有效的UTF-8文本: {}", e)))?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let mut grid = Vec::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                grid.push(Vec::new());
                continue;
            }

            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_reader(line.as_bytes());
            let record = match reader.records().next() {
                Some(result) => {
                    result.map_err(|e| AppError::decode_error(format!("CSV解析失败: {}", e)))?
                }
                None => {
                    grid.push(Vec::new());
                    continue;
                }
            };
            let mut values: Vec<Value> = record.iter().map(Self::csv_field_to_value).collect();
            Self::trim_trailing_empty(&mut values);
            grid.push(values);
        }
        Ok(grid)
    }

    /// 把网格按元信息块/表头/数据行的约定拆解为解析结果
    fn parse_grid(grid: Vec<Vec<Value>>) -> AppResult<ParsedSheet> {
        let (metadata, header_row_index) = Self::detect_metadata(&grid);
        let headers = Self::extract_headers(&grid, header_row_index)?;
        let records = Self::extract_records(&grid, header_row_index, &headers);
        Ok(ParsedSheet {
            headers,
            records,
            metadata,
        })
    }

    /// 检查第二行是否为元信息行，并返回表头行号
    ///
    /// 识别条件：行号1的第一个单元格是包含 `记录时间` 的字符串。
    /// 识别到时逐个单元格按固定标签切分取值，表头顺延到行号3
    fn detect_metadata(grid: &[Vec<Value>]) -> (Option<SheetMetadata>, usize) {
        let marker_present = grid
            .get(1)
            .and_then(|row| row.first())
            .and_then(Value::as_str)
            .map(|s| s.contains(METADATA_MARKER))
            .unwrap_or(false);

        if !marker_present {
            return (None, 0);
        }

        let mut metadata = SheetMetadata::default();
        for cell in &grid[1] {
            let text = match cell.as_str() {
                Some(t) => t,
                None => continue,
            };
            if let Some(rest) = Self::value_after_label(text, LABEL_RECORD_TIME) {
                metadata.record_time = Some(rest);
            } else if let Some(rest) = Self::value_after_label(text, LABEL_DEVICE_ADDRESS) {
                metadata.device_address = Some(rest);
            } else if let Some(rest) = Self::value_after_label(text, LABEL_DEVICE_TYPE) {
                metadata.device_type = Some(rest);
            } else if let Some(rest) = Self::value_after_label(text, LABEL_DATA_POINTS) {
                metadata.data_points = Some(rest.parse().unwrap_or(0));
            }
        }

        (Some(metadata), HEADER_ROW_WITH_METADATA)
    }

    /// 取标签之后的子串并去除首尾空白，标签不存在时返回None
    fn value_after_label(text: &str, label: &str) -> Option<String> {
        text.splitn(2, label).nth(1).map(|s| s.trim().to_string())
    }

    /// 提取表头行，空表头视为解析失败
    fn extract_headers(grid: &[Vec<Value>], header_row_index: usize) -> AppResult<Vec<String>> {
        let row = grid.get(header_row_index).ok_or_else(|| {
            AppError::missing_header_error(format!("第{}行不存在表头", header_row_index + 1))
        })?;

        let headers: Vec<String> = row.iter().map(Self::cell_to_text).collect();
        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(AppError::missing_header_error(format!(
                "第{}行表头为空",
                header_row_index + 1
            )));
        }
        Ok(headers)
    }

    /// 提取数据行，剔除全空行，并按表头位置取值
    ///
    /// 比表头短的行缺失位置补Null，保证每条记录的键集合与表头一致
    fn extract_records(
        grid: &[Vec<Value>],
        header_row_index: usize,
        headers: &[String],
    ) -> Vec<SheetRecord> {
        let records: Vec<SheetRecord> = grid
            .iter()
            .skip(header_row_index + 1)
            .filter(|row| row.iter().any(Self::is_meaningful))
            .map(|row| {
                headers
                    .iter()
                    .enumerate()
                    .map(|(idx, header)| {
                        (header.clone(), row.get(idx).cloned().unwrap_or(Value::Null))
                    })
                    .collect()
            })
            .collect();

        let skipped = grid.len().saturating_sub(header_row_index + 1) - records.len();
        if skipped > 0 {
            warn!("已剔除{}个全空数据行", skipped);
        }
        records
    }

    /// 单元格是否携带有效内容（Null与空字符串视为空）
    fn is_meaningful(value: &Value) -> bool {
        match value {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// 去掉行尾的空单元格
    fn trim_trailing_empty(values: &mut Vec<Value>) {
        while matches!(values.last(), Some(Value::Null)) {
            values.pop();
        }
    }

    /// Excel单元格 → 原始值
    fn cell_to_value(cell: &DataType) -> Value {
        match cell {
            DataType::Empty => Value::Null,
            DataType::String(s) => Value::String(s.clone()),
            DataType::Float(f) => Self::number_value(*f),
            DataType::Int(i) => Value::Number((*i).into()),
            DataType::Bool(b) => Value::Bool(*b),
            DataType::DateTime(f) => Self::number_value(*f),
            other => Value::String(other.to_string()),
        }
    }

    /// CSV字段 → 原始值，可按浮点数完整解析的字段转为数值
    fn csv_field_to_value(field: &str) -> Value {
        if field.is_empty() {
            return Value::Null;
        }
        if let Ok(f) = field.trim().parse::<f64>() {
            return Self::number_value(f);
        }
        Value::String(field.to_string())
    }

    fn number_value(f: f64) -> Value {
        serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }

    /// 把原始值转为表头文本
    fn cell_to_text(value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Number(n) => {
                // 整数值的表头不带小数点
                if let Some(i) = n.as_i64() {
                    i.to_string()
                } else {
                    n.to_string()
                }
            }
            Value::Bool(b) => b.to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use serde_json::json;

    /// 生成不带元信息块的xlsx字节：表头 + 两行数据
    fn simple_workbook_bytes() -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "序号").unwrap();
        sheet.write_string(0, 1, "电流 (A)").unwrap();
        sheet.write_string(0, 2, "电压 (V)").unwrap();
        sheet.write_number(1, 0, 1.0).unwrap();
        sheet.write_number(1, 1, 0.52).unwrap();
        sheet.write_number(1, 2, 20.1).unwrap();
        sheet.write_number(2, 0, 2.0).unwrap();
        sheet.write_number(2, 1, 0.55).unwrap();
        sheet.write_number(2, 2, 20.3).unwrap();
        workbook.save_to_buffer().unwrap()
    }

    /// 生成带元信息块的xlsx字节：标题行 + 元信息行 + 空行 + 表头 + 数据
    fn metadata_workbook_bytes() -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "实验数据导出").unwrap();
        sheet
            .write_string(1, 0, "记录时间: 2025-06-01 10:00:00")
            .unwrap();
        sheet.write_string(1, 1, "设备地址: 3").unwrap();
        sheet.write_string(1, 2, "设备类型: RSD-1000").unwrap();
        sheet.write_string(1, 3, "数据点数: 2").unwrap();
        sheet.write_string(3, 0, "序号").unwrap();
        sheet.write_string(3, 1, "电流(A)").unwrap();
        sheet.write_string(3, 2, "电压(V)").unwrap();
        sheet.write_number(4, 0, 1.0).unwrap();
        sheet.write_number(4, 1, 0.48).unwrap();
        sheet.write_number(4, 2, 19.8).unwrap();
        sheet.write_number(5, 0, 2.0).unwrap();
        sheet.write_number(5, 1, 0.51).unwrap();
        sheet.write_number(5, 2, 20.0).unwrap();
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_parse_without_metadata() {
        let bytes = simple_workbook_bytes();
        let sheet = SheetReader::parse_bytes(&bytes).expect("解析失败");

        assert_eq!(sheet.headers, vec!["序号", "电流 (A)", "电压 (V)"]);
        assert_eq!(sheet.records.len(), 2);
        assert!(sheet.metadata.is_none());

        let first = &sheet.records[0];
        assert_eq!(first["序号"], json!(1.0));
        assert_eq!(first["电流 (A)"], json!(0.52));
        assert_eq!(first["电压 (V)"], json!(20.1));
        let second = &sheet.records[1];
        assert_eq!(second["序号"], json!(2.0));
        assert_eq!(second["电流 (A)"], json!(0.55));
        assert_eq!(second["电压 (V)"], json!(20.3));
    }

    #[test]
    fn test_parse_with_metadata_block() {
        let bytes = metadata_workbook_bytes();
        let sheet = SheetReader::parse_bytes(&bytes).expect("解析失败");

        let metadata = sheet.metadata.expect("应识别出元信息块");
        assert_eq!(metadata.record_time.as_deref(), Some("2025-06-01 10:00:00"));
        assert_eq!(metadata.device_address.as_deref(), Some("3"));
        assert_eq!(metadata.device_type.as_deref(), Some("RSD-1000"));
        assert_eq!(metadata.data_points, Some(2));

        // 表头取自第4行（索引3）
        assert_eq!(sheet.headers, vec!["序号", "电流(A)", "电压(V)"]);
        assert_eq!(sheet.records.len(), 2);
    }

    #[test]
    fn test_metadata_data_points_unparseable_defaults_to_zero() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "导出").unwrap();
        sheet.write_string(1, 0, "记录时间: 2025-06-01").unwrap();
        sheet.write_string(1, 1, "数据点数: 很多").unwrap();
        sheet.write_string(3, 0, "序号").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let parsed = SheetReader::parse_bytes(&bytes).expect("解析失败");
        assert_eq!(parsed.metadata.unwrap().data_points, Some(0));
    }

    #[test]
    fn test_empty_string_row_excluded() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "序号").unwrap();
        sheet.write_string(0, 1, "电压 (V)").unwrap();
        sheet.write_number(1, 0, 1.0).unwrap();
        sheet.write_number(1, 1, 20.1).unwrap();
        // 整行空字符串，必须被剔除
        sheet.write_string(2, 0, "").unwrap();
        sheet.write_string(2, 1, "").unwrap();
        sheet.write_number(3, 0, 2.0).unwrap();
        sheet.write_number(3, 1, 20.3).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let parsed = SheetReader::parse_bytes(&bytes).expect("解析失败");
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[1]["序号"], json!(2.0));
    }

    #[test]
    fn test_short_row_pads_missing_with_null() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "序号").unwrap();
        sheet.write_string(0, 1, "电压 (V)").unwrap();
        sheet.write_number(1, 0, 1.0).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let parsed = SheetReader::parse_bytes(&bytes).expect("解析失败");
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0]["电压 (V)"], Value::Null);
        assert_eq!(parsed.records[0].len(), parsed.headers.len());
    }

    #[test]
    fn test_header_only_sheet_yields_no_records() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "序号").unwrap();
        sheet.write_string(0, 1, "电压 (V)").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let parsed = SheetReader::parse_bytes(&bytes).expect("解析失败");
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.headers.len(), 2);
    }

    #[test]
    fn test_blank_workbook_is_missing_header() {
        let mut workbook = Workbook::new();
        workbook.add_worksheet();
        let bytes = workbook.save_to_buffer().unwrap();

        let err = SheetReader::parse_bytes(&bytes).unwrap_err();
        assert!(matches!(err, AppError::MissingHeaderError { .. }));
    }

    #[test]
    fn test_undecodable_bytes_fail_with_decode_error() {
        // 非zip、非OLE2、非UTF-8文本
        let bytes = [0x00u8, 0xFF, 0xFE, 0x01, 0x02, 0x80, 0x81];
        let err = SheetReader::parse_bytes(&bytes).unwrap_err();
        assert!(matches!(err, AppError::DecodeError { .. }));
    }

    #[test]
    fn test_parse_csv_text() {
        let csv = "序号,电流 (A),电压 (V)\n1,0.52,20.1\n2,0.55,20.3\n";
        let parsed = SheetReader::parse_bytes(csv.as_bytes()).expect("解析失败");

        assert_eq!(parsed.headers, vec!["序号", "电流 (A)", "电压 (V)"]);
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0]["电流 (A)"], json!(0.52));
        assert!(parsed.metadata.is_none());
    }

    #[test]
    fn test_parse_is_idempotent() {
        let bytes = metadata_workbook_bytes();
        let first = SheetReader::parse_bytes(&bytes).expect("第一次解析失败");
        let second = SheetReader::parse_bytes(&bytes).expect("第二次解析失败");
        assert_eq!(first, second);
    }
}
