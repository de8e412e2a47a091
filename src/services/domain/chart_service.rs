/// 图表数据准备服务
///
/// 只负责把解析结果整理成序列数据（列筛选、横轴、固定配色），
/// 渲染由前端图表组件完成
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;

use crate::models::structs::ParsedSheet;

/// 序列名关键词 → 固定颜色
static SERIES_COLORS: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        ("电压", "#3b82f6"),
        ("电流", "#10b981"),
        ("功率", "#f59e0b"),
        ("温度", "#ef4444"),
    ]
});

/// 未匹配到关键词时的默认颜色
const DEFAULT_SERIES_COLOR: &str = "#8b5cf6";

/// 一条图表序列
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub color: String,
    pub data: Vec<f64>,
}

/// 整理好的图表数据
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    /// 横轴标签，取序号列的值，否则用1基位置
    pub x_axis: Vec<String>,
    pub series: Vec<ChartSeries>,
}

/// 根据序列名取颜色，按关键词列表顺序第一个命中者生效
pub fn color_for_column(name: &str) -> &'static str {
    SERIES_COLORS
        .iter()
        .find(|(keyword, _)| name.contains(keyword))
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_SERIES_COLOR)
}

/// 找出包含数字数据的列
pub fn numeric_columns(sheet: &ParsedSheet) -> Vec<String> {
    sheet
        .headers
        .iter()
        .filter(|header| {
            sheet
                .records
                .iter()
                .any(|record| record.get(*header).map(is_numeric).unwrap_or(false))
        })
        .cloned()
        .collect()
}

/// 找出序号/索引列
pub fn find_index_column(sheet: &ParsedSheet) -> Option<&String> {
    sheet.headers.iter().find(|h| {
        h.contains("序号") || h.to_lowercase().contains("index") || h.to_lowercase().contains("seq")
    })
}

/// 把解析结果整理成图表数据
///
/// 序号列只作横轴，不进序列；序列值解析不了的记0.0
pub fn build_chart_data(sheet: &ParsedSheet) -> ChartData {
    let index_column = find_index_column(sheet).cloned();

    let x_axis: Vec<String> = sheet
        .records
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            index_column
                .as_ref()
                .and_then(|col| record.get(col))
                .map(value_to_label)
                .unwrap_or_else(|| (idx + 1).to_string())
        })
        .collect();

    let series: Vec<ChartSeries> = numeric_columns(sheet)
        .into_iter()
        .filter(|col| Some(col) != index_column.as_ref())
        .map(|column| {
            let data: Vec<f64> = sheet
                .records
                .iter()
                .map(|record| {
                    record
                        .get(&column)
                        .and_then(value_to_f64)
                        .unwrap_or(0.0)
                })
                .collect();
            ChartSeries {
                color: color_for_column(&column).to_string(),
                name: column,
                data,
            }
        })
        .collect();

    ChartData { x_axis, series }
}

fn is_numeric(value: &Value) -> bool {
    value_to_f64(value).is_some()
}

fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn value_to_label(value: &Value) -> String {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(|i| i.to_string())
            .unwrap_or_else(|| n.to_string()),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn sheet() -> ParsedSheet {
        let headers: Vec<String> = vec![
            "序号".into(),
            "电压 (V)".into(),
            "电流 (A)".into(),
            "备注".into(),
        ];
        let rows = vec![
            vec![json!(1), json!(20.1), json!(0.52), json!("正常")],
            vec![json!(2), json!(20.3), json!(0.55), json!("正常")],
        ];
        let records = rows
            .into_iter()
            .map(|row| {
                headers
                    .iter()
                    .cloned()
                    .zip(row.into_iter())
                    .collect::<HashMap<_, _>>()
            })
            .collect();
        ParsedSheet {
            headers,
            records,
            metadata: None,
        }
    }

    #[test]
    fn test_fixed_color_mapping() {
        assert_eq!(color_for_column("电压 (V)"), "#3b82f6");
        assert_eq!(color_for_column("电流(A)"), "#10b981");
        assert_eq!(color_for_column("功率 (W)"), "#f59e0b");
        assert_eq!(color_for_column("环境温度"), "#ef4444");
        assert_eq!(color_for_column("湿度"), "#8b5cf6");
    }

    #[test]
    fn test_numeric_columns_exclude_text() {
        let columns = numeric_columns(&sheet());
        assert_eq!(columns, vec!["序号", "电压 (V)", "电流 (A)"]);
    }

    #[test]
    fn test_build_chart_data_uses_index_column_for_x_axis() {
        let data = build_chart_data(&sheet());
        assert_eq!(data.x_axis, vec!["1", "2"]);

        // 序号列不进序列
        let names: Vec<&str> = data.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["电压 (V)", "电流 (A)"]);
        assert_eq!(data.series[0].data, vec![20.1, 20.3]);
        assert_eq!(data.series[0].color, "#3b82f6");
    }

    #[test]
    fn test_build_chart_data_without_index_column() {
        let headers: Vec<String> = vec!["电压 (V)".into()];
        let records = vec![
            HashMap::from([("电压 (V)".to_string(), json!(20.0))]),
            HashMap::from([("电压 (V)".to_string(), json!("坏点"))]),
        ];
        let sheet = ParsedSheet {
            headers,
            records,
            metadata: None,
        };

        let data = build_chart_data(&sheet);
        assert_eq!(data.x_axis, vec!["1", "2"]);
        // 解析不了的值记0.0
        assert_eq!(data.series[0].data, vec![20.0, 0.0]);
    }
}
