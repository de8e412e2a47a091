/// 测量数据分析服务
///
/// 为仪表盘指标卡提供一次实验的汇总统计
use serde::Serialize;
use statrs::statistics::Statistics;

use crate::models::structs::CanonicalMeasurement;
use crate::utils::error::{AppError, AppResult};

/// 单个测量量的统计摘要
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
}

/// 一次实验的测量汇总
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementSummary {
    pub sample_count: usize,
    pub current_a: SeriesSummary,
    pub voltage_v: SeriesSummary,
    pub power_w: SeriesSummary,
    /// 采样时间跨度（秒）
    pub duration_s: f64,
    /// 按平均功率与时间跨度估算的电量 (Wh)
    pub energy_wh: f64,
}

/// 汇总一次实验的测量数据，空集返回分析错误
pub fn summarize(measurements: &[CanonicalMeasurement]) -> AppResult<MeasurementSummary> {
    if measurements.is_empty() {
        return Err(AppError::analysis_error("没有可分析的测量数据"));
    }

    let currents: Vec<f64> = measurements.iter().map(|m| m.current_a).collect();
    let voltages: Vec<f64> = measurements.iter().map(|m| m.voltage_v).collect();
    let powers: Vec<f64> = measurements.iter().map(|m| m.power_w).collect();

    let first_ts = measurements
        .iter()
        .map(|m| m.timestamp)
        .min()
        .expect("非空集合必有最小值");
    let last_ts = measurements
        .iter()
        .map(|m| m.timestamp)
        .max()
        .expect("非空集合必有最大值");
    let duration_s = (last_ts - first_ts).num_milliseconds() as f64 / 1000.0;

    let power_summary = series_summary(&powers);
    let energy_wh = power_summary.mean * duration_s / 3600.0;

    Ok(MeasurementSummary {
        sample_count: measurements.len(),
        current_a: series_summary(&currents),
        voltage_v: series_summary(&voltages),
        power_w: power_summary,
        duration_s,
        energy_wh,
    })
}

fn series_summary(values: &[f64]) -> SeriesSummary {
    SeriesSummary {
        mean: values.iter().mean(),
        min: Statistics::min(values.iter()),
        max: Statistics::max(values.iter()),
        // 单点样本的标准差记0而不是NaN
        std_dev: if values.len() > 1 {
            values.iter().std_dev()
        } else {
            0.0
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn measurement(seq: u32, current: f64, voltage: f64, power: f64, offset_s: i64) -> CanonicalMeasurement {
        CanonicalMeasurement {
            sequence_number: seq,
            current_a: current,
            voltage_v: voltage,
            power_w: power,
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
                + chrono::Duration::seconds(offset_s),
            device_address: None,
            device_type: None,
        }
    }

    #[test]
    fn test_summary_basic_statistics() {
        let measurements = vec![
            measurement(1, 0.5, 20.0, 10.0, 0),
            measurement(2, 0.7, 21.0, 14.0, 60),
        ];

        let summary = summarize(&measurements).expect("汇总失败");
        assert_eq!(summary.sample_count, 2);
        assert!((summary.current_a.mean - 0.6).abs() < 1e-9);
        assert_eq!(summary.voltage_v.min, 20.0);
        assert_eq!(summary.voltage_v.max, 21.0);
        assert_eq!(summary.duration_s, 60.0);
        // 平均功率12W持续60s → 0.2Wh
        assert!((summary.energy_wh - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_summary_single_sample_has_zero_std_dev() {
        let summary = summarize(&[measurement(1, 0.5, 20.0, 10.0, 0)]).expect("汇总失败");
        assert_eq!(summary.power_w.std_dev, 0.0);
        assert_eq!(summary.duration_s, 0.0);
    }

    #[test]
    fn test_summary_rejects_empty_input() {
        let err = summarize(&[]).unwrap_err();
        assert!(matches!(err, AppError::AnalysisError { .. }));
    }
}
