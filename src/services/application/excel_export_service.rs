use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook};

use crate::services::traits::PersistenceService;
use crate::utils::error::{AppError, AppResult};
use crate::utils::time_utils;

/// Excel 导出服务
///
/// 从数据库读取一次实验的测量记录，写出带格式的数据表文件
pub struct ExcelExportService {
    persistence: Arc<dyn PersistenceService>,
}

impl ExcelExportService {
    pub fn new(persistence: Arc<dyn PersistenceService>) -> Self {
        Self { persistence }
    }

    /// 导出指定实验的测量数据
    ///
    /// `target_path` 为目录或无扩展名路径时，在其下生成带时间戳的文件名；
    /// 为None时写入系统临时目录。返回最终文件路径
    pub async fn export_experiment(
        &self,
        experiment_id: &str,
        target_path: Option<PathBuf>,
    ) -> AppResult<String> {
        let experiment = self
            .persistence
            .load_experiment(experiment_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found_error(
                    "ExperimentInfo",
                    format!("未找到ID为 {} 的实验记录", experiment_id),
                )
            })?;

        let measurements = self
            .persistence
            .load_measurements_by_experiment(experiment_id)
            .await?;
        if measurements.is_empty() {
            return Err(AppError::ValidationError {
                message: "暂无测量数据可导出".into(),
            });
        }

        let display_name = experiment
            .experiment_name
            .clone()
            .unwrap_or_else(|| experiment.experiment_id.clone());
        let timestamp = Local::now().format("%Y%m%d_%H%M").to_string();
        let filename = format!("{}_{}_实验数据.xlsx", display_name, timestamp);

        let file_path: PathBuf = if let Some(p) = target_path {
            let is_dir_path = p.is_dir() || p.extension().is_none();
            if is_dir_path {
                p.join(&filename)
            } else {
                p
            }
        } else {
            std::env::temp_dir().join(&filename)
        };

        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        // 创建 Workbook
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();

        // 表头格式
        let header_fmt = Format::new()
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_border(FormatBorder::Thin);
        let default_fmt = Format::new()
            .set_align(FormatAlign::Center)
            .set_border(FormatBorder::Thin);

        // 写表头
        let headers = vec![
            "序号",
            "时间戳",
            "电流 (A)",
            "电压 (V)",
            "功率 (W)",
            "设备地址",
            "设备类型",
        ];
        for (col, title) in headers.iter().enumerate() {
            sheet.write_with_format(0, col as u16, *title, &header_fmt)?;
        }

        // 写数据行
        let mut current_row = 1u32;
        for m in &measurements {
            sheet.write_number_with_format(
                current_row,
                0u16,
                m.sequence_number as f64,
                &default_fmt,
            )?;
            sheet.write_string_with_format(
                current_row,
                1u16,
                time_utils::format_bj(m.timestamp, "%Y-%m-%d %H:%M:%S"),
                &default_fmt,
            )?;
            sheet.write_number_with_format(current_row, 2u16, m.current_a, &default_fmt)?;
            sheet.write_number_with_format(current_row, 3u16, m.voltage_v, &default_fmt)?;
            sheet.write_number_with_format(current_row, 4u16, m.power_w, &default_fmt)?;
            if let Some(addr) = &m.device_address {
                sheet.write_string_with_format(current_row, 5u16, addr, &default_fmt)?;
            } else {
                sheet.write_blank(current_row, 5u16, &default_fmt)?;
            }
            if let Some(ty) = &m.device_type {
                sheet.write_string_with_format(current_row, 6u16, ty, &default_fmt)?;
            } else {
                sheet.write_blank(current_row, 6u16, &default_fmt)?;
            }
            current_row += 1;
        }

        // 列宽
        for col in 0..headers.len() {
            sheet.set_column_width(col as u16, 20)?;
        }

        workbook.save(&file_path)?;
        log::info!("实验数据已导出到 {}", file_path.to_string_lossy());
        Ok(file_path.to_string_lossy().to_string())
    }
}
