use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};

use pv_test_lib::logging;
use pv_test_lib::models::SimulationParams;
use pv_test_lib::services::domain::{analysis_service, simulation::CircuitSimulator};
use pv_test_lib::services::{
    DataImportService, ExcelExportService, PersistenceService, SqliteOrmPersistenceService,
};
use pv_test_lib::utils::config::{get_global_config, init_global_config};

/// 命令行入口
///
/// 子命令：
///   import <文件> [操作员]   解析表格并入库
///   list                     列出已入库的实验
///   export <实验ID> [路径]   导出实验数据为xlsx
///   simulate [场景]          运行电路仿真 (stc|overvoltage|overcurrent|low-light)
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_global_config(None).await.context("初始化配置失败")?;
    let config = get_global_config().context("读取配置失败")?;
    logging::init_logging(&config.logging_config);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(|s| s.as_str()).unwrap_or("help");

    match command {
        "import" => {
            let file = args
                .get(1)
                .map(PathBuf::from)
                .context("用法: import <文件> [操作员]")?;
            let operator = args
                .get(2)
                .cloned()
                .or(config.import_config.default_operator.clone());

            let persistence = open_persistence(&config).await?;
            let import_service = DataImportService::new(Arc::clone(&persistence));
            let result = import_service.import_from_file(&file, operator).await?;

            println!("导入完成: 实验 {}", result.experiment_id);
            println!(
                "  总行数 {}, 成功 {}, 成功率 {:.1}%",
                result.total_rows,
                result.successful_imports,
                result.success_rate()
            );

            let measurements = persistence
                .load_measurements_by_experiment(&result.experiment_id)
                .await?;
            if let Ok(summary) = analysis_service::summarize(&measurements) {
                println!(
                    "  电压 {:.2}~{:.2}V, 电流 {:.3}~{:.3}A, 平均功率 {:.2}W",
                    summary.voltage_v.min,
                    summary.voltage_v.max,
                    summary.current_a.min,
                    summary.current_a.max,
                    summary.power_w.mean
                );
            }
        }
        "list" => {
            let persistence = open_persistence(&config).await?;
            let experiments = persistence.load_all_experiments().await?;
            if experiments.is_empty() {
                println!("数据库中还没有实验记录");
            }
            for experiment in experiments {
                let count = persistence
                    .count_measurements(&experiment.experiment_id)
                    .await?;
                println!(
                    "{}  [{}] {}  {}个测量点",
                    experiment.experiment_id,
                    experiment.status,
                    experiment.experiment_name.as_deref().unwrap_or("-"),
                    count
                );
            }
        }
        "export" => {
            let experiment_id = args.get(1).context("用法: export <实验ID> [目标路径]")?;
            let target = args.get(2).map(PathBuf::from).or(Some(
                config.persistence_config.export_directory.clone(),
            ));

            let persistence = open_persistence(&config).await?;
            let export_service = ExcelExportService::new(persistence);
            let path = export_service.export_experiment(experiment_id, target).await?;
            println!("已导出: {}", path);
        }
        "simulate" => {
            let params = match args.get(1).map(|s| s.as_str()).unwrap_or("stc") {
                "stc" => SimulationParams::standard_test_conditions(),
                "overvoltage" => SimulationParams::overvoltage_fault(),
                "overcurrent" => SimulationParams::overcurrent_fault(),
                "low-light" => SimulationParams::low_irradiance(),
                other => bail!("未知仿真场景: {}", other),
            };

            let mut simulator =
                CircuitSimulator::with_step(params, config.simulation_config.step_s);
            let samples = simulator.run(config.simulation_config.duration_s);
            println!("时间(s)  电压(V)  电流(A)  功率(W)  关断器");
            for sample in samples.iter().step_by(10) {
                println!(
                    "{:>6.1}  {:>7.2}  {:>7.3}  {:>7.2}  {}",
                    sample.time_s,
                    sample.voltage,
                    sample.current,
                    sample.power,
                    if sample.rsd_on { "导通" } else { "关断" }
                );
            }
        }
        _ => {
            println!("光伏快速关断器测试数据后端");
            println!();
            println!("用法:");
            println!("  pv-test-system import <文件> [操作员]");
            println!("  pv-test-system list");
            println!("  pv-test-system export <实验ID> [目标路径]");
            println!("  pv-test-system simulate [stc|overvoltage|overcurrent|low-light]");
        }
    }

    Ok(())
}

async fn open_persistence(
    config: &pv_test_lib::AppConfig,
) -> anyhow::Result<Arc<dyn PersistenceService>> {
    let service =
        SqliteOrmPersistenceService::new(Some(&config.persistence_config.database_path))
            .await
            .context("打开数据库失败")?;
    Ok(Arc::new(service))
}
