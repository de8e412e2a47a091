/// 领域服务层：图表数据准备、电路仿真、测量分析

pub mod analysis_service;
pub mod chart_service;
pub mod simulation;

pub use analysis_service::{summarize, MeasurementSummary, SeriesSummary};
pub use chart_service::{build_chart_data, ChartData, ChartSeries};
pub use simulation::{CircuitSimulator, SimulationSample};
