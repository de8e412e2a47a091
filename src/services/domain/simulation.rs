/// 光伏关断器电路仿真
///
/// 示意性的数值模型：组件电压按温度系数与辐照度折算，
/// 电流按负载欧姆定律折算并受组件短路电流限幅；
/// 电压跌破关断阈值后仅余泄漏电流。支持过压/过流故障注入
use rand::Rng;
use serde::Serialize;

use crate::models::enums::FaultType;
use crate::models::structs::SimulationParams;

/// 组件电压温度系数（-0.35%/°C）
const TEMP_COEFF_PER_C: f64 = -0.0035;
/// 故障注入起始时间（秒）
const FAULT_ONSET_S: f64 = 5.0;
/// 电压噪声幅度 (V)
const VOLTAGE_NOISE_V: f64 = 0.5;
/// 电流噪声幅度 (A)
const CURRENT_NOISE_A: f64 = 0.05;

/// 一个仿真采样点
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSample {
    pub time_s: f64,
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
    /// 关断器是否处于导通状态
    pub rsd_on: bool,
    pub irradiance: f64,
    pub temperature: f64,
}

/// 电路仿真器
///
/// 每次 [`CircuitSimulator::step`] 前进一个步长并产出一个采样点
pub struct CircuitSimulator {
    params: SimulationParams,
    time_s: f64,
    step_s: f64,
}

impl CircuitSimulator {
    /// 以默认步长100ms创建仿真器
    pub fn new(params: SimulationParams) -> Self {
        Self::with_step(params, 0.1)
    }

    pub fn with_step(params: SimulationParams, step_s: f64) -> Self {
        Self {
            params,
            time_s: 0.0,
            step_s,
        }
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn elapsed_s(&self) -> f64 {
        self.time_s
    }

    /// 复位仿真时间
    pub fn reset(&mut self) {
        self.time_s = 0.0;
    }

    /// 无噪声的理论组件电压
    pub fn nominal_voltage(&self, time_s: f64) -> f64 {
        let mut voltage = self.params.module_vmp;

        // 温度折算
        let temp_diff = self.params.temperature - 25.0;
        voltage *= 1.0 + TEMP_COEFF_PER_C * temp_diff;

        // 辐照度折算
        voltage *= self.params.irradiance / 1000.0;

        // 过压故障注入
        if self.params.fault_type == FaultType::Overvoltage && time_s > FAULT_ONSET_S {
            voltage *= 1.0 + self.params.fault_magnitude / 100.0;
        }

        voltage.max(0.0)
    }

    /// 无噪声的理论回路电流
    pub fn nominal_current(&self, time_s: f64) -> f64 {
        let voltage = self.nominal_voltage(time_s);
        let mut current = voltage / self.params.load_value;

        // 辐照度折算
        current *= self.params.irradiance / 1000.0;

        // 过流故障注入
        if self.params.fault_type == FaultType::Overcurrent && time_s > FAULT_ONSET_S {
            current *= 1.0 + self.params.fault_magnitude / 100.0;
        }

        // 不超过组件短路电流
        current = current.min(self.params.module_isc);

        // 电压低于关断阈值时关断器断开，只剩泄漏电流
        if voltage <= self.params.rsd_voltage_threshold {
            current = self.params.rsd_leakage_current_ma / 1000.0;
        }

        current.max(0.0)
    }

    /// 前进一个步长并产出带噪声的采样点
    pub fn step<R: Rng>(&mut self, rng: &mut R) -> SimulationSample {
        self.time_s += self.step_s;
        let t = self.time_s;

        let voltage =
            (self.nominal_voltage(t) + (rng.gen::<f64>() - 0.5) * VOLTAGE_NOISE_V).max(0.0);
        let current =
            (self.nominal_current(t) + (rng.gen::<f64>() - 0.5) * CURRENT_NOISE_A).max(0.0);
        let power = voltage * current;

        SimulationSample {
            time_s: t,
            voltage,
            current,
            power,
            rsd_on: voltage > self.params.rsd_voltage_threshold,
            irradiance: self.params.irradiance,
            temperature: self.params.temperature,
        }
    }

    /// 运行到指定时长，返回全部采样点
    pub fn run(&mut self, duration_s: f64) -> Vec<SimulationSample> {
        let mut rng = rand::thread_rng();
        let mut samples = Vec::new();
        while self.time_s + self.step_s <= duration_s + 1e-9 {
            samples.push(self.step(&mut rng));
        }
        samples
    }
}

/// 预设仿真场景
impl SimulationParams {
    /// 标准测试条件 STC: 1000W/m², 25°C，无故障
    pub fn standard_test_conditions() -> Self {
        Self::default()
    }

    /// 过压故障：120%额定电压
    pub fn overvoltage_fault() -> Self {
        Self {
            fault_type: FaultType::Overvoltage,
            fault_magnitude: 20.0,
            ..Self::default()
        }
    }

    /// 过流故障：150%额定电流
    pub fn overcurrent_fault() -> Self {
        Self {
            fault_type: FaultType::Overcurrent,
            fault_magnitude: 50.0,
            ..Self::default()
        }
    }

    /// 低辐照条件: 200W/m², 15°C
    pub fn low_irradiance() -> Self {
        Self {
            irradiance: 200.0,
            temperature: 15.0,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nominal_voltage_at_stc_is_vmp() {
        let sim = CircuitSimulator::new(SimulationParams::standard_test_conditions());
        // STC下温度/辐照折算系数都是1
        assert!((sim.nominal_voltage(1.0) - 40.5).abs() < 1e-9);
    }

    #[test]
    fn test_temperature_derating_lowers_voltage() {
        let params = SimulationParams {
            temperature: 45.0,
            ..SimulationParams::default()
        };
        let sim = CircuitSimulator::new(params);
        let expected = 40.5 * (1.0 + TEMP_COEFF_PER_C * 20.0);
        assert!((sim.nominal_voltage(1.0) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_low_irradiance_trips_rsd_to_leakage_current() {
        // 200W/m²下电压约8V，低于30V阈值，只剩0.5mA泄漏电流
        let sim = CircuitSimulator::new(SimulationParams::low_irradiance());
        let voltage = sim.nominal_voltage(1.0);
        assert!(voltage <= sim.params().rsd_voltage_threshold);
        assert!((sim.nominal_current(1.0) - 0.0005).abs() < 1e-12);
    }

    #[test]
    fn test_overvoltage_fault_applies_after_onset() {
        let sim = CircuitSimulator::new(SimulationParams::overvoltage_fault());
        let before = sim.nominal_voltage(4.0);
        let after = sim.nominal_voltage(6.0);
        assert!((after / before - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_overcurrent_fault_applies_after_onset() {
        let sim = CircuitSimulator::new(SimulationParams::overcurrent_fault());
        let before = sim.nominal_current(4.0);
        let after = sim.nominal_current(6.0);
        assert!(after > before);
        assert!(after <= sim.params().module_isc + 1e-9);
    }

    #[test]
    fn test_current_clamped_to_isc() {
        // 极小负载阻值会把欧姆电流推到Isc以上，必须被限幅
        let params = SimulationParams {
            load_value: 0.1,
            ..SimulationParams::default()
        };
        let sim = CircuitSimulator::new(params);
        assert!((sim.nominal_current(1.0) - sim.params().module_isc).abs() < 1e-9);
    }

    #[test]
    fn test_run_produces_expected_sample_count() {
        let mut sim = CircuitSimulator::new(SimulationParams::standard_test_conditions());
        let samples = sim.run(10.0);
        assert_eq!(samples.len(), 100);
        assert!((samples.last().unwrap().time_s - 10.0).abs() < 1e-6);
        // STC下全程导通
        assert!(samples.iter().all(|s| s.rsd_on));
    }

    #[test]
    fn test_samples_stay_non_negative() {
        let mut sim = CircuitSimulator::new(SimulationParams::low_irradiance());
        for sample in sim.run(10.0) {
            assert!(sample.voltage >= 0.0);
            assert!(sample.current >= 0.0);
            assert!(sample.power >= 0.0);
        }
    }
}
