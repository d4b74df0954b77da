// hydrolink\crates\hl_protocols\src/mass_balance.rs

//! 质量守恒检查
//!
//! 模型通过四个约定变量报告质量收支，每个被检查的时间步计算
//!
//! ```text
//! balance = mass_in - mass_out - mass_stored - mass_leaked
//! ```
//!
//! `|balance|` 超过容差（或为 NaN）即判定失败，按 `fatal` 配置报告为
//! 致命错误或警告。

use crate::error::{ErrorKind, ProtocolError, ProtocolOutcome};
use crate::protocol::{BmiProtocol, Context};
use hl_bmi::{values, Bmi, BmiAdapter, BmiError, BmiResult, SharedAdapter};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

/// 流入质量变量名
pub const INPUT_MASS_NAME: &str = "ngen::mass_in";
/// 流出质量变量名
pub const OUTPUT_MASS_NAME: &str = "ngen::mass_out";
/// 储存质量变量名
pub const STORED_MASS_NAME: &str = "ngen::mass_stored";
/// 渗漏质量变量名
pub const LEAKED_MASS_NAME: &str = "ngen::mass_leaked";

/// 配置键
pub const CONFIGURATION_KEY: &str = "mass_balance";

const MASS_NAMES: [&str; 4] = [
    INPUT_MASS_NAME,
    OUTPUT_MASS_NAME,
    STORED_MASS_NAME,
    LEAKED_MASS_NAME,
];

// ============================================================================
// 配置
// ============================================================================

/// 质量守恒检查配置
///
/// `tolerance` 可写成数字或数字字符串（如 `"1e-5"`、`"NaN"`）。
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MassBalanceConfig {
    /// 允许的绝对误差
    #[serde(default = "default_tolerance", deserialize_with = "tolerance_value")]
    pub tolerance: f64,
    /// 是否启用检查
    #[serde(default = "default_check")]
    pub check: bool,
    /// 检查频率：`f > 0` 每 `f` 步一次，`-1` 仅在最后一步
    #[serde(default = "default_frequency")]
    pub frequency: i64,
    /// 失败是否致命
    #[serde(default)]
    pub fatal: bool,
}

fn default_tolerance() -> f64 {
    1.0e-16
}

fn default_check() -> bool {
    true
}

fn default_frequency() -> i64 {
    1
}

impl Default for MassBalanceConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            check: default_check(),
            frequency: default_frequency(),
            fatal: false,
        }
    }
}

fn tolerance_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Number(v) => Ok(v),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("tolerance value '{s}' is not a number"))),
    }
}

// ============================================================================
// 协议
// ============================================================================

/// 质量守恒协议
pub struct MassBalance {
    model: Option<SharedAdapter>,
    supported: bool,
    check: bool,
    fatal: bool,
    tolerance: f64,
    frequency: i64,
}

impl MassBalance {
    /// 创建未配置的协议（检查关闭）
    pub fn new(model: Option<SharedAdapter>) -> Self {
        let defaults = MassBalanceConfig::default();
        Self {
            model,
            supported: false,
            check: false,
            fatal: defaults.fatal,
            tolerance: defaults.tolerance,
            frequency: defaults.frequency,
        }
    }

    /// 模型是否提供了单位一致的质量变量
    pub fn is_supported(&self) -> bool {
        self.supported
    }

    /// 当前是否会执行检查
    pub fn is_enabled(&self) -> bool {
        self.supported && self.check
    }

    /// 当前容差
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// 当前检查频率
    pub fn frequency(&self) -> i64 {
        self.frequency
    }

    fn error(&self, kind: ErrorKind, message: impl Into<String>) -> ProtocolError {
        ProtocolError::new(kind, CONFIGURATION_KEY, message)
    }

    fn step_selected(&self, ctx: &Context<'_>) -> bool {
        match self.frequency {
            -1 => ctx.current_time_step == ctx.total_steps,
            f if f > 0 => ctx.current_time_step % f == 0,
            _ => false,
        }
    }

    fn apply(&mut self, config: MassBalanceConfig) -> ProtocolOutcome {
        if config.tolerance.is_nan() {
            return Err(self.error(
                ErrorKind::ProtocolWarning,
                "tolerance value 'NaN' is not a number. Disabling mass balance protocol.",
            ));
        }
        if config.frequency == 0 || config.frequency < -1 {
            return Err(self.error(
                ErrorKind::ProtocolWarning,
                format!(
                    "frequency value '{}' is invalid. Disabling mass balance protocol.",
                    config.frequency
                ),
            ));
        }
        self.tolerance = config.tolerance;
        self.frequency = config.frequency;
        self.fatal = config.fatal;
        self.check = config.check;
        Ok(())
    }
}

fn component_name(model: &dyn BmiAdapter) -> String {
    model
        .get_component_name()
        .unwrap_or_else(|_| model.model_name().to_string())
}

fn read_mass(model: &dyn BmiAdapter, name: &str) -> BmiResult<f64> {
    values::get_value::<f64, _>(model, name)?
        .first()
        .copied()
        .ok_or_else(|| BmiError::backend(model.model_name(), format!("变量 {name} 没有值")))
}

impl BmiProtocol for MassBalance {
    fn name(&self) -> &'static str {
        CONFIGURATION_KEY
    }

    fn check_support(&mut self) -> ProtocolOutcome {
        self.supported = false;
        let uninitialized = || {
            ProtocolError::new(
                ErrorKind::UninitializedModel,
                CONFIGURATION_KEY,
                "Cannot check mass balance for uninitialized model. Disabling mass balance protocol.",
            )
        };
        let Some(shared) = &self.model else {
            return Err(uninitialized());
        };
        let model = shared.lock();
        if !model.is_initialized() {
            return Err(uninitialized());
        }

        let mut units = Vec::with_capacity(MASS_NAMES.len());
        for name in MASS_NAMES {
            let check = read_mass(&**model, name).and_then(|_| model.get_var_units(name));
            match check {
                Ok(u) => units.push(u),
                Err(e) => {
                    return Err(self.error(
                        ErrorKind::IntegrationError,
                        format!(
                            "Error getting mass balance values for module '{}': {e}",
                            component_name(&**model)
                        ),
                    ))
                }
            }
        }
        if units.windows(2).any(|w| w[0] != w[1]) {
            return Err(self.error(
                ErrorKind::IntegrationError,
                format!(
                    "mass balance variables of module '{}' have inconsistent units {units:?}, cannot perform mass balance",
                    component_name(&**model)
                ),
            ));
        }
        drop(model);
        self.supported = true;
        Ok(())
    }

    fn initialize(&mut self, properties: &serde_json::Value) -> ProtocolOutcome {
        self.check = false;
        self.check_support()?;
        let Some(section) = properties.get(CONFIGURATION_KEY) else {
            return Ok(());
        };
        let config = MassBalanceConfig::deserialize(section).map_err(|e| {
            self.error(
                ErrorKind::ProtocolWarning,
                format!("{e}. Disabling mass balance protocol."),
            )
        })?;
        self.apply(config)
    }

    fn run(&self, ctx: &Context<'_>) -> ProtocolOutcome {
        if !(self.is_enabled() && self.step_selected(ctx)) {
            return Ok(());
        }
        let uninitialized = || {
            self.error(
                ErrorKind::UninitializedModel,
                "Cannot run mass balance for uninitialized model.",
            )
        };
        let Some(shared) = &self.model else {
            return Err(uninitialized());
        };
        let model = shared.lock();
        // 支持检查之后模型可能已被 finalize
        if !model.is_initialized() {
            return Err(uninitialized());
        }

        let mut mass = [0.0; 4];
        for (slot, name) in mass.iter_mut().zip(MASS_NAMES) {
            *slot = read_mass(&**model, name).map_err(|e| {
                self.error(
                    ErrorKind::IntegrationError,
                    format!("Error getting mass balance value '{name}': {e}"),
                )
            })?;
        }
        let [mass_in, mass_out, mass_stored, mass_leaked] = mass;
        let balance = mass_in - mass_out - mass_stored - mass_leaked;
        if balance.is_nan() || balance.abs() > self.tolerance {
            let kind = if self.fatal {
                ErrorKind::ProtocolError
            } else {
                ErrorKind::ProtocolWarning
            };
            return Err(self.error(
                kind,
                format!(
                    "at timestep {} ({}) at feature id {}\n\tMass balance check failed for {}\n\t\
                     {INPUT_MASS_NAME} ({mass_in}) - {OUTPUT_MASS_NAME} ({mass_out}) - \
                     {STORED_MASS_NAME} ({mass_stored}) - {LEAKED_MASS_NAME} ({mass_leaked}) = {balance}\n\t\
                     tolerance: {}",
                    ctx.current_time_step,
                    ctx.timestamp,
                    ctx.id,
                    component_name(&**model),
                    self.tolerance
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(step: i64, total: i64) -> Context<'static> {
        Context::new(step, total, "t", "cat-1")
    }

    #[test]
    fn test_config_defaults() {
        let config: MassBalanceConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config, MassBalanceConfig::default());
        assert_eq!(config.tolerance, 1.0e-16);
        assert!(config.check);
        assert_eq!(config.frequency, 1);
        assert!(!config.fatal);
    }

    #[test]
    fn test_tolerance_accepts_text() {
        let config: MassBalanceConfig =
            serde_json::from_value(json!({"tolerance": "1e-5", "fatal": true})).unwrap();
        assert_eq!(config.tolerance, 1e-5);
        assert!(config.fatal);
        let config: MassBalanceConfig = serde_json::from_value(json!({"tolerance": "NaN"})).unwrap();
        assert!(config.tolerance.is_nan());
        assert!(serde_json::from_value::<MassBalanceConfig>(json!({"tolerance": "abc"})).is_err());
    }

    #[test]
    fn test_frequency_selection() {
        let mut mb = MassBalance::new(None);
        mb.frequency = 2;
        assert!(mb.step_selected(&ctx(0, 2)));
        assert!(!mb.step_selected(&ctx(1, 2)));
        assert!(mb.step_selected(&ctx(2, 2)));
        mb.frequency = -1;
        assert!(!mb.step_selected(&ctx(1, 2)));
        assert!(mb.step_selected(&ctx(2, 2)));
    }

    #[test]
    fn test_invalid_settings_disable() {
        let mut mb = MassBalance::new(None);
        let nan = MassBalanceConfig {
            tolerance: f64::NAN,
            ..MassBalanceConfig::default()
        };
        let err = mb.apply(nan).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtocolWarning);
        assert!(err.to_string().contains("tolerance value 'NaN'"));
        assert!(!mb.check);

        let zero = MassBalanceConfig {
            frequency: 0,
            ..MassBalanceConfig::default()
        };
        assert!(mb.apply(zero).is_err());
        assert!(!mb.check);
    }

    #[test]
    fn test_missing_model() {
        let mut mb = MassBalance::new(None);
        let err = mb.initialize(&json!({"mass_balance": {}})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UninitializedModel);
        assert!(err.to_string().contains("Disabling mass balance protocol."));
        assert!(!mb.is_enabled());
        assert_eq!(mb.run(&ctx(0, 1)), Ok(()));
    }
}
