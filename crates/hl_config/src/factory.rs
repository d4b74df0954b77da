// hydrolink\crates\hl_config\src/factory.rs

//! 适配器工厂
//!
//! 按 [`BackendConfig`] 选择具体适配器。构建只加载后端，不初始化模型，
//! 调用方决定何时调用 `initialize_configured`。

use crate::adapter_config::{AdapterConfig, BackendConfig};
use crate::error::ConfigError;
use hl_bmi::{share, BmiAdapter, CAdapter, CppAdapter, FortranAdapter, SharedAdapter};
use hl_protocols::BmiProtocols;
use tracing::info;

/// 适配器工厂
pub struct AdapterFactory;

impl AdapterFactory {
    /// 构建未初始化的适配器
    pub fn build(config: &AdapterConfig) -> Result<Box<dyn BmiAdapter>, ConfigError> {
        config.validate()?;
        let options = config.options();
        let adapter: Box<dyn BmiAdapter> = match &config.backend {
            BackendConfig::C { library_file, registration_function } => {
                Box::new(CAdapter::load(options, library_file, registration_function)?)
            }
            BackendConfig::Cpp { library_file, creator_function, destroyer_function } => Box::new(
                CppAdapter::load(options, library_file, creator_function, destroyer_function)?,
            ),
            BackendConfig::Fortran { library_file, registration_function } => {
                Box::new(FortranAdapter::load(options, library_file, registration_function)?)
            }
            BackendConfig::Python { python_type } => Self::python(options, python_type)?,
        };
        info!(
            model = %config.model_type_name,
            backend = ?config.backend.kind(),
            "已构建 BMI 适配器"
        );
        Ok(adapter)
    }

    /// 构建并初始化适配器
    pub fn build_initialized(config: &AdapterConfig) -> Result<Box<dyn BmiAdapter>, ConfigError> {
        let mut adapter = Self::build(config)?;
        adapter.initialize_configured()?;
        Ok(adapter)
    }

    /// 构建可与协议共享的已初始化适配器
    pub fn build_shared(config: &AdapterConfig) -> Result<SharedAdapter, ConfigError> {
        Ok(share(Self::build_initialized(config)?))
    }

    /// 按配置中的 `protocols` 构建协议容器
    pub fn protocols(config: &AdapterConfig, model: &SharedAdapter) -> BmiProtocols {
        BmiProtocols::new(Some(model.clone()), &config.protocols)
    }

    #[cfg(feature = "python")]
    fn python(
        options: hl_bmi::AdapterOptions,
        python_type: &str,
    ) -> Result<Box<dyn BmiAdapter>, ConfigError> {
        Ok(Box::new(hl_bmi::PyAdapter::load(options, python_type)?))
    }

    #[cfg(not(feature = "python"))]
    fn python(
        options: hl_bmi::AdapterOptions,
        python_type: &str,
    ) -> Result<Box<dyn BmiAdapter>, ConfigError> {
        Err(hl_bmi::BmiError::unsupported(
            options.model_name,
            format!("Python 后端 ({python_type}) 需要启用 python feature"),
        )
        .into())
    }
}
