// hydrolink\crates\hl_config\src/adapter_config.rs

//! 适配器配置
//!
//! ```json
//! {
//!   "model_type_name": "cfe",
//!   "init_config": "cfe_config.txt",
//!   "backend": { "type": "c", "library_file": "libcfe.so" },
//!   "protocols": { "mass_balance": { "tolerance": 1e-10, "fatal": true } }
//! }
//! ```
//!
//! 从文件加载时，相对路径按配置文件所在目录解析。

use crate::error::ConfigError;
use hl_bmi::c::DEFAULT_REGISTRATION_FUNCTION;
use hl_bmi::cpp::{DEFAULT_CREATOR_FUNCTION, DEFAULT_DESTROYER_FUNCTION};
use hl_bmi::dylib::resolve_library_path;
use hl_bmi::{AdapterOptions, BackendKind};
use hl_foundation::check_readable;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 一个 BMI 模型的构造参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// 模型类型名称
    pub model_type_name: String,

    /// 模型初始化配置文件
    pub init_config: PathBuf,

    /// 驱动数据文件（模型自行读取时给出）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forcing_file: Option<PathBuf>,

    /// 是否允许越过结束时间
    #[serde(default)]
    pub allow_exceed_end_time: bool,

    /// 时间步长是否固定
    #[serde(default = "default_fixed_time_step")]
    pub fixed_time_step: bool,

    /// 后端
    pub backend: BackendConfig,

    /// 协议配置，原样交给协议容器
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub protocols: serde_json::Value,
}

fn default_fixed_time_step() -> bool { true }
fn default_registration_function() -> String { DEFAULT_REGISTRATION_FUNCTION.to_string() }
fn default_creator_function() -> String { DEFAULT_CREATOR_FUNCTION.to_string() }
fn default_destroyer_function() -> String { DEFAULT_DESTROYER_FUNCTION.to_string() }

/// 后端配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    /// C 动态库
    C {
        /// 动态库文件
        library_file: PathBuf,
        /// 注册函数名
        #[serde(default = "default_registration_function")]
        registration_function: String,
    },
    /// C++ 动态库
    Cpp {
        /// 动态库文件
        library_file: PathBuf,
        /// 创建函数名
        #[serde(default = "default_creator_function")]
        creator_function: String,
        /// 销毁函数名
        #[serde(default = "default_destroyer_function")]
        destroyer_function: String,
    },
    /// Fortran 动态库（ISO-C-binding 代理）
    Fortran {
        /// 动态库文件
        library_file: PathBuf,
        /// 注册函数名
        #[serde(default = "default_registration_function")]
        registration_function: String,
    },
    /// 嵌入式 Python 类
    Python {
        /// 完整类型路径，如 `pkg.module.ClassName`
        python_type: String,
    },
}

impl BackendConfig {
    /// 后端种类
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::C { .. } => BackendKind::C,
            Self::Cpp { .. } => BackendKind::Cpp,
            Self::Fortran { .. } => BackendKind::Fortran,
            Self::Python { .. } => BackendKind::Python,
        }
    }

    /// 动态库文件（Python 后端为 `None`）
    pub fn library_file(&self) -> Option<&Path> {
        match self {
            Self::C { library_file, .. }
            | Self::Cpp { library_file, .. }
            | Self::Fortran { library_file, .. } => Some(library_file),
            Self::Python { .. } => None,
        }
    }

    fn library_file_mut(&mut self) -> Option<&mut PathBuf> {
        match self {
            Self::C { library_file, .. }
            | Self::Cpp { library_file, .. }
            | Self::Fortran { library_file, .. } => Some(library_file),
            Self::Python { .. } => None,
        }
    }
}

impl AdapterConfig {
    /// 从文件加载配置
    ///
    /// 相对路径按配置文件所在目录解析，随后做结构校验。
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        let mut config: AdapterConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if let Some(dir) = path.parent() {
            config.resolve_relative(dir);
        }
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 字符串解析，不解析相对路径
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: AdapterConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 把相对路径改为相对 `base`
    pub fn resolve_relative(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() && !p.as_os_str().is_empty() {
                *p = base.join(&*p);
            }
        };
        join(&mut self.init_config);
        if let Some(forcing) = self.forcing_file.as_mut() {
            join(forcing);
        }
        if let Some(library) = self.backend.library_file_mut() {
            join(library);
        }
    }

    /// 结构校验：名称与符号不能为空
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_type_name.trim().is_empty() {
            return Err(ConfigError::Missing("model_type_name".to_string()));
        }
        if self.init_config.as_os_str().is_empty() {
            return Err(ConfigError::Missing("init_config".to_string()));
        }
        let non_empty = |key: &str, value: &str| {
            if value.trim().is_empty() {
                Err(ConfigError::invalid(key, value, "不能为空"))
            } else {
                Ok(())
            }
        };
        match &self.backend {
            BackendConfig::C { registration_function, .. }
            | BackendConfig::Fortran { registration_function, .. } => {
                non_empty("backend.registration_function", registration_function)?;
            }
            BackendConfig::Cpp { creator_function, destroyer_function, .. } => {
                non_empty("backend.creator_function", creator_function)?;
                non_empty("backend.destroyer_function", destroyer_function)?;
            }
            BackendConfig::Python { python_type } => {
                if !python_type.contains('.') {
                    return Err(ConfigError::invalid(
                        "backend.python_type",
                        python_type,
                        "必须形如 '包.模块.类名'",
                    ));
                }
            }
        }
        if let Some(library) = self.backend.library_file() {
            if library.as_os_str().is_empty() {
                return Err(ConfigError::Missing("backend.library_file".to_string()));
            }
        }
        if !(self.protocols.is_null() || self.protocols.is_object()) {
            return Err(ConfigError::invalid("protocols", &self.protocols, "必须为 JSON 对象"));
        }
        Ok(())
    }

    /// 文件检查：配置文件、驱动文件和动态库均可读
    pub fn check_files(&self) -> Result<(), ConfigError> {
        check_readable(&self.init_config)
            .map_err(|e| ConfigError::invalid("init_config", self.init_config.display(), e.to_string()))?;
        if let Some(forcing) = &self.forcing_file {
            check_readable(forcing)
                .map_err(|e| ConfigError::invalid("forcing_file", forcing.display(), e.to_string()))?;
        }
        if let Some(library) = self.backend.library_file() {
            if resolve_library_path(library).is_none() {
                return Err(ConfigError::invalid(
                    "backend.library_file",
                    library.display(),
                    "动态库文件不可读",
                ));
            }
        }
        Ok(())
    }

    /// 适配器构造参数
    pub fn options(&self) -> AdapterOptions {
        let mut options = AdapterOptions::new(&self.model_type_name, &self.init_config)
            .with_allow_exceed_end_time(self.allow_exceed_end_time)
            .with_fixed_time_step(self.fixed_time_step);
        if let Some(forcing) = &self.forcing_file {
            options = options.with_forcing_file(forcing);
        }
        options
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(ConfigError::Io)?;
        Ok(())
    }
}
