// hydrolink\crates\hl_bmi\src/adapter.rs

//! 适配器共享状态
//!
//! 所有后端适配器都内嵌一个 [`AdapterBase`]，由它负责：
//!
//! 1. 构造前校验初始化配置文件可读
//! 2. 初始化状态机 `NotStarted -> Succeeded | Failed(msg)`，失败不可重试
//! 3. 根据模型时间单位缓存换算系数
//! 4. 释放的幂等性（显式调用与 `Drop` 共用同一路径）
//! 5. 元数据与固定时间步长的缓存

use crate::error::{BmiError, BmiResult};
use hl_foundation::fs::check_readable;
use hl_foundation::units::TimeUnit;
use std::cell::{Cell, OnceCell};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 初始化状态
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InitState {
    /// 尚未尝试
    #[default]
    NotStarted,
    /// 尝试失败，保存首次失败信息
    Failed(String),
    /// 初始化成功
    Succeeded,
}

/// 适配器构造参数（与后端无关的部分）
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterOptions {
    /// 模型类型名称
    pub model_name: String,
    /// 初始化配置文件
    pub init_config: PathBuf,
    /// 驱动数据文件（模型自行读取时给出）
    pub forcing_file: Option<PathBuf>,
    /// 是否允许越过结束时间
    pub allow_exceed_end_time: bool,
    /// 时间步长是否固定
    pub has_fixed_time_step: bool,
}

impl AdapterOptions {
    /// 使用默认策略创建
    pub fn new(model_name: impl Into<String>, init_config: impl Into<PathBuf>) -> Self {
        Self {
            model_name: model_name.into(),
            init_config: init_config.into(),
            forcing_file: None,
            allow_exceed_end_time: false,
            has_fixed_time_step: true,
        }
    }

    /// 设置驱动数据文件
    pub fn with_forcing_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.forcing_file = Some(path.into());
        self
    }

    /// 设置是否允许越过结束时间
    pub fn with_allow_exceed_end_time(mut self, allow: bool) -> Self {
        self.allow_exceed_end_time = allow;
        self
    }

    /// 设置时间步长是否固定
    pub fn with_fixed_time_step(mut self, fixed: bool) -> Self {
        self.has_fixed_time_step = fixed;
        self
    }
}

/// 适配器共享状态
#[derive(Debug)]
pub struct AdapterBase {
    model_name: String,
    init_config: PathBuf,
    forcing_file: Option<PathBuf>,
    allow_exceed_end_time: bool,
    has_fixed_time_step: bool,
    state: InitState,
    finalized: bool,
    time_convert_factor: Option<f64>,
    fixed_time_step: Cell<Option<f64>>,
    component_name: OnceCell<String>,
    input_item_count: OnceCell<usize>,
    output_item_count: OnceCell<usize>,
    input_var_names: OnceCell<Vec<String>>,
    output_var_names: OnceCell<Vec<String>>,
}

impl AdapterBase {
    /// 创建共享状态，配置文件不可读时立即失败
    pub fn new(options: AdapterOptions) -> BmiResult<Self> {
        check_readable(&options.init_config).map_err(|e| {
            BmiError::config(
                &options.model_name,
                format!(
                    "无法使用不可读的文件 '{}' 创建并初始化 {}: {e}",
                    options.init_config.display(),
                    options.model_name
                ),
            )
        })?;
        Ok(Self {
            model_name: options.model_name,
            init_config: options.init_config,
            forcing_file: options.forcing_file,
            allow_exceed_end_time: options.allow_exceed_end_time,
            has_fixed_time_step: options.has_fixed_time_step,
            state: InitState::NotStarted,
            finalized: false,
            time_convert_factor: None,
            fixed_time_step: Cell::new(None),
            component_name: OnceCell::new(),
            input_item_count: OnceCell::new(),
            output_item_count: OnceCell::new(),
            input_var_names: OnceCell::new(),
            output_var_names: OnceCell::new(),
        })
    }

    // ========================================================================
    // 访问器
    // ========================================================================

    /// 模型名称
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// 初始化配置文件
    pub fn init_config(&self) -> &Path {
        &self.init_config
    }

    /// 驱动数据文件
    pub fn forcing_file(&self) -> Option<&Path> {
        self.forcing_file.as_deref()
    }

    /// 是否使用驱动数据文件
    pub fn uses_forcing_file(&self) -> bool {
        self.forcing_file
            .as_deref()
            .is_some_and(|p| !p.as_os_str().is_empty())
    }

    /// 是否允许越过结束时间
    pub fn allow_exceed_end_time(&self) -> bool {
        self.allow_exceed_end_time
    }

    /// 时间步长是否固定
    pub fn has_fixed_time_step(&self) -> bool {
        self.has_fixed_time_step
    }

    /// 当前初始化状态
    pub fn state(&self) -> &InitState {
        &self.state
    }

    /// 首次初始化失败的信息
    pub fn init_failure_message(&self) -> Option<&str> {
        match &self.state {
            InitState::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    /// 是否已成功初始化且尚未释放
    pub fn is_initialized(&self) -> bool {
        self.state == InitState::Succeeded && !self.finalized
    }

    /// 是否已释放
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    // ========================================================================
    // 初始化状态机
    // ========================================================================

    /// 协调 `initialize(config)` 传入的配置路径
    ///
    /// 尚未尝试初始化时，不同路径会记录警告并替换；一旦尝试过，配置不可再变。
    pub fn reconcile_config(&mut self, config_file: &Path) -> BmiResult<()> {
        if config_file == self.init_config {
            return Ok(());
        }
        match self.state {
            InitState::NotStarted if !self.finalized => {
                warn!(
                    model = %self.model_name,
                    old = %self.init_config.display(),
                    new = %config_file.display(),
                    "初始化前更换了 BMI 配置文件"
                );
                check_readable(config_file).map_err(|e| {
                    BmiError::config(&self.model_name, format!("新的配置文件不可读: {e}"))
                })?;
                self.init_config = config_file.to_path_buf();
                Ok(())
            }
            _ => Err(BmiError::config(
                &self.model_name,
                format!(
                    "模型已使用 '{}' 初始化，不能更换为 '{}'",
                    self.init_config.display(),
                    config_file.display()
                ),
            )),
        }
    }

    /// 执行一次初始化尝试
    ///
    /// `init` 调用后端原生初始化并返回模型报告的时间单位字符串。成功后缓存
    /// 时间换算系数；任何失败（包括无法识别的时间单位）都被记录且不可重试。
    pub fn initialize_with<F>(&mut self, init: F) -> BmiResult<()>
    where
        F: FnOnce(&Path) -> BmiResult<String>,
    {
        if self.finalized {
            return Err(BmiError::config(&self.model_name, "模型已释放，不能再次初始化"));
        }
        match &self.state {
            InitState::Succeeded => return Ok(()),
            InitState::Failed(msg) => {
                return Err(BmiError::PreviousInitFailure {
                    model: self.model_name.clone(),
                    message: msg.clone(),
                })
            }
            InitState::NotStarted => {}
        }

        let outcome = init(&self.init_config).and_then(|units| {
            TimeUnit::parse(&units).map_err(|e| {
                BmiError::config(&self.model_name, format!("模型时间单位无法识别: {e}"))
            })
        });

        match outcome {
            Ok(unit) => {
                self.time_convert_factor = Some(unit.seconds_factor());
                self.state = InitState::Succeeded;
                info!(model = %self.model_name, time_units = %unit, "模型初始化完成");
                Ok(())
            }
            Err(e) => {
                self.state = InitState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// 确认模型可被调用
    pub fn ensure_ready(&self) -> BmiResult<()> {
        if self.finalized {
            return Err(BmiError::backend(&self.model_name, "模型已释放"));
        }
        match &self.state {
            InitState::Succeeded => Ok(()),
            InitState::Failed(msg) => Err(BmiError::PreviousInitFailure {
                model: self.model_name.clone(),
                message: msg.clone(),
            }),
            InitState::NotStarted => Err(BmiError::backend(&self.model_name, "模型尚未初始化")),
        }
    }

    /// 幂等释放
    ///
    /// 仅在首次调用且曾尝试初始化时执行 `teardown`。无论 `teardown` 是否成功，
    /// 适配器都被标记为已释放，失败不会重试。
    pub fn finalize_with<F>(&mut self, teardown: F) -> BmiResult<()>
    where
        F: FnOnce() -> BmiResult<()>,
    {
        if self.finalized {
            return Ok(());
        }
        self.finalized = true;
        if self.state == InitState::NotStarted {
            return Ok(());
        }
        teardown()
    }

    // ========================================================================
    // 时间换算
    // ========================================================================

    /// 时间换算系数（模型时间 -> 秒），初始化前为 1
    pub fn time_convert_factor(&self) -> f64 {
        self.time_convert_factor.unwrap_or(1.0)
    }

    /// 模型时间转换为秒
    pub fn convert_model_time_to_seconds(&self, model_time: f64) -> f64 {
        model_time * self.time_convert_factor()
    }

    /// 秒转换为模型时间
    pub fn convert_seconds_to_model_time(&self, seconds: f64) -> f64 {
        seconds / self.time_convert_factor()
    }

    // ========================================================================
    // 缓存
    // ========================================================================

    /// 时间步长，固定步长模型只查询一次
    pub fn cached_time_step<F>(&self, query: F) -> BmiResult<f64>
    where
        F: FnOnce() -> BmiResult<f64>,
    {
        if let Some(step) = self.fixed_time_step.get() {
            return Ok(step);
        }
        let step = query()?;
        if self.has_fixed_time_step {
            self.fixed_time_step.set(Some(step));
        }
        Ok(step)
    }

    /// 组件名，首次成功查询后缓存
    pub fn cached_component_name<F>(&self, query: F) -> BmiResult<String>
    where
        F: FnOnce() -> BmiResult<String>,
    {
        cached(&self.component_name, query)
    }

    /// 输入变量个数，首次成功查询后缓存
    pub fn cached_input_item_count<F>(&self, query: F) -> BmiResult<usize>
    where
        F: FnOnce() -> BmiResult<usize>,
    {
        cached(&self.input_item_count, query)
    }

    /// 输出变量个数，首次成功查询后缓存
    pub fn cached_output_item_count<F>(&self, query: F) -> BmiResult<usize>
    where
        F: FnOnce() -> BmiResult<usize>,
    {
        cached(&self.output_item_count, query)
    }

    /// 输入变量名，首次成功查询后缓存
    pub fn cached_input_var_names<F>(&self, query: F) -> BmiResult<Vec<String>>
    where
        F: FnOnce() -> BmiResult<Vec<String>>,
    {
        cached(&self.input_var_names, query)
    }

    /// 输出变量名，首次成功查询后缓存
    pub fn cached_output_var_names<F>(&self, query: F) -> BmiResult<Vec<String>>
    where
        F: FnOnce() -> BmiResult<Vec<String>>,
    {
        cached(&self.output_var_names, query)
    }
}

fn cached<T: Clone, F>(cell: &OnceCell<T>, query: F) -> BmiResult<T>
where
    F: FnOnce() -> BmiResult<T>,
{
    if let Some(value) = cell.get() {
        return Ok(value.clone());
    }
    let value = query()?;
    Ok(cell.get_or_init(|| value).clone())
}

// ========================================================================
// 共享的缓冲区辅助
// ========================================================================

/// 标量网格（rank 0）的几何查询以零填充代替报错
///
/// 返回 `true` 表示已处理，调用方无需再访问后端。
pub fn fill_degenerate_grid<T: Copy + Default>(rank: i32, dest: &mut [T]) -> bool {
    if rank > 0 {
        return false;
    }
    dest.fill(T::default());
    true
}

/// 检查调用方缓冲区至少能容纳 `required` 字节
pub fn check_buffer_len(model: &str, name: &str, required: usize, actual: usize) -> BmiResult<()> {
    if actual < required {
        return Err(BmiError::backend(
            model,
            format!("变量 {name} 的缓冲区过小: 需要 {required} 字节, 实际 {actual} 字节"),
        ));
    }
    Ok(())
}

/// 检查网格数组缓冲区至少能容纳 `required` 个元素
pub fn check_grid_len(model: &str, what: &str, grid: i32, required: usize, actual: usize) -> BmiResult<()> {
    if actual < required {
        return Err(BmiError::backend(
            model,
            format!("网格 {grid} 的 {what} 缓冲区过小: 需要 {required} 个元素, 实际 {actual}"),
        ));
    }
    Ok(())
}
