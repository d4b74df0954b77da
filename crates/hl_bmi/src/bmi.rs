// hydrolink\crates\hl_bmi\src/bmi.rs

//! BMI 接口
//!
//! [`Bmi`] 是与后端语言无关的模型契约，[`BmiAdapter`] 在其上补充适配器
//! 自身的身份、初始化状态与时间换算。

use crate::adapter::AdapterBase;
use crate::error::BmiResult;
use crate::foreign_type::NativeType;
use parking_lot::Mutex;
use std::ffi::c_void;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// 基本模型接口 (Basic Model Interface)
///
/// 变量一律按名称访问，名称区分大小写且由模型定义。值缓冲区是字节切片，
/// 其元素类型和宽度须通过 [`Bmi::get_var_type`] 与 [`Bmi::get_var_itemsize`]
/// 在运行时查询，不能静态假定。
///
/// 同一实例上的调用必须严格串行。
pub trait Bmi {
    // ========================================================================
    // 控制
    // ========================================================================

    /// 使用给定配置文件初始化模型
    ///
    /// 成功后以相同配置再次调用为空操作；初始化失败后的任何调用都会返回首次失败的信息。
    fn initialize(&mut self, config_file: &Path) -> BmiResult<()>;

    /// 推进一个模型内部时间步
    fn update(&mut self) -> BmiResult<()>;

    /// 推进到指定模型时间（可为非整数步）
    ///
    /// 不检查目标时间对模型是否合法，由后端自行判断。
    fn update_until(&mut self, time: f64) -> BmiResult<()>;

    /// 释放模型，重复调用为空操作
    fn finalize(&mut self) -> BmiResult<()>;

    // ========================================================================
    // 元数据
    // ========================================================================

    /// 模型组件名称
    fn get_component_name(&self) -> BmiResult<String>;
    /// 输入变量数量
    fn get_input_item_count(&self) -> BmiResult<usize>;
    /// 输出变量数量
    fn get_output_item_count(&self) -> BmiResult<usize>;
    /// 输入变量名称
    fn get_input_var_names(&self) -> BmiResult<Vec<String>>;
    /// 输出变量名称
    fn get_output_var_names(&self) -> BmiResult<Vec<String>>;

    // ========================================================================
    // 变量信息
    // ========================================================================

    /// 变量所在网格标识
    fn get_var_grid(&self, name: &str) -> BmiResult<i32>;
    /// 变量类型名（后端自身的叫法）
    fn get_var_type(&self, name: &str) -> BmiResult<String>;
    /// 变量单位
    fn get_var_units(&self, name: &str) -> BmiResult<String>;
    /// 单个元素的字节数
    fn get_var_itemsize(&self, name: &str) -> BmiResult<usize>;
    /// 变量总字节数
    fn get_var_nbytes(&self, name: &str) -> BmiResult<usize>;
    /// 变量在网格上的位置（node / edge / face）
    fn get_var_location(&self, name: &str) -> BmiResult<String>;

    // ========================================================================
    // 时间
    // ========================================================================

    /// 当前模型时间
    fn get_current_time(&self) -> BmiResult<f64>;
    /// 起始模型时间
    fn get_start_time(&self) -> BmiResult<f64>;
    /// 结束模型时间
    fn get_end_time(&self) -> BmiResult<f64>;
    /// 模型时间单位字符串
    fn get_time_units(&self) -> BmiResult<String>;
    /// 模型时间步长
    fn get_time_step(&self) -> BmiResult<f64>;

    // ========================================================================
    // 变量读写
    // ========================================================================

    /// 将变量值复制到调用方缓冲区
    ///
    /// # 参数
    /// - `name`: 变量名
    /// - `dest`: 至少 `get_var_nbytes(name)` 字节的缓冲区
    fn get_value(&self, name: &str, dest: &mut [u8]) -> BmiResult<()>;

    /// 返回指向模型内部存储的指针
    ///
    /// 指针由模型持有，调用方不得释放，且在下一次 `update` 之后不保证有效。
    fn get_value_ptr(&mut self, name: &str) -> BmiResult<*mut c_void>;

    /// 按索引读取变量值
    ///
    /// `dest` 至少容纳 `inds.len()` 个元素。
    fn get_value_at_indices(&self, name: &str, dest: &mut [u8], inds: &[i32]) -> BmiResult<()>;

    /// 设置变量值，`src` 为完整的变量字节
    fn set_value(&mut self, name: &str, src: &[u8]) -> BmiResult<()>;

    /// 按索引设置变量值，`src` 含 `inds.len()` 个元素
    fn set_value_at_indices(&mut self, name: &str, inds: &[i32], src: &[u8]) -> BmiResult<()>;

    // ========================================================================
    // 网格
    // ========================================================================

    /// 网格维数，标量网格为 0
    fn get_grid_rank(&self, grid: i32) -> BmiResult<i32>;
    /// 网格元素总数
    fn get_grid_size(&self, grid: i32) -> BmiResult<i32>;
    /// 网格类型（scalar、uniform_rectilinear、unstructured 等）
    fn get_grid_type(&self, grid: i32) -> BmiResult<String>;
    /// 各维长度，长度为 rank
    fn get_grid_shape(&self, grid: i32, shape: &mut [i32]) -> BmiResult<()>;
    /// 各维间距
    fn get_grid_spacing(&self, grid: i32, spacing: &mut [f64]) -> BmiResult<()>;
    /// 各维原点
    fn get_grid_origin(&self, grid: i32, origin: &mut [f64]) -> BmiResult<()>;
    /// 节点 x 坐标
    fn get_grid_x(&self, grid: i32, x: &mut [f64]) -> BmiResult<()>;
    /// 节点 y 坐标
    fn get_grid_y(&self, grid: i32, y: &mut [f64]) -> BmiResult<()>;
    /// 节点 z 坐标
    fn get_grid_z(&self, grid: i32, z: &mut [f64]) -> BmiResult<()>;
    /// 节点数
    fn get_grid_node_count(&self, grid: i32) -> BmiResult<i32>;
    /// 边数
    fn get_grid_edge_count(&self, grid: i32) -> BmiResult<i32>;
    /// 面数
    fn get_grid_face_count(&self, grid: i32) -> BmiResult<i32>;
    /// 边-节点连接，长度 2 * 边数
    fn get_grid_edge_nodes(&self, grid: i32, edge_nodes: &mut [i32]) -> BmiResult<()>;
    /// 面-边连接
    fn get_grid_face_edges(&self, grid: i32, face_edges: &mut [i32]) -> BmiResult<()>;
    /// 面-节点连接
    fn get_grid_face_nodes(&self, grid: i32, face_nodes: &mut [i32]) -> BmiResult<()>;
    /// 每个面的节点数
    fn get_grid_nodes_per_face(&self, grid: i32, nodes_per_face: &mut [i32]) -> BmiResult<()>;
}

/// 后端种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// C 函数指针结构体
    C,
    /// 由创建/销毁函数管理的多态对象
    Cpp,
    /// ISO-C-binding 代理函数
    Fortran,
    /// 嵌入式解释器中的对象
    Python,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::Fortran => "fortran",
            Self::Python => "python",
        };
        f.write_str(name)
    }
}

/// 适配器公共接口
///
/// 在 [`Bmi`] 之上提供所有后端共享的状态访问。实现者只需给出
/// [`BmiAdapter::base`] 与 [`BmiAdapter::backend_kind`]。
pub trait BmiAdapter: Bmi + Send {
    /// 共享的适配器状态
    fn base(&self) -> &AdapterBase;

    /// 后端种类
    fn backend_kind(&self) -> BackendKind;

    /// 将后端报告的类型名与元素宽度映射到本地数值类型
    fn native_type(&self, external_type: &str, item_size: usize) -> BmiResult<NativeType> {
        NativeType::resolve(self.backend_kind(), external_type, item_size)
    }

    /// 使用构造时给出的配置文件初始化
    fn initialize_configured(&mut self) -> BmiResult<()> {
        let config = self.init_config().to_path_buf();
        self.initialize(&config)
    }

    /// 模型名称
    fn model_name(&self) -> &str {
        self.base().model_name()
    }

    /// 是否已成功初始化且尚未释放
    fn is_initialized(&self) -> bool {
        self.base().is_initialized()
    }

    /// 初始化配置文件路径
    fn init_config(&self) -> &Path {
        self.base().init_config()
    }

    /// 模型是否直接读取驱动数据文件
    fn uses_forcing_file(&self) -> bool {
        self.base().uses_forcing_file()
    }

    /// 驱动数据文件路径
    fn forcing_file(&self) -> Option<&Path> {
        self.base().forcing_file()
    }

    /// 是否允许模型越过结束时间
    fn allow_exceed_end_time(&self) -> bool {
        self.base().allow_exceed_end_time()
    }

    /// 模型时间步长是否固定
    fn has_fixed_time_step(&self) -> bool {
        self.base().has_fixed_time_step()
    }

    /// 模型时间转换为秒
    fn convert_model_time_to_seconds(&self, model_time: f64) -> f64 {
        self.base().convert_model_time_to_seconds(model_time)
    }

    /// 秒转换为模型时间
    fn convert_seconds_to_model_time(&self, seconds: f64) -> f64 {
        self.base().convert_seconds_to_model_time(seconds)
    }
}

/// 在协议与驱动之间共享的适配器
pub type SharedAdapter = Arc<Mutex<Box<dyn BmiAdapter>>>;

/// 将适配器包装为共享引用
pub fn share(adapter: Box<dyn BmiAdapter>) -> SharedAdapter {
    Arc::new(Mutex::new(adapter))
}
