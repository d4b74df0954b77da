// hydrolink\crates\hl_bmi\src/c_ffi.rs

//! C BMI 结构体布局
//!
//! 与 CSDMS `bmi.h` 一致：首字段为模型私有数据指针，其后按头文件顺序排列
//! 函数指针。字段顺序即 ABI，不可调整。

use std::ffi::{c_char, c_double, c_int, c_void};

/// 调用成功
pub const BMI_SUCCESS: c_int = 0;
/// 调用失败
pub const BMI_FAILURE: c_int = 1;

/// 单位字符串缓冲区长度
pub const BMI_MAX_UNITS_NAME: usize = 2048;
/// 类型名缓冲区长度
pub const BMI_MAX_TYPE_NAME: usize = 2048;
/// 组件名缓冲区长度
pub const BMI_MAX_COMPONENT_NAME: usize = 2048;
/// 变量名缓冲区长度
pub const BMI_MAX_VAR_NAME: usize = 2048;
/// 位置名缓冲区长度
pub const BMI_MAX_LOCATION_NAME: usize = 2048;

/// 注册函数：填充结构体中的函数指针并返回同一指针
pub type RegisterBmiFn = unsafe extern "C" fn(model: *mut CBmi) -> *mut CBmi;

pub(crate) type SelfFn = unsafe extern "C" fn(*mut CBmi) -> c_int;
pub(crate) type StrOutFn = unsafe extern "C" fn(*mut CBmi, *mut c_char) -> c_int;
pub(crate) type IntOutFn = unsafe extern "C" fn(*mut CBmi, *mut c_int) -> c_int;
pub(crate) type NamesOutFn = unsafe extern "C" fn(*mut CBmi, *mut *mut c_char) -> c_int;
pub(crate) type VarIntFn = unsafe extern "C" fn(*mut CBmi, *const c_char, *mut c_int) -> c_int;
pub(crate) type VarStrFn = unsafe extern "C" fn(*mut CBmi, *const c_char, *mut c_char) -> c_int;
pub(crate) type TimeFn = unsafe extern "C" fn(*mut CBmi, *mut c_double) -> c_int;
pub(crate) type GridIntFn = unsafe extern "C" fn(*mut CBmi, c_int, *mut c_int) -> c_int;
pub(crate) type GridStrFn = unsafe extern "C" fn(*mut CBmi, c_int, *mut c_char) -> c_int;
pub(crate) type GridDoubleFn = unsafe extern "C" fn(*mut CBmi, c_int, *mut c_double) -> c_int;

/// C BMI 模型结构体
///
/// 函数指针字段与 `bmi.h` 中的成员同名。
#[repr(C)]
#[derive(Debug)]
#[allow(missing_docs)]
pub struct CBmi {
    /// 模型私有数据
    pub data: *mut c_void,

    pub initialize: Option<unsafe extern "C" fn(*mut CBmi, *const c_char) -> c_int>,
    pub update: Option<SelfFn>,
    pub update_until: Option<unsafe extern "C" fn(*mut CBmi, c_double) -> c_int>,
    pub finalize: Option<SelfFn>,

    pub get_component_name: Option<StrOutFn>,
    pub get_input_item_count: Option<IntOutFn>,
    pub get_output_item_count: Option<IntOutFn>,
    pub get_input_var_names: Option<NamesOutFn>,
    pub get_output_var_names: Option<NamesOutFn>,

    pub get_var_grid: Option<VarIntFn>,
    pub get_var_type: Option<VarStrFn>,
    pub get_var_units: Option<VarStrFn>,
    pub get_var_itemsize: Option<VarIntFn>,
    pub get_var_nbytes: Option<VarIntFn>,
    pub get_var_location: Option<VarStrFn>,

    pub get_current_time: Option<TimeFn>,
    pub get_start_time: Option<TimeFn>,
    pub get_end_time: Option<TimeFn>,
    pub get_time_units: Option<StrOutFn>,
    pub get_time_step: Option<TimeFn>,

    pub get_value: Option<unsafe extern "C" fn(*mut CBmi, *const c_char, *mut c_void) -> c_int>,
    pub get_value_ptr:
        Option<unsafe extern "C" fn(*mut CBmi, *const c_char, *mut *mut c_void) -> c_int>,
    pub get_value_at_indices: Option<
        unsafe extern "C" fn(*mut CBmi, *const c_char, *mut c_void, *mut c_int, c_int) -> c_int,
    >,
    pub set_value: Option<unsafe extern "C" fn(*mut CBmi, *const c_char, *mut c_void) -> c_int>,
    pub set_value_at_indices: Option<
        unsafe extern "C" fn(*mut CBmi, *const c_char, *mut c_int, c_int, *mut c_void) -> c_int,
    >,

    pub get_grid_rank: Option<GridIntFn>,
    pub get_grid_size: Option<GridIntFn>,
    pub get_grid_type: Option<GridStrFn>,

    pub get_grid_shape: Option<GridIntFn>,
    pub get_grid_spacing: Option<GridDoubleFn>,
    pub get_grid_origin: Option<GridDoubleFn>,

    pub get_grid_x: Option<GridDoubleFn>,
    pub get_grid_y: Option<GridDoubleFn>,
    pub get_grid_z: Option<GridDoubleFn>,

    pub get_grid_node_count: Option<GridIntFn>,
    pub get_grid_edge_count: Option<GridIntFn>,
    pub get_grid_face_count: Option<GridIntFn>,

    pub get_grid_edge_nodes: Option<GridIntFn>,
    pub get_grid_face_edges: Option<GridIntFn>,
    pub get_grid_face_nodes: Option<GridIntFn>,
    pub get_grid_nodes_per_face: Option<GridIntFn>,
}

impl CBmi {
    /// 全空结构体，等待注册函数填充
    pub fn empty() -> Self {
        Self {
            data: std::ptr::null_mut(),
            initialize: None,
            update: None,
            update_until: None,
            finalize: None,
            get_component_name: None,
            get_input_item_count: None,
            get_output_item_count: None,
            get_input_var_names: None,
            get_output_var_names: None,
            get_var_grid: None,
            get_var_type: None,
            get_var_units: None,
            get_var_itemsize: None,
            get_var_nbytes: None,
            get_var_location: None,
            get_current_time: None,
            get_start_time: None,
            get_end_time: None,
            get_time_units: None,
            get_time_step: None,
            get_value: None,
            get_value_ptr: None,
            get_value_at_indices: None,
            set_value: None,
            set_value_at_indices: None,
            get_grid_rank: None,
            get_grid_size: None,
            get_grid_type: None,
            get_grid_shape: None,
            get_grid_spacing: None,
            get_grid_origin: None,
            get_grid_x: None,
            get_grid_y: None,
            get_grid_z: None,
            get_grid_node_count: None,
            get_grid_edge_count: None,
            get_grid_face_count: None,
            get_grid_edge_nodes: None,
            get_grid_face_edges: None,
            get_grid_face_nodes: None,
            get_grid_nodes_per_face: None,
        }
    }
}

impl Default for CBmi {
    fn default() -> Self {
        Self::empty()
    }
}

/// 读取以 NUL 结尾的字符串缓冲区
pub fn string_from_buffer(buffer: &[u8]) -> String {
    let end = buffer.iter().position(|&b| b == 0).unwrap_or(buffer.len());
    String::from_utf8_lossy(&buffer[..end]).into_owned()
}
