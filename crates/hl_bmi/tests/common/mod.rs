// hydrolink\crates\hl_bmi\tests/common/mod.rs

//! 集成测试共用的进程内模型
//!
//! [`TestModel`] 直接实现 [`Bmi`]，再分别经由 C 函数指针结构体、Fortran
//! 代理表和 C++ 风格创建/销毁函数暴露给三种适配器。
//!
//! 配置文件为 `key=value` 行：
//! - `time_units`: 报告的时间单位，默认 `s`
//! - `time_step`: 步长，默认 3600
//! - `fail_init`: 为 `true` 时初始化失败

#![allow(dead_code)]

pub mod c_shim;
pub mod fortran_shim;

use hl_bmi::cpp::{destroy_raw_model, into_raw_model};
use hl_bmi::{AdapterOptions, Bmi, BmiError, BmiResult};
use std::ffi::c_void;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const MODEL_NAME: &str = "test_model";
pub const COMPONENT_NAME: &str = "Testing BMI Rust Model";

pub const INPUT_VARS: [&str; 3] = ["INPUT_VAR_1", "INPUT_VAR_2", "INPUT_VAR_3"];
pub const OUTPUT_VARS: [&str; 3] = ["OUTPUT_VAR_1", "OUTPUT_VAR_2", "GRID_VAR_1"];

/// 标量网格
pub const SCALAR_GRID: i32 = 0;
/// 2x3 均匀矩形网格
pub const RECT_GRID: i32 = 1;
/// 单个三角形的非结构网格
pub const TRI_GRID: i32 = 2;

/// 写出配置文件
pub fn config_file(lines: &[&str]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file
}

pub fn options(config: &Path) -> AdapterOptions {
    AdapterOptions::new(MODEL_NAME, config)
}

fn fail(message: impl Into<String>) -> BmiError {
    BmiError::backend(MODEL_NAME, message)
}

#[derive(Debug, Clone)]
pub struct TestModel {
    initialized: bool,
    fail_finalize: bool,
    time_units: String,
    current_time: f64,
    time_step: f64,
    input_var_1: f64,
    input_var_2: f32,
    input_var_3: i32,
    output_var_1: f64,
    output_var_2: f64,
    grid_var_1: [f64; 6],
}

impl Default for TestModel {
    fn default() -> Self {
        Self {
            initialized: false,
            fail_finalize: false,
            time_units: "s".to_string(),
            current_time: 0.0,
            time_step: 3600.0,
            input_var_1: 0.0,
            input_var_2: 0.0,
            input_var_3: 0,
            output_var_1: 0.0,
            output_var_2: 0.0,
            grid_var_1: [0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
        }
    }
}

impl TestModel {
    pub const END_TIME: f64 = 36_000.0;

    fn require_init(&self) -> BmiResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(fail("模型未初始化"))
        }
    }

    fn value_bytes(&self, name: &str) -> BmiResult<Vec<u8>> {
        let bytes = match name {
            "INPUT_VAR_1" => bytemuck::bytes_of(&self.input_var_1).to_vec(),
            "INPUT_VAR_2" => bytemuck::bytes_of(&self.input_var_2).to_vec(),
            "INPUT_VAR_3" => bytemuck::bytes_of(&self.input_var_3).to_vec(),
            "OUTPUT_VAR_1" => bytemuck::bytes_of(&self.output_var_1).to_vec(),
            "OUTPUT_VAR_2" => bytemuck::bytes_of(&self.output_var_2).to_vec(),
            "GRID_VAR_1" => bytemuck::cast_slice(&self.grid_var_1).to_vec(),
            other => return Err(fail(format!("未知变量 {other}"))),
        };
        Ok(bytes)
    }

    fn value_bytes_mut(&mut self, name: &str) -> BmiResult<&mut [u8]> {
        let bytes: &mut [u8] = match name {
            "INPUT_VAR_1" => bytemuck::bytes_of_mut(&mut self.input_var_1),
            "INPUT_VAR_2" => bytemuck::bytes_of_mut(&mut self.input_var_2),
            "INPUT_VAR_3" => bytemuck::bytes_of_mut(&mut self.input_var_3),
            "OUTPUT_VAR_1" => bytemuck::bytes_of_mut(&mut self.output_var_1),
            "OUTPUT_VAR_2" => bytemuck::bytes_of_mut(&mut self.output_var_2),
            "GRID_VAR_1" => bytemuck::cast_slice_mut(&mut self.grid_var_1),
            other => return Err(fail(format!("未知变量 {other}"))),
        };
        Ok(bytes)
    }

    fn advance(&mut self) {
        self.current_time += self.time_step;
        self.output_var_1 = self.input_var_1;
        self.output_var_2 = 2.0 * f64::from(self.input_var_2);
    }
}

impl Bmi for TestModel {
    fn initialize(&mut self, config_file: &Path) -> BmiResult<()> {
        let text = std::fs::read_to_string(config_file)
            .map_err(|e| fail(format!("无法读取配置: {e}")))?;
        for line in text.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key.trim() {
                "time_units" => self.time_units = value.trim().to_string(),
                "time_step" => {
                    self.time_step = value.trim().parse().map_err(|_| fail("time_step 无效"))?
                }
                "fail_init" if value.trim() == "true" => {
                    return Err(fail("配置要求初始化失败"));
                }
                "fail_finalize" => self.fail_finalize = value.trim() == "true",
                _ => {}
            }
        }
        self.initialized = true;
        Ok(())
    }

    fn update(&mut self) -> BmiResult<()> {
        self.require_init()?;
        self.advance();
        Ok(())
    }

    fn update_until(&mut self, time: f64) -> BmiResult<()> {
        self.require_init()?;
        if time < self.current_time {
            return Err(fail("不能回退时间"));
        }
        while self.current_time + self.time_step <= time {
            self.advance();
        }
        self.current_time = time;
        Ok(())
    }

    fn finalize(&mut self) -> BmiResult<()> {
        self.initialized = false;
        if self.fail_finalize {
            return Err(fail("配置要求结束失败"));
        }
        Ok(())
    }

    fn get_component_name(&self) -> BmiResult<String> {
        Ok(COMPONENT_NAME.to_string())
    }

    fn get_input_item_count(&self) -> BmiResult<usize> {
        Ok(INPUT_VARS.len())
    }

    fn get_output_item_count(&self) -> BmiResult<usize> {
        Ok(OUTPUT_VARS.len())
    }

    fn get_input_var_names(&self) -> BmiResult<Vec<String>> {
        Ok(INPUT_VARS.iter().map(|s| s.to_string()).collect())
    }

    fn get_output_var_names(&self) -> BmiResult<Vec<String>> {
        Ok(OUTPUT_VARS.iter().map(|s| s.to_string()).collect())
    }

    fn get_var_grid(&self, name: &str) -> BmiResult<i32> {
        match name {
            "GRID_VAR_1" => Ok(RECT_GRID),
            _ => self.value_bytes(name).map(|_| SCALAR_GRID),
        }
    }

    fn get_var_type(&self, name: &str) -> BmiResult<String> {
        let t = match name {
            "INPUT_VAR_2" => "float",
            "INPUT_VAR_3" => "int",
            _ => {
                self.value_bytes(name)?;
                "double"
            }
        };
        Ok(t.to_string())
    }

    fn get_var_units(&self, name: &str) -> BmiResult<String> {
        let u = match name {
            "INPUT_VAR_2" => "m/s",
            "INPUT_VAR_3" => "1",
            _ => {
                self.value_bytes(name)?;
                "m"
            }
        };
        Ok(u.to_string())
    }

    fn get_var_itemsize(&self, name: &str) -> BmiResult<usize> {
        match name {
            "INPUT_VAR_2" | "INPUT_VAR_3" => Ok(4),
            _ => self.value_bytes(name).map(|_| 8),
        }
    }

    fn get_var_nbytes(&self, name: &str) -> BmiResult<usize> {
        self.value_bytes(name).map(|b| b.len())
    }

    fn get_var_location(&self, name: &str) -> BmiResult<String> {
        self.value_bytes(name).map(|_| "node".to_string())
    }

    fn get_current_time(&self) -> BmiResult<f64> {
        Ok(self.current_time)
    }

    fn get_start_time(&self) -> BmiResult<f64> {
        Ok(0.0)
    }

    fn get_end_time(&self) -> BmiResult<f64> {
        Ok(Self::END_TIME)
    }

    fn get_time_units(&self) -> BmiResult<String> {
        Ok(self.time_units.clone())
    }

    fn get_time_step(&self) -> BmiResult<f64> {
        Ok(self.time_step)
    }

    fn get_value(&self, name: &str, dest: &mut [u8]) -> BmiResult<()> {
        let bytes = self.value_bytes(name)?;
        dest[..bytes.len()].copy_from_slice(&bytes);
        Ok(())
    }

    fn get_value_ptr(&mut self, name: &str) -> BmiResult<*mut c_void> {
        Ok(self.value_bytes_mut(name)?.as_mut_ptr().cast())
    }

    fn get_value_at_indices(&self, name: &str, dest: &mut [u8], inds: &[i32]) -> BmiResult<()> {
        let size = self.get_var_itemsize(name)?;
        let bytes = self.value_bytes(name)?;
        for (slot, &i) in inds.iter().enumerate() {
            let start = usize::try_from(i).map_err(|_| fail("负索引"))? * size;
            let item = bytes.get(start..start + size).ok_or_else(|| fail("索引越界"))?;
            dest[slot * size..(slot + 1) * size].copy_from_slice(item);
        }
        Ok(())
    }

    fn set_value(&mut self, name: &str, src: &[u8]) -> BmiResult<()> {
        let bytes = self.value_bytes_mut(name)?;
        let len = bytes.len();
        bytes.copy_from_slice(&src[..len]);
        Ok(())
    }

    fn set_value_at_indices(&mut self, name: &str, inds: &[i32], src: &[u8]) -> BmiResult<()> {
        let size = self.get_var_itemsize(name)?;
        let bytes = self.value_bytes_mut(name)?;
        for (slot, &i) in inds.iter().enumerate() {
            let start = usize::try_from(i).map_err(|_| fail("负索引"))? * size;
            let item = bytes.get_mut(start..start + size).ok_or_else(|| fail("索引越界"))?;
            item.copy_from_slice(&src[slot * size..(slot + 1) * size]);
        }
        Ok(())
    }

    fn get_grid_rank(&self, grid: i32) -> BmiResult<i32> {
        match grid {
            SCALAR_GRID => Ok(0),
            RECT_GRID | TRI_GRID => Ok(2),
            _ => Err(fail(format!("未知网格 {grid}"))),
        }
    }

    fn get_grid_size(&self, grid: i32) -> BmiResult<i32> {
        match grid {
            SCALAR_GRID => Ok(1),
            RECT_GRID => Ok(6),
            TRI_GRID => Ok(3),
            _ => Err(fail(format!("未知网格 {grid}"))),
        }
    }

    fn get_grid_type(&self, grid: i32) -> BmiResult<String> {
        let t = match grid {
            SCALAR_GRID => "scalar",
            RECT_GRID => "uniform_rectilinear",
            TRI_GRID => "unstructured",
            _ => return Err(fail(format!("未知网格 {grid}"))),
        };
        Ok(t.to_string())
    }

    fn get_grid_shape(&self, grid: i32, shape: &mut [i32]) -> BmiResult<()> {
        match grid {
            RECT_GRID => shape[..2].copy_from_slice(&[2, 3]),
            _ => return Err(fail(format!("网格 {grid} 没有形状"))),
        }
        Ok(())
    }

    fn get_grid_spacing(&self, grid: i32, spacing: &mut [f64]) -> BmiResult<()> {
        match grid {
            RECT_GRID => spacing[..2].copy_from_slice(&[1.0, 2.0]),
            _ => return Err(fail(format!("网格 {grid} 没有间距"))),
        }
        Ok(())
    }

    fn get_grid_origin(&self, grid: i32, origin: &mut [f64]) -> BmiResult<()> {
        match grid {
            RECT_GRID => origin[..2].copy_from_slice(&[10.0, 20.0]),
            _ => return Err(fail(format!("网格 {grid} 没有原点"))),
        }
        Ok(())
    }

    fn get_grid_x(&self, grid: i32, x: &mut [f64]) -> BmiResult<()> {
        match grid {
            TRI_GRID => x[..3].copy_from_slice(&[0.0, 1.0, 0.0]),
            _ => return Err(fail(format!("网格 {grid} 没有 x 坐标"))),
        }
        Ok(())
    }

    fn get_grid_y(&self, grid: i32, y: &mut [f64]) -> BmiResult<()> {
        match grid {
            TRI_GRID => y[..3].copy_from_slice(&[0.0, 0.0, 1.0]),
            _ => return Err(fail(format!("网格 {grid} 没有 y 坐标"))),
        }
        Ok(())
    }

    fn get_grid_z(&self, grid: i32, z: &mut [f64]) -> BmiResult<()> {
        match grid {
            TRI_GRID => z[..3].fill(0.0),
            _ => return Err(fail(format!("网格 {grid} 没有 z 坐标"))),
        }
        Ok(())
    }

    fn get_grid_node_count(&self, grid: i32) -> BmiResult<i32> {
        Ok(if grid == TRI_GRID { 3 } else { 0 })
    }

    fn get_grid_edge_count(&self, grid: i32) -> BmiResult<i32> {
        Ok(if grid == TRI_GRID { 3 } else { 0 })
    }

    fn get_grid_face_count(&self, grid: i32) -> BmiResult<i32> {
        Ok(if grid == TRI_GRID { 1 } else { 0 })
    }

    fn get_grid_edge_nodes(&self, grid: i32, edge_nodes: &mut [i32]) -> BmiResult<()> {
        if grid == TRI_GRID {
            edge_nodes[..6].copy_from_slice(&[0, 1, 1, 2, 2, 0]);
        }
        Ok(())
    }

    fn get_grid_face_edges(&self, grid: i32, face_edges: &mut [i32]) -> BmiResult<()> {
        if grid == TRI_GRID {
            face_edges[..3].copy_from_slice(&[0, 1, 2]);
        }
        Ok(())
    }

    fn get_grid_face_nodes(&self, grid: i32, face_nodes: &mut [i32]) -> BmiResult<()> {
        if grid == TRI_GRID {
            face_nodes[..3].copy_from_slice(&[0, 1, 2]);
        }
        Ok(())
    }

    fn get_grid_nodes_per_face(&self, grid: i32, nodes_per_face: &mut [i32]) -> BmiResult<()> {
        if grid == TRI_GRID {
            nodes_per_face[0] = 3;
        }
        Ok(())
    }
}

// ============================================================================
// C++ 风格创建/销毁函数
// ============================================================================

pub static DESTROYED: AtomicUsize = AtomicUsize::new(0);

pub unsafe extern "C" fn create_test_model() -> *mut c_void {
    into_raw_model(Box::new(TestModel::default()))
}

pub unsafe extern "C" fn destroy_test_model(model: *mut c_void) {
    DESTROYED.fetch_add(1, Ordering::SeqCst);
    destroy_raw_model(model);
}

pub unsafe extern "C" fn create_null_model() -> *mut c_void {
    std::ptr::null_mut()
}

// ============================================================================
// FFI 辅助
// ============================================================================

pub(crate) unsafe fn c_name<'a>(name: *const std::ffi::c_char) -> &'a str {
    std::ffi::CStr::from_ptr(name).to_str().unwrap_or_default()
}

pub(crate) unsafe fn put<T>(dest: *mut T, value: BmiResult<T>) -> std::ffi::c_int {
    match value {
        Ok(v) => {
            *dest = v;
            hl_bmi::c_ffi::BMI_SUCCESS
        }
        Err(_) => hl_bmi::c_ffi::BMI_FAILURE,
    }
}

pub(crate) unsafe fn put_str(dest: *mut std::ffi::c_char, value: BmiResult<String>) -> std::ffi::c_int {
    match value {
        Ok(s) => {
            write_str(dest, &s);
            hl_bmi::c_ffi::BMI_SUCCESS
        }
        Err(_) => hl_bmi::c_ffi::BMI_FAILURE,
    }
}

pub(crate) unsafe fn write_str(dest: *mut std::ffi::c_char, s: &str) {
    std::ptr::copy_nonoverlapping(s.as_ptr(), dest.cast::<u8>(), s.len());
    *dest.add(s.len()) = 0;
}

pub(crate) unsafe fn put_names(dest: *mut *mut std::ffi::c_char, names: BmiResult<Vec<String>>) -> std::ffi::c_int {
    match names {
        Ok(names) => {
            for (i, name) in names.iter().enumerate() {
                write_str(*dest.add(i), name);
            }
            hl_bmi::c_ffi::BMI_SUCCESS
        }
        Err(_) => hl_bmi::c_ffi::BMI_FAILURE,
    }
}

pub(crate) fn status(result: BmiResult<()>) -> std::ffi::c_int {
    match result {
        Ok(()) => hl_bmi::c_ffi::BMI_SUCCESS,
        Err(_) => hl_bmi::c_ffi::BMI_FAILURE,
    }
}

pub(crate) fn count(value: BmiResult<usize>) -> BmiResult<std::ffi::c_int> {
    value.map(|n| n as std::ffi::c_int)
}

/// 网格数组在原始调用中的元素个数
#[derive(Debug, Clone, Copy)]
pub(crate) enum GridArray {
    Rank,
    Nodes,
    EdgeNodes,
    FaceNodes,
    Faces,
}

pub(crate) fn grid_array_len(model: &TestModel, grid: i32, array: GridArray) -> usize {
    let n = match array {
        GridArray::Rank => model.get_grid_rank(grid),
        GridArray::Nodes => model.get_grid_size(grid),
        GridArray::EdgeNodes => model.get_grid_edge_count(grid).map(|e| 2 * e),
        GridArray::FaceNodes => model.get_grid_face_count(grid).map(|f| 3 * f),
        GridArray::Faces => model.get_grid_face_count(grid),
    };
    n.ok().and_then(|n| usize::try_from(n).ok()).unwrap_or(0)
}
