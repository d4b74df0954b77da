// hydrolink\crates\hl_bmi\src/python.rs

//! 嵌入式 Python 后端适配器
//!
//! 模型是一个 Python 对象，类型以 `"包.模块.类名"` 给出。取值与赋值都经由
//! numpy 数组完成，dtype 由变量声明的类型与元素大小决定。
//!
//! 解释器是进程级资源：[`InterpreterGuard`] 在首次使用时启动解释器，每个
//! Python 适配器持有一份引用。解释器一旦启动就不再关闭。

use crate::adapter::{check_buffer_len, check_grid_len, fill_degenerate_grid, AdapterBase, AdapterOptions};
use crate::bmi::{BackendKind, Bmi, BmiAdapter};
use crate::error::{BmiError, BmiResult};
use numpy::{Element, PyArray1, PyArrayMethods, PyUntypedArray, PyUntypedArrayMethods};
use parking_lot::Mutex;
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyDict};
use std::ffi::c_void;
use std::path::Path;
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

// ============================================================================
// 解释器守卫
// ============================================================================

static INTERPRETER: Mutex<Weak<InterpreterGuard>> = parking_lot::const_mutex(Weak::new());

/// 嵌入式解释器的共享守卫
///
/// 所有持有者释放后守卫本身被回收，但解释器保持运行，后续获取直接复用。
#[derive(Debug)]
pub struct InterpreterGuard {
    _private: (),
}

impl InterpreterGuard {
    /// 获取守卫，必要时启动解释器
    pub fn acquire() -> Arc<Self> {
        let mut slot = INTERPRETER.lock();
        if let Some(guard) = slot.upgrade() {
            return guard;
        }
        pyo3::prepare_freethreaded_python();
        debug!("已获取嵌入式 Python 解释器");
        let guard = Arc::new(Self { _private: () });
        *slot = Arc::downgrade(&guard);
        guard
    }

    /// 当前持有者数量
    pub fn holders() -> usize {
        INTERPRETER.lock().strong_count()
    }
}

/// 拆分 `"包.模块.类名"` 为模块路径与类名
pub fn split_type_path(python_type: &str) -> Option<(&str, &str)> {
    let (module, class) = python_type.trim().rsplit_once('.')?;
    if module.is_empty() || class.is_empty() {
        return None;
    }
    Some((module, class))
}

fn python_error(model: &str, err: PyErr) -> BmiError {
    BmiError::Python {
        model: model.to_string(),
        message: err.to_string(),
    }
}

fn with_model<R>(
    model_name: &str,
    model: &Py<PyAny>,
    f: impl for<'py> FnOnce(Python<'py>, &Bound<'py, PyAny>) -> PyResult<R>,
) -> BmiResult<R> {
    Python::with_gil(|py| f(py, model.bind(py))).map_err(|e| python_error(model_name, e))
}

fn zeros<'py>(py: Python<'py>, count: usize, dtype: &str) -> PyResult<Bound<'py, PyAny>> {
    let kwargs = PyDict::new(py);
    kwargs.set_item("dtype", dtype)?;
    py.import("numpy")?.call_method("zeros", (count,), Some(&kwargs))
}

fn from_bytes<'py>(py: Python<'py>, bytes: &[u8], dtype: &str) -> PyResult<Bound<'py, PyAny>> {
    let kwargs = PyDict::new(py);
    kwargs.set_item("dtype", dtype)?;
    py.import("numpy")?
        .call_method("frombuffer", (PyBytes::new(py, bytes),), Some(&kwargs))?
        .call_method0("copy")
}

fn copy_out(array: &Bound<'_, PyAny>, dest: &mut [u8]) -> PyResult<()> {
    let raw = array.call_method0("tobytes")?;
    let bytes = raw.downcast::<PyBytes>()?.as_bytes();
    if bytes.len() > dest.len() {
        return Err(pyo3::exceptions::PyValueError::new_err(format!(
            "numpy 数组含 {} 字节, 目标缓冲区只有 {} 字节",
            bytes.len(),
            dest.len()
        )));
    }
    dest[..bytes.len()].copy_from_slice(bytes);
    Ok(())
}

// ============================================================================
// 适配器
// ============================================================================

/// 嵌入式 Python 后端适配器
pub struct PyAdapter {
    base: AdapterBase,
    python_type: String,
    model: Py<PyAny>,
    // 必须在 model 之后释放
    _interpreter: Arc<InterpreterGuard>,
}

impl PyAdapter {
    /// 导入类型、创建模型对象并立即初始化
    ///
    /// # 参数
    /// - `python_type`: 完整类型路径，如 `"hypy.models.Lumped"`
    pub fn new(options: AdapterOptions, python_type: &str) -> BmiResult<Self> {
        let mut adapter = Self::load(options, python_type)?;
        adapter.initialize_configured()?;
        Ok(adapter)
    }

    /// 导入类型并创建模型对象，但不初始化
    pub fn load(options: AdapterOptions, python_type: &str) -> BmiResult<Self> {
        let base = AdapterBase::new(options)?;
        let (module, class) = split_type_path(python_type).ok_or_else(|| {
            BmiError::config(
                base.model_name(),
                format!("Python 类型 '{python_type}' 必须形如 '包.模块.类名'"),
            )
        })?;
        let interpreter = InterpreterGuard::acquire();
        let model = Python::with_gil(|py| -> PyResult<Py<PyAny>> {
            let class = py.import(module)?.getattr(class)?;
            Ok(class.call0()?.unbind())
        })
        .map_err(|e| {
            BmiError::binding(
                base.model_name(),
                format!("无法创建 Python 模型 '{python_type}': {e}"),
            )
        })?;
        debug!(model = %base.model_name(), python_type, "已创建 Python 模型对象");
        Ok(Self {
            base,
            python_type: python_type.to_string(),
            model,
            _interpreter: interpreter,
        })
    }

    /// 模型类型路径
    pub fn python_type(&self) -> &str {
        &self.python_type
    }

    fn call<R>(&self, f: impl for<'py> FnOnce(Python<'py>, &Bound<'py, PyAny>) -> PyResult<R>) -> BmiResult<R> {
        self.base.ensure_ready()?;
        with_model(self.base.model_name(), &self.model, f)
    }

    fn control(&self, f: impl for<'py> FnOnce(Python<'py>, &Bound<'py, PyAny>) -> PyResult<()>, op: &str) -> BmiResult<()> {
        self.base.ensure_ready()?;
        with_model(self.base.model_name(), &self.model, f).map_err(|e| {
            BmiError::external_state(
                self.base.model_name(),
                format!("{} 执行 {op} 失败: {e}", self.base.model_name()),
            )
        })
    }

    /// 变量对应的 numpy dtype
    fn dtype(&self, name: &str, direction: &str) -> BmiResult<(String, usize)> {
        let var_type = self.get_var_type(name)?;
        let itemsize = self.get_var_itemsize(name)?;
        let native = self.native_type(&var_type, itemsize).map_err(|_| {
            BmiError::type_resolution(format!(
                "尝试 {direction} 变量 '{name}' 的值失败 ({}): 模型声明了不支持的类型 ({var_type}) 与大小 ({itemsize}) 组合",
                self.base.model_name()
            ))
        })?;
        Ok((native.numpy_dtype(), itemsize))
    }

    fn grid_array<T: Element + Copy>(&self, method: &str, grid: i32, dest: &mut [T], len: usize) -> BmiResult<()> {
        check_grid_len(self.base.model_name(), method, grid, len, dest.len())?;
        if len == 0 {
            return Ok(());
        }
        self.call(|py, model| {
            let array = PyArray1::<T>::zeros(py, len, false);
            model.call_method1(method, (grid, &array))?;
            let view = array.readonly();
            dest[..len].copy_from_slice(view.as_slice()?);
            Ok(())
        })
    }

    fn grid_len(&self, value: i32, what: &str) -> BmiResult<usize> {
        usize::try_from(value).map_err(|_| {
            BmiError::backend(self.base.model_name(), format!("{what} 返回了负值 {value}"))
        })
    }

    fn nodes_per_face_total(&self, grid: i32) -> BmiResult<usize> {
        let faces = self.grid_len(self.get_grid_face_count(grid)?, "get_grid_face_count")?;
        let mut per_face = vec![0i32; faces];
        self.get_grid_nodes_per_face(grid, &mut per_face)?;
        Ok(per_face.iter().map(|&n| n.max(0) as usize).sum())
    }
}

impl Bmi for PyAdapter {
    fn initialize(&mut self, config_file: &Path) -> BmiResult<()> {
        self.base.reconcile_config(config_file)?;
        let model_name = self.base.model_name().to_string();
        let model = &self.model;
        self.base.initialize_with(|config| {
            let path = config.to_string_lossy().into_owned();
            with_model(&model_name, model, |_, m| {
                m.call_method1("initialize", (path,))?;
                m.call_method0("get_time_units")?.extract::<String>()
            })
            .map_err(|e| BmiError::external_state(&model_name, format!("初始化 {model_name} 失败: {e}")))
        })
    }

    fn update(&mut self) -> BmiResult<()> {
        self.control(|_, m| m.call_method0("update").map(drop), "update")
    }

    fn update_until(&mut self, time: f64) -> BmiResult<()> {
        self.control(|_, m| m.call_method1("update_until", (time,)).map(drop), "update_until")
    }

    fn finalize(&mut self) -> BmiResult<()> {
        let model_name = self.base.model_name().to_string();
        let model = &self.model;
        self.base.finalize_with(|| {
            with_model(&model_name, model, |_, m| m.call_method0("finalize").map(drop)).map_err(|e| {
                BmiError::external_state(&model_name, format!("{model_name} 执行 finalize 失败: {e}"))
            })
        })
    }

    fn get_component_name(&self) -> BmiResult<String> {
        self.base.ensure_ready()?;
        self.base
            .cached_component_name(|| self.call(|_, m| m.call_method0("get_component_name")?.extract()))
    }

    fn get_input_item_count(&self) -> BmiResult<usize> {
        self.base.ensure_ready()?;
        self.base.cached_input_item_count(|| {
            self.call(|_, m| m.call_method0("get_input_item_count")?.extract())
        })
    }

    fn get_output_item_count(&self) -> BmiResult<usize> {
        self.base.ensure_ready()?;
        self.base.cached_output_item_count(|| {
            self.call(|_, m| m.call_method0("get_output_item_count")?.extract())
        })
    }

    fn get_input_var_names(&self) -> BmiResult<Vec<String>> {
        self.base.ensure_ready()?;
        self.base
            .cached_input_var_names(|| self.call(|_, m| m.call_method0("get_input_var_names")?.extract()))
    }

    fn get_output_var_names(&self) -> BmiResult<Vec<String>> {
        self.base.ensure_ready()?;
        self.base
            .cached_output_var_names(|| self.call(|_, m| m.call_method0("get_output_var_names")?.extract()))
    }

    fn get_var_grid(&self, name: &str) -> BmiResult<i32> {
        self.call(|_, m| m.call_method1("get_var_grid", (name,))?.extract())
    }

    fn get_var_type(&self, name: &str) -> BmiResult<String> {
        self.call(|_, m| m.call_method1("get_var_type", (name,))?.extract())
    }

    fn get_var_units(&self, name: &str) -> BmiResult<String> {
        self.call(|_, m| m.call_method1("get_var_units", (name,))?.extract())
    }

    fn get_var_itemsize(&self, name: &str) -> BmiResult<usize> {
        self.call(|_, m| m.call_method1("get_var_itemsize", (name,))?.extract())
    }

    fn get_var_nbytes(&self, name: &str) -> BmiResult<usize> {
        self.call(|_, m| m.call_method1("get_var_nbytes", (name,))?.extract())
    }

    fn get_var_location(&self, name: &str) -> BmiResult<String> {
        self.call(|_, m| m.call_method1("get_var_location", (name,))?.extract())
    }

    fn get_current_time(&self) -> BmiResult<f64> {
        self.call(|_, m| m.call_method0("get_current_time")?.extract())
    }

    fn get_start_time(&self) -> BmiResult<f64> {
        self.call(|_, m| m.call_method0("get_start_time")?.extract())
    }

    fn get_end_time(&self) -> BmiResult<f64> {
        self.call(|_, m| m.call_method0("get_end_time")?.extract())
    }

    fn get_time_units(&self) -> BmiResult<String> {
        self.call(|_, m| m.call_method0("get_time_units")?.extract())
    }

    fn get_time_step(&self) -> BmiResult<f64> {
        self.base.ensure_ready()?;
        self.base
            .cached_time_step(|| self.call(|_, m| m.call_method0("get_time_step")?.extract()))
    }

    fn get_value(&self, name: &str, dest: &mut [u8]) -> BmiResult<()> {
        let nbytes = self.get_var_nbytes(name)?;
        check_buffer_len(self.base.model_name(), name, nbytes, dest.len())?;
        let (dtype, itemsize) = self.dtype(name, "GET")?;
        if itemsize == 0 {
            return Err(BmiError::backend(self.base.model_name(), format!("变量 {name} 的 itemsize 为 0")));
        }
        self.call(|py, m| {
            let array = zeros(py, nbytes / itemsize, &dtype)?;
            m.call_method1("get_value", (name, &array))?;
            copy_out(&array, &mut dest[..nbytes])
        })
    }

    fn get_value_ptr(&mut self, name: &str) -> BmiResult<*mut c_void> {
        self.call(|_, m| {
            let value = m.call_method1("get_value_ptr", (name,))?;
            let array = value.downcast::<PyUntypedArray>()?;
            // SAFETY: 数组对象由模型持有，数据区随之存活
            Ok(unsafe { (*array.as_array_ptr()).data.cast::<c_void>() })
        })
    }

    fn get_value_at_indices(&self, name: &str, dest: &mut [u8], inds: &[i32]) -> BmiResult<()> {
        self.base.ensure_ready()?;
        if inds.is_empty() {
            return Ok(());
        }
        let (dtype, itemsize) = self.dtype(name, "GET")?;
        let required = itemsize * inds.len();
        check_buffer_len(self.base.model_name(), name, required, dest.len())?;
        self.call(|py, m| {
            let array = zeros(py, inds.len(), &dtype)?;
            let indices = PyArray1::from_slice(py, inds);
            m.call_method1("get_value_at_indices", (name, &array, &indices))?;
            copy_out(&array, &mut dest[..required])
        })
    }

    fn set_value(&mut self, name: &str, src: &[u8]) -> BmiResult<()> {
        let nbytes = self.get_var_nbytes(name)?;
        check_buffer_len(self.base.model_name(), name, nbytes, src.len())?;
        let (dtype, _) = self.dtype(name, "SET")?;
        self.call(|py, m| {
            let array = from_bytes(py, &src[..nbytes], &dtype)?;
            m.call_method1("set_value", (name, &array)).map(drop)
        })
    }

    fn set_value_at_indices(&mut self, name: &str, inds: &[i32], src: &[u8]) -> BmiResult<()> {
        self.base.ensure_ready()?;
        if inds.is_empty() {
            return Ok(());
        }
        let (dtype, itemsize) = self.dtype(name, "SET")?;
        let required = itemsize * inds.len();
        check_buffer_len(self.base.model_name(), name, required, src.len())?;
        self.call(|py, m| {
            let indices = PyArray1::from_slice(py, inds);
            let array = from_bytes(py, &src[..required], &dtype)?;
            m.call_method1("set_value_at_indices", (name, &indices, &array)).map(drop)
        })
    }

    fn get_grid_rank(&self, grid: i32) -> BmiResult<i32> {
        self.call(|_, m| m.call_method1("get_grid_rank", (grid,))?.extract())
    }

    fn get_grid_size(&self, grid: i32) -> BmiResult<i32> {
        self.call(|_, m| m.call_method1("get_grid_size", (grid,))?.extract())
    }

    fn get_grid_type(&self, grid: i32) -> BmiResult<String> {
        self.call(|_, m| m.call_method1("get_grid_type", (grid,))?.extract())
    }

    fn get_grid_shape(&self, grid: i32, shape: &mut [i32]) -> BmiResult<()> {
        let rank = self.get_grid_rank(grid)?;
        if fill_degenerate_grid(rank, shape) {
            return Ok(());
        }
        self.grid_array("get_grid_shape", grid, shape, rank as usize)
    }

    fn get_grid_spacing(&self, grid: i32, spacing: &mut [f64]) -> BmiResult<()> {
        let rank = self.get_grid_rank(grid)?;
        if fill_degenerate_grid(rank, spacing) {
            return Ok(());
        }
        self.grid_array("get_grid_spacing", grid, spacing, rank as usize)
    }

    fn get_grid_origin(&self, grid: i32, origin: &mut [f64]) -> BmiResult<()> {
        let rank = self.get_grid_rank(grid)?;
        if fill_degenerate_grid(rank, origin) {
            return Ok(());
        }
        self.grid_array("get_grid_origin", grid, origin, rank as usize)
    }

    fn get_grid_x(&self, _grid: i32, _x: &mut [f64]) -> BmiResult<()> {
        Err(BmiError::unsupported(self.base.model_name(), "get_grid_x (Python 适配器尚未实现)"))
    }

    fn get_grid_y(&self, _grid: i32, _y: &mut [f64]) -> BmiResult<()> {
        Err(BmiError::unsupported(self.base.model_name(), "get_grid_y (Python 适配器尚未实现)"))
    }

    fn get_grid_z(&self, _grid: i32, _z: &mut [f64]) -> BmiResult<()> {
        Err(BmiError::unsupported(self.base.model_name(), "get_grid_z (Python 适配器尚未实现)"))
    }

    fn get_grid_node_count(&self, grid: i32) -> BmiResult<i32> {
        self.call(|_, m| m.call_method1("get_grid_node_count", (grid,))?.extract())
    }

    fn get_grid_edge_count(&self, grid: i32) -> BmiResult<i32> {
        self.call(|_, m| m.call_method1("get_grid_edge_count", (grid,))?.extract())
    }

    fn get_grid_face_count(&self, grid: i32) -> BmiResult<i32> {
        self.call(|_, m| m.call_method1("get_grid_face_count", (grid,))?.extract())
    }

    fn get_grid_edge_nodes(&self, grid: i32, edge_nodes: &mut [i32]) -> BmiResult<()> {
        let edges = self.grid_len(self.get_grid_edge_count(grid)?, "get_grid_edge_count")?;
        self.grid_array("get_grid_edge_nodes", grid, edge_nodes, 2 * edges)
    }

    fn get_grid_face_edges(&self, grid: i32, face_edges: &mut [i32]) -> BmiResult<()> {
        let total = self.nodes_per_face_total(grid)?;
        self.grid_array("get_grid_face_edges", grid, face_edges, total)
    }

    fn get_grid_face_nodes(&self, grid: i32, face_nodes: &mut [i32]) -> BmiResult<()> {
        let total = self.nodes_per_face_total(grid)?;
        self.grid_array("get_grid_face_nodes", grid, face_nodes, total)
    }

    fn get_grid_nodes_per_face(&self, grid: i32, nodes_per_face: &mut [i32]) -> BmiResult<()> {
        let faces = self.grid_len(self.get_grid_face_count(grid)?, "get_grid_face_count")?;
        self.grid_array("get_grid_nodes_per_face", grid, nodes_per_face, faces)
    }
}

impl BmiAdapter for PyAdapter {
    fn base(&self) -> &AdapterBase {
        &self.base
    }

    fn backend_kind(&self) -> BackendKind {
        BackendKind::Python
    }
}

impl Drop for PyAdapter {
    fn drop(&mut self) {
        if let Err(e) = Bmi::finalize(self) {
            warn!(model = %self.base.model_name(), error = %e, "释放 Python 模型失败");
        }
    }
}
