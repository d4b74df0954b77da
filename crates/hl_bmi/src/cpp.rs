// hydrolink\crates\hl_bmi\src/cpp.rs

//! C++ 风格后端适配器
//!
//! 后端以一对导出函数提供模型对象：创建函数返回新的模型实例，销毁函数
//! 负责释放。模型实例本身实现 [`Bmi`]，适配器只在其外层施加共享的生命周期
//! 与缓冲区检查。
//!
//! 对象句柄的约定：创建函数返回 `Box<Box<dyn Bmi + Send>>` 的裸指针，
//! 可用 [`into_raw_model`] 生成，销毁函数可直接委托 [`destroy_raw_model`]。
//! 插件须与宿主使用同一编译器构建。

use crate::adapter::{check_buffer_len, check_grid_len, fill_degenerate_grid, AdapterBase, AdapterOptions};
use crate::bmi::{BackendKind, Bmi, BmiAdapter};
use crate::dylib::DynamicLibrary;
use crate::error::{BmiError, BmiResult};
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 默认创建函数名
pub const DEFAULT_CREATOR_FUNCTION: &str = "bmi_model_create";
/// 默认销毁函数名
pub const DEFAULT_DESTROYER_FUNCTION: &str = "bmi_model_destroy";

/// 后端模型对象
pub type CppModel = Box<dyn Bmi + Send>;

/// 创建函数
pub type CreatorFn = unsafe extern "C" fn() -> *mut c_void;

/// 销毁函数
pub type DestroyerFn = unsafe extern "C" fn(model: *mut c_void);

/// 把模型对象转换为可跨越导出函数边界的裸指针
pub fn into_raw_model(model: CppModel) -> *mut c_void {
    Box::into_raw(Box::new(model)).cast()
}

/// 释放 [`into_raw_model`] 生成的指针
///
/// # Safety
///
/// `model` 必须来自 [`into_raw_model`] 且尚未释放；空指针为空操作。
pub unsafe fn destroy_raw_model(model: *mut c_void) {
    if !model.is_null() {
        drop(Box::from_raw(model.cast::<CppModel>()));
    }
}

/// C++ 风格后端适配器
pub struct CppAdapter {
    base: AdapterBase,
    model: *mut CppModel,
    destroyer: DestroyerFn,
    library: Option<DynamicLibrary>,
}

// SAFETY: 模型对象本身是 Send，裸指针只由本适配器持有
unsafe impl Send for CppAdapter {}

impl CppAdapter {
    /// 加载动态库、创建并立即初始化模型
    ///
    /// # 参数
    /// - `creator_function` / `destroyer_function`: 导出的创建与销毁函数名
    pub fn new(
        options: AdapterOptions,
        library_file: impl Into<PathBuf>,
        creator_function: &str,
        destroyer_function: &str,
    ) -> BmiResult<Self> {
        let mut adapter = Self::load(options, library_file, creator_function, destroyer_function)?;
        adapter.initialize_configured()?;
        Ok(adapter)
    }

    /// 加载动态库并创建模型，但不初始化
    pub fn load(
        options: AdapterOptions,
        library_file: impl Into<PathBuf>,
        creator_function: &str,
        destroyer_function: &str,
    ) -> BmiResult<Self> {
        let base = AdapterBase::new(options)?;
        if destroyer_function.is_empty() {
            return Err(BmiError::config(
                base.model_name(),
                format!("无法初始化 {}: 未给出销毁函数名", base.model_name()),
            ));
        }
        let mut library = DynamicLibrary::new(base.model_name(), library_file);
        library.load(creator_function)?;
        // SAFETY: 导出函数遵循模块约定的签名
        let (creator, destroyer) = unsafe {
            let creator: CreatorFn = library.function(creator_function)?;
            let destroyer: DestroyerFn = library.function(destroyer_function)?;
            (creator, destroyer)
        };
        let mut adapter = Self::create(base, creator, destroyer)?;
        adapter.library = Some(library);
        Ok(adapter)
    }

    /// 使用进程内的创建/销毁函数构造，不初始化
    pub fn with_factory(
        options: AdapterOptions,
        creator: CreatorFn,
        destroyer: DestroyerFn,
    ) -> BmiResult<Self> {
        Self::create(AdapterBase::new(options)?, creator, destroyer)
    }

    fn create(base: AdapterBase, creator: CreatorFn, destroyer: DestroyerFn) -> BmiResult<Self> {
        // SAFETY: 创建函数返回新分配的模型对象
        let model = unsafe { creator() }.cast::<CppModel>();
        if model.is_null() {
            return Err(BmiError::binding(
                base.model_name(),
                format!("{} 的创建函数返回了空指针", base.model_name()),
            ));
        }
        debug!(model = %base.model_name(), "已创建 C++ 模型对象");
        Ok(Self {
            base,
            model,
            destroyer,
            library: None,
        })
    }

    fn inner(&self) -> BmiResult<&CppModel> {
        self.base.ensure_ready()?;
        // SAFETY: ensure_ready 成功意味着尚未 finalize，指针仍有效
        Ok(unsafe { &*self.model })
    }

    fn inner_mut(&mut self) -> BmiResult<&mut CppModel> {
        self.base.ensure_ready()?;
        Ok(unsafe { &mut *self.model })
    }

    fn model(&self) -> &str {
        self.base.model_name()
    }

    fn destroy(&mut self) {
        if self.model.is_null() {
            return;
        }
        // SAFETY: 指针来自创建函数且只释放一次
        unsafe { (self.destroyer)(self.model.cast()) };
        self.model = std::ptr::null_mut();
        debug!(model = %self.base.model_name(), "已销毁 C++ 模型对象");
    }
}

impl Bmi for CppAdapter {
    fn initialize(&mut self, config_file: &Path) -> BmiResult<()> {
        self.base.reconcile_config(config_file)?;
        let model = self.model;
        let name = self.base.model_name().to_string();
        self.base.initialize_with(|config| {
            // SAFETY: 初始化发生在 finalize 之前，指针有效
            let inner = unsafe { &mut *model };
            inner.initialize(config).map_err(|e| {
                BmiError::external_state(&name, format!("初始化 {name} 失败: {e}"))
            })?;
            inner.get_time_units()
        })
    }

    fn update(&mut self) -> BmiResult<()> {
        let name = self.model().to_string();
        self.inner_mut()?
            .update()
            .map_err(|e| BmiError::external_state(&name, format!("{name} 执行 update 失败: {e}")))
    }

    fn update_until(&mut self, time: f64) -> BmiResult<()> {
        let name = self.model().to_string();
        self.inner_mut()?.update_until(time).map_err(|e| {
            BmiError::external_state(&name, format!("{name} 执行 update_until({time}) 失败: {e}"))
        })
    }

    fn finalize(&mut self) -> BmiResult<()> {
        let model = self.model;
        let name = self.model().to_string();
        let result = self.base.finalize_with(|| {
            if model.is_null() {
                return Ok(());
            }
            unsafe { &mut *model }.finalize().map_err(|e| {
                BmiError::external_state(&name, format!("{name} 执行 finalize 失败: {e}"))
            })
        });
        self.destroy();
        // 对象销毁后才能关闭动态库
        if let Some(library) = self.library.as_mut() {
            library.close();
        }
        result
    }

    fn get_component_name(&self) -> BmiResult<String> {
        let inner = self.inner()?;
        self.base.cached_component_name(|| inner.get_component_name())
    }

    fn get_input_item_count(&self) -> BmiResult<usize> {
        let inner = self.inner()?;
        self.base.cached_input_item_count(|| inner.get_input_item_count())
    }

    fn get_output_item_count(&self) -> BmiResult<usize> {
        let inner = self.inner()?;
        self.base.cached_output_item_count(|| inner.get_output_item_count())
    }

    fn get_input_var_names(&self) -> BmiResult<Vec<String>> {
        let inner = self.inner()?;
        self.base.cached_input_var_names(|| inner.get_input_var_names())
    }

    fn get_output_var_names(&self) -> BmiResult<Vec<String>> {
        let inner = self.inner()?;
        self.base.cached_output_var_names(|| inner.get_output_var_names())
    }

    fn get_var_grid(&self, name: &str) -> BmiResult<i32> {
        self.inner()?.get_var_grid(name)
    }

    fn get_var_type(&self, name: &str) -> BmiResult<String> {
        self.inner()?.get_var_type(name)
    }

    fn get_var_units(&self, name: &str) -> BmiResult<String> {
        self.inner()?.get_var_units(name)
    }

    fn get_var_itemsize(&self, name: &str) -> BmiResult<usize> {
        self.inner()?.get_var_itemsize(name)
    }

    fn get_var_nbytes(&self, name: &str) -> BmiResult<usize> {
        self.inner()?.get_var_nbytes(name)
    }

    fn get_var_location(&self, name: &str) -> BmiResult<String> {
        self.inner()?.get_var_location(name)
    }

    fn get_current_time(&self) -> BmiResult<f64> {
        self.inner()?.get_current_time()
    }

    fn get_start_time(&self) -> BmiResult<f64> {
        self.inner()?.get_start_time()
    }

    fn get_end_time(&self) -> BmiResult<f64> {
        self.inner()?.get_end_time()
    }

    fn get_time_units(&self) -> BmiResult<String> {
        self.inner()?.get_time_units()
    }

    fn get_time_step(&self) -> BmiResult<f64> {
        let inner = self.inner()?;
        self.base.cached_time_step(|| inner.get_time_step())
    }

    fn get_value(&self, name: &str, dest: &mut [u8]) -> BmiResult<()> {
        let inner = self.inner()?;
        let nbytes = inner.get_var_nbytes(name)?;
        check_buffer_len(self.model(), name, nbytes, dest.len())?;
        inner.get_value(name, &mut dest[..nbytes])
    }

    fn get_value_ptr(&mut self, name: &str) -> BmiResult<*mut c_void> {
        self.inner_mut()?.get_value_ptr(name)
    }

    fn get_value_at_indices(&self, name: &str, dest: &mut [u8], inds: &[i32]) -> BmiResult<()> {
        let inner = self.inner()?;
        if inds.is_empty() {
            return Ok(());
        }
        let required = inner.get_var_itemsize(name)? * inds.len();
        check_buffer_len(self.model(), name, required, dest.len())?;
        inner.get_value_at_indices(name, &mut dest[..required], inds)
    }

    fn set_value(&mut self, name: &str, src: &[u8]) -> BmiResult<()> {
        let model = self.base.model_name().to_string();
        let inner = self.inner_mut()?;
        let nbytes = inner.get_var_nbytes(name)?;
        check_buffer_len(&model, name, nbytes, src.len())?;
        inner.set_value(name, &src[..nbytes])
    }

    fn set_value_at_indices(&mut self, name: &str, inds: &[i32], src: &[u8]) -> BmiResult<()> {
        let model = self.base.model_name().to_string();
        let inner = self.inner_mut()?;
        if inds.is_empty() {
            return Ok(());
        }
        let required = inner.get_var_itemsize(name)? * inds.len();
        check_buffer_len(&model, name, required, src.len())?;
        inner.set_value_at_indices(name, inds, &src[..required])
    }

    fn get_grid_rank(&self, grid: i32) -> BmiResult<i32> {
        self.inner()?.get_grid_rank(grid)
    }

    fn get_grid_size(&self, grid: i32) -> BmiResult<i32> {
        self.inner()?.get_grid_size(grid)
    }

    fn get_grid_type(&self, grid: i32) -> BmiResult<String> {
        self.inner()?.get_grid_type(grid)
    }

    fn get_grid_shape(&self, grid: i32, shape: &mut [i32]) -> BmiResult<()> {
        let inner = self.inner()?;
        let rank = inner.get_grid_rank(grid)?;
        if fill_degenerate_grid(rank, shape) {
            return Ok(());
        }
        check_grid_len(self.model(), "shape", grid, rank as usize, shape.len())?;
        inner.get_grid_shape(grid, shape)
    }

    fn get_grid_spacing(&self, grid: i32, spacing: &mut [f64]) -> BmiResult<()> {
        let inner = self.inner()?;
        let rank = inner.get_grid_rank(grid)?;
        if fill_degenerate_grid(rank, spacing) {
            return Ok(());
        }
        check_grid_len(self.model(), "spacing", grid, rank as usize, spacing.len())?;
        inner.get_grid_spacing(grid, spacing)
    }

    fn get_grid_origin(&self, grid: i32, origin: &mut [f64]) -> BmiResult<()> {
        let inner = self.inner()?;
        let rank = inner.get_grid_rank(grid)?;
        if fill_degenerate_grid(rank, origin) {
            return Ok(());
        }
        check_grid_len(self.model(), "origin", grid, rank as usize, origin.len())?;
        inner.get_grid_origin(grid, origin)
    }

    fn get_grid_x(&self, grid: i32, x: &mut [f64]) -> BmiResult<()> {
        self.inner()?.get_grid_x(grid, x)
    }

    fn get_grid_y(&self, grid: i32, y: &mut [f64]) -> BmiResult<()> {
        self.inner()?.get_grid_y(grid, y)
    }

    fn get_grid_z(&self, grid: i32, z: &mut [f64]) -> BmiResult<()> {
        self.inner()?.get_grid_z(grid, z)
    }

    fn get_grid_node_count(&self, grid: i32) -> BmiResult<i32> {
        self.inner()?.get_grid_node_count(grid)
    }

    fn get_grid_edge_count(&self, grid: i32) -> BmiResult<i32> {
        self.inner()?.get_grid_edge_count(grid)
    }

    fn get_grid_face_count(&self, grid: i32) -> BmiResult<i32> {
        self.inner()?.get_grid_face_count(grid)
    }

    fn get_grid_edge_nodes(&self, grid: i32, edge_nodes: &mut [i32]) -> BmiResult<()> {
        self.inner()?.get_grid_edge_nodes(grid, edge_nodes)
    }

    fn get_grid_face_edges(&self, grid: i32, face_edges: &mut [i32]) -> BmiResult<()> {
        self.inner()?.get_grid_face_edges(grid, face_edges)
    }

    fn get_grid_face_nodes(&self, grid: i32, face_nodes: &mut [i32]) -> BmiResult<()> {
        self.inner()?.get_grid_face_nodes(grid, face_nodes)
    }

    fn get_grid_nodes_per_face(&self, grid: i32, nodes_per_face: &mut [i32]) -> BmiResult<()> {
        self.inner()?.get_grid_nodes_per_face(grid, nodes_per_face)
    }
}

impl BmiAdapter for CppAdapter {
    fn base(&self) -> &AdapterBase {
        &self.base
    }

    fn backend_kind(&self) -> BackendKind {
        BackendKind::Cpp
    }
}

impl Drop for CppAdapter {
    fn drop(&mut self) {
        if let Err(e) = Bmi::finalize(self) {
            warn!(model = %self.model(), error = %e, "释放 C++ 模型失败");
        }
    }
}
