// hydrolink\crates\hl_bmi\src/c.rs

//! C 后端适配器
//!
//! 后端模型是 [`CBmi`] 函数指针结构体，由动态库导出的注册函数（默认
//! `register_bmi`）填充。C 没有独立的构造步骤，[`CAdapter::new`] 在构造时
//! 立即初始化模型。

use crate::adapter::{
    check_buffer_len, check_grid_len, fill_degenerate_grid, AdapterBase, AdapterOptions,
};
use crate::bmi::{BackendKind, Bmi, BmiAdapter};
use crate::c_ffi::*;
use crate::dylib::DynamicLibrary;
use crate::error::{BmiError, BmiResult};
use std::ffi::{c_char, c_int, c_void, CString};
use std::path::{Path, PathBuf};
use tracing::warn;

/// 默认注册函数名
pub const DEFAULT_REGISTRATION_FUNCTION: &str = "register_bmi";

/// C 后端模型的原始调用封装
///
/// 只负责编组，不关心初始化状态。
struct CModel {
    name: String,
    bmi: *mut CBmi,
}

impl CModel {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            bmi: Box::into_raw(Box::new(CBmi::empty())),
        }
    }

    fn table(&self) -> &CBmi {
        // SAFETY: bmi 来自 Box::into_raw，生命周期与 self 相同
        unsafe { &*self.bmi }
    }

    fn require<F: Copy>(&self, f: Option<F>, op: &str) -> BmiResult<F> {
        f.ok_or_else(|| BmiError::binding(&self.name, format!("模型未注册函数 {op}")))
    }

    fn c_string(&self, value: &str) -> BmiResult<CString> {
        CString::new(value)
            .map_err(|_| BmiError::backend(&self.name, format!("名称 '{value}' 含有空字符")))
    }

    fn failed(&self, message: String) -> BmiError {
        BmiError::backend(&self.name, message)
    }

    fn count(&self, value: c_int, what: &str) -> BmiResult<usize> {
        usize::try_from(value)
            .map_err(|_| self.failed(format!("{what} 返回了负值 {value}")))
    }

    // ------------------------------------------------------------------------
    // 控制
    // ------------------------------------------------------------------------

    fn initialize(&self, config: &Path) -> BmiResult<()> {
        let f = self.require(self.table().initialize, "initialize")?;
        let path = config.to_str().ok_or_else(|| {
            BmiError::config(&self.name, format!("配置路径不是有效 UTF-8: {}", config.display()))
        })?;
        let path = self.c_string(path)?;
        // SAFETY: 结构体由注册函数填充，指针在调用期间有效
        if unsafe { f(self.bmi, path.as_ptr()) } != BMI_SUCCESS {
            return Err(BmiError::external_state(
                &self.name,
                format!("初始化 {} 失败 (配置 '{}')", self.name, config.display()),
            ));
        }
        Ok(())
    }

    fn control(&self, f: Option<SelfFn>, op: &str) -> BmiResult<()> {
        let f = self.require(f, op)?;
        if unsafe { f(self.bmi) } != BMI_SUCCESS {
            return Err(BmiError::external_state(
                &self.name,
                format!("{} 执行 {op} 失败", self.name),
            ));
        }
        Ok(())
    }

    fn update_until(&self, time: f64) -> BmiResult<()> {
        let f = self.require(self.table().update_until, "update_until")?;
        if unsafe { f(self.bmi, time) } != BMI_SUCCESS {
            return Err(BmiError::external_state(
                &self.name,
                format!("{} 执行 update_until({time}) 失败", self.name),
            ));
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // 查询
    // ------------------------------------------------------------------------

    fn string_out(&self, f: Option<StrOutFn>, op: &str, size: usize) -> BmiResult<String> {
        let f = self.require(f, op)?;
        let mut buffer = vec![0u8; size];
        if unsafe { f(self.bmi, buffer.as_mut_ptr().cast::<c_char>()) } != BMI_SUCCESS {
            return Err(self.failed(format!("{op} 调用失败")));
        }
        Ok(string_from_buffer(&buffer))
    }

    fn int_out(&self, f: Option<IntOutFn>, op: &str) -> BmiResult<c_int> {
        let f = self.require(f, op)?;
        let mut value: c_int = 0;
        if unsafe { f(self.bmi, &mut value) } != BMI_SUCCESS {
            return Err(self.failed(format!("{op} 调用失败")));
        }
        Ok(value)
    }

    fn var_names(&self, count: usize, f: Option<NamesOutFn>, op: &str) -> BmiResult<Vec<String>> {
        let f = self.require(f, op)?;
        if count == 0 {
            return Ok(Vec::new());
        }
        let mut buffers = vec![vec![0u8; BMI_MAX_VAR_NAME]; count];
        let mut pointers: Vec<*mut c_char> = buffers
            .iter_mut()
            .map(|b| b.as_mut_ptr().cast::<c_char>())
            .collect();
        if unsafe { f(self.bmi, pointers.as_mut_ptr()) } != BMI_SUCCESS {
            return Err(self.failed(format!("{op} 调用失败")));
        }
        Ok(buffers.iter().map(|b| string_from_buffer(b)).collect())
    }

    fn var_int(&self, f: Option<VarIntFn>, op: &str, name: &str) -> BmiResult<c_int> {
        let f = self.require(f, op)?;
        let c_name = self.c_string(name)?;
        let mut value: c_int = 0;
        if unsafe { f(self.bmi, c_name.as_ptr(), &mut value) } != BMI_SUCCESS {
            return Err(self.failed(format!("无法获取变量 {name} 的 {op}")));
        }
        Ok(value)
    }

    fn var_string(&self, f: Option<VarStrFn>, op: &str, name: &str, size: usize) -> BmiResult<String> {
        let f = self.require(f, op)?;
        let c_name = self.c_string(name)?;
        let mut buffer = vec![0u8; size];
        let rc = unsafe { f(self.bmi, c_name.as_ptr(), buffer.as_mut_ptr().cast::<c_char>()) };
        if rc != BMI_SUCCESS {
            return Err(self.failed(format!("无法获取变量 {name} 的 {op}")));
        }
        Ok(string_from_buffer(&buffer))
    }

    fn time(&self, f: Option<TimeFn>, op: &str) -> BmiResult<f64> {
        let f = self.require(f, op)?;
        let mut value = 0.0;
        if unsafe { f(self.bmi, &mut value) } != BMI_SUCCESS {
            return Err(self.failed(format!("{op} 调用失败")));
        }
        Ok(value)
    }

    fn time_units(&self) -> BmiResult<String> {
        self.string_out(self.table().get_time_units, "get_time_units", BMI_MAX_UNITS_NAME)
    }

    fn nbytes(&self, name: &str) -> BmiResult<usize> {
        let n = self.var_int(self.table().get_var_nbytes, "get_var_nbytes", name)?;
        self.count(n, "get_var_nbytes")
    }

    fn itemsize(&self, name: &str) -> BmiResult<usize> {
        let n = self.var_int(self.table().get_var_itemsize, "get_var_itemsize", name)?;
        self.count(n, "get_var_itemsize")
    }

    // ------------------------------------------------------------------------
    // 网格
    // ------------------------------------------------------------------------

    fn grid_int(&self, f: Option<GridIntFn>, op: &str, grid: i32) -> BmiResult<i32> {
        let f = self.require(f, op)?;
        let mut value: c_int = 0;
        if unsafe { f(self.bmi, grid, &mut value) } != BMI_SUCCESS {
            return Err(self.failed(format!("无法获取网格 {grid} 的 {op}")));
        }
        Ok(value)
    }

    fn grid_ints(&self, f: Option<GridIntFn>, op: &str, grid: i32, dest: &mut [i32]) -> BmiResult<()> {
        let f = self.require(f, op)?;
        if unsafe { f(self.bmi, grid, dest.as_mut_ptr()) } != BMI_SUCCESS {
            return Err(self.failed(format!("无法获取网格 {grid} 的 {op}")));
        }
        Ok(())
    }

    fn grid_doubles(&self, f: Option<GridDoubleFn>, op: &str, grid: i32, dest: &mut [f64]) -> BmiResult<()> {
        let f = self.require(f, op)?;
        if unsafe { f(self.bmi, grid, dest.as_mut_ptr()) } != BMI_SUCCESS {
            return Err(self.failed(format!("无法获取网格 {grid} 的 {op}")));
        }
        Ok(())
    }

    fn grid_len(&self, f: Option<GridIntFn>, op: &str, grid: i32) -> BmiResult<usize> {
        let n = self.grid_int(f, op, grid)?;
        self.count(n, op)
    }

    fn nodes_per_face_total(&self, grid: i32) -> BmiResult<usize> {
        let faces = self.grid_len(self.table().get_grid_face_count, "get_grid_face_count", grid)?;
        let mut per_face = vec![0i32; faces];
        self.grid_ints(
            self.table().get_grid_nodes_per_face,
            "get_grid_nodes_per_face",
            grid,
            &mut per_face,
        )?;
        Ok(per_face.iter().map(|&n| n.max(0) as usize).sum())
    }
}

impl Drop for CModel {
    fn drop(&mut self) {
        // SAFETY: 与 new 中的 Box::into_raw 配对
        unsafe { drop(Box::from_raw(self.bmi)) };
    }
}

/// C 后端适配器
pub struct CAdapter {
    base: AdapterBase,
    model: CModel,
    library: Option<DynamicLibrary>,
    registration_function: String,
}

// SAFETY: 后端模型只经由本适配器访问，且 BMI 调用要求严格串行
unsafe impl Send for CAdapter {}

impl CAdapter {
    /// 加载动态库、注册并立即初始化模型
    ///
    /// # 参数
    /// - `options`: 通用构造参数
    /// - `library_file`: 动态库路径（不可读时尝试 `.so`/`.dylib` 替换）
    /// - `registration_function`: 注册函数名
    pub fn new(
        options: AdapterOptions,
        library_file: impl Into<PathBuf>,
        registration_function: &str,
    ) -> BmiResult<Self> {
        let mut adapter = Self::load(options, library_file, registration_function)?;
        adapter.initialize_configured()?;
        Ok(adapter)
    }

    /// 加载动态库并注册模型，但不初始化
    pub fn load(
        options: AdapterOptions,
        library_file: impl Into<PathBuf>,
        registration_function: &str,
    ) -> BmiResult<Self> {
        let base = AdapterBase::new(options)?;
        let mut library = DynamicLibrary::new(base.model_name(), library_file);
        library.load(registration_function)?;
        // SAFETY: 注册函数遵循 bmi.h 约定的签名
        let register: RegisterBmiFn = unsafe { library.function(registration_function)? };
        Ok(Self::register(base, register, Some(library), registration_function))
    }

    /// 使用进程内的注册函数构造，不初始化
    pub fn from_registration(options: AdapterOptions, register: RegisterBmiFn) -> BmiResult<Self> {
        let base = AdapterBase::new(options)?;
        Ok(Self::register(base, register, None, DEFAULT_REGISTRATION_FUNCTION))
    }

    fn register(
        base: AdapterBase,
        register: RegisterBmiFn,
        library: Option<DynamicLibrary>,
        registration_function: &str,
    ) -> Self {
        let model = CModel::new(base.model_name());
        // SAFETY: 结构体已分配且全空，注册函数只填充字段
        let returned = unsafe { register(model.bmi) };
        if !returned.is_null() && returned != model.bmi {
            warn!(model = %base.model_name(), "注册函数返回了不同的结构体指针，已忽略");
        }
        Self {
            base,
            model,
            library,
            registration_function: registration_function.to_string(),
        }
    }

    /// 注册函数名
    pub fn registration_function(&self) -> &str {
        &self.registration_function
    }

    /// 实际加载的动态库路径（进程内注册时为 `None`）
    pub fn library_path(&self) -> Option<&Path> {
        self.library.as_ref().and_then(|l| l.loaded_path())
    }

    fn ready(&self) -> BmiResult<&CModel> {
        self.base.ensure_ready()?;
        Ok(&self.model)
    }

    fn grid_array_len(&self, grid: i32) -> BmiResult<usize> {
        let model = self.ready()?;
        model.grid_len(model.table().get_grid_size, "get_grid_size", grid)
    }
}

impl Bmi for CAdapter {
    fn initialize(&mut self, config_file: &Path) -> BmiResult<()> {
        self.base.reconcile_config(config_file)?;
        let model = &self.model;
        self.base.initialize_with(|config| {
            model.initialize(config)?;
            model.time_units()
        })
    }

    fn update(&mut self) -> BmiResult<()> {
        let model = self.ready()?;
        model.control(model.table().update, "update")
    }

    fn update_until(&mut self, time: f64) -> BmiResult<()> {
        self.ready()?.update_until(time)
    }

    fn finalize(&mut self) -> BmiResult<()> {
        let model = &self.model;
        let result = self
            .base
            .finalize_with(|| model.control(model.table().finalize, "finalize"));
        // 模型 finalize 完成后才能关闭动态库
        if let Some(library) = self.library.as_mut() {
            library.close();
        }
        result
    }

    fn get_component_name(&self) -> BmiResult<String> {
        let model = self.ready()?;
        self.base.cached_component_name(|| {
            model.string_out(
                model.table().get_component_name,
                "get_component_name",
                BMI_MAX_COMPONENT_NAME,
            )
        })
    }

    fn get_input_item_count(&self) -> BmiResult<usize> {
        let model = self.ready()?;
        self.base.cached_input_item_count(|| {
            let n = model.int_out(model.table().get_input_item_count, "get_input_item_count")?;
            model.count(n, "get_input_item_count")
        })
    }

    fn get_output_item_count(&self) -> BmiResult<usize> {
        let model = self.ready()?;
        self.base.cached_output_item_count(|| {
            let n = model.int_out(model.table().get_output_item_count, "get_output_item_count")?;
            model.count(n, "get_output_item_count")
        })
    }

    fn get_input_var_names(&self) -> BmiResult<Vec<String>> {
        let model = self.ready()?;
        self.base.cached_input_var_names(|| {
            let count = self.get_input_item_count()?;
            model.var_names(count, model.table().get_input_var_names, "get_input_var_names")
        })
    }

    fn get_output_var_names(&self) -> BmiResult<Vec<String>> {
        let model = self.ready()?;
        self.base.cached_output_var_names(|| {
            let count = self.get_output_item_count()?;
            model.var_names(count, model.table().get_output_var_names, "get_output_var_names")
        })
    }

    fn get_var_grid(&self, name: &str) -> BmiResult<i32> {
        let model = self.ready()?;
        model.var_int(model.table().get_var_grid, "get_var_grid", name)
    }

    fn get_var_type(&self, name: &str) -> BmiResult<String> {
        let model = self.ready()?;
        model.var_string(model.table().get_var_type, "get_var_type", name, BMI_MAX_TYPE_NAME)
    }

    fn get_var_units(&self, name: &str) -> BmiResult<String> {
        let model = self.ready()?;
        model.var_string(model.table().get_var_units, "get_var_units", name, BMI_MAX_UNITS_NAME)
    }

    fn get_var_itemsize(&self, name: &str) -> BmiResult<usize> {
        self.ready()?.itemsize(name)
    }

    fn get_var_nbytes(&self, name: &str) -> BmiResult<usize> {
        self.ready()?.nbytes(name)
    }

    fn get_var_location(&self, name: &str) -> BmiResult<String> {
        let model = self.ready()?;
        model.var_string(
            model.table().get_var_location,
            "get_var_location",
            name,
            BMI_MAX_LOCATION_NAME,
        )
    }

    fn get_current_time(&self) -> BmiResult<f64> {
        let model = self.ready()?;
        model.time(model.table().get_current_time, "get_current_time")
    }

    fn get_start_time(&self) -> BmiResult<f64> {
        let model = self.ready()?;
        model.time(model.table().get_start_time, "get_start_time")
    }

    fn get_end_time(&self) -> BmiResult<f64> {
        let model = self.ready()?;
        model.time(model.table().get_end_time, "get_end_time")
    }

    fn get_time_units(&self) -> BmiResult<String> {
        self.ready()?.time_units()
    }

    fn get_time_step(&self) -> BmiResult<f64> {
        let model = self.ready()?;
        self.base
            .cached_time_step(|| model.time(model.table().get_time_step, "get_time_step"))
    }

    fn get_value(&self, name: &str, dest: &mut [u8]) -> BmiResult<()> {
        let model = self.ready()?;
        let nbytes = model.nbytes(name)?;
        check_buffer_len(&model.name, name, nbytes, dest.len())?;
        let f = model.require(model.table().get_value, "get_value")?;
        let c_name = model.c_string(name)?;
        if unsafe { f(model.bmi, c_name.as_ptr(), dest.as_mut_ptr().cast::<c_void>()) } != BMI_SUCCESS {
            return Err(model.failed(format!("无法获取变量 {name} 的值")));
        }
        Ok(())
    }

    fn get_value_ptr(&mut self, name: &str) -> BmiResult<*mut c_void> {
        let model = self.ready()?;
        let f = model.require(model.table().get_value_ptr, "get_value_ptr")?;
        let c_name = model.c_string(name)?;
        let mut ptr: *mut c_void = std::ptr::null_mut();
        if unsafe { f(model.bmi, c_name.as_ptr(), &mut ptr) } != BMI_SUCCESS {
            return Err(model.failed(format!("无法获取变量 {name} 的指针")));
        }
        Ok(ptr)
    }

    fn get_value_at_indices(&self, name: &str, dest: &mut [u8], inds: &[i32]) -> BmiResult<()> {
        let model = self.ready()?;
        if inds.is_empty() {
            return Ok(());
        }
        let itemsize = model.itemsize(name)?;
        check_buffer_len(&model.name, name, itemsize * inds.len(), dest.len())?;
        let f = model.require(model.table().get_value_at_indices, "get_value_at_indices")?;
        let c_name = model.c_string(name)?;
        let count = c_int::try_from(inds.len())
            .map_err(|_| model.failed(format!("索引数量 {} 超出范围", inds.len())))?;
        let rc = unsafe {
            f(
                model.bmi,
                c_name.as_ptr(),
                dest.as_mut_ptr().cast::<c_void>(),
                inds.as_ptr().cast_mut(),
                count,
            )
        };
        if rc != BMI_SUCCESS {
            return Err(model.failed(format!("无法按 {} 个索引获取变量 {name}", inds.len())));
        }
        Ok(())
    }

    fn set_value(&mut self, name: &str, src: &[u8]) -> BmiResult<()> {
        let model = self.ready()?;
        let nbytes = model.nbytes(name)?;
        check_buffer_len(&model.name, name, nbytes, src.len())?;
        let f = model.require(model.table().set_value, "set_value")?;
        let c_name = model.c_string(name)?;
        let rc = unsafe { f(model.bmi, c_name.as_ptr(), src.as_ptr().cast_mut().cast::<c_void>()) };
        if rc != BMI_SUCCESS {
            return Err(model.failed(format!("无法设置变量 {name} 的值")));
        }
        Ok(())
    }

    fn set_value_at_indices(&mut self, name: &str, inds: &[i32], src: &[u8]) -> BmiResult<()> {
        let model = self.ready()?;
        if inds.is_empty() {
            return Ok(());
        }
        let itemsize = model.itemsize(name)?;
        check_buffer_len(&model.name, name, itemsize * inds.len(), src.len())?;
        let f = model.require(model.table().set_value_at_indices, "set_value_at_indices")?;
        let c_name = model.c_string(name)?;
        let count = c_int::try_from(inds.len())
            .map_err(|_| model.failed(format!("索引数量 {} 超出范围", inds.len())))?;
        let rc = unsafe {
            f(
                model.bmi,
                c_name.as_ptr(),
                inds.as_ptr().cast_mut(),
                count,
                src.as_ptr().cast_mut().cast::<c_void>(),
            )
        };
        if rc != BMI_SUCCESS {
            return Err(model.failed(format!("无法按 {} 个索引设置变量 {name}", inds.len())));
        }
        Ok(())
    }

    fn get_grid_rank(&self, grid: i32) -> BmiResult<i32> {
        let model = self.ready()?;
        model.grid_int(model.table().get_grid_rank, "get_grid_rank", grid)
    }

    fn get_grid_size(&self, grid: i32) -> BmiResult<i32> {
        let model = self.ready()?;
        model.grid_int(model.table().get_grid_size, "get_grid_size", grid)
    }

    fn get_grid_type(&self, grid: i32) -> BmiResult<String> {
        let model = self.ready()?;
        let f = model.require(model.table().get_grid_type, "get_grid_type")?;
        let mut buffer = vec![0u8; BMI_MAX_TYPE_NAME];
        if unsafe { f(model.bmi, grid, buffer.as_mut_ptr().cast::<c_char>()) } != BMI_SUCCESS {
            return Err(model.failed(format!("无法获取网格 {grid} 的类型")));
        }
        Ok(string_from_buffer(&buffer))
    }

    fn get_grid_shape(&self, grid: i32, shape: &mut [i32]) -> BmiResult<()> {
        let rank = self.get_grid_rank(grid)?;
        if fill_degenerate_grid(rank, shape) {
            return Ok(());
        }
        check_grid_len(&self.model.name, "shape", grid, rank as usize, shape.len())?;
        self.model
            .grid_ints(self.model.table().get_grid_shape, "get_grid_shape", grid, shape)
    }

    fn get_grid_spacing(&self, grid: i32, spacing: &mut [f64]) -> BmiResult<()> {
        let rank = self.get_grid_rank(grid)?;
        if fill_degenerate_grid(rank, spacing) {
            return Ok(());
        }
        check_grid_len(&self.model.name, "spacing", grid, rank as usize, spacing.len())?;
        self.model
            .grid_doubles(self.model.table().get_grid_spacing, "get_grid_spacing", grid, spacing)
    }

    fn get_grid_origin(&self, grid: i32, origin: &mut [f64]) -> BmiResult<()> {
        let rank = self.get_grid_rank(grid)?;
        if fill_degenerate_grid(rank, origin) {
            return Ok(());
        }
        check_grid_len(&self.model.name, "origin", grid, rank as usize, origin.len())?;
        self.model
            .grid_doubles(self.model.table().get_grid_origin, "get_grid_origin", grid, origin)
    }

    fn get_grid_x(&self, grid: i32, x: &mut [f64]) -> BmiResult<()> {
        let required = self.grid_array_len(grid)?;
        check_grid_len(&self.model.name, "x", grid, required, x.len())?;
        self.model
            .grid_doubles(self.model.table().get_grid_x, "get_grid_x", grid, x)
    }

    fn get_grid_y(&self, grid: i32, y: &mut [f64]) -> BmiResult<()> {
        let required = self.grid_array_len(grid)?;
        check_grid_len(&self.model.name, "y", grid, required, y.len())?;
        self.model
            .grid_doubles(self.model.table().get_grid_y, "get_grid_y", grid, y)
    }

    fn get_grid_z(&self, grid: i32, z: &mut [f64]) -> BmiResult<()> {
        let required = self.grid_array_len(grid)?;
        check_grid_len(&self.model.name, "z", grid, required, z.len())?;
        self.model
            .grid_doubles(self.model.table().get_grid_z, "get_grid_z", grid, z)
    }

    fn get_grid_node_count(&self, grid: i32) -> BmiResult<i32> {
        let model = self.ready()?;
        model.grid_int(model.table().get_grid_node_count, "get_grid_node_count", grid)
    }

    fn get_grid_edge_count(&self, grid: i32) -> BmiResult<i32> {
        let model = self.ready()?;
        model.grid_int(model.table().get_grid_edge_count, "get_grid_edge_count", grid)
    }

    fn get_grid_face_count(&self, grid: i32) -> BmiResult<i32> {
        let model = self.ready()?;
        model.grid_int(model.table().get_grid_face_count, "get_grid_face_count", grid)
    }

    fn get_grid_edge_nodes(&self, grid: i32, edge_nodes: &mut [i32]) -> BmiResult<()> {
        let model = self.ready()?;
        let edges = model.grid_len(model.table().get_grid_edge_count, "get_grid_edge_count", grid)?;
        check_grid_len(&model.name, "edge_nodes", grid, 2 * edges, edge_nodes.len())?;
        model.grid_ints(model.table().get_grid_edge_nodes, "get_grid_edge_nodes", grid, edge_nodes)
    }

    fn get_grid_face_edges(&self, grid: i32, face_edges: &mut [i32]) -> BmiResult<()> {
        let model = self.ready()?;
        let required = model.nodes_per_face_total(grid)?;
        check_grid_len(&model.name, "face_edges", grid, required, face_edges.len())?;
        model.grid_ints(model.table().get_grid_face_edges, "get_grid_face_edges", grid, face_edges)
    }

    fn get_grid_face_nodes(&self, grid: i32, face_nodes: &mut [i32]) -> BmiResult<()> {
        let model = self.ready()?;
        let required = model.nodes_per_face_total(grid)?;
        check_grid_len(&model.name, "face_nodes", grid, required, face_nodes.len())?;
        model.grid_ints(model.table().get_grid_face_nodes, "get_grid_face_nodes", grid, face_nodes)
    }

    fn get_grid_nodes_per_face(&self, grid: i32, nodes_per_face: &mut [i32]) -> BmiResult<()> {
        let model = self.ready()?;
        let faces = model.grid_len(model.table().get_grid_face_count, "get_grid_face_count", grid)?;
        check_grid_len(&model.name, "nodes_per_face", grid, faces, nodes_per_face.len())?;
        model.grid_ints(
            model.table().get_grid_nodes_per_face,
            "get_grid_nodes_per_face",
            grid,
            nodes_per_face,
        )
    }
}

impl BmiAdapter for CAdapter {
    fn base(&self) -> &AdapterBase {
        &self.base
    }

    fn backend_kind(&self) -> BackendKind {
        BackendKind::C
    }
}

impl Drop for CAdapter {
    fn drop(&mut self) {
        if let Err(e) = Bmi::finalize(self) {
            warn!(model = %self.base.model_name(), error = %e, "释放 C 模型失败");
        }
    }
}
