// hydrolink\crates\hl_bmi\src/fortran.rs

//! Fortran 后端适配器
//!
//! Fortran 模型通过 ISO-C-binding 中间件暴露一组自由代理函数，每个函数与 BMI
//! 标准函数同名，首个参数为注册函数返回的不透明句柄。网格编号以指针传递。
//!
//! 中间件只提供 int/float/double 三种取值与赋值代理，也不支持按索引访问与
//! 取值指针。

use crate::adapter::{
    check_buffer_len, check_grid_len, fill_degenerate_grid, AdapterBase, AdapterOptions,
};
use crate::bmi::{BackendKind, Bmi, BmiAdapter};
use crate::c_ffi::{
    string_from_buffer, BMI_MAX_COMPONENT_NAME, BMI_MAX_LOCATION_NAME, BMI_MAX_TYPE_NAME,
    BMI_MAX_UNITS_NAME, BMI_MAX_VAR_NAME, BMI_SUCCESS,
};
use crate::dylib::DynamicLibrary;
use crate::error::{BmiError, BmiResult};
use crate::foreign_type::NativeType;
use std::ffi::{c_char, c_double, c_float, c_int, c_void, CString};
use std::path::{Path, PathBuf};
use tracing::warn;

/// 注册函数：通过出参返回 Fortran 模型句柄
pub type FortranRegisterFn = unsafe extern "C" fn(handle: *mut *mut c_void) -> c_int;

type Handle = *mut c_void;

/// ISO-C-binding 代理函数表
///
/// 字段名即动态库中的符号名。
#[allow(missing_docs)]
#[derive(Clone, Copy)]
pub struct FortranProxies {
    pub initialize: unsafe extern "C" fn(Handle, *const c_char) -> c_int,
    pub update: unsafe extern "C" fn(Handle) -> c_int,
    pub update_until: unsafe extern "C" fn(Handle, *mut c_double) -> c_int,
    pub finalize: unsafe extern "C" fn(Handle) -> c_int,

    pub get_component_name: unsafe extern "C" fn(Handle, *mut c_char) -> c_int,
    pub get_input_item_count: unsafe extern "C" fn(Handle, *mut c_int) -> c_int,
    pub get_output_item_count: unsafe extern "C" fn(Handle, *mut c_int) -> c_int,
    pub get_input_var_names: unsafe extern "C" fn(Handle, *mut *mut c_char) -> c_int,
    pub get_output_var_names: unsafe extern "C" fn(Handle, *mut *mut c_char) -> c_int,

    pub get_var_grid: unsafe extern "C" fn(Handle, *const c_char, *mut c_int) -> c_int,
    pub get_var_type: unsafe extern "C" fn(Handle, *const c_char, *mut c_char) -> c_int,
    pub get_var_units: unsafe extern "C" fn(Handle, *const c_char, *mut c_char) -> c_int,
    pub get_var_itemsize: unsafe extern "C" fn(Handle, *const c_char, *mut c_int) -> c_int,
    pub get_var_nbytes: unsafe extern "C" fn(Handle, *const c_char, *mut c_int) -> c_int,
    pub get_var_location: unsafe extern "C" fn(Handle, *const c_char, *mut c_char) -> c_int,

    pub get_current_time: unsafe extern "C" fn(Handle, *mut c_double) -> c_int,
    pub get_start_time: unsafe extern "C" fn(Handle, *mut c_double) -> c_int,
    pub get_end_time: unsafe extern "C" fn(Handle, *mut c_double) -> c_int,
    pub get_time_units: unsafe extern "C" fn(Handle, *mut c_char) -> c_int,
    pub get_time_step: unsafe extern "C" fn(Handle, *mut c_double) -> c_int,

    pub get_value_int: unsafe extern "C" fn(Handle, *const c_char, *mut c_int) -> c_int,
    pub get_value_float: unsafe extern "C" fn(Handle, *const c_char, *mut c_float) -> c_int,
    pub get_value_double: unsafe extern "C" fn(Handle, *const c_char, *mut c_double) -> c_int,
    pub set_value_int: unsafe extern "C" fn(Handle, *const c_char, *mut c_int) -> c_int,
    pub set_value_float: unsafe extern "C" fn(Handle, *const c_char, *mut c_float) -> c_int,
    pub set_value_double: unsafe extern "C" fn(Handle, *const c_char, *mut c_double) -> c_int,

    pub get_grid_rank: unsafe extern "C" fn(Handle, *mut c_int, *mut c_int) -> c_int,
    pub get_grid_size: unsafe extern "C" fn(Handle, *mut c_int, *mut c_int) -> c_int,
    pub get_grid_type: unsafe extern "C" fn(Handle, *mut c_int, *mut c_char) -> c_int,
    pub get_grid_shape: unsafe extern "C" fn(Handle, *mut c_int, *mut c_int) -> c_int,
    pub get_grid_spacing: unsafe extern "C" fn(Handle, *mut c_int, *mut c_double) -> c_int,
    pub get_grid_origin: unsafe extern "C" fn(Handle, *mut c_int, *mut c_double) -> c_int,
    pub get_grid_x: unsafe extern "C" fn(Handle, *mut c_int, *mut c_double) -> c_int,
    pub get_grid_y: unsafe extern "C" fn(Handle, *mut c_int, *mut c_double) -> c_int,
    pub get_grid_z: unsafe extern "C" fn(Handle, *mut c_int, *mut c_double) -> c_int,
    pub get_grid_node_count: unsafe extern "C" fn(Handle, *mut c_int, *mut c_int) -> c_int,
    pub get_grid_edge_count: unsafe extern "C" fn(Handle, *mut c_int, *mut c_int) -> c_int,
    pub get_grid_face_count: unsafe extern "C" fn(Handle, *mut c_int, *mut c_int) -> c_int,
    pub get_grid_edge_nodes: unsafe extern "C" fn(Handle, *mut c_int, *mut c_int) -> c_int,
    pub get_grid_face_edges: unsafe extern "C" fn(Handle, *mut c_int, *mut c_int) -> c_int,
    pub get_grid_face_nodes: unsafe extern "C" fn(Handle, *mut c_int, *mut c_int) -> c_int,
    pub get_grid_nodes_per_face: unsafe extern "C" fn(Handle, *mut c_int, *mut c_int) -> c_int,
}

impl FortranProxies {
    /// 从已打开的动态库按 BMI 标准函数名解析全部代理
    ///
    /// # Safety
    ///
    /// 库中同名符号必须具有上述 ISO-C-binding 签名。
    pub unsafe fn resolve(library: &DynamicLibrary) -> BmiResult<Self> {
        macro_rules! proxies {
            ($($field:ident),* $(,)?) => {
                Self { $($field: library.function(stringify!($field))?,)* }
            };
        }
        Ok(proxies!(
            initialize, update, update_until, finalize,
            get_component_name, get_input_item_count, get_output_item_count,
            get_input_var_names, get_output_var_names,
            get_var_grid, get_var_type, get_var_units, get_var_itemsize, get_var_nbytes,
            get_var_location,
            get_current_time, get_start_time, get_end_time, get_time_units, get_time_step,
            get_value_int, get_value_float, get_value_double,
            set_value_int, set_value_float, set_value_double,
            get_grid_rank, get_grid_size, get_grid_type,
            get_grid_shape, get_grid_spacing, get_grid_origin,
            get_grid_x, get_grid_y, get_grid_z,
            get_grid_node_count, get_grid_edge_count, get_grid_face_count,
            get_grid_edge_nodes, get_grid_face_edges, get_grid_face_nodes,
            get_grid_nodes_per_face,
        ))
    }
}

/// 中间件支持的取值类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProxyValueType {
    Int,
    Float,
    Double,
}

/// Fortran 后端适配器
pub struct FortranAdapter {
    base: AdapterBase,
    proxies: FortranProxies,
    handle: Handle,
    library: Option<DynamicLibrary>,
}

// SAFETY: 句柄只经由本适配器访问，调用严格串行
unsafe impl Send for FortranAdapter {}

impl FortranAdapter {
    /// 加载动态库、注册并立即初始化模型
    pub fn new(
        options: AdapterOptions,
        library_file: impl Into<PathBuf>,
        registration_function: &str,
    ) -> BmiResult<Self> {
        let mut adapter = Self::load(options, library_file, registration_function)?;
        adapter.initialize_configured()?;
        Ok(adapter)
    }

    /// 加载动态库、解析代理并注册模型，但不初始化
    pub fn load(
        options: AdapterOptions,
        library_file: impl Into<PathBuf>,
        registration_function: &str,
    ) -> BmiResult<Self> {
        let base = AdapterBase::new(options)?;
        let mut library = DynamicLibrary::new(base.model_name(), library_file);
        library.load(registration_function)?;
        // SAFETY: 中间件导出的符号遵循 ISO-C-binding 约定
        let (register, proxies) = unsafe {
            let register: FortranRegisterFn = library.function(registration_function)?;
            (register, FortranProxies::resolve(&library)?)
        };
        let mut adapter = Self::with_proxies(base, proxies, register)?;
        adapter.library = Some(library);
        Ok(adapter)
    }

    /// 使用进程内代理构造，不初始化
    pub fn from_proxies(
        options: AdapterOptions,
        proxies: FortranProxies,
        register: FortranRegisterFn,
    ) -> BmiResult<Self> {
        Self::with_proxies(AdapterBase::new(options)?, proxies, register)
    }

    fn with_proxies(
        base: AdapterBase,
        proxies: FortranProxies,
        register: FortranRegisterFn,
    ) -> BmiResult<Self> {
        let mut handle: Handle = std::ptr::null_mut();
        // SAFETY: 出参指向本地变量
        if unsafe { register(&mut handle) } != BMI_SUCCESS || handle.is_null() {
            return Err(BmiError::binding(
                base.model_name(),
                format!("{} 的 Fortran 注册函数未返回有效句柄", base.model_name()),
            ));
        }
        Ok(Self {
            base,
            proxies,
            handle,
            library: None,
        })
    }

    fn model(&self) -> &str {
        self.base.model_name()
    }

    fn ready(&self) -> BmiResult<()> {
        self.base.ensure_ready()
    }

    fn failed(&self, what: &str) -> BmiError {
        BmiError::backend(self.model(), format!("{} 获取{what}失败", self.model()))
    }

    fn c_name(&self, name: &str) -> BmiResult<CString> {
        CString::new(name)
            .map_err(|_| BmiError::backend(self.model(), format!("名称 '{name}' 含有空字符")))
    }

    fn check(&self, rc: c_int, what: &str) -> BmiResult<()> {
        if rc != BMI_SUCCESS {
            return Err(self.failed(what));
        }
        Ok(())
    }

    fn count(&self, value: c_int, what: &str) -> BmiResult<usize> {
        usize::try_from(value).map_err(|_| {
            BmiError::backend(self.model(), format!("{what} 返回了负值 {value}"))
        })
    }

    fn string_out(
        &self,
        f: unsafe extern "C" fn(Handle, *mut c_char) -> c_int,
        size: usize,
        what: &str,
    ) -> BmiResult<String> {
        let mut buffer = vec![0u8; size];
        let rc = unsafe { f(self.handle, buffer.as_mut_ptr().cast()) };
        self.check(rc, what)?;
        Ok(string_from_buffer(&buffer))
    }

    fn time(&self, f: unsafe extern "C" fn(Handle, *mut c_double) -> c_int, what: &str) -> BmiResult<f64> {
        let mut value = 0.0;
        self.check(unsafe { f(self.handle, &mut value) }, what)?;
        Ok(value)
    }

    fn var_int(
        &self,
        f: unsafe extern "C" fn(Handle, *const c_char, *mut c_int) -> c_int,
        name: &str,
        what: &str,
    ) -> BmiResult<c_int> {
        let c_name = self.c_name(name)?;
        let mut value: c_int = 0;
        let rc = unsafe { f(self.handle, c_name.as_ptr(), &mut value) };
        self.check(rc, &format!("变量 {name} 的{what}"))?;
        Ok(value)
    }

    fn var_string(
        &self,
        f: unsafe extern "C" fn(Handle, *const c_char, *mut c_char) -> c_int,
        name: &str,
        size: usize,
        what: &str,
    ) -> BmiResult<String> {
        let c_name = self.c_name(name)?;
        let mut buffer = vec![0u8; size];
        let rc = unsafe { f(self.handle, c_name.as_ptr(), buffer.as_mut_ptr().cast()) };
        self.check(rc, &format!("变量 {name} 的{what}"))?;
        Ok(string_from_buffer(&buffer))
    }

    fn grid_int(
        &self,
        f: unsafe extern "C" fn(Handle, *mut c_int, *mut c_int) -> c_int,
        grid: i32,
        what: &str,
    ) -> BmiResult<i32> {
        let mut grid = grid;
        let mut value: c_int = 0;
        let rc = unsafe { f(self.handle, &mut grid, &mut value) };
        self.check(rc, &format!("网格 {grid} 的{what}"))?;
        Ok(value)
    }

    fn grid_ints(
        &self,
        f: unsafe extern "C" fn(Handle, *mut c_int, *mut c_int) -> c_int,
        grid: i32,
        dest: &mut [i32],
        what: &str,
    ) -> BmiResult<()> {
        let mut grid = grid;
        let rc = unsafe { f(self.handle, &mut grid, dest.as_mut_ptr()) };
        self.check(rc, &format!("网格 {grid} 的{what}"))
    }

    fn grid_doubles(
        &self,
        f: unsafe extern "C" fn(Handle, *mut c_int, *mut c_double) -> c_int,
        grid: i32,
        dest: &mut [f64],
        what: &str,
    ) -> BmiResult<()> {
        let mut grid = grid;
        let rc = unsafe { f(self.handle, &mut grid, dest.as_mut_ptr()) };
        self.check(rc, &format!("网格 {grid} 的{what}"))
    }

    fn grid_count(
        &self,
        f: unsafe extern "C" fn(Handle, *mut c_int, *mut c_int) -> c_int,
        grid: i32,
        what: &str,
    ) -> BmiResult<usize> {
        let n = self.grid_int(f, grid, what)?;
        self.count(n, what)
    }

    fn var_names(
        &self,
        count: usize,
        f: unsafe extern "C" fn(Handle, *mut *mut c_char) -> c_int,
        what: &str,
    ) -> BmiResult<Vec<String>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let mut buffers = vec![vec![0u8; BMI_MAX_VAR_NAME]; count];
        let mut pointers: Vec<*mut c_char> =
            buffers.iter_mut().map(|b| b.as_mut_ptr().cast()).collect();
        self.check(unsafe { f(self.handle, pointers.as_mut_ptr()) }, what)?;
        Ok(buffers.iter().map(|b| string_from_buffer(b)).collect())
    }

    /// 依据变量声明的类型与大小选择取值/赋值代理
    fn proxy_value_type(&self, name: &str, direction: &str) -> BmiResult<ProxyValueType> {
        let var_type = self.get_var_type(name)?;
        let itemsize = self.get_var_itemsize(name)?;
        let native = self.native_type(&var_type, itemsize)?;
        match native {
            NativeType::Int => Ok(ProxyValueType::Int),
            NativeType::Float => Ok(ProxyValueType::Float),
            NativeType::Double => Ok(ProxyValueType::Double),
            other => Err(BmiError::backend(
                self.model(),
                format!(
                    "尝试 {direction} 变量 '{name}' 的值失败 ({}): Fortran 中间件不支持类型 {var_type} (映射为 {other})",
                    self.model()
                ),
            )),
        }
    }

    fn grid_array_len(&self, grid: i32) -> BmiResult<usize> {
        self.ready()?;
        self.grid_count(self.proxies.get_grid_size, grid, "网格大小")
    }

    fn nodes_per_face_total(&self, grid: i32) -> BmiResult<usize> {
        let faces = self.grid_count(self.proxies.get_grid_face_count, grid, "面数")?;
        let mut per_face = vec![0i32; faces];
        self.grid_ints(self.proxies.get_grid_nodes_per_face, grid, &mut per_face, "每面节点数")?;
        Ok(per_face.iter().map(|&n| n.max(0) as usize).sum())
    }
}

impl Bmi for FortranAdapter {
    fn initialize(&mut self, config_file: &Path) -> BmiResult<()> {
        self.base.reconcile_config(config_file)?;
        let model = self.base.model_name().to_string();
        let handle = self.handle;
        let proxies = self.proxies;
        self.base.initialize_with(|config| {
            let path = config.to_str().ok_or_else(|| {
                BmiError::config(&model, format!("配置路径不是有效 UTF-8: {}", config.display()))
            })?;
            let path = CString::new(path)
                .map_err(|_| BmiError::config(&model, "配置路径含有空字符"))?;
            if unsafe { (proxies.initialize)(handle, path.as_ptr()) } != BMI_SUCCESS {
                return Err(BmiError::external_state(
                    &model,
                    format!("初始化 {model} 失败 (配置 '{}')", config.display()),
                ));
            }
            let mut units = vec![0u8; BMI_MAX_UNITS_NAME];
            if unsafe { (proxies.get_time_units)(handle, units.as_mut_ptr().cast()) } != BMI_SUCCESS {
                return Err(BmiError::backend(&model, format!("{model} 无法读取时间单位")));
            }
            Ok(string_from_buffer(&units))
        })
    }

    fn update(&mut self) -> BmiResult<()> {
        self.ready()?;
        if unsafe { (self.proxies.update)(self.handle) } != BMI_SUCCESS {
            return Err(BmiError::external_state(
                self.model(),
                format!("{} 执行 update 失败", self.model()),
            ));
        }
        Ok(())
    }

    fn update_until(&mut self, time: f64) -> BmiResult<()> {
        self.ready()?;
        let mut then = time;
        if unsafe { (self.proxies.update_until)(self.handle, &mut then) } != BMI_SUCCESS {
            return Err(BmiError::external_state(
                self.model(),
                format!("{} 执行 update_until({time}) 失败", self.model()),
            ));
        }
        Ok(())
    }

    fn finalize(&mut self) -> BmiResult<()> {
        let model = self.base.model_name().to_string();
        let handle = self.handle;
        let finalize = self.proxies.finalize;
        let result = self.base.finalize_with(|| {
            if unsafe { finalize(handle) } != BMI_SUCCESS {
                return Err(BmiError::external_state(&model, format!("{model} 执行 finalize 失败")));
            }
            Ok(())
        });
        if let Some(library) = self.library.as_mut() {
            library.close();
        }
        result
    }

    fn get_component_name(&self) -> BmiResult<String> {
        self.ready()?;
        self.base.cached_component_name(|| {
            self.string_out(self.proxies.get_component_name, BMI_MAX_COMPONENT_NAME, "组件名")
        })
    }

    fn get_input_item_count(&self) -> BmiResult<usize> {
        self.ready()?;
        self.base.cached_input_item_count(|| {
            let mut n: c_int = 0;
            self.check(unsafe { (self.proxies.get_input_item_count)(self.handle, &mut n) }, "输入变量数")?;
            self.count(n, "get_input_item_count")
        })
    }

    fn get_output_item_count(&self) -> BmiResult<usize> {
        self.ready()?;
        self.base.cached_output_item_count(|| {
            let mut n: c_int = 0;
            self.check(unsafe { (self.proxies.get_output_item_count)(self.handle, &mut n) }, "输出变量数")?;
            self.count(n, "get_output_item_count")
        })
    }

    fn get_input_var_names(&self) -> BmiResult<Vec<String>> {
        self.ready()?;
        self.base.cached_input_var_names(|| {
            let count = self.get_input_item_count()?;
            self.var_names(count, self.proxies.get_input_var_names, "输入变量名")
        })
    }

    fn get_output_var_names(&self) -> BmiResult<Vec<String>> {
        self.ready()?;
        self.base.cached_output_var_names(|| {
            let count = self.get_output_item_count()?;
            self.var_names(count, self.proxies.get_output_var_names, "输出变量名")
        })
    }

    fn get_var_grid(&self, name: &str) -> BmiResult<i32> {
        self.ready()?;
        self.var_int(self.proxies.get_var_grid, name, "网格")
    }

    fn get_var_type(&self, name: &str) -> BmiResult<String> {
        self.ready()?;
        self.var_string(self.proxies.get_var_type, name, BMI_MAX_TYPE_NAME, "类型")
    }

    fn get_var_units(&self, name: &str) -> BmiResult<String> {
        self.ready()?;
        self.var_string(self.proxies.get_var_units, name, BMI_MAX_UNITS_NAME, "单位")
    }

    fn get_var_itemsize(&self, name: &str) -> BmiResult<usize> {
        self.ready()?;
        let n = self.var_int(self.proxies.get_var_itemsize, name, "元素大小")?;
        self.count(n, "get_var_itemsize")
    }

    fn get_var_nbytes(&self, name: &str) -> BmiResult<usize> {
        self.ready()?;
        let n = self.var_int(self.proxies.get_var_nbytes, name, "总字节数")?;
        self.count(n, "get_var_nbytes")
    }

    fn get_var_location(&self, name: &str) -> BmiResult<String> {
        self.ready()?;
        self.var_string(self.proxies.get_var_location, name, BMI_MAX_LOCATION_NAME, "位置")
    }

    fn get_current_time(&self) -> BmiResult<f64> {
        self.ready()?;
        self.time(self.proxies.get_current_time, "当前时间")
    }

    fn get_start_time(&self) -> BmiResult<f64> {
        self.ready()?;
        self.time(self.proxies.get_start_time, "开始时间")
    }

    fn get_end_time(&self) -> BmiResult<f64> {
        self.ready()?;
        self.time(self.proxies.get_end_time, "结束时间")
    }

    fn get_time_units(&self) -> BmiResult<String> {
        self.ready()?;
        self.string_out(self.proxies.get_time_units, BMI_MAX_UNITS_NAME, "时间单位")
    }

    fn get_time_step(&self) -> BmiResult<f64> {
        self.ready()?;
        self.base
            .cached_time_step(|| self.time(self.proxies.get_time_step, "时间步长"))
    }

    fn get_value(&self, name: &str, dest: &mut [u8]) -> BmiResult<()> {
        self.ready()?;
        let nbytes = self.get_var_nbytes(name)?;
        check_buffer_len(self.model(), name, nbytes, dest.len())?;
        let c_name = self.c_name(name)?;
        let ptr = dest.as_mut_ptr();
        let rc = match self.proxy_value_type(name, "GET")? {
            ProxyValueType::Int => unsafe {
                (self.proxies.get_value_int)(self.handle, c_name.as_ptr(), ptr.cast())
            },
            ProxyValueType::Float => unsafe {
                (self.proxies.get_value_float)(self.handle, c_name.as_ptr(), ptr.cast())
            },
            ProxyValueType::Double => unsafe {
                (self.proxies.get_value_double)(self.handle, c_name.as_ptr(), ptr.cast())
            },
        };
        self.check(rc, &format!("变量 {name} 的值"))
    }

    fn get_value_ptr(&mut self, _name: &str) -> BmiResult<*mut c_void> {
        Err(BmiError::unsupported(self.model(), "get_value_ptr (Fortran 模型无法提供取值指针)"))
    }

    fn get_value_at_indices(&self, _name: &str, _dest: &mut [u8], _inds: &[i32]) -> BmiResult<()> {
        self.ready()?;
        Err(BmiError::unsupported(self.model(), "get_value_at_indices (Fortran 模型不支持按索引取值)"))
    }

    fn set_value(&mut self, name: &str, src: &[u8]) -> BmiResult<()> {
        self.ready()?;
        let nbytes = self.get_var_nbytes(name)?;
        check_buffer_len(self.model(), name, nbytes, src.len())?;
        let c_name = self.c_name(name)?;
        // 代理签名要求可变指针
        let mut scratch = src[..nbytes].to_vec();
        let ptr = scratch.as_mut_ptr();
        let rc = match self.proxy_value_type(name, "SET")? {
            ProxyValueType::Int => unsafe {
                (self.proxies.set_value_int)(self.handle, c_name.as_ptr(), ptr.cast())
            },
            ProxyValueType::Float => unsafe {
                (self.proxies.set_value_float)(self.handle, c_name.as_ptr(), ptr.cast())
            },
            ProxyValueType::Double => unsafe {
                (self.proxies.set_value_double)(self.handle, c_name.as_ptr(), ptr.cast())
            },
        };
        if rc != BMI_SUCCESS {
            return Err(BmiError::backend(
                self.model(),
                format!("{} 设置变量 {name} 的值失败", self.model()),
            ));
        }
        Ok(())
    }

    fn set_value_at_indices(&mut self, _name: &str, _inds: &[i32], _src: &[u8]) -> BmiResult<()> {
        self.ready()?;
        Err(BmiError::unsupported(self.model(), "set_value_at_indices (Fortran 模型不支持按索引赋值)"))
    }

    fn get_grid_rank(&self, grid: i32) -> BmiResult<i32> {
        self.ready()?;
        self.grid_int(self.proxies.get_grid_rank, grid, "秩")
    }

    fn get_grid_size(&self, grid: i32) -> BmiResult<i32> {
        self.ready()?;
        self.grid_int(self.proxies.get_grid_size, grid, "大小")
    }

    fn get_grid_type(&self, grid: i32) -> BmiResult<String> {
        self.ready()?;
        let mut grid_id = grid;
        let mut buffer = vec![0u8; BMI_MAX_TYPE_NAME];
        let rc = unsafe { (self.proxies.get_grid_type)(self.handle, &mut grid_id, buffer.as_mut_ptr().cast()) };
        self.check(rc, &format!("网格 {grid} 的类型"))?;
        Ok(string_from_buffer(&buffer))
    }

    fn get_grid_shape(&self, grid: i32, shape: &mut [i32]) -> BmiResult<()> {
        let rank = self.get_grid_rank(grid)?;
        if fill_degenerate_grid(rank, shape) {
            return Ok(());
        }
        check_grid_len(self.model(), "shape", grid, rank as usize, shape.len())?;
        self.grid_ints(self.proxies.get_grid_shape, grid, shape, "形状")
    }

    fn get_grid_spacing(&self, grid: i32, spacing: &mut [f64]) -> BmiResult<()> {
        let rank = self.get_grid_rank(grid)?;
        if fill_degenerate_grid(rank, spacing) {
            return Ok(());
        }
        check_grid_len(self.model(), "spacing", grid, rank as usize, spacing.len())?;
        self.grid_doubles(self.proxies.get_grid_spacing, grid, spacing, "间距")
    }

    fn get_grid_origin(&self, grid: i32, origin: &mut [f64]) -> BmiResult<()> {
        let rank = self.get_grid_rank(grid)?;
        if fill_degenerate_grid(rank, origin) {
            return Ok(());
        }
        check_grid_len(self.model(), "origin", grid, rank as usize, origin.len())?;
        self.grid_doubles(self.proxies.get_grid_origin, grid, origin, "原点")
    }

    fn get_grid_x(&self, grid: i32, x: &mut [f64]) -> BmiResult<()> {
        let required = self.grid_array_len(grid)?;
        check_grid_len(self.model(), "x", grid, required, x.len())?;
        self.grid_doubles(self.proxies.get_grid_x, grid, x, " x 坐标")
    }

    fn get_grid_y(&self, grid: i32, y: &mut [f64]) -> BmiResult<()> {
        let required = self.grid_array_len(grid)?;
        check_grid_len(self.model(), "y", grid, required, y.len())?;
        self.grid_doubles(self.proxies.get_grid_y, grid, y, " y 坐标")
    }

    fn get_grid_z(&self, grid: i32, z: &mut [f64]) -> BmiResult<()> {
        let required = self.grid_array_len(grid)?;
        check_grid_len(self.model(), "z", grid, required, z.len())?;
        self.grid_doubles(self.proxies.get_grid_z, grid, z, " z 坐标")
    }

    fn get_grid_node_count(&self, grid: i32) -> BmiResult<i32> {
        self.ready()?;
        self.grid_int(self.proxies.get_grid_node_count, grid, "节点数")
    }

    fn get_grid_edge_count(&self, grid: i32) -> BmiResult<i32> {
        self.ready()?;
        self.grid_int(self.proxies.get_grid_edge_count, grid, "边数")
    }

    fn get_grid_face_count(&self, grid: i32) -> BmiResult<i32> {
        self.ready()?;
        self.grid_int(self.proxies.get_grid_face_count, grid, "面数")
    }

    fn get_grid_edge_nodes(&self, grid: i32, edge_nodes: &mut [i32]) -> BmiResult<()> {
        self.ready()?;
        let edges = self.grid_count(self.proxies.get_grid_edge_count, grid, "边数")?;
        check_grid_len(self.model(), "edge_nodes", grid, 2 * edges, edge_nodes.len())?;
        self.grid_ints(self.proxies.get_grid_edge_nodes, grid, edge_nodes, "边节点")
    }

    fn get_grid_face_edges(&self, grid: i32, face_edges: &mut [i32]) -> BmiResult<()> {
        self.ready()?;
        let required = self.nodes_per_face_total(grid)?;
        check_grid_len(self.model(), "face_edges", grid, required, face_edges.len())?;
        self.grid_ints(self.proxies.get_grid_face_edges, grid, face_edges, "面边")
    }

    fn get_grid_face_nodes(&self, grid: i32, face_nodes: &mut [i32]) -> BmiResult<()> {
        self.ready()?;
        let required = self.nodes_per_face_total(grid)?;
        check_grid_len(self.model(), "face_nodes", grid, required, face_nodes.len())?;
        self.grid_ints(self.proxies.get_grid_face_nodes, grid, face_nodes, "面节点")
    }

    fn get_grid_nodes_per_face(&self, grid: i32, nodes_per_face: &mut [i32]) -> BmiResult<()> {
        self.ready()?;
        let faces = self.grid_count(self.proxies.get_grid_face_count, grid, "面数")?;
        check_grid_len(self.model(), "nodes_per_face", grid, faces, nodes_per_face.len())?;
        self.grid_ints(self.proxies.get_grid_nodes_per_face, grid, nodes_per_face, "每面节点数")
    }
}

impl BmiAdapter for FortranAdapter {
    fn base(&self) -> &AdapterBase {
        &self.base
    }

    fn backend_kind(&self) -> BackendKind {
        BackendKind::Fortran
    }
}

impl Drop for FortranAdapter {
    fn drop(&mut self) {
        if let Err(e) = Bmi::finalize(self) {
            warn!(model = %self.base.model_name(), error = %e, "释放 Fortran 模型失败");
        }
    }
}
