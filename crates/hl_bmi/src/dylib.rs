// hydrolink\crates\hl_bmi\src/dylib.rs

//! 动态库绑定
//!
//! C、C++、Fortran 后端共用的动态库加载与符号解析。句柄归打开它的适配器独占，
//! 必须在后端模型自身的 finalize（或销毁函数）执行完毕之后才关闭。

use crate::error::{BmiError, BmiResult};
use hl_foundation::fs::file_is_readable;
use libloading::Library;
use std::env::consts::DLL_EXTENSION;
use std::ffi::{c_void, OsString};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 解析实际可读的动态库路径
///
/// 配置路径不可读时尝试一次平台相关的替换：`.so` 与 `.dylib` 互换，
/// 其他扩展名则追加当前平台的动态库扩展名。
pub fn resolve_library_path(path: &Path) -> Option<PathBuf> {
    if file_is_readable(path) {
        return Some(path.to_path_buf());
    }
    let alternate = match path.extension().and_then(|e| e.to_str()) {
        Some("so") => path.with_extension("dylib"),
        Some("dylib") => path.with_extension("so"),
        _ => {
            let mut raw: OsString = path.as_os_str().to_owned();
            raw.push(".");
            raw.push(DLL_EXTENSION);
            PathBuf::from(raw)
        }
    };
    file_is_readable(&alternate).then_some(alternate)
}

/// 动态库句柄
#[derive(Debug)]
pub struct DynamicLibrary {
    model_name: String,
    configured_path: PathBuf,
    loaded_path: Option<PathBuf>,
    library: Option<Library>,
}

impl DynamicLibrary {
    /// 创建未加载的句柄
    pub fn new(model_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            model_name: model_name.into(),
            configured_path: path.into(),
            loaded_path: None,
            library: None,
        }
    }

    /// 配置中给出的库路径
    pub fn configured_path(&self) -> &Path {
        &self.configured_path
    }

    /// 实际加载的库路径
    pub fn loaded_path(&self) -> Option<&Path> {
        self.loaded_path.as_deref()
    }

    /// 是否已打开
    pub fn is_loaded(&self) -> bool {
        self.library.is_some()
    }

    /// 打开动态库
    ///
    /// # 参数
    /// - `entry_symbol`: 随后要解析的注册/创建函数名，不能为空
    ///
    /// 已打开时记录警告并直接返回，不会重复加载。
    pub fn load(&mut self, entry_symbol: &str) -> BmiResult<()> {
        if entry_symbol.is_empty() {
            return Err(BmiError::config(
                &self.model_name,
                format!("无法初始化 {}: 未给出动态库的注册函数名", self.model_name),
            ));
        }
        if self.configured_path.as_os_str().is_empty() {
            return Err(BmiError::config(
                &self.model_name,
                format!("无法初始化 {}: 未给出动态库文件", self.model_name),
            ));
        }
        if self.library.is_some() {
            warn!(model = %self.model_name, "动态库已加载，忽略重复加载请求");
            return Ok(());
        }

        let path = resolve_library_path(&self.configured_path).ok_or_else(|| {
            BmiError::binding(
                &self.model_name,
                format!(
                    "无法初始化 {}: 动态库文件 '{}' 不可读",
                    self.model_name,
                    self.configured_path.display()
                ),
            )
        })?;

        // SAFETY: 库的初始化例程由模型作者提供，调用方须信任该库
        let library = unsafe { Library::new(&path) }.map_err(|e| {
            BmiError::binding(
                &self.model_name,
                format!("无法打开动态库 '{}': {e}", path.display()),
            )
        })?;

        debug!(model = %self.model_name, path = %path.display(), "已加载动态库");
        self.library = Some(library);
        self.loaded_path = Some(path);
        Ok(())
    }

    /// 解析符号地址
    ///
    /// 找不到符号时失败；若 `is_null_valid` 为真，加载器未报错的空地址被视为合法结果。
    pub fn symbol_address(&self, name: &str, is_null_valid: bool) -> BmiResult<*mut c_void> {
        let library = self.require_loaded(name)?;
        let symbol = symbol_name(name);
        // SAFETY: 以裸指针类型读取符号地址，不做调用
        let address = unsafe { library.get::<*mut c_void>(&symbol) }
            .map(|s| *s)
            .map_err(|e| self.unresolved(name, &e.to_string()))?;
        if address.is_null() && !is_null_valid {
            return Err(self.unresolved(name, "符号地址为空"));
        }
        Ok(address)
    }

    /// 解析函数符号
    ///
    /// # Safety
    ///
    /// `F` 必须是与库中该函数签名一致的 `extern "C"` 函数指针类型。
    pub unsafe fn function<F: Copy>(&self, name: &str) -> BmiResult<F> {
        let library = self.require_loaded(name)?;
        let symbol = symbol_name(name);
        library
            .get::<F>(&symbol)
            .map(|s| *s)
            .map_err(|e| self.unresolved(name, &e.to_string()))
    }

    /// 关闭句柄，未打开时为空操作
    pub fn close(&mut self) {
        if let Some(library) = self.library.take() {
            if let Err(e) = library.close() {
                warn!(model = %self.model_name, error = %e, "关闭动态库失败");
            } else {
                debug!(model = %self.model_name, "已关闭动态库");
            }
        }
    }

    fn require_loaded(&self, name: &str) -> BmiResult<&Library> {
        self.library.as_ref().ok_or_else(|| {
            BmiError::binding(
                &self.model_name,
                format!("动态库未打开，无法解析符号 '{name}'"),
            )
        })
    }

    fn unresolved(&self, name: &str, diagnostic: &str) -> BmiError {
        BmiError::binding(
            &self.model_name,
            format!(
                "无法在 '{}' 中解析符号 '{name}': {diagnostic}",
                self.loaded_path
                    .as_deref()
                    .unwrap_or(&self.configured_path)
                    .display()
            ),
        )
    }
}

impl Drop for DynamicLibrary {
    fn drop(&mut self) {
        self.close();
    }
}

fn symbol_name(name: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(name.len() + 1);
    bytes.extend_from_slice(name.as_bytes());
    bytes.push(0);
    bytes
}
