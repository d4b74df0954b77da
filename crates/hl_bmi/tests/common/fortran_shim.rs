// hydrolink\crates\hl_bmi\tests/common/fortran_shim.rs

//! 以 ISO-C-binding 代理函数表暴露 [`TestModel`]
//!
//! 类型名按 Fortran 习惯报告（`double precision`、`real`、`integer`）。

use super::{
    c_name, count, grid_array_len, put, put_names, put_str, status, GridArray, TestModel,
};
use hl_bmi::c_ffi::{BMI_FAILURE, BMI_SUCCESS};
use hl_bmi::fortran::FortranProxies;
use hl_bmi::{Bmi, BmiResult};
use std::ffi::{c_char, c_double, c_float, c_int, c_void};
use std::path::Path;
use std::slice;

type Handle = *mut c_void;

unsafe fn model<'a>(handle: Handle) -> &'a mut TestModel {
    &mut *handle.cast::<TestModel>()
}

/// 注册：分配模型并写出句柄
///
/// 句柄随测试进程结束回收。
pub unsafe extern "C" fn register_test_handle(handle: *mut Handle) -> c_int {
    *handle = Box::into_raw(Box::new(TestModel::default())).cast();
    BMI_SUCCESS
}

/// 报告成功但不写出句柄
pub unsafe extern "C" fn register_null_handle(_handle: *mut Handle) -> c_int {
    BMI_SUCCESS
}

pub fn test_proxies() -> FortranProxies {
    FortranProxies {
        initialize,
        update,
        update_until,
        finalize,
        get_component_name,
        get_input_item_count,
        get_output_item_count,
        get_input_var_names,
        get_output_var_names,
        get_var_grid,
        get_var_type,
        get_var_units,
        get_var_itemsize,
        get_var_nbytes,
        get_var_location,
        get_current_time,
        get_start_time,
        get_end_time,
        get_time_units,
        get_time_step,
        get_value_int,
        get_value_float,
        get_value_double,
        set_value_int,
        set_value_float,
        set_value_double,
        get_grid_rank,
        get_grid_size,
        get_grid_type,
        get_grid_shape,
        get_grid_spacing,
        get_grid_origin,
        get_grid_x,
        get_grid_y,
        get_grid_z,
        get_grid_node_count,
        get_grid_edge_count,
        get_grid_face_count,
        get_grid_edge_nodes,
        get_grid_face_edges,
        get_grid_face_nodes,
        get_grid_nodes_per_face,
    }
}

fn fortran_type(t: BmiResult<String>) -> BmiResult<String> {
    t.map(|t| match t.as_str() {
        "double" => "double precision".to_string(),
        "float" => "real".to_string(),
        "int" => "integer".to_string(),
        _ => t,
    })
}

unsafe extern "C" fn initialize(h: Handle, config: *const c_char) -> c_int {
    status(model(h).initialize(Path::new(c_name(config))))
}

unsafe extern "C" fn update(h: Handle) -> c_int {
    status(model(h).update())
}

unsafe extern "C" fn update_until(h: Handle, time: *mut c_double) -> c_int {
    status(model(h).update_until(*time))
}

unsafe extern "C" fn finalize(h: Handle) -> c_int {
    status(model(h).finalize())
}

unsafe extern "C" fn get_component_name(h: Handle, dest: *mut c_char) -> c_int {
    put_str(dest, model(h).get_component_name())
}

unsafe extern "C" fn get_input_item_count(h: Handle, dest: *mut c_int) -> c_int {
    put(dest, count(model(h).get_input_item_count()))
}

unsafe extern "C" fn get_output_item_count(h: Handle, dest: *mut c_int) -> c_int {
    put(dest, count(model(h).get_output_item_count()))
}

unsafe extern "C" fn get_input_var_names(h: Handle, dest: *mut *mut c_char) -> c_int {
    put_names(dest, model(h).get_input_var_names())
}

unsafe extern "C" fn get_output_var_names(h: Handle, dest: *mut *mut c_char) -> c_int {
    put_names(dest, model(h).get_output_var_names())
}

unsafe extern "C" fn get_var_grid(h: Handle, name: *const c_char, dest: *mut c_int) -> c_int {
    put(dest, model(h).get_var_grid(c_name(name)))
}

unsafe extern "C" fn get_var_type(h: Handle, name: *const c_char, dest: *mut c_char) -> c_int {
    put_str(dest, fortran_type(model(h).get_var_type(c_name(name))))
}

unsafe extern "C" fn get_var_units(h: Handle, name: *const c_char, dest: *mut c_char) -> c_int {
    put_str(dest, model(h).get_var_units(c_name(name)))
}

unsafe extern "C" fn get_var_itemsize(h: Handle, name: *const c_char, dest: *mut c_int) -> c_int {
    put(dest, count(model(h).get_var_itemsize(c_name(name))))
}

unsafe extern "C" fn get_var_nbytes(h: Handle, name: *const c_char, dest: *mut c_int) -> c_int {
    put(dest, count(model(h).get_var_nbytes(c_name(name))))
}

unsafe extern "C" fn get_var_location(h: Handle, name: *const c_char, dest: *mut c_char) -> c_int {
    put_str(dest, model(h).get_var_location(c_name(name)))
}

unsafe extern "C" fn get_current_time(h: Handle, dest: *mut c_double) -> c_int {
    put(dest, model(h).get_current_time())
}

unsafe extern "C" fn get_start_time(h: Handle, dest: *mut c_double) -> c_int {
    put(dest, model(h).get_start_time())
}

unsafe extern "C" fn get_end_time(h: Handle, dest: *mut c_double) -> c_int {
    put(dest, model(h).get_end_time())
}

unsafe extern "C" fn get_time_units(h: Handle, dest: *mut c_char) -> c_int {
    put_str(dest, model(h).get_time_units())
}

unsafe extern "C" fn get_time_step(h: Handle, dest: *mut c_double) -> c_int {
    put(dest, model(h).get_time_step())
}

unsafe fn get_bytes(h: Handle, name: *const c_char, dest: *mut u8) -> c_int {
    let m = model(h);
    let name = c_name(name);
    match m.get_var_nbytes(name) {
        Ok(n) => status(m.get_value(name, slice::from_raw_parts_mut(dest, n))),
        Err(_) => BMI_FAILURE,
    }
}

unsafe fn set_bytes(h: Handle, name: *const c_char, src: *const u8) -> c_int {
    let m = model(h);
    let name = c_name(name);
    match m.get_var_nbytes(name) {
        Ok(n) => status(m.set_value(name, slice::from_raw_parts(src, n))),
        Err(_) => BMI_FAILURE,
    }
}

unsafe extern "C" fn get_value_int(h: Handle, name: *const c_char, dest: *mut c_int) -> c_int {
    get_bytes(h, name, dest.cast())
}

unsafe extern "C" fn get_value_float(h: Handle, name: *const c_char, dest: *mut c_float) -> c_int {
    get_bytes(h, name, dest.cast())
}

unsafe extern "C" fn get_value_double(h: Handle, name: *const c_char, dest: *mut c_double) -> c_int {
    get_bytes(h, name, dest.cast())
}

unsafe extern "C" fn set_value_int(h: Handle, name: *const c_char, src: *mut c_int) -> c_int {
    set_bytes(h, name, src.cast())
}

unsafe extern "C" fn set_value_float(h: Handle, name: *const c_char, src: *mut c_float) -> c_int {
    set_bytes(h, name, src.cast())
}

unsafe extern "C" fn set_value_double(h: Handle, name: *const c_char, src: *mut c_double) -> c_int {
    set_bytes(h, name, src.cast())
}

unsafe extern "C" fn get_grid_rank(h: Handle, grid: *mut c_int, dest: *mut c_int) -> c_int {
    put(dest, model(h).get_grid_rank(*grid))
}

unsafe extern "C" fn get_grid_size(h: Handle, grid: *mut c_int, dest: *mut c_int) -> c_int {
    put(dest, model(h).get_grid_size(*grid))
}

unsafe extern "C" fn get_grid_type(h: Handle, grid: *mut c_int, dest: *mut c_char) -> c_int {
    put_str(dest, model(h).get_grid_type(*grid))
}

unsafe extern "C" fn get_grid_node_count(h: Handle, grid: *mut c_int, dest: *mut c_int) -> c_int {
    put(dest, model(h).get_grid_node_count(*grid))
}

unsafe extern "C" fn get_grid_edge_count(h: Handle, grid: *mut c_int, dest: *mut c_int) -> c_int {
    put(dest, model(h).get_grid_edge_count(*grid))
}

unsafe extern "C" fn get_grid_face_count(h: Handle, grid: *mut c_int, dest: *mut c_int) -> c_int {
    put(dest, model(h).get_grid_face_count(*grid))
}

macro_rules! grid_array {
    ($name:ident, $ty:ty, $array:expr) => {
        unsafe extern "C" fn $name(h: Handle, grid: *mut c_int, dest: *mut $ty) -> c_int {
            let m = model(h);
            let len = grid_array_len(m, *grid, $array);
            status(m.$name(*grid, slice::from_raw_parts_mut(dest, len)))
        }
    };
}

grid_array!(get_grid_shape, c_int, GridArray::Rank);
grid_array!(get_grid_spacing, c_double, GridArray::Rank);
grid_array!(get_grid_origin, c_double, GridArray::Rank);
grid_array!(get_grid_x, c_double, GridArray::Nodes);
grid_array!(get_grid_y, c_double, GridArray::Nodes);
grid_array!(get_grid_z, c_double, GridArray::Nodes);
grid_array!(get_grid_edge_nodes, c_int, GridArray::EdgeNodes);
grid_array!(get_grid_face_edges, c_int, GridArray::FaceNodes);
grid_array!(get_grid_face_nodes, c_int, GridArray::FaceNodes);
grid_array!(get_grid_nodes_per_face, c_int, GridArray::Faces);
