// hydrolink\crates\hl_bmi\tests/common/c_shim.rs

//! 以 `bmi.h` 函数指针结构体暴露 [`TestModel`]

use super::{
    c_name, count, grid_array_len, put, put_names, put_str, status, GridArray, TestModel,
};
use hl_bmi::c_ffi::{CBmi, BMI_FAILURE};
use hl_bmi::Bmi;
use std::cell::Cell;
use std::ffi::{c_char, c_double, c_int, c_void};
use std::path::Path;
use std::slice;

thread_local! {
    /// 当前线程上组件名与变量个数函数被调用的次数
    pub static METADATA_CALLS: Cell<usize> = const { Cell::new(0) };
}

fn record_metadata_call() {
    METADATA_CALLS.with(|n| n.set(n.get() + 1));
}

unsafe fn model<'a>(bmi: *mut CBmi) -> &'a mut TestModel {
    &mut *(*bmi).data.cast::<TestModel>()
}

/// 完整注册
pub unsafe extern "C" fn register_test_model(bmi: *mut CBmi) -> *mut CBmi {
    let t = &mut *bmi;
    t.data = Box::into_raw(Box::new(TestModel::default())).cast();
    t.initialize = Some(initialize);
    t.update = Some(update);
    t.update_until = Some(update_until);
    t.finalize = Some(finalize);
    t.get_component_name = Some(get_component_name);
    t.get_input_item_count = Some(get_input_item_count);
    t.get_output_item_count = Some(get_output_item_count);
    t.get_input_var_names = Some(get_input_var_names);
    t.get_output_var_names = Some(get_output_var_names);
    t.get_var_grid = Some(get_var_grid);
    t.get_var_type = Some(get_var_type);
    t.get_var_units = Some(get_var_units);
    t.get_var_itemsize = Some(get_var_itemsize);
    t.get_var_nbytes = Some(get_var_nbytes);
    t.get_var_location = Some(get_var_location);
    t.get_current_time = Some(get_current_time);
    t.get_start_time = Some(get_start_time);
    t.get_end_time = Some(get_end_time);
    t.get_time_units = Some(get_time_units);
    t.get_time_step = Some(get_time_step);
    t.get_value = Some(get_value);
    t.get_value_ptr = Some(get_value_ptr);
    t.get_value_at_indices = Some(get_value_at_indices);
    t.set_value = Some(set_value);
    t.set_value_at_indices = Some(set_value_at_indices);
    t.get_grid_rank = Some(get_grid_rank);
    t.get_grid_size = Some(get_grid_size);
    t.get_grid_type = Some(get_grid_type);
    t.get_grid_shape = Some(get_grid_shape);
    t.get_grid_spacing = Some(get_grid_spacing);
    t.get_grid_origin = Some(get_grid_origin);
    t.get_grid_x = Some(get_grid_x);
    t.get_grid_y = Some(get_grid_y);
    t.get_grid_z = Some(get_grid_z);
    t.get_grid_node_count = Some(get_grid_node_count);
    t.get_grid_edge_count = Some(get_grid_edge_count);
    t.get_grid_face_count = Some(get_grid_face_count);
    t.get_grid_edge_nodes = Some(get_grid_edge_nodes);
    t.get_grid_face_edges = Some(get_grid_face_edges);
    t.get_grid_face_nodes = Some(get_grid_face_nodes);
    t.get_grid_nodes_per_face = Some(get_grid_nodes_per_face);
    bmi
}

/// 缺少 `update` 的注册
pub unsafe extern "C" fn register_without_update(bmi: *mut CBmi) -> *mut CBmi {
    let bmi = register_test_model(bmi);
    (*bmi).update = None;
    bmi
}

unsafe extern "C" fn initialize(bmi: *mut CBmi, config: *const c_char) -> c_int {
    status(model(bmi).initialize(Path::new(c_name(config))))
}

unsafe extern "C" fn update(bmi: *mut CBmi) -> c_int {
    status(model(bmi).update())
}

unsafe extern "C" fn update_until(bmi: *mut CBmi, time: c_double) -> c_int {
    status(model(bmi).update_until(time))
}

unsafe extern "C" fn finalize(bmi: *mut CBmi) -> c_int {
    if (*bmi).data.is_null() {
        return BMI_FAILURE;
    }
    let result = model(bmi).finalize();
    drop(Box::from_raw((*bmi).data.cast::<TestModel>()));
    (*bmi).data = std::ptr::null_mut();
    status(result)
}

unsafe extern "C" fn get_component_name(bmi: *mut CBmi, dest: *mut c_char) -> c_int {
    record_metadata_call();
    put_str(dest, model(bmi).get_component_name())
}

unsafe extern "C" fn get_input_item_count(bmi: *mut CBmi, dest: *mut c_int) -> c_int {
    record_metadata_call();
    put(dest, count(model(bmi).get_input_item_count()))
}

unsafe extern "C" fn get_output_item_count(bmi: *mut CBmi, dest: *mut c_int) -> c_int {
    record_metadata_call();
    put(dest, count(model(bmi).get_output_item_count()))
}

unsafe extern "C" fn get_input_var_names(bmi: *mut CBmi, dest: *mut *mut c_char) -> c_int {
    put_names(dest, model(bmi).get_input_var_names())
}

unsafe extern "C" fn get_output_var_names(bmi: *mut CBmi, dest: *mut *mut c_char) -> c_int {
    put_names(dest, model(bmi).get_output_var_names())
}

unsafe extern "C" fn get_var_grid(bmi: *mut CBmi, name: *const c_char, dest: *mut c_int) -> c_int {
    put(dest, model(bmi).get_var_grid(c_name(name)))
}

unsafe extern "C" fn get_var_type(bmi: *mut CBmi, name: *const c_char, dest: *mut c_char) -> c_int {
    put_str(dest, model(bmi).get_var_type(c_name(name)))
}

unsafe extern "C" fn get_var_units(bmi: *mut CBmi, name: *const c_char, dest: *mut c_char) -> c_int {
    put_str(dest, model(bmi).get_var_units(c_name(name)))
}

unsafe extern "C" fn get_var_itemsize(bmi: *mut CBmi, name: *const c_char, dest: *mut c_int) -> c_int {
    put(dest, count(model(bmi).get_var_itemsize(c_name(name))))
}

unsafe extern "C" fn get_var_nbytes(bmi: *mut CBmi, name: *const c_char, dest: *mut c_int) -> c_int {
    put(dest, count(model(bmi).get_var_nbytes(c_name(name))))
}

unsafe extern "C" fn get_var_location(bmi: *mut CBmi, name: *const c_char, dest: *mut c_char) -> c_int {
    put_str(dest, model(bmi).get_var_location(c_name(name)))
}

unsafe extern "C" fn get_current_time(bmi: *mut CBmi, dest: *mut c_double) -> c_int {
    put(dest, model(bmi).get_current_time())
}

unsafe extern "C" fn get_start_time(bmi: *mut CBmi, dest: *mut c_double) -> c_int {
    put(dest, model(bmi).get_start_time())
}

unsafe extern "C" fn get_end_time(bmi: *mut CBmi, dest: *mut c_double) -> c_int {
    put(dest, model(bmi).get_end_time())
}

unsafe extern "C" fn get_time_units(bmi: *mut CBmi, dest: *mut c_char) -> c_int {
    put_str(dest, model(bmi).get_time_units())
}

unsafe extern "C" fn get_time_step(bmi: *mut CBmi, dest: *mut c_double) -> c_int {
    put(dest, model(bmi).get_time_step())
}

unsafe extern "C" fn get_value(bmi: *mut CBmi, name: *const c_char, dest: *mut c_void) -> c_int {
    let m = model(bmi);
    let name = c_name(name);
    let Ok(nbytes) = m.get_var_nbytes(name) else {
        return BMI_FAILURE;
    };
    status(m.get_value(name, slice::from_raw_parts_mut(dest.cast::<u8>(), nbytes)))
}

unsafe extern "C" fn get_value_ptr(bmi: *mut CBmi, name: *const c_char, dest: *mut *mut c_void) -> c_int {
    put(dest, model(bmi).get_value_ptr(c_name(name)))
}

unsafe extern "C" fn get_value_at_indices(
    bmi: *mut CBmi,
    name: *const c_char,
    dest: *mut c_void,
    inds: *mut c_int,
    len: c_int,
) -> c_int {
    let m = model(bmi);
    let name = c_name(name);
    let Ok(size) = m.get_var_itemsize(name) else {
        return BMI_FAILURE;
    };
    let len = len as usize;
    let dest = slice::from_raw_parts_mut(dest.cast::<u8>(), size * len);
    status(m.get_value_at_indices(name, dest, slice::from_raw_parts(inds, len)))
}

unsafe extern "C" fn set_value(bmi: *mut CBmi, name: *const c_char, src: *mut c_void) -> c_int {
    let m = model(bmi);
    let name = c_name(name);
    let Ok(nbytes) = m.get_var_nbytes(name) else {
        return BMI_FAILURE;
    };
    status(m.set_value(name, slice::from_raw_parts(src.cast::<u8>(), nbytes)))
}

unsafe extern "C" fn set_value_at_indices(
    bmi: *mut CBmi,
    name: *const c_char,
    inds: *mut c_int,
    len: c_int,
    src: *mut c_void,
) -> c_int {
    let m = model(bmi);
    let name = c_name(name);
    let Ok(size) = m.get_var_itemsize(name) else {
        return BMI_FAILURE;
    };
    let len = len as usize;
    let src = slice::from_raw_parts(src.cast::<u8>(), size * len);
    status(m.set_value_at_indices(name, slice::from_raw_parts(inds, len), src))
}

unsafe extern "C" fn get_grid_rank(bmi: *mut CBmi, grid: c_int, dest: *mut c_int) -> c_int {
    put(dest, model(bmi).get_grid_rank(grid))
}

unsafe extern "C" fn get_grid_size(bmi: *mut CBmi, grid: c_int, dest: *mut c_int) -> c_int {
    put(dest, model(bmi).get_grid_size(grid))
}

unsafe extern "C" fn get_grid_type(bmi: *mut CBmi, grid: c_int, dest: *mut c_char) -> c_int {
    put_str(dest, model(bmi).get_grid_type(grid))
}

unsafe extern "C" fn get_grid_node_count(bmi: *mut CBmi, grid: c_int, dest: *mut c_int) -> c_int {
    put(dest, model(bmi).get_grid_node_count(grid))
}

unsafe extern "C" fn get_grid_edge_count(bmi: *mut CBmi, grid: c_int, dest: *mut c_int) -> c_int {
    put(dest, model(bmi).get_grid_edge_count(grid))
}

unsafe extern "C" fn get_grid_face_count(bmi: *mut CBmi, grid: c_int, dest: *mut c_int) -> c_int {
    put(dest, model(bmi).get_grid_face_count(grid))
}

macro_rules! grid_array {
    ($name:ident, $ty:ty, $array:expr) => {
        unsafe extern "C" fn $name(bmi: *mut CBmi, grid: c_int, dest: *mut $ty) -> c_int {
            let m = model(bmi);
            let len = grid_array_len(m, grid, $array);
            status(m.$name(grid, slice::from_raw_parts_mut(dest, len)))
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
