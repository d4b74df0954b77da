// hydrolink\crates\hl_bmi\tests/fortran_adapter.rs

mod common;

use common::fortran_shim::{register_null_handle, register_test_handle, test_proxies};
use common::{config_file, options, RECT_GRID, SCALAR_GRID, TRI_GRID};
use hl_bmi::{values, BackendKind, Bmi, BmiAdapter, BmiError, FortranAdapter, NativeType};

fn ready_adapter() -> (tempfile::NamedTempFile, FortranAdapter) {
    let config = config_file(&["time_units=s"]);
    let mut adapter =
        FortranAdapter::from_proxies(options(config.path()), test_proxies(), register_test_handle).unwrap();
    adapter.initialize_configured().unwrap();
    (config, adapter)
}

#[test]
fn test_fortran_type_names_resolve() {
    let (_config, adapter) = ready_adapter();
    assert_eq!(adapter.backend_kind(), BackendKind::Fortran);
    assert_eq!(adapter.get_var_type("INPUT_VAR_1").unwrap(), "double precision");
    assert_eq!(adapter.get_var_type("INPUT_VAR_2").unwrap(), "real");
    assert_eq!(adapter.get_var_type("INPUT_VAR_3").unwrap(), "integer");
    assert_eq!(adapter.native_type("real", 4).unwrap(), NativeType::Float);
    assert_eq!(adapter.native_type("integer", 4).unwrap(), NativeType::Int);
    assert_eq!(adapter.native_type("double precision", 8).unwrap(), NativeType::Double);
}

#[test]
fn test_values_dispatch_by_declared_type() {
    let (_config, mut adapter) = ready_adapter();
    values::set_value::<f64, _>(&mut adapter, "INPUT_VAR_1", &[3.0]).unwrap();
    values::set_value::<f32, _>(&mut adapter, "INPUT_VAR_2", &[0.5]).unwrap();
    values::set_value::<i32, _>(&mut adapter, "INPUT_VAR_3", &[42]).unwrap();
    adapter.update().unwrap();

    let out: Vec<f64> = values::get_value(&adapter, "OUTPUT_VAR_1").unwrap();
    assert_eq!(out, vec![3.0]);
    let out: Vec<f64> = values::get_value(&adapter, "OUTPUT_VAR_2").unwrap();
    assert_eq!(out, vec![1.0]);
    let count: Vec<i64> = values::get_value(&adapter, "INPUT_VAR_3").unwrap();
    assert_eq!(count, vec![42]);
    let grid: Vec<f64> = values::get_value(&adapter, "GRID_VAR_1").unwrap();
    assert_eq!(grid.len(), 6);
}

#[test]
fn test_update_until_passes_time_by_reference() {
    let (_config, mut adapter) = ready_adapter();
    adapter.update_until(7200.0).unwrap();
    assert_eq!(adapter.get_current_time().unwrap(), 7200.0);
    assert_eq!(adapter.get_end_time().unwrap(), 36_000.0);
}

#[test]
fn test_index_and_pointer_access_unsupported() {
    let (_config, mut adapter) = ready_adapter();
    let mut dest = [0u8; 8];
    let err = adapter.get_value_at_indices("GRID_VAR_1", &mut dest, &[0]).unwrap_err();
    assert!(matches!(err, BmiError::Unsupported { .. }));
    let err = adapter.set_value_at_indices("GRID_VAR_1", &[0], &dest).unwrap_err();
    assert!(matches!(err, BmiError::Unsupported { .. }));
    let err = adapter.get_value_ptr("INPUT_VAR_1").unwrap_err();
    assert!(matches!(err, BmiError::Unsupported { .. }));
}

#[test]
fn test_grid_queries_pass_grid_by_reference() {
    let (_config, adapter) = ready_adapter();
    assert_eq!(adapter.get_grid_rank(RECT_GRID).unwrap(), 2);
    assert_eq!(adapter.get_grid_type(TRI_GRID).unwrap(), "unstructured");
    let mut shape = [0; 2];
    adapter.get_grid_shape(RECT_GRID, &mut shape).unwrap();
    assert_eq!(shape, [2, 3]);
    let mut spacing = [7.0; 1];
    adapter.get_grid_spacing(SCALAR_GRID, &mut spacing).unwrap();
    assert_eq!(spacing, [0.0]);
    let mut face_edges = [0; 3];
    adapter.get_grid_face_edges(TRI_GRID, &mut face_edges).unwrap();
    assert_eq!(face_edges, [0, 1, 2]);
}

#[test]
fn test_var_names_round_trip() {
    let (_config, adapter) = ready_adapter();
    assert_eq!(adapter.get_input_var_names().unwrap(), common::INPUT_VARS);
    assert_eq!(adapter.get_output_var_names().unwrap(), common::OUTPUT_VARS);
}

#[test]
fn test_null_handle_is_binding_error() {
    let config = config_file(&["time_units=s"]);
    let err = FortranAdapter::from_proxies(options(config.path()), test_proxies(), register_null_handle)
        .err()
        .unwrap();
    assert!(matches!(err, BmiError::Binding { .. }));
}

#[test]
fn test_initialization_failure_is_external_state() {
    let config = config_file(&["fail_init=true"]);
    let mut adapter =
        FortranAdapter::from_proxies(options(config.path()), test_proxies(), register_test_handle).unwrap();
    assert!(adapter.initialize_configured().unwrap_err().is_external_state());
    assert!(matches!(
        adapter.initialize_configured().unwrap_err(),
        BmiError::PreviousInitFailure { .. }
    ));
}
