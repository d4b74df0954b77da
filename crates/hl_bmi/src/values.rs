// hydrolink\crates\hl_bmi\src/values.rs

//! 强类型取值与赋值
//!
//! [`Bmi`](crate::Bmi) 的取值接口是类型擦除的字节缓冲区。这里的辅助函数
//! 依据后端报告的 `(类型名, 元素大小)` 解析本地类型，逐元素解码后转换为
//! 调用方要求的数值类型。

use crate::bmi::BmiAdapter;
use crate::error::{BmiError, BmiResult};
use crate::foreign_type::{long_double_to_f64, NativeType};
use bytemuck::Pod;
use num_traits::NumCast;
use std::any::type_name;
use std::ffi::{c_int, c_long, c_longlong, c_short, c_uint, c_ulong, c_ulonglong, c_ushort};
use std::mem::size_of;

/// 读取变量全部元素并转换为 `T`
///
/// # 参数
/// - `model`: 已初始化的适配器
/// - `name`: 变量名
///
/// # 返回
/// 元素个数为 `nbytes / itemsize` 的数组。值无法用 `T` 表示时返回
/// [`BmiError::TypeResolution`]。
pub fn get_value<T, A>(model: &A, name: &str) -> BmiResult<Vec<T>>
where
    T: NumCast + Copy + 'static,
    A: BmiAdapter + ?Sized,
{
    let var_type = model.get_var_type(name)?;
    let itemsize = model.get_var_itemsize(name)?;
    let nbytes = model.get_var_nbytes(name)?;
    if itemsize == 0 || nbytes == 0 {
        return Err(BmiError::backend(
            model.model_name(),
            format!("无法获取变量 {name} 的值: nbytes 为 {nbytes}, itemsize 为 {itemsize}"),
        ));
    }
    let native = model.native_type(&var_type, itemsize)?;
    check_item_size(native, itemsize)?;

    let mut buffer = vec![0u8; nbytes];
    model.get_value(name, &mut buffer)?;
    decode(native, itemsize, &buffer)
}

/// 按索引读取变量元素并转换为 `T`
///
/// 空索引返回空数组，不调用后端。
pub fn get_value_at_indices<T, A>(model: &A, name: &str, inds: &[i32]) -> BmiResult<Vec<T>>
where
    T: NumCast + Copy + 'static,
    A: BmiAdapter + ?Sized,
{
    if inds.is_empty() {
        return Ok(Vec::new());
    }
    let var_type = model.get_var_type(name)?;
    let itemsize = model.get_var_itemsize(name)?;
    if itemsize == 0 {
        return Err(BmiError::backend(
            model.model_name(),
            format!("无法按索引获取变量 {name} 的值: itemsize 为 0"),
        ));
    }
    let native = model.native_type(&var_type, itemsize)?;
    check_item_size(native, itemsize)?;

    let mut buffer = vec![0u8; itemsize * inds.len()];
    model.get_value_at_indices(name, &mut buffer, inds)?;
    decode(native, itemsize, &buffer)
}

// ============================================================================
// 可写入的标量类型
// ============================================================================

/// 可以原样写入后端缓冲区的 Rust 标量
///
/// 写入不做数值转换，`T` 必须与变量的本地类型在类别、符号和宽度上一致。
pub trait NativeScalar: Pod {
    /// `T` 是否能按位表示 `native` 类型的值
    fn matches(native: NativeType) -> bool;
}

macro_rules! native_scalar {
    ($kind:ident: $($ty:ty),*) => {
        $(impl NativeScalar for $ty {
            fn matches(native: NativeType) -> bool {
                native.size() == size_of::<$ty>() && native_scalar!(@$kind native)
            }
        })*
    };
    (@signed $n:ident) => { $n.is_signed_integer() };
    (@unsigned $n:ident) => { $n.is_integer() && !$n.is_signed_integer() };
    (@float $n:ident) => { !$n.is_integer() };
}

native_scalar!(signed: i16, i32, i64);
native_scalar!(unsigned: u16, u32, u64);
native_scalar!(float: f32, f64);

/// 以 `T` 类型写入变量全部元素
///
/// `T` 必须与变量的本地类型一致，否则返回 [`BmiError::TypeResolution`]。
pub fn set_value<T, A>(model: &mut A, name: &str, src: &[T]) -> BmiResult<()>
where
    T: NativeScalar,
    A: BmiAdapter + ?Sized,
{
    check_setter_type::<T, A>(model, name)?;
    model.set_value(name, bytemuck::cast_slice(src))
}

/// 以 `T` 类型写入指定索引处的元素
///
/// 索引与值的数量必须一致；二者皆空时为空操作。
pub fn set_value_at_indices<T, A>(model: &mut A, name: &str, inds: &[i32], src: &[T]) -> BmiResult<()>
where
    T: NativeScalar,
    A: BmiAdapter + ?Sized,
{
    if inds.len() != src.len() {
        return Err(BmiError::backend(
            model.model_name(),
            format!(
                "无法按索引设置变量 {name}: 索引数 {} 与值的数量 {} 不一致",
                inds.len(),
                src.len()
            ),
        ));
    }
    if inds.is_empty() {
        return Ok(());
    }
    check_setter_type::<T, A>(model, name)?;
    model.set_value_at_indices(name, inds, bytemuck::cast_slice(src))
}

fn check_setter_type<T, A>(model: &A, name: &str) -> BmiResult<()>
where
    T: NativeScalar,
    A: BmiAdapter + ?Sized,
{
    let var_type = model.get_var_type(name)?;
    let itemsize = model.get_var_itemsize(name)?;
    let native = model.native_type(&var_type, itemsize)?;
    if native.size() != itemsize || !T::matches(native) {
        return Err(BmiError::type_resolution(format!(
            "无法设置变量 {name}: 值类型 {} 宽 {} 字节, 变量类型为 {native} (itemsize {itemsize})",
            type_name::<T>(),
            size_of::<T>()
        )));
    }
    Ok(())
}

fn check_item_size(native: NativeType, itemsize: usize) -> BmiResult<()> {
    let consistent = match native {
        // 不同平台/后端对 long double 的存储宽度不一
        NativeType::LongDouble => itemsize == 8 || (10..=16).contains(&itemsize),
        other => other.size() == itemsize,
    };
    if consistent {
        Ok(())
    } else {
        Err(BmiError::type_resolution(format!(
            "类型 {native} 在本平台宽 {} 字节, 与声明的 itemsize {itemsize} 不符",
            native.size()
        )))
    }
}

fn cast<T: NumCast + 'static, V: NumCast + Copy>(value: V, native: NativeType) -> BmiResult<T> {
    T::from(value).ok_or_else(|| {
        BmiError::type_resolution(format!(
            "无法将 {native} 类型的值转换为 {}",
            type_name::<T>()
        ))
    })
}

/// 将原始字节逐元素解码为 `T`
fn decode<T>(native: NativeType, itemsize: usize, bytes: &[u8]) -> BmiResult<Vec<T>>
where
    T: NumCast + Copy + 'static,
{
    macro_rules! read_as {
        ($ty:ty) => {
            bytes
                .chunks_exact(itemsize)
                .map(|chunk| cast(bytemuck::pod_read_unaligned::<$ty>(chunk), native))
                .collect()
        };
    }
    match native {
        NativeType::Short => read_as!(c_short),
        NativeType::UShort => read_as!(c_ushort),
        NativeType::Int => read_as!(c_int),
        NativeType::UInt => read_as!(c_uint),
        NativeType::Long => read_as!(c_long),
        NativeType::ULong => read_as!(c_ulong),
        NativeType::LongLong => read_as!(c_longlong),
        NativeType::ULongLong => read_as!(c_ulonglong),
        NativeType::Float => read_as!(f32),
        NativeType::Double => read_as!(f64),
        NativeType::LongDouble => bytes
            .chunks_exact(itemsize)
            .map(|chunk| cast(long_double_to_f64(chunk)?, native))
            .collect(),
    }
}
