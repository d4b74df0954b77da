// hydrolink\crates\hl_bmi\src/foreign_type.rs

//! 外部类型解析
//!
//! 后端以自身语言的叫法报告变量类型（C 的 `"unsigned long int"`、
//! Fortran 的 `"real"`、numpy 的 `"float64"` 等），并单独报告元素宽度。
//! 本模块把 `(类型名, 宽度)` 映射为 [`NativeType`]，供缓冲区重解释使用。

use crate::bmi::BackendKind;
use crate::error::{BmiError, BmiResult};
use std::ffi::{c_int, c_long, c_longlong, c_short, c_uint, c_ulong, c_ulonglong, c_ushort};
use std::fmt;
use std::mem::size_of;

#[cfg(any(
    target_os = "windows",
    all(target_vendor = "apple", target_arch = "aarch64")
))]
const LONG_DOUBLE_SIZE: usize = 8;

#[cfg(all(target_arch = "x86", not(target_os = "windows")))]
const LONG_DOUBLE_SIZE: usize = 12;

#[cfg(not(any(
    target_os = "windows",
    all(target_vendor = "apple", target_arch = "aarch64"),
    all(target_arch = "x86", not(target_os = "windows"))
)))]
const LONG_DOUBLE_SIZE: usize = 16;

/// 本地数值类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeType {
    /// `short`
    Short,
    /// `unsigned short`
    UShort,
    /// `int`
    Int,
    /// `unsigned int`
    UInt,
    /// `long`
    Long,
    /// `unsigned long`
    ULong,
    /// `long long`
    LongLong,
    /// `unsigned long long`
    ULongLong,
    /// `float`
    Float,
    /// `double`
    Double,
    /// `long double`
    LongDouble,
}

impl NativeType {
    /// 全部类型
    pub const ALL: [NativeType; 11] = [
        Self::Short,
        Self::UShort,
        Self::Int,
        Self::UInt,
        Self::Long,
        Self::ULong,
        Self::LongLong,
        Self::ULongLong,
        Self::Float,
        Self::Double,
        Self::LongDouble,
    ];

    const SIGNED_INTEGERS: [NativeType; 4] = [Self::Short, Self::Int, Self::Long, Self::LongLong];
    const FLOATS: [NativeType; 3] = [Self::Float, Self::Double, Self::LongDouble];

    /// 当前平台上的字节宽度
    pub const fn size(self) -> usize {
        match self {
            Self::Short => size_of::<c_short>(),
            Self::UShort => size_of::<c_ushort>(),
            Self::Int => size_of::<c_int>(),
            Self::UInt => size_of::<c_uint>(),
            Self::Long => size_of::<c_long>(),
            Self::ULong => size_of::<c_ulong>(),
            Self::LongLong => size_of::<c_longlong>(),
            Self::ULongLong => size_of::<c_ulonglong>(),
            Self::Float => size_of::<f32>(),
            Self::Double => size_of::<f64>(),
            Self::LongDouble => LONG_DOUBLE_SIZE,
        }
    }

    /// 是否为整数类型
    pub const fn is_integer(self) -> bool {
        !matches!(self, Self::Float | Self::Double | Self::LongDouble)
    }

    /// 是否为有符号整数
    pub const fn is_signed_integer(self) -> bool {
        matches!(self, Self::Short | Self::Int | Self::Long | Self::LongLong)
    }

    /// 规范 C 类型名
    pub const fn c_name(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::UShort => "unsigned short",
            Self::Int => "int",
            Self::UInt => "unsigned int",
            Self::Long => "long",
            Self::ULong => "unsigned long",
            Self::LongLong => "long long",
            Self::ULongLong => "unsigned long long",
            Self::Float => "float",
            Self::Double => "double",
            Self::LongDouble => "long double",
        }
    }

    /// 对应的 numpy dtype 名
    pub fn numpy_dtype(self) -> String {
        match self {
            Self::Float => "float32".to_string(),
            Self::Double => "float64".to_string(),
            Self::LongDouble => "longdouble".to_string(),
            t if t.is_signed_integer() => format!("int{}", t.size() * 8),
            t => format!("uint{}", t.size() * 8),
        }
    }

    /// 解析 C/C++ 类型拼写（含 `signed`/`int` 等修饰的各种写法）
    pub fn from_c_name(name: &str) -> Option<Self> {
        let normalized = name.split_whitespace().collect::<Vec<_>>().join(" ");
        let t = match normalized.as_str() {
            "short" | "short int" | "signed short" | "signed short int" => Self::Short,
            "unsigned short" | "unsigned short int" => Self::UShort,
            "int" | "signed" | "signed int" => Self::Int,
            "unsigned" | "unsigned int" => Self::UInt,
            "long" | "long int" | "signed long" | "signed long int" => Self::Long,
            "unsigned long" | "unsigned long int" => Self::ULong,
            "long long" | "long long int" | "signed long long" | "signed long long int" => {
                Self::LongLong
            }
            "unsigned long long" | "unsigned long long int" => Self::ULongLong,
            "float" => Self::Float,
            "double" => Self::Double,
            "long double" => Self::LongDouble,
            _ => return None,
        };
        Some(t)
    }

    /// 按宽度选择有符号整数类型
    pub fn integer_of_size(item_size: usize) -> Option<Self> {
        Self::SIGNED_INTEGERS.into_iter().find(|t| t.size() == item_size)
    }

    /// 按宽度选择浮点类型
    pub fn float_of_size(item_size: usize) -> Option<Self> {
        Self::FLOATS.into_iter().find(|t| t.size() == item_size)
    }

    /// 按后端方言解析外部类型
    ///
    /// # 参数
    /// - `backend`: 报告类型的后端
    /// - `external_type`: 后端报告的类型名
    /// - `item_size`: 后端报告的元素字节数
    ///
    /// # 返回
    /// 无法识别的组合返回 [`BmiError::TypeResolution`]
    pub fn resolve(backend: BackendKind, external_type: &str, item_size: usize) -> BmiResult<Self> {
        let name = external_type.trim();
        let resolved = match backend {
            BackendKind::C | BackendKind::Cpp => Self::from_c_name(name),
            BackendKind::Fortran => Self::from_fortran_name(name, item_size),
            BackendKind::Python => Self::from_python_name(name, item_size),
        };
        resolved.ok_or_else(|| {
            BmiError::type_resolution(format!(
                "无法将 {backend} 后端报告的类型 '{external_type}' (itemsize {item_size}) 映射到本地数值类型"
            ))
        })
    }

    fn from_fortran_name(name: &str, item_size: usize) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "integer" | "int" => Self::integer_of_size(item_size),
            "real" | "float" => Self::float_of_size(item_size),
            "double precision" | "double" => Some(Self::Double),
            _ => None,
        }
    }

    fn from_python_name(name: &str, item_size: usize) -> Option<Self> {
        match name {
            "int" => Self::integer_of_size(item_size),
            "float" => Self::float_of_size(item_size),
            "int16" | "int32" | "int64" => {
                let bits: usize = name[3..].parse().ok()?;
                Self::integer_of_size(bits / 8)
            }
            "float32" | "real32" => Some(Self::Float),
            "float64" | "real64" => Some(Self::Double),
            "longdouble" | "float128" | "real128" => Some(Self::LongDouble),
            other => Self::from_c_name(other),
        }
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.c_name())
    }
}

// ========================================================================
// long double 解码
// ========================================================================

/// 将一个 `long double` 元素的字节解码为 `f64`
///
/// 8 字节视为 `double`；x86 平台按 x87 80 位扩展精度解码，其余平台按
/// IEEE binary128 解码。超出 `f64` 范围的值变为无穷大，精度多余部分被舍入。
pub fn long_double_to_f64(bytes: &[u8]) -> BmiResult<f64> {
    if bytes.len() == 8 {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        return Ok(f64::from_ne_bytes(raw));
    }
    if cfg!(any(target_arch = "x86", target_arch = "x86_64")) {
        decode_x87_extended(bytes)
    } else {
        decode_binary128(bytes)
    }
}

/// 解码 x87 80 位扩展精度（小端，显式整数位）
pub(crate) fn decode_x87_extended(bytes: &[u8]) -> BmiResult<f64> {
    if bytes.len() < 10 {
        return Err(BmiError::type_resolution(format!(
            "x87 扩展精度需要至少 10 字节, 实际 {}",
            bytes.len()
        )));
    }
    let mut mant_raw = [0u8; 8];
    mant_raw.copy_from_slice(&bytes[..8]);
    let mantissa = u64::from_le_bytes(mant_raw);
    let sign_exp = u16::from_le_bytes([bytes[8], bytes[9]]);
    let negative = sign_exp & 0x8000 != 0;
    let exponent = i32::from(sign_exp & 0x7fff);

    let magnitude = if exponent == 0x7fff {
        if mantissa << 1 == 0 {
            f64::INFINITY
        } else {
            f64::NAN
        }
    } else if mantissa == 0 {
        0.0
    } else {
        let unbiased = if exponent == 0 { 1 - 16383 } else { exponent - 16383 };
        scale_by_power_of_two(mantissa as f64, unbiased - 63)
    };
    Ok(if negative { -magnitude } else { magnitude })
}

/// 解码 IEEE 754 binary128（小端）
pub(crate) fn decode_binary128(bytes: &[u8]) -> BmiResult<f64> {
    if bytes.len() < 16 {
        return Err(BmiError::type_resolution(format!(
            "binary128 需要 16 字节, 实际 {}",
            bytes.len()
        )));
    }
    let mut lo_raw = [0u8; 8];
    let mut hi_raw = [0u8; 8];
    lo_raw.copy_from_slice(&bytes[..8]);
    hi_raw.copy_from_slice(&bytes[8..16]);
    let lo = u64::from_le_bytes(lo_raw);
    let hi = u64::from_le_bytes(hi_raw);

    let negative = hi >> 63 != 0;
    let exponent = ((hi >> 48) & 0x7fff) as i32;
    let mant_hi = hi & 0x0000_ffff_ffff_ffff;
    let fraction =
        scale_by_power_of_two(mant_hi as f64, -48) + scale_by_power_of_two(lo as f64, -112);

    let magnitude = if exponent == 0x7fff {
        if mant_hi == 0 && lo == 0 {
            f64::INFINITY
        } else {
            f64::NAN
        }
    } else if exponent == 0 {
        scale_by_power_of_two(fraction, 1 - 16383)
    } else {
        scale_by_power_of_two(1.0 + fraction, exponent - 16383)
    };
    Ok(if negative { -magnitude } else { magnitude })
}

/// `value * 2^exp`，分段缩放以避免中间结果溢出
fn scale_by_power_of_two(mut value: f64, mut exp: i32) -> f64 {
    while exp > 1000 {
        value *= 2f64.powi(1000);
        exp -= 1000;
        if value.is_infinite() {
            return value;
        }
    }
    while exp < -1000 {
        value *= 2f64.powi(-1000);
        exp += 1000;
        if value == 0.0 {
            return value;
        }
    }
    value * 2f64.powi(exp)
}
