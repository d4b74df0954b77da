// hydrolink\crates\hl_foundation\src/units.rs

//! 模型时间单位
//!
//! 外部模型以各自的时间单位报告时间，框架内部统一使用秒。
//! 单位字符串与换算系数的对应关系由唯一一张表给出：
//!
//! | 单位字符串 | 系数 (秒) |
//! |---|---|
//! | `s`, `sec`, `second`, `seconds` | 1 |
//! | `m`, `min`, `minute`, `minutes` | 60 |
//! | `h`, `hr`, `hour`, `hours` | 3600 |
//! | `d`, `day`, `days` | 86400 |

use crate::error::{HlError, HlResult};
use std::fmt;

/// 模型时间单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    /// 秒
    Seconds,
    /// 分钟
    Minutes,
    /// 小时
    Hours,
    /// 天
    Days,
}

impl TimeUnit {
    /// 所有可识别的单位
    pub const ALL: [TimeUnit; 4] = [Self::Seconds, Self::Minutes, Self::Hours, Self::Days];

    /// 解析模型报告的单位字符串（区分大小写）
    pub fn parse(units: &str) -> HlResult<Self> {
        match units {
            "s" | "sec" | "second" | "seconds" => Ok(Self::Seconds),
            "m" | "min" | "minute" | "minutes" => Ok(Self::Minutes),
            "h" | "hr" | "hour" | "hours" => Ok(Self::Hours),
            "d" | "day" | "days" => Ok(Self::Days),
            other => Err(HlError::unknown_time_unit(other)),
        }
    }

    /// 该单位对应的秒数
    #[inline]
    pub const fn seconds_factor(self) -> f64 {
        match self {
            Self::Seconds => 1.0,
            Self::Minutes => 60.0,
            Self::Hours => 3600.0,
            Self::Days => 86400.0,
        }
    }

    /// 该单位接受的全部拼写
    pub const fn spellings(self) -> &'static [&'static str] {
        match self {
            Self::Seconds => &["s", "sec", "second", "seconds"],
            Self::Minutes => &["m", "min", "minute", "minutes"],
            Self::Hours => &["h", "hr", "hour", "hours"],
            Self::Days => &["d", "day", "days"],
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spellings()[0])
    }
}

impl std::str::FromStr for TimeUnit {
    type Err = HlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_spelling_parses() {
        for unit in TimeUnit::ALL {
            for spelling in unit.spellings() {
                assert_eq!(TimeUnit::parse(spelling).unwrap(), unit);
            }
        }
    }

    #[test]
    fn test_factors() {
        assert_eq!(TimeUnit::parse("s").unwrap().seconds_factor(), 1.0);
        assert_eq!(TimeUnit::parse("min").unwrap().seconds_factor(), 60.0);
        assert_eq!(TimeUnit::parse("hr").unwrap().seconds_factor(), 3600.0);
        assert_eq!(TimeUnit::parse("days").unwrap().seconds_factor(), 86400.0);
    }

    #[test]
    fn test_unknown_unit() {
        let err = TimeUnit::parse("fortnight").unwrap_err();
        assert!(err.to_string().contains("fortnight"));
        assert!(TimeUnit::parse("Seconds").is_err());
        assert!(TimeUnit::parse("").is_err());
    }
}
