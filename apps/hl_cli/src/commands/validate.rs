// hydrolink\apps\hl_cli\src\commands\validate.rs

//! 配置验证命令
//!
//! 解析适配器配置并检查其引用的文件，不加载后端。

use anyhow::{bail, Result};
use clap::Args;
use hl_config::AdapterConfig;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// 验证参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 适配器配置文件路径
    #[arg(short, long)]
    pub config: PathBuf,

    /// 严格模式（警告也视为错误）
    #[arg(long)]
    pub strict: bool,
}

#[derive(Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn is_ok(&self, strict: bool) -> bool {
        self.errors.is_empty() && (!strict || self.warnings.is_empty())
    }
}

/// 执行验证命令
pub fn execute(args: ValidateArgs) -> Result<()> {
    info!("=== HydroLink 配置验证 ===");
    println!("检查配置文件: {}", args.config.display());

    let mut result = ValidationResult::default();
    match AdapterConfig::from_file(&args.config) {
        Ok(config) => {
            println!("  ✓ 配置格式有效 (后端: {:?})", config.backend.kind());
            match config.check_files() {
                Ok(()) => println!("  ✓ 引用文件可读"),
                Err(e) => result.errors.push(e.to_string()),
            }
            if config.protocols.is_null() {
                result
                    .warnings
                    .push("未配置 protocols，质量守恒检查将被跳过".to_string());
            }
        }
        Err(e) => result.errors.push(e.to_string()),
    }

    print_validation_result(&result, args.strict)
}

fn print_validation_result(result: &ValidationResult, strict: bool) -> Result<()> {
    println!("\n=== 验证结果 ===");

    if !result.errors.is_empty() {
        println!("\n错误 ({}):", result.errors.len());
        for err in &result.errors {
            error!("  ✗ {}", err);
            println!("  ✗ {}", err);
        }
    }

    if !result.warnings.is_empty() {
        println!("\n警告 ({}):", result.warnings.len());
        for warning in &result.warnings {
            warn!("  ⚠ {}", warning);
            println!("  ⚠ {}", warning);
        }
    }

    if result.is_ok(strict) {
        println!("\n✓ 验证通过");
        Ok(())
    } else {
        println!("\n✗ 验证失败");
        bail!(
            "验证失败：发现 {} 个错误，{} 个警告",
            result.errors.len(),
            result.warnings.len()
        )
    }
}
