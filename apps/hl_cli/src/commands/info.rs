// hydrolink\apps\hl_cli\src\commands\info.rs

//! 信息显示命令
//!
//! 初始化模型并打印组件名、时间信息和输入/输出变量表。

use anyhow::{Context, Result};
use clap::Args;
use hl_bmi::{Bmi, BmiAdapter};
use hl_config::{AdapterConfig, AdapterFactory};
use std::path::PathBuf;
use tracing::info;

/// 信息显示参数
#[derive(Args)]
pub struct InfoArgs {
    /// 适配器配置文件路径
    #[arg(short, long)]
    pub config: PathBuf,
}

/// 执行信息命令
pub fn execute(args: InfoArgs) -> Result<()> {
    info!("=== HydroLink 模型信息 ===");

    let config = AdapterConfig::from_file(&args.config)
        .with_context(|| format!("无法加载适配器配置: {}", args.config.display()))?;
    let mut adapter = AdapterFactory::build_initialized(&config).context("构建适配器失败")?;

    print_model_info(adapter.as_ref())?;

    adapter.finalize().context("结束模型失败")?;
    Ok(())
}

fn print_model_info(adapter: &dyn BmiAdapter) -> Result<()> {
    println!("=== 组件 ===");
    println!("名称: {}", adapter.get_component_name()?);
    println!("模型类型: {}", adapter.model_name());
    println!("后端: {:?}", adapter.backend_kind());
    println!("配置文件: {}", adapter.init_config().display());
    if let Some(forcing) = adapter.forcing_file() {
        println!("驱动文件: {}", forcing.display());
    }

    let units = adapter.get_time_units()?;
    println!("\n=== 时间 ===");
    println!("单位: {units}");
    println!("开始时间: {}", adapter.get_start_time()?);
    println!("结束时间: {}", adapter.get_end_time()?);
    println!("时间步长: {}", adapter.get_time_step()?);
    println!(
        "时间步长 (秒): {}",
        adapter.convert_model_time_to_seconds(adapter.get_time_step()?)
    );

    println!("\n=== 输入变量 ({}) ===", adapter.get_input_item_count()?);
    for name in adapter.get_input_var_names()? {
        print_variable(adapter, &name)?;
    }

    println!("\n=== 输出变量 ({}) ===", adapter.get_output_item_count()?);
    for name in adapter.get_output_var_names()? {
        print_variable(adapter, &name)?;
    }

    Ok(())
}

fn print_variable(adapter: &dyn BmiAdapter, name: &str) -> Result<()> {
    println!(
        "  {:<24} 类型={:<12} 单位={:<8} 字节={:<3} 网格={}",
        name,
        adapter.get_var_type(name)?,
        adapter.get_var_units(name)?,
        adapter.get_var_itemsize(name)?,
        adapter.get_var_grid(name)?,
    );
    Ok(())
}
