// hydrolink\apps\hl_cli\src\commands\run.rs

//! 运行模型命令
//!
//! 逐步推进模型，每步之后执行质量守恒协议。
//! 非致命协议错误只记录日志，致命错误终止运行。

use anyhow::{Context as _, Result};
use clap::Args;
use hl_bmi::{Bmi, SharedAdapter};
use hl_config::{AdapterConfig, AdapterFactory};
use hl_protocols::{BmiProtocols, Context, Protocol};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

/// 运行参数
#[derive(Args)]
pub struct RunArgs {
    /// 适配器配置文件路径
    #[arg(short, long)]
    pub config: PathBuf,

    /// 时间步数（缺省时运行到模型结束时间）
    #[arg(short, long)]
    pub steps: Option<i64>,

    /// 要素 ID，仅用于日志
    #[arg(long, default_value = "cat-0")]
    pub id: String,
}

/// 执行运行命令
pub fn execute(args: RunArgs) -> Result<()> {
    info!("=== HydroLink 模型运行 ===");

    let config = AdapterConfig::from_file(&args.config)
        .with_context(|| format!("无法加载适配器配置: {}", args.config.display()))?;
    let model = AdapterFactory::build_shared(&config).context("构建适配器失败")?;
    let protocols = AdapterFactory::protocols(&config, &model);

    let total_steps = match args.steps {
        Some(n) => n,
        None => steps_to_end(&model)?,
    };
    info!(model = %config.model_type_name, total_steps, "开始运行");

    let start = Instant::now();
    // 步号从 1 开始，最后一步等于 total_steps
    for step in 1..=total_steps {
        let time = {
            let mut adapter = model.lock();
            adapter
                .update()
                .with_context(|| format!("第 {step} 步更新失败"))?;
            adapter.get_current_time()?
        };
        debug!(step, time, "完成时间步");
        check_mass_balance(&protocols, step, total_steps, time, &args.id)?;
    }

    model.lock().finalize().context("结束模型失败")?;

    info!("=== 运行完成 ===");
    info!("总步数: {}", total_steps);
    info!("计算时间: {:.2} s", start.elapsed().as_secs_f64());
    Ok(())
}

fn steps_to_end(model: &SharedAdapter) -> Result<i64> {
    let adapter = model.lock();
    let remaining = adapter.get_end_time()? - adapter.get_current_time()?;
    let dt = adapter.get_time_step()?;
    if dt.is_nan() || dt <= 0.0 || !remaining.is_finite() {
        anyhow::bail!("无法推算步数: 时间步长={dt}, 剩余时间={remaining}，请使用 --steps");
    }
    Ok((remaining / dt).ceil().max(0.0) as i64)
}

fn check_mass_balance(
    protocols: &BmiProtocols,
    step: i64,
    total_steps: i64,
    time: f64,
    id: &str,
) -> Result<()> {
    let timestamp = format!("{time}");
    let ctx = Context::new(step, total_steps, &timestamp, id);
    // 非致命结果已在协议内部记录
    if let Err(e) = protocols.run(Protocol::MassBalance, &ctx)? {
        debug!(kind = %e.kind(), "质量守恒检查未通过");
    }
    Ok(())
}
