// hydrolink\apps\hl_cli\src/main.rs

//! HydroLink 命令行界面
//!
//! 通过 JSON 适配器配置加载外部 BMI 模型，查看元数据、推进时间步
//! 并执行质量守恒检查。只依赖 `AdapterFactory` 与 `Box<dyn BmiAdapter>`，
//! 与后端语言无关。

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;

#[derive(Parser)]
#[command(name = "hl_cli", version, about = "HydroLink BMI model adapter driver")]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value_t = Level::INFO)]
    log_level: Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 步进运行模型
    Run(commands::run::RunArgs),
    /// 显示模型元数据
    Info(commands::info::InfoArgs),
    /// 验证适配器配置
    Validate(commands::validate::ValidateArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Run(args) => commands::run::execute(args),
        Command::Info(args) => commands::info::execute(args),
        Command::Validate(args) => commands::validate::execute(args),
    }
}
