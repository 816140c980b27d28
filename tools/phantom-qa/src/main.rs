//! ACR CT 体模质控命令行工具.

mod result;
mod runner;

use anyhow::{bail, Context};
use clap::Parser;
use log::{info, LevelFilter};
use std::path::PathBuf;
use utils::loader;

/// 日志级别的环境变量.
const LOG_VAR: &str = "PHANTOM_LOG";

#[derive(Parser)]
#[command(name = "phantom-qa")]
#[command(about = "ACR CT phantom slice localisation and QA measurements")]
struct Args {
    /// Series directories (or a root containing them). Defaults to
    /// `$PHANTOM_SERIES_DIR`, then `$HOME/dataset/phantom`.
    series: Vec<PathBuf>,

    /// TOML configuration file. Defaults to `$PHANTOM_CONFIG`.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for `report.json` and `report.tsv`.
    #[arg(short, long)]
    out: Option<PathBuf>,
}

fn log_level() -> LevelFilter {
    std::env::var(LOG_VAR)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(LevelFilter::Info)
}

fn main() -> anyhow::Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(log_level())
        .init()?;
    let args = Args::parse();

    let roots = if args.series.is_empty() {
        vec![loader::series_root_from_env_or_home().context("cannot resolve series directory")?]
    } else {
        args.series
    };
    let series: Vec<PathBuf> = roots.iter().flat_map(loader::discover_series).collect();
    if series.is_empty() {
        bail!("no series found under {roots:?}");
    }

    let cfg = loader::load_config(args.config).context("loading configuration")?;
    let res = runner::run(series, &cfg)?;
    res.analyze()?;

    if let Some(out) = args.out {
        res.save(&out)
            .with_context(|| format!("writing reports to {}", out.display()))?;
        info!("结果已写入 {}", out.display());
    }

    let failed = res.failed_series();
    if failed > 0 {
        bail!("{failed} series could not be analysed");
    }
    Ok(())
}
