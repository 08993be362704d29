// src/main.rs
mod batch;
mod config;
mod engine;
mod gui;
mod scanner;
mod types;
use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{anyhow, Result};
use clap::Parser;
use log::{info, LevelFilter};
use config::ScanConfig;
use scanner::{PlotStyle, ScanController};
use types::FrontEnd;

/// Sweeps a channel plan, keeps a waterfall per channel and shows or writes the result.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON config file; built-in 2.4 GHz Wi-Fi plan when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Front end to run
    #[arg(short, long, value_enum, default_value_t = FrontEnd::Browse)]
    mode: FrontEnd,
    /// Output directory for batch mode
    #[arg(short, long, default_value = "scan_output")]
    out: PathBuf,
    /// Print the effective config as JSON and exit
    #[arg(long)]
    dump_config: bool,
    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn level_filter(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

// 入口函数
fn main() -> Result<()> {
    let args = Args::parse();
    let mut logger = env_logger::Builder::from_default_env();
    if args.verbose > 0 || std::env::var_os("RUST_LOG").is_none() {
        logger.filter_level(level_filter(args.verbose));
    }
    logger.init();

    let config = match &args.config {
        Some(path) => ScanConfig::load(path)?,
        None => ScanConfig::default(),
    };
    if args.dump_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }
    info!(
        "receiver {} (simulated), {} channels, {} x {} waterfall",
        config.uri,
        config.channels.len(),
        config.waterfall_depth,
        config.frame_size
    );

    let session = Arc::new(config.build_session()?);
    let controller = ScanController::new(session, config.simulated_device(), &config.device_config())?;
    match args.mode {
        FrontEnd::Batch => {
            let report = batch::run(&controller, &args.out, PlotStyle::default())?;
            if !report.is_clean() {
                println!("failed channel indices: {:?}", report.failed_indices());
            }
            println!("images written to {}", args.out.display());
            Ok(())
        }
        mode => gui::run(mode, Arc::new(controller)).map_err(|e| anyhow!("gui failed: {e}")),
    }
}
