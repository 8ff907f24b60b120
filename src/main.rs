use anyhow::Context;
use clap::Parser;

use stagelight::AppConfig;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::parse();
    log::info!("Loading assets from '{}'", config.assets.display());

    stagelight::run(config).context("stagelight exited with an error")
}
