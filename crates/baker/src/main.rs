mod bake;
mod config;
mod convert;

use std::path::PathBuf;

use anyhow::{Result, bail};

use crate::{bake::bake_directory, config::BakeConfig};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args_os().skip(1);
    let (Some(dir), None) = (args.next(), args.next()) else {
        bail!("usage: baker <asset directory>");
    };

    let config = BakeConfig::from_env()?;
    log::info!(
        "baking with vertex format {} and {} compression",
        config.vertex_format,
        config.compression
    );

    let summary = bake_directory(&PathBuf::from(dir), config).await?;
    if summary.failed > 0 {
        bail!(
            "{} of {} assets failed to bake",
            summary.failed,
            summary.failed + summary.baked
        );
    }

    Ok(())
}
