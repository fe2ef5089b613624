use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::task::JoinSet;

use crate::{
    config::BakeConfig,
    convert::{AssetKind, convert},
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BakeSummary {
    pub baked: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Converts every known source asset directly inside `dir` (not recursive), writing each
/// output next to its source. A failing asset is logged and counted, the others still run.
pub async fn bake_directory(dir: &Path, config: BakeConfig) -> Result<BakeSummary> {
    log::info!("loading asset directory at {}", dir.display());

    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("cannot read directory {:?}", dir))?;

    let mut summary = BakeSummary::default();
    let mut tasks: JoinSet<(PathBuf, PathBuf, Result<()>)> = JoinSet::new();

    loop {
        let path = match entries.next_entry().await {
            Ok(Some(entry)) => entry.path(),
            Ok(None) => break,
            Err(e) => {
                log::warn!("stopping walk of {} on unreadable entry: {e}", dir.display());
                summary.skipped += 1;
                break;
            }
        };
        let is_file = tokio::fs::metadata(&path)
            .await
            .is_ok_and(|meta| meta.is_file());
        if !is_file {
            continue;
        }
        let Some(kind) = AssetKind::from_path(&path) else {
            log::debug!("ignoring {}", path.display());
            continue;
        };

        log::info!("found {kind} {}", path.display());
        let output = kind.output_path(&path);
        tasks.spawn_blocking(move || {
            let result = convert(kind, &path, &output, &config);
            (path, output, result)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((input, output, Ok(()))) => {
                log::info!("baked {} -> {}", input.display(), output.display());
                summary.baked += 1;
            }
            Ok((input, _, Err(e))) => {
                log::error!("failed to bake {}: {e:#}", input.display());
                summary.failed += 1;
            }
            Err(e) => {
                log::error!("bake task did not complete: {e}");
                summary.failed += 1;
            }
        }
    }

    log::info!(
        "{} baked, {} failed, {} skipped",
        summary.baked,
        summary.failed,
        summary.skipped
    );
    Ok(summary)
}
