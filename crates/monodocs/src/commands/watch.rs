//! Rebuild stylesheets on change.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use monodocs_scss::DependencyDirs;
use monodocs_static::{StyleWatcher, WatchEvent};

use super::build::{build, log_result};
use crate::config::ConfigFile;

/// Run the watch command.
pub async fn run(config_path: &Path, output: Option<PathBuf>) -> Result<()> {
    let config = ConfigFile::load(config_path)?;
    let dependency_dirs = super::dependency_dirs()?;

    let output_dir = output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.styles.output));
    let output_dir = std::path::absolute(&output_dir).unwrap_or(output_dir);
    let source_dir = PathBuf::from(&config.styles.dir);

    rebuild(&config, output.as_deref(), &dependency_dirs).await;

    let (watcher, mut rx) =
        StyleWatcher::new(&[source_dir.clone()]).context("Failed to start file watcher")?;

    tracing::info!("Watching {} for changes...", source_dir.display());

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                if !should_rebuild(&event, &output_dir) {
                    continue;
                }

                tracing::info!("Changed: {}", event.path().display());
                rebuild(&config, output.as_deref(), &dependency_dirs).await;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Stopping watcher");
                break;
            }
        }
    }

    drop(watcher);
    Ok(())
}

/// Build once, logging failures instead of returning them.
async fn rebuild(config: &ConfigFile, output: Option<&Path>, dependency_dirs: &DependencyDirs) {
    // A fresh builder per run so edited assets are hashed again.
    match build(config, output.map(Path::to_path_buf), None, dependency_dirs.clone()).await {
        Ok(result) => log_result(&result),
        Err(e) => tracing::error!("Build failed: {:#}", e),
    }
}

/// Events from our own output (an output dir nested in the styles dir) are ignored.
fn should_rebuild(event: &WatchEvent, output_dir: &Path) -> bool {
    let path = event.path();
    let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    !path.starts_with(output_dir)
}
