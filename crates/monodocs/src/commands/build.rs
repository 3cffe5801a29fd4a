//! Stylesheet build command.

use std::path::{Path, PathBuf};

use anyhow::Result;
use monodocs_scss::DependencyDirs;
use monodocs_static::{BuildResult, StylesheetBuilder};

use crate::config::ConfigFile;

/// Run the build command.
pub async fn run(config_path: &Path, output: Option<PathBuf>, minify: Option<bool>) -> Result<()> {
    tracing::info!("Building stylesheets...");

    let config = ConfigFile::load(config_path)?;
    let dependency_dirs = super::dependency_dirs()?;

    let result = build(&config, output, minify, dependency_dirs).await?;
    log_result(&result);

    Ok(())
}

pub(crate) async fn build(
    config: &ConfigFile,
    output: Option<PathBuf>,
    minify: Option<bool>,
    dependency_dirs: DependencyDirs,
) -> Result<BuildResult> {
    let builder = StylesheetBuilder::new(config.build_config(output, minify), dependency_dirs)?;
    Ok(builder.build().await?)
}

pub(crate) fn log_result(result: &BuildResult) {
    tracing::info!(
        "Built {} stylesheets with {} assets in {}ms",
        result.stylesheets,
        result.assets,
        result.duration_ms
    );

    tracing::info!("Output: {}", result.output_dir.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn builds_from_config() {
        let temp = tempdir().unwrap();
        let styles = temp.path().join("css");
        fs::create_dir_all(&styles).unwrap();
        fs::write(styles.join("card.module.scss"), ".card-title { color: red; }").unwrap();

        let mut config = ConfigFile::default();
        config.styles.dir = styles.display().to_string();
        config.tokens.only = true;
        let out = temp.path().join("public");

        let result = build(&config, Some(out.clone()), Some(false), DependencyDirs::default())
            .await
            .unwrap();

        assert_eq!(result.stylesheets, 1);
        assert_eq!(result.output_dir, out);

        let tokens: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("card.module.json")).unwrap())
                .unwrap();
        assert!(tokens["cardTitle"].is_string());
        assert!(tokens.get("card-title").is_none());
    }
}
