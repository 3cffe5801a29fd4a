//! `monodocs.toml` loading.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use monodocs_scss::OutputStyle;
use monodocs_static::BuildConfig;

/// Configuration file structure (monodocs.toml).
#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct ConfigFile {
    #[serde(default)]
    pub styles: StylesConfig,
    #[serde(default)]
    pub build: BuildSettings,
    #[serde(default)]
    pub tokens: TokenSettings,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct StylesConfig {
    #[serde(default = "default_styles_dir")]
    pub dir: String,
    #[serde(default = "default_output")]
    pub output: String,
    #[serde(default = "default_asset_prefix")]
    pub asset_prefix: String,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            dir: default_styles_dir(),
            output: default_output(),
            asset_prefix: default_asset_prefix(),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct BuildSettings {
    #[serde(default = "default_true")]
    pub minify: bool,
    #[serde(default)]
    pub style: OutputStyle,
    #[serde(default = "default_true")]
    pub scoped: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            minify: true,
            style: OutputStyle::default(),
            scoped: true,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct TokenSettings {
    #[serde(default = "default_true")]
    pub camel_case: bool,
    #[serde(default)]
    pub only: bool,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            camel_case: true,
            only: false,
        }
    }
}

fn default_styles_dir() -> String {
    "styles".to_string()
}
fn default_output() -> String {
    "dist".to_string()
}
fn default_asset_prefix() -> String {
    "/assets/".to_string()
}
fn default_true() -> bool {
    true
}

impl ConfigFile {
    /// Load configuration from `path` if it exists.
    /// Returns an error if the config file exists but is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No {} found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::info!("Loaded config from {}", path.display());

        Ok(config)
    }

    /// Build settings, with `output` and `minify` overriding file values.
    pub fn build_config(&self, output: Option<PathBuf>, minify: Option<bool>) -> BuildConfig {
        BuildConfig {
            source_dir: PathBuf::from(&self.styles.dir),
            output_dir: output.unwrap_or_else(|| PathBuf::from(&self.styles.output)),
            asset_prefix: self.styles.asset_prefix.clone(),
            style: self.build.style,
            scoped: self.build.scoped,
            minify: minify.unwrap_or(self.build.minify),
            camel_case_tokens: self.tokens.camel_case,
            tokens_only: self.tokens.only,
        }
    }
}
