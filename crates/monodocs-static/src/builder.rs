//! Stylesheet build driver.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use walkdir::WalkDir;

use monodocs_scss::{
    render_css_module, CompileError, CompilerOptions, CssHook, CssModule, DependencyDirs,
    OutputStyle, ScopedNames, ScssCompiler, TokenTransformer,
};

use crate::assets::{AssetCopier, AssetPipeline};

/// Configuration for building a directory of stylesheets.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Source stylesheets directory
    pub source_dir: PathBuf,

    /// Output directory
    pub output_dir: PathBuf,

    /// Public url prefix of copied assets
    pub asset_prefix: String,

    /// Sass output style
    pub style: OutputStyle,

    /// Scope class and keyframes names in `*.module.*` files
    pub scoped: bool,

    /// Minify CSS output
    pub minify: bool,

    /// Export camelCase token keys
    pub camel_case_tokens: bool,

    /// Export only the camelCase keys
    pub tokens_only: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("styles"),
            output_dir: PathBuf::from("dist"),
            asset_prefix: "/assets/".to_string(),
            style: OutputStyle::Expanded,
            scoped: true,
            minify: true,
            camel_case_tokens: true,
            tokens_only: false,
        }
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of stylesheets compiled
    pub stylesheets: usize,

    /// Number of distinct assets copied
    pub assets: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to read styles directory: {0}")]
    ReadError(String),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("Failed to render module: {0}")]
    RenderError(String),

    #[error("Failed to write output: {0}")]
    WriteError(String),
}

/// A stylesheet to be built.
#[derive(Debug)]
struct StylesheetInfo {
    /// Source file path
    source_path: PathBuf,

    /// Relative path from the source dir
    relative_path: PathBuf,
}

/// Builds every stylesheet under a directory.
pub struct StylesheetBuilder {
    config: BuildConfig,
    compiler: ScssCompiler,
    assets: Arc<AssetCopier>,
}

impl StylesheetBuilder {
    /// Create a builder. `dependency_dirs` is shared by every compiled file.
    pub fn new(config: BuildConfig, dependency_dirs: DependencyDirs) -> Result<Self, BuildError> {
        let assets = AssetCopier::new(config.output_dir.join("assets"), config.asset_prefix.clone())
            .map_err(|e| BuildError::WriteError(e.to_string()))?;
        let assets = Arc::new(assets);

        let compiler = ScssCompiler::new(compiler_options(&config, dependency_dirs, assets.clone()));

        Ok(Self {
            config,
            compiler,
            assets,
        })
    }

    /// Compile all stylesheets. The first failing file aborts the build.
    pub async fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        fs::create_dir_all(&self.config.output_dir)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        let sheets = self.discover_stylesheets()?;

        let results: Vec<Result<(), BuildError>> = sheets
            .par_iter()
            .map(|sheet| self.build_stylesheet(sheet))
            .collect();

        for result in results {
            result?;
        }

        let duration = start.elapsed();

        Ok(BuildResult {
            stylesheets: sheets.len(),
            assets: self.assets.len(),
            duration_ms: duration.as_millis() as u64,
            output_dir: self.config.output_dir.clone(),
        })
    }

    /// Find all `.scss` and `.css` files that are not Sass partials. An output
    /// directory nested inside the source directory is skipped.
    fn discover_stylesheets(&self) -> Result<Vec<StylesheetInfo>, BuildError> {
        if !self.config.source_dir.exists() {
            return Err(BuildError::ReadError(format!(
                "Styles directory not found: {}",
                self.config.source_dir.display()
            )));
        }

        let output_dir = std::path::absolute(&self.config.output_dir)
            .map_err(|e| BuildError::ReadError(e.to_string()))?;

        let mut sheets: Vec<StylesheetInfo> = WalkDir::new(&self.config.source_dir)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| {
                std::path::absolute(e.path())
                    .map(|path| !path.starts_with(&output_dir))
                    .unwrap_or(true)
            })
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_stylesheet(e.path()))
            .map(|e| {
                let relative_path = e
                    .path()
                    .strip_prefix(&self.config.source_dir)
                    .unwrap_or(e.path())
                    .to_path_buf();
                StylesheetInfo {
                    source_path: e.path().to_path_buf(),
                    relative_path,
                }
            })
            .collect();

        sheets.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(sheets)
    }

    /// Compile one stylesheet and write its `.css`, `.json` and `.js` outputs.
    ///
    /// The `.json` file holds the tokens plus the reserved `__CSS` and `__FILES` keys.
    fn build_stylesheet(&self, sheet: &StylesheetInfo) -> Result<(), BuildError> {
        let code = fs::read_to_string(&sheet.source_path).map_err(|e| {
            BuildError::ReadError(format!("{}: {}", sheet.source_path.display(), e))
        })?;

        let result = self.compiler.compile(&code, &sheet.source_path)?;

        let output = self.config.output_dir.join(&sheet.relative_path);
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).map_err(|e| BuildError::WriteError(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(&CssModule::from(&result))
            .map_err(|e| BuildError::RenderError(e.to_string()))?;
        let module =
            render_css_module(&result).map_err(|e| BuildError::RenderError(e.to_string()))?;

        fs::write(output.with_extension("css"), &result.css)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;
        fs::write(output.with_extension("json"), json)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;
        fs::write(output.with_extension("js"), module)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        tracing::debug!(
            "Built {} ({} tokens)",
            sheet.relative_path.display(),
            result.tokens.len()
        );

        Ok(())
    }
}

fn compiler_options(
    config: &BuildConfig,
    dependency_dirs: DependencyDirs,
    assets: Arc<AssetCopier>,
) -> CompilerOptions {
    let scoped_names = if config.scoped {
        ScopedNames::ContentHash
    } else {
        ScopedNames::Disabled
    };

    let transform_token = config
        .camel_case_tokens
        .then(|| TokenTransformer::camel_case().only(config.tokens_only));

    let process_css: Option<CssHook> = config.minify.then(|| {
        let hook: CssHook = Arc::new(|css: &str, path: &Path| {
            AssetPipeline::minify_css(css).unwrap_or_else(|e| {
                tracing::warn!("Skipping minification of {}: {}", path.display(), e);
                css.to_string()
            })
        });
        hook
    });

    CompilerOptions {
        style: config.style,
        scoped_names,
        preprocess_css: None,
        process_css,
        map_file_url: Some(assets),
        transform_token,
        dependency_dirs,
    }
}

/// Whether `path` is a stylesheet to compile on its own.
pub fn is_stylesheet(path: &Path) -> bool {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    if ext != "scss" && ext != "css" {
        return false;
    }

    // Sass partials are only compiled through imports.
    let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    !filename.starts_with('_')
}
