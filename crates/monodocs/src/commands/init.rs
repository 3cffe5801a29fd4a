//! Initialize monodocs in a project.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Run the init command.
pub async fn run(config_path: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing monodocs...");

    let root = config_path.parent().unwrap_or(Path::new(""));
    let written = write_project(root, config_path, yes)?;

    for path in &written {
        tracing::info!("Created {}", path);
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'monodocs build' to compile your stylesheets.");

    Ok(())
}

/// Write the default config and a starter stylesheet under `root`.
/// Existing files are kept unless `overwrite` is set.
fn write_project(root: &Path, config_path: &Path, overwrite: bool) -> Result<Vec<String>> {
    let mut written = Vec::new();

    if config_path.exists() && !overwrite {
        tracing::warn!(
            "{} already exists. Use --yes to overwrite.",
            config_path.display()
        );
    } else {
        fs::write(config_path, DEFAULT_CONFIG)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        written.push(config_path.display().to_string());
    }

    let styles_dir = root.join("styles");
    fs::create_dir_all(&styles_dir).context("Failed to create styles directory")?;

    let sheet = styles_dir.join("button.module.scss");
    if !sheet.exists() || overwrite {
        fs::write(&sheet, DEFAULT_STYLESHEET).context("Failed to write button.module.scss")?;
        written.push(sheet.display().to_string());
    }

    Ok(written)
}

const DEFAULT_CONFIG: &str = r#"# monodocs configuration

[styles]
# Source directory for stylesheets
dir = "styles"

# Output directory for compiled CSS, tokens and modules
output = "dist"

# Public url prefix of copied assets
asset_prefix = "/assets/"

[build]
# Minify CSS output
minify = true

# Sass output style: "expanded" or "compressed"
style = "expanded"

# Scope class names in *.module.scss files
scoped = true

[tokens]
# Add camelCase keys for dashed class names
camel_case = true

# Export only the camelCase keys
only = false
"#;

const DEFAULT_STYLESHEET: &str = r#"$accent: #3366cc;

.button {
  color: white;
  background: $accent;
  animation: fade-in 200ms ease-out;

  &-primary {
    font-weight: bold;
  }
}

:global(.theme-dark) .button {
  background: darken($accent, 20%);
}

@keyframes fade-in {
  from { opacity: 0; }
  to { opacity: 1; }
}
"#;
