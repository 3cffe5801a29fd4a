//! Compile a single stylesheet.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use monodocs_scss::{
    render_css_module, CompiledResult, CompilerOptions, DependencyDirs, ScopedNames,
    ScssCompiler, TokenTransformer,
};

use crate::config::ConfigFile;
use crate::Format;

/// Run the compile command.
pub async fn run(config_path: &Path, file: &Path, format: Format) -> Result<()> {
    let config = ConfigFile::load(config_path)?;

    let code = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let compiler = ScssCompiler::new(compiler_options(&config, super::dependency_dirs()?));
    let result = compiler.compile(&code, file)?;

    println!("{}", render(&result, format)?);

    Ok(())
}

/// Options for one-off compiles. `url()` references are left as written.
fn compiler_options(config: &ConfigFile, dependency_dirs: DependencyDirs) -> CompilerOptions {
    CompilerOptions {
        style: config.build.style,
        scoped_names: if config.build.scoped {
            ScopedNames::ContentHash
        } else {
            ScopedNames::Disabled
        },
        transform_token: config
            .tokens
            .camel_case
            .then(|| TokenTransformer::camel_case().only(config.tokens.only)),
        dependency_dirs,
        ..Default::default()
    }
}

fn render(result: &CompiledResult, format: Format) -> Result<String> {
    let output = match format {
        Format::Css => result.css.clone(),
        Format::Json => serde_json::to_string_pretty(result)?,
        Format::Module => render_css_module(result)?,
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn compile(config: &ConfigFile, source: &str) -> CompiledResult {
        ScssCompiler::new(compiler_options(config, DependencyDirs::default()))
            .compile(source, Path::new("/site/nav.module.scss"))
            .unwrap()
    }

    #[test]
    fn renders_json() {
        let result = compile(&ConfigFile::default(), ".nav-item { color: red; }");
        let json: serde_json::Value =
            serde_json::from_str(&render(&result, Format::Json).unwrap()).unwrap();

        assert_eq!(json["tokens"]["navItem"], json["tokens"]["nav-item"]);
        assert_eq!(json["css"], result.css.as_str());
        assert_eq!(json["fileMappings"], serde_json::json!([]));
    }

    #[test]
    fn renders_module() {
        let result = compile(&ConfigFile::default(), ".a { color: red; }");
        let module = render(&result, Format::Module).unwrap();

        assert!(module.starts_with("module.exports = {\"a\":\"a_"));
        assert!(module.contains("\"__CSS\""));
    }

    #[test]
    fn respects_config_settings() {
        let mut config = ConfigFile::default();
        config.build.scoped = false;
        let result = compile(&config, ".nav-item { color: red; }");

        assert!(result.tokens.is_empty());
        assert_eq!(render(&result, Format::Css).unwrap(), result.css);
        assert!(result.css.contains(".nav-item {"));

        let mut config = ConfigFile::default();
        config.tokens.only = true;
        let result = compile(&config, ".nav-item { color: red; }");
        assert_eq!(result.tokens.keys().collect::<Vec<_>>(), vec!["navItem"]);
    }
}
