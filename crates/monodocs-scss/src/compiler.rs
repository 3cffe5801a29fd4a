//! The stylesheet compilation pipeline.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::deps::DependencyDirs;
use crate::error::{CompileError, ScssError};
use crate::globals::extract_globals;
use crate::naming::{is_module_file, ScopedNames};
use crate::scopes::{add_scopes, strip_global_markers};
use crate::tokens::{TokenTransformer, Tokens};
use crate::urls::{rewrite_urls, MappedFile, UrlMapper};

/// Hook receiving CSS (or masked SCSS) and the stylesheet path.
pub type CssHook = Arc<dyn Fn(&str, &Path) -> String + Send + Sync>;

/// Formatting of the CSS produced by Sass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    #[default]
    Expanded,
    Compressed,
}

impl From<OutputStyle> for grass::OutputStyle {
    fn from(style: OutputStyle) -> Self {
        match style {
            OutputStyle::Expanded => grass::OutputStyle::Expanded,
            OutputStyle::Compressed => grass::OutputStyle::Compressed,
        }
    }
}

/// Options for [`ScssCompiler`].
#[derive(Clone)]
pub struct CompilerOptions {
    pub style: OutputStyle,

    /// Naming scheme for `*.module.*` stylesheets
    pub scoped_names: ScopedNames,

    /// Runs on the masked source before Sass
    pub preprocess_css: Option<CssHook>,

    /// Runs on the final CSS
    pub process_css: Option<CssHook>,

    /// Rewrites `url(...)` references when set
    pub map_file_url: Option<Arc<dyn UrlMapper>>,

    /// Token key transform, camelCase by default
    pub transform_token: Option<TokenTransformer>,

    /// Searched for `~` urls and used as Sass load paths
    pub dependency_dirs: DependencyDirs,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            style: OutputStyle::Expanded,
            scoped_names: ScopedNames::ContentHash,
            preprocess_css: None,
            process_css: None,
            map_file_url: None,
            transform_token: Some(TokenTransformer::camel_case()),
            dependency_dirs: DependencyDirs::default(),
        }
    }
}

impl fmt::Debug for CompilerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilerOptions")
            .field("style", &self.style)
            .field("scoped_names", &self.scoped_names)
            .field("preprocess_css", &self.preprocess_css.is_some())
            .field("process_css", &self.process_css.is_some())
            .field("map_file_url", &self.map_file_url.is_some())
            .field("transform_token", &self.transform_token)
            .field("dependency_dirs", &self.dependency_dirs)
            .finish()
    }
}

/// Output of compiling one stylesheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledResult {
    pub css: String,
    pub tokens: Tokens,
    pub file_mappings: Vec<MappedFile>,
}

/// Compiles SCSS/CSS stylesheets, scoping `*.module.*` files.
///
/// Holds no per-file state, so one compiler can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct ScssCompiler {
    options: CompilerOptions,
}

impl ScssCompiler {
    pub fn new(options: CompilerOptions) -> Self {
        Self { options }
    }

    /// Compile `code`, the contents of `filename`.
    pub fn compile(&self, code: &str, filename: &Path) -> Result<CompiledResult, CompileError> {
        let filename = std::path::absolute(filename).unwrap_or_else(|_| filename.to_path_buf());

        self.compile_inner(code, &filename)
            .map_err(|source| CompileError::new(filename, source))
    }

    fn compile_inner(&self, code: &str, filename: &Path) -> Result<CompiledResult, ScssError> {
        let dir = filename.parent().unwrap_or(Path::new("")).to_path_buf();

        let extracted = extract_globals(code)?;
        let masked = match &self.options.preprocess_css {
            Some(hook) => hook(&extracted.code, filename),
            None => extracted.code.clone(),
        };

        let mut css = self.compile_sass(&masked, &dir)?;
        let mut tokens = Tokens::new();

        if is_module_file(filename) {
            if let Some(generate) = self.options.scoped_names.generator(code, filename) {
                let exports = add_scopes(&css, &*generate);
                tokens = exports.tokens();
                css = exports.css;

                if let Some(transformer) = &self.options.transform_token {
                    tokens = transformer.apply(&tokens);
                }
            }
        } else {
            css = strip_global_markers(&css);
        }

        let mut css = extracted.reinsert(&css);
        let mut file_mappings = Vec::new();

        if let Some(mapper) = &self.options.map_file_url {
            let (rewritten, mappings) =
                rewrite_urls(&css, &dir, &self.options.dependency_dirs, mapper.as_ref())?;
            css = rewritten;
            file_mappings = mappings;
        }

        if let Some(hook) = &self.options.process_css {
            css = hook(&css, filename);
        }

        tracing::debug!(
            "Compiled {} ({} tokens, {} assets)",
            filename.display(),
            tokens.len(),
            file_mappings.len()
        );

        Ok(CompiledResult {
            css,
            tokens,
            file_mappings,
        })
    }

    fn compile_sass(&self, code: &str, dir: &Path) -> Result<String, ScssError> {
        let mut load_paths: Vec<PathBuf> = vec![dir.to_path_buf()];
        load_paths.extend(self.options.dependency_dirs.dirs().iter().cloned());

        let options = grass::Options::default()
            .load_paths(&load_paths)
            .style(self.options.style.into())
            .allows_charset(false);

        grass::from_string(code.to_string(), &options).map_err(|e| ScssError::Sass(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::io;
    use tempfile::tempdir;

    use crate::naming::{encode_base62, hash_str};

    fn compile(source: &str, filename: &str) -> Result<CompiledResult, CompileError> {
        ScssCompiler::default().compile(source, Path::new(filename))
    }

    #[test]
    fn scopes_module_classes_with_content_hash() {
        let source = ".foo{color:red}.foo-bar{color:green}";
        let result = compile(source, "/site/basic.module.scss").unwrap();

        assert_eq!(encode_base62(hash_str(source)), "16ysnv");
        assert_eq!(result.tokens["foo"], "foo_16ysnv");
        assert_eq!(result.tokens["foo-bar"], "foo-bar_16ysnv");
        assert_eq!(result.tokens["fooBar"], "foo-bar_16ysnv");
        assert!(result.css.contains(".foo_16ysnv {"));
        assert!(result.css.contains(".foo-bar_16ysnv {"));
        assert!(!result.css.contains(".foo {"));
    }

    #[test]
    fn compiles_nested_scss_before_scoping() {
        let source = "$accent: red;\n.card {\n  color: $accent;\n  .title { font-weight: bold; }\n}\n";
        let result = compile(source, "/site/card.module.scss").unwrap();
        let suffix = encode_base62(hash_str(source));

        assert!(result
            .css
            .contains(&format!(".card_{s} .title_{s} {{", s = suffix)));
        assert!(result.css.contains("color: red;"));
    }

    #[test]
    fn leaves_global_stylesheets_unscoped() {
        let source = ".foo { color: red; }\n@-global-keyframes spin { to { opacity: 1; } }\n";
        let result = compile(source, "/site/global.scss").unwrap();

        assert!(result.css.contains(".foo {"));
        assert!(result.css.contains("@keyframes spin"));
        assert!(!result.css.contains("-global-"));
        assert!(result.tokens.is_empty());
    }

    #[test]
    fn keeps_global_selectors_verbatim() {
        let source = ".foo :global(.foo .bar) {\n  content: \"nested\";\n}\n:global(.baz) {\n  content: \"plain\";\n}\n";
        let result = compile(source, "/site/global.module.scss").unwrap();
        let suffix = encode_base62(hash_str(source));

        assert!(result
            .css
            .contains(&format!(".foo_{} .foo .bar {{", suffix)));
        assert!(result.css.contains(".baz {"));
        assert!(!result.css.contains("__GLOBAL_REPLACEMENT"));
        assert_eq!(result.tokens.keys().collect::<Vec<_>>(), vec!["foo"]);
    }

    #[test]
    fn renames_keyframes_and_their_animations() {
        let source = "@keyframes yolo {\n  0% { opacity: 0; }\n  100% { opacity: 1; }\n}\n.foo {\n  animation: yolo 5s infinite;\n}\n";
        let result = compile(source, "/site/keyframes.module.scss").unwrap();
        let suffix = encode_base62(hash_str(source));

        assert_eq!(result.tokens["yolo"], format!("yolo_{}", suffix));
        assert!(result
            .css
            .contains(&format!("@keyframes yolo_{}", suffix)));
        assert!(result
            .css
            .contains(&format!("animation: yolo_{} 5s infinite;", suffix)));
    }

    #[test]
    fn id_only_module_has_no_tokens() {
        let result = compile("#foo{color:red}", "/site/non-class.module.scss").unwrap();

        assert!(result.tokens.is_empty());
        assert!(result.css.contains("#foo {"));
    }

    #[test]
    fn disabled_scoping_passes_selectors_through() {
        let compiler = ScssCompiler::new(CompilerOptions {
            scoped_names: ScopedNames::Disabled,
            ..Default::default()
        });

        let result = compiler
            .compile(".foo { color: red; }", Path::new("/site/a.module.scss"))
            .unwrap();

        assert!(result.css.contains(".foo {"));
        assert!(result.tokens.is_empty());
    }

    #[test]
    fn applies_only_token_transform() {
        let compiler = ScssCompiler::new(CompilerOptions {
            transform_token: Some(TokenTransformer::camel_case().only(true)),
            ..Default::default()
        });

        let result = compiler
            .compile(".foo-bar { color: red; }", Path::new("/site/a.module.scss"))
            .unwrap();

        assert_eq!(result.tokens.keys().collect::<Vec<_>>(), vec!["fooBar"]);
    }

    #[test]
    fn runs_hooks_around_sass() {
        let compiler = ScssCompiler::new(CompilerOptions {
            preprocess_css: Some(Arc::new(|code: &str, _: &Path| {
                format!("$brand: blue;\n{}", code)
            })),
            process_css: Some(Arc::new(|css: &str, path: &Path| {
                format!(
                    "/* {} */\n{}",
                    path.file_name().and_then(|n| n.to_str()).unwrap_or(""),
                    css
                )
            })),
            ..Default::default()
        });

        let result = compiler
            .compile(".a { color: $brand; }", Path::new("/site/theme.scss"))
            .unwrap();

        assert!(result.css.starts_with("/* theme.scss */\n"));
        assert!(result.css.contains("color: blue;"));
    }

    #[test]
    fn maps_file_urls() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("asset-1.png"), "one").unwrap();
        fs::write(temp.path().join("asset-2.png"), "two").unwrap();

        let mapper = |source: &Path| -> io::Result<String> {
            let name = source.file_name().and_then(|n| n.to_str()).unwrap_or("");
            Ok(format!("/assets/{}", name))
        };
        let compiler = ScssCompiler::new(CompilerOptions {
            map_file_url: Some(Arc::new(mapper)),
            ..Default::default()
        });

        let source = ".foo { background: url(\"./asset-1.png\"); }\n.bar { background: url(\"./asset-2.png\"); }\n";
        let result = compiler
            .compile(source, &temp.path().join("files.module.scss"))
            .unwrap();

        assert!(result.css.contains("url(\"/assets/asset-1.png\")"));
        assert!(result.css.contains("url(\"/assets/asset-2.png\")"));
        assert_eq!(
            result.file_mappings,
            vec![
                MappedFile {
                    source: temp.path().join("asset-1.png"),
                    destination: "/assets/asset-1.png".to_string(),
                },
                MappedFile {
                    source: temp.path().join("asset-2.png"),
                    destination: "/assets/asset-2.png".to_string(),
                },
            ]
        );
    }

    #[test]
    fn resolves_imports_next_to_the_stylesheet() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("_colors.scss"), "$primary: #336699;\n").unwrap();

        let result = ScssCompiler::default()
            .compile(
                "@import \"colors\";\n.button { color: $primary; }\n",
                &temp.path().join("button.module.scss"),
            )
            .unwrap();

        assert!(result.css.contains("color: #336699;"));
        assert!(result.tokens.contains_key("button"));
    }

    #[test]
    fn resolves_imports_from_dependency_dirs() {
        let temp = tempdir().unwrap();
        let deps_dir = temp.path().join("node_modules");
        fs::create_dir_all(deps_dir.join("pkg")).unwrap();
        fs::write(deps_dir.join("pkg/_theme.scss"), "$brand: #cc3366;\n").unwrap();
        let styles = temp.path().join("styles");
        fs::create_dir_all(&styles).unwrap();

        let compiler = ScssCompiler::new(CompilerOptions {
            dependency_dirs: DependencyDirs::new(vec![deps_dir]),
            ..Default::default()
        });
        let result = compiler
            .compile(
                "@import \"pkg/theme\";\n.badge { color: $brand; }\n",
                &styles.join("badge.module.scss"),
            )
            .unwrap();

        assert!(result.css.contains("color: #cc3366;"));
        assert!(result.tokens.contains_key("badge"));
    }

    #[test]
    fn maps_tilde_urls_through_dependency_dirs() {
        let temp = tempdir().unwrap();
        let deps_dir = temp.path().join("node_modules");
        fs::create_dir_all(deps_dir.join("pkg")).unwrap();
        fs::write(deps_dir.join("pkg/x.png"), "png").unwrap();
        let styles = temp.path().join("styles");
        fs::create_dir_all(&styles).unwrap();

        let mapper = |source: &Path| -> io::Result<String> {
            let name = source.file_name().and_then(|n| n.to_str()).unwrap_or("");
            Ok(format!("/assets/{}", name))
        };
        let compiler = ScssCompiler::new(CompilerOptions {
            map_file_url: Some(Arc::new(mapper)),
            dependency_dirs: DependencyDirs::new(vec![deps_dir.clone()]),
            ..Default::default()
        });
        let result = compiler
            .compile(
                ".logo { background: url(\"~pkg/x.png\"); }\n",
                &styles.join("logo.module.scss"),
            )
            .unwrap();

        assert!(result.css.contains("url(\"/assets/x.png\")"));
        assert_eq!(
            result.file_mappings,
            vec![MappedFile {
                source: deps_dir.join("pkg/x.png"),
                destination: "/assets/x.png".to_string(),
            }]
        );
    }

    #[test]
    fn wraps_sass_errors_with_filename() {
        let err = compile(".a { color: ; ", "/site/broken.module.scss").unwrap_err();

        assert_eq!(err.filename, PathBuf::from("/site/broken.module.scss"));
        assert!(matches!(err.source, ScssError::Sass(_)));
        assert!(err
            .to_string()
            .starts_with("Error compiling /site/broken.module.scss: "));
    }

    #[test]
    fn wraps_malformed_global_with_filename() {
        let err = compile(":global(.a { color: red; }", "/site/bad.module.scss").unwrap_err();

        assert_eq!(
            err.to_string(),
            "Error compiling /site/bad.module.scss: Could not find ending bracket for :global( at start 0"
        );
    }

    #[test]
    fn wraps_missing_asset_with_filename() {
        let temp = tempdir().unwrap();
        let compiler = ScssCompiler::new(CompilerOptions {
            map_file_url: Some(Arc::new(|_: &Path| -> io::Result<String> {
                Ok(String::new())
            })),
            ..Default::default()
        });

        let err = compiler
            .compile(
                ".a { background: url(\"./nope.png\"); }",
                &temp.path().join("a.module.scss"),
            )
            .unwrap_err();

        assert!(matches!(err.source, ScssError::UnresolvableUrl { .. }));
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let result = CompiledResult {
            css: ".a{}".to_string(),
            tokens: Tokens::from([("a".to_string(), "a_1".to_string())]),
            file_mappings: vec![],
        };

        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            r#"{"css":".a{}","tokens":{"a":"a_1"},"fileMappings":[]}"#
        );
    }
}
