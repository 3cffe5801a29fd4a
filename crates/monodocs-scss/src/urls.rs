//! Rewriting of `url(...)` references to mapped asset destinations.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::deps::DependencyDirs;
use crate::error::ScssError;

/// An asset referenced by a stylesheet and where it was mapped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedFile {
    /// Resolved absolute path of the asset
    pub source: PathBuf,

    /// Reference written into the CSS
    pub destination: String,
}

/// Maps a resolved asset path to the reference written into the CSS, typically
/// copying the file somewhere public on the way.
pub trait UrlMapper: Send + Sync {
    fn map_url(&self, source: &Path) -> io::Result<String>;
}

impl<F> UrlMapper for F
where
    F: Fn(&Path) -> io::Result<String> + Send + Sync,
{
    fn map_url(&self, source: &Path) -> io::Result<String> {
        self(source)
    }
}

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"url\(([^)]+)\)").expect("Invalid url regex"));

static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]+:").expect("Invalid scheme regex"));

/// Rewrite every local `url(...)` in `css` through `mapper`.
///
/// `dir` is the directory of the stylesheet; `~`-prefixed references are looked
/// up in `deps` instead. Each occurrence yields one [`MappedFile`].
pub fn rewrite_urls(
    css: &str,
    dir: &Path,
    deps: &DependencyDirs,
    mapper: &dyn UrlMapper,
) -> Result<(String, Vec<MappedFile>), ScssError> {
    let mut out = String::with_capacity(css.len());
    let mut mappings = Vec::new();
    let mut copied = 0;

    for caps in URL_RE.captures_iter(css) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        let reference = parse_url_literal(inner.as_str())?;
        if is_external(&reference) {
            continue;
        }

        // Keep `?query` / `#fragment` suffixes (font hacks, svg sprites) on the output.
        let split = reference.find(['?', '#']).unwrap_or(reference.len());
        let (file, suffix) = reference.split_at(split);

        let source = locate(dir, file, deps)?;
        let destination = mapper
            .map_url(&source)
            .map_err(|e| ScssError::AssetMapping {
                path: source.display().to_string(),
                source: e,
            })?;

        tracing::debug!("Mapped {} to {}", source.display(), destination);

        out.push_str(&css[copied..whole.start()]);
        out.push_str("url(");
        out.push_str(&json_string(&format!("{}{}", destination, suffix)));
        out.push(')');
        copied = whole.end();

        mappings.push(MappedFile {
            source,
            destination,
        });
    }

    out.push_str(&css[copied..]);
    Ok((out, mappings))
}

/// The path inside `url(...)`. Quoted forms are read as JSON strings, with
/// single quotes treated as double quotes.
fn parse_url_literal(raw: &str) -> Result<String, ScssError> {
    let raw = raw.trim();
    if !(raw.starts_with('"') || raw.starts_with('\'')) {
        return Ok(raw.to_string());
    }

    serde_json::from_str::<String>(&raw.replace('\'', "\"")).map_err(|e| ScssError::InvalidUrl {
        literal: raw.to_string(),
        message: e.to_string(),
    })
}

fn is_external(reference: &str) -> bool {
    reference.is_empty()
        || reference.starts_with("data:")
        || reference.starts_with("//")
        || reference.starts_with('#')
        || SCHEME_RE.is_match(reference)
}

/// Resolve `file` relative to `dir`, or through `deps` for `~` references.
fn locate(dir: &Path, file: &str, deps: &DependencyDirs) -> Result<PathBuf, ScssError> {
    let source = match file.strip_prefix('~') {
        Some(package_path) => deps.find(package_path).map(|p| normalize(&p)),
        None => Some(normalize(&dir.join(file))),
    };

    source
        .filter(|path| path.exists())
        .ok_or_else(|| ScssError::UnresolvableUrl {
            file: file.to_string(),
            dir: dir.display().to_string(),
        })
}

/// Lexically resolve `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push(component);
                }
            }
            other => result.push(other),
        }
    }
    result
}

fn json_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}
