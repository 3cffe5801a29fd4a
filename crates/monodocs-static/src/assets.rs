//! Asset pipeline: content-hashed asset copies and CSS minification.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use monodocs_scss::UrlMapper;
use sha2::{Digest, Sha256};

/// Copies assets into a public directory under content-hashed names.
///
/// `logo.png` becomes `<asset_dir>/logo-1a2b3c4d.png` and is referenced as
/// `<prefix>logo-1a2b3c4d.png`. Each source is copied once per copier.
#[derive(Debug)]
pub struct AssetCopier {
    asset_dir: PathBuf,
    prefix: String,
    cache: Mutex<HashMap<PathBuf, String>>,
}

impl AssetCopier {
    /// Create a copier, making sure `asset_dir` exists.
    pub fn new(asset_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> io::Result<Self> {
        let asset_dir = asset_dir.into();
        fs::create_dir_all(&asset_dir)?;

        Ok(Self {
            asset_dir,
            prefix: prefix.into(),
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Number of distinct assets copied so far.
    pub fn len(&self) -> usize {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy `source` and return its public reference.
    pub fn copy(&self, source: &Path) -> io::Result<String> {
        if let Some(destination) = self
            .cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(source)
        {
            return Ok(destination.clone());
        }

        let bytes = fs::read(source)?;
        let filename = hashed_filename(source, &bytes);
        fs::write(self.asset_dir.join(&filename), &bytes)?;

        let destination = format!("{}{}", self.prefix, filename);
        tracing::debug!("Copied asset {} to {}", source.display(), destination);

        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(source.to_path_buf(), destination.clone());

        Ok(destination)
    }
}

impl UrlMapper for AssetCopier {
    fn map_url(&self, source: &Path) -> io::Result<String> {
        self.copy(source)
    }
}

/// `<stem>-<first 8 hex chars of sha256><.ext>`
pub fn hashed_filename(source: &Path, bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = format!("{:x}", hasher.finalize());
    let hash = &digest[..8];

    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("asset");

    match source.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}-{}.{}", stem, hash, ext),
        None => format!("{}-{}", stem, hash),
    }
}

/// CSS post-processing utilities.
pub struct AssetPipeline;

impl AssetPipeline {
    /// Minify CSS using lightningcss.
    pub fn minify_css(css: &str) -> Result<String, String> {
        use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

        let stylesheet = StyleSheet::parse(css, ParserOptions::default())
            .map_err(|e| format!("CSS parse error: {}", e))?;

        let minified = stylesheet
            .to_css(PrinterOptions {
                minify: true,
                ..Default::default()
            })
            .map_err(|e| format!("CSS minify error: {}", e))?;

        Ok(minified.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn copies_with_content_hash() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("logo.png");
        fs::write(&source, "png bytes").unwrap();

        let copier = AssetCopier::new(temp.path().join("public/assets"), "/assets/").unwrap();
        let destination = copier.copy(&source).unwrap();

        let filename = hashed_filename(&source, b"png bytes");
        assert_eq!(destination, format!("/assets/{}", filename));
        assert!(filename.starts_with("logo-"));
        assert!(filename.ends_with(".png"));
        assert_eq!(filename.len(), "logo-".len() + 8 + ".png".len());
        assert_eq!(
            fs::read_to_string(temp.path().join("public/assets").join(&filename)).unwrap(),
            "png bytes"
        );
    }

    #[test]
    fn caches_by_source_path() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("a.svg");
        fs::write(&source, "<svg/>").unwrap();

        let copier = AssetCopier::new(temp.path().join("out"), "./").unwrap();
        let first = copier.copy(&source).unwrap();

        // A cached copy does not re-read the file.
        fs::write(&source, "<svg changed/>").unwrap();
        let second = copier.copy(&source).unwrap();

        assert_eq!(first, second);
        assert_eq!(copier.len(), 1);
    }

    #[test]
    fn identical_content_gets_identical_hash() {
        let a = hashed_filename(Path::new("/x/icon.svg"), b"same");
        let b = hashed_filename(Path::new("/y/icon.svg"), b"same");
        let c = hashed_filename(Path::new("/y/icon.svg"), b"different");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn errors_on_missing_source() {
        let temp = tempdir().unwrap();
        let copier = AssetCopier::new(temp.path().join("out"), "/").unwrap();

        assert!(copier.copy(&temp.path().join("missing.png")).is_err());
    }

    #[test]
    fn minifies_css() {
        let css = r#"
.button {
    background-color: blue;
    padding: 10px;
}
        "#;

        let minified = AssetPipeline::minify_css(css).unwrap();

        assert!(!minified.contains('\n'));
        assert!(minified.contains(".button"));
    }
}
