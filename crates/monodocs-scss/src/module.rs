//! Stylesheet and asset modules consumed by the page build.
//!
//! A compiled stylesheet becomes a CommonJS module whose enumerable properties
//! are the tokens. The CSS text and the file mappings ride along as the
//! reserved, non-enumerable `__CSS` and `__FILES` properties.

use serde::Serialize;

use crate::compiler::CompiledResult;
use crate::tokens::Tokens;
use crate::urls::MappedFile;

/// JSON shape of a stylesheet module: tokens plus `__CSS` and `__FILES`.
#[derive(Debug, Serialize)]
pub struct CssModule<'a> {
    #[serde(flatten)]
    pub tokens: &'a Tokens,

    #[serde(rename = "__CSS")]
    pub css: &'a str,

    #[serde(rename = "__FILES")]
    pub files: &'a [MappedFile],
}

impl<'a> From<&'a CompiledResult> for CssModule<'a> {
    fn from(result: &'a CompiledResult) -> Self {
        Self {
            tokens: &result.tokens,
            css: &result.css,
            files: &result.file_mappings,
        }
    }
}

/// A frozen, hidden property.
#[derive(Serialize)]
struct PropertyDescriptor<T: Serialize> {
    enumerable: bool,
    configurable: bool,
    writable: bool,
    value: T,
}

impl<T: Serialize> PropertyDescriptor<T> {
    fn hidden(value: T) -> Self {
        Self {
            enumerable: false,
            configurable: false,
            writable: false,
            value,
        }
    }
}

/// Render `result` as CommonJS module source.
pub fn render_css_module(result: &CompiledResult) -> Result<String, serde_json::Error> {
    let tokens = serde_json::to_string(&result.tokens)?;
    let css = serde_json::to_string(&PropertyDescriptor::hidden(&result.css))?;
    let files = serde_json::to_string(&PropertyDescriptor::hidden(&result.file_mappings))?;

    Ok(format!(
        "module.exports = {};\nObject.defineProperty(module.exports, \"__CSS\", {});\nObject.defineProperty(module.exports, \"__FILES\", {});\n",
        tokens, css, files
    ))
}

/// Render a module whose export is the public url of a copied asset.
pub fn render_asset_module(url: &str) -> Result<String, serde_json::Error> {
    Ok(format!("module.exports = {};\n", serde_json::to_string(url)?))
}
