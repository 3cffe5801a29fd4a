//! Scoped name generation.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Maps a local class or keyframes name to its scoped name.
pub type ScopedNameGenerator = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Builds a [`ScopedNameGenerator`] for one stylesheet from its source and path.
pub type ScopedNameFactory = Arc<dyn Fn(&str, &Path) -> ScopedNameGenerator + Send + Sync>;

/// How local names in module stylesheets are scoped.
#[derive(Clone, Default)]
pub enum ScopedNames {
    /// Leave selectors untouched
    Disabled,

    /// `<name>_<base62 hash of the source>`
    #[default]
    ContentHash,

    /// Caller supplied naming scheme
    Custom(ScopedNameFactory),
}

impl fmt::Debug for ScopedNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("Disabled"),
            Self::ContentHash => f.write_str("ContentHash"),
            Self::Custom(_) => f.write_str("Custom(<factory>)"),
        }
    }
}

impl ScopedNames {
    /// Wrap a custom naming factory.
    pub fn custom<F>(factory: F) -> Self
    where
        F: Fn(&str, &Path) -> ScopedNameGenerator + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(factory))
    }

    /// Build the generator for one stylesheet.
    ///
    /// `code` must be the original source, before `:global` masking, so the
    /// content hash is stable for a given file.
    pub fn generator(&self, code: &str, filepath: &Path) -> Option<ScopedNameGenerator> {
        match self {
            Self::Disabled => None,
            Self::ContentHash => {
                let suffix = encode_base62(hash_str(code));
                Some(Box::new(move |name: &str| format!("{}_{}", name, suffix)))
            }
            Self::Custom(factory) => Some(factory(code, filepath)),
        }
    }
}

/// Whether `path` follows the `*.module.*` naming convention.
pub fn is_module_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.contains(".module."))
}

/// djb2 hash over the UTF-16 code units of `s`, last to first.
pub fn hash_str(s: &str) -> u32 {
    let units: Vec<u16> = s.encode_utf16().collect();
    units
        .iter()
        .rev()
        .fold(5381u32, |hash, &unit| hash.wrapping_mul(33) ^ u32::from(unit))
}

const BASE62: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Encode `value` with the `0-9a-zA-Z` alphabet.
pub fn encode_base62(mut value: u32) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE62[(value % 62) as usize]);
        value /= 62;
    }
    digits.reverse();

    String::from_utf8(digits).unwrap_or_default()
}
