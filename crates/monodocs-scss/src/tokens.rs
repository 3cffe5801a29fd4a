//! Token key transformation.

use std::fmt;
use std::sync::{Arc, LazyLock};

use indexmap::IndexMap;
use regex::{Captures, Regex};

/// Exported names, original (or transformed) name → scoped name, in insertion order.
pub type Tokens = IndexMap<String, String>;

/// Renames token keys, e.g. `foo-bar` → `fooBar`.
#[derive(Clone)]
pub struct TokenTransformer {
    transform: Arc<dyn Fn(&str) -> String + Send + Sync>,

    /// Keep only the transformed keys
    pub only: bool,
}

impl fmt::Debug for TokenTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenTransformer")
            .field("only", &self.only)
            .finish_non_exhaustive()
    }
}

impl Default for TokenTransformer {
    fn default() -> Self {
        Self::camel_case()
    }
}

impl TokenTransformer {
    pub fn new<F>(transform: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self {
            transform: Arc::new(transform),
            only: false,
        }
    }

    /// Transformer producing camelCase keys.
    pub fn camel_case() -> Self {
        Self::new(camel_case)
    }

    pub fn only(mut self, only: bool) -> Self {
        self.only = only;
        self
    }

    pub fn transform_key(&self, key: &str) -> String {
        (self.transform)(key)
    }

    /// Apply the transform to every key of `tokens`.
    ///
    /// Unless `only` is set the original keys are kept and transformed keys are
    /// added after them. Later writes win when two keys transform alike.
    pub fn apply(&self, tokens: &Tokens) -> Tokens {
        let mut result = if self.only {
            Tokens::new()
        } else {
            tokens.clone()
        };

        for (key, value) in tokens {
            result.insert(self.transform_key(key), value.clone());
        }

        result
    }
}

/// Collapse `-`/`_` runs followed by a word character into the uppercased character.
pub fn camel_case(key: &str) -> String {
    static RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[-_]+([A-Za-z0-9_])").expect("Invalid camel case regex"));

    RE.replace_all(key, |caps: &Captures| caps[1].to_uppercase())
        .into_owned()
}
