//! Masking of `:global(...)` selectors.
//!
//! The contents of every `:global(...)` are swapped for an indexed placeholder
//! before Sass and scoping run, and restored verbatim afterwards. The placeholder
//! is an attribute selector, so Sass passes it through untouched and the scope
//! rewriter never looks inside it.

use crate::error::ScssError;

const GLOBAL_START: &str = ":global(";

fn placeholder(index: usize) -> String {
    format!("[__GLOBAL_REPLACEMENT_{}__]", index)
}

/// Source code with its `:global(...)` regions replaced by placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedGlobals {
    /// Masked source code
    pub code: String,

    /// Captured contents, indexed by placeholder number
    values: Vec<String>,
}

/// A single `:global(...)` occurrence.
struct GlobalMatch {
    /// Offset of the `:global(` marker
    start: usize,
    /// Offset just past the closing paren
    end: usize,
    /// Offset range of the captured content
    value: (usize, usize),
}

fn find_global(code: &str, from: usize) -> Result<Option<GlobalMatch>, ScssError> {
    let Some(found) = code.get(from..).and_then(|rest| rest.find(GLOBAL_START)) else {
        return Ok(None);
    };

    let start = from + found;
    let content_start = start + GLOBAL_START.len();
    let mut open = 1usize;

    for (offset, byte) in code.as_bytes()[content_start..].iter().enumerate() {
        match byte {
            b'(' => open += 1,
            b')' => {
                open -= 1;
                if open == 0 {
                    let close = content_start + offset;
                    return Ok(Some(GlobalMatch {
                        start,
                        end: close + 1,
                        value: (content_start, close),
                    }));
                }
            }
            _ => {}
        }
    }

    Err(ScssError::MalformedGlobal { start })
}

/// Replace every `:global(...)` in `code` with a placeholder.
pub fn extract_globals(code: &str) -> Result<ExtractedGlobals, ScssError> {
    let mut values = Vec::new();
    let mut masked = String::with_capacity(code.len());
    let mut remaining_from = 0;

    let mut next = find_global(code, 0)?;
    while let Some(found) = next {
        values.push(code[found.value.0..found.value.1].to_string());
        masked.push_str(&code[remaining_from..found.start]);
        masked.push_str(&placeholder(values.len() - 1));
        remaining_from = found.end;
        next = find_global(code, found.end)?;
    }
    masked.push_str(&code[remaining_from..]);

    if !values.is_empty() {
        tracing::trace!("Masked {} :global() selectors", values.len());
    }

    Ok(ExtractedGlobals {
        code: masked,
        values,
    })
}

impl ExtractedGlobals {
    /// Number of captured `:global(...)` regions.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Restore the captured contents wherever a placeholder appears in `css`.
    ///
    /// Placeholders may appear any number of times, since Sass can duplicate a
    /// selector into several generated rules.
    pub fn reinsert(&self, css: &str) -> String {
        let mut css = css.to_string();
        for (index, value) in self.values.iter().enumerate() {
            css = css.replace(&placeholder(index), value);
        }
        css
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn masks_global_selectors() {
        let extracted = extract_globals(":global(.foo) .bar {}").unwrap();

        assert_eq!(extracted.code, "[__GLOBAL_REPLACEMENT_0__] .bar {}");
        assert_eq!(extracted.len(), 1);
    }

    #[test]
    fn keeps_nested_parens_inside_global() {
        let source = ".foo :global(.foo:not(.bar)) { color: red; }";
        let extracted = extract_globals(source).unwrap();

        assert_eq!(
            extracted.code,
            ".foo [__GLOBAL_REPLACEMENT_0__] { color: red; }"
        );
        assert_eq!(extracted.values, vec![".foo:not(.bar)".to_string()]);
    }

    #[test]
    fn indexes_back_to_back_globals_independently() {
        let extracted = extract_globals(":global(.a):global(.b),:global(.c) {}").unwrap();

        assert_eq!(
            extracted.code,
            "[__GLOBAL_REPLACEMENT_0__][__GLOBAL_REPLACEMENT_1__],[__GLOBAL_REPLACEMENT_2__] {}"
        );
        assert_eq!(extracted.len(), 3);
    }

    #[test]
    fn round_trips_without_rewriting() {
        let source = r#":global(.foo),
.foo :global(.foo .bar) .baz,
.qux:global(.a_value).bar {
    content: "keep";
}"#;
        let extracted = extract_globals(source).unwrap();

        assert_eq!(extracted.reinsert(&extracted.code), source);
    }

    #[test]
    fn reinserts_duplicated_placeholders() {
        let extracted = extract_globals(":global(.theme) .a {}").unwrap();
        let duplicated = "[__GLOBAL_REPLACEMENT_0__] .a, [__GLOBAL_REPLACEMENT_0__] .b {}";

        assert_eq!(extracted.reinsert(duplicated), ".theme .a, .theme .b {}");
    }

    #[test]
    fn ignores_code_without_globals() {
        let extracted = extract_globals(".foo { color: red; }").unwrap();

        assert!(extracted.is_empty());
        assert_eq!(extracted.code, ".foo { color: red; }");
        assert_eq!(extracted.reinsert("anything"), "anything");
    }

    #[test]
    fn errors_on_unterminated_global() {
        let result = extract_globals(".a {}\n:global(.foo { color: red; }");

        assert!(matches!(
            result,
            Err(ScssError::MalformedGlobal { start: 6 })
        ));
    }

    #[test]
    fn handles_multibyte_text_after_global() {
        let extracted = extract_globals(":global(.a)é :global(.b) {}").unwrap();

        assert_eq!(
            extracted.code,
            "[__GLOBAL_REPLACEMENT_0__]é [__GLOBAL_REPLACEMENT_1__] {}"
        );
    }
}
