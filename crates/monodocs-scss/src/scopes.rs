//! Local scoping of class and keyframes names.

use std::collections::HashMap;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::{Captures, Regex};

use crate::scan::{
    at_rule_name, find_block_end, ident_end, skip_comment, skip_string, skip_trivia,
    starts_ident, unprefixed, walk, RuleVisitor,
};
use crate::tokens::Tokens;

const GLOBAL_MARKER: &str = "-global-";

/// CSS with scoped names, plus the local → scoped mappings that were applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopedExports {
    pub css: String,

    /// Renamed `@keyframes`, in order of first appearance
    pub keyframes: IndexMap<String, String>,

    /// Renamed classes, in order of first appearance
    pub classes: IndexMap<String, String>,
}

impl ScopedExports {
    /// Merge keyframes and classes into one token map. Classes win on a name clash.
    pub fn tokens(&self) -> Tokens {
        let mut tokens = self.keyframes.clone();
        for (name, scoped) in &self.classes {
            tokens.insert(name.clone(), scoped.clone());
        }
        tokens
    }
}

/// Rewrite class selectors and keyframes names in `css` to scoped names, then
/// point `animation` / `animation-name` declarations at the renamed keyframes.
pub fn add_scopes(css: &str, generate: &dyn Fn(&str) -> String) -> ScopedExports {
    let mut scoper = Scoper::new(generate);
    let css = walk(css, &mut scoper);

    replace_animations(ScopedExports {
        css,
        keyframes: scoper.keyframes,
        classes: scoper.classes,
    })
}

/// Turn `@-global-` marked at-rules into their plain form, for stylesheets that
/// are not scoped at all.
pub fn strip_global_markers(css: &str) -> String {
    static RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"@-global-([A-Za-z][A-Za-z0-9-]*)").expect("Invalid global marker regex")
    });

    RE.replace_all(css, |caps: &Captures| format!("@{}", unmark(&caps[1])))
        .into_owned()
}

/// At-rule name with the `-global-` marker removed: `keyframes` stays as is,
/// `webkit-keyframes` gets its vendor dash back.
fn unmark(rest: &str) -> String {
    if rest.ends_with("-keyframes") {
        format!("-{}", rest)
    } else {
        rest.to_string()
    }
}

struct Scoper<'a> {
    generate: &'a dyn Fn(&str) -> String,
    /// Local name → scoped name, shared by classes and keyframes
    names: HashMap<String, String>,
    /// Scoped name → local name, to spot collisions from custom generators
    owners: HashMap<String, String>,
    keyframes: IndexMap<String, String>,
    classes: IndexMap<String, String>,
}

impl<'a> Scoper<'a> {
    fn new(generate: &'a dyn Fn(&str) -> String) -> Self {
        Self {
            generate,
            names: HashMap::new(),
            owners: HashMap::new(),
            keyframes: IndexMap::new(),
            classes: IndexMap::new(),
        }
    }

    fn scoped(&mut self, local: &str) -> String {
        if let Some(scoped) = self.names.get(local) {
            return scoped.clone();
        }

        let scoped = (self.generate)(local);
        if let Some(previous) = self.owners.insert(scoped.clone(), local.to_string()) {
            tracing::warn!(
                "Scoped name {} generated for both {} and {}",
                scoped,
                previous,
                local
            );
        }
        self.names.insert(local.to_string(), scoped.clone());
        scoped
    }
}

impl RuleVisitor for Scoper<'_> {
    fn selector(&mut self, prelude: &str, out: &mut String) {
        let bytes = prelude.as_bytes();
        let mut pos = 0;
        let mut copied = 0;

        while pos < bytes.len() {
            if let Some(next) = skip_comment(bytes, pos) {
                pos = next;
                continue;
            }

            match bytes[pos] {
                b'"' | b'\'' => pos = skip_string(bytes, pos),
                b'[' => pos = skip_attribute(bytes, pos),
                b'\\' => pos += 2,
                b'.' if starts_ident(bytes, pos + 1) => {
                    let end = ident_end(bytes, pos + 1);
                    let local = &prelude[pos + 1..end];
                    let scoped = self.scoped(local);

                    out.push_str(&prelude[copied..=pos]);
                    out.push_str(&scoped);
                    self.classes.insert(local.to_string(), scoped);

                    copied = end;
                    pos = end;
                }
                _ => pos += 1,
            }
        }

        out.push_str(&prelude[copied..]);
    }

    fn keyframes(&mut self, prelude: &str, out: &mut String) {
        let Some(at_name) = at_rule_name(prelude) else {
            out.push_str(prelude);
            return;
        };
        let rest = &prelude[1 + at_name.len()..];

        if let Some(marked) = at_name.strip_prefix(GLOBAL_MARKER) {
            out.push('@');
            out.push_str(&unmark(marked));
            out.push_str(rest);
            return;
        }

        let name = rest.trim();
        let bytes = name.as_bytes();
        if !starts_ident(bytes, 0) || ident_end(bytes, 0) != bytes.len() {
            // Quoted or otherwise unusual names are left alone.
            out.push_str(prelude);
            return;
        }

        let name_start = prelude.len() - rest.trim_start().len();
        let name_end = name_start + name.len();
        let scoped = self.scoped(name);

        out.push_str(&prelude[..name_start]);
        out.push_str(&scoped);
        out.push_str(&prelude[name_end..]);
        self.keyframes.insert(name.to_string(), scoped);
    }
}

/// Offset just past the `]` closing the attribute selector at `pos`.
fn skip_attribute(bytes: &[u8], mut pos: usize) -> usize {
    pos += 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b'"' | b'\'' => pos = skip_string(bytes, pos),
            b']' => return pos + 1,
            _ => pos += 1,
        }
    }
    bytes.len()
}

fn replace_animations(exports: ScopedExports) -> ScopedExports {
    if exports.keyframes.is_empty() {
        return exports;
    }

    let mut renamer = AnimationRenamer {
        keyframes: &exports.keyframes,
    };
    let css = walk(&exports.css, &mut renamer);

    ScopedExports { css, ..exports }
}

/// Renames keyframes references inside `animation` and `animation-name` values.
struct AnimationRenamer<'a> {
    keyframes: &'a IndexMap<String, String>,
}

impl AnimationRenamer<'_> {
    fn rename_value(&self, value: &str, out: &mut String) {
        let bytes = value.as_bytes();
        let mut pos = 0;
        let mut copied = 0;

        while pos < bytes.len() {
            if let Some(next) = skip_comment(bytes, pos) {
                pos = next;
                continue;
            }

            match bytes[pos] {
                b'"' | b'\'' => pos = skip_string(bytes, pos),
                b'0'..=b'9' | b'.' => {
                    // Numbers carry their unit along: `5s`, `1.5ms`, `30%`.
                    pos += 1;
                    while pos < bytes.len()
                        && (bytes[pos].is_ascii_alphanumeric()
                            || bytes[pos] == b'.'
                            || bytes[pos] == b'%')
                    {
                        pos += 1;
                    }
                }
                _ if starts_ident(bytes, pos) => {
                    let end = ident_end(bytes, pos);
                    if let Some(scoped) = self.keyframes.get(&value[pos..end]) {
                        out.push_str(&value[copied..pos]);
                        out.push_str(scoped);
                        copied = end;
                    }
                    pos = end;
                }
                _ => pos += 1,
            }
        }

        out.push_str(&value[copied..]);
    }
}

impl RuleVisitor for AnimationRenamer<'_> {
    fn declarations(&mut self, block: &str, out: &mut String) {
        let bytes = block.as_bytes();
        let mut pos = 0;

        while pos < bytes.len() {
            let start = pos;
            pos = skip_trivia(bytes, pos);
            out.push_str(&block[start..pos]);
            if pos >= bytes.len() {
                break;
            }

            if starts_ident(bytes, pos) {
                let property_end = ident_end(bytes, pos);
                let colon = skip_trivia(bytes, property_end);
                let value_end = find_value_end(bytes, colon + 1);

                if bytes.get(colon) == Some(&b':')
                    && bytes.get(value_end) != Some(&b'{')
                    && is_animation_property(&block[pos..property_end])
                {
                    out.push_str(&block[pos..=colon]);
                    self.rename_value(&block[colon + 1..value_end], out);
                    pos = value_end;
                    continue;
                }
            }

            let end = statement_end(bytes, pos);
            out.push_str(&block[pos..end]);
            pos = end;
        }
    }
}

fn is_animation_property(property: &str) -> bool {
    let property = property.to_ascii_lowercase();
    matches!(unprefixed(&property), "animation" | "animation-name")
}

/// Offset of the `;`, `{` or `}` ending a declaration value at `pos`.
fn find_value_end(bytes: &[u8], mut pos: usize) -> usize {
    let mut parens = 0usize;
    while pos < bytes.len() {
        if let Some(next) = skip_comment(bytes, pos) {
            pos = next;
            continue;
        }
        match bytes[pos] {
            b'"' | b'\'' => {
                pos = skip_string(bytes, pos);
                continue;
            }
            b'\\' => pos += 1,
            b'(' => parens += 1,
            b')' => parens = parens.saturating_sub(1),
            b';' | b'{' | b'}' if parens == 0 => return pos,
            _ => {}
        }
        pos += 1;
    }
    bytes.len()
}

/// Offset just past the declaration or nested rule starting at `pos`.
fn statement_end(bytes: &[u8], pos: usize) -> usize {
    let end = find_value_end(bytes, pos);
    match bytes.get(end) {
        Some(b'{') => (find_block_end(bytes, end + 1) + 1).min(bytes.len()),
        Some(_) => end + 1,
        None => bytes.len(),
    }
}
