//! A minimal CSS scanner for the flat output of the Sass compiler.
//!
//! Walks rule lists and hands selector preludes, keyframes preludes and
//! declaration blocks to a [`RuleVisitor`]. Comments and strings are copied
//! through untouched, so names inside them are never rewritten.

/// Callbacks for the pieces of a stylesheet that can be rewritten.
pub(crate) trait RuleVisitor {
    /// Selector list of a style rule, without the opening brace.
    fn selector(&mut self, prelude: &str, out: &mut String) {
        out.push_str(prelude);
    }

    /// Prelude of an `@keyframes` rule (or a prefixed variant).
    fn keyframes(&mut self, prelude: &str, out: &mut String) {
        out.push_str(prelude);
    }

    /// Body of a style rule, between its braces.
    fn declarations(&mut self, block: &str, out: &mut String) {
        out.push_str(block);
    }
}

/// At-rules whose body is another rule list.
const GROUPING_RULES: &[&str] = &[
    "media",
    "supports",
    "document",
    "layer",
    "container",
    "scope",
    "starting-style",
];

pub(crate) fn walk(css: &str, visitor: &mut dyn RuleVisitor) -> String {
    let mut out = String::with_capacity(css.len());
    let mut pos = 0;
    walk_rule_list(css, &mut pos, visitor, &mut out);
    // Unbalanced closing braces end a nested walk early; keep the rest.
    while pos < css.len() {
        out.push_str(&css[pos..pos + 1]);
        pos += 1;
        walk_rule_list(css, &mut pos, visitor, &mut out);
    }
    out
}

fn walk_rule_list(css: &str, pos: &mut usize, visitor: &mut dyn RuleVisitor, out: &mut String) {
    let bytes = css.as_bytes();

    loop {
        let start = *pos;
        *pos = skip_trivia(bytes, *pos);
        out.push_str(&css[start..*pos]);

        // A closing brace ends a group body, or is a stray one at the top level.
        if *pos >= bytes.len() || bytes[*pos] == b'}' {
            return;
        }

        let prelude_start = *pos;
        let prelude_end = find_prelude_end(bytes, prelude_start);
        let prelude = &css[prelude_start..prelude_end];
        *pos = prelude_end;

        match bytes.get(prelude_end) {
            Some(b'{') => {
                let body_start = prelude_end + 1;
                let body_end = find_block_end(bytes, body_start);
                let body = &css[body_start..body_end];

                match at_rule_name(prelude) {
                    Some(name) if is_keyframes(name) => {
                        visitor.keyframes(prelude, out);
                        out.push('{');
                        out.push_str(body);
                        *pos = body_end;
                    }
                    Some(name) if GROUPING_RULES.contains(&unprefixed(name)) => {
                        out.push_str(prelude);
                        out.push('{');
                        *pos = body_start;
                        walk_rule_list(css, pos, visitor, out);
                    }
                    Some(_) => {
                        out.push_str(prelude);
                        out.push('{');
                        out.push_str(body);
                        *pos = body_end;
                    }
                    None => {
                        visitor.selector(prelude, out);
                        out.push('{');
                        visitor.declarations(body, out);
                        *pos = body_end;
                    }
                }

                if *pos < bytes.len() {
                    out.push('}');
                    *pos += 1;
                }
            }
            Some(b';') => {
                out.push_str(prelude);
                out.push(';');
                *pos += 1;
            }
            _ => {
                // Closing brace or end of input after a stray prelude.
                out.push_str(prelude);
            }
        }
    }
}

/// Name of the at-rule starting `prelude`, without the `@`.
pub(crate) fn at_rule_name(prelude: &str) -> Option<&str> {
    let rest = prelude.strip_prefix('@')?;
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '(' || c == '{' || c == ';')
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Whether an at-rule name is `keyframes`, vendor prefixed or `-global-` marked.
pub(crate) fn is_keyframes(name: &str) -> bool {
    name == "keyframes" || (name.starts_with('-') && name.ends_with("-keyframes"))
}

/// Strip a leading `-vendor-` prefix.
pub(crate) fn unprefixed(name: &str) -> &str {
    if let Some(rest) = name.strip_prefix('-') {
        if let Some(dash) = rest.find('-') {
            return &rest[dash + 1..];
        }
    }
    name
}

/// Skip whitespace and comments.
pub(crate) fn skip_trivia(bytes: &[u8], mut pos: usize) -> usize {
    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        match skip_comment(bytes, pos) {
            Some(next) => pos = next,
            None => return pos,
        }
    }
}

/// If a comment starts at `pos`, the offset just past its end.
pub(crate) fn skip_comment(bytes: &[u8], pos: usize) -> Option<usize> {
    if bytes.get(pos) != Some(&b'/') || bytes.get(pos + 1) != Some(&b'*') {
        return None;
    }
    let mut i = pos + 2;
    while i + 1 < bytes.len() {
        if bytes[i] == b'*' && bytes[i + 1] == b'/' {
            return Some(i + 2);
        }
        i += 1;
    }
    Some(bytes.len())
}

/// Offset just past the string literal whose opening quote is at `pos`.
pub(crate) fn skip_string(bytes: &[u8], pos: usize) -> usize {
    let quote = bytes[pos];
    let mut i = pos + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            b'\n' => return i,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Offset of the `{` or `;` ending the prelude at `pos`, or of the `}` / end of
/// input if neither comes first.
fn find_prelude_end(bytes: &[u8], mut pos: usize) -> usize {
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
            b'(' | b'[' => parens += 1,
            b')' | b']' => parens = parens.saturating_sub(1),
            b'{' | b';' | b'}' if parens == 0 => return pos,
            _ => {}
        }
        pos += 1;
    }
    bytes.len()
}

/// Offset of the `}` closing a block whose body starts at `pos`.
pub(crate) fn find_block_end(bytes: &[u8], mut pos: usize) -> usize {
    let mut depth = 0usize;
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
            b'{' => depth += 1,
            b'}' => {
                if depth == 0 {
                    return pos;
                }
                depth -= 1;
            }
            _ => {}
        }
        pos += 1;
    }
    bytes.len()
}

/// Whether `byte` can continue a CSS identifier. Non-ASCII bytes always can.
pub(crate) fn is_ident_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' || byte >= 0x80
}

/// Whether an identifier can start at `pos`.
pub(crate) fn starts_ident(bytes: &[u8], pos: usize) -> bool {
    let first = match bytes.get(pos) {
        Some(b) => *b,
        None => return false,
    };
    match first {
        b'-' => match bytes.get(pos + 1) {
            Some(b'-') => true,
            Some(b'\\') => true,
            Some(&b) => b.is_ascii_alphabetic() || b == b'_' || b >= 0x80,
            None => false,
        },
        b'\\' => bytes.get(pos + 1).is_some_and(|b| *b != b'\n'),
        b => b.is_ascii_alphabetic() || b == b'_' || b >= 0x80,
    }
}

/// Offset just past the identifier starting at `pos`, honouring escapes.
pub(crate) fn ident_end(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() {
        if bytes[pos] == b'\\' && pos + 1 < bytes.len() {
            pos += 2;
            // Keep the offset on a char boundary after an escaped multibyte char.
            while pos < bytes.len() && (bytes[pos] & 0xC0) == 0x80 {
                pos += 1;
            }
        } else if is_ident_byte(bytes[pos]) {
            pos += 1;
        } else {
            break;
        }
    }
    pos
}
