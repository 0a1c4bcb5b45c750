use std::sync::LazyLock;

use regex::Regex;

/// Head of a record declaration: `var json12 = `.
static DECL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bvar\s+json[0-9]+\s*=\s*").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub enum Scanned<'a> {
    /// Balanced `{ ... }` followed by `;`.
    Object(&'a str),
    /// Braces never balance, or the closing brace is not followed by `;`.
    Unterminated(&'a str),
}

/// Every object literal assigned to a `json<N>` variable, in source order.
///
/// Declarations whose value is not an object literal are ignored. Matches
/// never overlap: scanning resumes after the end of each literal.
pub fn object_literals(script: &str) -> Vec<Scanned<'_>> {
    let mut found = Vec::new();
    let mut pos = 0;

    while let Some(m) = DECL_RE.find_at(script, pos) {
        let start = m.end();
        pos = start;
        if !script[start..].starts_with('{') {
            continue;
        }

        match balanced_len(&script[start..]) {
            Some(len) => {
                let literal = &script[start..start + len];
                pos = start + len;
                if script[pos..].trim_start().starts_with(';') {
                    found.push(Scanned::Object(literal));
                } else {
                    found.push(Scanned::Unterminated(literal));
                }
            }
            None => {
                found.push(Scanned::Unterminated(&script[start..]));
                break;
            }
        }
    }

    found
}

/// Byte length of the `{ ... }` block at the start of `s`, or `None` if it
/// never closes. Braces inside quoted strings do not count.
fn balanced_len(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}
