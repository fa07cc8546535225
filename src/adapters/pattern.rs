//! Token-pattern compilation and URL matching.
//!
//! A match pattern is a regular expression with embedded `{name}` or
//! `{name:subpattern}` tokens. Each token compiles to a capture group; a
//! side table maps capture indices back to field names, including the
//! anonymous slots taken by plain `(...)` groups in the pattern or inside
//! a token's subpattern.

use std::collections::BTreeMap;

use fancy_regex::Regex;

use super::FieldMap;

/// Pattern compilation or evaluation error.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    /// A bare `{name}` token has no built-in subpattern and no entry in
    /// the custom subpattern map.
    #[error("unknown token `{{{0}}}`; use `{{{0}:regex}}` or a known field name")]
    UnknownToken(String),
    /// A `{` with no matching `}`.
    #[error("unterminated token at byte {0}")]
    UnterminatedToken(usize),
    /// The assembled regular expression failed to compile or evaluate.
    #[error("pattern regex error: {0}")]
    Regex(#[from] Box<fancy_regex::Error>),
}

/// Subpatterns for the well-known field names. Bare `{width}`-style tokens
/// resolve here before consulting any custom map.
fn builtin_subpattern(name: &str) -> Option<&'static str> {
    match name {
        "encodedUrlOriginal" => Some(r"[^ &\?]+"),
        "width" | "height" | "resizeWidth" | "resizeHeight" | "offsetX" | "offsetY"
        | "cropWidth" | "cropHeight" | "cropX" | "cropY" | "cropX2" | "cropY2" => Some("[0-9]+"),
        _ => None,
    }
}

/// True when the text following a `(` does not mark it non-capturing.
/// Only `(?:`, `(?=` and `(?!` are recognized as non-capturing openers.
fn opens_capture(after_paren: &str) -> bool {
    let mut chars = after_paren.chars();
    match chars.next() {
        Some('?') => !matches!(chars.next(), Some(':' | '=' | '!')),
        _ => true,
    }
}

/// Push an anonymous name slot for every capturing `(` inside a token
/// subpattern, keeping capture indices and the name table aligned.
fn track_inner_groups(subpattern: &str, names: &mut Vec<String>) {
    let mut chars = subpattern.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '(' if opens_capture(&subpattern[i + 1..]) => names.push(String::new()),
            _ => {}
        }
    }
}

/// A compiled match pattern: the anchored regex plus the capture-index to
/// field-name table (empty names for anonymous groups).
#[derive(Debug)]
pub struct CompiledPattern {
    regex: Regex,
    names: Vec<String>,
}

impl CompiledPattern {
    /// Compile a token pattern. `custom` supplies subpatterns for tokens
    /// that are neither explicit nor built-in.
    ///
    /// Unresolvable tokens are fatal: silently matching nothing would make
    /// every URL fall through to the default-prefix path.
    pub fn compile(
        pattern: &str,
        custom: Option<&BTreeMap<String, String>>,
    ) -> Result<Self, PatternError> {
        let mut names = Vec::new();
        let mut out = String::with_capacity(pattern.len() + 16);
        out.push('^');

        let mut chars = pattern.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    out.push('\\');
                    if let Some((_, escaped)) = chars.next() {
                        out.push(escaped);
                    }
                }
                '(' => {
                    if opens_capture(&pattern[i + 1..]) {
                        names.push(String::new());
                    }
                    out.push('(');
                }
                '{' => {
                    let body = &pattern[i + 1..];
                    let end = body
                        .find('}')
                        .ok_or(PatternError::UnterminatedToken(i))?;
                    let token = &body[..end];
                    // consume the token body and the closing brace
                    while let Some(&(j, _)) = chars.peek() {
                        if j > i + end + 1 {
                            break;
                        }
                        chars.next();
                    }

                    let (name, explicit) = match token.split_once(':') {
                        Some((name, sub)) => (name, Some(sub)),
                        None => (token, None),
                    };
                    names.push(name.to_string());

                    let sub = match explicit {
                        Some(sub) => sub,
                        None => builtin_subpattern(name)
                            .or_else(|| {
                                custom.and_then(|map| map.get(name).map(String::as_str))
                            })
                            .ok_or_else(|| PatternError::UnknownToken(name.to_string()))?,
                    };
                    track_inner_groups(sub, &mut names);
                    out.push('(');
                    out.push_str(sub);
                    out.push(')');
                }
                _ => out.push(c),
            }
        }
        out.push('$');

        let regex = Regex::new(&out).map_err(Box::new)?;
        Ok(Self { regex, names })
    }

    /// Match a URL against the whole pattern. `Ok(None)` when it does not
    /// match; named groups left unmatched by the alternation are simply
    /// absent from the result.
    pub fn match_url(&self, url: &str) -> Result<Option<FieldMap>, PatternError> {
        let Some(caps) = self.regex.captures(url).map_err(Box::new)? else {
            return Ok(None);
        };

        let mut fields = FieldMap::new();
        for (i, name) in self.names.iter().enumerate() {
            if name.is_empty() {
                continue;
            }
            if let Some(m) = caps.get(i + 1) {
                fields.insert(name.clone(), m.as_str().to_string());
            }
        }
        Ok(Some(fields))
    }
}

/// Escape regex metacharacters in a render template so it can double as a
/// match pattern. `{` and `}` stay live for token substitution.
pub(crate) fn escape_template(template: &str) -> String {
    let mut out = String::with_capacity(template.len());
    for c in template.chars() {
        if matches!(
            c,
            '.' | '*' | '+' | '?' | '^' | '$' | '(' | ')' | '|' | '[' | ']' | '\\'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
