//! Render-template substitution and percent coding.
//!
//! Templates reuse the token syntax of the match patterns; any
//! `:subpattern` suffix inside a token is ignored when rendering. A token
//! whose field is absent stays in the output verbatim, so a mistyped
//! template is visible in the produced URL instead of silently vanishing.

use super::FieldMap;

/// Substitute `{name}` tokens from the field map.
///
/// Present-but-empty fields render as empty strings; absent fields leave
/// the token text untouched. Never fails.
pub fn render_template(template: &str, fields: &FieldMap) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let Some(end) = tail[1..].find('}') else {
            // no closing brace anywhere: the remainder is literal
            out.push_str(tail);
            return out;
        };

        let body = &tail[1..=end];
        let name = body.split(':').next().unwrap_or(body);
        let value = if name.is_empty() || name.contains('[') {
            None
        } else {
            fields.get(name)
        };
        match value {
            Some(v) => out.push_str(v),
            None => out.push_str(&tail[..end + 2]),
        }
        rest = &tail[end + 2..];
    }

    out.push_str(rest);
    out
}

const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// Percent-encode a URL component.
///
/// Keeps ASCII alphanumerics and `-_.!~*'()`, encodes everything else as
/// uppercase UTF-8 percent escapes. Space becomes `%20`, never `+`.
pub fn encode_uri_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for &byte in input.as_bytes() {
        let unreserved = byte.is_ascii_alphanumeric()
            || matches!(
                byte,
                b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')'
            );
        if unreserved {
            out.push(byte as char);
        } else {
            out.push('%');
            out.push(HEX_UPPER[(byte >> 4) as usize] as char);
            out.push(HEX_UPPER[(byte & 0x0f) as usize] as char);
        }
    }
    out
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Percent-decode a URL component.
///
/// `+` is not treated as space. Malformed escapes pass through verbatim;
/// decoded bytes that are not valid UTF-8 become replacement characters.
pub fn decode_uri_component(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
