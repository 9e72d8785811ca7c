//! Pure functions over a raw JSON byte buffer. No parse tree is built; every
//! function here just walks bytes with a small explicit state record.

use crate::config::Indent;
use crate::error::Error;

/// Walks forward from `i`, the first byte of a JSON value, and returns the
/// offset one past the value's last byte.
///
/// Terminates the moment the value's own brackets close back to depth zero,
/// or (for a scalar value, or the last value in a container with no trailing
/// comma) the moment a comma or newline appears at depth zero, or the next
/// unmatched closing bracket is reached without having opened one ourselves
/// — the enclosing container's own terminator, which is not part of this
/// value and is left unconsumed.
pub fn seek_past_value(buf: &[u8], i: usize) -> Result<usize, Error> {
    let mut in_string = false;
    let mut escaped = false;
    let mut list_depth: i64 = 0;
    let mut dict_depth: i64 = 0;
    let mut cursor = i;

    while cursor < buf.len() {
        let byte = buf[cursor];

        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            cursor += 1;
            continue;
        }

        match byte {
            b'"' => {
                in_string = true;
                cursor += 1;
            }
            b'[' => {
                list_depth += 1;
                cursor += 1;
            }
            b'{' => {
                dict_depth += 1;
                cursor += 1;
            }
            b']' => {
                if list_depth == 0 {
                    return Ok(cursor);
                }
                list_depth -= 1;
                cursor += 1;
                if list_depth == 0 && dict_depth == 0 {
                    return Ok(cursor);
                }
            }
            b'}' => {
                if dict_depth == 0 {
                    return Ok(cursor);
                }
                dict_depth -= 1;
                cursor += 1;
                if list_depth == 0 && dict_depth == 0 {
                    return Ok(cursor);
                }
            }
            b',' | b'\n' if list_depth == 0 && dict_depth == 0 => {
                return Ok(cursor);
            }
            _ => {
                cursor += 1;
            }
        }
    }

    if in_string || list_depth != 0 || dict_depth != 0 {
        return Err(Error::MalformedJson {
            name: String::new(),
            offset: i,
            reason: "reached end of buffer before the value was closed".to_string(),
        });
    }
    Ok(cursor)
}

/// Counts unescaped, non-string `{` minus `}` in `[a, b)`.
pub fn count_nesting(buf: &[u8], a: usize, b: usize) -> i64 {
    let mut in_string = false;
    let mut escaped = false;
    let mut depth = 0i64;

    for &byte in &buf[a..b] {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => depth -= 1,
            _ => {}
        }
    }
    depth
}

/// Finds the outermost occurrence of the literal pattern `"<key>":` in
/// `buf`, returning `(key_start, key_end)` where `key_end` is one past the
/// colon. Returns `None` if the key isn't present, or if more than one
/// occurrence is outermost (duplicate top-level keys — undefined for this
/// key, by design).
pub fn find_outermost_key(buf: &[u8], key: &str) -> Option<(usize, usize)> {
    let mut pattern = Vec::with_capacity(key.len() + 3);
    pattern.push(b'"');
    pattern.extend_from_slice(key.as_bytes());
    pattern.push(b'"');
    pattern.push(b':');

    let occurrences = find_all(buf, &pattern);
    if occurrences.is_empty() {
        return None;
    }

    // The first occurrence's depth isn't assumed — it's the number of
    // unclosed `{` between the start of the buffer and that occurrence,
    // which already counts the root object's own opening brace. Every
    // later occurrence's depth is this running total plus the net
    // bracket delta since the previous occurrence.
    let mut depth = count_nesting(buf, 0, occurrences[0]);
    let mut depth_one_matches = Vec::new();
    if depth == 1 {
        depth_one_matches.push(occurrences[0]);
    }
    let mut prev_end = occurrences[0] + pattern.len();

    for &offset in &occurrences[1..] {
        let delta = count_nesting(buf, prev_end, offset);
        depth += delta;
        if depth == 1 {
            depth_one_matches.push(offset);
        }
        prev_end = offset + pattern.len();
    }

    if depth_one_matches.len() != 1 {
        return None;
    }
    let start = depth_one_matches[0];
    Some((start, start + pattern.len()))
}

/// Non-overlapping forward scan for every occurrence of `pattern` in `buf`.
fn find_all(buf: &[u8], pattern: &[u8]) -> Vec<usize> {
    let mut found = Vec::new();
    if pattern.is_empty() || pattern.len() > buf.len() {
        return found;
    }
    let mut i = 0;
    while i + pattern.len() <= buf.len() {
        if &buf[i..i + pattern.len()] == pattern {
            found.push(i);
            i += pattern.len();
        } else {
            i += 1;
        }
    }
    found
}

/// Walks backward from `i - 1` over spaces and tabs preceding a key, and
/// reports how many indent units precede it and what that unit is.
pub fn detect_indentation(buf: &[u8], i: usize, indent_config: &Indent) -> (usize, String) {
    let mut run_len = 0;
    let mut saw_tab = false;
    let mut j = i;
    while j > 0 {
        match buf[j - 1] {
            b'\t' => {
                saw_tab = true;
                run_len += 1;
                j -= 1;
            }
            b' ' => {
                run_len += 1;
                j -= 1;
            }
            _ => break,
        }
    }

    if saw_tab {
        return (run_len, "\t".to_string());
    }

    match indent_config {
        Indent::Spaces(n) if *n > 0 => (run_len / n, " ".repeat(*n)),
        Indent::Custom(s) if s == "\t" => {
            // Configured for tabs, but none were found in this run: flat.
            (0, String::new())
        }
        Indent::Custom(_) => (run_len / 2, "  ".to_string()),
        _ => (0, String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeks_past_scalar_followed_by_comma() {
        let buf = br#"{"a": "Hello{}", "b": [0, 1]}"#;
        let value_start = 6; // points at the opening quote of "Hello{}"
        let end = seek_past_value(buf, value_start).unwrap();
        assert_eq!(&buf[value_start..end], br#""Hello{}""#);
    }

    #[test]
    fn seeks_past_array() {
        let buf = br#"{"b": [0, 1], "c": {"d": "e"}}"#;
        let value_start = 6;
        let end = seek_past_value(buf, value_start).unwrap();
        assert_eq!(&buf[value_start..end], b"[0, 1]");
    }

    #[test]
    fn seeks_past_object() {
        let buf = br#"{"b": [0, 1], "c": {"d": "e"}}"#;
        let value_start = 19;
        let end = seek_past_value(buf, value_start).unwrap();
        assert_eq!(&buf[value_start..end], br#"{"d": "e"}"#);
    }

    #[test]
    fn seeks_past_last_key_scalar_with_no_trailing_comma() {
        let buf = br#"{"a": 1, "z": "c"}"#;
        let value_start = 14; // the opening quote of "c"
        let end = seek_past_value(buf, value_start).unwrap();
        assert_eq!(&buf[value_start..end], br#""c""#);
    }

    #[test]
    fn handles_escaped_quotes_and_backslashes() {
        // A value that is the single backslash character: "\\"
        let buf = br#"{"a": "\\", "b": 1}"#;
        let value_start = 6;
        let end = seek_past_value(buf, value_start).unwrap();
        assert_eq!(&buf[value_start..end], br#""\\""#);
    }

    #[test]
    fn handles_escaped_quote_value() {
        // Value is an escaped double quote: "\""
        let buf = br#"{"a": "\"", "b": 1}"#;
        let end = seek_past_value(buf, 6).unwrap();
        assert_eq!(&buf[6..end], br#""\"""#);
    }

    #[test]
    fn malformed_json_reports_error() {
        let buf = br#"{"a": "unterminated"#;
        assert!(seek_past_value(buf, 6).is_err());
    }

    #[test]
    fn finds_outermost_key_among_nested_duplicates() {
        let buf = br#"{"a": {"b": 1}, "b": 2}"#;
        let (start, end) = find_outermost_key(buf, "b").unwrap();
        assert_eq!(&buf[start..end], br#""b":"#);
        assert_eq!(&buf[end..], b" 2}");
    }

    #[test]
    fn keys_with_colon_and_brace_match_literal_pattern_only() {
        let buf = br#"{"weird:key{": 1, "b": 2}"#;
        let (start, end) = find_outermost_key(buf, "weird:key{").unwrap();
        assert_eq!(&buf[start..end], br#""weird:key{":"#);
    }

    #[test]
    fn missing_key_returns_none() {
        let buf = br#"{"a": 1}"#;
        assert_eq!(find_outermost_key(buf, "missing"), None);
    }

    #[test]
    fn detects_tab_indentation() {
        let buf = b"{\n\t\"a\": 1\n}";
        let key_pos = 3; // the opening quote of "a"
        let (level, unit) = detect_indentation(buf, key_pos, &Indent::Custom("\t".to_string()));
        assert_eq!(level, 1);
        assert_eq!(unit, "\t");
    }

    #[test]
    fn detects_two_space_indentation() {
        let buf = b"{\n  \"a\": 1\n}";
        let key_pos = 4;
        let (level, unit) = detect_indentation(buf, key_pos, &Indent::Spaces(2));
        assert_eq!(level, 1);
        assert_eq!(unit, "  ");
    }

    #[test]
    fn flat_indent_reports_zero_level() {
        let buf = b"{\"a\": 1}";
        let (level, unit) = detect_indentation(buf, 1, &Indent::Flat);
        assert_eq!(level, 0);
        assert_eq!(unit, "");
    }
}
