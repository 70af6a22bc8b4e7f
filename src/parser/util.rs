/// Resolves the escape sequences of a string literal body (the text between the quotes).
///
/// Unknown escapes yield the escaped character itself, so `"\q"` reads as `"q"`.
pub fn unescape_string_literal(raw: &str) -> String {
    let mut s = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            s.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => s.push('\n'),
            Some('t') => s.push('\t'),
            Some('r') => s.push('\r'),
            Some('b') => s.push('\u{8}'),
            Some('f') => s.push('\u{c}'),
            Some('v') => s.push('\u{b}'),
            Some('0') => s.push('\0'),
            Some('x') => push_hex_escape(&mut s, &mut chars, 2, 'x'),
            Some('u') => push_hex_escape(&mut s, &mut chars, 4, 'u'),
            Some(other) => s.push(other),
            None => s.push('\\'),
        }
    }
    s
}

fn push_hex_escape(s: &mut String, chars: &mut std::str::Chars, width: usize, marker: char) {
    let digits: String = chars.clone().take(width).collect();
    let decoded = if digits.len() == width {
        u32::from_str_radix(&digits, 16)
            .ok()
            .and_then(std::char::from_u32)
    } else {
        None
    };
    match decoded {
        Some(c) => {
            s.push(c);
            for _ in 0..width {
                chars.next();
            }
        }
        // Malformed escapes are kept verbatim minus the backslash.
        None => s.push(marker),
    }
}

#[cfg(test)]
mod tests {
    use super::unescape_string_literal;

    #[test]
    fn test_simple_escapes() {
        assert_eq!(unescape_string_literal(r#"a\nb\tc"#), "a\nb\tc");
        assert_eq!(unescape_string_literal(r#"\"quoted\""#), "\"quoted\"");
        assert_eq!(unescape_string_literal(r#"back\\slash"#), "back\\slash");
    }

    #[test]
    fn test_hex_and_unicode_escapes() {
        assert_eq!(unescape_string_literal(r#"\x41B"#), "AB");
        assert_eq!(unescape_string_literal(r#"\xZZ"#), "xZZ");
    }
}
