use std::borrow::Cow;

/// Returns true for characters that may not appear anywhere in an XML 1.0
/// document, escaped or not.
///
/// XML 1.0 allows tab, newline, carriage return, and everything from U+0020
/// upwards except the noncharacters U+FFFE and U+FFFF. Surrogates cannot occur
/// in a Rust `str`.
fn is_xml_illegal(c: char) -> bool {
    match c {
        '\t' | '\n' | '\r' => false,
        '\u{0}'..='\u{1f}' => true,
        '\u{fffe}' | '\u{ffff}' => true,
        _ => false,
    }
}

/// Removes characters that are illegal in XML 1.0 text.
///
/// Source feeds regularly carry stray control bytes (NUL, BEL, form feeds,
/// pasted terminal escapes). `quick-xml` escapes markup characters but passes
/// these through, which would make the generated document unparsable. Note
/// that only the ESC byte of an ANSI sequence is removed; the printable tail
/// remains.
///
/// Returns `Cow::Borrowed` when the input is already clean (common case).
///
/// # Examples
///
/// ```
/// use rssingle::util::sanitize_xml_text;
///
/// assert_eq!(sanitize_xml_text("plain"), "plain");
/// assert_eq!(sanitize_xml_text("bell\x07 ringing"), "bell ringing");
/// ```
pub fn sanitize_xml_text(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_xml_illegal) {
        return Cow::Borrowed(s);
    }

    Cow::Owned(s.chars().filter(|&c| !is_xml_illegal(c)).collect())
}

/// Trims and sanitizes a field value, returning `None` when nothing is left.
pub fn clean_field(s: &str) -> Option<String> {
    let cleaned = sanitize_xml_text(s);
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
