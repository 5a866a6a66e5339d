/// Normalize extracted document text before chunking.
///
/// NUL, U+FFFD (replacement) and the U+FFFE/U+FFFF non-characters are
/// dropped. Any other control or format character becomes a space, then
/// whitespace runs collapse to a single space.
pub fn sanitize_document_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text.chars() {
        if matches!(ch, '\0' | '\u{FFFD}' | '\u{FFFE}' | '\u{FFFF}') {
            continue;
        }

        if ch.is_whitespace() || ch.is_control() || is_format_char(ch) {
            pending_space = !out.is_empty();
            continue;
        }

        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(ch);
    }

    out
}

fn is_format_char(ch: char) -> bool {
    matches!(
        ch,
        '\u{00AD}' | '\u{200B}'..='\u{200F}' | '\u{2028}'..='\u{202E}' | '\u{2060}'..='\u{2064}' | '\u{FEFF}'
    )
}
