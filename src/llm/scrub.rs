use std::borrow::Cow;

const MAX_UPSTREAM_BODY_CHARS: usize = 200;
const REDACTED: &str = "[REDACTED]";

/// Key prefixes and header/JSON markers after which a credential follows.
const SECRET_MARKERS: [&str; 12] = [
    "sk-",
    "Bearer ",
    "bearer ",
    "api_key=",
    "apikey=",
    "key=",
    "\"api_key\":\"",
    "\"api_key\": \"",
    "\"apiKey\":\"",
    "\"authorization\":\"",
    "\"token\":\"",
    "eyJ",
];

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '+' | '/' | '=')
}

fn token_end(input: &str, from: usize) -> usize {
    input[from..]
        .char_indices()
        .find(|(_, c)| !is_secret_char(*c))
        .map_or(input.len(), |(i, _)| from + i)
}

fn redact_after(scrubbed: &mut String, marker: &str) {
    let mut search_from = 0;
    while let Some(rel) = scrubbed[search_from..].find(marker) {
        let start = search_from + rel;
        let content_start = start + marker.len();
        let end = token_end(scrubbed, content_start);

        // Bare marker without a value.
        if end == content_start {
            search_from = content_start;
            continue;
        }

        // Keep the marker itself readable for header/JSON forms.
        let keep_marker = !matches!(marker, "sk-" | "eyJ");
        let replace_from = if keep_marker { content_start } else { start };
        scrubbed.replace_range(replace_from..end, REDACTED);
        search_from = replace_from + REDACTED.len();
    }
}

/// Redact credential-looking tokens from text that may be logged or surfaced.
pub fn scrub_secret_patterns(input: &str) -> Cow<'_, str> {
    if !SECRET_MARKERS.iter().any(|marker| input.contains(marker)) {
        return Cow::Borrowed(input);
    }

    let mut scrubbed = input.to_string();
    for marker in SECRET_MARKERS {
        redact_after(&mut scrubbed, marker);
    }
    Cow::Owned(scrubbed)
}

/// Scrub and truncate an upstream error body for inclusion in an error value.
pub fn sanitize_upstream_body(input: &str) -> String {
    let scrubbed = scrub_secret_patterns(input.trim());
    if scrubbed.chars().count() <= MAX_UPSTREAM_BODY_CHARS {
        return scrubbed.into_owned();
    }

    let truncated: String = scrubbed.chars().take(MAX_UPSTREAM_BODY_CHARS).collect();
    format!("{truncated}...")
}
