use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Archival codes printed in the page footer, e.g. `12-3/45` or `15.-`
static FOOTER_CODES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^\d{1,3}-\d{1,3}/\d{1,3}[,.]?$",
        r"^\d{1,3}/\d{1,3}\.-$",
        r"^\d{1,3}-\d{1,3}/\d{1,3}\.-$",
        r"^\d{1,2}/\d{1,3}\.?$",
        r"^\d{1,3}\.-$",
        r"^\d{1,3}-$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid footer pattern"))
    .collect()
});

/// Footer codes glued to the end of a text line by the extractor
static INLINE_FOOTER_CODES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\s+\d{1,3}-\d{1,3}/\d{1,3}[,.]?\s*$",
        r"\s+\d{1,2}/\d{1,3}\.?-?\s*$",
        r"\s+\d{1,3}\.-\s*$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid inline footer pattern"))
    .collect()
});

static PAGE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-–]?\s*(\d{1,3})\s*[-–]?$").expect("valid page number pattern"));

/// Check if text is an archival footer code
pub fn is_footer_code(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && FOOTER_CODES.iter().any(|re| re.is_match(text))
}

/// Check if text is a bare page number no larger than `max`
pub fn is_page_number(text: &str, max: u32) -> bool {
    PAGE_NUMBER
        .captures(text.trim())
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .is_some_and(|n| (1..=max).contains(&n))
}

/// Lines made only of dots, dashes, slashes and brackets are extraction debris
pub fn is_punctuation_only(text: &str) -> bool {
    text.chars()
        .all(|c| c.is_whitespace() || matches!(c, '.' | ',' | '-' | '–' | '_' | '(' | ')' | '/' | '*'))
}

/// Remove a footer code trailing a line of text
pub fn strip_inline_footer(text: &str) -> Cow<'_, str> {
    let mut cleaned = Cow::Borrowed(text);
    for re in INLINE_FOOTER_CODES.iter() {
        if re.is_match(&cleaned) {
            cleaned = Cow::Owned(re.replace(&cleaned, "").into_owned());
        }
    }
    cleaned
}
