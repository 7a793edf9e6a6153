use std::sync::LazyLock;

use regex::Regex;

/// Fixed procedural phrasing: vote tallies, session state, chair results
static PROCEDURAL_PHRASES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // "За гласаа 61 пратеник", "Гласаа 80 пратеници"
        r"(?i)^(за\s+)?гласаа\s+\d+",
        // "Од вкупно 80 пратеници ..."
        r"(?i)^од\s+вкупно\s+\d+",
        // "61 гласа за", "12 пратеници гласаа против"
        r"(?i)^\d+\s+(пратеници\s+|пратеник\s+)?(гласа|гласаа|гласови)\s+(за|против)\b",
        // "Против 10", "Воздржани: нема"
        r"(?i)^(против|воздржани|воздржан)(\s+(гласаа|гласа|се))?\s*[:\-]?\s*(\d+|нема|никој)\b",
        r"(?i)^седницата\s+(започна|продолжи|заврши|беше\s+прекината|е\s+прекината|е\s+затворена|е\s+отворена)\b",
        r"(?i)^констатирам\s+дека\b.*\b(усвоен|усвоена|усвоено|усвоени)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid procedural pattern"))
    .collect()
});

/// Opening and closing brackets that delimit transcript annotations
pub const ANNOTATION_BRACKETS: [(char, char); 2] = [('(', ')'), ('[', ']')];

/// Closing bracket for an annotation opener
pub fn closing_bracket(open: char) -> Option<char> {
    ANNOTATION_BRACKETS
        .iter()
        .find(|(o, _)| *o == open)
        .map(|(_, c)| *c)
}

/// Check whether `text` begins an annotation: an opening bracket directly
/// followed by an uppercase letter
pub fn starts_annotation(text: &str) -> bool {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(open), Some(first)) => closing_bracket(open).is_some() && first.is_uppercase(),
        _ => false,
    }
}

/// A bracketed annotation such as `(Пратениците аплаудираат)`.
///
/// Annotations left unclosed at the end of a page are accepted as well.
pub fn is_bracketed_annotation(text: &str) -> bool {
    let text = text.trim();
    if !starts_annotation(text) {
        return false;
    }
    let Some(close) = text.chars().next().and_then(closing_bracket) else {
        return false;
    };
    text.ends_with(close) || !text.contains(close)
}

/// Check if a fragment is a procedural marker
pub fn is_procedural(text: &str) -> bool {
    let text = text.trim();
    is_bracketed_annotation(text) || PROCEDURAL_PHRASES.iter().any(|re| re.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracketed_annotations() {
        assert!(is_procedural("(Пратениците аплаудираат)"));
        assert!(is_procedural("[Прекин на седницата]"));
        assert!(is_procedural("(Реплика од место"));
        assert!(!is_procedural("(член 5 од законот)"));
        assert!(!is_procedural("(Аплауз) и потоа продолжи"));
    }

    #[test]
    fn test_vote_tallies() {
        assert!(is_procedural("За гласаа 61 пратеник, против 10, воздржани нема."));
        assert!(is_procedural("Од вкупно 80 пратеници, 75 гласаа за."));
        assert!(is_procedural("61 гласа за"));
        assert!(is_procedural("Против 10."));
        assert!(is_procedural("Воздржани: нема."));
    }

    #[test]
    fn test_session_state() {
        assert!(is_procedural("Седницата започна во 11,00 часот."));
        assert!(is_procedural("СЕДНИЦАТА ЗАВРШИ ВО 18,30 ЧАСОТ."));
        assert!(is_procedural("Констатирам дека Законот е усвоен."));
    }

    #[test]
    fn test_speech_is_not_procedural() {
        assert!(!is_procedural("Јас сум против овој предлог."));
        assert!(!is_procedural("Отворам седница."));
        assert!(!is_procedural("Констатирам дека има кворум."));
    }
}
