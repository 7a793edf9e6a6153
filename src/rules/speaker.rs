use crate::config::RulesConfig;
use crate::models::SpeakerHeader;

/// Result of matching a line against the speaker header pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderMatch {
    /// A valid `Name (Role): remainder` header
    Header(SpeakerHeader),
    /// Looks like a header (capitalised lead-in before a colon) but the name is implausible
    Rejected,
    /// No header shape at all
    NotHeader,
}

/// Delimiters accepted between a speaker name and the speech
const DELIMITERS: [char; 2] = [':', '：'];

/// Match `line` against `Name [(Role)]: remainder`.
///
/// Only the leading token of the line is considered; callers decide whether the
/// line itself starts at column 0.
pub fn match_speaker_header(line: &str, config: &RulesConfig) -> HeaderMatch {
    let line = line.trim();
    let Some(delim_at) = line.find(&DELIMITERS[..]) else {
        return HeaderMatch::NotHeader;
    };
    let before = line[..delim_at].trim_end();
    let delim_len = line[delim_at..].chars().next().map_or(1, char::len_utf8);
    let remainder = line[delim_at + delim_len..].trim();

    let (name, role) = split_role(before);
    if !name.chars().next().is_some_and(char::is_uppercase) {
        return HeaderMatch::NotHeader;
    }

    if !is_valid_speaker_name(name, config) {
        return HeaderMatch::Rejected;
    }

    HeaderMatch::Header(SpeakerHeader {
        name: name.to_string(),
        role: role.map(str::to_string),
        remainder: remainder.to_string(),
    })
}

/// Split a trailing `(Role)` off the text before the delimiter
fn split_role(before: &str) -> (&str, Option<&str>) {
    if let Some(inner_end) = before.strip_suffix(')') {
        if let Some(open) = inner_end.rfind('(') {
            let role = inner_end[open + 1..].trim();
            let name = inner_end[..open].trim_end();
            if !role.is_empty() && !name.is_empty() {
                return (name, Some(role));
            }
        }
    }
    (before.trim(), None)
}

/// Check if a string looks like a speaker name rather than a sentence with a colon
pub fn is_valid_speaker_name(name: &str, config: &RulesConfig) -> bool {
    let name = name.trim();
    let len = name.chars().count();
    if len < config.min_name_chars || len > config.max_name_chars {
        return false;
    }

    let words: Vec<&str> = name.split_whitespace().collect();
    if words.is_empty() || words.len() > config.max_name_words {
        return false;
    }

    if !name.chars().next().is_some_and(char::is_uppercase) {
        return false;
    }

    if name
        .chars()
        .any(|c| c.is_numeric() || matches!(c, '?' | '!' | '"' | '„' | '“' | '«' | '»' | ';'))
    {
        return false;
    }

    let last_word = words[words.len() - 1].trim_matches(|c: char| matches!(c, '.' | ',' | '-'));
    if !last_word.is_empty() && !last_word.chars().next().is_some_and(char::is_uppercase) {
        return false;
    }

    !words.iter().any(|w| {
        let w = w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
        config.poison_words.iter().any(|p| *p == w)
    })
}
