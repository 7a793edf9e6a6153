use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::config::{ClassifyConfig, RulesConfig};
use crate::models::{Classification, ClassifiedLine, LineKind, Page};
use crate::rules::{
    classify_line, closing_bracket, is_procedural, match_speaker_header, starts_annotation,
    HeaderMatch, LineContext,
};

/// Result of Stage 1 classification
#[derive(Debug)]
pub struct Stage1Result {
    /// Classified fragments of the whole document in reading order
    pub lines: Vec<ClassifiedLine>,
    /// Fragments that matched no rule confidently
    pub low_confidence: usize,
    /// Distinct running header/footer lines detected across pages
    pub repeated_margins: usize,
}

impl Stage1Result {
    /// Number of fragments of the given kind
    pub fn count(&self, kind: LineKind) -> usize {
        self.lines.iter().filter(|l| l.kind == kind).count()
    }
}

/// A piece of a source line: plain text or a bracketed annotation
#[derive(Debug, Clone, PartialEq, Eq)]
struct Fragment {
    text: String,
    /// Character offset of the first non-blank character in the source line
    column: usize,
    /// Annotation opened on this line but not closed
    open_annotation: bool,
}

/// Execute Stage 1: line classification
///
/// For each page, in order:
/// 1. Detect running headers/footers repeated across page margins
/// 2. Split lines so inline annotations become their own fragments
/// 3. Classify every fragment with its page context
pub fn execute_stage1(
    pages: &[Page],
    config: &ClassifyConfig,
    rules: &RulesConfig,
) -> Stage1Result {
    let repeated = find_repeated_margins(pages, config, rules);
    let mut classifier = Classifier {
        rules,
        lines: Vec::new(),
        low_confidence: 0,
        previous_kind: None,
    };

    for page in pages {
        classify_page(&mut classifier, page, &repeated, config);
    }

    if !repeated.is_empty() {
        debug!("Repeated margin lines: {:?}", repeated);
    }

    Stage1Result {
        lines: classifier.lines,
        low_confidence: classifier.low_confidence,
        repeated_margins: repeated.len(),
    }
}

struct Classifier<'a> {
    rules: &'a RulesConfig,
    lines: Vec<ClassifiedLine>,
    low_confidence: usize,
    previous_kind: Option<LineKind>,
}

impl Classifier<'_> {
    fn push(&mut self, page_number: u32, line_index: usize, text: &str, ctx: LineContext) {
        let ctx = LineContext {
            previous_kind: self.previous_kind,
            ..ctx
        };
        let classification = classify_line(text, &ctx, self.rules);
        self.record(page_number, line_index, text, classification);
    }

    fn record(&mut self, page_number: u32, line_index: usize, text: &str, classification: Classification) {
        if classification.low_confidence {
            self.low_confidence += 1;
            debug!(
                "Page {} line {}: low-confidence classification, defaulting to body: {:?}",
                page_number, line_index, text
            );
        }
        self.previous_kind = Some(classification.kind);
        self.lines.push(ClassifiedLine::new(
            page_number,
            line_index,
            text.trim().to_string(),
            classification,
        ));
    }
}

/// Annotation closed on a later line of the page
#[derive(Debug)]
struct ClosedAnnotation {
    text: String,
    /// Position of the line holding the closing bracket
    position: usize,
    /// Byte offset just past the closing bracket
    resume_at: usize,
}

/// Look for the closing bracket of `opener` within the next lines of the page
fn close_annotation(
    content: &[(usize, &str)],
    position: usize,
    opener: &str,
    max_lines: usize,
) -> Option<ClosedAnnotation> {
    let close = opener.chars().next().and_then(closing_bracket)?;
    let mut text = opener.to_string();

    for (next, &(_, raw)) in content.iter().enumerate().skip(position + 1).take(max_lines) {
        text.push(' ');
        match raw.find(close) {
            Some(at) => {
                let resume_at = at + close.len_utf8();
                text.push_str(raw[..resume_at].trim());
                return Some(ClosedAnnotation {
                    text,
                    position: next,
                    resume_at,
                });
            }
            None => text.push_str(raw.trim()),
        }
    }
    None
}

fn classify_page(
    classifier: &mut Classifier<'_>,
    page: &Page,
    repeated: &HashSet<&str>,
    config: &ClassifyConfig,
) {
    let content: Vec<(usize, &str)> = page
        .text
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .collect();
    let lines_on_page = content.len();
    let in_margin = |position: usize| {
        position < config.margin_lines || position + config.margin_lines >= lines_on_page
    };

    classifier.previous_kind = None;
    let mut position = 0;
    let mut start_byte = 0;

    while position < lines_on_page {
        let (line_index, raw) = content[position];
        let column_offset = raw[..start_byte].chars().count();
        let rest = &raw[start_byte..];
        let base = LineContext {
            previous_kind: None,
            column: 0,
            position,
            lines_on_page,
            repeated_margin: false,
        };
        let repeated_margin = column_offset == 0 && in_margin(position) && repeated.contains(raw.trim());
        let mut next = (position + 1, 0);

        for fragment in split_fragments(rest) {
            let ctx = LineContext {
                column: column_offset + fragment.column,
                repeated_margin,
                ..base
            };
            if !fragment.open_annotation || position + 1 == lines_on_page {
                classifier.push(page.page_number, line_index, &fragment.text, ctx);
                continue;
            }

            match close_annotation(&content, position, &fragment.text, config.max_annotation_lines) {
                Some(closed) => {
                    classifier.push(page.page_number, line_index, &closed.text, ctx);
                    next = (closed.position, closed.resume_at);
                }
                // never closed: the bracket belongs to the speech
                None => classifier.record(
                    page.page_number,
                    line_index,
                    &fragment.text,
                    Classification::uncertain_body(),
                ),
            }
        }

        (position, start_byte) = next;
    }
}

/// Find lines repeated verbatim in the top or bottom margin of many pages
fn find_repeated_margins<'a>(
    pages: &'a [Page],
    config: &ClassifyConfig,
    rules: &RulesConfig,
) -> HashSet<&'a str> {
    let threshold = config
        .min_repeated_pages
        .max((pages.len() as f64 * config.min_repeated_ratio).ceil() as usize);
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for page in pages {
        let content: Vec<&str> = page
            .text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let n = content.len();
        let mut seen = HashSet::new();
        for (i, line) in content.iter().enumerate() {
            let in_margin = i < config.margin_lines || i + config.margin_lines >= n;
            if in_margin && seen.insert(*line) {
                *counts.entry(*line).or_insert(0) += 1;
            }
        }
    }

    counts
        .into_iter()
        .filter(|(line, count)| *count >= threshold && can_be_running_header(line, rules))
        .map(|(line, _)| line)
        .collect()
}

/// Recurring speakers, interjections and sentences are content, even when
/// they open or close many pages
fn can_be_running_header(line: &str, rules: &RulesConfig) -> bool {
    if is_procedural(line) || line.ends_with(['.', '!', '?', ',', ':', ';']) {
        return false;
    }
    !matches!(match_speaker_header(line, rules), HeaderMatch::Header(_))
}

/// Split a line into plain-text fragments and bracketed annotations.
///
/// A parenthesised annotation directly followed by a colon is a speaker role
/// (`Name (Party):`) and stays in place.
fn split_fragments(line: &str) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < line.len() {
        let Some(c) = line[i..].chars().next() else {
            break;
        };

        if starts_annotation(&line[i..]) {
            let close = closing_bracket(c).unwrap_or(')');
            match find_matching(&line[i..], c, close) {
                Some(len) => {
                    let end = i + len;
                    if line[end..].trim_start().starts_with(&[':', '：'][..]) {
                        i = end;
                        continue;
                    }
                    push_plain(&mut fragments, line, start, i);
                    fragments.push(Fragment {
                        text: line[i..end].to_string(),
                        column: line[..i].chars().count(),
                        open_annotation: false,
                    });
                    i = end;
                    start = end;
                    continue;
                }
                None => {
                    push_plain(&mut fragments, line, start, i);
                    fragments.push(Fragment {
                        text: line[i..].trim_end().to_string(),
                        column: line[..i].chars().count(),
                        open_annotation: true,
                    });
                    return fragments;
                }
            }
        }

        i += c.len_utf8();
    }

    push_plain(&mut fragments, line, start, line.len());
    fragments
}

fn push_plain(fragments: &mut Vec<Fragment>, line: &str, start: usize, end: usize) {
    let segment = &line[start..end];
    let trimmed = segment.trim();
    if trimmed.is_empty() {
        return;
    }
    let lead = segment.len() - segment.trim_start().len();
    fragments.push(Fragment {
        text: trimmed.to_string(),
        column: line[..start + lead].chars().count(),
        open_annotation: false,
    });
}

/// Byte length of the bracketed span starting at `text[0]`, closer included
fn find_matching(text: &str, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Some(i + c.len_utf8());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(pages: &[Page]) -> Stage1Result {
        execute_stage1(pages, &ClassifyConfig::default(), &RulesConfig::default())
    }

    fn kinds(result: &Stage1Result) -> Vec<(LineKind, &str)> {
        result.lines.iter().map(|l| (l.kind, l.text.as_str())).collect()
    }

    #[test]
    fn test_split_inline_annotation() {
        let fragments = split_fragments("ова предлог. (Пратениците аплаудираат)");
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].text, "ова предлог.");
        assert_eq!(fragments[0].column, 0);
        assert_eq!(fragments[1].text, "(Пратениците аплаудираат)");
        assert_eq!(fragments[1].column, 13);
    }

    #[test]
    fn test_role_annotation_is_not_split() {
        let fragments = split_fragments("Петре Петровски (СДСМ): Почитувани (Аплауз) колеги");
        let texts: Vec<&str> = fragments.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["Петре Петровски (СДСМ): Почитувани", "(Аплауз)", "колеги"]
        );
    }

    #[test]
    fn test_lowercase_parenthetical_stays_in_body() {
        let fragments = split_fragments("според законот (член 5) ова важи");
        assert_eq!(fragments.len(), 1);
    }

    #[test]
    fn test_classify_scenario_pages() {
        let pages = vec![
            Page::new(1, "ПРЕТСЕДАВАЧ: Отворам седница.\nПетре Петровски: Јас сум против."),
            Page::new(2, "ова предлог. (Пратениците аплаудираат)"),
        ];
        let result = run(&pages);
        assert_eq!(
            kinds(&result),
            vec![
                (LineKind::SpeakerHeader, "ПРЕТСЕДАВАЧ: Отворам седница."),
                (LineKind::SpeakerHeader, "Петре Петровски: Јас сум против."),
                (LineKind::BodyText, "ова предлог."),
                (LineKind::ProceduralMarker, "(Пратениците аплаудираат)"),
            ]
        );
        assert_eq!(result.lines[2].page_number, 2);
        assert_eq!(result.low_confidence, 0);
    }

    #[test]
    fn test_annotation_continues_over_lines() {
        let pages = vec![Page::new(
            1,
            "Текст на говорот (Реплика од\nместо на пратеник) и продолжение.",
        )];
        let result = run(&pages);
        assert_eq!(
            kinds(&result),
            vec![
                (LineKind::BodyText, "Текст на говорот"),
                (LineKind::ProceduralMarker, "(Реплика од место на пратеник)"),
                (LineKind::BodyText, "и продолжение."),
            ]
        );
    }

    #[test]
    fn test_running_header_detected() {
        let pages: Vec<Page> = (1..=4)
            .map(|n| {
                Page::new(
                    n,
                    format!(
                        "Стенографски белешки од 12. седница\nПрв ред од страна {n}.\nВтор ред од страна {n}.\nТрет ред од страна {n}.\n{n}"
                    ),
                )
            })
            .collect();
        let result = run(&pages);
        assert_eq!(result.repeated_margins, 1);
        assert_eq!(result.count(LineKind::Noise), 8);
        assert_eq!(result.count(LineKind::BodyText), 12);
    }

    #[test]
    fn test_repeated_interjection_is_not_running_header() {
        let pages: Vec<Page> = (1..=3)
            .map(|n| {
                Page::new(
                    n,
                    format!("ПРЕТСЕДАВАЧ: Повелете.\nАна Анева: Говор на страна {n}.\n(Аплауз)"),
                )
            })
            .collect();
        let result = run(&pages);
        assert_eq!(result.repeated_margins, 0);
        assert_eq!(result.count(LineKind::ProceduralMarker), 3);
        assert_eq!(result.count(LineKind::Noise), 0);
    }

    #[test]
    fn test_unclosed_bracket_stays_body_text() {
        let pages = vec![Page::new(
            1,
            "Ана Анева: Како што вели (Министерот во своето обраќање\nние треба да продолжиме\nсо реформите\nво судството\nи на целата држава.\nБлагодарам.",
        )];
        let result = run(&pages);
        assert_eq!(result.count(LineKind::ProceduralMarker), 0);
        assert_eq!(result.count(LineKind::SpeakerHeader), 1);
        assert_eq!(
            result.lines[1].text,
            "(Министерот во своето обраќање"
        );
        assert_eq!(result.lines[1].kind, LineKind::BodyText);
        assert!(result.lines[1].low_confidence);
        assert_eq!(result.lines.last().map(|l| l.text.as_str()), Some("Благодарам."));
    }

    #[test]
    fn test_unclosed_annotation_on_last_line_is_marker() {
        let pages = vec![Page::new(1, "Ана Анева: Благодарам.\n(Аплауз")];
        let result = run(&pages);
        assert_eq!(
            kinds(&result),
            vec![
                (LineKind::SpeakerHeader, "Ана Анева: Благодарам."),
                (LineKind::ProceduralMarker, "(Аплауз"),
            ]
        );
    }

    #[test]
    fn test_recurring_speaker_is_not_running_header() {
        let pages: Vec<Page> = (1..=3)
            .map(|n| Page::new(n, format!("ПРЕТСЕДАВАЧ:\nПовелете, колега {n}.")))
            .collect();
        let result = run(&pages);
        assert_eq!(result.repeated_margins, 0);
        assert_eq!(result.count(LineKind::SpeakerHeader), 3);
    }
}
