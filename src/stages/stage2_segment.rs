use tracing::debug;

use crate::config::SegmenterConfig;
use crate::models::{ClassifiedLine, LineKind, Utterance, UtteranceKind, PROCEDURAL_SPEAKER};
use crate::rules::strip_inline_footer;

/// Result of Stage 2 segmentation
#[derive(Debug)]
pub struct Stage2Result {
    /// Utterances in reading order
    pub utterances: Vec<Utterance>,
    /// Utterances discarded for being shorter than the minimum length
    pub dropped_short: usize,
}

/// Text accumulated for the utterance in progress
#[derive(Debug, Default)]
struct TextBuffer {
    text: String,
    start_page: u32,
    end_page: u32,
}

impl TextBuffer {
    fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Append normalised text, re-joining words hyphenated across lines
    fn append(&mut self, text: &str, page: u32) {
        let text = normalize_whitespace(text);
        if text.is_empty() {
            return;
        }
        self.end_page = page;

        if self.text.is_empty() {
            self.text = text;
            return;
        }

        if ends_with_word_hyphen(&self.text) {
            if text.chars().next().is_some_and(char::is_lowercase) {
                self.text.pop();
            }
            self.text.push_str(&text);
        } else {
            self.text.push(' ');
            self.text.push_str(&text);
        }
    }

    fn take(&mut self) -> TextBuffer {
        std::mem::take(self)
    }
}

/// Execute Stage 2: utterance segmentation
///
/// Single pass over the classified fragments of the whole document:
/// - a speaker header flushes the current buffer and switches speaker
/// - body text accumulates, across page boundaries
/// - a procedural marker flushes the buffer and is emitted on its own under
///   the procedural speaker, without changing the active speaker
/// - noise is ignored
pub fn execute_stage2(lines: &[ClassifiedLine], config: &SegmenterConfig) -> Stage2Result {
    let mut segmenter = Segmenter::new(config);

    for line in lines {
        match line.kind {
            LineKind::SpeakerHeader => segmenter.on_header(line),
            LineKind::BodyText => segmenter.on_body(&line.text, line.page_number),
            LineKind::ProceduralMarker => segmenter.on_procedural(line),
            LineKind::Noise => {}
        }
    }

    segmenter.finish()
}

struct Segmenter<'a> {
    config: &'a SegmenterConfig,
    utterances: Vec<Utterance>,
    speaker: String,
    role: Option<String>,
    buffer: TextBuffer,
    /// Page of a header whose turn has no body text yet
    header_page: Option<u32>,
    dropped_short: usize,
}

impl<'a> Segmenter<'a> {
    fn new(config: &'a SegmenterConfig) -> Self {
        Self {
            config,
            utterances: Vec::new(),
            speaker: PROCEDURAL_SPEAKER.to_string(),
            role: None,
            buffer: TextBuffer::default(),
            header_page: None,
            dropped_short: 0,
        }
    }

    fn on_header(&mut self, line: &ClassifiedLine) {
        self.flush();
        let Some(header) = &line.header else {
            // classified as a header without parts; keep it as speech
            self.on_body(&line.text, line.page_number);
            return;
        };
        self.speaker = header.name.clone();
        self.role = header.role.clone();
        self.header_page = Some(line.page_number);
        if !header.remainder.is_empty() {
            self.on_body(&header.remainder, line.page_number);
        }
    }

    fn on_body(&mut self, text: &str, page: u32) {
        let cleaned = strip_inline_footer(text);
        if cleaned.trim().is_empty() {
            return;
        }
        if self.buffer.is_empty() {
            self.buffer.start_page = self.header_page.take().unwrap_or(page);
        }
        self.buffer.append(&cleaned, page);
    }

    fn on_procedural(&mut self, line: &ClassifiedLine) {
        self.flush();
        let text = normalize_whitespace(&line.text);
        self.push(Utterance {
            speaker: PROCEDURAL_SPEAKER.to_string(),
            role: None,
            raw_text: text,
            source_page: line.page_number,
            end_page: line.page_number,
            order: 0,
            kind: UtteranceKind::Procedural,
        });
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let buffer = self.buffer.take();
        self.push(Utterance {
            speaker: self.speaker.clone(),
            role: self.role.clone(),
            raw_text: buffer.text,
            source_page: buffer.start_page,
            end_page: buffer.end_page,
            order: 0,
            kind: UtteranceKind::Speech,
        });
    }

    fn push(&mut self, mut utterance: Utterance) {
        if utterance.raw_text.chars().count() < self.config.min_utterance_chars.max(1) {
            self.dropped_short += 1;
            debug!(
                "Dropping short utterance on page {}: {:?}",
                utterance.source_page, utterance.raw_text
            );
            return;
        }
        utterance.order = self.utterances.len();
        self.utterances.push(utterance);
    }

    fn finish(mut self) -> Stage2Result {
        self.flush();
        Stage2Result {
            utterances: self.utterances,
            dropped_short: self.dropped_short,
        }
    }
}

/// Collapse runs of whitespace into single spaces
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The text ends in a hyphen attached to a word, e.g. a word broken over two lines
fn ends_with_word_hyphen(text: &str) -> bool {
    let mut rev = text.chars().rev();
    matches!(rev.next(), Some('-')) && rev.next().is_some_and(char::is_alphabetic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Classification, SpeakerHeader};

    fn header(page: u32, name: &str, remainder: &str) -> ClassifiedLine {
        ClassifiedLine::new(
            page,
            0,
            format!("{}: {}", name, remainder),
            Classification::header(SpeakerHeader {
                name: name.to_string(),
                role: None,
                remainder: remainder.to_string(),
            }),
        )
    }

    fn line(page: u32, kind: LineKind, text: &str) -> ClassifiedLine {
        ClassifiedLine::new(page, 0, text.to_string(), Classification::of(kind))
    }

    fn run(lines: &[ClassifiedLine]) -> Vec<Utterance> {
        execute_stage2(lines, &SegmenterConfig::default()).utterances
    }

    #[test]
    fn test_body_spanning_pages_keeps_start_page() {
        let utterances = run(&[
            header(3, "Петре Петровски", "Почитувани,"),
            line(3, LineKind::BodyText, "ова е првиот дел"),
            line(4, LineKind::Noise, "4"),
            line(4, LineKind::BodyText, "и ова е вториот дел."),
        ]);

        assert_eq!(utterances.len(), 1);
        assert_eq!(utterances[0].source_page, 3);
        assert_eq!(utterances[0].end_page, 4);
        assert_eq!(
            utterances[0].raw_text,
            "Почитувани, ова е првиот дел и ова е вториот дел."
        );
    }

    #[test]
    fn test_procedural_marker_keeps_active_speaker() {
        let utterances = run(&[
            header(1, "Ана Анева", "Прв дел."),
            line(1, LineKind::ProceduralMarker, "(Аплауз)"),
            line(2, LineKind::BodyText, "Втор дел."),
        ]);

        let summary: Vec<(&str, &str, u32)> = utterances
            .iter()
            .map(|u| (u.speaker.as_str(), u.raw_text.as_str(), u.source_page))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Ана Анева", "Прв дел.", 1),
                (PROCEDURAL_SPEAKER, "(Аплауз)", 1),
                ("Ана Анева", "Втор дел.", 2),
            ]
        );
        assert!(utterances[1].is_procedural());
        assert_eq!(
            utterances.iter().map(|u| u.order).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_text_before_first_header_is_procedural() {
        let utterances = run(&[
            line(1, LineKind::BodyText, "Собрание на Република Северна Македонија"),
            header(1, "ПРЕТСЕДАВАЧ", "Добро утро."),
        ]);

        assert_eq!(utterances[0].speaker, PROCEDURAL_SPEAKER);
        assert_eq!(utterances[0].kind, UtteranceKind::Speech);
        assert_eq!(utterances[1].speaker, "ПРЕТСЕДАВАЧ");
    }

    #[test]
    fn test_header_page_is_source_page_when_body_follows_on_next_page() {
        let utterances = run(&[
            header(5, "ПРЕТСЕДАВАЧ", ""),
            line(6, LineKind::BodyText, "Повелете."),
        ]);

        assert_eq!(utterances.len(), 1);
        assert_eq!(utterances[0].source_page, 5);
        assert_eq!(utterances[0].end_page, 6);
    }

    #[test]
    fn test_consecutive_headers_without_body() {
        let utterances = run(&[
            header(1, "Ана Анева", ""),
            header(1, "Марко Марковски", "Благодарам."),
        ]);

        assert_eq!(utterances.len(), 1);
        assert_eq!(utterances[0].speaker, "Марко Марковски");
    }

    #[test]
    fn test_hyphenated_words_are_joined() {
        let utterances = run(&[
            header(1, "Ана Анева", "Законот за вработу-"),
            line(1, LineKind::BodyText, "вање го предложи ВМРО-"),
            line(1, LineKind::BodyText, "ДПМНЕ."),
        ]);

        assert_eq!(
            utterances[0].raw_text,
            "Законот за вработување го предложи ВМРО-ДПМНЕ."
        );
    }

    #[test]
    fn test_short_utterances_are_dropped() {
        let result = execute_stage2(
            &[header(1, "Ана Анева", "Да"), header(1, "Марко Марковски", "Не се согласувам.")],
            &SegmenterConfig::default(),
        );

        assert_eq!(result.utterances.len(), 1);
        assert_eq!(result.dropped_short, 1);
        assert_eq!(result.utterances[0].order, 0);
    }

    #[test]
    fn test_inline_footer_is_stripped() {
        let utterances = run(&[header(1, "Ана Анева", "Крај на говорот. 12-3/45")]);
        assert_eq!(utterances[0].raw_text, "Крај на говорот.");
    }
}
