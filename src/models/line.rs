use serde::{Deserialize, Serialize};

/// Classification of a single line fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// Introduces a new speaker's turn
    SpeakerHeader,
    /// Speech content
    BodyText,
    /// Votes, applause, session state and other annotations
    ProceduralMarker,
    /// Page numbers, footers, repeated margins, blank lines
    Noise,
}

/// Parts of a recognised speaker header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerHeader {
    /// Speaker name as written, without the role annotation
    pub name: String,
    /// Parenthesised role between the name and the delimiter
    pub role: Option<String>,
    /// Text following the delimiter on the same line
    pub remainder: String,
}

/// Outcome of classifying one fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: LineKind,
    /// Populated only for `LineKind::SpeakerHeader`
    pub header: Option<SpeakerHeader>,
    /// The fragment matched no rule confidently and fell back to body text
    pub low_confidence: bool,
}

impl Classification {
    pub fn of(kind: LineKind) -> Self {
        Self {
            kind,
            header: None,
            low_confidence: false,
        }
    }

    pub fn header(header: SpeakerHeader) -> Self {
        Self {
            kind: LineKind::SpeakerHeader,
            header: Some(header),
            low_confidence: false,
        }
    }

    pub fn uncertain_body() -> Self {
        Self {
            kind: LineKind::BodyText,
            header: None,
            low_confidence: true,
        }
    }
}

/// A classified line fragment with its provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLine {
    /// Page the fragment came from
    pub page_number: u32,
    /// Index of the source line on its page
    pub line_index: usize,
    /// Fragment text, trimmed
    pub text: String,
    pub kind: LineKind,
    pub header: Option<SpeakerHeader>,
    pub low_confidence: bool,
}

impl ClassifiedLine {
    pub fn new(page_number: u32, line_index: usize, text: String, classification: Classification) -> Self {
        Self {
            page_number,
            line_index,
            text,
            kind: classification.kind,
            header: classification.header,
            low_confidence: classification.low_confidence,
        }
    }
}
