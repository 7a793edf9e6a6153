use serde::{Deserialize, Serialize};

/// Speaker label for procedural markers and text with no preceding header
pub const PROCEDURAL_SPEAKER: &str = "procedural";

/// Whether an utterance is speech or a procedural annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtteranceKind {
    Speech,
    Procedural,
}

/// One continuous speech turn, or one procedural marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    /// Speaker name, or `PROCEDURAL_SPEAKER`
    pub speaker: String,
    /// Role annotation from the header, if any
    pub role: Option<String>,
    /// Concatenated, whitespace-normalised text; never empty
    pub raw_text: String,
    /// Page where the header or first body line appears
    pub source_page: u32,
    /// Page of the last body line
    pub end_page: u32,
    /// Position in the document's output
    pub order: usize,
    pub kind: UtteranceKind,
}

impl Utterance {
    /// Whether the utterance continues past its starting page
    pub fn spans_pages(&self) -> bool {
        self.end_page != self.source_page
    }

    pub fn is_procedural(&self) -> bool {
        self.kind == UtteranceKind::Procedural
    }

    pub fn to_record(&self) -> UtteranceRecord {
        UtteranceRecord::from(self)
    }
}

/// Serialized form of an utterance, one per output line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtteranceRecord {
    pub speaker: String,
    pub raw_text: String,
    pub source_page: u32,
}

impl From<&Utterance> for UtteranceRecord {
    fn from(utterance: &Utterance) -> Self {
        Self {
            speaker: utterance.speaker.clone(),
            raw_text: utterance.raw_text.clone(),
            source_page: utterance.source_page,
        }
    }
}
