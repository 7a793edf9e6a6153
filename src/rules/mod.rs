pub mod noise;
pub mod procedural;
pub mod speaker;

pub use noise::*;
pub use procedural::*;
pub use speaker::*;

use crate::config::RulesConfig;
use crate::models::{Classification, LineKind};

/// Lightweight context for classifying one fragment
#[derive(Debug, Clone, Copy, Default)]
pub struct LineContext {
    /// Kind of the previous fragment on the same page (None at the top of a page)
    pub previous_kind: Option<LineKind>,
    /// Character offset of the fragment within its source line
    pub column: usize,
    /// Position of the source line among the page's non-blank lines
    pub position: usize,
    /// Number of non-blank lines on the page
    pub lines_on_page: usize,
    /// The line repeats verbatim in the margin of several pages
    pub repeated_margin: bool,
}

impl LineContext {
    /// Whether the line sits within `margin` lines of the top or bottom of the page
    pub fn near_page_edge(&self, margin: usize) -> bool {
        self.position < margin || self.position + margin >= self.lines_on_page
    }
}

/// Classify a single fragment.
///
/// Rules are applied in order: noise, procedural marker, speaker header, body
/// text. A speaker header must start at column 0; anything header-shaped
/// elsewhere stays body text and is flagged as low confidence.
pub fn classify_line(line: &str, ctx: &LineContext, config: &RulesConfig) -> Classification {
    let text = line.trim();

    if text.is_empty() || ctx.repeated_margin || is_punctuation_only(text) || is_footer_code(text) {
        return Classification::of(LineKind::Noise);
    }

    let at_top = matches!(ctx.previous_kind, None | Some(LineKind::Noise));
    if is_page_number(text, config.max_page_number)
        && (at_top || ctx.near_page_edge(config.page_number_margin))
    {
        return Classification::of(LineKind::Noise);
    }

    if is_procedural(text) {
        return Classification::of(LineKind::ProceduralMarker);
    }

    match match_speaker_header(text, config) {
        HeaderMatch::Header(header) if ctx.column == 0 => return Classification::header(header),
        HeaderMatch::Header(_) | HeaderMatch::Rejected => return Classification::uncertain_body(),
        HeaderMatch::NotHeader => {}
    }

    if !text.chars().any(char::is_alphabetic) {
        return Classification::uncertain_body();
    }

    Classification::of(LineKind::BodyText)
}
