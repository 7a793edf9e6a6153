use std::path::PathBuf;

/// Tuning for the line classification rules
#[derive(Debug, Clone)]
pub struct RulesConfig {
    /// Shortest accepted speaker name, in characters
    pub min_name_chars: usize,
    /// Longest accepted speaker name, in characters
    pub max_name_chars: usize,
    /// Maximum number of words in a speaker name
    pub max_name_words: usize,
    /// Lower-case words that never occur in a speaker name
    pub poison_words: Vec<String>,
    /// Highest number treated as a bare page number
    pub max_page_number: u32,
    /// Lines from the top or bottom of a page that may hold a page number
    pub page_number_margin: usize,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            min_name_chars: 3,
            max_name_chars: 50,
            max_name_words: 6,
            poison_words: [
                "следното", "вкупно", "износ", "камата", "транша", "повлекување",
                "отплата", "главница", "денари", "евра", "процент", "година", "години",
                "гласаа", "против", "воздржани", "предлог", "закон", "член",
                "точка", "амандман", "седница", "дневен", "записник", "верификација",
                "констатирам", "усвоени", "известени", "поканети", "дека", "собранието",
                "владата", "пратениците", "вели", "вика", "рече", "кажа", "во",
                "овој", "контекст", "еве",
            ]
            .iter()
            .map(|w| w.to_string())
            .collect(),
            max_page_number: 500,
            page_number_margin: 2,
        }
    }
}

/// Settings for stage 1 (page-level classification)
#[derive(Debug, Clone)]
pub struct ClassifyConfig {
    /// Lines at the top and bottom of a page checked for repeated margins
    pub margin_lines: usize,
    /// Pages a margin line must repeat on to be treated as a running header/footer
    pub min_repeated_pages: usize,
    /// Share of the document's pages a running header/footer must appear on
    pub min_repeated_ratio: f64,
    /// Lines an unclosed bracketed annotation may continue over
    pub max_annotation_lines: usize,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            margin_lines: 3,
            min_repeated_pages: 3,
            min_repeated_ratio: 0.5,
            max_annotation_lines: 4,
        }
    }
}

/// Settings for stage 2 (utterance segmentation)
#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    /// Utterances shorter than this (in characters) are discarded
    pub min_utterance_chars: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            min_utterance_chars: 3,
        }
    }
}

/// Everything the parser core needs
#[derive(Debug, Clone, Default)]
pub struct ParserConfig {
    pub rules: RulesConfig,
    pub classify: ClassifyConfig,
    pub segmenter: SegmenterConfig,
}

/// Filesystem layout for batch runs
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory of extracted page-text documents
    pub inbox_dir: PathBuf,
    /// Directory receiving `<document_id>.jsonl` files
    pub output_dir: PathBuf,
    /// JSON file holding the processing history
    pub history_file: PathBuf,
    /// Also write `<document_id>.txt` human-readable renderings
    pub human_readable: bool,
    pub parser: ParserConfig,
}

impl PipelineConfig {
    /// Lay out the pipeline under a single data directory
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            inbox_dir: data_dir.join("raw"),
            output_dir: data_dir.join("processed"),
            history_file: data_dir.join("history.json"),
            human_readable: false,
            parser: ParserConfig::default(),
        }
    }

    /// Use `SOBRANIE_DATA_DIR` when set, `./data` otherwise
    pub fn from_env() -> Self {
        let data_dir = std::env::var("SOBRANIE_DATA_DIR").unwrap_or_else(|_| "data".to_string());
        Self::with_data_dir(data_dir)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::with_data_dir("data")
    }
}
