pub mod config;
pub mod error;
pub mod history;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod rules;
pub mod schedule;
pub mod stages;

pub use config::{ClassifyConfig, ParserConfig, PipelineConfig, RulesConfig, SegmenterConfig};
pub use error::{DocumentError, EmitError, HistoryError, ParseError, ScheduleError};
pub use history::{HistoryStore, JsonHistoryStore, MemoryHistoryStore};
pub use io::{load_document, HumanTranscript};
pub use models::{Document, Page, Utterance, UtteranceRecord};
pub use pipeline::{
    parse_document, process_document, run_batch, run_scheduled, run_with_history_file,
    DocumentOutcome, RunStats,
};
pub use rules::classify_line;
pub use schedule::WeeklySchedule;
pub use stages::{execute_stage1, execute_stage2, execute_stage3, write_records, Stage3Config};
