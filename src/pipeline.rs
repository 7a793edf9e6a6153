use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::{ParserConfig, PipelineConfig};
use crate::error::{DocumentError, ParseError};
use crate::history::{HistoryStore, JsonHistoryStore};
use crate::io::{discover_documents, document_id_for, load_document};
use crate::models::{Document, DocumentStatus, HistoryEntry, LineKind, Utterance};
use crate::stages::{
    execute_stage1, execute_stage2, execute_stage3, validate_pages, Stage3Config,
};

/// Counters collected while parsing one document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    pub pages: usize,
    pub fragments: usize,
    pub headers: usize,
    pub body: usize,
    pub procedural: usize,
    pub noise: usize,
    /// Fragments kept as body text without a confident classification
    pub low_confidence: usize,
    /// Utterances discarded as extraction debris
    pub dropped_short: usize,
    pub utterances: usize,
}

/// Parser core output for one document
#[derive(Debug)]
pub struct ParseOutput {
    pub utterances: Vec<Utterance>,
    pub stats: ParseStats,
}

/// Parse a document's pages into utterances.
///
/// Pure in-memory transformation: validate page numbering, classify every
/// fragment, then segment the fragments into utterances.
pub fn parse_document(document: &Document, config: &ParserConfig) -> Result<ParseOutput, ParseError> {
    validate_pages(&document.document_id, &document.pages)?;

    let stage1 = execute_stage1(&document.pages, &config.classify, &config.rules);
    let stage2 = execute_stage2(&stage1.lines, &config.segmenter);

    let stats = ParseStats {
        pages: document.page_count(),
        fragments: stage1.lines.len(),
        headers: stage1.count(LineKind::SpeakerHeader),
        body: stage1.count(LineKind::BodyText),
        procedural: stage1.count(LineKind::ProceduralMarker),
        noise: stage1.count(LineKind::Noise),
        low_confidence: stage1.low_confidence,
        dropped_short: stage2.dropped_short,
        utterances: stage2.utterances.len(),
    };
    debug!("Parsed {}: {:?}", document.document_id, stats);

    if stage2.utterances.is_empty() {
        return Err(ParseError::EmptyDocument {
            document_id: document.document_id.clone(),
        });
    }

    Ok(ParseOutput {
        utterances: stage2.utterances,
        stats,
    })
}

/// What happened to one document in a batch
#[derive(Debug)]
pub enum DocumentOutcome {
    /// A success entry already existed
    Skipped,
    /// Output committed and history updated
    Parsed { records: usize, path: PathBuf },
    /// Nothing committed; a failure entry was recorded where possible
    Failed { error: DocumentError },
}

/// Parse, emit and record a single document.
///
/// History is consulted before parsing and updated only after the output
/// file has been committed. If the success entry cannot be written the
/// committed output is removed again.
pub fn process_document(
    document: &mut Document,
    history: &mut dyn HistoryStore,
    config: &PipelineConfig,
    run_id: Uuid,
) -> DocumentOutcome {
    if history.has_processed(&document.document_id) {
        info!("Skipping {}: already processed", document.document_id);
        return DocumentOutcome::Skipped;
    }

    match try_process(document, history, config, run_id) {
        Ok((records, path)) => {
            info!("Parsed {}: {} utterances", document.document_id, records);
            DocumentOutcome::Parsed { records, path }
        }
        Err(error) => {
            error!("Failed to process {}: {}", document.document_id, error);
            record_failure(history, &document.document_id, &error.to_string(), run_id);
            if let Err(e) = document.transition(DocumentStatus::Failed) {
                warn!("{}", e);
            }
            DocumentOutcome::Failed { error }
        }
    }
}

fn try_process(
    document: &mut Document,
    history: &mut dyn HistoryStore,
    config: &PipelineConfig,
    run_id: Uuid,
) -> Result<(usize, PathBuf), DocumentError> {
    if document.status() == DocumentStatus::Failed {
        document.transition(DocumentStatus::Downloaded)?;
    }

    let output = parse_document(document, &config.parser)?;
    document.check_transition(DocumentStatus::Parsed)?;

    let stage3_config = Stage3Config {
        output_dir: config.output_dir.clone(),
        generate_human: config.human_readable,
    };
    let emitted = execute_stage3(&document.document_id, &output.utterances, &stage3_config)?;

    let entry = HistoryEntry::success(&document.document_id, emitted.records).with_run_id(run_id);
    if let Err(e) = history.record(entry) {
        emitted.rollback();
        return Err(e.into());
    }
    document.transition(DocumentStatus::Parsed)?;

    Ok((emitted.records, emitted.jsonl_path))
}

fn record_failure(history: &mut dyn HistoryStore, document_id: &str, message: &str, run_id: Uuid) {
    let entry = HistoryEntry::failure(document_id, message).with_run_id(run_id);
    if let Err(e) = history.record(entry) {
        error!("Failed to record failure for {}: {}", document_id, e);
    }
}

/// Summary of one batch run
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub found: usize,
    pub skipped: usize,
    pub processed: usize,
    pub failed: usize,
}

impl RunStats {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Process every document in the inbox, in file-name order.
///
/// A failing document never stops the batch.
pub fn run_batch(config: &PipelineConfig, history: &mut dyn HistoryStore) -> Result<RunStats> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    info!("Run {}: scanning {:?}", run_id, config.inbox_dir);

    let paths = discover_documents(&config.inbox_dir)?;
    let mut stats = RunStats {
        run_id,
        started_at,
        finished_at: started_at,
        found: paths.len(),
        skipped: 0,
        processed: 0,
        failed: 0,
    };

    let mut seen: HashMap<String, &Path> = HashMap::new();

    for path in &paths {
        let Some(mut document) = open_document(path, history, run_id) else {
            stats.failed += 1;
            continue;
        };

        if let Some(first) = seen.get(&document.document_id) {
            let message = format!("document id also used by {:?}", first);
            error!("Failed to process {:?} ({}): {}", path, document.document_id, message);
            record_failure(history, &document.document_id, &message, run_id);
            stats.failed += 1;
            continue;
        }
        seen.insert(document.document_id.clone(), path);

        match process_document(&mut document, history, config, run_id) {
            DocumentOutcome::Skipped => stats.skipped += 1,
            DocumentOutcome::Parsed { .. } => stats.processed += 1,
            DocumentOutcome::Failed { .. } => stats.failed += 1,
        }
    }

    stats.finished_at = Utc::now();
    info!(
        "Run {} complete: {} found, {} processed, {} skipped, {} failed",
        run_id, stats.found, stats.processed, stats.skipped, stats.failed
    );
    Ok(stats)
}

/// Open the history file and run one batch over the inbox
pub fn run_with_history_file(config: &PipelineConfig) -> Result<RunStats> {
    let mut history =
        JsonHistoryStore::open(&config.history_file).context("Failed to open history")?;
    run_batch(config, &mut history)
}

/// One scheduled batch. Errors are logged and the schedule keeps going.
pub fn run_scheduled(config: &PipelineConfig) -> Option<RunStats> {
    match run_with_history_file(config) {
        Ok(stats) => Some(stats),
        Err(e) => {
            error!("Batch run failed: {:#}", e);
            None
        }
    }
}

/// Load a discovered file, recording a failure when it cannot be read
fn open_document(path: &Path, history: &mut dyn HistoryStore, run_id: Uuid) -> Option<Document> {
    let mut document = Document::discovered(document_id_for(path));

    let attached = load_document(path).and_then(|loaded| {
        document.document_id = loaded.document_id;
        document.attach_pages(loaded.pages).map_err(anyhow::Error::from)
    });

    match attached {
        Ok(()) => Some(document),
        Err(e) => {
            error!("Failed to load {:?}: {:#}", path, e);
            record_failure(history, &document.document_id, &format!("{:#}", e), run_id);
            if let Err(e) = document.transition(DocumentStatus::Failed) {
                warn!("{}", e);
            }
            None
        }
    }
}
