use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::EmitError;
use crate::io::{output_file_name, write_jsonl, HumanTranscript, StagedFile};
use crate::models::Utterance;

/// Configuration for Stage 3 emission
#[derive(Debug, Clone)]
pub struct Stage3Config {
    /// Directory receiving the output files
    pub output_dir: PathBuf,
    /// Whether to generate human-readable output
    pub generate_human: bool,
}

impl Stage3Config {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            generate_human: false,
        }
    }
}

/// Files published by Stage 3
#[derive(Debug)]
pub struct Stage3Result {
    /// Path to the JSON Lines output
    pub jsonl_path: PathBuf,
    /// Path to the human transcript (if generated)
    pub human_path: Option<PathBuf>,
    /// Number of records written
    pub records: usize,
}

impl Stage3Result {
    /// Remove the published files again
    pub fn rollback(self) {
        for path in std::iter::once(self.jsonl_path).chain(self.human_path) {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!("Failed to remove {:?} during rollback: {}", path, e);
            }
        }
    }
}

/// Execute Stage 3: emission
///
/// Writes `<document_id>.jsonl` into the output directory through a staging
/// file. Nothing is visible under the final name unless every record was
/// written and synced.
pub fn execute_stage3(
    document_id: &str,
    utterances: &[Utterance],
    config: &Stage3Config,
) -> Result<Stage3Result, EmitError> {
    let jsonl_path = config.output_dir.join(output_file_name(document_id, "jsonl")?);
    let human_path = config.output_dir.join(output_file_name(document_id, "txt")?);
    let records = write_records(&jsonl_path, utterances)?;
    info!("Wrote {} records to {:?}", records, jsonl_path);

    let mut result = Stage3Result {
        jsonl_path,
        human_path: None,
        records,
    };

    if config.generate_human {
        if let Err(e) = HumanTranscript::new(utterances).write_file(&human_path) {
            result.rollback();
            return Err(e);
        }
        info!("Wrote human transcript to {:?}", human_path);
        result.human_path = Some(human_path);
    }

    Ok(result)
}

/// Write utterances as JSON Lines to `path` atomically
pub fn write_records(path: &Path, utterances: &[Utterance]) -> Result<usize, EmitError> {
    let mut staged = StagedFile::create(path)?;
    let records = write_jsonl(&mut staged, utterances).map_err(|source| EmitError::Io {
        path: staged.staging_path().to_path_buf(),
        source,
    })?;
    staged.flush().map_err(|source| EmitError::Io {
        path: staged.staging_path().to_path_buf(),
        source,
    })?;
    staged.commit()?;
    Ok(records)
}
