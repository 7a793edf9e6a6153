use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::EmitError;
use crate::models::{Utterance, UtteranceRecord};

/// Write utterances as JSON Lines, one self-contained record per line.
///
/// Returns the number of records written.
pub fn write_jsonl<W: Write>(writer: &mut W, utterances: &[Utterance]) -> io::Result<usize> {
    for utterance in utterances {
        serde_json::to_writer(&mut *writer, &UtteranceRecord::from(utterance))?;
        writer.write_all(b"\n")?;
    }
    Ok(utterances.len())
}

/// Render utterances as a JSON Lines string
pub fn to_jsonl_string(utterances: &[Utterance]) -> Result<String, EmitError> {
    let mut output = String::new();
    for utterance in utterances {
        output.push_str(&serde_json::to_string(&UtteranceRecord::from(utterance))?);
        output.push('\n');
    }
    Ok(output)
}

/// File name for a document's output.
///
/// Ids are used verbatim, so anything that is not a plain file stem (path
/// separators, leading dots, spaces) is rejected rather than rewritten.
pub fn output_file_name(document_id: &str, extension: &str) -> Result<String, EmitError> {
    let valid = !document_id.is_empty()
        && !document_id.starts_with('.')
        && document_id
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid {
        return Err(EmitError::InvalidDocumentId(document_id.to_string()));
    }
    Ok(format!("{}.{}", document_id, extension))
}

/// A file written next to its final location and published by rename.
///
/// Dropping it without `commit` removes the staging file.
pub struct StagedFile {
    staging: PathBuf,
    target: PathBuf,
    writer: Option<BufWriter<File>>,
    committed: bool,
}

impl StagedFile {
    /// Open a hidden staging file in the target's directory
    pub fn create(target: &Path) -> Result<Self, EmitError> {
        let dir = target.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|source| EmitError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        let staging = dir.join(format!(".{}.partial", file_name));
        let file = File::create(&staging).map_err(|source| EmitError::Io {
            path: staging.clone(),
            source,
        })?;
        Ok(Self {
            staging,
            target: target.to_path_buf(),
            writer: Some(BufWriter::new(file)),
            committed: false,
        })
    }

    pub fn staging_path(&self) -> &Path {
        &self.staging
    }

    /// Flush, sync and rename the staging file onto the target
    pub fn commit(mut self) -> Result<PathBuf, EmitError> {
        if let Some(writer) = self.writer.take() {
            let file = writer.into_inner().map_err(|e| EmitError::Io {
                path: self.staging.clone(),
                source: e.into_error(),
            })?;
            file.sync_all().map_err(|source| EmitError::Io {
                path: self.staging.clone(),
                source,
            })?;
        }
        fs::rename(&self.staging, &self.target).map_err(|source| EmitError::Io {
            path: self.target.clone(),
            source,
        })?;
        self.committed = true;
        Ok(self.target.clone())
    }
}

impl Write for StagedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.writer.as_mut() {
            Some(writer) => writer.write(buf),
            None => Err(io::Error::other("staged file already closed")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            self.writer = None;
            let _ = fs::remove_file(&self.staging);
        }
    }
}

/// Write `content` to `path` atomically
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<(), EmitError> {
    let mut staged = StagedFile::create(path)?;
    staged.write_all(content).map_err(|source| EmitError::Io {
        path: staged.staging_path().to_path_buf(),
        source,
    })?;
    staged.commit()?;
    Ok(())
}

/// Human-readable transcript format
pub struct HumanTranscript<'a> {
    utterances: &'a [Utterance],
}

impl<'a> HumanTranscript<'a> {
    pub fn new(utterances: &'a [Utterance]) -> Self {
        Self { utterances }
    }

    /// Format the transcript as human-readable text
    pub fn format(&self) -> String {
        let mut output = String::new();

        for utterance in self.utterances {
            if utterance.is_procedural() {
                output.push_str(&format!("[p. {}] {}\n\n", utterance.source_page, utterance.raw_text));
                continue;
            }

            let pages = if utterance.spans_pages() {
                format!("pp. {}-{}", utterance.source_page, utterance.end_page)
            } else {
                format!("p. {}", utterance.source_page)
            };
            match &utterance.role {
                Some(role) => output.push_str(&format!("[{}] {} ({}):\n", pages, utterance.speaker, role)),
                None => output.push_str(&format!("[{}] {}:\n", pages, utterance.speaker)),
            }

            output.push_str(&wrap_text(&utterance.raw_text, 80));
            output.push_str("\n\n");
        }

        output
    }

    /// Write to a text file
    pub fn write_file(&self, path: &Path) -> Result<(), EmitError> {
        write_atomic(path, self.format().as_bytes())
    }
}

/// Wrap text at approximately the given width
fn wrap_text(text: &str, width: usize) -> String {
    let mut result = String::new();
    let mut line_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if line_len + word_len + 1 > width && line_len > 0 {
            result.push('\n');
            line_len = 0;
        }
        if line_len > 0 {
            result.push(' ');
            line_len += 1;
        }
        result.push_str(word);
        line_len += word_len;
    }

    result
}
