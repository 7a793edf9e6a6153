use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// A single page of extracted text, the unit of provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number within the document
    pub page_number: u32,
    /// Raw text as produced by the extraction tool
    #[serde(alias = "raw_text")]
    pub text: String,
}

impl Page {
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
        }
    }

    /// Whether the page carries any non-whitespace text
    pub fn has_content(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Processing status of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Known to exist, text not yet available
    Discovered,
    /// Page text available, waiting to be parsed
    Downloaded,
    /// Parsed and committed; terminal
    Parsed,
    /// Parsing failed; may be re-queued
    Failed,
}

impl DocumentStatus {
    fn can_transition_to(self, next: DocumentStatus) -> bool {
        use DocumentStatus::*;
        matches!(
            (self, next),
            (Discovered, Downloaded)
                | (Discovered, Failed)
                | (Downloaded, Parsed)
                | (Downloaded, Failed)
                | (Failed, Downloaded)
        )
    }
}

/// One stenographic session with its pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub document_id: String,
    pub pages: Vec<Page>,
    #[serde(skip, default = "default_status")]
    status: DocumentStatus,
}

fn default_status() -> DocumentStatus {
    DocumentStatus::Downloaded
}

impl Document {
    /// Create a document whose page text is already available
    pub fn new(document_id: impl Into<String>, pages: Vec<Page>) -> Self {
        Self {
            document_id: document_id.into(),
            pages,
            status: DocumentStatus::Downloaded,
        }
    }

    /// Create a placeholder for a document that has been discovered but not fetched
    pub fn discovered(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            pages: Vec::new(),
            status: DocumentStatus::Discovered,
        }
    }

    pub fn status(&self) -> DocumentStatus {
        self.status
    }

    /// Move to the next lifecycle state, rejecting anything a parsed document
    /// or an illegal edge would allow
    pub fn transition(&mut self, next: DocumentStatus) -> Result<(), ParseError> {
        self.check_transition(next)?;
        self.status = next;
        Ok(())
    }

    /// Fail if the document cannot move to `next` from its current state
    pub fn check_transition(&self, next: DocumentStatus) -> Result<(), ParseError> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(ParseError::InvalidTransition {
                document_id: self.document_id.clone(),
                from: self.status,
                to: next,
            })
        }
    }

    /// Attach fetched page text to a discovered document
    pub fn attach_pages(&mut self, pages: Vec<Page>) -> Result<(), ParseError> {
        self.transition(DocumentStatus::Downloaded)?;
        self.pages = pages;
        Ok(())
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}
