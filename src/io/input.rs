use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::{Document, Page};

/// Page separator emitted by PDF text extractors
const FORM_FEED: char = '\u{000C}';

/// On-disk JSON shape of an extracted document
#[derive(Debug, Deserialize)]
struct ExtractedDocument {
    #[serde(default)]
    document_id: Option<String>,
    pages: Vec<Page>,
}

/// List extracted documents in the inbox, sorted by file name
pub fn discover_documents(inbox: &Path) -> Result<Vec<PathBuf>> {
    if !inbox.exists() {
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(inbox)
        .with_context(|| format!("Failed to read inbox: {:?}", inbox))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_supported(path))
        .collect();
    paths.sort();
    Ok(paths)
}

fn is_supported(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref(),
        Some("json") | Some("txt")
    )
}

/// Document id derived from a file name
pub fn document_id_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

/// Load an extracted document from a `.json` or form-feed separated `.txt` file
pub fn load_document(path: &Path) -> Result<Document> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {:?}", path))?;
    let default_id = document_id_for(path);

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        parse_document_json(&content, &default_id)
            .with_context(|| format!("Failed to parse document: {:?}", path))
    } else {
        Ok(Document::new(default_id, split_form_feed_pages(&content)))
    }
}

/// Parse the JSON page list of one document
pub fn parse_document_json(json: &str, default_id: &str) -> Result<Document> {
    let extracted: ExtractedDocument =
        serde_json::from_str(json).context("Failed to parse extracted pages JSON")?;
    let document_id = extracted
        .document_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| default_id.to_string());
    Ok(Document::new(document_id, extracted.pages))
}

/// Split extractor output into pages at form feeds, numbering them from 1
pub fn split_form_feed_pages(text: &str) -> Vec<Page> {
    let mut parts: Vec<&str> = text.split(FORM_FEED).collect();
    if parts.len() > 1 && parts.last().is_some_and(|p| p.trim().is_empty()) {
        parts.pop();
    }
    (1u32..)
        .zip(parts)
        .map(|(number, part)| Page::new(number, part))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document_json() {
        let json = r#"{
            "document_id": "sednica_075_00_2024-03-01",
            "pages": [
                {"page_number": 1, "text": "ПРЕТСЕДАВАЧ: Отворам седница."},
                {"page_number": 2, "text": "(Аплауз)"}
            ]
        }"#;

        let document = parse_document_json(json, "fallback").unwrap();

        assert_eq!(document.document_id, "sednica_075_00_2024-03-01");
        assert_eq!(document.pages.len(), 2);
        assert_eq!(document.pages[1].page_number, 2);
    }

    #[test]
    fn test_document_id_defaults_to_file_stem() {
        let json = r#"{"pages": [{"page_number": 1, "text": "x"}]}"#;
        let document = parse_document_json(json, "sednica_001").unwrap();
        assert_eq!(document.document_id, "sednica_001");
    }

    #[test]
    fn test_split_form_feed_pages() {
        let pages = split_form_feed_pages("прва страна\u{000C}втора страна\u{000C}");
        assert_eq!(
            pages,
            vec![Page::new(1, "прва страна"), Page::new(2, "втора страна")]
        );
    }

    #[test]
    fn test_discover_and_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "страна\u{000C}страна").unwrap();
        std::fs::write(
            dir.path().join("a.json"),
            r#"{"pages": [{"page_number": 1, "text": "x"}]}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.pdf"), "binary").unwrap();

        let paths = discover_documents(dir.path()).unwrap();
        let names: Vec<String> = paths.iter().map(|p| document_id_for(p)).collect();
        assert_eq!(names, vec!["a", "b"]);

        let document = load_document(&paths[1]).unwrap();
        assert_eq!(document.document_id, "b");
        assert_eq!(document.page_count(), 2);
    }

    #[test]
    fn test_missing_inbox_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_documents(&dir.path().join("missing")).unwrap().is_empty());
    }
}
