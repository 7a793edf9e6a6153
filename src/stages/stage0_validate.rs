use crate::error::ParseError;
use crate::models::Page;

/// Perform Stage 0: page sequence validation
///
/// Pages must start at 1 and increase by exactly one. Gaps and duplicates are
/// extraction-quality errors and fail the document; a document with no text at
/// all is reported as empty.
pub fn validate_pages(document_id: &str, pages: &[Page]) -> Result<(), ParseError> {
    for (expected, page) in (1u32..).zip(pages) {
        if page.page_number != expected {
            return Err(ParseError::ExtractionGap {
                document_id: document_id.to_string(),
                expected,
                found: page.page_number,
            });
        }
    }

    if pages.iter().all(|p| !p.has_content()) {
        return Err(ParseError::EmptyDocument {
            document_id: document_id.to_string(),
        });
    }

    Ok(())
}
