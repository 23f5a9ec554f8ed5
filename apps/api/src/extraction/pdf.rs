use async_trait::async_trait;
use tracing::{debug, info};

use super::{structure, Extraction, ParseError, ResumeParser, ResumeSource};

/// Reads the uploaded PDF from disk and structures its text in-process.
#[derive(Debug, Clone, Default)]
pub struct LocalPdfParser;

/// Extracts plain text from PDF bytes on the blocking pool.
pub async fn extract_text(bytes: Vec<u8>) -> Result<String, ParseError> {
    tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| ParseError::Pdf(e.to_string()))
    })
    .await?
}

#[async_trait]
impl ResumeParser for LocalPdfParser {
    async fn parse(&self, source: &ResumeSource) -> Result<Extraction, ParseError> {
        let bytes = tokio::fs::read(&source.path).await?;
        debug!("Read {} bytes from {}", bytes.len(), source.path.display());

        let text = extract_text(bytes).await?;
        if text.split_whitespace().next().is_none() {
            return Err(ParseError::Empty);
        }

        let extraction = structure(&text);
        info!(
            "Local extraction of {}: confidence {:.2}, matched {:?}",
            source.path.display(),
            extraction.confidence,
            extraction.matched
        );
        Ok(extraction)
    }
}
