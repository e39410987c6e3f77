//! Import summary rendering

pub mod json;
pub mod markdown;

use crate::ingestion::ImportSummary;
use crate::CoreResult;

/// Summary output format
pub enum ReportFormat {
    Json,
    Markdown,
}

/// Render an import summary in the requested format
pub fn render(summary: &ImportSummary, format: ReportFormat) -> CoreResult<String> {
    match format {
        ReportFormat::Json => json::render(summary),
        ReportFormat::Markdown => Ok(markdown::render(summary)),
    }
}
