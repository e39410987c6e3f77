//! JSON summary output

use crate::ingestion::ImportSummary;
use crate::{CoreError, CoreResult};

pub fn render(summary: &ImportSummary) -> CoreResult<String> {
    serde_json::to_string_pretty(summary).map_err(|e| CoreError::Report(e.to_string()))
}
