//! Markdown summary output

use crate::ingestion::{ImportSummary, IngestionOutcome};

pub fn render(summary: &ImportSummary) -> String {
    let mut s = String::new();

    s.push_str("# Certificate import summary\n\n");
    s.push_str(&format!("**Items processed:** {}\n\n", summary.total()));
    s.push_str("| Bucket | Count |\n");
    s.push_str("|--------|-------|\n");
    s.push_str(&format!("| Imported | {} |\n", summary.imported));
    s.push_str(&format!("| Duplicates | {} |\n", summary.duplicates));
    s.push_str(&format!(
        "| Employee not found | {} |\n",
        summary.employees_not_found
    ));
    s.push_str(&format!(
        "| Type not found | {} |\n",
        summary.types_not_found
    ));
    s.push_str(&format!("| Parse errors | {} |\n", summary.parse_errors));
    s.push('\n');

    if !summary.outcomes.is_empty() {
        s.push_str("## Items\n\n");
        for outcome in &summary.outcomes {
            s.push_str(&outcome_line(outcome));
            s.push('\n');
        }
    }

    s
}

fn outcome_line(outcome: &IngestionOutcome) -> String {
    match outcome {
        IngestionOutcome::Imported {
            source,
            serial,
            owner_name,
            record_id,
        } => format!("- `{source}`: imported serial `{serial}` for {owner_name} ({record_id})"),
        IngestionOutcome::Duplicate {
            source,
            serial,
            existing_id: Some(id),
        } => format!("- `{source}`: duplicate of stored record {id} (serial `{serial}`)"),
        IngestionOutcome::Duplicate {
            source,
            serial,
            existing_id: None,
        } => format!("- `{source}`: duplicate of an earlier item in this batch (serial `{serial}`)"),
        IngestionOutcome::EmployeeNotFound { source, owner_name } if owner_name.is_empty() => {
            format!("- `{source}`: subject carries no usable owner name")
        }
        IngestionOutcome::EmployeeNotFound { source, owner_name } => {
            format!("- `{source}`: no employee record for \"{owner_name}\"")
        }
        IngestionOutcome::TypeNotFound { source, label } => {
            format!("- `{source}`: unknown certificate type \"{label}\"")
        }
        IngestionOutcome::ParseError { source, error } => {
            format!("- `{source}`: {error}")
        }
    }
}
