use std::fmt::Write;

use cfgsweep_core::{AppError, AppResult};
use cfgsweep_domain::{DeletionOutcome, RunReport};

use crate::cli::OutputFormat;

/// Renders the final run report for stdout.
pub fn render(report: &RunReport, format: OutputFormat) -> AppResult<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report).map_err(|error| {
            AppError::Internal(format!("failed to serialize run report: {error}"))
        }),
        OutputFormat::Text => render_text(report)
            .map_err(|error| AppError::Internal(format!("failed to render run report: {error}"))),
    }
}

fn render_text(report: &RunReport) -> Result<String, std::fmt::Error> {
    let mut output = String::new();
    let mode = if report.dry_run() { " (dry run)" } else { "" };

    writeln!(
        output,
        "sweep {} of namespace '{}'{mode} at {}",
        report.run_id(),
        report.namespace(),
        report.started_at().to_rfc3339()
    )?;

    for kind_report in report.kinds() {
        writeln!(
            output,
            "{}: examined {}, selected {}",
            kind_report.kind(),
            kind_report.examined(),
            kind_report.selected()
        )?;

        for record in kind_report.records() {
            match &record.outcome {
                DeletionOutcome::Deleted => writeln!(output, "  deleted  {}", record.object)?,
                DeletionOutcome::Skipped(reason) => writeln!(
                    output,
                    "  skipped  {} ({})",
                    record.object,
                    reason.as_str()
                )?,
                DeletionOutcome::Failed(error) => {
                    writeln!(output, "  failed   {}: {error}", record.object)?;
                }
            }
        }
    }

    write!(
        output,
        "deleted {}, skipped {}, failed {}",
        report.deleted_count(),
        report.skipped_count(),
        report.failed_count()
    )?;

    Ok(output)
}
