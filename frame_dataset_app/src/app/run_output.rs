use std::io::{prelude::*, BufWriter};

use frame_dataset_lib::{RunSummary, StageOutcome};

use super::{AppError, OutputFormat};

fn outcome_str(outcome: StageOutcome) -> &'static str {
    match outcome {
        StageOutcome::Skipped => "skipped (cached)",
        StageOutcome::Executed => "done",
    }
}

/// Human readable summary of a run.
pub fn normal_summary(summary: &RunSummary) -> String {
    let report = &summary.report;
    let mut lines = vec![
        format!("run id:     {}", summary.run_id),
        format!("input:      {}", summary.input_path.display()),
    ];

    for record in &summary.stages {
        lines.push(format!("{:<11} {}", format!("{}:", record.stage), outcome_str(record.outcome)));
    }

    lines.push(format!(
        "frames:     {} total, {} kept, {} duplicates, {} unreadable (threshold {})",
        report.total,
        report.kept,
        report.duplicates,
        report.unreadable_files.len(),
        report.threshold
    ));
    lines.push(format!("archive:    {}", summary.archive.display()));

    lines.join("\n")
}

pub fn write_summary(summary: &RunSummary, format: OutputFormat, out: impl Write) -> Result<(), AppError> {
    let write_err = |src: std::io::Error| AppError::SummaryWrite { src };

    let mut out = BufWriter::new(out);
    match format {
        OutputFormat::Normal => {
            writeln!(out, "{}", normal_summary(summary)).map_err(write_err)?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, summary)?;
            writeln!(out).map_err(write_err)?;
        }
    }
    out.flush().map_err(write_err)
}
