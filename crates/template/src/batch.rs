//! Batch generation: one output file per dataset row
//!
//! The template is decoded once. A row that fails to render or write is
//! recorded and the batch moves on to the next row. Rows whose names
//! collide overwrite the earlier file and are reported.

use crate::filename::render_filename;
use crate::renderer::{load_template, Renderer};
use crate::schema::{OutputFormat, Row, TextField};
use crate::{Result, TemplateError};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{info, warn};

/// Everything needed to generate a batch
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub template: PathBuf,
    pub fields: Vec<TextField>,
    pub rows: Vec<Row>,
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    /// File name pattern, see [`crate::filename`]
    pub pattern: String,
    /// Field naming files when `pattern` is empty
    pub fallback_field: String,
}

/// A row that could not be generated
#[derive(Debug)]
pub struct RowFailure {
    /// 1-based row number
    pub index: usize,
    /// Path the row would have been written to
    pub path: PathBuf,
    pub error: TemplateError,
}

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Files written, in row order
    pub written: Vec<PathBuf>,
    pub failures: Vec<RowFailure>,
    /// Files replaced by a later row of the same batch, once per overwrite
    pub overwritten: Vec<PathBuf>,
}

impl BatchReport {
    /// Number of rows written successfully
    pub fn succeeded(&self) -> usize {
        self.written.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Render every row of `job`
///
/// Fails as a whole only when the output directory cannot be created or the
/// template cannot be decoded; per-row errors end up in the report.
pub fn run_batch(renderer: &mut Renderer, job: &BatchJob) -> Result<BatchReport> {
    std::fs::create_dir_all(&job.output_dir)?;
    let template = load_template(&job.template)?;

    let mut report = BatchReport::default();
    let mut seen = HashSet::new();
    for (i, row) in job.rows.iter().enumerate() {
        let index = i + 1;
        let base = render_filename(&job.pattern, row, index, &job.fallback_field);
        let path = job
            .output_dir
            .join(format!("{base}.{}", job.format.extension()));

        match renderer.write_file(&template, &job.fields, row, &path, job.format) {
            Ok(written) => {
                info!(row = index, path = %written.display(), "generated");
                if !seen.insert(written.clone()) {
                    warn!(row = index, path = %written.display(), "overwrote a file from an earlier row");
                    report.overwritten.push(written.clone());
                }
                report.written.push(written);
            }
            Err(error) => {
                warn!(row = index, path = %path.display(), error = %error, "row failed");
                report.failures.push(RowFailure { index, path, error });
            }
        }
    }

    info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        overwritten = report.overwritten.len(),
        total = job.rows.len(),
        "batch finished"
    );
    Ok(report)
}
