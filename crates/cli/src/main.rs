//! # certgen
//!
//! Batch certificate generator: draws dataset rows onto a template image.
//!
//! ## Usage
//!
//! ```bash
//! # Render the first row to preview.png
//! certgen preview job.json
//!
//! # One PDF per CSV row, named by index and recipient
//! certgen generate job.json --data names.csv --format pdf --pattern "{index:3}_{Name}"
//!
//! # Validate a project against its dataset
//! certgen check job.json
//!
//! # Start a dataset for the project's fields
//! certgen csv-header job.json --out names.csv
//! ```

mod logging;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use template::locator::resolve_field_fonts;
use template::{
    field_names, render_filename, run_batch, BatchJob, Dataset, FontLocator, OutputFormat,
    Project, Renderer, SystemFontLocator,
};
use tracing::info;

/// certgen - certificate generator
#[derive(Parser, Debug)]
#[command(name = "certgen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render one dataset row to a PNG
    Preview {
        /// Project file
        project: PathBuf,

        /// Row to render, counting from 1
        #[arg(long, default_value = "1")]
        row: usize,

        /// CSV dataset (overrides the project)
        #[arg(long, value_name = "CSV")]
        data: Option<PathBuf>,

        /// Output image
        #[arg(long, value_name = "FILE", default_value = "preview.png")]
        out: PathBuf,
    },

    /// Render every dataset row to its own file
    Generate {
        /// Project file
        project: PathBuf,

        /// CSV dataset (overrides the project)
        #[arg(long, value_name = "CSV")]
        data: Option<PathBuf>,

        /// Output directory (overrides the project)
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,

        /// png or pdf (overrides the project)
        #[arg(long)]
        format: Option<OutputFormat>,

        /// File name pattern, e.g. "{index:3}_{Name}" (overrides the project)
        #[arg(long)]
        pattern: Option<String>,

        /// Field naming files when the pattern is empty
        #[arg(long)]
        filename_field: Option<String>,
    },

    /// Validate a project and its dataset
    Check {
        /// Project file
        project: PathBuf,

        /// CSV dataset (overrides the project)
        #[arg(long, value_name = "CSV")]
        data: Option<PathBuf>,
    },

    /// Show the font file a family name resolves to
    Font {
        /// Font family, e.g. "DejaVu Sans"
        family: String,
    },

    /// Write an empty CSV whose header is the project's field list
    CsvHeader {
        /// Project file
        project: PathBuf,

        /// CSV file to write
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Preview {
            project,
            row,
            data,
            out,
        } => {
            let project = load_project(&project)?;
            let dataset = load_dataset(&project, data.as_deref())?;
            let Some(values) = row.checked_sub(1).and_then(|i| dataset.rows.get(i)) else {
                bail!("row {row} is out of range (dataset has {} rows)", dataset.len());
            };

            let written = Renderer::new()
                .render_to_file(&project.template, &project.fields, values, &out, OutputFormat::Png)
                .with_context(|| format!("rendering row {row}"))?;
            println!("{}", written.display());
        }

        Commands::Generate {
            project,
            data,
            out_dir,
            format,
            pattern,
            filename_field,
        } => {
            let mut project = load_project(&project)?;
            if let Some(field) = filename_field {
                project.filename_field = Some(field);
            }
            let dataset = load_dataset(&project, data.as_deref())?;

            let job = BatchJob {
                template: project.template.clone(),
                fields: project.fields.clone(),
                rows: dataset.rows,
                output_dir: out_dir.unwrap_or_else(|| project.output_dir.clone()),
                format: format.unwrap_or(project.format),
                pattern: pattern.unwrap_or_else(|| project.filename_pattern.clone()),
                fallback_field: project.filename_field(),
            };

            let report = run_batch(&mut Renderer::new(), &job)
                .with_context(|| format!("generating into {}", job.output_dir.display()))?;
            for failure in &report.failures {
                eprintln!(
                    "row {}: {} ({})",
                    failure.index,
                    failure.error,
                    failure.path.display()
                );
            }
            for path in &report.overwritten {
                eprintln!("overwritten by a later row: {}", path.display());
            }
            println!(
                "Generated {} of {} files in {}",
                report.succeeded(),
                job.rows.len(),
                job.output_dir.display()
            );
            if !report.is_complete() {
                bail!("{} rows failed", report.failed());
            }
        }

        Commands::Check { project, data } => {
            let project = load_project(&project)?;
            println!("Template: {}", project.template.display());
            println!("Fields: {}", field_names(&project.fields).join(", "));

            let csv = data.or_else(|| project.data.clone());
            let dataset = match &csv {
                Some(path) => {
                    let headers = Dataset::read_csv_headers(path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    let missing: Vec<_> = project
                        .fields
                        .iter()
                        .filter(|f| !headers.contains(&f.name))
                        .map(|f| f.name.as_str())
                        .collect();
                    if !missing.is_empty() {
                        println!("Columns missing from {}: {}", path.display(), missing.join(", "));
                    }
                    Dataset::read_csv(path, field_names(&project.fields))?
                }
                None => Dataset::new(field_names(&project.fields)),
            };
            println!("Rows: {}", dataset.len());

            if let Some(first) = dataset.rows.first() {
                let base = render_filename(
                    &project.filename_pattern,
                    first,
                    1,
                    &project.filename_field(),
                );
                println!("First file: {base}.{}", project.format.extension());
            }
        }

        Commands::Font { family } => match SystemFontLocator::shared().locate(&family) {
            Some(path) => println!("{}", path.display()),
            None => bail!("no font file found for '{family}'"),
        },

        Commands::CsvHeader { project, out } => {
            let project = load_project(&project)?;
            let mut dataset = Dataset::new(field_names(&project.fields));
            dataset.rows.clear();
            dataset
                .write_csv(&out)
                .with_context(|| format!("writing {}", out.display()))?;
            println!("{}", out.display());
        }
    }

    Ok(())
}

/// Load a project and fill in font files for fields that only name a family
fn load_project(path: &Path) -> Result<Project> {
    let mut project =
        Project::load(path).with_context(|| format!("loading project {}", path.display()))?;
    let resolved = resolve_field_fonts(&mut project.fields, SystemFontLocator::shared());
    info!(
        project = %path.display(),
        fields = project.fields.len(),
        fonts_resolved = resolved,
        "loaded project"
    );
    Ok(project)
}

/// Rows from `data`, else the project's dataset, else a single blank row
fn load_dataset(project: &Project, data: Option<&Path>) -> Result<Dataset> {
    let columns = field_names(&project.fields);
    match data.or(project.data.as_deref()) {
        Some(path) => Dataset::read_csv(path, columns)
            .with_context(|| format!("reading dataset {}", path.display())),
        None => Ok(Dataset::new(columns)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_overrides() {
        let cli = Cli::try_parse_from([
            "certgen", "-vv", "generate", "job.json", "--format", "pdf", "--pattern", "{index}",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Generate {
                project,
                format,
                pattern,
                out_dir,
                ..
            } => {
                assert_eq!(project, PathBuf::from("job.json"));
                assert_eq!(format, Some(OutputFormat::Pdf));
                assert_eq!(pattern.as_deref(), Some("{index}"));
                assert_eq!(out_dir, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_bad_format_rejected() {
        assert!(Cli::try_parse_from(["certgen", "generate", "job.json", "--format", "jpg"]).is_err());
    }

    #[test]
    fn test_preview_defaults() {
        let cli = Cli::try_parse_from(["certgen", "preview", "job.json"]).unwrap();
        match cli.command {
            Commands::Preview { row, out, .. } => {
                assert_eq!(row, 1);
                assert_eq!(out, PathBuf::from("preview.png"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
