use std::{num::NonZeroUsize, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use coursereq::{ImportConfig, ImportReport, InMemoryStore, Importer, load_catalog};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::instrument;

use super::terminal::Styled;

#[derive(Debug, Parser)]
#[command(about = "Import a catalog's prerequisite trees")]
pub struct Import {
    /// Path to a JSON array of course records
    catalog: PathBuf,

    /// Path to an import configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Discard every stored tree before importing
    #[arg(long)]
    clear: bool,

    /// Number of courses per batch
    #[arg(long, value_name = "N")]
    batch_size: Option<NonZeroUsize>,

    /// Import at most this many courses
    #[arg(long, value_name = "N")]
    max_courses: Option<usize>,

    /// Replace per-course error messages with a generic message
    #[arg(long)]
    suppress_errors: bool,

    /// Write the resulting store as JSON to this file
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl Import {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        let config = self.config()?;
        let records = load_catalog(&self.catalog)
            .with_context(|| format!("reading {}", self.catalog.display()))?;

        let total = config
            .max_courses
            .map_or(records.len(), |max| max.min(records.len()));
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} courses ({eta})")?
                .progress_chars("=> "),
        );

        let mut importer = Importer::new(InMemoryStore::default(), config);
        let report = importer.run(&records, |progress| {
            bar.set_position(progress.completed as u64);
        })?;
        bar.finish_and_clear();

        print_report(&report);

        if let Some(path) = &self.output {
            let json = serde_json::to_string_pretty(&importer.store().export())?;
            std::fs::write(path, json)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Store written to {}", path.display());
        }

        Ok(())
    }

    fn config(&self) -> anyhow::Result<ImportConfig> {
        let mut config = match &self.config {
            Some(path) => ImportConfig::load(path).map_err(anyhow::Error::msg)?,
            None => ImportConfig::default(),
        };

        if let Some(batch_size) = self.batch_size {
            config.set_batch_size(batch_size);
        }
        if self.max_courses.is_some() {
            config.max_courses = self.max_courses;
        }
        config.clear |= self.clear;
        config.suppress_error_details |= self.suppress_errors;

        Ok(config)
    }
}

fn print_report(report: &ImportReport) {
    println!(
        "{} imported, {} without prerequisites, {} failed",
        report.imported.satisfied(),
        report.skipped_empty.label(),
        if report.failures.is_empty() {
            "0".to_string()
        } else {
            report.failures.len().unsatisfied()
        }
    );

    for failure in &report.failures {
        println!("  {} {}", failure.course.unsatisfied(), failure.message.label());
    }
}
