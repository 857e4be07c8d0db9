//! Batch import of a course catalog into a [`NodeStore`].
//!
//! Each batch is parsed in parallel, then persisted one course at a time so
//! that every course's tree is written in its own transaction. A single bad
//! course never aborts the import; it is recorded in the [`ImportReport`].

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{
    domain::{Catalog, CourseCode, CourseCodeError, ImportConfig, PrerequisiteTree},
    parser::parse_requirements_description,
    storage::{CourseRecord, NodeStore, persist_tree},
};

const SUPPRESSED_MESSAGE: &str = "failed to import prerequisites";

/// A course that could not be imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseFailure {
    /// The course as labelled in the catalog.
    pub course: String,
    /// What went wrong, or a generic message if details are suppressed.
    pub message: String,
}

/// Progress after a batch has been persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    /// Courses processed so far.
    pub completed: usize,
    /// Courses that will be processed in total.
    pub total: usize,
}

/// The outcome of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Courses whose prerequisite tree was stored.
    pub imported: usize,
    /// Courses with no prerequisite courses to store.
    pub skipped_empty: usize,
    /// Courses that failed.
    pub failures: Vec<CourseFailure>,
}

impl ImportReport {
    /// Number of courses processed.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.imported + self.skipped_empty + self.failures.len()
    }
}

/// Imports catalog records into a store.
#[derive(Debug)]
pub struct Importer<S> {
    store: S,
    config: ImportConfig,
}

impl<S: NodeStore> Importer<S> {
    /// Creates an importer writing into `store`.
    pub const fn new(store: S, config: ImportConfig) -> Self {
        Self { store, config }
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the importer, returning the store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Imports up to `max_courses` records, calling `on_progress` after each
    /// batch.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store cannot be cleared. Per-course
    /// failures are collected in the report instead.
    #[instrument(skip_all, fields(records = records.len()))]
    pub fn run<F>(
        &mut self,
        records: &[CourseRecord],
        mut on_progress: F,
    ) -> Result<ImportReport, S::Error>
    where
        F: FnMut(BatchProgress),
    {
        if self.config.clear {
            info!("clearing stored prerequisite trees");
            self.store.clear()?;
        }

        let limit = self
            .config
            .max_courses
            .map_or(records.len(), |max| max.min(records.len()));
        let records = &records[..limit];
        let batch_size = self.config.batch_size().get();
        let batches = records.len().div_ceil(batch_size);

        let mut report = ImportReport::default();
        let mut completed = 0;

        for (index, batch) in records.chunks(batch_size).enumerate() {
            let prepared: Vec<_> = batch.par_iter().map(prepare).collect();

            for (record, result) in batch.iter().zip(prepared) {
                self.persist(record, result, &mut report);
            }

            completed += batch.len();
            on_progress(BatchProgress {
                completed,
                total: limit,
            });

            let pause = self.config.batch_pause();
            if index + 1 < batches && !pause.is_zero() {
                std::thread::sleep(pause);
            }
        }

        info!(
            imported = report.imported,
            skipped_empty = report.skipped_empty,
            failed = report.failures.len(),
            "import finished"
        );
        Ok(report)
    }

    fn persist(
        &mut self,
        record: &CourseRecord,
        prepared: Result<(CourseCode, PrerequisiteTree), CourseCodeError>,
        report: &mut ImportReport,
    ) {
        let (course, tree) = match prepared {
            Ok(prepared) => prepared,
            Err(error) => {
                self.fail(record, &error, report);
                return;
            }
        };

        // Empty trees are still written so a stale tree is discarded.
        match persist_tree(&mut self.store, &course, &tree) {
            Ok(_) if tree.is_empty() => report.skipped_empty += 1,
            Ok(_) => report.imported += 1,
            Err(error) => self.fail(record, &error, report),
        }
    }

    fn fail(
        &self,
        record: &CourseRecord,
        error: &(dyn std::error::Error + 'static),
        report: &mut ImportReport,
    ) {
        let course = record.label();
        let message = error_chain(error);
        warn!(%course, %message, "course import failed");

        report.failures.push(CourseFailure {
            course,
            message: if self.config.suppress_error_details {
                SUPPRESSED_MESSAGE.to_string()
            } else {
                message
            },
        });
    }
}

fn prepare(record: &CourseRecord) -> Result<(CourseCode, PrerequisiteTree), CourseCodeError> {
    let course = record.course_code()?;
    let parsed = parse_requirements_description(record.requirements_description.as_deref());
    Ok((course, PrerequisiteTree::build(parsed.tree_entries())))
}

fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Parses every record and collects the trees into a [`Catalog`].
///
/// Records with an invalid course code are skipped.
#[must_use]
#[instrument(skip_all, fields(records = records.len()))]
pub fn build_catalog(records: &[CourseRecord]) -> Catalog {
    let prepared: Vec<_> = records.par_iter().map(prepare).collect();

    let mut catalog = Catalog::default();
    for (record, result) in records.iter().zip(prepared) {
        match result {
            Ok((course, tree)) => catalog.insert(course, tree),
            Err(error) => warn!(course = %record.label(), %error, "skipping course"),
        }
    }
    catalog
}
