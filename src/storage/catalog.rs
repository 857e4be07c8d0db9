//! Reading course records from catalog JSON files.

use std::{io, path::Path};

use serde::Deserialize;

use crate::domain::{CourseCode, CourseCodeError, CourseNumber, Department};

/// One course as delivered by the catalog API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRecord {
    /// Department code, e.g. `CS`.
    pub subject_code: String,
    /// Course number, e.g. `135`.
    pub catalog_number: String,
    /// Course title.
    #[serde(default)]
    pub title: Option<String>,
    /// Free-text requirement description.
    #[serde(default)]
    pub requirements_description: Option<String>,
}

impl CourseRecord {
    /// The record's course code.
    ///
    /// The subject code is upper-cased before validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the subject code or catalog number is malformed.
    pub fn course_code(&self) -> Result<CourseCode, CourseCodeError> {
        Ok(CourseCode::new(
            Department::new(self.subject_code.trim().to_ascii_uppercase())?,
            CourseNumber::new(self.catalog_number.trim().to_string())?,
        ))
    }

    /// `SUBJECT NUMBER` as written in the record, for reporting.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.subject_code.trim(), self.catalog_number.trim())
    }
}

/// Errors that can occur when loading a catalog file.
#[derive(Debug, thiserror::Error)]
#[error("failed to load catalog")]
pub enum CatalogError {
    /// An I/O error occurred.
    Io(#[from] io::Error),
    /// The file is not a JSON array of course records.
    Json(#[from] serde_json::Error),
}

/// Reads a JSON array of course records.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid catalog JSON.
pub fn load_catalog(path: &Path) -> Result<Vec<CourseRecord>, CatalogError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
