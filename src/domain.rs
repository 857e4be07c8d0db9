//! Domain models for course requirements.
//!
//! This module contains the validated course types, the structured result of
//! parsing a requirement description, the prerequisite tree built from it,
//! and import configuration.

/// Department, course number and course reference types.
pub mod course;
pub use course::{CourseCode, CourseCodeError, CourseNumber, CourseRef, Department};

/// Parsed requirement groups and restrictions.
pub mod requirement;
pub use requirement::{
    Level, ParsedRequirements, ProgramRestriction, Relation, RequirementEntry, RequirementGroup,
    RequirementKind, RestrictionEntry, RestrictionKind,
};

/// Arena-backed prerequisite trees.
pub mod tree;
pub use tree::{NodeId, NodeKind, PrerequisiteNode, PrerequisiteTree};

/// Catalog-wide prerequisite queries.
pub mod catalog;
pub use catalog::{Catalog, Transcript};

mod config;
pub use config::ImportConfig;
