//! Course requirement parsing and prerequisite trees
//!
//! Free-text requirement descriptions from a course catalog are parsed into
//! structured groups and restrictions, the prerequisite groups are built into
//! AND/OR trees, and the trees are persisted through a transactional store.

pub mod domain;
pub use domain::{
    Catalog, CourseCode, ImportConfig, Level, ParsedRequirements, PrerequisiteTree, Relation,
    RequirementEntry, RequirementGroup, RequirementKind, RestrictionEntry, Transcript,
};

/// Requirement text parsing.
pub mod parser;
pub use parser::parse_requirements_description;

/// Catalog input and prerequisite tree persistence.
pub mod storage;
pub use storage::{CourseRecord, InMemoryStore, NodeStore, load_catalog, persist_tree};

pub mod import;
pub use import::{BatchProgress, ImportReport, Importer, build_catalog};
