use std::{fmt, str::FromStr};

use serde::{Serialize, Serializer};

use crate::domain::course::{CourseCode, CourseNumber, Department};

/// Boolean combinator between requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Relation {
    /// Every child must be satisfied.
    And,
    /// At least one child must be satisfied.
    Or,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::And => f.write_str("AND"),
            Self::Or => f.write_str("OR"),
        }
    }
}

/// The requirement section a group was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequirementKind {
    /// Courses that must be completed beforehand.
    Prerequisite,
    /// Courses that may not be held together with this one.
    Antirequisite,
    /// Courses that must be taken concurrently (or beforehand).
    Corequisite,
}

/// A validated academic level code such as `2A` or `4B`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(String);

impl Level {
    /// Creates a level from a digit followed by a letter.
    ///
    /// The letter is normalised to uppercase.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLevelError` if the string is not of the form `\d[A-Za-z]`.
    pub fn new(s: &str) -> Result<Self, InvalidLevelError> {
        let mut chars = s.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(digit), Some(letter), None)
                if digit.is_ascii_digit() && letter.is_ascii_alphabetic() =>
            {
                Ok(Self(format!("{digit}{}", letter.to_ascii_uppercase())))
            }
            _ => Err(InvalidLevelError(s.to_string())),
        }
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Level {
    type Err = InvalidLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Error returned when a string is not a valid level code.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid level '{0}': expected a digit followed by a letter (e.g. 3A)")]
pub struct InvalidLevelError(String);

/// The category of a non-course restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RestrictionKind {
    /// Minimum academic level.
    Level,
    /// Enrolment in a named program.
    Program,
    /// Enrolment in a named faculty.
    Faculty,
}

/// A level, program or faculty restriction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestrictionEntry {
    /// Which kind of restriction this is.
    pub kind: RestrictionKind,
    /// The level code or the trimmed program/faculty name.
    pub value: String,
}

impl RestrictionEntry {
    /// A level restriction.
    #[must_use]
    pub fn level(level: &Level) -> Self {
        Self {
            kind: RestrictionKind::Level,
            value: level.to_string(),
        }
    }

    /// A program restriction.
    #[must_use]
    pub fn program(name: impl Into<String>) -> Self {
        Self {
            kind: RestrictionKind::Program,
            value: name.into(),
        }
    }

    /// A faculty restriction.
    #[must_use]
    pub fn faculty(name: impl Into<String>) -> Self {
        Self {
            kind: RestrictionKind::Faculty,
            value: name.into(),
        }
    }
}

/// A program restriction together with the level qualifier that applies to
/// it.
///
/// In "Level at least 3A Gerontology Minor or Diploma in Gerontology students
/// only" the level belongs to the first program only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramRestriction {
    /// Trimmed program name.
    pub program: String,
    /// Level qualifier, if one led the program list.
    pub level: Option<Level>,
}

/// One course inside a requirement group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementEntry {
    /// The required (or excluded) course.
    #[serde(flatten)]
    pub course: CourseCode,
    /// Relation between this entry and its siblings in the group.
    pub inner_relation: Relation,
    /// Minimum grade required, if stated.
    pub min_grade: Option<u8>,
    /// Whether this entry came from an antirequisite section.
    pub is_antireq: bool,
    /// Whether this entry came from a corequisite section.
    pub is_coreq: bool,
}

impl RequirementEntry {
    /// The department of the referenced course.
    #[must_use]
    pub const fn department(&self) -> &Department {
        self.course.department()
    }

    /// The number of the referenced course.
    #[must_use]
    pub const fn course_number(&self) -> &CourseNumber {
        self.course.number()
    }
}

/// A list of requirement entries plus the relation joining it to the other
/// groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementGroup {
    /// The section this group was parsed from.
    pub kind: RequirementKind,
    /// Relation between this group and the other groups.
    pub outer_relation: Relation,
    /// The courses in this group.
    pub entries: Vec<RequirementEntry>,
}

impl RequirementGroup {
    /// The inner relation shared by every entry, or `None` if the group is
    /// empty or mixes relations (as parenthesised sub-groups can).
    #[must_use]
    pub fn inner_relation(&self) -> Option<Relation> {
        let first = self.entries.first()?.inner_relation;
        self.entries
            .iter()
            .all(|entry| entry.inner_relation == first)
            .then_some(first)
    }
}

/// The structured result of parsing one requirement description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedRequirements {
    /// Requirement groups in the order their text appeared.
    pub groups: Vec<RequirementGroup>,
    /// Level, program and faculty restrictions.
    pub restrictions: Vec<RestrictionEntry>,
    /// Program restrictions with their per-program level qualifiers.
    pub program_restrictions: Vec<ProgramRestriction>,
    /// The first level restriction found, if any.
    pub min_level: Option<Level>,
}

impl ParsedRequirements {
    /// Returns `true` when nothing at all was recognised.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.restrictions.is_empty()
    }

    /// The entries that become the persisted prerequisite tree.
    ///
    /// Only the first prerequisite group is used; later groups stay in the
    /// parse result but have no tree representation.
    #[must_use]
    pub fn tree_entries(&self) -> &[RequirementEntry] {
        self.groups
            .iter()
            .find(|group| group.kind == RequirementKind::Prerequisite)
            .map_or(&[], |group| group.entries.as_slice())
    }

    /// Iterate over groups of a particular kind.
    pub fn groups_of(&self, kind: RequirementKind) -> impl Iterator<Item = &RequirementGroup> {
        self.groups.iter().filter(move |group| group.kind == kind)
    }
}
