//! Free-text requirement parsing.
//!
//! [`parse_requirements_description`] turns a catalog requirement string such
//! as `"Prereq: CS 135, CS 136. Antireq: CS 145. Level at least 2A."` into
//! [`ParsedRequirements`]. Parsing never fails: text that cannot be
//! understood simply yields fewer groups or restrictions.

/// Course reference extraction.
pub mod courses;
/// Requirement grouping heuristics.
pub mod groups;
/// Level, program and faculty restriction extraction.
pub mod restrictions;
/// Section splitting on `Prereq:`/`Antireq:`/`Coreq:` labels.
pub mod sections;

pub use courses::extract_courses;
pub use groups::{infer_relation, parse_course_list, parse_prerequisite_groups};
pub use restrictions::{RestrictionScan, extract_restrictions};
pub use sections::{Section, split_sections};

use tracing::{debug, instrument};

use crate::domain::{Level, ParsedRequirements, RequirementKind, RestrictionKind};

/// Parses a requirement description into groups and restrictions.
///
/// `None`, empty and whitespace-only descriptions produce an empty result.
/// The function is pure: the same text always gives the same result.
///
/// # Examples
///
/// ```
/// use coursereq::{Relation, parse_requirements_description};
///
/// let parsed = parse_requirements_description(Some("Prereq: CS 135, CS 136. Antireq: CS 145"));
///
/// assert_eq!(parsed.groups.len(), 2);
/// assert_eq!(parsed.groups[0].inner_relation(), Some(Relation::Or));
/// assert!(parsed.groups[1].entries[0].is_antireq);
/// ```
#[must_use]
#[instrument(level = "debug", skip_all)]
pub fn parse_requirements_description(description: Option<&str>) -> ParsedRequirements {
    let Some(text) = description.map(str::trim).filter(|text| !text.is_empty()) else {
        return ParsedRequirements::default();
    };

    let mut parsed = ParsedRequirements::default();

    for section in split_sections(text) {
        let scan = extract_restrictions(section.content);

        for entry in scan.entries {
            if !parsed.restrictions.contains(&entry) {
                parsed.restrictions.push(entry);
            }
        }
        for program in scan.programs {
            if !parsed.program_restrictions.contains(&program) {
                parsed.program_restrictions.push(program);
            }
        }

        match section.kind {
            Some(RequirementKind::Prerequisite) => {
                parsed
                    .groups
                    .extend(parse_prerequisite_groups(&scan.remainder));
            }
            Some(kind) => parsed.groups.extend(parse_course_list(&scan.remainder, kind)),
            None => debug!(
                content = section.content,
                "ignoring courses in unlabelled text"
            ),
        }
    }

    parsed.min_level = parsed
        .restrictions
        .iter()
        .find(|entry| entry.kind == RestrictionKind::Level)
        .and_then(|entry| Level::new(&entry.value).ok());

    debug!(
        groups = parsed.groups.len(),
        restrictions = parsed.restrictions.len(),
        "parsed requirement description"
    );
    parsed
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::domain::{Relation, RestrictionEntry};

    #[test_case(None; "null")]
    #[test_case(Some(""); "empty")]
    #[test_case(Some("   "); "whitespace")]
    fn empty_input_gives_empty_result(description: Option<&str>) {
        let parsed = parse_requirements_description(description);
        assert!(parsed.groups.is_empty());
        assert!(parsed.restrictions.is_empty());
        assert!(parsed.min_level.is_none());
    }

    #[test]
    fn parsing_is_deterministic() {
        let text = "Prereq: MATH 118/119 or STAT 220 with a grade of at least 70%; CS 136. \
                    Antireq: CS 145. Level at least 2A Honours Mathematics, Computer Science \
                    students only.";
        assert_eq!(
            parse_requirements_description(Some(text)),
            parse_requirements_description(Some(text))
        );
    }

    #[test]
    fn level_restriction_in_prereq_section() {
        let parsed = parse_requirements_description(Some("Prereq: CS 135. Level at least 2A."));
        assert_eq!(
            parsed.restrictions,
            vec![RestrictionEntry::level(&Level::new("2A").unwrap())]
        );
        assert_eq!(parsed.min_level, Some(Level::new("2A").unwrap()));
        assert_eq!(parsed.groups.len(), 1);
        assert_eq!(parsed.groups[0].entries.len(), 1);
    }

    #[test]
    fn program_list_with_shared_level() {
        let parsed = parse_requirements_description(Some(
            "Prereq: BIOL 273; Level at least 3A Gerontology Minor or Option in Aging Studies or \
             Diploma in Gerontology students only",
        ));

        let programs: Vec<_> = parsed
            .restrictions
            .iter()
            .filter(|r| r.kind == RestrictionKind::Program)
            .collect();
        assert_eq!(programs.len(), 3);

        assert_eq!(parsed.program_restrictions.len(), 3);
        assert_eq!(parsed.program_restrictions[0].program, "Gerontology Minor");
        assert_eq!(
            parsed.program_restrictions[0].level,
            Some(Level::new("3A").unwrap())
        );
        assert!(parsed.program_restrictions[1].level.is_none());
        assert!(parsed.program_restrictions[2].level.is_none());

        assert_eq!(parsed.groups.len(), 1);
        assert_eq!(parsed.groups[0].entries[0].course.to_string(), "BIOL 273");
    }

    #[test]
    fn antireq_flags_propagate() {
        let parsed = parse_requirements_description(Some("Antireq: CS 145"));
        assert_eq!(parsed.groups.len(), 1);
        let entry = &parsed.groups[0].entries[0];
        assert!(entry.is_antireq);
        assert!(!entry.is_coreq);
        assert_eq!(parsed.groups[0].kind, RequirementKind::Antirequisite);
    }

    #[test]
    fn end_to_end_description() {
        let parsed = parse_requirements_description(Some(
            "Prereq: CS 135, CS 136. Antireq: CS 145. Level at least 2A. Computer Science \
             students only.",
        ));

        assert_eq!(parsed.groups.len(), 2);

        let prereq = &parsed.groups[0];
        assert_eq!(prereq.kind, RequirementKind::Prerequisite);
        assert_eq!(prereq.entries.len(), 2);
        assert_eq!(prereq.entries[0].course.to_string(), "CS 135");
        assert_eq!(prereq.entries[1].course.to_string(), "CS 136");
        assert!(prereq.entries.iter().all(|e| e.inner_relation == Relation::Or));

        let antireq = &parsed.groups[1];
        assert_eq!(antireq.entries.len(), 1);
        assert_eq!(antireq.entries[0].course.to_string(), "CS 145");
        assert_eq!(antireq.entries[0].inner_relation, Relation::And);
        assert!(antireq.entries[0].is_antireq);

        assert!(
            parsed
                .restrictions
                .contains(&RestrictionEntry::level(&Level::new("2A").unwrap()))
        );
        assert!(
            parsed
                .restrictions
                .contains(&RestrictionEntry::program("Computer Science"))
        );
    }

    #[test]
    fn program_names_are_not_read_as_courses() {
        let parsed = parse_requirements_description(Some(
            "Prereq: ECE 250; Level at least 3A Computer Engineering or Electrical Engineering \
             students only",
        ));
        assert_eq!(parsed.groups.len(), 1);
        assert_eq!(parsed.groups[0].entries.len(), 1);
    }

    #[test]
    fn unlabelled_text_contributes_restrictions_only() {
        let parsed =
            parse_requirements_description(Some("CS 135. Honours Computer Science students only."));
        assert!(parsed.groups.is_empty());
        assert_eq!(
            parsed.restrictions,
            vec![RestrictionEntry::program("Honours Computer Science")]
        );
    }

    #[test]
    fn coreq_and_prereq_together() {
        let parsed =
            parse_requirements_description(Some("Prereq: MATH 137. Coreq: MATH 138 or 148."));
        assert_eq!(parsed.groups.len(), 2);
        assert_eq!(parsed.groups[1].kind, RequirementKind::Corequisite);
        assert_eq!(parsed.groups[1].entries.len(), 2);
        assert!(parsed.groups[1].entries.iter().all(|e| e.is_coreq));
    }

    #[test]
    fn program_after_leading_students_phrase() {
        let parsed = parse_requirements_description(Some(
            "Prereq: Students in Honours Computer Science students only",
        ));
        assert!(parsed.groups.is_empty());
        assert_eq!(
            parsed.restrictions,
            vec![RestrictionEntry::program("Honours Computer Science")]
        );
        assert_eq!(parsed.program_restrictions.len(), 1);
    }

    #[test]
    fn repeated_program_is_recorded_once() {
        let parsed = parse_requirements_description(Some(
            "Prereq: CS 240. Computer Science students only. Antireq: CS 241. Computer Science \
             students only.",
        ));
        assert_eq!(parsed.restrictions.len(), 1);
        assert_eq!(parsed.program_restrictions.len(), 1);
        assert_eq!(parsed.program_restrictions[0].program, "Computer Science");
    }

    #[test]
    fn repeated_level_is_recorded_once() {
        let parsed = parse_requirements_description(Some(
            "Prereq: CS 240. Level at least 3A. Antireq: CS 241. Level at least 3A.",
        ));
        let levels = parsed
            .restrictions
            .iter()
            .filter(|r| r.kind == RestrictionKind::Level)
            .count();
        assert_eq!(levels, 1);
    }
}
