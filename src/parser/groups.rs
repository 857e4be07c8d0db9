//! Grouping course references into AND/OR requirement groups.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::{
    domain::{CourseRef, Relation, RequirementEntry, RequirementGroup, RequirementKind},
    parser::courses::extract_courses,
};

static ONE_OF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bone\s+of\b").expect("one-of pattern is valid"));

/// Parses the (restriction-free) content of a prerequisite section.
///
/// Semicolons outside parentheses separate independent clauses: each clause
/// becomes its own group, and groups are combined with AND. Clauses without
/// any course are dropped.
#[must_use]
pub fn parse_prerequisite_groups(content: &str) -> Vec<RequirementGroup> {
    top_level_clauses(content)
        .into_iter()
        .filter_map(|clause| {
            let entries = parse_entries(clause, RequirementKind::Prerequisite);
            if entries.is_empty() {
                return None;
            }
            debug!(clause = clause.trim(), entries = entries.len(), "parsed group");
            Some(RequirementGroup {
                kind: RequirementKind::Prerequisite,
                outer_relation: Relation::And,
                entries,
            })
        })
        .collect()
}

/// Parses the content of an antirequisite or corequisite section.
///
/// These lists carry no nesting: every course becomes an AND entry flagged
/// with the section's kind. Returns `None` if no course is found.
#[must_use]
pub fn parse_course_list(content: &str, kind: RequirementKind) -> Option<RequirementGroup> {
    let entries: Vec<_> = extract_courses(content)
        .into_iter()
        .map(|course_ref| entry(course_ref, Relation::And, kind))
        .collect();

    (!entries.is_empty()).then_some(RequirementGroup {
        kind,
        outer_relation: Relation::And,
        entries,
    })
}

/// Decides the relation between courses listed in `text`.
///
/// "One of" always means OR. Otherwise a comma or the word "or" means OR, and
/// anything else means AND.
#[must_use]
pub fn infer_relation(text: &str) -> Relation {
    if ONE_OF.is_match(text) || text.contains(',') || text.to_lowercase().contains(" or ") {
        Relation::Or
    } else {
        Relation::And
    }
}

/// Entries for one clause: courses outside parentheses first, then each
/// parenthesised group in order, each with its own relation.
fn parse_entries(text: &str, kind: RequirementKind) -> Vec<RequirementEntry> {
    let (outer, nested) = split_parenthesised(text);
    let relation = infer_relation(&outer);

    let mut entries: Vec<_> = extract_courses(&outer)
        .into_iter()
        .map(|course_ref| entry(course_ref, relation, kind))
        .collect();

    for inner in nested {
        entries.extend(parse_entries(inner, kind));
    }

    entries
}

/// Splits on semicolons at parenthesis depth zero.
fn top_level_clauses(text: &str) -> Vec<&str> {
    let mut clauses = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (index, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                clauses.push(&text[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    clauses.push(&text[start..]);
    clauses
}

/// Separates top-level parenthesised groups from the surrounding text.
///
/// The surrounding text keeps a space where each group was. An unclosed
/// parenthesis is treated as ordinary text.
fn split_parenthesised(text: &str) -> (String, Vec<&str>) {
    let mut outer = String::with_capacity(text.len());
    let mut nested = Vec::new();
    let mut depth = 0usize;
    let mut open_at = 0;
    let mut cursor = 0;

    for (index, c) in text.char_indices() {
        match c {
            '(' => {
                if depth == 0 {
                    outer.push_str(&text[cursor..index]);
                    open_at = index;
                }
                depth += 1;
            }
            ')' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    nested.push(&text[open_at + 1..index]);
                    outer.push(' ');
                    cursor = index + 1;
                }
            }
            _ => {}
        }
    }

    if depth > 0 {
        outer.push_str(&text[open_at..]);
    } else {
        outer.push_str(&text[cursor..]);
    }

    (outer, nested)
}

fn entry(course_ref: CourseRef, relation: Relation, kind: RequirementKind) -> RequirementEntry {
    RequirementEntry {
        course: course_ref.course,
        inner_relation: relation,
        min_grade: course_ref.min_grade,
        is_antireq: kind == RequirementKind::Antirequisite,
        is_coreq: kind == RequirementKind::Corequisite,
    }
}
