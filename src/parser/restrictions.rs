//! Level, program and faculty restriction extraction.
//!
//! Text is scanned clause by clause, where clauses end at `.` or `;`. Every
//! restriction phrase that is recognised is cut out of the text, so that the
//! remainder can be handed to course extraction without program names being
//! mistaken for courses.

use std::{ops::Range, sync::LazyLock};

use regex::Regex;
use tracing::debug;

use crate::domain::{Level, ProgramRestriction, RestrictionEntry};

static LEVEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\blevel\s+at\s+least\s+(\d[a-z])\b").expect("level pattern is valid")
});

static STUDENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bstudents\b(\s+only\b)?").expect("students pattern is valid")
});

static NOT_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bnot\s+open\s+to\b").expect("exclusion pattern is valid"));

static COURSE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:[A-Z]{2,4}\s*)?\d{3}[A-Z]?\b").expect("course token pattern is valid")
});

static LEADING_NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:\s|,|&|and\b|or\b|open\s+(?:only\s+)?to\b|restricted\s+to\b|only\b|students\s+in\b)+",
    )
        .expect("leading noise pattern is valid")
});

static PROGRAM_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*,\s*(?:or\s+)?|\s+or\s+").expect("separator pattern is valid")
});

static FACULTY_OF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^faculty\s+of\s+(?:the\s+)?(.+)$").expect("faculty pattern is valid")
});

static NAMED_FACULTY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.+?)\s+faculty$").expect("faculty pattern is valid"));

/// The restrictions found in a piece of text, plus the text that is left once
/// they are removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestrictionScan {
    /// Level, program and faculty restrictions in the order they appear.
    pub entries: Vec<RestrictionEntry>,
    /// Program restrictions with per-program level qualifiers.
    pub programs: Vec<ProgramRestriction>,
    /// The input with every recognised restriction phrase removed.
    pub remainder: String,
}

/// Extracts level, program and faculty restrictions from text.
///
/// Level phrases are found first. A program list ends at `students only`, or
/// at a `students` that closes its clause, and starts at the beginning of the
/// clause, after the last course reference in it, or after a level phrase.
/// Only the first program in a list inherits a leading level. Program names
/// are split on commas and on "or"; slashes and "and" are part of a name.
/// Clauses saying "Not open to" are exclusions and are left alone.
#[must_use]
pub fn extract_restrictions(text: &str) -> RestrictionScan {
    let mut scan = RestrictionScan::default();
    let mut removed: Vec<Range<usize>> = Vec::new();

    for clause_range in clauses(text) {
        let offset = clause_range.start;
        let clause = &text[clause_range];

        let mut levels = Vec::new();
        for caps in LEVEL.captures_iter(clause) {
            let (Some(whole), Some(code)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let Ok(level) = Level::new(code.as_str()) else {
                continue;
            };
            scan.entries.push(RestrictionEntry::level(&level));
            removed.push(offset + whole.start()..offset + whole.end());
            levels.push((whole.end(), level));
        }

        // The list closes at the last "students" in the clause.
        let Some(trigger) = STUDENTS.find_iter(clause).last() else {
            continue;
        };
        let has_only = trigger.as_str().len() > "students".len();
        if !has_only && !clause[trigger.end()..].trim().is_empty() {
            continue;
        }
        if NOT_OPEN.is_match(&clause[..trigger.start()]) {
            debug!(clause = clause.trim(), "skipping exclusion clause");
            continue;
        }

        let mut start = clause[..trigger.start()].rfind(':').map_or(0, |colon| colon + 1);
        if let Some(course) = COURSE_TOKEN
            .find_iter(&clause[start..trigger.start()])
            .last()
        {
            start += course.end();
        }
        let mut level = None;
        if let Some((end, leading)) = levels
            .iter()
            .rev()
            .find(|(end, _)| *end > start && *end <= trigger.start())
        {
            start = *end;
            level = Some(leading.clone());
        }

        let list = &clause[start..trigger.start()];
        let list = LEADING_NOISE.replace(list, "");
        let list = list.trim().trim_end_matches(',').trim();
        if list.is_empty() {
            continue;
        }

        for name in split_programs(list) {
            if let Some(faculty) = faculty_name(name) {
                scan.entries.push(RestrictionEntry::faculty(faculty));
            } else {
                scan.entries.push(RestrictionEntry::program(name));
                scan.programs.push(ProgramRestriction {
                    program: name.to_string(),
                    level: level.take(),
                });
            }
        }
        removed.push(offset + start..offset + trigger.end());
    }

    scan.remainder = remove_ranges(text, removed);
    scan
}

/// Byte ranges of the clauses in `text`, excluding the delimiters.
fn clauses(text: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for (index, c) in text.char_indices() {
        if c == '.' || c == ';' {
            ranges.push(start..index);
            start = index + c.len_utf8();
        }
    }
    ranges.push(start..text.len());
    ranges
}

fn split_programs(list: &str) -> impl Iterator<Item = &str> {
    PROGRAM_SEPARATOR
        .split(list)
        .map(|name| {
            let name = name.trim();
            name.strip_prefix("and ")
                .or_else(|| name.strip_prefix("or "))
                .unwrap_or(name)
                .trim()
        })
        .filter(|name| !name.is_empty())
}

fn faculty_name(name: &str) -> Option<&str> {
    FACULTY_OF
        .captures(name)
        .or_else(|| NAMED_FACULTY.captures(name))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

fn remove_ranges(text: &str, mut ranges: Vec<Range<usize>>) -> String {
    ranges.sort_by_key(|range| range.start);

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for range in ranges {
        if range.start > cursor {
            out.push_str(&text[cursor..range.start]);
        }
        cursor = cursor.max(range.end);
    }
    out.push_str(&text[cursor..]);
    out
}
