//! Course reference extraction.
//!
//! Three passes run over the text, in priority order:
//!
//! 1. slash combinations (`MATH 118/119`)
//! 2. graded references (`STAT 220 with a grade of at least 70%`)
//! 3. bare `DEPT NUM` pairs, where a number without a department inherits the
//!    most recently seen one (`CS 135, 136`)
//!
//! A course found by more than one pass keeps the grade from the first pass
//! that found it, and its earliest position in the text.

use std::sync::LazyLock;

use regex::{Captures, Match, Regex};

use crate::domain::{CourseCode, CourseNumber, CourseRef, Department};

static COMBINATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Za-z]{2,})\s*(\d{3}[A-Z]?)\s*/\s*(\d{3}[A-Z]?)\b")
        .expect("combination pattern is valid")
});

static GRADED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b([A-Za-z]{2,})\s*(\d{3}[A-Z]?)\s+(?i:with\s+a\s+(?:minimum\s+)?grade\s+of\s+(?:at\s+least\s+)?)(\d{1,3})\s*%",
    )
    .expect("graded pattern is valid")
});

static COURSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:([A-Za-z]+)\s*)?(\d{3}[A-Z]?)\b").expect("course pattern is valid")
});

/// Extracts an ordered, de-duplicated list of course references from text.
///
/// Words in the department position that are not two to four uppercase
/// letters (such as "or") are never treated as departments. Three-digit
/// numbers directly followed by `%` are grades, not courses.
#[must_use]
pub fn extract_courses(text: &str) -> Vec<CourseRef> {
    let mut found = Found::default();

    for caps in COMBINATION.captures_iter(text) {
        let Some(department) = department(caps.get(1)) else {
            continue;
        };
        for group in [2, 3] {
            if let Some((position, number)) = number(&caps, group) {
                let position = if group == 2 {
                    caps.get(1).map_or(position, |m| m.start())
                } else {
                    position
                };
                found.add(
                    position,
                    CourseRef::new(CourseCode::new(department.clone(), number)),
                );
            }
        }
    }

    for caps in GRADED.captures_iter(text) {
        let (Some(department), Some((_, number))) = (department(caps.get(1)), number(&caps, 2))
        else {
            continue;
        };
        let course = CourseCode::new(department, number);
        let start = caps.get(1).map_or(0, |m| m.start());
        let course_ref = match caps[3].parse::<u8>() {
            Ok(grade) if grade <= 100 => CourseRef::with_min_grade(course, grade),
            _ => CourseRef::new(course),
        };
        found.add(start, course_ref);
    }

    let mut last_department: Option<Department> = None;
    for caps in COURSE.captures_iter(text) {
        let Some(number_match) = caps.get(2) else {
            continue;
        };
        if text[number_match.end()..].starts_with('%') {
            continue;
        }
        let Some((_, number)) = number(&caps, 2) else {
            continue;
        };

        let (position, department) = match department(caps.get(1)) {
            Some(department) => {
                last_department = Some(department.clone());
                (caps.get(1).map_or(0, |m| m.start()), department)
            }
            None => match &last_department {
                Some(department) => (number_match.start(), department.clone()),
                None => continue,
            },
        };

        found.add(position, CourseRef::new(CourseCode::new(department, number)));
    }

    found.into_sorted()
}

fn department(word: Option<Match<'_>>) -> Option<Department> {
    word.and_then(|m| Department::try_from(m.as_str()).ok())
}

fn number(caps: &Captures<'_>, group: usize) -> Option<(usize, CourseNumber)> {
    let m = caps.get(group)?;
    CourseNumber::try_from(m.as_str())
        .ok()
        .map(|number| (m.start(), number))
}

/// Course references with the byte position where each was first seen.
#[derive(Debug, Default)]
struct Found(Vec<(usize, CourseRef)>);

impl Found {
    fn add(&mut self, position: usize, course_ref: CourseRef) {
        if let Some((existing, _)) = self
            .0
            .iter_mut()
            .find(|(_, seen)| seen.course == course_ref.course)
        {
            *existing = (*existing).min(position);
        } else {
            self.0.push((position, course_ref));
        }
    }

    fn into_sorted(mut self) -> Vec<CourseRef> {
        self.0.sort_by_key(|(position, _)| *position);
        self.0.into_iter().map(|(_, course_ref)| course_ref).collect()
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn codes(text: &str) -> Vec<String> {
        extract_courses(text)
            .into_iter()
            .map(|r| r.course.to_string())
            .collect()
    }

    #[test]
    fn comma_separated_courses_keep_order() {
        let refs = extract_courses("CS 135, CS 136");
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].course.to_string(), "CS 135");
        assert_eq!(refs[1].course.to_string(), "CS 136");
        assert!(refs.iter().all(|r| r.min_grade.is_none()));
    }

    #[test]
    fn grade_qualifier_sets_min_grade() {
        let refs = extract_courses("STAT 220 with a grade of at least 70%");
        assert_eq!(refs, vec![CourseRef::with_min_grade("STAT 220".parse().unwrap(), 70)]);
    }

    #[test]
    fn minimum_grade_wording_is_accepted() {
        let refs = extract_courses("MATH 136 with a minimum grade of 60%");
        assert_eq!(refs[0].min_grade, Some(60));
    }

    #[test]
    fn slash_combination_shares_department() {
        let refs = extract_courses("MATH 118/119");
        assert_eq!(
            refs,
            vec![
                CourseRef::new("MATH 118".parse().unwrap()),
                CourseRef::new("MATH 119".parse().unwrap()),
            ]
        );
    }

    #[test_case("CS 135, 136", &["CS 135", "CS 136"]; "comma continuation")]
    #[test_case("CS 135 or 145", &["CS 135", "CS 145"]; "or continuation")]
    #[test_case("MATH 118/119/128", &["MATH 118", "MATH 119", "MATH 128"]; "chained slashes")]
    #[test_case("CS 135, MATH 135 or 145", &["CS 135", "MATH 135", "MATH 145"]; "continuation uses latest department")]
    #[test_case("CS135 and CS136", &["CS 135", "CS 136"]; "compact codes")]
    fn continuations(text: &str, expected: &[&str]) {
        assert_eq!(codes(text), expected);
    }

    #[test_case("or 135"; "stray lowercase word")]
    #[test_case("136 only"; "number without any department")]
    #[test_case("Level at least 2A"; "level code")]
    #[test_case("at least 100%"; "percentage")]
    #[test_case("in 2019"; "year")]
    fn ignores_non_courses(text: &str) {
        assert!(extract_courses(text).is_empty());
    }

    #[test]
    fn duplicates_are_removed_keeping_first_grade() {
        let refs =
            extract_courses("CS 136 with a grade of at least 60%; CS 136 or CS 146, CS 136");
        assert_eq!(codes("CS 136, CS 146, CS 136"), ["CS 136", "CS 146"]);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].min_grade, Some(60));
    }

    #[test]
    fn combination_and_graded_keep_text_order() {
        assert_eq!(
            codes("CS 135 and one of MATH 118/119 and STAT 220 with a grade of at least 70%"),
            ["CS 135", "MATH 118", "MATH 119", "STAT 220"]
        );
    }

    #[test]
    fn letter_suffix_is_part_of_number() {
        assert_eq!(codes("ECE 499A, ECE 499B"), ["ECE 499A", "ECE 499B"]);
    }
}
