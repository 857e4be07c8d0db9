use std::{fmt, ops::Deref, str::FromStr};

use serde::{Serialize, Serializer};

/// A validated department code: two to four uppercase ASCII letters.
///
/// Free text contains plenty of short words sitting in front of numbers
/// ("or 136", "at 100"), so anything extracted from requirement text must
/// pass through this type before it is treated as a department.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Department(String);

impl Department {
    /// Creates a new `Department` from a string.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDepartmentError` if the string is not two to four
    /// uppercase letters (A-Z).
    pub fn new(s: String) -> Result<Self, InvalidDepartmentError> {
        if (2..=4).contains(&s.len()) && s.chars().all(|c| c.is_ascii_uppercase()) {
            Ok(Self(s))
        } else {
            Err(InvalidDepartmentError(s))
        }
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Department {
    type Error = InvalidDepartmentError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl FromStr for Department {
    type Err = InvalidDepartmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl Deref for Department {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Department {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Error returned when a string is not a valid department code.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid department '{0}': must be 2-4 uppercase letters (A-Z)")]
pub struct InvalidDepartmentError(String);

/// A validated course number: three digits with an optional uppercase letter
/// suffix (e.g. `135`, `499A`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CourseNumber(String);

impl CourseNumber {
    /// Creates a new `CourseNumber` from a string.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCourseNumberError` if the string is not three ASCII
    /// digits optionally followed by one uppercase letter.
    pub fn new(s: String) -> Result<Self, InvalidCourseNumberError> {
        let bytes = s.as_bytes();
        let digits_ok = bytes.len() >= 3 && bytes[..3].iter().all(u8::is_ascii_digit);
        let suffix_ok = match bytes.len() {
            3 => true,
            4 => bytes[3].is_ascii_uppercase(),
            _ => false,
        };

        if digits_ok && suffix_ok {
            Ok(Self(s))
        } else {
            Err(InvalidCourseNumberError(s))
        }
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for CourseNumber {
    type Error = InvalidCourseNumberError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl Deref for CourseNumber {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for CourseNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for CourseNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Error returned when a string is not a valid course number.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid course number '{0}': expected three digits and an optional letter")]
pub struct InvalidCourseNumberError(String);

/// A department plus course number, e.g. `CS 135`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CourseCode {
    department: Department,
    #[serde(rename = "courseNumber")]
    number: CourseNumber,
}

impl CourseCode {
    /// Create a course code from pre-validated parts.
    #[must_use]
    pub const fn new(department: Department, number: CourseNumber) -> Self {
        Self { department, number }
    }

    /// Returns the department component.
    #[must_use]
    pub const fn department(&self) -> &Department {
        &self.department
    }

    /// Returns the course number component.
    #[must_use]
    pub const fn number(&self) -> &CourseNumber {
        &self.number
    }
}

impl fmt::Display for CourseCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.department, self.number)
    }
}

/// Errors that can occur when parsing a course code.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CourseCodeError {
    /// The string has no recognisable department/number split.
    #[error("Invalid course code format: {0}")]
    Syntax(String),

    /// The department component is invalid.
    #[error(transparent)]
    Department(#[from] InvalidDepartmentError),

    /// The course number component is invalid.
    #[error(transparent)]
    Number(#[from] InvalidCourseNumberError),
}

impl FromStr for CourseCode {
    type Err = CourseCodeError;

    /// Parses `"CS 135"` or `"CS135"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| CourseCodeError::Syntax(s.to_string()))?;
        let (department, number) = s.split_at(split);
        let department = department.trim();
        if department.is_empty() {
            return Err(CourseCodeError::Syntax(s.to_string()));
        }

        Ok(Self::new(
            Department::try_from(department)?,
            CourseNumber::try_from(number.trim())?,
        ))
    }
}

impl TryFrom<&str> for CourseCode {
    type Error = CourseCodeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_str(value)
    }
}

/// A course mentioned in requirement text, with an optional minimum grade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRef {
    /// The referenced course.
    #[serde(flatten)]
    pub course: CourseCode,
    /// Minimum percentage grade (0-100) required in the course, if stated.
    pub min_grade: Option<u8>,
}

impl CourseRef {
    /// A course reference without a grade qualifier.
    #[must_use]
    pub const fn new(course: CourseCode) -> Self {
        Self {
            course,
            min_grade: None,
        }
    }

    /// A course reference with a minimum grade.
    #[must_use]
    pub const fn with_min_grade(course: CourseCode, min_grade: u8) -> Self {
        Self {
            course,
            min_grade: Some(min_grade),
        }
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("CS"; "two letters")]
    #[test_case("MATH"; "four letters")]
    #[test_case("STV"; "three letters")]
    fn valid_departments(s: &str) {
        assert_eq!(Department::try_from(s).unwrap().as_str(), s);
    }

    #[test_case("or"; "lowercase word")]
    #[test_case("C"; "too short")]
    #[test_case("MATHS"; "too long")]
    #[test_case("Cs"; "mixed case")]
    #[test_case(""; "empty")]
    fn invalid_departments(s: &str) {
        assert!(Department::try_from(s).is_err());
    }

    #[test_case("135"; "plain")]
    #[test_case("499A"; "suffix")]
    fn valid_course_numbers(s: &str) {
        assert!(CourseNumber::try_from(s).is_ok());
    }

    #[test_case("13"; "too short")]
    #[test_case("1350"; "four digits")]
    #[test_case("135a"; "lowercase suffix")]
    #[test_case("13A"; "letter in digits")]
    fn invalid_course_numbers(s: &str) {
        assert!(CourseNumber::try_from(s).is_err());
    }

    #[test]
    fn course_code_parses_with_and_without_space() {
        let spaced: CourseCode = "CS 135".parse().unwrap();
        let compact: CourseCode = "CS135".parse().unwrap();
        assert_eq!(spaced, compact);
        assert_eq!(spaced.to_string(), "CS 135");
    }

    #[test]
    fn course_code_rejects_missing_department() {
        assert_eq!(
            "135".parse::<CourseCode>(),
            Err(CourseCodeError::Syntax("135".to_string()))
        );
    }

    #[test]
    fn course_ref_serializes_flat() {
        let course_ref = CourseRef::with_min_grade("STAT 220".parse().unwrap(), 70);
        let json = serde_json::to_value(&course_ref).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"department": "STAT", "courseNumber": "220", "minGrade": 70})
        );
    }
}
