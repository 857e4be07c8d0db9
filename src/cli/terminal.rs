//! Styling for requirement, tree and report output.

use std::{fmt::Display, sync::LazyLock};

use owo_colors::{OwoColorize, colors::css};

static COLOR: LazyLock<bool> =
    LazyLock::new(|| supports_color::on(supports_color::Stream::Stdout).is_some());

/// What a piece of output represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Course,
    Relation,
    Restriction,
    Satisfied,
    Unsatisfied,
    Label,
}

fn render(text: &str, role: Role) -> String {
    if !*COLOR {
        return text.to_string();
    }
    match role {
        Role::Course => text.fg::<css::LightBlue>().to_string(),
        Role::Relation => text.bold().to_string(),
        Role::Restriction => text.fg::<css::Orange>().to_string(),
        Role::Satisfied => text.fg::<css::Green>().to_string(),
        Role::Unsatisfied => text.fg::<css::Red>().to_string(),
        Role::Label => text.dimmed().to_string(),
    }
}

/// Renders any displayable value in the role it plays in the output.
pub trait Styled: Display {
    /// A course code or leaf node.
    fn course(&self) -> String {
        render(&self.to_string(), Role::Course)
    }

    /// An AND/OR combinator.
    fn relation(&self) -> String {
        render(&self.to_string(), Role::Relation)
    }

    /// A level, program or faculty restriction.
    fn restriction(&self) -> String {
        render(&self.to_string(), Role::Restriction)
    }

    /// A met requirement or a successful count.
    fn satisfied(&self) -> String {
        render(&self.to_string(), Role::Satisfied)
    }

    /// An unmet requirement, failure or cycle.
    fn unsatisfied(&self) -> String {
        render(&self.to_string(), Role::Unsatisfied)
    }

    /// Headings, ids and other secondary text.
    fn label(&self) -> String {
        render(&self.to_string(), Role::Label)
    }
}

impl<T: Display + ?Sized> Styled for T {}

/// Formats a minimum grade qualifier, e.g. ` (min 70%)`.
pub fn grade_suffix(min_grade: Option<u8>) -> String {
    min_grade.map_or_else(String::new, |grade| format!(" (min {grade}%)"))
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(None, ""; "no grade")]
    #[test_case(Some(70), " (min 70%)"; "with grade")]
    fn grade_suffixes(min_grade: Option<u8>, expected: &str) {
        assert_eq!(grade_suffix(min_grade), expected);
    }

    #[test]
    fn plain_output_keeps_text() {
        if !*COLOR {
            assert_eq!("CS 135".course(), "CS 135");
            assert_eq!(render("OR", Role::Relation), "OR");
        }
        assert!("CS 135".course().contains("CS 135"));
    }
}
