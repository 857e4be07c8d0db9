//! Splitting a requirement description into labelled sections.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::RequirementKind;

static KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(pre|anti|co)-?req(?:uisite)?s?\s*:").expect("keyword pattern is valid")
});

/// One section of a requirement description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section<'a> {
    /// The requirement kind named by the label, or `None` for text that
    /// precedes the first label.
    pub kind: Option<RequirementKind>,
    /// The text before the colon, e.g. `Prereq`.
    pub label: &'a str,
    /// The trimmed text after the colon, up to the next label.
    pub content: &'a str,
}

/// Splits a description into sections, one per `Prereq:`, `Antireq:` or
/// `Coreq:` label.
///
/// Labels are matched case-insensitively, in short, long and hyphenated
/// forms. Each section runs to the start of the next label, so a trailing
/// restriction sentence belongs to the last section. Sections with no
/// content are dropped.
#[must_use]
pub fn split_sections(text: &str) -> Vec<Section<'_>> {
    let labels: Vec<_> = KEYWORD.captures_iter(text).collect();
    let mut sections = Vec::with_capacity(labels.len() + 1);

    let leading_end = labels
        .first()
        .and_then(|caps| caps.get(0))
        .map_or(text.len(), |m| m.start());
    push_section(&mut sections, None, "", &text[..leading_end]);

    for (index, caps) in labels.iter().enumerate() {
        let (Some(whole), Some(prefix)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = labels
            .get(index + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |m| m.start());
        let label = whole.as_str().trim_end_matches(':').trim();
        let kind = match prefix.as_str().to_ascii_lowercase().as_str() {
            "pre" => RequirementKind::Prerequisite,
            "anti" => RequirementKind::Antirequisite,
            _ => RequirementKind::Corequisite,
        };
        push_section(&mut sections, Some(kind), label, &text[whole.end()..end]);
    }

    sections
}

fn push_section<'a>(
    sections: &mut Vec<Section<'a>>,
    kind: Option<RequirementKind>,
    label: &'a str,
    content: &'a str,
) {
    let content = content.trim();
    if !content.is_empty() {
        sections.push(Section {
            kind,
            label,
            content,
        });
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn splits_each_label() {
        let sections =
            split_sections("Prereq: CS 135, CS 136. Antireq: CS 145. Coreq: MATH 135.");

        let summary: Vec<_> = sections
            .iter()
            .map(|s| (s.kind, s.label, s.content))
            .collect();
        assert_eq!(
            summary,
            vec![
                (Some(RequirementKind::Prerequisite), "Prereq", "CS 135, CS 136."),
                (Some(RequirementKind::Antirequisite), "Antireq", "CS 145."),
                (Some(RequirementKind::Corequisite), "Coreq", "MATH 135."),
            ]
        );
    }

    #[test]
    fn trailing_restrictions_stay_with_last_section() {
        let sections =
            split_sections("Antireq: CS 145. Level at least 2A. Computer Science students only.");
        assert_eq!(sections.len(), 1);
        assert_eq!(
            sections[0].content,
            "CS 145. Level at least 2A. Computer Science students only."
        );
    }

    #[test]
    fn leading_text_is_unlabelled() {
        let sections = split_sections("Level at least 3A. Prereq: CS 240");
        assert_eq!(sections[0].kind, None);
        assert_eq!(sections[0].content, "Level at least 3A.");
        assert_eq!(sections[1].kind, Some(RequirementKind::Prerequisite));
    }

    #[test]
    fn empty_sections_are_dropped() {
        let sections = split_sections("Prereq: . Antireq: CS 145");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].content, ".");

        let sections = split_sections("Prereq:   Antireq: CS 145");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].kind, Some(RequirementKind::Antirequisite));
    }

    #[test_case("Prerequisite: CS 135", RequirementKind::Prerequisite; "long form")]
    #[test_case("Prerequisites: CS 135", RequirementKind::Prerequisite; "plural")]
    #[test_case("Pre-req: CS 135", RequirementKind::Prerequisite; "hyphenated")]
    #[test_case("antireq: CS 135", RequirementKind::Antirequisite; "lowercase")]
    #[test_case("Corequisite: CS 135", RequirementKind::Corequisite; "long coreq")]
    fn label_forms(text: &str, kind: RequirementKind) {
        let sections = split_sections(text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].kind, Some(kind));
        assert_eq!(sections[0].content, "CS 135");
    }

    #[test]
    fn no_labels_yields_single_unlabelled_section() {
        let sections = split_sections("Computer Science students only");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].kind, None);
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(split_sections("   ").is_empty());
    }
}
