use std::{collections::BTreeSet, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use coursereq::{CourseCode, Transcript, build_catalog, load_catalog};
use tracing::instrument;

use super::terminal::Styled;

const PASSING_GRADE: u8 = 100;

/// Parse a completed course, optionally with a grade: `CS135` or `CS135=72`.
///
/// A course given without a grade is treated as completed with full marks.
fn parse_completed(s: &str) -> Result<(CourseCode, u8), String> {
    let (course, grade) = match s.split_once('=') {
        Some((course, grade)) => {
            let grade = grade
                .trim()
                .parse::<u8>()
                .ok()
                .filter(|grade| *grade <= 100)
                .ok_or_else(|| format!("invalid grade '{grade}': expected 0-100"))?;
            (course, grade)
        }
        None => (s, PASSING_GRADE),
    };
    Ok((super::parse_course(course)?, grade))
}

#[derive(Debug, Parser)]
#[command(about = "Query prerequisites for a course in a catalog")]
pub struct Query {
    /// Path to a JSON array of course records
    catalog: PathBuf,

    /// The course to query
    #[clap(value_parser = super::parse_course)]
    course: CourseCode,

    /// Completed courses, as CODE or CODE=GRADE
    #[arg(long, value_name = "COURSE", value_parser = parse_completed, num_args = 1..)]
    completed: Vec<(CourseCode, u8)>,
}

impl Query {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        let records = load_catalog(&self.catalog)
            .with_context(|| format!("reading {}", self.catalog.display()))?;
        let catalog = build_catalog(&records);
        let transcript: Transcript = self.completed.into_iter().collect();

        let Some(tree) = catalog.tree(&self.course) else {
            eprintln!("Course {} not found in catalog", self.course);
            std::process::exit(1);
        };

        println!("# {}", self.course);
        println!("  Tree nodes: {}", tree.len());

        println!("\n{}", "Prerequisites (transitive)".label());
        print_courses(&catalog.transitive_prerequisites(&self.course));

        println!("\n{}", "Unlocks".label());
        print_courses(&catalog.unlocks(&self.course));

        if !transcript.is_empty() {
            let status = if catalog.is_satisfied(&self.course, &transcript) {
                "satisfied".satisfied()
            } else {
                "not satisfied".unsatisfied()
            };
            println!("\nPrerequisites {status}");

            let available = catalog.newly_available(&transcript);
            if !available.is_empty() {
                println!("\n{}", "Now available".label());
                print_courses(&available);
            }
        }

        let cycles = catalog.cycles();
        if !cycles.is_empty() {
            println!("\n{}", "Prerequisite cycles".unsatisfied());
            for cycle in cycles {
                let names: Vec<_> = cycle.iter().map(ToString::to_string).collect();
                println!("  {}", names.join(" → "));
            }
        }

        Ok(())
    }
}

fn print_courses(courses: &BTreeSet<CourseCode>) {
    if courses.is_empty() {
        println!("  {}", "none".label());
        return;
    }
    for course in courses {
        println!("  • {}", course.course());
    }
}
