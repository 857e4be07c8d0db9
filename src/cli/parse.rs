use clap::Parser;
use coursereq::{
    ParsedRequirements, RequirementKind, domain::RestrictionKind, parse_requirements_description,
};
use tracing::instrument;

use super::terminal::{Styled, grade_suffix};

#[derive(Debug, Parser)]
#[command(about = "Parse a requirement description")]
pub struct Parse {
    /// The requirement description, e.g. "Prereq: CS 135, CS 136"
    text: String,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

impl Parse {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        let parsed = parse_requirements_description(Some(&self.text));

        match self.output {
            OutputFormat::Pretty => output_pretty(&parsed),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&parsed)?),
        }

        Ok(())
    }
}

fn output_pretty(parsed: &ParsedRequirements) {
    if parsed.is_empty() {
        println!("{}", "No requirements found".label());
        return;
    }

    for (index, group) in parsed.groups.iter().enumerate() {
        let relation = group
            .inner_relation()
            .map_or_else(|| "MIXED".to_string(), |relation| relation.to_string());
        println!(
            "{} {} {}",
            kind_label(group.kind),
            format!("#{}", index + 1).label(),
            format!("({relation}, joined by {})", group.outer_relation).label()
        );
        for entry in &group.entries {
            println!(
                "  • {} {}{}",
                entry.course.course(),
                entry.inner_relation.relation(),
                grade_suffix(entry.min_grade)
            );
        }
    }

    if !parsed.restrictions.is_empty() {
        println!("\n{}", "Restrictions".label());
        for restriction in &parsed.restrictions {
            let kind = match restriction.kind {
                RestrictionKind::Level => "Level",
                RestrictionKind::Program => "Program",
                RestrictionKind::Faculty => "Faculty",
            };
            println!("  {kind:<8} {}", restriction.value.restriction());
        }
    }

    if let Some(level) = &parsed.min_level {
        println!("\nMinimum level: {}", level.restriction());
    }
}

const fn kind_label(kind: RequirementKind) -> &'static str {
    match kind {
        RequirementKind::Prerequisite => "Prerequisite",
        RequirementKind::Antirequisite => "Antirequisite",
        RequirementKind::Corequisite => "Corequisite",
    }
}
