use clap::Parser;
use coursereq::{
    PrerequisiteTree,
    domain::{NodeKind, PrerequisiteNode},
    parse_requirements_description,
};
use tracing::instrument;

use super::terminal::{Styled, grade_suffix};

#[derive(Debug, Parser)]
#[command(about = "Build the prerequisite tree for a requirement description")]
pub struct Tree {
    /// The requirement description, e.g. "Prereq: MATH 118/119, STAT 230"
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

impl Tree {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        let parsed = parse_requirements_description(Some(&self.text));
        let tree = PrerequisiteTree::build(parsed.tree_entries());

        match self.output {
            OutputFormat::Pretty => output_pretty(&tree),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tree)?),
        }

        Ok(())
    }
}

fn output_pretty(tree: &PrerequisiteTree) {
    if tree.is_empty() {
        println!("{}", "No prerequisites".label());
        return;
    }

    for (depth, node) in tree.depth_first() {
        println!("{}{}", "  ".repeat(depth), describe(node));
    }
}

fn describe(node: &PrerequisiteNode) -> String {
    let label = match node.kind() {
        NodeKind::Logic(relation) => relation.relation(),
        NodeKind::Leaf { course, min_grade } => {
            format!("{course}{}", grade_suffix(*min_grade)).course()
        }
    };
    format!("{label} {}", node.id().label())
}
