mod import;
mod parse;
mod query;
mod terminal;
mod tree;

use clap::ArgAction;
use coursereq::CourseCode;
use import::Import;
use parse::Parse;
use query::Query;
use tree::Tree;

/// Parse a course code from a string, normalizing to uppercase.
///
/// Accepts `cs135`, `CS135` and `CS 135`.
fn parse_course(s: &str) -> Result<CourseCode, String> {
    s.to_uppercase().parse().map_err(|e| format!("{e}"))
}

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);
        self.command.run()
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Parse a requirement description into groups and restrictions
    Parse(Parse),

    /// Build the prerequisite tree for a requirement description
    Tree(Tree),

    /// Import a catalog's prerequisite trees into a node store
    Import(Import),

    /// Query prerequisites across a catalog
    ///
    /// Shows transitive prerequisites, the courses a course unlocks, and
    /// whether a set of completed courses satisfies it.
    Query(Query),
}

impl Command {
    fn run(self) -> anyhow::Result<()> {
        match self {
            Self::Parse(command) => command.run()?,
            Self::Tree(command) => command.run()?,
            Self::Import(command) => command.run()?,
            Self::Query(command) => command.run()?,
        }
        Ok(())
    }
}
