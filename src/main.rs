mod app;

use app::{App, OutputFormat};
use clap::{Parser, Subcommand};
use review_scheduler::config::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "review", about = "Spaced-repetition review scheduler", version)]
struct Cli {
    /// Configuration file (default: $REVIEW_CONFIG or ./review.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file, overrides the configured one
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Learner whose cards are used, overrides the configured one
    #[arg(long, global = true)]
    owner: Option<String>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start reviewing one or more items
    Add {
        #[arg(required = true)]
        items: Vec<String>,
    },

    /// Show the scheduling state of one item
    Show { item: String },

    /// List every card of the learner
    List,

    /// Record the outcome of one recall check
    Review {
        item: String,
        #[arg(long, conflicts_with = "incorrect", required_unless_present = "incorrect")]
        correct: bool,
        #[arg(long)]
        incorrect: bool,
        /// Time taken to answer, in milliseconds
        #[arg(long, default_value = "0")]
        response_ms: f64,
    },

    /// List cards due for review
    Due {
        /// RFC 3339 timestamp (default: the simulated current date)
        #[arg(long)]
        as_of: Option<String>,
    },

    /// Summary of the learner's progress
    Stats,

    /// Review all due cards interactively
    Study,

    /// Move the simulated current date forward by one day
    NextDay,

    /// Write the learner's cards to a JSON file
    Export { path: PathBuf },

    /// Load cards from a JSON file
    Import { path: PathBuf },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = Config::discover(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.database = db;
    }
    if let Some(owner) = cli.owner {
        config.owner = Some(owner);
    }

    let app = App::open(&config, cli.format)?;

    match cli.command {
        Command::Add { items } => app.add(&items),
        Command::Show { item } => app.show(&item),
        Command::List => app.list(),
        Command::Review {
            item,
            correct,
            incorrect: _,
            response_ms,
        } => app.review(&item, correct, response_ms),
        Command::Due { as_of } => app.due(as_of.as_deref()),
        Command::Stats => app.stats(),
        Command::Study => app.study(),
        Command::NextDay => app.next_day(),
        Command::Export { path } => app.export(&path),
        Command::Import { path } => app.import(&path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review_flags(args: &[&str]) -> Option<(bool, f64)> {
        match Cli::try_parse_from(args.iter().copied()).ok()?.command {
            Command::Review {
                correct,
                response_ms,
                ..
            } => Some((correct, response_ms)),
            _ => None,
        }
    }

    #[test]
    fn test_review_outcome_flags() {
        assert_eq!(
            review_flags(&["review", "review", "apple", "--correct", "--response-ms", "1200"]),
            Some((true, 1200.0))
        );
        assert_eq!(
            review_flags(&["review", "review", "apple", "--incorrect"]),
            Some((false, 0.0))
        );
    }

    #[test]
    fn test_review_requires_exactly_one_outcome() {
        assert!(Cli::try_parse_from(["review", "review", "apple"]).is_err());
        assert!(
            Cli::try_parse_from(["review", "review", "apple", "--correct", "--incorrect"]).is_err()
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["review", "due", "--owner", "7", "--format", "json"]).unwrap();
        assert_eq!(cli.owner.as_deref(), Some("7"));
        assert!(matches!(cli.format, OutputFormat::Json));
    }
}
