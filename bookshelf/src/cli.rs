//! Command-line interface definitions.

use clap::{Parser, Subcommand};

/// Bookshelf - seed and query a MongoDB book catalogue.
#[derive(Parser, Debug)]
#[command(name = "bookshelf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Command to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Clear the books collection and insert the sample books.
    Seed,
    /// Run every query shape against the collection and print the results.
    Queries,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_subcommands_and_verbose() {
        let cli = Cli::try_parse_from(["bookshelf", "seed"]).unwrap();
        assert_eq!(cli.command, Commands::Seed);
        assert!(!cli.verbose);

        let cli = Cli::try_parse_from(["bookshelf", "queries", "-v"]).unwrap();
        assert_eq!(cli.command, Commands::Queries);
        assert!(cli.verbose);
    }

    #[test]
    fn command_is_required() {
        assert!(Cli::try_parse_from(["bookshelf"]).is_err());
    }
}
