//! CLI module for Lectern.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Lectern - a course materials assistant
///
/// Indexes structured course documents and answers questions about them
/// with an LLM that can search the lessons on demand.
#[derive(Parser, Debug)]
#[command(name = "lectern")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "LECTERN_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API (and static frontend, if present)
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Skip loading the docs folder at startup
        #[arg(long)]
        no_load: bool,
    },

    /// Index a course document or a folder of documents
    Ingest {
        /// Course file (.txt/.md) or folder (defaults to rag.docs_dir)
        path: Option<String>,

        /// Remove all indexed courses before loading
        #[arg(long)]
        clear: bool,
    },

    /// Ask a single question about the course materials
    Ask {
        /// The question to ask
        question: String,
    },

    /// Start an interactive chat session
    Chat,

    /// List indexed courses
    Courses {
        /// Also print each course's lessons
        #[arg(short, long)]
        lessons: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the default configuration file if none exists
    Init,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from(["lectern", "-vv", "serve", "--port", "9000"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Serve { host, port, no_load } => {
                assert_eq!(host, None);
                assert_eq!(port, Some(9000));
                assert!(!no_load);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_ingest_with_clear() {
        let cli = Cli::try_parse_from(["lectern", "ingest", "docs", "--clear"]).unwrap();
        match cli.command {
            Commands::Ingest { path, clear } => {
                assert_eq!(path.as_deref(), Some("docs"));
                assert!(clear);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
