//! CLI module for Husk.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Husk - retrieval-augmented chat over transcribed audio
///
/// Summarizes completed transcriptions, stores them in a vector database and
/// answers questions grounded in them.
#[derive(Parser, Debug)]
#[command(name = "husk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "HUSK_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run the post-processing pipeline for one completed job
    Ingest {
        /// Transcription job id
        job_id: String,

        /// Record the job as completed with this transcript file first
        #[arg(short, long)]
        transcript: Option<String>,
    },

    /// Re-ingest every completed job with a transcript
    Backfill,

    /// Ask a question answered from stored transcripts
    Ask {
        /// The question to ask
        question: String,

        /// Model to use (defaults to llm.model)
        #[arg(short, long)]
        model: Option<String>,

        /// Sampling temperature (defaults to llm.chat_temperature)
        #[arg(short, long)]
        temperature: Option<f32>,
    },

    /// Show the stored documents closest to a query
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Show RAG status and counts
    Stats,

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

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ingest_with_transcript() {
        let cli = Cli::try_parse_from(["husk", "-vv", "ingest", "job-42", "--transcript", "t.json"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Ingest { job_id, transcript } => {
                assert_eq!(job_id, "job-42");
                assert_eq!(transcript.as_deref(), Some("t.json"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_ask_options() {
        let cli = Cli::try_parse_from(["husk", "ask", "what?", "-m", "llama3", "-t", "0.2"]).unwrap();
        match cli.command {
            Commands::Ask {
                question,
                model,
                temperature,
            } => {
                assert_eq!(question, "what?");
                assert_eq!(model.as_deref(), Some("llama3"));
                assert_eq!(temperature, Some(0.2));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
