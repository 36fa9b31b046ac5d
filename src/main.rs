use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eventrag::Result;
use eventrag::commands::{ask, ingest, init_config, search, show_config, show_status};
use eventrag::retrieval::Language;

#[derive(Parser)]
#[command(name = "eventrag")]
#[command(about = "Retrieval-augmented question answering over conference documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
        /// Write a default config file
        #[arg(long)]
        init: bool,
    },
    /// Ingest documents into the search index
    Ingest {
        /// Directory of .txt/.md files (defaults to the configured documents dir)
        path: Option<PathBuf>,
    },
    /// Search ingested documents and print matching chunks
    Search {
        /// The search query
        query: String,
        /// Language for query enrichment prompts
        #[arg(long, value_enum, default_value_t = Language::En)]
        language: Language,
        /// Number of results to return
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Ask a question and get an answer grounded in the ingested documents
    Ask {
        /// The question to answer
        question: String,
        /// Language for prompts and the answer
        #[arg(long, value_enum, default_value_t = Language::En)]
        language: Language,
        /// Number of chunks to retrieve
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Show connectivity and corpus status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        // showing the config is the default action
        Commands::Config { show: _, init } => {
            if init {
                init_config()?;
            } else {
                show_config()?;
            }
        }
        Commands::Ingest { path } => {
            ingest(path.as_deref()).await?;
        }
        Commands::Search {
            query,
            language,
            top_k,
        } => {
            search(&query, language, top_k).await?;
        }
        Commands::Ask {
            question,
            language,
            top_k,
        } => {
            ask(&question, language, top_k).await?;
        }
        Commands::Status => {
            show_status().await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn cli_parsing() {
        let cli = Cli::try_parse_from(["eventrag", "status"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            matches!(parsed.command, Commands::Status);
        }
    }

    #[test]
    fn ask_command_with_question() {
        let cli = Cli::try_parse_from(["eventrag", "ask", "Where is the venue?"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ask {
                question, language, ..
            } = parsed.command
            {
                assert_eq!(question, "Where is the venue?");
                assert_eq!(language, Language::En);
            }
        }
    }

    #[test]
    fn ask_command_with_language() {
        let cli = Cli::try_parse_from(["eventrag", "ask", "Gdzie jest rejestracja?", "--language", "pl"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ask { language, .. } = parsed.command {
                assert_eq!(language, Language::Pl);
            }
        }
    }

    #[test]
    fn search_command_with_top_k() {
        let cli = Cli::try_parse_from(["eventrag", "search", "workshops", "--top-k", "3"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Search { query, top_k, .. } = parsed.command {
                assert_eq!(query, "workshops");
                assert_eq!(top_k, Some(3));
            }
        }
    }

    #[test]
    fn ingest_command_with_path() {
        let cli = Cli::try_parse_from(["eventrag", "ingest", "/tmp/docs"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ingest { path } = parsed.command {
                assert_eq!(path, Some(PathBuf::from("/tmp/docs")));
            }
        }
    }

    #[test]
    fn config_init_flag() {
        let cli = Cli::try_parse_from(["eventrag", "config", "--init"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Config { init, show } = parsed.command {
                assert!(init);
                assert!(!show);
            }
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["eventrag", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn invalid_language_rejected() {
        let cli = Cli::try_parse_from(["eventrag", "ask", "question", "--language", "de"]);
        assert!(cli.is_err());
    }
}
