//! CLI argument parsing for rlm

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::chunk::{DEFAULT_CHUNK_SIZE, DEFAULT_PREFIX};
use crate::config::ConfigScope;
use crate::search::{DEFAULT_MAX_LINE_CHARS, DEFAULT_MAX_MATCHES, DEFAULT_MAX_PER_FILE};

#[derive(Parser, Debug)]
#[command(name = "rlm")]
#[command(
    author,
    version,
    about = "Retrieve context from large files",
    long_about = None,
    after_help = "Environment:\n  RLM_CONTEXT_DIR  Overrides configured context directory\n\n\
                  Precedence for context directory:\n  --dir > RLM_CONTEXT_DIR > workspace config > global config > default"
)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error); logs go to stderr
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the bundled README (claude_code_RLM/README.md)
    Readme,

    /// Show built-in project docs
    Docs {
        #[arg(value_enum)]
        topic: DocsTopic,
    },

    /// Show or set configuration (global or per-workspace)
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// List files in the context directory
    Files {
        /// Override context directory
        #[arg(long)]
        dir: Option<PathBuf>,

        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Search for a string or regex across context files
    Search {
        /// Query string or regex
        #[arg(short, long)]
        query: String,

        /// Override context directory
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Treat the query as a regular expression
        #[arg(long, conflicts_with = "fixed")]
        regex: bool,

        /// Treat the query as a fixed substring (default)
        #[arg(long)]
        fixed: bool,

        /// Case-insensitive matching
        #[arg(short = 'i', long)]
        ignore_case: bool,

        /// Maximum total matches
        #[arg(long, default_value_t = DEFAULT_MAX_MATCHES)]
        max_matches: usize,

        /// Maximum matches per file
        #[arg(long, default_value_t = DEFAULT_MAX_PER_FILE)]
        max_per_file: usize,

        /// Maximum snippet length in bytes
        #[arg(long, default_value_t = DEFAULT_MAX_LINE_CHARS)]
        max_line_chars: usize,

        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Extract a byte range from a file
    Peek {
        /// File path, relative to the context directory unless absolute
        file: PathBuf,

        /// Override context directory
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Start byte offset
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        start: i64,

        /// End byte offset, exclusive (0: start + 8192, -1: end of file)
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        end: i64,

        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Write fixed-size chunks of a file to disk
    Chunk {
        /// File path, relative to the context directory unless absolute
        file: PathBuf,

        /// Override context directory
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Chunk size in bytes
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        size: usize,

        /// Overlap between chunks in bytes
        #[arg(long, default_value_t = 0)]
        overlap: usize,

        /// Output directory (default: <workspace>/.rlm/chunks)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Chunk file name prefix
        #[arg(long, default_value = DEFAULT_PREFIX)]
        prefix: String,

        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the resolved configuration
    Show {
        /// Workspace path (defaults to current working directory)
        #[arg(long)]
        workspace: Option<PathBuf>,

        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Set the context directory
    Set {
        /// Directory containing large context files
        #[arg(long)]
        context_dir: String,

        /// Config scope
        #[arg(long, value_enum, default_value_t = ConfigScope::Workspace)]
        scope: ConfigScope,

        /// Workspace path (defaults to current working directory)
        #[arg(long)]
        workspace: Option<PathBuf>,
    },
}

/// Built-in documents shown by `docs`
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DocsTopic {
    /// README.md at the workspace root
    Readme,
    /// .claude/skills/rlm/SKILL.md
    Skill,
}

/// Bundled README printed by `readme`, relative to the workspace root
pub fn bundled_readme_path() -> PathBuf {
    ["claude_code_RLM", "README.md"].iter().collect()
}

impl DocsTopic {
    pub fn relative_path(self) -> PathBuf {
        match self {
            Self::Readme => PathBuf::from("README.md"),
            Self::Skill => [".claude", "skills", "rlm", "SKILL.md"].iter().collect(),
        }
    }
}

/// Output format for command results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_search_defaults() {
        let cli = Cli::parse_from(["rlm", "search", "--query", "needle"]);
        match cli.command {
            Command::Search {
                query,
                regex,
                fixed,
                ignore_case,
                max_matches,
                max_per_file,
                max_line_chars,
                format,
                dir,
            } => {
                assert_eq!(query, "needle");
                assert!(!regex && !fixed && !ignore_case);
                assert_eq!((max_matches, max_per_file, max_line_chars), (50, 20, 800));
                assert_eq!(format, OutputFormat::Json);
                assert!(dir.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_regex_and_fixed_conflict() {
        let result = Cli::try_parse_from(["rlm", "search", "-q", "x", "--regex", "--fixed"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_peek_accepts_negative_end() {
        let cli = Cli::parse_from(["rlm", "peek", "a.txt", "--start", "10", "--end", "-1"]);
        match cli.command {
            Command::Peek { file, start, end, .. } => {
                assert_eq!(file, PathBuf::from("a.txt"));
                assert_eq!((start, end), (10, -1));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_flags_after_positional() {
        let cli = Cli::parse_from(["rlm", "chunk", "big.txt", "--size", "100", "--overlap", "10"]);
        match cli.command {
            Command::Chunk {
                size, overlap, prefix, ..
            } => {
                assert_eq!((size, overlap), (100, 10));
                assert_eq!(prefix, "chunk");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_config_set_scope() {
        let cli = Cli::parse_from(["rlm", "config", "set", "--context-dir", "/ctx", "--scope", "global"]);
        match cli.command {
            Command::Config {
                command: ConfigCommand::Set { scope, context_dir, .. },
            } => {
                assert_eq!(scope, ConfigScope::Global);
                assert_eq!(context_dir, "/ctx");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("plain".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("table".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_readme_command() {
        let cli = Cli::parse_from(["rlm", "readme"]);
        assert!(matches!(cli.command, Command::Readme));
        assert_eq!(bundled_readme_path(), Path::new("claude_code_RLM").join("README.md"));
    }

    #[test]
    fn test_docs_topic_paths() {
        assert_eq!(DocsTopic::Readme.relative_path(), PathBuf::from("README.md"));
        assert!(DocsTopic::Skill.relative_path().ends_with("SKILL.md"));
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
