//! rlm - retrieve context from large files
//!
//! CLI entry point. Exit codes: 0 success, 1 search found nothing, 2 error.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use tracing::{debug, info};

use rlm::chunk::{ChunkOptions, write_chunks};
use rlm::cli::{Cli, Command, ConfigCommand, OutputFormat, bundled_readme_path};
use rlm::config::{
    ConfigResolver, ConfigScope, ConfigStore, ContextConfig, ResolvedConfig, WORKSPACE_STATE_DIR,
    detect_workspace_root,
};
use rlm::files::{list_files, resolve_in_context};
use rlm::output::{self, ChunkReport, FilesReport};
use rlm::peek::{PeekEnd, peek};
use rlm::search::{QueryMode, SearchBounds, SearchQuery, search_dir};

const EXIT_NO_MATCHES: u8 = 1;
const EXIT_ERROR: u8 = 2;

fn setup_logging(cli_log_level: Option<&str>) -> Result<()> {
    let level = match cli_log_level.map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") => tracing::Level::INFO,
        Some("WARN") | Some("WARNING") | None => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to WARN", other);
            tracing::Level::WARN
        }
    };

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre!("{}", e))?;

    debug!(?level, "Logging initialized");
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_logging(cli.log_level.as_deref()).context("Failed to setup logging") {
        eprintln!("ERROR: {:#}", e);
        return ExitCode::from(EXIT_ERROR);
    }

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    debug!(command = ?cli.command, "run: dispatching command");
    match cli.command {
        Command::Readme => cmd_cat_workspace_file(&bundled_readme_path()),
        Command::Docs { topic } => cmd_cat_workspace_file(&topic.relative_path()),
        Command::Config {
            command: ConfigCommand::Show { workspace, format },
        } => cmd_config_show(workspace.as_deref(), format),
        Command::Config {
            command:
                ConfigCommand::Set {
                    context_dir,
                    scope,
                    workspace,
                },
        } => cmd_config_set(&context_dir, scope, workspace.as_deref()),
        Command::Files { dir, format } => cmd_files(dir.as_deref(), format),
        Command::Search {
            query,
            dir,
            regex,
            fixed: _,
            ignore_case,
            max_matches,
            max_per_file,
            max_line_chars,
            format,
        } => {
            let mode = if regex { QueryMode::Regex } else { QueryMode::Fixed };
            let query = SearchQuery::new(query.trim(), mode).with_ignore_case(ignore_case);
            let bounds = SearchBounds::new(max_matches, max_per_file, max_line_chars);
            cmd_search(&query, bounds, dir.as_deref(), format)
        }
        Command::Peek {
            file,
            dir,
            start,
            end,
            format,
        } => cmd_peek(&file, dir.as_deref(), start, end, format),
        Command::Chunk {
            file,
            dir,
            size,
            overlap,
            out,
            prefix,
            format,
        } => {
            let options = ChunkOptions {
                chunk_size: size,
                overlap,
                prefix,
            };
            cmd_chunk(&file, dir.as_deref(), out, &options, format)
        }
    }
}

/// Workspace root from the current directory plus the resolved context directory
fn resolve_context(dir_override: Option<&Path>) -> Result<(PathBuf, ResolvedConfig)> {
    let root = detect_workspace_root(None).context("Failed to detect workspace root")?;
    let resolved = ConfigResolver::from_env()
        .resolve(&root, dir_override)
        .context("Failed to resolve context directory")?;
    debug!(context_dir = %resolved.context_dir.display(), source = %resolved.source, "resolve_context: resolved");
    Ok((root, resolved))
}

fn emit(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// Copy a file under the workspace root to stdout
fn cmd_cat_workspace_file(relative: &Path) -> Result<ExitCode> {
    let root = detect_workspace_root(None).context("Failed to detect workspace root")?;
    let path = root.join(relative);
    let mut file = File::open(&path).with_context(|| format!("Failed to open {}", path.display()))?;
    io::copy(&mut file, &mut io::stdout().lock())?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_config_show(workspace: Option<&Path>, format: OutputFormat) -> Result<ExitCode> {
    let root = detect_workspace_root(workspace).context("Failed to detect workspace root")?;
    let resolved = ConfigResolver::from_env()
        .resolve(&root, None)
        .context("Failed to resolve configuration")?;

    match format {
        OutputFormat::Json => emit(&output::to_json(&resolved)?)?,
        OutputFormat::Text => emit(&output::config_text(&resolved))?,
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_config_set(context_dir: &str, scope: ConfigScope, workspace: Option<&Path>) -> Result<ExitCode> {
    let context_dir = context_dir.trim();
    if context_dir.is_empty() {
        return Err(eyre!("--context-dir is required"));
    }

    let root = detect_workspace_root(workspace).context("Failed to detect workspace root")?;
    let path = scope
        .config_path(&root)
        .ok_or_else(|| eyre!("Could not determine the global config directory"))?;

    ConfigStore::new(&path)
        .write(&ContextConfig::new(context_dir))
        .context("Failed to write config")?;

    info!(path = %path.display(), ?scope, "Config written");
    println!("{} Wrote config: {}", "✓".green(), path.display().to_string().cyan());
    Ok(ExitCode::SUCCESS)
}

fn cmd_files(dir: Option<&Path>, format: OutputFormat) -> Result<ExitCode> {
    let (_, resolved) = resolve_context(dir)?;
    let files = list_files(&resolved.context_dir).context("Failed to list files")?;

    match format {
        OutputFormat::Json => emit(&output::to_json(&FilesReport {
            context_dir: &resolved.context_dir,
            files: &files,
        })?)?,
        OutputFormat::Text => emit(&output::files_text(&files))?,
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_search(query: &SearchQuery, bounds: SearchBounds, dir: Option<&Path>, format: OutputFormat) -> Result<ExitCode> {
    if query.text.is_empty() {
        return Err(eyre!("--query is required"));
    }

    let (_, resolved) = resolve_context(dir)?;
    let result = search_dir(&resolved.context_dir, query, bounds).context("Search failed")?;
    debug!(elapsed_ms = result.elapsed.as_millis() as u64, "cmd_search: done");

    match format {
        OutputFormat::Json => emit(&output::to_json(&result)?)?,
        OutputFormat::Text => emit(&output::search_text(&result))?,
    }

    if result.matches.is_empty() {
        return Ok(ExitCode::from(EXIT_NO_MATCHES));
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_peek(file: &Path, dir: Option<&Path>, start: i64, end: i64, format: OutputFormat) -> Result<ExitCode> {
    if end > 0 && end < start {
        return Err(eyre!("--end must be >= --start"));
    }

    let (_, resolved) = resolve_context(dir)?;
    let path = resolve_in_context(&resolved.context_dir, file);
    let slice = peek(&path, start, PeekEnd::from_offset(end)).context("Failed to peek")?;

    match format {
        OutputFormat::Json => emit(&output::to_json(&slice)?)?,
        OutputFormat::Text => emit(&slice.text)?,
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_chunk(
    file: &Path,
    dir: Option<&Path>,
    out: Option<PathBuf>,
    options: &ChunkOptions,
    format: OutputFormat,
) -> Result<ExitCode> {
    let (root, resolved) = resolve_context(dir)?;
    let input = resolve_in_context(&resolved.context_dir, file);
    let out_dir = out.unwrap_or_else(|| root.join(WORKSPACE_STATE_DIR).join("chunks"));

    let chunks = write_chunks(&input, &out_dir, options).context("Failed to write chunks")?;

    match format {
        OutputFormat::Json => emit(&output::to_json(&ChunkReport {
            input: &input,
            out_dir: &out_dir,
            chunks: &chunks,
        })?)?,
        OutputFormat::Text => emit(&output::paths_text(chunks.iter().map(PathBuf::as_path)))?,
    }
    Ok(ExitCode::SUCCESS)
}
