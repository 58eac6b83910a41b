//! Command dispatch for the bktree binary.

use std::fs;
use std::path::Path;

use tracing::{debug, info, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::metric::{Distance, MetricElement, Word};
use crate::tree::Tree;

/// Outcome of reading a word list into a tree.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub inserted: usize,
    pub duplicates: usize,
}

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    debug!(?settings, "settings loaded");
    execute_with_settings(cli, &settings)
}

/// Runs the command against already loaded settings.
pub fn execute_with_settings(cli: &Cli, settings: &Settings) -> CliResult<()> {
    match &cli.command {
        Commands::Search {
            file,
            query,
            radius,
            concurrent,
        } => cmd_search(
            settings,
            file,
            query,
            radius.unwrap_or(settings.radius),
            *concurrent,
        ),
        Commands::Export { file, pretty } => cmd_export(file, *pretty),
        Commands::Tree { file } => cmd_tree(file),
        Commands::Stats { file } => cmd_stats(file),
        Commands::Config { command } => cmd_config(settings, command),
    }
}

/// Builds a tree from a file with one word per line, blank lines skipped.
#[instrument(level = "debug")]
pub fn load_words(path: &Path) -> CliResult<(Tree<Word>, LoadReport)> {
    let content = fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("read {}", path.display()), e))?;

    let mut tree = Tree::new();
    let mut report = LoadReport::default();
    for word in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if tree.add(Word::from(word)).is_new() {
            report.inserted += 1;
        } else {
            report.duplicates += 1;
        }
    }
    info!(inserted = report.inserted, duplicates = report.duplicates, "word list loaded");
    Ok((tree, report))
}

fn cmd_search(
    settings: &Settings,
    file: &Path,
    query: &str,
    radius: Distance,
    concurrent: bool,
) -> CliResult<()> {
    let query = query.trim();
    if query.is_empty() {
        return Err(CliError::InvalidArgs("query must not be empty".into()));
    }
    let (tree, _) = load_words(file)?;
    let query = Word::from(query);

    let (matches, comparisons) = if concurrent {
        let hits = tree.search_concurrent(&query, radius, &settings.search)?;
        if !hits.complete {
            output::warning("time budget exhausted, results may be incomplete");
        }
        (hits.matches, hits.comparisons)
    } else {
        let hits = tree.search(&query, radius)?;
        (hits.matches, hits.comparisons)
    };

    output::header(&format!("{} match(es) within {} of '{}'", matches.len(), radius, query));
    for word in matches {
        output::hit(&format!("{} ({})", word, query.distance_to(word)));
    }
    output::field("comparisons", &format!("{} of {}", comparisons, tree.len()));
    Ok(())
}

fn cmd_export(file: &Path, pretty: bool) -> CliResult<()> {
    let (tree, _) = load_words(file)?;
    let json = if pretty {
        tree.to_json_pretty()?
    } else {
        tree.to_json()?
    };
    output::info(&json);
    Ok(())
}

fn cmd_tree(file: &Path) -> CliResult<()> {
    let (tree, _) = load_words(file)?;
    output::info(&tree.to_text_tree()?);
    Ok(())
}

fn cmd_stats(file: &Path) -> CliResult<()> {
    let (mut tree, report) = load_words(file)?;
    output::field("inserted", &report.inserted);
    output::field("duplicates", &report.duplicates);
    output::field("size", &tree.len());
    output::field("counted", &tree.calculate_size());
    output::field("depth", &tree.depth());
    Ok(())
}

fn cmd_config(settings: &Settings, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&settings.to_toml()?),
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => match global_config_path() {
            Some(path) => output::field("global", &path.display()),
            None => output::warning("no home directory, global config disabled"),
        },
    }
    Ok(())
}
