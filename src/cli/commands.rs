//! CLI command implementations
//!
//! Command functions return `CliResult<()>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::app::{self, AppError};
use crate::backend::Artifact;
use crate::frontend::grammar::weft_grammar;

use super::{CliError, CliResult};

const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

/// Compile the stories under `path`. With `json`, print (or write to
/// `output`) the artifact map; otherwise report success unless silenced.
pub fn compile(
    path: &Path,
    output: Option<&Path>,
    json: bool,
    silent: bool,
    debug: bool,
    ebnf_file: Option<&Path>,
) -> CliResult<()> {
    let artifacts = app::compile_path(path, ebnf_file, debug).map_err(from_app)?;
    if json {
        let rendered = render_artifacts(&artifacts)?;
        match output {
            Some(file) => fs::write(file, rendered).map_err(|error| {
                CliError::failure(format!("can't write `{}`: {error}", file.display()))
            })?,
            None => println!("{rendered}"),
        }
    } else if !silent {
        println!("{GREEN}Script syntax passed!{RESET}");
    }
    Ok(())
}

/// Print each story's token stream, one `index kind text` line per token.
pub fn lex(path: &Path, ebnf_file: Option<&Path>) -> CliResult<()> {
    let stories = app::lex_path(path, ebnf_file).map_err(from_app)?;
    for (story, tokens) in &stories {
        println!("File: {}", story.display());
        for (index, token) in tokens.iter().enumerate() {
            println!("{index} {} {}", token.kind, token.text);
        }
    }
    Ok(())
}

/// Print the generated grammar text.
pub fn grammar() -> CliResult<()> {
    println!("{}", weft_grammar());
    Ok(())
}

fn render_artifacts(artifacts: &IndexMap<PathBuf, Artifact>) -> CliResult<String> {
    let keyed: IndexMap<String, &Artifact> = artifacts
        .iter()
        .map(|(story, artifact)| (story.display().to_string(), artifact))
        .collect();
    serde_json::to_string_pretty(&keyed)
        .map_err(|error| CliError::failure(format!("can't render artifact JSON: {error}")))
}

fn from_app(error: AppError) -> CliError {
    CliError::failure(error.to_string())
}
