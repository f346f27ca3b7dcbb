//! Story discovery and the whole-path drivers behind the CLI.
//!
//! The CLI hands a path to one of the drivers here; the driver finds every
//! story under it and runs the requested stage over each, keyed by file so
//! callers can report per-story results.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use thiserror::Error;

use crate::backend::{Artifact, Compiler};
use crate::frontend::{CompileError, Parser, Token};

/// Failures from the path drivers: discovery, file reads, and the compile
/// pipeline itself.
#[derive(Debug, Error)]
pub enum AppError {
    /// The path is neither a `.weft` file nor a directory.
    #[error("no weft stories at `{}`", .path.display())]
    NoStories { path: PathBuf },

    #[error("can't read `{}`: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Compile(#[from] CompileError),
}

pub type AppResult<T> = Result<T, AppError>;

/// Every story under `path`: a `.weft` file is itself a story, a directory
/// contributes its `.weft` children in sorted order.
pub fn find_stories(path: &Path) -> AppResult<Vec<PathBuf>> {
    let read = |source| AppError::Read { path: path.to_path_buf(), source };
    if path.is_dir() {
        let mut stories = Vec::new();
        for entry in fs::read_dir(path).map_err(read)? {
            let story = entry.map_err(read)?.path();
            if story.extension().is_some_and(|extension| extension == "weft") {
                stories.push(story);
            }
        }
        if stories.is_empty() {
            tracing::warn!("No .weft stories under directory: {}", path.display());
        }
        stories.sort();
        return Ok(stories);
    }
    if path.is_file() && path.extension().is_some_and(|extension| extension == "weft") {
        return Ok(vec![path.to_path_buf()]);
    }
    Err(AppError::NoStories { path: path.to_path_buf() })
}

/// Compile every story under `path` into its artifact.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn compile_path(
    path: &Path,
    ebnf_file: Option<&Path>,
    debug: bool,
) -> AppResult<IndexMap<PathBuf, Artifact>> {
    let parser = story_parser(ebnf_file);
    let mut artifacts = IndexMap::new();
    for story in find_stories(path)? {
        let source = read_story(&story)?;
        let tree = parser.parse(&source, debug)?;
        artifacts.insert(story, Compiler::new().compile(tree)?);
    }
    Ok(artifacts)
}

/// Tokenize every story under `path`.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn lex_path(
    path: &Path,
    ebnf_file: Option<&Path>,
) -> AppResult<IndexMap<PathBuf, Vec<Token>>> {
    let parser = story_parser(ebnf_file);
    let mut tokens = IndexMap::new();
    for story in find_stories(path)? {
        let source = read_story(&story)?;
        tokens.insert(story, parser.lex(&source)?);
    }
    Ok(tokens)
}

fn story_parser(ebnf_file: Option<&Path>) -> Parser {
    match ebnf_file {
        Some(file) => Parser::with_ebnf_file(file),
        None => Parser::new(),
    }
}

fn read_story(path: &Path) -> AppResult<String> {
    fs::read_to_string(path).map_err(|source| AppError::Read { path: path.to_path_buf(), source })
}
