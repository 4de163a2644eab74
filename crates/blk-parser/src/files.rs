//! Discovery and validation of the blk?????.dat file sequence.

use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::error::{FileSetError, ParserError};

/// Glob matching blockchain file names inside a blocks directory.
pub const BLOCK_FILE_PATTERN: &str = "blk?????.dat";

/// Name of the blockchain file with the given index, e.g. `blk00042.dat`.
pub fn blockchain_file_name(index: usize) -> String {
    format!("blk{:05}.dat", index)
}

/// List, validate and order the blockchain files in `dir`.
///
/// Files must run from `blk00000.dat` upward with no gaps. With
/// `resume_from`, only that file and the ones after it are returned; the
/// file must be part of the sequence.
pub fn resolve_blockchain_files(
    dir: &Path,
    resume_from: Option<&str>,
) -> Result<Vec<PathBuf>, ParserError> {
    let files = list_blockchain_files(dir)?;
    validate_sequence(&files)?;
    select_from(files, resume_from)
}

fn list_blockchain_files(dir: &Path) -> Result<Vec<PathBuf>, ParserError> {
    let dir = dir
        .to_str()
        .ok_or_else(|| FileSetError::InvalidPattern(dir.display().to_string()))?;
    let pattern = Path::new(&Pattern::escape(dir)).join(BLOCK_FILE_PATTERN);
    let pattern = pattern
        .to_str()
        .ok_or_else(|| FileSetError::InvalidPattern(pattern.display().to_string()))?;

    let paths = glob::glob(pattern).map_err(|e| FileSetError::InvalidPattern(e.to_string()))?;
    let mut files = Vec::new();
    for entry in paths {
        let path = entry.map_err(glob::GlobError::into_error)?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn validate_sequence(files: &[PathBuf]) -> Result<(), FileSetError> {
    for (index, path) in files.iter().enumerate() {
        let expected = blockchain_file_name(index);
        let found = file_name(path);
        if found != expected {
            return Err(FileSetError::UnexpectedFileName { expected, found });
        }
    }
    Ok(())
}

fn select_from(files: Vec<PathBuf>, resume_from: Option<&str>) -> Result<Vec<PathBuf>, ParserError> {
    let Some(name) = resume_from else {
        return Ok(files);
    };

    let position = files
        .iter()
        .position(|path| file_name(path) == name)
        .ok_or_else(|| FileSetError::MissingResumeFile { name: name.to_string() })?;

    if position > 0 {
        log::info!("Resuming at {}, skipping {} earlier files", name, position);
    }
    Ok(files.into_iter().skip(position).collect())
}
