use crate::errors::{FileOperation, IoError};
use miette::Diagnostic;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Extension of Unreal project descriptors.
pub const PROJECT_FILE_EXTENSION: &str = "uproject";

#[derive(Error, Debug, Diagnostic)]
pub enum ProjectError {
    #[error("I/O error within project domain")]
    #[diagnostic(code(uecli::project::io))]
    Io(#[from] IoError),

    #[error("Project not found with name: {name}")]
    #[diagnostic(
        code(uecli::project::not_found),
        help("Pass a path to the .uproject file, or add its parent folder with `uecli init --project-path <DIR>`")
    )]
    NotFound { name: String, searched: Vec<PathBuf> },

    #[error("'{name}' is not a valid project name")]
    #[diagnostic(
        code(uecli::project::invalid_name),
        help("Project names become C++ module names: use letters, digits and underscores, not starting with a digit")
    )]
    InvalidName { name: String },
}

fn has_project_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext == PROJECT_FILE_EXTENSION)
        .unwrap_or(false)
}

/// Last path component of `input`, without a trailing `.uproject`.
///
/// `"RTSGame"`, `"RTSGame.uproject"` and `"Games/RTSGame/RTSGame.uproject"` all
/// yield `"RTSGame"`.
pub fn bare_project_name(input: &str) -> String {
    let trimmed = input.trim_end_matches(['/', '\\']);

    let last = trimmed
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(trimmed);

    let suffix = format!(".{}", PROJECT_FILE_EXTENSION);

    last.strip_suffix(&suffix).unwrap_or(last).to_string()
}

pub fn validate_project_name(name: &str) -> Result<(), ProjectError> {
    lazy_static::lazy_static! {
        static ref MODULE_NAME_REGEX: regex::Regex =
            regex::Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("a valid regex pattern");
    }

    if MODULE_NAME_REGEX.is_match(name) {
        Ok(())
    } else {
        Err(ProjectError::InvalidName {
            name: name.to_string(),
        })
    }
}

fn canonicalize(path: &Path) -> Result<PathBuf, ProjectError> {
    Ok(fs::canonicalize(path)
        .map_err(|error| IoError::new(FileOperation::Read, path.to_path_buf(), error))?)
}

/// Looks for the descriptor inside a project directory: `<dir>/<dirname>.uproject`
/// first, otherwise the only `.uproject` the directory holds.
fn project_file_in(dir: &Path) -> Result<Option<PathBuf>, ProjectError> {
    if let Some(dir_name) = dir.file_name() {
        let candidate = dir.join(format!(
            "{}.{}",
            dir_name.to_string_lossy(),
            PROJECT_FILE_EXTENSION
        ));

        if candidate.is_file() {
            return Ok(Some(candidate));
        }
    }

    let entries = fs::read_dir(dir)
        .map_err(|error| IoError::new(FileOperation::ReadDir, dir.to_path_buf(), error))?;

    let mut found = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|error| IoError::new(FileOperation::ReadDir, dir.to_path_buf(), error))?;
        let path = entry.path();

        if path.is_file() && has_project_extension(&path) {
            found.push(path);
        }
    }

    if found.len() == 1 {
        Ok(found.pop())
    } else {
        log::debug!(
            "{} project files in {}, not guessing",
            found.len(),
            dir.display()
        );
        Ok(None)
    }
}

/// Resolves a user supplied project reference to the absolute path of its
/// `.uproject` file.
///
/// `input` may be a path to the descriptor, a path to the project directory, or
/// a bare project name (optionally suffixed with `.uproject`) that is looked up
/// under each of `roots` as `<root>/<name>/<name>.uproject` and then
/// `<root>/<name>.uproject`.
///
/// # Errors
///
/// Returns [`ProjectError::NotFound`] with every candidate that was checked when
/// nothing matches.
pub fn find_project(input: &str, roots: &[PathBuf]) -> Result<PathBuf, ProjectError> {
    let direct = Path::new(input);

    if direct.is_file() && has_project_extension(direct) {
        return canonicalize(direct);
    }

    if direct.is_dir() {
        if let Some(file) = project_file_in(direct)? {
            return canonicalize(&file);
        }
    }

    let name = bare_project_name(input);
    let file_name = format!("{}.{}", name, PROJECT_FILE_EXTENSION);
    let mut searched = Vec::new();

    for root in roots {
        for candidate in [root.join(&name).join(&file_name), root.join(&file_name)] {
            log::debug!("looking for project at {}", candidate.display());

            if candidate.is_file() {
                return canonicalize(&candidate);
            }

            searched.push(candidate);
        }
    }

    Err(ProjectError::NotFound {
        name: input.to_string(),
        searched,
    })
}
