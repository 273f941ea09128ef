use crate::{
    config::{self, Config},
    errors::{FileOperation, IoError},
    project,
    prompt::Answer,
    template::{self, ContextFile, RenderOutcome, RenderRequest, Renderer, TemplateSource},
};
use colored::Colorize;
use indexmap::IndexMap;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum UecliError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Project(#[from] project::ProjectError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Template(#[from] template::TemplateError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Io(#[from] IoError),

    #[error("Cannot add cpp source file to a project that already has sources")]
    #[diagnostic(
        code(uecli::cpp::already_has_source),
        help("The project already has a Source folder, it is a C++ project already")
    )]
    AlreadyHasSource { path: PathBuf },

    #[error("Unable to write template context file")]
    #[diagnostic(code(uecli::cpp::stage_context))]
    StageContext {
        #[source]
        source: serde_json::Error,
    },
}

/// Options of the `cpp` subcommand.
#[derive(Debug, Clone)]
pub struct CppOptions {
    /// Project name, project directory or `.uproject` path.
    pub project: String,
    /// Render with default values, without prompts or confirmation.
    pub no_input: bool,
    pub template: TemplateSource,
}
impl CppOptions {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            no_input: true,
            template: TemplateSource::Bundled,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CppOutcome {
    Converted {
        project_dir: PathBuf,
        written: Vec<PathBuf>,
    },
    /// The preview was declined; the project was left untouched.
    Canceled,
}

/// Folders a bare project name is looked up in: the working directory, then the
/// configured project folders, then the engine folder.
pub fn search_roots(config: &Config) -> Vec<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }

    roots.extend(config.project_paths.iter().cloned());
    roots.extend(config.engine_path.iter().cloned());

    roots
}

/// Writes the renderer's context to a fresh temporary JSON file, flushed and
/// synced. The file is deleted when the returned handle is dropped.
fn stage_context(project_name: &str) -> Result<NamedTempFile, UecliError> {
    let mut default_context = IndexMap::new();
    default_context.insert(
        "project_name".to_string(),
        Answer::String(project_name.to_string()),
    );
    let context = ContextFile { default_context };

    let mut file = tempfile::Builder::new()
        .prefix("uecli-")
        .suffix(".json")
        .tempfile()
        .map_err(|error| IoError::new(FileOperation::TempFile, std::env::temp_dir(), error))?;

    serde_json::to_writer(&mut file, &context)
        .map_err(|source| UecliError::StageContext { source })?;

    file.flush()
        .and_then(|_| file.as_file().sync_all())
        .map_err(|error| IoError::new(FileOperation::Write, file.path().to_path_buf(), error))?;

    log::debug!("staged template context at {}", file.path().display());

    Ok(file)
}

/// Deletes `dir` recursively, ignoring every failure. Returns whether it was removed.
fn remove_best_effort(dir: &Path) -> bool {
    match fs::remove_dir_all(dir) {
        Ok(()) => true,
        Err(error) => {
            log::debug!("not removing {}: {}", dir.display(), error);
            false
        }
    }
}

/// Turns a Blueprint-only project into a C++ project.
///
/// Resolves the project, refuses to touch it if it already has a `Source`
/// folder, renders the C++ template into the project's parent directory with the
/// `.uproject` file stem as `project_name`, then deletes the stale `Intermediate`
/// folder.
///
/// # Errors
///
/// Returns a [`UecliError`] if:
///
/// - The project cannot be found or its name is not a valid module name.
/// - The project already has a `Source` directory. Nothing is written.
/// - The temporary context file cannot be written.
/// - The renderer fails. The temporary file is still removed and `Intermediate`
///   is left in place.
pub fn cpp(
    options: &CppOptions,
    config: &Config,
    renderer: &dyn Renderer,
) -> Result<CppOutcome, UecliError> {
    let project_file = project::find_project(&options.project, &search_roots(config))?;

    log::debug!("resolved project file: {}", project_file.display());

    let project_dir = project_file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let source_dir = project_dir.join("Source");
    if source_dir.exists() {
        return Err(UecliError::AlreadyHasSource { path: source_dir });
    }

    // the descriptor names the module, whatever form the user typed
    let name = project_file
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| project::bare_project_name(&options.project));
    project::validate_project_name(&name)?;

    if project_dir.file_name().map(|dir| dir != name.as_str()).unwrap_or(true) {
        log::warn!(
            "project folder '{}' does not match project name '{}', sources will be generated in a sibling folder",
            project_dir.display(),
            name
        );
    }

    let output_dir = project_dir
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| project_dir.clone());

    let outcome = {
        let config_file = stage_context(&name)?;

        renderer.render(&RenderRequest {
            template: &options.template,
            config_file: config_file.path(),
            no_input: options.no_input,
            overwrite: true,
            output_dir: &output_dir,
        })?
    };

    let written = match outcome {
        RenderOutcome::Applied { written } => written,
        RenderOutcome::Canceled => {
            log::info!("canceled, {} left unchanged", project_dir.display());
            return Ok(CppOutcome::Canceled);
        }
    };

    // the previous UBT output no longer matches the project
    let intermediate = project_dir.join("Intermediate");
    if remove_best_effort(&intermediate) {
        println!("{} {}", "remove".red(), intermediate.display());
    }

    Ok(CppOutcome::Converted {
        project_dir,
        written,
    })
}

/// Updates the config at `path` with an engine folder and extra project folders,
/// creating it if needed.
///
/// # Errors
///
/// Returns a [`UecliError`] if the existing config cannot be read or the new one
/// cannot be written.
pub fn init(
    path: &Path,
    engine_path: Option<PathBuf>,
    project_paths: Vec<PathBuf>,
) -> Result<Config, UecliError> {
    let mut config = Config::load(path)?;

    if engine_path.is_some() {
        config.engine_path = engine_path;
    }

    for project_path in project_paths {
        if !config.project_paths.contains(&project_path) {
            config.project_paths.push(project_path);
        }
    }

    config.save(path)?;

    log::info!("wrote config to {}", path.display());

    Ok(config)
}
